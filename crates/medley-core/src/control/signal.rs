//! Process-group signalling.

#[cfg(unix)]
fn signal_group(pgid: u32, sig: libc::c_int) -> bool {
    // 0 and 1 would address our own group or init.
    if pgid <= 1 {
        return false;
    }
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return false;
    };
    // SAFETY: killpg only sends a signal; no memory is shared with the callee.
    unsafe { libc::killpg(pgid, sig) == 0 }
}

/// Graceful termination request for the whole group.
#[cfg(unix)]
pub(crate) fn terminate_group(pgid: u32) -> bool {
    signal_group(pgid, libc::SIGTERM)
}

#[cfg(unix)]
pub(crate) fn kill_group(pgid: u32) -> bool {
    signal_group(pgid, libc::SIGKILL)
}

/// True while at least one member of the group exists.
#[cfg(unix)]
pub(crate) fn group_alive(pgid: u32) -> bool {
    signal_group(pgid, 0)
}

#[cfg(unix)]
pub(crate) fn kill_pid(pid: u32) -> bool {
    if pid <= 1 {
        return false;
    }
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: see signal_group.
    unsafe { libc::kill(pid, libc::SIGKILL) == 0 }
}

#[cfg(not(unix))]
pub(crate) fn terminate_group(_pgid: u32) -> bool {
    false
}

#[cfg(not(unix))]
pub(crate) fn kill_group(_pgid: u32) -> bool {
    false
}

#[cfg(not(unix))]
pub(crate) fn group_alive(_pgid: u32) -> bool {
    false
}

#[cfg(not(unix))]
pub(crate) fn kill_pid(_pid: u32) -> bool {
    false
}
