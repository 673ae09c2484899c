//! Subprocess supervision.
//!
//! `Supervisor::run` starts a tool in its own process group, streams its
//! stdout and stderr line by line to a callback, and tears the whole group
//! down when the stop flag is raised (TERM, then KILL after the grace
//! period). The child is registered with the `StopController` for exactly
//! the duration of the run.

mod stream;

use std::io;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::config::SoftSuccessConfig;
use crate::control::{kill_group, terminate_group, StopController, POLL_INTERVAL};
use crate::tools::ToolCommand;

/// Failure to run a tool at all. Tool exit codes are not errors here.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed reading output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// What a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub success: bool,
    /// Every non-empty output line, stdout and stderr interleaved in arrival order.
    pub lines: Vec<String>,
    /// `None` when the process died from a signal.
    pub exit_code: Option<i32>,
    /// Nonzero exit accepted because of a soft-success trailer.
    pub soft_success: bool,
    /// Stop was observed while the process ran.
    pub cancelled: bool,
}

/// Escalation state of a stop observed during a run.
struct Teardown {
    pgid: u32,
    term_sent: Option<Instant>,
    killed: bool,
}

impl Teardown {
    fn new(pgid: u32) -> Self {
        Self {
            pgid,
            term_sent: None,
            killed: false,
        }
    }

    /// Sends TERM on the first call and KILL once the grace period has passed.
    fn advance(&mut self, stop: &StopController) {
        match self.term_sent {
            None => {
                tracing::debug!(pgid = self.pgid, "stop observed, terminating process group");
                terminate_group(self.pgid);
                self.term_sent = Some(Instant::now());
            }
            Some(at) if !self.killed && at.elapsed() >= stop.grace() => {
                tracing::warn!(pgid = self.pgid, "process group still alive after grace, killing");
                kill_group(self.pgid);
                self.killed = true;
            }
            Some(_) => {}
        }
    }

    fn cancelled(&self) -> bool {
        self.term_sent.is_some()
    }
}

pub struct Supervisor<'a> {
    stop: &'a StopController,
    soft_success: &'a SoftSuccessConfig,
}

impl<'a> Supervisor<'a> {
    pub fn new(stop: &'a StopController, soft_success: &'a SoftSuccessConfig) -> Self {
        Self { stop, soft_success }
    }

    /// Runs `cmd` to completion, calling `on_line` for every non-empty output line.
    pub fn run(
        &self,
        cmd: &ToolCommand,
        mut on_line: impl FnMut(&str),
    ) -> Result<RunOutput, SupervisorError> {
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        tracing::debug!(command = %cmd, "spawning tool");
        let mut child = command.spawn().map_err(|source| SupervisorError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;
        let pgid = child.id();
        let _registration = self.stop.register(pgid);
        let mut teardown = Teardown::new(pgid);

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(stream::pump(out, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(stream::pump(err, tx.clone()));
        }
        drop(tx);

        let mut lines = Vec::new();
        let mut read_error = None;
        loop {
            if self.stop.is_stopped() {
                teardown.advance(self.stop);
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(line)) => {
                    on_line(&line);
                    lines.push(line);
                }
                Ok(Err(e)) => {
                    read_error.get_or_insert(e);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        for reader in readers {
            let _ = reader.join();
        }

        if let Some(source) = read_error {
            kill_group(pgid);
            let _ = child.wait();
            return Err(SupervisorError::Io {
                program: cmd.program.clone(),
                source,
            });
        }

        let status = self.wait(&mut child, &mut teardown).map_err(|source| {
            SupervisorError::Io {
                program: cmd.program.clone(),
                source,
            }
        })?;

        let exit_code = status.code();
        let cancelled = teardown.cancelled();
        let mut output = RunOutput {
            success: !cancelled && status.success(),
            lines,
            exit_code,
            soft_success: false,
            cancelled,
        };
        if !output.success && !cancelled {
            if let Some(marker) = self.soft_success_marker(cmd, &output.lines) {
                tracing::info!(
                    program = %cmd.program,
                    ?exit_code,
                    marker,
                    "nonzero exit accepted as success"
                );
                output.success = true;
                output.soft_success = true;
            }
        }
        Ok(output)
    }

    /// Waits for exit, continuing the stop escalation if a stop arrives meanwhile.
    fn wait(&self, child: &mut Child, teardown: &mut Teardown) -> io::Result<ExitStatus> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.stop.is_stopped() {
                teardown.advance(self.stop);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn soft_success_marker<'m>(&'m self, cmd: &ToolCommand, lines: &[String]) -> Option<&'m str> {
        let markers = self.soft_success.for_tool(cmd.tool);
        markers
            .iter()
            .filter(|m| !m.is_empty())
            .find(|m| lines.iter().any(|l| l.contains(m.as_str())))
            .map(String::as_str)
    }
}
