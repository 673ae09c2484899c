//! External binary presence checks.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::ToolBinaries;

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Resolves an executable: names with a path separator are checked as-is,
/// bare names are searched on `PATH`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let p = PathBuf::from(name);
        return is_executable(&p).then_some(p);
    }
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Names of configured tools (music, video, probe) that cannot be found.
pub fn verify_dependencies(tools: &ToolBinaries) -> Vec<String> {
    let mut missing = Vec::new();
    for name in [&tools.music, &tools.video, &tools.probe] {
        if find_in_path(name).is_none() {
            tracing::error!(tool = %name, "required tool not found");
            missing.push(name.clone());
        }
    }
    missing
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn explicit_path_must_be_executable() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        let tool_str = tool.to_str().unwrap();
        assert!(find_in_path(tool_str).is_none());

        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_in_path(tool_str), Some(tool.clone()));
    }

    #[test]
    fn missing_tools_are_reported() {
        let tools = ToolBinaries {
            music: "/nonexistent/spotdl".into(),
            video: "/bin/sh".into(),
            probe: "medley-definitely-not-installed".into(),
        };
        let missing = verify_dependencies(&tools);
        assert_eq!(
            missing,
            vec![
                "/nonexistent/spotdl".to_string(),
                "medley-definitely-not-installed".to_string()
            ]
        );
    }
}
