use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("process {0} no longer exists")]
    NotFound(u32),
    #[error("access denied for process {0}")]
    AccessDenied(u32),
    #[error("process {0}: {1}")]
    Other(u32, String),
}

/// OS operations the foreground context performs synchronously on behalf of
/// the user. All calls are short and best-effort.
pub trait ProcessControl {
    fn terminate(&mut self, pid: u32) -> Result<(), ActionError>;
    fn executable_path(&mut self, pid: u32) -> Result<PathBuf, ActionError>;
    fn path_exists(&self, path: &Path) -> bool;
    fn directory_readable(&self, dir: &Path) -> bool;
    fn reveal(&mut self, path: &Path) -> std::io::Result<()>;

    /// Running as root / Administrator already.
    fn is_elevated(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessControl;

impl ProcessControl for OsProcessControl {
    fn terminate(&mut self, pid: u32) -> Result<(), ActionError> {
        platform::terminate(pid)
    }

    fn executable_path(&mut self, pid: u32) -> Result<PathBuf, ActionError> {
        platform::executable_path(pid)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn directory_readable(&self, dir: &Path) -> bool {
        platform::directory_readable(dir)
    }

    fn reveal(&mut self, path: &Path) -> std::io::Result<()> {
        platform::reveal_in_file_browser(path)
    }

    fn is_elevated(&self) -> bool {
        platform::is_elevated()
    }
}

/// Restart this binary with its current arguments under sudo (unix) or a UAC
/// prompt (Windows). The terminal must already be restored.
pub fn relaunch_elevated() -> std::io::Result<()> {
    let exe = std::env::current_exe()?;
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    tracing::info!(exe = %exe.display(), "relaunching with elevated privileges");
    platform::relaunch_elevated(&exe, &args)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTarget {
    pub pid: u32,
    pub name: String,
}

impl ActionTarget {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }

    fn label(&self) -> String {
        format!("{} (PID: {})", self.name, self.pid)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminateReport {
    pub terminated: Vec<ActionTarget>,
    pub vanished: Vec<ActionTarget>,
    pub access_denied: Vec<ActionTarget>,
    pub failed: Vec<(ActionTarget, String)>,
}

impl TerminateReport {
    pub fn status_message(&self) -> Option<String> {
        if self.terminated.is_empty() {
            return None;
        }
        Some(format!(
            "Terminated {} process(es)",
            self.terminated.len()
        ))
    }

    pub fn dialog_message(&self) -> Option<String> {
        if self.access_denied.is_empty() && self.failed.is_empty() {
            return None;
        }
        let mut msg = String::new();
        if !self.access_denied.is_empty() {
            let _ = writeln!(msg, "Access denied for:");
            for target in &self.access_denied {
                let _ = writeln!(msg, "{}", target.label());
            }
            let _ = writeln!(msg, "\nYou may need elevated privileges (sudo / Administrator).\n");
        }
        if !self.failed.is_empty() {
            let _ = writeln!(msg, "Failed to terminate:");
            for (target, reason) in &self.failed {
                let _ = writeln!(msg, "{}: {reason}", target.label());
            }
        }
        Some(msg.trim().to_string())
    }
}

/// Send a termination request to every target. One failure never stops the
/// rest of the batch; processes that already exited are ignored.
pub fn terminate_batch(control: &mut dyn ProcessControl, targets: &[ActionTarget]) -> TerminateReport {
    let mut report = TerminateReport::default();
    for target in targets {
        match control.terminate(target.pid) {
            Ok(()) => report.terminated.push(target.clone()),
            Err(ActionError::NotFound(_)) => report.vanished.push(target.clone()),
            Err(ActionError::AccessDenied(_)) => report.access_denied.push(target.clone()),
            Err(ActionError::Other(_, reason)) => report.failed.push((target.clone(), reason)),
        }
    }
    tracing::info!(
        terminated = report.terminated.len(),
        vanished = report.vanished.len(),
        access_denied = report.access_denied.len(),
        failed = report.failed.len(),
        "terminate batch finished"
    );
    report
}

/// Resolve the executable of `pid` and reveal it in the platform file browser.
pub fn locate_executable(control: &mut dyn ProcessControl, pid: u32) -> Result<PathBuf, ActionError> {
    let path = control.executable_path(pid)?;
    if !control.path_exists(&path) {
        return Err(ActionError::Other(
            pid,
            "cannot locate executable path for this process".to_string(),
        ));
    }
    control
        .reveal(&path)
        .map_err(|err| ActionError::Other(pid, format!("failed to open file location: {err}")))?;
    Ok(path)
}

pub fn locate_message(err: &ActionError) -> String {
    match err {
        ActionError::NotFound(_) => "Process no longer exists.".to_string(),
        ActionError::AccessDenied(_) => {
            "Access denied. Cannot access process executable path.".to_string()
        }
        ActionError::Other(_, reason) => reason.clone(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocateReport {
    pub opened: Vec<PathBuf>,
    pub access_denied: Vec<ActionTarget>,
    pub failed: Vec<(ActionTarget, String)>,
}

impl LocateReport {
    pub fn status_message(&self) -> Option<String> {
        match self.opened.as_slice() {
            [] => None,
            [dir] => Some(format!("Opened location: {}", dir.display())),
            dirs => Some(format!("Opened {} location(s)", dirs.len())),
        }
    }

    pub fn dialog_message(&self) -> Option<String> {
        if self.access_denied.is_empty() && self.failed.is_empty() {
            return None;
        }
        let mut msg = String::new();
        if !self.access_denied.is_empty() {
            let _ = writeln!(msg, "Access denied for:");
            for target in &self.access_denied {
                let _ = writeln!(msg, "{}", target.label());
            }
            let _ = writeln!(msg);
        }
        if !self.failed.is_empty() {
            let _ = writeln!(msg, "Failed to open location for:");
            for (target, reason) in &self.failed {
                let _ = writeln!(msg, "{}: {reason}", target.label());
            }
        }
        Some(msg.trim().to_string())
    }
}

/// Reveal the executables of several processes, opening each containing
/// directory at most once.
pub fn locate_batch(control: &mut dyn ProcessControl, targets: &[ActionTarget]) -> LocateReport {
    let mut report = LocateReport::default();
    let mut seen_dirs = HashSet::new();
    for target in targets {
        let path = match control.executable_path(target.pid) {
            Ok(path) => path,
            Err(ActionError::AccessDenied(_)) => {
                report.access_denied.push(target.clone());
                continue;
            }
            Err(err) => {
                report.failed.push((target.clone(), locate_message(&err)));
                continue;
            }
        };
        if !control.path_exists(&path) {
            report
                .failed
                .push((target.clone(), "executable no longer exists on disk".to_string()));
            continue;
        }
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
        if !seen_dirs.insert(dir.clone()) {
            continue;
        }
        match control.reveal(&path) {
            Ok(()) => report.opened.push(dir),
            Err(err) => report.failed.push((target.clone(), err.to_string())),
        }
    }
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Scripted process control for tests.
    #[derive(Default)]
    pub(crate) struct FakeControl {
        pub terminate_results: HashMap<u32, Result<(), ActionError>>,
        pub exe_paths: HashMap<u32, Result<PathBuf, ActionError>>,
        pub missing_paths: HashSet<PathBuf>,
        pub unreadable_dirs: HashSet<PathBuf>,
        pub revealed: Vec<PathBuf>,
        pub terminated: Vec<u32>,
        pub elevated: bool,
    }

    impl ProcessControl for FakeControl {
        fn terminate(&mut self, pid: u32) -> Result<(), ActionError> {
            let result = self
                .terminate_results
                .get(&pid)
                .cloned()
                .unwrap_or(Err(ActionError::NotFound(pid)));
            if result.is_ok() {
                self.terminated.push(pid);
            }
            result
        }

        fn executable_path(&mut self, pid: u32) -> Result<PathBuf, ActionError> {
            self.exe_paths
                .get(&pid)
                .cloned()
                .unwrap_or(Err(ActionError::NotFound(pid)))
        }

        fn path_exists(&self, path: &Path) -> bool {
            !self.missing_paths.contains(path)
        }

        fn directory_readable(&self, dir: &Path) -> bool {
            !self.unreadable_dirs.contains(dir)
        }

        fn reveal(&mut self, path: &Path) -> std::io::Result<()> {
            self.revealed.push(path.to_path_buf());
            Ok(())
        }

        fn is_elevated(&self) -> bool {
            self.elevated
        }
    }

    #[test]
    fn terminate_batch_classifies_each_outcome() {
        let mut control = FakeControl::default();
        control.terminate_results.insert(10, Err(ActionError::NotFound(10)));
        control
            .terminate_results
            .insert(11, Err(ActionError::AccessDenied(11)));
        control.terminate_results.insert(12, Ok(()));

        let targets = vec![
            ActionTarget::new(10, "gone"),
            ActionTarget::new(11, "protected"),
            ActionTarget::new(12, "victim"),
        ];
        let report = terminate_batch(&mut control, &targets);

        assert_eq!(report.terminated.len(), 1);
        assert_eq!(report.access_denied.len(), 1);
        assert_eq!(report.failed.len(), 0);
        assert_eq!(report.vanished.len(), 1);
        assert_eq!(control.terminated, vec![12]);
        assert_eq!(report.status_message().as_deref(), Some("Terminated 1 process(es)"));
        let dialog = report.dialog_message().expect("access denied is reported");
        assert!(dialog.contains("protected (PID: 11)"));
        assert!(dialog.contains("elevated privileges"));
        assert!(!dialog.contains("gone"));
    }

    #[test]
    fn terminate_batch_continues_after_other_failure() {
        let mut control = FakeControl::default();
        control
            .terminate_results
            .insert(1, Err(ActionError::Other(1, "boom".into())));
        control.terminate_results.insert(2, Ok(()));

        let report = terminate_batch(
            &mut control,
            &[ActionTarget::new(1, "a"), ActionTarget::new(2, "b")],
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.terminated.len(), 1);
        assert!(report.dialog_message().unwrap().contains("a (PID: 1): boom"));
    }

    #[test]
    fn locate_executable_distinguishes_error_kinds() {
        let mut control = FakeControl::default();
        control
            .exe_paths
            .insert(5, Err(ActionError::AccessDenied(5)));

        assert_eq!(
            locate_executable(&mut control, 4),
            Err(ActionError::NotFound(4))
        );
        assert_eq!(
            locate_executable(&mut control, 5),
            Err(ActionError::AccessDenied(5))
        );
        assert!(control.revealed.is_empty());
        assert_ne!(
            locate_message(&ActionError::NotFound(4)),
            locate_message(&ActionError::AccessDenied(5))
        );
    }

    #[test]
    fn locate_executable_reveals_existing_path() {
        let mut control = FakeControl::default();
        let exe = PathBuf::from("/usr/bin/editor");
        control.exe_paths.insert(8, Ok(exe.clone()));

        assert_eq!(locate_executable(&mut control, 8), Ok(exe.clone()));
        assert_eq!(control.revealed, vec![exe]);
    }

    #[test]
    fn locate_executable_rejects_deleted_binary() {
        let mut control = FakeControl::default();
        let exe = PathBuf::from("/tmp/deleted");
        control.exe_paths.insert(8, Ok(exe.clone()));
        control.missing_paths.insert(exe);

        assert!(matches!(
            locate_executable(&mut control, 8),
            Err(ActionError::Other(8, _))
        ));
    }

    #[test]
    fn locate_batch_opens_each_directory_once() {
        let mut control = FakeControl::default();
        control.exe_paths.insert(1, Ok(PathBuf::from("/opt/app/bin/a")));
        control.exe_paths.insert(2, Ok(PathBuf::from("/opt/app/bin/b")));
        control.exe_paths.insert(3, Err(ActionError::AccessDenied(3)));

        let report = locate_batch(
            &mut control,
            &[
                ActionTarget::new(1, "a"),
                ActionTarget::new(2, "b"),
                ActionTarget::new(3, "c"),
                ActionTarget::new(4, "d"),
            ],
        );

        assert_eq!(report.opened, vec![PathBuf::from("/opt/app/bin")]);
        assert_eq!(control.revealed.len(), 1);
        assert_eq!(report.access_denied, vec![ActionTarget::new(3, "c")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            report.status_message().as_deref(),
            Some("Opened location: /opt/app/bin")
        );
    }
}
