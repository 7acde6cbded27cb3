use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::actions::ActionError;

#[derive(Clone, Copy, Debug)]
pub struct IoStats {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl IoStats {
    pub fn total_bytes(self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

pub trait PlatformExtensions {
    fn process_io(pid: u32) -> Option<IoStats>;
    fn executable_path(pid: u32) -> Result<PathBuf, ActionError>;
    fn terminate(pid: u32) -> Result<(), ActionError>;
    fn reveal_in_file_browser(path: &Path) -> std::io::Result<()>;
    fn is_elevated() -> bool;
    fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()>;
}

#[cfg(unix)]
mod unix;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn process_io(pid: u32) -> Option<IoStats> {
    platform_impl::Platform::process_io(pid)
}

pub fn executable_path(pid: u32) -> Result<PathBuf, ActionError> {
    platform_impl::Platform::executable_path(pid)
}

pub fn terminate(pid: u32) -> Result<(), ActionError> {
    platform_impl::Platform::terminate(pid)
}

pub fn reveal_in_file_browser(path: &Path) -> std::io::Result<()> {
    platform_impl::Platform::reveal_in_file_browser(path)
}

/// Whether this process already runs as root / Administrator.
pub fn is_elevated() -> bool {
    platform_impl::Platform::is_elevated()
}

/// Restart as an elevated copy of `exe`. On unix the current process is
/// replaced and this only returns on failure; on Windows it returns once the
/// elevation prompt has been launched.
pub fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()> {
    platform_impl::Platform::relaunch_elevated(exe, args)
}

/// Start a helper program such as a file browser without waiting for it.
/// The child is reaped on its own thread so it never lingers as a zombie.
pub(crate) fn spawn_reaped(command: &mut Command) -> std::io::Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let reaper = std::thread::Builder::new()
        .name("taskwatch-reaper".to_string())
        .spawn(move || {
            let _ = child.wait();
        });
    if let Err(err) = reaper {
        tracing::warn!(error = %err, "could not start reaper thread");
    }
    Ok(())
}

/// Whether the current user may list `dir`.
pub fn directory_readable(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `/proc/<pid>/stat` of a zombie `true` whose parent is `parent`.
    #[cfg(target_os = "linux")]
    fn is_zombie_true_child(stat: &str, parent: u32) -> bool {
        let Some((head, rest)) = stat.rsplit_once(") ") else {
            return false;
        };
        if !head.ends_with("(true") {
            return false;
        }
        let mut fields = rest.split_whitespace();
        let state = fields.next();
        let ppid = fields.next().and_then(|p| p.parse::<u32>().ok());
        state == Some("Z") && ppid == Some(parent)
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reaped_helpers_leave_no_zombies() {
        for _ in 0..3 {
            spawn_reaped(&mut Command::new("true")).expect("spawn true");
        }
        std::thread::sleep(std::time::Duration::from_millis(500));

        let me = std::process::id();
        let zombies = std::fs::read_dir("/proc")
            .expect("procfs")
            .flatten()
            .filter_map(|entry| std::fs::read_to_string(entry.path().join("stat")).ok())
            .filter(|stat| is_zombie_true_child(stat, me))
            .count();
        assert_eq!(zombies, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn zombie_stat_line_is_recognised() {
        assert!(is_zombie_true_child("4242 (true) Z 77 4242 77 0 -1", 77));
        assert!(!is_zombie_true_child("4242 (true) S 77 4242 77 0 -1", 77));
        assert!(!is_zombie_true_child("4242 (true) Z 78 4242 77 0 -1", 77));
        assert!(!is_zombie_true_child("4242 (sleep) Z 77 4242 77 0 -1", 77));
    }

    #[test]
    fn elevation_check_does_not_panic() {
        let _ = is_elevated();
    }

    #[cfg(unix)]
    #[test]
    fn elevation_matches_effective_uid() {
        assert_eq!(is_elevated(), nix::unistd::geteuid().is_root());
    }

    #[test]
    fn spawn_reaped_reports_missing_program() {
        assert!(spawn_reaped(&mut Command::new("/nonexistent/taskwatch-opener")).is_err());
    }

    #[test]
    fn wrappers_do_not_panic_for_current_pid() {
        let pid = std::process::id();
        let _ = process_io(pid);
        let _ = executable_path(pid);
    }

    #[test]
    fn own_executable_resolves_to_existing_file() {
        let path = executable_path(std::process::id()).expect("own executable path");
        assert!(path.exists());
    }

    #[test]
    fn unknown_pid_is_not_found() {
        assert!(matches!(
            executable_path(u32::MAX),
            Err(ActionError::NotFound(_))
        ));
        assert!(matches!(terminate(u32::MAX), Err(ActionError::NotFound(_))));
    }
}
