use std::io::ErrorKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{IoStats, PlatformExtensions, spawn_reaped, unix};
use crate::system::actions::ActionError;

const FALLBACK_FILE_MANAGERS: [&str; 5] = ["nautilus", "dolphin", "thunar", "nemo", "caja"];

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Option<IoStats> {
        // Read /proc/{pid}/io; only readable for our own processes unless privileged
        let path = format!("/proc/{pid}/io");
        let contents = std::fs::read_to_string(path).ok()?;
        let mut read_bytes = None;
        let mut write_bytes = None;
        for line in contents.lines() {
            if let Some(val) = line.strip_prefix("read_bytes: ") {
                read_bytes = val.trim().parse().ok();
            } else if let Some(val) = line.strip_prefix("write_bytes: ") {
                write_bytes = val.trim().parse().ok();
            }
        }
        Some(IoStats {
            read_bytes: read_bytes?,
            write_bytes: write_bytes?,
        })
    }

    fn executable_path(pid: u32) -> Result<PathBuf, ActionError> {
        match std::fs::read_link(format!("/proc/{pid}/exe")) {
            Ok(path) => Ok(path),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                Err(ActionError::AccessDenied(pid))
            }
            // Kernel threads have a /proc entry but no exe link.
            Err(_) if Path::new(&format!("/proc/{pid}")).exists() => Err(ActionError::Other(
                pid,
                "process has no executable path".to_string(),
            )),
            Err(_) => Err(ActionError::NotFound(pid)),
        }
    }

    fn terminate(pid: u32) -> Result<(), ActionError> {
        unix::terminate(pid)
    }

    fn reveal_in_file_browser(path: &Path) -> std::io::Result<()> {
        let dir = path.parent().unwrap_or(path);
        let spawn = |program: &str| spawn_reaped(Command::new(program).arg(dir));
        spawn("xdg-open").or_else(|err| {
            FALLBACK_FILE_MANAGERS
                .iter()
                .find_map(|program| spawn(program).ok())
                .ok_or(err)
        })
    }

    fn is_elevated() -> bool {
        unix::is_elevated()
    }

    fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()> {
        unix::relaunch_elevated(exe, args)
    }
}
