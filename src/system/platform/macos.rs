use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use libproc::libproc::pid_rusage::{RUsageInfoV2, pidrusage};
use libproc::libproc::proc_pid::pidpath;

use super::{IoStats, PlatformExtensions, spawn_reaped, unix};
use crate::system::actions::ActionError;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Option<IoStats> {
        let usage = pidrusage::<RUsageInfoV2>(pid as i32).ok()?;
        Some(IoStats {
            read_bytes: usage.ri_diskio_bytesread,
            write_bytes: usage.ri_diskio_byteswritten,
        })
    }

    fn executable_path(pid: u32) -> Result<PathBuf, ActionError> {
        match pidpath(pid as i32) {
            Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            Ok(_) | Err(_) if unix::process_exists(pid) => Err(ActionError::AccessDenied(pid)),
            Ok(_) | Err(_) => Err(ActionError::NotFound(pid)),
        }
    }

    fn terminate(pid: u32) -> Result<(), ActionError> {
        unix::terminate(pid)
    }

    fn reveal_in_file_browser(path: &Path) -> std::io::Result<()> {
        spawn_reaped(Command::new("open").arg("-R").arg(path))
    }

    fn is_elevated() -> bool {
        unix::is_elevated()
    }

    fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()> {
        unix::relaunch_elevated(exe, args)
    }
}
