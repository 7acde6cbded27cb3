use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::{Pid, geteuid};

use crate::system::actions::ActionError;

fn to_pid(pid: u32) -> Result<Pid, ActionError> {
    // pid 0 and negative values address process groups, never a single process.
    match i32::try_from(pid) {
        Ok(0) => Err(ActionError::Other(pid, "refusing to signal pid 0".to_string())),
        Ok(raw) => Ok(Pid::from_raw(raw)),
        Err(_) => Err(ActionError::NotFound(pid)),
    }
}

pub fn terminate(pid: u32) -> Result<(), ActionError> {
    match kill(to_pid(pid)?, Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(ActionError::NotFound(pid)),
        Err(Errno::EPERM) => Err(ActionError::AccessDenied(pid)),
        Err(errno) => Err(ActionError::Other(pid, errno.desc().to_string())),
    }
}

/// Probe with the null signal; EPERM still proves the process exists.
pub fn process_exists(pid: u32) -> bool {
    match to_pid(pid) {
        Ok(target) => !matches!(kill(target, None), Err(Errno::ESRCH)),
        Err(_) => false,
    }
}

pub fn is_elevated() -> bool {
    geteuid().is_root()
}

/// Replace this process with `sudo <exe> <args>`. Only returns on failure.
pub fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()> {
    Err(Command::new("sudo").arg(exe).args(args).exec())
}
