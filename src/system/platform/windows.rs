use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use windows_sys::Win32::{
    Foundation::CloseHandle,
    Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation},
    System::Threading::{
        GetCurrentProcess, GetProcessIoCounters, IO_COUNTERS, OpenProcess, OpenProcessToken,
        PROCESS_QUERY_INFORMATION,
    },
};

use super::{IoStats, PlatformExtensions, spawn_reaped};
use crate::system::actions::ActionError;

pub struct Platform;

fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// PowerShell command that asks UAC to start `exe` with `args`.
fn runas_script(exe: &Path, args: &[OsString]) -> String {
    let mut script = format!(
        "Start-Process -Verb RunAs -FilePath {}",
        powershell_quote(&exe.to_string_lossy())
    );
    if !args.is_empty() {
        let joined: Vec<String> = args
            .iter()
            .map(|arg| format!("\"{}\"", arg.to_string_lossy()))
            .collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&powershell_quote(&joined.join(" ")));
    }
    script
}

fn with_process<T>(pid: u32, f: impl FnOnce(&Process) -> T) -> Option<T> {
    let target = [Pid::from_u32(pid)];
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&target),
        true,
        ProcessRefreshKind::nothing().with_exe(UpdateKind::Always),
    );
    sys.process(target[0]).map(f)
}

impl PlatformExtensions for Platform {
    fn process_io(pid: u32) -> Option<IoStats> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
            if handle.is_null() {
                return None;
            }
            let mut counters = std::mem::zeroed::<IO_COUNTERS>();
            let ok = GetProcessIoCounters(handle, &mut counters);
            CloseHandle(handle);
            if ok == 0 {
                return None;
            }
            Some(IoStats {
                read_bytes: counters.ReadTransferCount,
                write_bytes: counters.WriteTransferCount,
            })
        }
    }

    fn executable_path(pid: u32) -> Result<PathBuf, ActionError> {
        match with_process(pid, |p| p.exe().map(Path::to_path_buf)) {
            Some(Some(path)) => Ok(path),
            Some(None) => Err(ActionError::AccessDenied(pid)),
            None => Err(ActionError::NotFound(pid)),
        }
    }

    fn terminate(pid: u32) -> Result<(), ActionError> {
        match with_process(pid, |p| p.kill()) {
            Some(true) => Ok(()),
            Some(false) => Err(ActionError::AccessDenied(pid)),
            None => Err(ActionError::NotFound(pid)),
        }
    }

    fn reveal_in_file_browser(path: &Path) -> std::io::Result<()> {
        let mut select = std::ffi::OsString::from("/select,");
        select.push(path.as_os_str());
        spawn_reaped(Command::new("explorer").arg(select))
    }

    fn is_elevated() -> bool {
        unsafe {
            let mut token = std::ptr::null_mut();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                return false;
            }
            let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
            let mut returned = 0u32;
            let ok = GetTokenInformation(
                token,
                TokenElevation,
                (&mut elevation as *mut TOKEN_ELEVATION).cast(),
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut returned,
            );
            CloseHandle(token);
            ok != 0 && elevation.TokenIsElevated != 0
        }
    }

    fn relaunch_elevated(exe: &Path, args: &[OsString]) -> std::io::Result<()> {
        let status = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(runas_script(exe, args))
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!("elevation request failed: {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runas_script_quotes_path_and_arguments() {
        let script = runas_script(
            Path::new(r"C:\Program Files\taskwatch's\taskwatch.exe"),
            &[OsString::from("--theme"), OsString::from("dark")],
        );
        assert_eq!(
            script,
            r#"Start-Process -Verb RunAs -FilePath 'C:\Program Files\taskwatch''s\taskwatch.exe' -ArgumentList '"--theme" "dark"'"#
        );
    }

    #[test]
    fn runas_script_without_arguments() {
        let script = runas_script(Path::new(r"C:\bin\taskwatch.exe"), &[]);
        assert_eq!(script, r"Start-Process -Verb RunAs -FilePath 'C:\bin\taskwatch.exe'");
    }
}
