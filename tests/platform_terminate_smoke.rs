use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use taskwatch::system::actions::{
    ActionError, ActionTarget, OsProcessControl, ProcessControl, terminate_batch,
};

fn spawn_long_lived_child() -> Child {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("powershell");
        c.args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            "Start-Sleep -Seconds 30",
        ]);
        c
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sleep");
        c.arg("30");
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn child process")
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(50)),
            Ok(None) | Err(_) => return false,
        }
    }
}

#[test]
fn terminate_nonexistent_pid_returns_not_found() {
    let mut control = OsProcessControl;
    assert!(matches!(
        control.terminate(u32::MAX),
        Err(ActionError::NotFound(_))
    ));
}

#[test]
fn terminate_batch_stops_spawned_child() {
    let mut child = spawn_long_lived_child();
    let pid = child.id();

    let mut control = OsProcessControl;
    let report = terminate_batch(&mut control, &[ActionTarget::new(pid, "sleep")]);

    if report.terminated.len() != 1 {
        let _ = child.kill();
        panic!("terminate_batch did not terminate PID {pid}: {:?}", report.dialog_message());
    }
    if !wait_for_exit(&mut child, Duration::from_secs(5)) {
        let _ = child.kill();
        panic!("child process did not exit before timeout");
    }
    assert_eq!(
        report.status_message().as_deref(),
        Some("Terminated 1 process(es)")
    );
}

#[test]
fn own_executable_location_resolves() {
    let mut control = OsProcessControl;
    let path = control
        .executable_path(std::process::id())
        .expect("own executable path");
    assert!(control.path_exists(&path));
    let dir = path.parent().expect("executable has a parent directory");
    assert!(control.directory_readable(dir));
}
