//! Low-level async process management utilities.

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use nix::{
    errno::Errno,
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use tokio::process::{Child, Command};
use tracing::warn;

/// Errors that can occur while polling a process.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    /// Failed to wait for child process.
    #[error("Failed to wait for child process: {0}")]
    WaitChildFail(io::Error),
}

/// Current status of a running process.
pub enum ProcessStatus {
    /// Process has completed with exit status.
    Done(ExitStatus),
    /// Process is still running.
    Running,
}

/// Spawn a new async process with piped stdout and stderr.
///
/// The child gets a null stdin so that programs waiting for input see EOF instead
/// of blocking forever. When `current_dir` is set the child starts there.
/// The child leads a new process group, so everything it starts can be
/// stopped with [`kill_process_group`]. The child itself is also killed if its
/// handle is dropped before it finishes.
///
/// # Examples
///
/// ```rust
/// use trun_io::process::spawn_process;
///
/// #[tokio::main]
/// async fn main() {
///     let mut child = spawn_process("echo", vec!["Hello".to_string()], None).unwrap();
///     let _output = child.stdout.take().unwrap();
/// }
/// ```
pub fn spawn_process(
    cmd: &str,
    args: Vec<String>,
    current_dir: Option<&Path>,
) -> Result<Child, io::Error> {
    let mut command = Command::new(OsStr::new(&cmd));
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }
    command.spawn()
}

/// Asynchronously check process status without blocking.
///
/// Includes a small async sleep to prevent excessive CPU usage when called in a loop.
pub async fn get_process_status(child: &mut Child) -> Result<ProcessStatus, ProcessError> {
    match child.try_wait() {
        Ok(Some(exit_status)) => Ok(ProcessStatus::Done(exit_status)),
        Ok(None) => {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(ProcessStatus::Running)
        }
        Err(err) => Err(ProcessError::WaitChildFail(err)),
    }
}

/// Asynchronously terminate a child process and everything it started.
///
/// Kills the child's process group, then kills the child and waits for it to
/// be reaped.
pub async fn stop_child(child: &mut Child) -> Result<(), io::Error> {
    if let Some(pid) = child.id() {
        kill_process_group(pid)?;
    }
    child.kill().await
}

/// Sends `SIGKILL` to every process in the group led by `pgid`.
///
/// A group with no processes left is not an error.
pub fn kill_process_group(pgid: u32) -> Result<(), io::Error> {
    let pgid = i32::try_from(pgid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Kills a child's process group when dropped.
///
/// Holding one for the lifetime of a run means background processes started by
/// the child never outlive the run, even when the run's future is cancelled.
#[derive(Debug)]
pub struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    pub fn new(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    /// Kills the group now. Later calls and the drop do nothing.
    pub fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            if let Err(err) = kill_process_group(pgid) {
                warn!("Failed to kill process group {pgid}: {err}");
            }
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Asynchronously capture the exit status of a child process.
pub async fn capture_exit_status(child: &mut Child) -> Result<ExitStatus, io::Error> {
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawned_process_runs_in_requested_directory() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let mut child = spawn_process(
            "sh",
            vec!["-c".to_string(), "touch created_here".to_string()],
            Some(dir.path()),
        )
        .expect("Couldn't spawn process");

        let status = capture_exit_status(&mut child)
            .await
            .expect("Couldn't get exit status");
        assert!(status.success());
        assert!(dir.path().join("created_here").exists());
    }

    #[tokio::test]
    async fn stopped_child_reports_status() {
        let mut child =
            spawn_process("sleep", vec!["60".to_string()], None).expect("Couldn't spawn sleep");
        assert!(matches!(
            get_process_status(&mut child).await,
            Ok(ProcessStatus::Running)
        ));

        stop_child(&mut child).await.expect("Couldn't kill child");
        let status = capture_exit_status(&mut child)
            .await
            .expect("Couldn't get exit status");
        assert!(!status.success());
    }

    #[tokio::test]
    async fn stopping_a_child_stops_its_background_jobs() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let mut child = spawn_process(
            "sh",
            vec![
                "-c".to_string(),
                "(sleep 1; touch late) & wait".to_string(),
            ],
            Some(dir.path()),
        )
        .expect("Couldn't spawn process");

        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_child(&mut child).await.expect("Couldn't kill child");

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!dir.path().join("late").exists());
    }

    #[tokio::test]
    async fn dropped_guard_kills_the_group() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        let child = spawn_process(
            "sh",
            vec![
                "-c".to_string(),
                "(sleep 1; touch late) & wait".to_string(),
            ],
            Some(dir.path()),
        )
        .expect("Couldn't spawn process");

        let guard = ProcessGroupGuard::new(&child);
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(guard);
        drop(child);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!dir.path().join("late").exists());
    }

    #[test]
    fn killing_an_empty_group_is_not_an_error() {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("Couldn't spawn true");
        let pid = child.id();
        child.wait().expect("Couldn't wait for true");
        assert!(kill_process_group(pid).is_ok());
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let result = spawn_process("this-program-does-not-exist-trun", Vec::new(), None);
        assert!(result.is_err());
    }
}
