//! High-level process runner with event handling.

use std::{
    path::PathBuf,
    process::ExitStatus,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc::{Sender, channel},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::process::{
    ProcessGroupGuard, ProcessStatus, capture_exit_status, get_process_status, spawn_process,
    stop_child,
};

/// How long the stream readers, together, may keep draining once the process
/// has exited.
///
/// A process outside the child's group that inherited the pipes can keep them
/// open forever.
const STREAM_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Events emitted during process execution.
#[derive(Debug, PartialEq)]
pub enum RunEvent {
    /// Process creation failed with error message.
    ProcessCreationFailed(String),
    /// Process was successfully created.
    ProcessCreated,
    /// Process ended (true = success, false = failure).
    ProcessEnd(bool),
    /// New output chunk from the process (stdout or stderr).
    ProcessNewOutputLine(String),
}

/// Errors produced when running a command to completion.
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error("Failed to start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` process exited with code {code}")]
    ExitCode { command: String, code: i32 },

    #[error("`{command}` process was terminated by a signal")]
    Terminated { command: String },

    #[error("`{command}` process timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Failed to get exit status from `{command}`")]
    ExitStatusUnavailable { command: String },
}

/// Output captured from a command that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything the process wrote to stdout and stderr, in arrival order.
    pub output: String,
}

/// High-level process runner with event-driven output handling.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Command to execute.
    command: String,
    /// Command line arguments.
    args: Vec<String>,
    /// Directory the process starts in. `None` inherits ours.
    current_dir: Option<PathBuf>,
}

impl Runner {
    /// Create a new runner with command and arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trun_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
            current_dir: None,
        }
    }

    /// Create a new runner with just a command (no arguments).
    pub fn new_without_args(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Start the process in `dir` instead of the current working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Get the full command string with arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trun_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la"]);
    /// assert_eq!(runner.get_full_command(), "ls -la");
    /// ```
    pub fn get_full_command(&self) -> String {
        if self.args.is_empty() {
            return self.command.clone();
        }
        format!("{} {}", &self.command, &self.args.join(" "))
    }

    async fn read_stream<T: AsyncRead + Unpin>(tx: Sender<RunEvent>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buffer[..n]);
                    if tx
                        .send(RunEvent::ProcessNewOutputLine(data.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn launch_stream_reader<T>(tx: Sender<RunEvent>, stream: T) -> JoinHandle<()>
    where
        T: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(Runner::read_stream(tx, stream))
    }

    async fn join_stream_readers(mut handles: Vec<JoinHandle<()>>) {
        let drain = async {
            for handle in handles.iter_mut() {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(STREAM_DRAIN_GRACE, drain).await.is_err() {
            warn!("Output stream still open after process exit, abandoning it");
            for handle in &handles {
                handle.abort();
            }
        }
    }

    /// Run the process with event monitoring.
    ///
    /// Starts the process and monitors its execution, sending events via the provided channel.
    /// Reads stdout and stderr until the process finishes or is stopped.
    /// Once the process has exited, or when this future is dropped, whatever
    /// is left of its process group is killed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trun_io::runner::{Runner, RunEvent};
    /// use std::sync::{Arc, atomic::AtomicBool};
    /// use tokio::sync::mpsc::channel;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let runner = Runner::new("echo", vec!["Hello"]);
    ///     let (tx, mut rx) = channel(16);
    ///     let should_stop = Arc::new(AtomicBool::new(false));
    ///
    ///     let collect = async {
    ///         let mut events = Vec::new();
    ///         while let Some(event) = rx.recv().await {
    ///             events.push(event);
    ///         }
    ///         events
    ///     };
    ///     let (exit_status, events) = tokio::join!(runner.run(tx, should_stop), collect);
    ///     assert!(exit_status.unwrap().success());
    ///     assert_eq!(events.last(), Some(&RunEvent::ProcessEnd(true)));
    /// }
    /// ```
    pub async fn run(
        &self,
        tx: Sender<RunEvent>,
        should_stop: Arc<AtomicBool>,
    ) -> Option<ExitStatus> {
        let mut process = match spawn_process(
            &self.command,
            self.args.clone(),
            self.current_dir.as_deref(),
        ) {
            Ok(process) => process,
            Err(err) => {
                let _ = tx.send(RunEvent::ProcessCreationFailed(err.to_string())).await;
                return None;
            }
        };

        let mut group = ProcessGroupGuard::new(&process);
        let _ = tx.send(RunEvent::ProcessCreated).await;

        // Take stdout and stderr and launch a stream reader for each
        let stdout_task = process
            .stdout
            .take()
            .map(|stdout| Runner::launch_stream_reader(tx.clone(), stdout));
        let stderr_task = process
            .stderr
            .take()
            .map(|stderr| Runner::launch_stream_reader(tx.clone(), stderr));

        // Loop until we either get asked to stop or the process ends
        let exit_status = loop {
            if should_stop.load(Ordering::Relaxed) {
                if stop_child(&mut process).await.is_err() {
                    break None;
                }
                break capture_exit_status(&mut process).await.ok();
            }
            match get_process_status(&mut process).await {
                Err(_) => break None,
                Ok(ProcessStatus::Done(status)) => break Some(status),
                Ok(ProcessStatus::Running) => {}
            };
        };

        // Leftover background jobs would keep the pipes open and outlive the run
        group.kill();
        let readers = stdout_task.into_iter().chain(stderr_task).collect();
        Runner::join_stream_readers(readers).await;

        let success = exit_status.is_some_and(|status| status.success());
        let _ = tx.send(RunEvent::ProcessEnd(success)).await;
        exit_status
    }

    /// Run the process until it exits, capturing its output.
    ///
    /// Succeeds only when the process exits with status code 0. Every output
    /// chunk is also logged at debug level. When `timeout` is set and elapses,
    /// the process is killed and [`RunnerError::Timeout`] is returned.
    pub async fn run_to_completion(
        &self,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, RunnerError> {
        let command = self.get_full_command();
        let (tx, mut rx) = channel(64);
        let should_stop = Arc::new(AtomicBool::new(false));

        let timer = timeout.map(|limit| {
            let stop = should_stop.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                stop.store(true, Ordering::Relaxed);
            })
        });

        let collect = async {
            let mut output = String::new();
            let mut creation_failure = None;
            while let Some(event) = rx.recv().await {
                match event {
                    RunEvent::ProcessCreationFailed(reason) => creation_failure = Some(reason),
                    RunEvent::ProcessNewOutputLine(chunk) => {
                        debug!("[{command}] {}", chunk.trim_end());
                        output.push_str(&chunk);
                    }
                    RunEvent::ProcessCreated | RunEvent::ProcessEnd(_) => {}
                }
            }
            (output, creation_failure)
        };

        let (exit_status, (output, creation_failure)) =
            tokio::join!(self.run(tx, should_stop.clone()), collect);

        if let Some(timer) = timer {
            timer.abort();
        }

        if let Some(reason) = creation_failure {
            return Err(RunnerError::Spawn { command, reason });
        }
        if let (Some(timeout), true) = (timeout, should_stop.load(Ordering::Relaxed)) {
            return Err(RunnerError::Timeout { command, timeout });
        }

        let status = exit_status.ok_or_else(|| RunnerError::ExitStatusUnavailable {
            command: command.clone(),
        })?;
        if status.success() {
            return Ok(CommandOutput { output });
        }
        match status.code() {
            Some(code) => Err(RunnerError::ExitCode { command, code }),
            None => Err(RunnerError::Terminated { command }),
        }
    }
}
