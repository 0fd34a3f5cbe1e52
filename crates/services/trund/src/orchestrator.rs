//! Clone → install → test pipeline.
//!
//! Each run gets its own working directory under the configured root. Every
//! subprocess receives its working directory explicitly, so concurrent runs
//! never share state. The working directory is removed when the run ends,
//! whichever way it ends.

use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use trun_io::runner::RunnerError;
use uuid::Uuid;

use crate::config::PipelineConfig;

/// Output recorded for a run where every step succeeded.
pub const SUCCESS_MESSAGE: &str = "Tests completed successfully";

/// Why a run failed. Wraps the failing step's runner error.
#[derive(thiserror::Error, Debug)]
pub enum OrchestratorError {
    #[error("Failed to prepare working directory root {path:?}: {source}")]
    WorkRoot { path: PathBuf, source: io::Error },

    #[error("Failed to clone repository: {0}")]
    Clone(RunnerError),

    #[error("Failed to install dependencies: {0}")]
    Install(RunnerError),

    #[error("Error running tests: {0}")]
    Test(RunnerError),
}

/// Result of one run, as recorded and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    /// [`SUCCESS_MESSAGE`] or the failure reason.
    pub output: String,
}

impl From<Result<(), OrchestratorError>> for RunOutcome {
    fn from(value: Result<(), OrchestratorError>) -> Self {
        match value {
            Ok(()) => Self {
                success: true,
                output: SUCCESS_MESSAGE.to_string(),
            },
            Err(err) => Self {
                success: false,
                output: err.to_string(),
            },
        }
    }
}

/// A run's working directory.
///
/// The directory itself is created by the clone step. Dropping the guard
/// removes it, so it disappears on every exit path including panics and
/// cancelled requests. [`WorkDir::remove`] does the same without blocking
/// the runtime and is used on the normal path.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Picks a fresh directory name under `root`: creation time in
    /// milliseconds plus a random suffix, so simultaneous runs never collide.
    pub fn allocate(root: &Path) -> Self {
        let name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        Self {
            path: root.join(name),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively removes the directory. A missing directory is not an error.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Removed working directory {:?}", self.path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove working directory {:?}: {err}", self.path),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed abandoned working directory {:?}", self.path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove working directory {:?}: {err}", self.path),
        }
    }
}

/// Runs the clone → install → test pipeline for source links.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pipeline: PipelineConfig,
}

impl Orchestrator {
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self { pipeline }
    }

    /// Runs every step for `source_link` and reports the outcome.
    ///
    /// Never fails: step failures become an unsuccessful [`RunOutcome`].
    pub async fn run(&self, source_link: &str) -> RunOutcome {
        let root = match self.prepare_root().await {
            Ok(root) => root,
            Err(err) => {
                error!("Cannot run tests for {source_link}: {err}");
                return Err::<(), _>(err).into();
            }
        };

        let workdir = WorkDir::allocate(&root);
        info!("Running tests for {source_link} in {:?}", workdir.path());

        let result = self.run_steps(source_link, workdir.path()).await;
        workdir.remove().await;

        match &result {
            Ok(()) => info!("Tests passed for {source_link}"),
            Err(err) => warn!("Tests failed for {source_link}: {err}"),
        }
        result.into()
    }

    /// Creates the root directory if needed and returns its absolute path.
    async fn prepare_root(&self) -> Result<PathBuf, OrchestratorError> {
        let root = &self.pipeline.work_root;
        let wrap = |source: io::Error| OrchestratorError::WorkRoot {
            path: root.clone(),
            source,
        };
        tokio::fs::create_dir_all(root).await.map_err(wrap)?;
        tokio::fs::canonicalize(root).await.map_err(wrap)
    }

    async fn run_steps(&self, source_link: &str, workdir: &Path) -> Result<(), OrchestratorError> {
        let timeout = self.pipeline.step_timeout;
        let root = workdir.parent().unwrap_or(workdir);

        self.pipeline
            .clone_cmd
            .render(source_link, workdir)
            .current_dir(root)
            .run_to_completion(timeout)
            .await
            .map_err(OrchestratorError::Clone)?;

        self.pipeline
            .install_cmd
            .render(source_link, workdir)
            .current_dir(workdir)
            .run_to_completion(timeout)
            .await
            .map_err(OrchestratorError::Install)?;

        self.pipeline
            .test_cmd
            .render(source_link, workdir)
            .current_dir(workdir)
            .run_to_completion(timeout)
            .await
            .map_err(OrchestratorError::Test)?;

        Ok(())
    }
}
