use std::{path::Path, sync::Arc};

use tempfile::TempDir;
use tokio::task::JoinHandle;
use trun_models::run::store::MemoryTestRunStore;
use trund::{
    api::{ApiState, setup_api},
    config::{CommandTemplate, PipelineConfig},
    orchestrator::Orchestrator,
};

use super::api_client::ApiClient;

/// A server bound to an ephemeral port, backed by an in-memory store and a
/// private working directory root.
pub struct TestContext {
    pub api: ApiClient,
    pub client: reqwest::Client,
    pub store: Arc<MemoryTestRunStore>,
    pub work_root: TempDir,
    server: JoinHandle<trund::prelude::Result<()>>,
}

impl TestContext {
    /// Clone creates the working directory, install and test succeed.
    pub async fn new() -> Self {
        Self::with_pipeline(|_| {}).await
    }

    pub async fn with_pipeline(customize: impl FnOnce(&mut PipelineConfig)) -> Self {
        let work_root = tempfile::tempdir().expect("Couldn't create work root");
        let mut pipeline = PipelineConfig {
            work_root: work_root.path().to_path_buf(),
            clone_cmd: CommandTemplate::new("mkdir", vec!["{workdir}"]),
            install_cmd: CommandTemplate::new("true", Vec::<String>::new()),
            test_cmd: CommandTemplate::new("true", Vec::<String>::new()),
            step_timeout: None,
        };
        customize(&mut pipeline);

        let store = Arc::new(MemoryTestRunStore::new());
        let state = ApiState::new(store.clone(), Orchestrator::new(pipeline));
        let (addr, server) = setup_api("127.0.0.1:0", state)
            .await
            .expect("Failed to start api");

        Self {
            api: ApiClient {
                url: format!("http://{addr}"),
            },
            client: reqwest::Client::new(),
            store,
            work_root,
            server,
        }
    }

    pub fn leftover_workdirs(&self) -> usize {
        count_entries(self.work_root.path())
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
