//! Result store backends.
//!
//! The service only needs two operations: append one record and list all
//! records in storage order.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::prelude::*;
use crate::run::testrun::{TestRunCreate, TestRunDb};

/// Storage for test run outcomes.
pub trait TestRunStore: Send + Sync {
    /// Short name of the backend, reported by the health endpoint.
    fn backend_tag(&self) -> &'static str;

    /// Appends one record and returns it as stored.
    fn append(&self, run: TestRunCreate) -> Result<TestRunDb>;

    /// Lists every stored record in storage order.
    fn list(&self) -> Result<Vec<TestRunDb>>;
}

/// Postgres backed store.
#[derive(Debug, Clone)]
pub struct PgTestRunStore {
    connection: DbConnection,
}

impl PgTestRunStore {
    pub fn new(connection: DbConnection) -> Self {
        Self { connection }
    }
}

impl TestRunStore for PgTestRunStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    fn append(&self, run: TestRunCreate) -> Result<TestRunDb> {
        run.save(&self.connection)
    }

    fn list(&self) -> Result<Vec<TestRunDb>> {
        TestRunDb::fetch_all(&self.connection)
    }
}

/// In-process store.
///
/// Used when no database is configured and by tests. `fail_appends` and
/// `fail_lists` make the corresponding operation return
/// [`Error::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryTestRunStore {
    runs: Mutex<Vec<TestRunDb>>,
    pub fail_appends: AtomicBool,
    pub fail_lists: AtomicBool,
}

impl MemoryTestRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestRunStore for MemoryTestRunStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    fn append(&self, run: TestRunCreate) -> Result<TestRunDb> {
        if self.fail_appends.load(Ordering::Relaxed) {
            return Err(Error::Unavailable(String::from("writes are disabled")));
        }
        let stored = TestRunDb {
            id: Uuid::new_v4(),
            source_link: run.source_link,
            success: run.success,
            output: run.output,
            created_at: Utc::now(),
        };
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| Error::Unavailable(String::from("store lock poisoned")))?;
        runs.push(stored.clone());
        debug!("Stored test run {} ({} total)", stored.id, runs.len());
        Ok(stored)
    }

    fn list(&self) -> Result<Vec<TestRunDb>> {
        if self.fail_lists.load(Ordering::Relaxed) {
            return Err(Error::Unavailable(String::from("reads are disabled")));
        }
        let runs = self
            .runs
            .lock()
            .map_err(|_| Error::Unavailable(String::from("store lock poisoned")))?;
        Ok(runs.clone())
    }
}
