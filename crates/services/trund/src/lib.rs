//! trun service (trund)
//!
//! Accepts a repository URL over HTTP, clones it, installs its dependencies,
//! runs its test suite and records the outcome. It provides:
//!
//! - **API Server**: `POST /runtests`, `GET /testresults` and `GET /health`
//! - **Orchestrator**: the clone → install → test pipeline, one isolated
//!   working directory per run
//! - **Result Store**: Postgres when `DATABASE_URL` is set, in-memory otherwise

pub mod api;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
