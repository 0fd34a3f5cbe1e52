//! Database models and result storage for trun.
//!
//! Provides the Diesel-based `testrun` model, the [`run::store::TestRunStore`]
//! abstraction used by the service, and its Postgres and in-memory backends.
//!
//! # Usage
//!
//! ```rust,no_run
//! use trun_models::{
//!     db::{config::DbConfig, connection::DbConnection},
//!     run::store::{PgTestRunStore, TestRunStore},
//! };
//!
//! let config = DbConfig::from_env().expect("DATABASE_URL not set");
//! let connection = DbConnection::new(&config).unwrap().setup().unwrap();
//! let store = PgTestRunStore::new(connection);
//!
//! let runs = store.list().unwrap();
//! println!("Found {} test runs", runs.len());
//! ```

pub mod db;
pub mod error;
pub mod prelude;
pub mod run;
mod schema;
