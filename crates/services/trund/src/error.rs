//! Error types for the trun service.
//!
//! Covers start-up failures: configuration, store connection and socket
//! binding. Per-request failures are reported through `trun_web::error::Error`
//! and the orchestrator's own error type.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] trun_models::error::Error),

    #[error("Invalid value for {var}: {reason}")]
    InvalidConfig { var: &'static str, reason: String },
}
