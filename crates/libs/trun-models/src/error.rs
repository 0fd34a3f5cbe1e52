//! Database error types.

/// Result storage errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Database connection pool error.
    #[error(transparent)]
    R2D2(#[from] diesel::r2d2::PoolError),

    /// Diesel ORM operation error.
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    /// Pending migrations could not be applied.
    #[error("Failed to run database migrations: {0}")]
    Migration(String),

    /// The storage backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
