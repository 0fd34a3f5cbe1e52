//! Web layer for trun.
//!
//! This library provides the JSON payloads of the HTTP API, the responses for
//! test run submissions, and the web error type that turns failures into
//! HTTP status codes.

pub mod error;
pub mod prelude;
pub mod testrun;
