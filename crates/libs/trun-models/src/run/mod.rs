//! Test run models.
//!
//! A test run is one clone + install + test attempt and its recorded outcome.
//! Runs are immutable once stored: there is no update or delete path.

pub mod store;
pub mod testrun;
