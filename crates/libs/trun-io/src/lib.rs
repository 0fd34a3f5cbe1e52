//! Process execution and I/O management for trun.
//!
//! Provides utilities for spawning, monitoring, and controlling external processes
//! with real-time output capture and timeout handling. Every process is started in
//! an explicit working directory; nothing in this crate touches the working
//! directory of the current process.
//!
//! # Usage
//!
//! ```rust,no_run
//! use trun_io::runner::Runner;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new("npm", vec!["test"]).current_dir("/tmp/checkout");
//!     match runner.run_to_completion(None).await {
//!         Ok(output) => println!("Tests passed:\n{}", output.output),
//!         Err(err) => println!("Tests failed: {err}"),
//!     }
//! }
//! ```

pub mod process;
pub mod runner;
