//! Runscript Core - run caller-supplied scripts under a deadline
//!
//! Each call writes the script body to a private temporary file, hands that
//! file to an interpreter as a child process, and turns whatever happened
//! into a single text report:
//!
//! - [`request`] - decode and validate tool arguments
//! - [`materialize`] - owner-only scratch files removed on drop
//! - [`runner`] - spawn, capture stdout/stderr, enforce the deadline
//! - [`report`] - render an outcome as `Output:` / `Errors:` / `Execution error:`
//! - [`executor`] - the full call, composed from the above
//!
//! ## Example
//!
//! ```no_run
//! use runscript_core::{Defaults, ScriptExecutor, ScriptRequest};
//!
//! # async fn demo() {
//! let executor = ScriptExecutor::new(Defaults::default());
//! let report = executor
//!     .execute_request(&ScriptRequest::new("echo hello"))
//!     .await;
//! assert!(report.text.contains("Output:"));
//! # }
//! ```

pub mod error;
pub mod executor;
pub mod materialize;
pub mod report;
pub mod request;
pub mod runner;

pub use error::{Error, Result};
pub use executor::ScriptExecutor;
pub use materialize::{ScriptFile, materialize};
pub use report::Report;
pub use request::{Defaults, PLATFORM_SHELL, ScriptRequest};
pub use runner::{DEFAULT_TIMEOUT, ExecutionOutcome, ExitState, ProcessRunner, RunSpec};
