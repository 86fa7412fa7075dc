//! The script execution call
//!
//! [`ScriptExecutor`] is the handler behind the tool: decode the arguments,
//! materialize the script, run it under the deadline, render the report.
//! It holds no per-call state and can be shared freely between tasks.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::materialize::ScriptFile;
use crate::report::Report;
use crate::request::{Defaults, ScriptRequest};
use crate::runner::{ProcessRunner, RunSpec};

/// Runs script requests end to end
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    defaults: Defaults,
    runner: ProcessRunner,
    scratch_dir: PathBuf,
}

impl ScriptExecutor {
    /// Create an executor offering `defaults` for omitted arguments
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults,
            runner: ProcessRunner::default(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Override the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = ProcessRunner::new(timeout);
        self
    }

    /// Materialize scripts under `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Defaults applied to omitted arguments
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// The deadline applied to every run
    pub fn timeout(&self) -> Duration {
        self.runner.timeout()
    }

    /// Decode raw tool arguments and run them
    pub async fn execute(&self, arguments: &Map<String, Value>) -> Report {
        match ScriptRequest::from_arguments(arguments, &self.defaults) {
            Ok(request) => self.execute_request(&request).await,
            Err(e) => {
                warn!(error = %e, "Rejected script request");
                Report::from(&e)
            }
        }
    }

    /// Run an already validated request
    pub async fn execute_request(&self, request: &ScriptRequest) -> Report {
        let script = match ScriptFile::create_in(&request.content, &self.scratch_dir) {
            Ok(script) => script,
            Err(e) => {
                warn!(error = %e, "Could not materialize script");
                return Report::from(&e);
            }
        };

        info!(
            interpreter = %request.interpreter,
            working_dir = ?request.working_dir,
            "Executing script"
        );

        let spec = RunSpec::inherit_env(request.interpreter.as_str(), script.path())
            .with_working_dir(request.working_dir.clone());
        let outcome = self.runner.run(&spec).await;

        if let Err(e) = script.close() {
            warn!(error = %e, "Failed to remove script file");
        }

        Report::from_outcome(&outcome)
    }
}
