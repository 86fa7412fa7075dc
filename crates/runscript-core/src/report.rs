//! Rendering outcomes into the text returned to the caller

use std::fmt::Write as _;
use std::time::Duration;

use crate::error::Error;
use crate::runner::{ExecutionOutcome, ExitState};

/// Text payload of a call plus whether it counts as a tool failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Rendered result
    pub text: String,
    /// Set for validation, resource, launch and timeout failures
    pub is_error: bool,
}

impl Report {
    /// A failure report carrying just a message
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Render a finished run.
    ///
    /// Layout: an `Output:` section if stdout is non-empty, an `Errors:`
    /// section if stderr is non-empty, then an `Execution error:` line for
    /// anything but a clean exit. A timeout renders only the timeout message;
    /// output captured before the kill is dropped.
    pub fn from_outcome(outcome: &ExecutionOutcome) -> Self {
        if let ExitState::TimedOut { after, kill_error } = &outcome.state {
            let mut text = format!("Script execution timed out after {}", describe(*after));
            if let Some(e) = kill_error {
                let _ = write!(text, "\nFailed to terminate script: {e}");
            }
            return Self::error(text);
        }

        let mut text = String::new();
        if !outcome.stdout.is_empty() {
            text.push_str("Output:\n");
            text.push_str(&String::from_utf8_lossy(&outcome.stdout));
            text.push('\n');
        }
        if !outcome.stderr.is_empty() {
            text.push_str("Errors:\n");
            text.push_str(&String::from_utf8_lossy(&outcome.stderr));
            text.push('\n');
        }

        let is_error = match &outcome.state {
            ExitState::Success | ExitState::TimedOut { .. } => false,
            ExitState::NonZero(status) => {
                let _ = write!(text, "\nExecution error: {status}");
                false
            }
            ExitState::Faulted(e) => {
                let _ = write!(text, "\nExecution error: {e}");
                false
            }
            ExitState::LaunchFailed(e) => {
                let _ = write!(text, "\nExecution error: failed to launch script: {e}");
                true
            }
        };

        Self { text, is_error }
    }
}

impl From<&Error> for Report {
    fn from(err: &Error) -> Self {
        Self::error(err.to_string())
    }
}

fn describe(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        let secs = d.as_secs();
        format!("{secs} second{}", if secs == 1 { "" } else { "s" })
    } else {
        format!("{} milliseconds", d.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn outcome(stdout: &str, stderr: &str, state: ExitState) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            state,
        }
    }

    #[test]
    fn stdout_only() {
        let report = Report::from_outcome(&outcome("hello\n", "", ExitState::Success));

        assert_eq!(report.text, "Output:\nhello\n\n");
        assert!(!report.is_error);
    }

    #[test]
    fn stderr_only() {
        let report = Report::from_outcome(&outcome("", "oops\n", ExitState::Success));

        assert_eq!(report.text, "Errors:\noops\n\n");
        assert!(!report.text.contains("Output:"));
    }

    #[test]
    fn both_streams_keep_order() {
        let report = Report::from_outcome(&outcome("out", "err", ExitState::Success));

        assert_eq!(report.text, "Output:\nout\nErrors:\nerr\n");
    }

    #[test]
    fn clean_exit_without_output_is_empty() {
        let report = Report::from_outcome(&outcome("", "", ExitState::Success));

        assert_eq!(report.text, "");
        assert!(!report.is_error);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_appends_status() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(1 << 8);
        let report = Report::from_outcome(&outcome("partial", "", ExitState::NonZero(status)));

        assert!(report.text.starts_with("Output:\npartial\n"));
        assert!(report.text.ends_with("\nExecution error: exit status: 1"), "{}", report.text);
        assert!(!report.is_error);
    }

    #[test]
    fn launch_failure_has_no_sections() {
        let err = io::Error::new(
            io::ErrorKind::NotFound,
            "interpreter /usr/bin/nope: No such file or directory",
        );
        let report = Report::from_outcome(&outcome("", "", ExitState::LaunchFailed(err)));

        assert_eq!(
            report.text,
            "\nExecution error: failed to launch script: interpreter /usr/bin/nope: No such file or directory"
        );
        assert!(report.is_error);
    }

    #[test]
    fn timeout_discards_output() {
        let state = ExitState::TimedOut {
            after: Duration::from_secs(30),
            kill_error: None,
        };
        let report = Report::from_outcome(&outcome("before the kill", "warn", state));

        assert_eq!(report.text, "Script execution timed out after 30 seconds");
        assert!(report.is_error);
    }

    #[test]
    fn timeout_surfaces_kill_failure() {
        let state = ExitState::TimedOut {
            after: Duration::from_millis(250),
            kill_error: Some(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        };
        let report = Report::from_outcome(&outcome("", "", state));

        assert_eq!(
            report.text,
            "Script execution timed out after 250 milliseconds\nFailed to terminate script: denied"
        );
    }

    #[test]
    fn errors_render_their_message() {
        let report = Report::from(&Error::MissingContent);

        assert_eq!(report.text, "content must be provided");
        assert!(report.is_error);
    }
}
