//! Script request decoding
//!
//! Tool arguments arrive as an untyped JSON object. They are decoded into a
//! [`ScriptRequest`] in one step, with caller-omitted fields filled from
//! [`Defaults`] captured when the server started.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Interpreter used when the caller does not name one
#[cfg(windows)]
pub const PLATFORM_SHELL: &str = "cmd.exe";

/// Interpreter used when the caller does not name one
#[cfg(not(windows))]
pub const PLATFORM_SHELL: &str = "/bin/sh";

/// Values offered to callers for omitted arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Interpreter path
    pub interpreter: String,
    /// Working directory; `None` inherits the server's own
    pub working_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interpreter: PLATFORM_SHELL.to_string(),
            working_dir: None,
        }
    }
}

/// A validated request to run one script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    /// Script body, written out verbatim
    pub content: String,
    /// Interpreter the script path is handed to
    pub interpreter: String,
    /// Directory the child starts in; `None` inherits the server's
    pub working_dir: Option<PathBuf>,
}

impl ScriptRequest {
    /// Create a request with the given body and default settings
    pub fn new(content: impl Into<String>) -> Self {
        let defaults = Defaults::default();
        Self {
            content: content.into(),
            interpreter: defaults.interpreter,
            working_dir: defaults.working_dir,
        }
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Decode tool arguments, failing closed on missing or mistyped fields.
    ///
    /// An explicit empty `working_dir` means "inherit the server's directory"
    /// and overrides the default.
    pub fn from_arguments(arguments: &Map<String, Value>, defaults: &Defaults) -> Result<Self> {
        let content = match arguments.get("content") {
            None | Some(Value::Null) => return Err(Error::MissingContent),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(Error::NotAString("content")),
        };
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }

        let interpreter = optional_string(arguments, "interpreter")?
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.interpreter.clone());

        let working_dir = match optional_string(arguments, "working_dir")? {
            Some(dir) if dir.is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => defaults.working_dir.clone(),
        };

        Ok(Self {
            content,
            interpreter,
            working_dir,
        })
    }
}

fn optional_string(arguments: &Map<String, Value>, key: &'static str) -> Result<Option<String>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::NotAString(key)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn home_defaults() -> Defaults {
        Defaults {
            interpreter: "/bin/bash".to_string(),
            working_dir: Some(PathBuf::from("/home/agent")),
        }
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        let request =
            ScriptRequest::from_arguments(&args(json!({"content": "echo hi"})), &home_defaults())
                .unwrap();

        assert_eq!(request.content, "echo hi");
        assert_eq!(request.interpreter, "/bin/bash");
        assert_eq!(request.working_dir, Some(PathBuf::from("/home/agent")));
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let request = ScriptRequest::from_arguments(
            &args(json!({
                "content": "print(1)",
                "interpreter": "/usr/bin/python3",
                "working_dir": "/tmp"
            })),
            &home_defaults(),
        )
        .unwrap();

        assert_eq!(request.interpreter, "/usr/bin/python3");
        assert_eq!(request.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn empty_working_dir_inherits() {
        let request = ScriptRequest::from_arguments(
            &args(json!({"content": "pwd", "working_dir": ""})),
            &home_defaults(),
        )
        .unwrap();

        assert_eq!(request.working_dir, None);
    }

    #[test]
    fn missing_content_is_rejected() {
        let err = ScriptRequest::from_arguments(&args(json!({})), &Defaults::default()).unwrap_err();
        assert!(matches!(err, Error::MissingContent));
        assert!(err.is_validation());

        let err = ScriptRequest::from_arguments(&args(json!({"content": null})), &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingContent));
    }

    #[test]
    fn mistyped_fields_are_rejected() {
        let err = ScriptRequest::from_arguments(&args(json!({"content": 42})), &Defaults::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "content must be a string");

        let err = ScriptRequest::from_arguments(
            &args(json!({"content": "true", "interpreter": ["sh"]})),
            &Defaults::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "interpreter must be a string");

        let err = ScriptRequest::from_arguments(
            &args(json!({"content": "true", "working_dir": false})),
            &Defaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotAString("working_dir")));
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = ScriptRequest::from_arguments(&args(json!({"content": ""})), &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent));
    }
}
