//! Script execution tool arguments
//!
//! Arguments are accepted as a raw JSON object and validated by
//! [`runscript_core::ScriptRequest::from_arguments`], so a missing or
//! mistyped field comes back to the agent as an in-band tool error instead of
//! a protocol error. The schema advertised to clients is still the typed one.

use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Arguments for `execute_comand_line_script`
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ExecuteScriptArgs(pub Map<String, Value>);

impl JsonSchema for ExecuteScriptArgs {
    fn schema_name() -> Cow<'static, str> {
        "ExecuteScriptArgs".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Full script content to execute. Written verbatim to a private temporary file that is passed to the interpreter."
                },
                "interpreter": {
                    "type": "string",
                    "description": "Path to interpreter binary (e.g. /bin/sh, /bin/bash, /usr/bin/python3, cmd.exe). Defaults to the platform shell."
                },
                "working_dir": {
                    "type": "string",
                    "description": "Execution directory path. Defaults to the user's home directory; an empty string keeps the server's directory."
                }
            },
            "required": ["content"]
        })
    }
}
