//! MCP tool argument types
//!
//! - Script execution (execute_comand_line_script)

pub mod script;
