//! JSON I/O handling for CLI
//!
//! - Input: single JSON document via stdin
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

fn parse_request(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Success envelope
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope, `details` omitted when `None`
pub fn error_response(code: &str, message: &str, details: Option<Value>) -> Value {
    let mut response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let (Some(details), Some(obj)) = (details, response.as_object_mut()) {
        obj.insert("details".to_string(), details);
    }
    response
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&ok_response(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, details: Option<Value>) -> CliResult<()> {
    write_json(&error_response(code, message, details))
}

fn write_json(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
