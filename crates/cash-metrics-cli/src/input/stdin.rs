use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin, or `None` when stdin is an interactive terminal or
/// carries nothing.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    tracing::debug!(bytes = trimmed.len(), "Read request from stdin");
    Ok(Some(serde_json::from_str(trimmed)?))
}
