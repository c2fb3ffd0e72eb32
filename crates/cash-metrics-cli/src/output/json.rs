use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = write_json(&mut out, value) {
        eprintln!("JSON output error: {}", e);
    }
}

/// Pretty JSON followed by a newline.
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)
}
