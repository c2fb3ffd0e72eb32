pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed request from `--input <file.json>`, falling back to piped stdin.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}
