use crate::error::{EngineError, Result};
use serde::de::DeserializeOwned;

/// Parses a structured-output response, tolerating a Markdown code fence
/// around the JSON.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(EngineError::MalformedResponse("empty response".to_string()));
    }
    serde_json::from_str(body).map_err(Into::into)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
