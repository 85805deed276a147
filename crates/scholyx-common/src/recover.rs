//! Tolerant JSON recovery for model output.
//!
//! LLM analyzers occasionally wrap their JSON in markdown code fences or
//! surround it with prose. Recovery is a fixed, bounded sequence of attempts
//! rather than open-ended string surgery: direct parse, fence stripping,
//! then brace-window extraction. Anything still unparseable is an error.

use tracing::{debug, warn};
use crate::error::ScholyxError;

/// Parse `raw` as JSON, recovering from the common wrapping failures.
pub fn recover_json(raw: &str) -> Result<serde_json::Value, ScholyxError> {
    let trimmed = raw.trim();

    // Attempt 1: the payload is already valid JSON.
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    // Attempt 2: strip markdown code fences (```json ... ``` or ``` ... ```).
    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str(inner.trim()) {
            debug!("Recovered JSON payload from code fence");
            return Ok(value);
        }
    }

    // Attempt 3: take the outermost brace window, dropping surrounding prose.
    if let Some(window) = brace_window(trimmed) {
        if let Ok(value) = serde_json::from_str(window) {
            debug!("Recovered JSON payload from brace window");
            return Ok(value);
        }
    }

    warn!(len = raw.len(), "JSON recovery exhausted all attempts");
    Err(ScholyxError::Serialization(
        serde_json::from_str::<serde_json::Value>(trimmed).unwrap_err(),
    ))
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // A language tag may follow the opening fence.
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    let end = rest.rfind("```")?;
    Some(&rest[..end])
}

fn brace_window(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_passes_through() {
        let value = recover_json(r#"{"score": 91.5}"#).unwrap();
        assert_eq!(value["score"], 91.5);
    }

    #[test]
    fn test_fenced_json_recovered() {
        let raw = "```json\n{\"summary\": \"ok\"}\n```";
        let value = recover_json(raw).unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_prose_wrapped_json_recovered() {
        let raw = "Here is the analysis you asked for:\n{\"keywords\": [\"a\"]}\nLet me know!";
        let value = recover_json(raw).unwrap();
        assert_eq!(value["keywords"][0], "a");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(recover_json("no json here at all").is_err());
    }
}
