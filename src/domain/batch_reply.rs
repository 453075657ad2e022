//! Batch Update Reply
//!
//! The batch rank RPC answers with the literal `"success"` or an error payload.
//! Anything else is treated as malformed, never as success.

use serde::{Deserialize, Serialize};

const SUCCESS_LITERAL: &str = "success";
const ERROR_WORD: &str = "error";

/// Parsed reply of a batch rank update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchReply {
    Success,
    /// A recognisable error payload, with its message
    Rejected(String),
    /// Neither success nor a recognisable error
    Malformed(String),
}

impl BatchReply {
    /// Parse a raw reply body.
    ///
    /// Accepted forms:
    /// - `success` or `"success"` (JSON string)
    /// - `{"error": "..."}`, `{"message": "..."}`, `{"error": {"message": "..."}}`
    /// - `error: ...` / `"error: ..."` plain strings
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return BatchReply::Malformed(String::new());
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::String(s)) => Self::from_text(&s, trimmed),
            Ok(serde_json::Value::Object(map)) => {
                let message = map
                    .get("error")
                    .and_then(|err| match err {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Object(inner) => inner
                            .get("message")
                            .and_then(|m| m.as_str())
                            .map(str::to_string),
                        _ => None,
                    })
                    .or_else(|| map.get("message").and_then(|m| m.as_str()).map(str::to_string));

                match message {
                    Some(msg) => BatchReply::Rejected(msg),
                    None => BatchReply::Malformed(trimmed.to_string()),
                }
            }
            Ok(_) => BatchReply::Malformed(trimmed.to_string()),
            Err(_) => Self::from_text(trimmed, trimmed),
        }
    }

    fn from_text(text: &str, raw: &str) -> Self {
        let text = text.trim();
        if text == SUCCESS_LITERAL {
            return BatchReply::Success;
        }
        if let Some(rest) = strip_error_prefix(text) {
            let msg = rest.trim_start_matches(':').trim();
            let msg = if msg.is_empty() { text } else { msg };
            return BatchReply::Rejected(msg.to_string());
        }
        BatchReply::Malformed(raw.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchReply::Success)
    }
}

/// `error`, `error: ..` or `error ..`, case-insensitive; not `errorless`
fn strip_error_prefix(text: &str) -> Option<&str> {
    let head = text.get(..ERROR_WORD.len())?;
    if !head.eq_ignore_ascii_case(ERROR_WORD) {
        return None;
    }
    let rest = &text[ERROR_WORD.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c == ':' || c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}
