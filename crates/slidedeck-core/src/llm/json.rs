//! Lenient JSON extraction from model responses.
//!
//! Models wrap JSON in code fences, add prose around it, leave trailing
//! commas and sometimes stop before closing every bracket. These helpers
//! recover a parseable document from all of those.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::LLMError;

/// Strips Markdown code fences, returning the inner text.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Cuts the text down to the outermost JSON object or array.
///
/// An object wins over an array when both appear; the end is the last
/// matching closer, or the end of text when the model stopped early.
pub fn clean_json(text: &str) -> String {
    let text = strip_fences(text);
    let obj = text.find('{');
    let arr = text.find('[');

    let (start, close) = match (obj, arr) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return text.to_string(),
    };

    match text.rfind(close) {
        Some(end) if end > start => text[start..=end].to_string(),
        _ => text[start..].to_string(),
    }
}

/// Repairs the common defects of truncated or sloppy JSON.
///
/// Removes trailing commas before closers and appends the closers for any
/// brackets (and a string) left open.
pub fn repair_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '{' => {
                stack.push('}');
                out.push(ch);
            }
            '[' => {
                stack.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                trim_trailing_comma(&mut out);
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        out.push('"');
    }
    trim_trailing_comma(&mut out);
    while let Some(close) = stack.pop() {
        out.push(close);
    }
    out
}

fn trim_trailing_comma(out: &mut String) {
    let kept = out.trim_end().len();
    if out[..kept].ends_with(',') {
        out.truncate(kept - 1);
    }
}

/// Parses a model response into `T`, repairing it when the strict parse fails.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LLMError> {
    let cleaned = clean_json(text);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(first) => serde_json::from_str(&repair_json(&cleaned))
            .map_err(|_| LLMError::ParseError(format!("invalid JSON from model: {first}"))),
    }
}

/// Parses a model response into an untyped JSON value.
pub fn parse_json_value(text: &str) -> Result<Value, LLMError> {
    parse_json(text)
}
