//! Balanced-brace JSON extraction from a `function_call` turn's value,
//! correctly handling nested objects and braces inside string literals —
//! not a naive first-`{`/last-`}` slice. A single extraction attempt; a
//! failure to find a balanced substring is itself a discard, with no
//! second fallback pass.

use super::error::{ValidationError, ValidationResult};

pub struct ExtractedCall {
    pub think_prefix: Option<String>,
    pub value: serde_json::Value,
}

pub fn extract_balanced_json(text: &str) -> ValidationResult<ExtractedCall> {
    let trimmed = text.trim();
    let (think_prefix, rest) = split_think_prefix(trimmed);
    let json_str = find_balanced_object(rest).ok_or(ValidationError::UnparsableCall)?;
    let value: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|_| ValidationError::UnparsableCall)?;
    Ok(ExtractedCall {
        think_prefix,
        value,
    })
}

fn split_think_prefix(text: &str) -> (Option<String>, &str) {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";
    if let Some(stripped) = text.strip_prefix(OPEN) {
        if let Some(close_idx) = stripped.find(CLOSE) {
            let prefix = format!("{OPEN}{}{CLOSE}", &stripped[..close_idx]);
            let rest = &stripped[close_idx + CLOSE.len()..];
            return (Some(prefix), rest.trim_start());
        }
    }
    (None, text)
}

/// Scan for the first genuinely balanced `{...}` substring, tracking string
/// state (and backslash escapes inside strings) so braces that appear
/// inside string literals never perturb the depth count.
fn find_balanced_object(text: &str) -> Option<String> {
    let bytes: Vec<char> = text.chars().collect();
    let start = bytes.iter().position(|&c| c == '{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &ch) in bytes[start..].iter().enumerate() {
        if in_string {
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
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(bytes[start..end].iter().collect());
                }
            }
            _ => {}
        }
    }
    None
}
