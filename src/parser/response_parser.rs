//! Line-oriented state machine parser: free-form `HUMAN:`/`ASSISTANT:`/
//! `FUNCTION_CALL:`/`OBSERVATION:` text → a validated turn list. Syntax
//! only — semantic validation is the Tool Validator's job.

use crate::model::{Role, Turn};

pub struct ParsedResponse {
    pub turns: Vec<Turn>,
    pub count: usize,
}

struct PrefixMatch {
    role: Role,
    rest: String,
}

/// Recognized prefixes are case-sensitive; `H:`/`A:` are one-letter
/// shorthands for `HUMAN:`/`ASSISTANT:`. `ASSISTANT:`/`A:` canonicalize to
/// the `gpt` role token, matching the turn-role vocabulary used throughout
/// the rest of the pipeline.
fn match_prefix(line: &str) -> Option<PrefixMatch> {
    const PREFIXES: &[(&str, Role)] = &[
        ("HUMAN:", Role::Human),
        ("H:", Role::Human),
        ("ASSISTANT:", Role::Gpt),
        ("A:", Role::Gpt),
        ("FUNCTION_CALL:", Role::FunctionCall),
        ("OBSERVATION:", Role::Observation),
    ];
    for (prefix, role) in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Some(PrefixMatch {
                role: *role,
                rest: rest.to_string(),
            });
        }
    }
    None
}

pub fn parse_response(text: &str) -> ParsedResponse {
    let mut turns = Vec::new();
    let mut current: Option<(Role, Vec<String>)> = None;

    for raw_line in text.lines() {
        if let Some(m) = match_prefix(raw_line) {
            if let Some((role, lines)) = current.take() {
                flush(&mut turns, role, lines);
            }
            // The substring after the colon is the first accumulated line.
            current = Some((m.role, vec![m.rest]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(raw_line.to_string());
        }
        // Lines before the first recognized prefix are discarded.
    }

    if let Some((role, lines)) = current.take() {
        flush(&mut turns, role, lines);
    }

    let count = turns.len();
    ParsedResponse { turns, count }
}

fn flush(turns: &mut Vec<Turn>, role: Role, lines: Vec<String>) {
    let value = lines.join("\n").trim().to_string();
    if !value.is_empty() {
        turns.push(Turn::new(role, value));
    }
}
