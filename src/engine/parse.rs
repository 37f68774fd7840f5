//! Tolerant parsing of analysis engine output.
//!
//! The engine writes its JSON report to stdout but may interleave compiler
//! diagnostics or progress text. Parsing is an ordered list of strategies;
//! the first one that yields a JSON object wins.

use serde_json::Value;
use tracing::debug;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: [(&str, Strategy); 2] = [
    ("whole-document", whole_document),
    ("first-json-line", first_json_line),
];

/// Recover the engine's JSON report from stdout, if there is one
pub fn parse_engine_stdout(stdout: &str) -> Option<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }

    STRATEGIES.iter().find_map(|(name, strategy)| {
        let parsed = strategy(trimmed);
        if parsed.is_some() {
            debug!("Engine output parsed with {} strategy", name);
        }
        parsed
    })
}

fn whole_document(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// First line that starts with `{` and parses on its own; everything else is noise
fn first_json_line(text: &str) -> Option<Value> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<Value>(line).ok())
}
