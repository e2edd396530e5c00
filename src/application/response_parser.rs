//! Response Parser
//!
//! Splits free-text model output into a Markdown narrative and a typed
//! [`SignalSet`]. Model output drifts between runs, so splitting is an
//! ordered chain of strategies; the first one that applies decides:
//!
//! 1. a `-->Json:` / `JSON:` marker on its own line
//! 2. a bare `\nJSON:` anywhere in the text
//! 3. the last inline `{"signals": ...}` object, cut out by brace matching
//!
//! The inline scan only runs when no marker is present. When a marker is
//! followed by unusable JSON, or nothing matches, the whole text is the
//! narrative and the signal set is empty. Parsing never fails.

use crate::domain::signals::{Signal, SignalSet};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

static MARKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:-->[ \t]*)?json[ \t]*:[ \t]*\r?$").expect("marker pattern is valid")
});

static INLINE_SIGNALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\{\s*"signals"\s*:\s*"#).expect("inline pattern is valid")
});

const LEGACY_MARKER: &str = "\nJSON:";
const FENCES: [&str; 2] = ["```", "~~~"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub markdown: String,
    pub signals: SignalSet,
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(raw: &str) -> ParsedResponse {
        // A marker commits the split; the inline scan only runs without one
        let split = if let Some(marker) = MARKER_LINE.find(raw) {
            split_at_marker(raw, marker.start(), marker.end(), "marker line")
        } else if let Some(idx) = raw.find(LEGACY_MARKER) {
            let split_at = idx + 1;
            split_at_marker(raw, split_at, split_at + "JSON:".len(), "legacy marker")
        } else {
            extract_inline_object(raw)
        };

        split.unwrap_or_else(|| {
            warn!("ResponseParser: No usable signals found; treating the whole response as markdown");
            ParsedResponse {
                markdown: raw.trim().to_string(),
                signals: SignalSet::empty(),
            }
        })
    }
}

fn split_at_marker(text: &str, start: usize, end: usize, via: &str) -> Option<ParsedResponse> {
    let signals = parse_signals(&text[end..])?;
    let parsed = ParsedResponse {
        markdown: text[..start].trim().to_string(),
        signals,
    };
    log_split(via, &parsed);
    Some(parsed)
}

fn log_split(via: &str, parsed: &ParsedResponse) {
    debug!(
        "ResponseParser: Split via {} ({} signals, {} chars of markdown)",
        via,
        parsed.signals.signals.len(),
        parsed.markdown.len()
    );
}

fn extract_inline_object(text: &str) -> Option<ParsedResponse> {
    let start = INLINE_SIGNALS.find_iter(text).last()?.start();
    let candidate = cut_balanced_json(text, start)?;
    let signals = parse_signals(candidate)?;
    let parsed = ParsedResponse {
        markdown: text[..start].trim().to_string(),
        signals,
    };
    log_split("inline object", &parsed);
    Some(parsed)
}

/// Parses a JSON candidate into signals. A bare array is taken as the
/// signal list itself; an object must carry a `signals` key (any case).
fn parse_signals(candidate: &str) -> Option<SignalSet> {
    let body = strip_code_fences(candidate);
    let value: Value = serde_json::from_str(body.trim()).ok()?;

    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => {
            let key = map
                .keys()
                .find(|k| k.eq_ignore_ascii_case("signals"))
                .cloned()?;
            map.remove(&key)?
        }
        _ => return None,
    };

    match serde_json::from_value::<Vec<Signal>>(list) {
        Ok(signals) => Some(SignalSet { signals }),
        Err(e) => {
            debug!("ResponseParser: Signals did not type-check: {}", e);
            None
        }
    }
}

/// Removes the first and last line when the text is wrapped in a code fence.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let fenced = FENCES
        .iter()
        .any(|fence| trimmed.starts_with(fence) && trimmed.ends_with(fence));
    if fenced {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() >= 2 {
            return lines[1..lines.len() - 1].join("\n");
        }
    }
    trimmed.to_string()
}

/// Returns the JSON object starting at `start` (which must be `{`), ending at
/// the brace that closes it. Braces inside string literals are ignored.
/// `None` when `start` is not an opening brace or the object never closes.
pub fn cut_balanced_json(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
