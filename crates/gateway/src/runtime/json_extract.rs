//! Lenient recovery of a JSON object from model or webhook output.

use serde_json::{Map, Value};

/// Outcome of [`parse_tolerant`]. The variant is reported to callers so the
/// dashboard can tell a clean parse from a salvaged one.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// The whole text was a JSON object.
    Parsed(Map<String, Value>),
    /// An object was recovered from a brace-balanced span inside the text.
    Fallback(Map<String, Value>),
    Empty,
}

impl Extracted {
    pub fn kind(&self) -> &'static str {
        match self {
            Extracted::Parsed(_) => "parsed",
            Extracted::Fallback(_) => "fallback",
            Extracted::Empty => "empty",
        }
    }

    pub fn into_object(self) -> Map<String, Value> {
        match self {
            Extracted::Parsed(obj) | Extracted::Fallback(obj) => obj,
            Extracted::Empty => Map::new(),
        }
    }
}

/// Longest text the brace scan will look at. Anything larger is either a
/// clean object (handled by the strict parse) or not worth salvaging.
pub const MAX_SCAN_BYTES: usize = 256 * 1024;

/// Strict parse first; otherwise the largest balanced `{...}` span that
/// parses as an object; otherwise [`Extracted::Empty`].
pub fn parse_tolerant(raw: &str) -> Extracted {
    let trimmed = raw.trim();
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(trimmed) {
        return Extracted::Parsed(obj);
    }
    if trimmed.len() > MAX_SCAN_BYTES {
        tracing::debug!(len = trimmed.len(), "text too long for brace scan");
        return Extracted::Empty;
    }

    let mut spans = balanced_spans(trimmed);
    spans.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)));
    for (start, end) in spans {
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&trimmed[start..end]) {
            return Extracted::Fallback(obj);
        }
    }
    Extracted::Empty
}

/// Byte ranges of every matched `{...}` pair, in one pass. Quotes only
/// open string literals inside an open brace, so apostrophes in the
/// surrounding prose do not hide an object.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }
    spans
}
