//! Locate JSON values embedded in free-form model text.
//!
//! Providers asked for "ONLY JSON" still routinely wrap the payload in prose
//! or code fences. Rather than reject such output wholesale, we scan for
//! balanced JSON structures and deserialize the outermost one that matches
//! the expected shape, descending into children when the parent does not.

use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Object,
    Array,
}

/// Byte coordinates of a JSON structure within a larger text. `end` is the
/// inclusive index of the closing bracket/brace.
#[derive(Debug, Clone)]
pub struct JsonSpan {
    pub start: usize,
    pub end: usize,
    pub kind: JsonKind,
    pub children: Vec<JsonSpan>,
}

#[derive(Debug)]
struct Frame {
    start: usize,
    kind: JsonKind,
    children: Vec<JsonSpan>,
}

/// Find all balanced JSON object/array structures in the given text.
/// Brackets inside string literals (including escaped quotes) are ignored.
pub fn scan_structures(text: &str) -> Vec<JsonSpan> {
    let bytes = text.as_bytes();
    let mut results: Vec<JsonSpan> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => stack.push(Frame {
                start: i,
                kind: JsonKind::Object,
                children: Vec::new(),
            }),
            b'[' => stack.push(Frame {
                start: i,
                kind: JsonKind::Array,
                children: Vec::new(),
            }),
            b'}' | b']' => {
                let expected = if b == b'}' {
                    JsonKind::Object
                } else {
                    JsonKind::Array
                };
                if let Some(frame) = stack.pop() {
                    if frame.kind == expected {
                        let node = JsonSpan {
                            start: frame.start,
                            end: i,
                            kind: frame.kind,
                            children: frame.children,
                        };
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        } else {
                            results.push(node);
                        }
                    }
                    // Mismatched closer: drop the frame, text is not JSON here
                }
            }
            _ => {}
        }
    }

    debug!(count = results.len(), "found root JSON structures");
    results
}

/// Deserialize the first `T` found in the text, parent-first: the whole text
/// is tried before scanning, and each structure is tried before its children.
pub fn extract_first<T: DeserializeOwned>(text: &str) -> Option<T> {
    if let Ok(value) = serde_json::from_str::<T>(text.trim()) {
        return Some(value);
    }

    fn from_span<T: DeserializeOwned>(text: &str, span: &JsonSpan) -> Option<T> {
        let candidate = &text[span.start..=span.end];
        if let Ok(value) = serde_json::from_str::<T>(candidate) {
            return Some(value);
        }
        span.children
            .iter()
            .find_map(|child| from_span::<T>(text, child))
    }

    scan_structures(text)
        .iter()
        .find_map(|span| from_span::<T>(text, span))
}
