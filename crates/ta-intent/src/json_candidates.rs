//! Locate JSON objects embedded in free-form model output.
//!
//! Models wrap their JSON in markdown fences, prepend prose, or emit several
//! blocks. Candidates are found with a balanced-brace scan (string-aware, so
//! braces inside string literals do not count) and parsed left to right; the
//! first one that parses as an object wins.

use serde_json::{Map, Value};

/// Length in bytes of the balanced `{...}` block starting at `text[0]`, or
/// `None` if the opening brace is never closed.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
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
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// All balanced brace-delimited candidates with their byte offsets, in order
/// of their opening brace.
///
/// After a complete block the scan resumes past its closing brace; an
/// unclosed opening brace is skipped and the scan resumes right after it.
pub fn candidates(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut from = 0;

    std::iter::from_fn(move || {
        while let Some(offset) = text[from..].find('{') {
            let start = from + offset;
            match balanced_len(&text[start..]) {
                Some(len) => {
                    from = start + len;
                    return Some((start, &text[start..from]));
                }
                None => {
                    tracing::debug!(offset = start, "unbalanced brace, skipping");
                    from = start + 1;
                }
            }
        }
        None
    })
}

/// The first candidate that parses as a JSON object, or `None`.
///
/// Candidates that fail to parse, or parse to something other than an
/// object, are logged and skipped.
pub fn first_object(text: &str) -> Option<Map<String, Value>> {
    for (offset, candidate) in candidates(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => {
                tracing::debug!(offset, len = candidate.len(), "parsed JSON candidate");
                return Some(map);
            }
            Ok(_) => {
                tracing::debug!(offset, "JSON candidate is not an object, skipping");
            }
            Err(e) => {
                tracing::debug!(error = %e, candidate = %candidate, "skipping malformed JSON candidate");
            }
        }
    }

    None
}
