//! AI response parser: free-form model output → design document roots.
//!
//! The upstream service returns text that is expected to contain either
//! a fenced code block or bare JSON. The parser strips the fence if
//! present, locates the first balanced array or object, parses it, and
//! coerces a bare object into a one-element root list. Every failure is
//! a typed `ParseError` — a raw serde error is never surfaced without
//! context.

use crate::model::DesignNode;
use serde_json::Value;
use std::fmt;

/// Typed parse failure. All variants are operation-fatal: nothing was
/// imported when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `{` or `[` found anywhere in the response text.
    NoJson,
    /// An opener was found but never closed.
    Unbalanced,
    /// The located span is not valid JSON.
    Syntax(String),
    /// Valid JSON, but zero usable design-node roots.
    EmptyDocument,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJson => write!(f, "response contains no JSON array or object"),
            Self::Unbalanced => write!(f, "response JSON is unbalanced (no matching close bracket)"),
            Self::Syntax(msg) => write!(f, "response JSON failed to parse: {msg}"),
            Self::EmptyDocument => write!(f, "response parsed but contains no design nodes"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse an AI response into design-node roots.
///
/// Malformed roots inside an otherwise valid array are dropped (the
/// creation engine isolates failures per root the same way); the call
/// fails only when zero roots survive.
pub fn parse_design_response(text: &str) -> Result<Vec<DesignNode>, ParseError> {
    let body = strip_code_fence(text);
    let span = locate_json(body)?;
    let value: Value =
        serde_json::from_str(span).map_err(|e| ParseError::Syntax(e.to_string()))?;

    // Coerce a bare object into a one-element root list.
    let raw_roots = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(ParseError::Syntax(format!(
                "expected object or array at top level, got {}",
                json_kind(&other)
            )));
        }
    };

    let total = raw_roots.len();
    let roots: Vec<DesignNode> = raw_roots.iter().filter_map(DesignNode::from_value).collect();
    if roots.len() < total {
        log::warn!("dropped {} malformed root(s) of {}", total - roots.len(), total);
    }
    if roots.is_empty() {
        return Err(ParseError::EmptyDocument);
    }
    Ok(roots)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strip a leading/trailing markdown fence if one is present. The
/// language tag after the opening fence is discarded with its line.
fn strip_code_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => after,
    };
    match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    }
}

/// Locate the first balanced `[...]` or `{...}` span, string- and
/// escape-aware, by greedy bracket matching.
fn locate_json(text: &str) -> Result<&str, ParseError> {
    let start = text.find(['[', '{']).ok_or(ParseError::NoJson)?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::Unbalanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_fenced_json_block() {
        let text = "Here is your design:\n```json\n[{\"name\":\"hero\",\"type\":\"FRAME\",\"x\":0,\"y\":0}]\n```\nEnjoy!";
        let roots = parse_design_response(text).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "hero");
        assert_eq!(roots[0].ty, NodeType::Frame);
    }

    #[test]
    fn coerces_bare_object_into_one_root() {
        let roots =
            parse_design_response(r#"{"name":"card","type":"FRAME","x":10,"y":20}"#).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].x, 10.0);
    }

    #[test]
    fn finds_json_embedded_in_prose() {
        let text = "Sure! The layout below uses a 12px grid: \
                    [{\"name\":\"a\",\"type\":\"TEXT\",\"x\":0,\"y\":0}] — let me know.";
        let roots = parse_design_response(text).unwrap();
        assert_eq!(roots[0].ty, NodeType::Text);
    }

    #[test]
    fn brackets_inside_strings_do_not_confuse_matching() {
        let text = r#"{"name":"a [draft]","type":"FRAME","x":0,"y":0,"extra":"}"}"#;
        let roots = parse_design_response(text).unwrap();
        assert_eq!(roots[0].name, "a [draft]");
    }

    #[test]
    fn no_json_is_a_typed_error() {
        assert_eq!(parse_design_response("I couldn't generate that."), Err(ParseError::NoJson));
    }

    #[test]
    fn unbalanced_json_is_a_typed_error() {
        assert_eq!(
            parse_design_response(r#"[{"name":"a","type":"FRAME""#),
            Err(ParseError::Unbalanced)
        );
    }

    #[test]
    fn empty_array_is_a_typed_error() {
        assert_eq!(parse_design_response("[]"), Err(ParseError::EmptyDocument));
    }

    #[test]
    fn non_object_roots_are_dropped() {
        let roots = parse_design_response(
            r#"[42, {"name":"ok","type":"RECTANGLE","x":0,"y":0}, "noise"]"#,
        )
        .unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "ok");
    }
}
