//! SVG path extraction and validation.
//!
//! This is deliberately not a full SVG parser: the icon pipeline only
//! needs the `d` attribute of `<path>` elements. Anything else in the
//! SVG text is ignored, and individual paths that fail validation are
//! dropped without failing the remaining ones.

use winnow::combinator::{alt, delimited};
use winnow::prelude::*;
use winnow::token::take_till;

/// Path fill rule. Defaults to `Nonzero` when the SVG does not say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindingRule {
    #[default]
    Nonzero,
    Evenodd,
}

impl WindingRule {
    pub fn from_token(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("NONZERO") {
            Some(Self::Nonzero)
        } else if s.eq_ignore_ascii_case("EVENODD") {
            Some(Self::Evenodd)
        } else {
            None
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Nonzero => "NONZERO",
            Self::Evenodd => "EVENODD",
        }
    }
}

/// One typed vector path: winding rule plus raw SVG path data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorPath {
    pub winding_rule: WindingRule,
    pub data: String,
}

impl VectorPath {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            winding_rule: WindingRule::Nonzero,
            data: data.into(),
        }
    }
}

/// Valid leading SVG path command letters.
const PATH_COMMANDS: &str = "MmLlHhVvCcSsQqTtAaZz";

/// A path datum is accepted when it is non-empty after trimming and its
/// first character is a valid SVG path command letter.
pub fn validate_path_data(data: &str) -> bool {
    let trimmed = data.trim();
    match trimmed.chars().next() {
        Some(c) => PATH_COMMANDS.contains(c),
        None => false,
    }
}

/// Scan SVG text for `<path ... d="...">` occurrences and return the
/// valid ones. Invalid paths are dropped individually.
pub fn extract_svg_paths(svg: &str) -> Vec<VectorPath> {
    let mut out = Vec::new();
    let mut rest = svg;
    while let Some(pos) = rest.find("<path") {
        rest = &rest[pos + "<path".len()..];
        let tag_end = rest.find('>').unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        rest = &rest[tag_end..];

        let Some(data) = attr_value(tag, "d") else {
            continue;
        };
        if !validate_path_data(data) {
            log::debug!("dropped invalid path data: {:?}", data.trim());
            continue;
        }
        let winding_rule = attr_value(tag, "fill-rule")
            .and_then(WindingRule::from_token)
            .unwrap_or_default();
        out.push(VectorPath {
            winding_rule,
            data: data.trim().to_owned(),
        });
    }
    out
}

// ─── Attribute scanning ──────────────────────────────────────────────────

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

/// Find `name="value"` (or single-quoted) inside one tag body.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = tag;
    while let Some(pos) = rest.find(name) {
        let preceded_by_space = pos == 0 || rest.as_bytes()[pos - 1].is_ascii_whitespace();
        let mut after = rest[pos + name.len()..].trim_start();
        if preceded_by_space && after.starts_with('=') {
            after = after[1..].trim_start();
            let mut cursor = after;
            if let Ok(value) = parse_quoted.parse_next(&mut cursor) {
                return Some(value);
            }
        }
        rest = &rest[pos + name.len()..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_command_led_path() {
        assert!(validate_path_data("M0 0 L10 10 Z"));
        assert!(validate_path_data("  m 1,2 l 3,4  "));
        assert!(validate_path_data("a1 1 0 0 1 2 2"));
    }

    #[test]
    fn rejects_headless_and_empty_paths() {
        assert!(!validate_path_data("10 10 L20 20"));
        assert!(!validate_path_data(""));
        assert!(!validate_path_data("   "));
        assert!(!validate_path_data("x20 20"));
    }

    #[test]
    fn extracts_paths_from_svg_text() {
        let svg = r#"<svg viewBox="0 0 24 24">
            <path d="M3 9 L12 2 L21 9 Z" fill="none"/>
            <path fill-rule='evenodd' d='M4 10 h16 v10 H4 Z'/>
        </svg>"#;
        let paths = extract_svg_paths(svg);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].data, "M3 9 L12 2 L21 9 Z");
        assert_eq!(paths[0].winding_rule, WindingRule::Nonzero);
        assert_eq!(paths[1].winding_rule, WindingRule::Evenodd);
    }

    #[test]
    fn drops_invalid_paths_individually() {
        let svg = r#"<path d="10 10 L20 20"/><path d="M0 0 L5 5"/>"#;
        let paths = extract_svg_paths(svg);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].data, "M0 0 L5 5");
    }

    #[test]
    fn ignores_pathless_tags() {
        assert!(extract_svg_paths("<svg><rect width='4'/></svg>").is_empty());
        assert!(extract_svg_paths("<path stroke=\"red\"/>").is_empty());
    }
}
