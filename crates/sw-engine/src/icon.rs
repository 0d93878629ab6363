//! Icon synthesis: turn a raw SVG, a remote icon search result, or a
//! keyword marker into typed vector paths for the creation engine.
//!
//! The pipeline never blocks an import on external-service availability:
//! remote failures degrade to a small built-in icon set, and a node
//! whose explicit path data is entirely invalid degrades to a
//! placeholder plan instead of aborting.

use crate::diag::Diagnostic;
use std::collections::HashMap;
use std::fmt;
use sw_core::model::DesignNode;
use sw_core::path::{VectorPath, extract_svg_paths, validate_path_data};

// ─── Provider contract ───────────────────────────────────────────────────

/// One remote search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconHit {
    pub id: String,
    /// Inline SVG text when the search endpoint returns it directly.
    pub svg: Option<String>,
    pub category: Option<String>,
}

/// Remote icon service failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    Network(String),
    Service(String),
}

impl fmt::Display for IconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "icon network error: {msg}"),
            Self::Service(msg) => write!(f, "icon service error: {msg}"),
        }
    }
}

impl std::error::Error for IconError {}

/// Remote icon source. Both operations are independently fallible; the
/// synthesizer caches fetched SVG text by id.
#[allow(async_fn_in_trait)]
pub trait IconProvider {
    async fn search(&mut self, keyword: &str, limit: usize) -> Result<Vec<IconHit>, IconError>;
    async fn fetch_svg(&mut self, id: &str) -> Result<Option<String>, IconError>;
}

/// Provider that is never reachable. Forces the built-in fallback set —
/// useful for offline hosts and tests.
#[derive(Debug, Default)]
pub struct NullIconProvider;

impl IconProvider for NullIconProvider {
    async fn search(&mut self, _keyword: &str, _limit: usize) -> Result<Vec<IconHit>, IconError> {
        Err(IconError::Service("no icon provider configured".into()))
    }

    async fn fetch_svg(&mut self, _id: &str) -> Result<Option<String>, IconError> {
        Err(IconError::Service("no icon provider configured".into()))
    }
}

// ─── Keyword vocabulary & fallback set ───────────────────────────────────

/// Fixed lookup vocabulary. First substring hit in iteration order wins;
/// there is no scoring.
pub const KEYWORD_VOCABULARY: &[&str] = &[
    "home", "search", "settings", "cart", "user", "menu", "close", "arrow", "heart", "star",
    "bell", "mail", "calendar", "camera", "check", "plus", "minus", "play", "pause", "edit",
    "trash", "share", "download", "upload", "lock", "globe", "phone", "chat", "clock", "filter",
];

/// Built-in path data for the five most common keywords. Used whenever
/// the remote provider is unavailable; unrecognized keywords map to
/// `user`.
const FALLBACK_ICONS: &[(&str, &str)] = &[
    ("user", "M12 12 a4 4 0 1 0 0 -8 a4 4 0 0 0 0 8 Z M4 20 a8 8 0 0 1 16 0 Z"),
    ("home", "M3 10 L12 3 L21 10 V21 H14 V14 H10 V21 H3 Z"),
    (
        "search",
        "M10 2 a8 8 0 1 0 4.9 14.3 L20 21.4 L21.4 20 L16.3 14.9 A8 8 0 0 0 10 2 Z",
    ),
    ("menu", "M3 6 H21 V8 H3 Z M3 11 H21 V13 H3 Z M3 16 H21 V18 H3 Z"),
    (
        "close",
        "M5 3.6 L12 10.6 L19 3.6 L20.4 5 L13.4 12 L20.4 19 L19 20.4 L12 13.4 L5 20.4 L3.6 19 L10.6 12 L3.6 5 Z",
    ),
];

fn fallback_paths(keyword: &str) -> Vec<VectorPath> {
    let data = FALLBACK_ICONS
        .iter()
        .find(|(k, _)| *k == keyword)
        .or_else(|| FALLBACK_ICONS.iter().find(|(k, _)| *k == "user"))
        .map(|(_, d)| *d)
        .unwrap_or_default();
    vec![VectorPath::new(data)]
}

/// Two-letter placeholder label from the node's intended name: the
/// first two alphabetic characters after any `icon:` marker. The marker
/// is stripped case-insensitively, matching the routing check.
pub fn placeholder_label(name: &str) -> String {
    let trimmed = name.trim();
    let base = match trimmed.get(.."icon:".len()) {
        Some(p) if p.eq_ignore_ascii_case("icon:") => trimmed["icon:".len()..].trim(),
        _ => trimmed,
    };
    let label: String = base.chars().filter(|c| c.is_alphabetic()).take(2).collect();
    if label.is_empty() { "ic".into() } else { label }
}

// ─── Synthesizer ─────────────────────────────────────────────────────────

/// The outcome of icon synthesis for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconPlan {
    /// Build a vector node from these validated paths.
    Paths(Vec<VectorPath>),
    /// All declared path data was invalid: build a small tagged
    /// container carrying this label instead.
    Placeholder { label: String },
}

/// Stateful front end over an [`IconProvider`]. Holds the append-only
/// SVG byte-cache keyed by fetched id — the only persistent state inside
/// an engine instance.
pub struct IconSynthesizer<P> {
    provider: P,
    cache: HashMap<String, String>,
}

impl<P: IconProvider> IconSynthesizer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
        }
    }

    /// Resolve one node to an icon plan. Never fails: every degradation
    /// path ends in usable paths or a placeholder.
    pub async fn synthesize(&mut self, node: &DesignNode) -> (IconPlan, Vec<Diagnostic>) {
        let mut diags = Vec::new();

        // Explicit path data wins outright.
        if !node.vector_paths.is_empty() {
            let valid: Vec<VectorPath> = node
                .vector_paths
                .iter()
                .filter(|p| validate_path_data(&p.data))
                .cloned()
                .collect();
            let dropped = node.vector_paths.len() - valid.len();
            if dropped > 0 {
                diags.push(Diagnostic::validation(
                    &node.name,
                    format!("dropped {dropped} invalid vector path(s)"),
                ));
            }
            if valid.is_empty() {
                let label = placeholder_label(&node.name);
                log::warn!("node `{}`: all paths invalid, placeholder `{label}`", node.name);
                return (IconPlan::Placeholder { label }, diags);
            }
            return (IconPlan::Paths(valid), diags);
        }

        let keyword = resolve_keyword(node);
        match self.lookup(&keyword).await {
            Ok(paths) if !paths.is_empty() => (IconPlan::Paths(paths), diags),
            Ok(_) => {
                diags.push(Diagnostic::resource(
                    &node.name,
                    format!("no usable icon for `{keyword}`, built-in fallback applied"),
                ));
                (IconPlan::Paths(fallback_paths(&keyword)), diags)
            }
            Err(e) => {
                log::warn!("icon lookup `{keyword}` failed: {e}");
                diags.push(Diagnostic::resource(
                    &node.name,
                    format!("icon service unavailable ({e}), built-in fallback applied"),
                ));
                (IconPlan::Paths(fallback_paths(&keyword)), diags)
            }
        }
    }

    /// Remote lookup with the per-id cache. Returns the extracted,
    /// validated paths of the first hit that yields any.
    async fn lookup(&mut self, keyword: &str) -> Result<Vec<VectorPath>, IconError> {
        let hits = self.provider.search(keyword, 5).await?;
        for hit in hits {
            let svg = match self.cache.get(&hit.id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = match hit.svg {
                        Some(inline) => inline,
                        None => match self.provider.fetch_svg(&hit.id).await? {
                            Some(text) => text,
                            None => continue,
                        },
                    };
                    self.cache.insert(hit.id.clone(), fetched.clone());
                    fetched
                }
            };
            let paths = extract_svg_paths(&svg);
            if !paths.is_empty() {
                return Ok(paths);
            }
        }
        Ok(Vec::new())
    }
}

/// Derive the lookup keyword: explicit `icon:` name marker first, then
/// attached metadata, then the first vocabulary substring hit. Falls
/// back to the lowercased first word of the name.
fn resolve_keyword(node: &DesignNode) -> String {
    let lowered = node.name.to_ascii_lowercase();
    if let Some(marker) = lowered.strip_prefix("icon:") {
        let marker = marker.trim();
        if !marker.is_empty() {
            return marker.to_owned();
        }
    }
    if let Some(meta) = &node.icon {
        return meta.to_ascii_lowercase();
    }
    for keyword in KEYWORD_VOCABULARY {
        if lowered.contains(keyword) {
            return (*keyword).to_owned();
        }
    }
    lowered
        .split_whitespace()
        .next()
        .unwrap_or("user")
        .to_owned()
}
