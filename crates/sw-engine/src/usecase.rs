//! Top-level transcoder operations: text in, nodes on the canvas;
//! canvas in, JSON out.
//!
//! The fatal/non-fatal line is drawn here. Per-node trouble during
//! creation or export is a [`Diagnostic`], never an error; this module
//! fails only when the whole operation produced nothing.

use std::error::Error;
use std::fmt;

use serde_json::Value;

use sw_core::model::DesignNode;
use sw_core::parser::{ParseError, parse_design_response};

use crate::canvas::{Canvas, NodeHandle};
use crate::create::NodeCreator;
use crate::diag::Diagnostic;
use crate::export::{ExportScope, NodeExporter};
use crate::icon::{IconProvider, IconSynthesizer};

// ─── Errors ──────────────────────────────────────────────────────────────

/// A transcode operation that produced nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// The response text held no usable design document.
    Parse(ParseError),
    /// Every root failed to materialize.
    NothingCreated,
    /// The selection was non-empty but not one node was exportable.
    NothingExported,
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::Parse(err) => write!(f, "{err}"),
            TranscodeError::NothingCreated => write!(f, "no node could be created"),
            TranscodeError::NothingExported => write!(f, "no node could be exported"),
        }
    }
}

impl Error for TranscodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranscodeError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for TranscodeError {
    fn from(err: ParseError) -> Self {
        TranscodeError::Parse(err)
    }
}

// ─── Import ──────────────────────────────────────────────────────────────

/// Outcome of a successful import: what landed on the canvas, and what
/// was lost along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub created: Vec<NodeHandle>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportSummary {
    /// One-line user-facing summary, suitable for a toast.
    pub fn notification(&self) -> String {
        let n = self.created.len();
        let noun = if n == 1 { "node" } else { "nodes" };
        if self.diagnostics.is_empty() {
            format!("Created {n} {noun}")
        } else {
            format!(
                "Created {n} {noun} ({} issue{} skipped)",
                self.diagnostics.len(),
                if self.diagnostics.len() == 1 { "" } else { "s" }
            )
        }
    }
}

/// Parse a raw AI response and materialize its design tree on `canvas`.
///
/// Succeeds as long as at least one root node lands; everything dropped
/// on the way is reported in the summary's diagnostics.
pub async fn import_from_response<C: Canvas, P: IconProvider>(
    text: &str,
    canvas: &mut C,
    icons: &mut IconSynthesizer<P>,
) -> Result<ImportSummary, TranscodeError> {
    let roots = parse_design_response(text)?;
    log::info!("importing {} root node(s)", roots.len());

    let (created, diagnostics) = NodeCreator::new(canvas, icons).create_tree(&roots).await;
    if created.is_empty() {
        return Err(TranscodeError::NothingCreated);
    }
    for diag in &diagnostics {
        log::warn!("{diag}");
    }
    Ok(ImportSummary {
        created,
        diagnostics,
    })
}

// ─── Export ──────────────────────────────────────────────────────────────

/// Extract the nodes in `scope` as design documents.
///
/// An empty scope is an empty result, not an error; a non-empty scope
/// where nothing was exportable is [`TranscodeError::NothingExported`].
pub fn export_nodes<C: Canvas>(
    canvas: &C,
    scope: ExportScope,
) -> Result<(Vec<DesignNode>, Vec<Diagnostic>), TranscodeError> {
    let in_scope = match scope {
        ExportScope::Selected => canvas.current_selection(),
        ExportScope::All => canvas.root_nodes(),
    };
    if in_scope.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let (nodes, diagnostics) = NodeExporter::new(canvas).export(scope);
    if nodes.is_empty() {
        return Err(TranscodeError::NothingExported);
    }
    Ok((nodes, diagnostics))
}

/// Convenience wrapper: export straight to a JSON array value.
pub fn export_to_json<C: Canvas>(
    canvas: &C,
    scope: ExportScope,
) -> Result<Value, TranscodeError> {
    let (nodes, _) = export_nodes(canvas, scope)?;
    Ok(Value::Array(nodes.iter().map(DesignNode::to_value).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::NullIconProvider;
    use crate::memory::MemoryCanvas;
    use pretty_assertions::assert_eq;

    fn icons() -> IconSynthesizer<NullIconProvider> {
        IconSynthesizer::new(NullIconProvider)
    }

    #[tokio::test]
    async fn garbage_text_is_a_parse_error() {
        let mut canvas = MemoryCanvas::new();
        let err = import_from_response("no json here", &mut canvas, &mut icons())
            .await
            .unwrap_err();
        assert_eq!(err, TranscodeError::Parse(ParseError::NoJson));
    }

    #[tokio::test]
    async fn import_selects_created_roots() {
        let mut canvas = MemoryCanvas::new();
        let text = r#"[
            {"name": "A", "type": "RECTANGLE", "x": 0, "y": 0},
            {"name": "B", "type": "FRAME", "x": 100, "y": 0}
        ]"#;
        let summary = import_from_response(text, &mut canvas, &mut icons())
            .await
            .unwrap();
        assert_eq!(summary.created.len(), 2);
        assert_eq!(canvas.current_selection(), summary.created);
        assert_eq!(summary.notification(), "Created 2 nodes");
    }

    #[test]
    fn empty_scope_exports_empty() {
        let canvas = MemoryCanvas::new();
        let (nodes, diags) = export_nodes(&canvas, ExportScope::All).unwrap();
        assert!(nodes.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn nothing_exportable_in_nonempty_scope_is_fatal() {
        let mut canvas = MemoryCanvas::new();
        let rect = canvas
            .create_shape(crate::canvas::ShapeKind::Rectangle)
            .unwrap();
        canvas.node_mut(rect).unwrap().kind = "STICKY".into();
        let err = export_nodes(&canvas, ExportScope::All).unwrap_err();
        assert_eq!(err, TranscodeError::NothingExported);
    }

    #[test]
    fn summaries_with_the_same_outcome_compare_equal() {
        let a = ImportSummary {
            created: vec![crate::canvas::NodeHandle(1)],
            diagnostics: vec![Diagnostic::partial("x", "failed")],
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn notification_counts_issues() {
        let summary = ImportSummary {
            created: vec![crate::canvas::NodeHandle(1)],
            diagnostics: vec![Diagnostic::validation("x", "dropped")],
        };
        assert_eq!(summary.notification(), "Created 1 node (1 issue skipped)");
    }
}
