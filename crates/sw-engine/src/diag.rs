//! Structured diagnostics collected during import/export.
//!
//! Per-node problems never abort the surrounding operation; they are
//! demoted to `Diagnostic` values returned alongside the result and
//! mirrored on the `log` facade. Only structural failures (zero roots,
//! zero nodes) surface as errors — see `usecase`.

/// What went wrong for one node or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A node or subtree failed to materialize/export; siblings are
    /// unaffected.
    PartialNode,
    /// Font/image/icon resource unavailable; a defined fallback was
    /// applied.
    Resource,
    /// Malformed field data (path data, enum value); the field was
    /// dropped.
    Validation,
}

use std::fmt;

/// One diagnostic event, addressed by node name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub node: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn partial(node: &str, message: impl Into<String>) -> Self {
        Self {
            node: node.to_owned(),
            kind: DiagnosticKind::PartialNode,
            message: message.into(),
        }
    }

    pub fn resource(node: &str, message: impl Into<String>) -> Self {
        Self {
            node: node.to_owned(),
            kind: DiagnosticKind::Resource,
            message: message.into(),
        }
    }

    pub fn validation(node: &str, message: impl Into<String>) -> Self {
        Self {
            node: node.to_owned(),
            kind: DiagnosticKind::Validation,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::PartialNode => "partial",
            DiagnosticKind::Resource => "resource",
            DiagnosticKind::Validation => "validation",
        };
        write!(f, "[{kind}] `{}`: {}", self.node, self.message)
    }
}
