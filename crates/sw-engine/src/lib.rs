pub mod canvas;
pub mod create;
pub mod diag;
pub mod export;
pub mod icon;
pub mod mapper;
pub mod memory;
pub mod usecase;

pub use canvas::{Canvas, CanvasError, NodeHandle};
pub use create::NodeCreator;
pub use diag::{Diagnostic, DiagnosticKind};
pub use export::{ExportScope, NodeExporter};
pub use icon::{IconProvider, IconSynthesizer, NullIconProvider};
pub use memory::MemoryCanvas;
pub use usecase::{ImportSummary, TranscodeError, export_nodes, export_to_json, import_from_response};

// Re-export the document model so downstream crates don't need a direct
// sw-core dependency.
pub use sw_core::model;
pub use sw_core::parser::{ParseError, parse_design_response};
