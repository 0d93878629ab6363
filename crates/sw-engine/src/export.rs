//! Node export engine: depth-first extraction of host-native nodes into
//! `DesignNode` JSON.
//!
//! Export is synchronous — reading the scene needs no I/O. Output is
//! minimal and diff-friendly: optional fields appear only when they
//! deviate from the type's default, and fields the host reports as
//! mixed spans are omitted rather than guessed, so a re-import lands on
//! the defaults instead of an invented value.

use crate::canvas::{Canvas, NativeNode, NativeText, NodeHandle};
use crate::diag::Diagnostic;
use crate::mapper;
use sw_core::model::{
    BooleanOp, CornerRadius, DesignNode, Fill, NodeType, TextAlignH, TextAlignV, TextAutoResize,
    TextCase, TextDecoration, TextStyle, default_name,
};

/// What to walk: the current selection, or every top-level node on the
/// active page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Selected,
    All,
}

/// Depth-first exporter over a read-only canvas.
pub struct NodeExporter<'a, C: Canvas> {
    canvas: &'a C,
}

impl<'a, C: Canvas> NodeExporter<'a, C> {
    pub fn new(canvas: &'a C) -> Self {
        Self { canvas }
    }

    /// Export every node in scope. Unsupported native kinds are skipped
    /// with a diagnostic, never an error.
    pub fn export(&self, scope: ExportScope) -> (Vec<DesignNode>, Vec<Diagnostic>) {
        let handles = match scope {
            ExportScope::Selected => self.canvas.current_selection(),
            ExportScope::All => self.canvas.root_nodes(),
        };
        let mut out = Vec::new();
        let mut diags = Vec::new();
        for handle in handles {
            match self.export_node(handle) {
                Some(node) => out.push(node),
                None => {
                    let name = self
                        .canvas
                        .node(handle)
                        .map_or_else(|| format!("{handle:?}"), |n| n.name.clone());
                    log::debug!("skipped non-exportable node `{name}`");
                    diags.push(Diagnostic::partial(&name, "native kind not exportable, skipped"));
                }
            }
        }
        (out, diags)
    }

    /// Extract one node, or `None` when the native kind is not
    /// representable.
    pub fn export_node(&self, handle: NodeHandle) -> Option<DesignNode> {
        let n = self.canvas.node(handle)?;
        let ty = mapper::node_type_from_native(&n.kind)?;

        let name = if n.name.is_empty() {
            default_name(ty)
        } else {
            n.name.clone()
        };
        let mut out = DesignNode::new(name, ty, n.x, n.y);
        self.extract_common(n, &mut out);

        match ty {
            NodeType::Frame | NodeType::Group | NodeType::Component | NodeType::Instance => {
                self.extract_paint(n, &mut out);
                extract_corner(n, &mut out);
                out.layout = n.layout.clone();
                self.extract_children(n, &mut out);
            }
            NodeType::Rectangle => {
                self.extract_paint(n, &mut out);
                extract_corner(n, &mut out);
            }
            NodeType::Text => {
                self.extract_paint(n, &mut out);
                extract_text(n, &mut out);
            }
            NodeType::Ellipse => {
                self.extract_paint(n, &mut out);
                out.arc_data = n.arc_data;
            }
            NodeType::Line => {
                // Lines carry strokes only; fills are not a line concept.
                self.extract_strokes(n, &mut out);
            }
            NodeType::Polygon | NodeType::Star => {
                self.extract_paint(n, &mut out);
                out.point_count = n.point_count;
                out.inner_radius = n.inner_radius;
            }
            NodeType::Vector => {
                self.extract_paint(n, &mut out);
                out.vector_paths = n.vector_paths.iter().cloned().collect();
            }
            NodeType::BooleanOperation => {
                self.extract_paint(n, &mut out);
                out.boolean_operation = n.boolean_op.filter(|&op| op != BooleanOp::Union);
                self.extract_children(n, &mut out);
            }
        }
        Some(out)
    }

    /// Geometry and visual properties shared by all kinds. A value
    /// equal to its default is left absent.
    fn extract_common(&self, n: &NativeNode, out: &mut DesignNode) {
        if n.width > 0.0 {
            out.width = Some(n.width);
        }
        if n.height > 0.0 {
            out.height = Some(n.height);
        }
        if n.rotation != 0.0 {
            out.rotation = Some(n.rotation);
        }
        if n.opacity != 1.0 {
            out.opacity = Some(n.opacity);
        }
        if !n.blend_mode.is_default() {
            out.blend_mode = Some(n.blend_mode);
        }
        if !n.visible {
            out.visible = Some(false);
        }
        if n.locked {
            out.locked = Some(true);
        }
        let effects: Vec<_> = n.effects.iter().filter_map(mapper::native_to_effect).collect();
        if !effects.is_empty() {
            out.effects = Some(effects);
        }
    }

    fn extract_paint(&self, n: &NativeNode, out: &mut DesignNode) {
        let fills: Vec<Fill> = n.fills.iter().filter_map(mapper::paint_to_fill).collect();
        if !fills.is_empty() {
            out.fills = Some(fills);
        }
        self.extract_strokes(n, out);
    }

    fn extract_strokes(&self, n: &NativeNode, out: &mut DesignNode) {
        let strokes: Vec<Fill> = n.strokes.iter().filter_map(mapper::paint_to_fill).collect();
        if strokes.is_empty() {
            return;
        }
        out.strokes = Some(strokes);
        // A mixed stroke weight is absent, not guessed; 1.0 is the default.
        out.stroke_weight = n.stroke_weight.uniform().filter(|&w| w != 1.0);
        out.stroke_align = n.stroke_align;
    }

    /// Children are included only when at least one exported; an
    /// entirely failed child list stays absent, which distinguishes it
    /// from "no children" on the wire.
    fn extract_children(&self, n: &NativeNode, out: &mut DesignNode) {
        let total = n.children.len();
        let exported: Vec<DesignNode> = n
            .children
            .iter()
            .filter_map(|&child| self.export_node(child))
            .collect();
        if exported.len() < total {
            log::debug!(
                "`{}`: exported {} of {} children",
                out.name,
                exported.len(),
                total
            );
        }
        out.children = exported;
    }
}

fn extract_corner(n: &NativeNode, out: &mut DesignNode) {
    out.corner_radius = n.corner_radius.filter(|r| match r {
        CornerRadius::Uniform(v) => *v != 0.0,
        CornerRadius::PerCorner(corners) => corners.iter().any(|&c| c != 0.0),
    });
}

fn extract_text(n: &NativeNode, out: &mut DesignNode) {
    let Some(text) = &n.text else {
        return;
    };
    out.text = Some(text_style_of(text));
}

/// Mixed-span fields come back absent; enum fields equal to their
/// defaults are dropped for diff-friendliness.
fn text_style_of(text: &NativeText) -> TextStyle {
    let font = text.font.as_uniform();
    TextStyle {
        characters: Some(text.characters.clone()),
        font_family: font.map(|f| f.family.clone()),
        font_style: font.map(|f| f.style.clone()),
        font_size: text.font_size.uniform(),
        align_h: Some(text.align_h).filter(|&a| a != TextAlignH::Left),
        align_v: Some(text.align_v).filter(|&a| a != TextAlignV::Top),
        line_height: text.line_height.uniform(),
        letter_spacing: text.letter_spacing.uniform(),
        case: text.case.uniform().filter(|&c| c != TextCase::Original),
        decoration: text
            .decoration
            .uniform()
            .filter(|&d| d != TextDecoration::None),
        auto_resize: Some(text.auto_resize).filter(|&r| r != TextAutoResize::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{
        CommonProps, ContainerKind, Mixed, NativeColor, NativePaint, ShapeKind,
    };
    use crate::memory::MemoryCanvas;
    use pretty_assertions::assert_eq;
    use sw_core::model::BlendMode;

    fn solid_red() -> NativePaint {
        NativePaint::Solid {
            color: NativeColor {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
            opacity: 1.0,
        }
    }

    #[test]
    fn defaults_are_omitted() {
        let mut canvas = MemoryCanvas::new();
        let rect = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.resize(rect, 100.0, 40.0);
        canvas.set_common(
            rect,
            CommonProps {
                opacity: 1.0,
                blend_mode: BlendMode::Normal,
                visible: true,
                locked: false,
                rotation: 0.0,
            },
        );

        let node = NodeExporter::new(&canvas).export_node(rect).unwrap();
        assert_eq!(node.opacity, None);
        assert_eq!(node.blend_mode, None);
        assert_eq!(node.visible, None);
        assert_eq!(node.locked, None);
        assert_eq!(node.rotation, None);
        assert_eq!(node.width, Some(100.0));
    }

    #[test]
    fn non_default_common_props_are_kept() {
        let mut canvas = MemoryCanvas::new();
        let rect = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.set_common(
            rect,
            CommonProps {
                opacity: 0.5,
                blend_mode: BlendMode::Multiply,
                visible: false,
                locked: true,
                rotation: 45.0,
            },
        );
        let node = NodeExporter::new(&canvas).export_node(rect).unwrap();
        assert_eq!(node.opacity, Some(0.5));
        assert_eq!(node.blend_mode, Some(BlendMode::Multiply));
        assert_eq!(node.visible, Some(false));
        assert_eq!(node.locked, Some(true));
        assert_eq!(node.rotation, Some(45.0));
    }

    #[test]
    fn mixed_stroke_weight_is_omitted_not_guessed() {
        let mut canvas = MemoryCanvas::new();
        let rect = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.set_strokes(rect, vec![solid_red()], 3.0, None);
        canvas.node_mut(rect).unwrap().stroke_weight = Mixed::Mixed;

        let node = NodeExporter::new(&canvas).export_node(rect).unwrap();
        assert!(node.strokes.is_some());
        assert_eq!(node.stroke_weight, None);
    }

    #[test]
    fn unsupported_native_kind_is_skipped_with_diagnostic() {
        let mut canvas = MemoryCanvas::new();
        let rect = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.node_mut(rect).unwrap().kind = "SLICE".into();

        let exporter = NodeExporter::new(&canvas);
        assert_eq!(exporter.export_node(rect), None);
        let (nodes, diags) = exporter.export(ExportScope::All);
        assert!(nodes.is_empty());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn component_set_folds_into_frame() {
        let mut canvas = MemoryCanvas::new();
        let frame = canvas.create_container(ContainerKind::Frame).unwrap();
        canvas.node_mut(frame).unwrap().kind = "COMPONENT_SET".into();
        let node = NodeExporter::new(&canvas).export_node(frame).unwrap();
        assert_eq!(node.ty, NodeType::Frame);
    }

    #[test]
    fn entirely_failed_children_stay_absent() {
        let mut canvas = MemoryCanvas::new();
        let frame = canvas.create_container(ContainerKind::Frame).unwrap();
        let child = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.append_child(frame, child);
        canvas.node_mut(child).unwrap().kind = "WIDGET".into();

        let node = NodeExporter::new(&canvas).export_node(frame).unwrap();
        assert!(node.children.is_empty());
        let wire = node.to_value();
        assert!(!wire.as_object().unwrap().contains_key("children"));
    }

    #[test]
    fn default_text_alignment_is_omitted() {
        use crate::canvas::{FontName, TextProps};

        let mut canvas = MemoryCanvas::new();
        let text = canvas.create_text().unwrap();
        canvas.set_text(
            text,
            TextProps {
                characters: "hi".into(),
                font: FontName::default(),
                font_size: Some(14.0),
                align_h: None,
                align_v: None,
                line_height: None,
                letter_spacing: None,
                case: None,
                decoration: None,
                auto_resize: TextAutoResize::WidthAndHeight,
            },
        );

        let node = NodeExporter::new(&canvas).export_node(text).unwrap();
        let style = node.text.unwrap();
        assert_eq!(style.align_h, None);
        assert_eq!(style.align_v, None);

        canvas.node_mut(text).unwrap().text.as_mut().unwrap().align_h = TextAlignH::Center;
        let node = NodeExporter::new(&canvas).export_node(text).unwrap();
        assert_eq!(node.text.unwrap().align_h, Some(TextAlignH::Center));
    }

    #[test]
    fn union_boolean_operation_is_omitted() {
        let mut canvas = MemoryCanvas::new();
        let a = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        let b = canvas.create_shape(ShapeKind::Ellipse).unwrap();
        let combined = canvas.boolean_op(BooleanOp::Union, &[a, b]).unwrap();
        let node = NodeExporter::new(&canvas).export_node(combined).unwrap();
        assert_eq!(node.ty, NodeType::BooleanOperation);
        assert_eq!(node.boolean_operation, None);
        assert_eq!(node.children.len(), 2);
    }
}
