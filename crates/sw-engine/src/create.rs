//! Node creation engine: depth-first materialization of a `DesignNode`
//! tree into host-native nodes.
//!
//! Failure policy: any error while constructing a single node is caught
//! at that node's boundary, logged, and reported as a diagnostic — it
//! never cancels unrelated siblings. The enclosing use-case fails only
//! when zero nodes were created at all.
//!
//! Children are awaited and appended strictly in declaration order, so
//! z-order and auto-layout ordering in the host match the document.

use crate::canvas::{
    Canvas, CanvasError, CommonProps, ContainerKind, FontName, NativeColor, NativePaint,
    NodeHandle, ShapeKind, TextProps,
};
use crate::diag::Diagnostic;
use crate::icon::{IconPlan, IconProvider, IconSynthesizer};
use crate::mapper;
use sw_core::model::{BlendMode, BooleanOp, DesignNode, NodeType, TextAutoResize, clamp_unit};

/// Depth-first creator over a canvas and an icon synthesizer.
pub struct NodeCreator<'a, C: Canvas, P: IconProvider> {
    canvas: &'a mut C,
    icons: &'a mut IconSynthesizer<P>,
}

impl<'a, C: Canvas, P: IconProvider> NodeCreator<'a, C, P> {
    pub fn new(canvas: &'a mut C, icons: &'a mut IconSynthesizer<P>) -> Self {
        Self { canvas, icons }
    }

    /// Materialize every root independently. One bad root never aborts
    /// its siblings. On completion all created top-level nodes are
    /// selected and the viewport is focused on them.
    pub async fn create_tree(
        &mut self,
        roots: &[DesignNode],
    ) -> (Vec<NodeHandle>, Vec<Diagnostic>) {
        let mut created = Vec::new();
        let mut diags = Vec::new();
        for root in roots {
            let (handle, d) = self.create_node(root).await;
            diags.extend(d);
            if let Some(h) = handle {
                created.push(h);
            }
        }
        if !created.is_empty() {
            self.canvas.set_selection(&created);
            self.canvas.focus_viewport(&created);
        }
        (created, diags)
    }

    /// The per-node failure boundary. Position is applied after
    /// creation and before the caller attaches the handle to a parent;
    /// the uniform finishing step runs last.
    async fn create_node(&mut self, node: &DesignNode) -> (Option<NodeHandle>, Vec<Diagnostic>) {
        let mut diags = Vec::new();
        match self.build(node, &mut diags).await {
            Ok(handle) => {
                self.canvas.set_position(handle, node.x, node.y);
                self.finish(handle, node);
                (Some(handle), diags)
            }
            Err(e) => {
                log::warn!("node `{}` failed to materialize: {e}", node.name);
                diags.push(Diagnostic::partial(&node.name, e.to_string()));
                (None, diags)
            }
        }
    }

    /// Type-directed dispatch. The `type` tag was normalized to the
    /// closed enum at decode time, so this match is total.
    async fn build(
        &mut self,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        // Icon metadata outranks the declared type.
        if node.wants_icon_synthesis() {
            return self.build_icon(node, diags).await;
        }
        // Leaf kinds cannot host children natively: convert to a
        // frame-like container instead of dropping the subtree.
        if !node.ty.supports_children() && !node.children.is_empty() {
            log::debug!("`{}` ({:?}) has children, converting to frame", node.name, node.ty);
            return self.build_container(node, ContainerKind::Frame, diags).await;
        }
        match node.ty {
            NodeType::Frame => self.build_container(node, ContainerKind::Frame, diags).await,
            NodeType::Component => {
                self.build_container(node, ContainerKind::Component, diags).await
            }
            NodeType::Instance => {
                self.build_container(node, ContainerKind::Instance, diags).await
            }
            NodeType::Group => self.build_group(node, diags).await,
            NodeType::Rectangle => self.build_shape(node, ShapeKind::Rectangle).await,
            NodeType::Text => self.build_text(node, diags).await,
            NodeType::Ellipse => self.build_shape(node, ShapeKind::Ellipse).await,
            NodeType::Line => self.build_line(node).await,
            NodeType::Polygon => self.build_shape(node, ShapeKind::Polygon).await,
            NodeType::Star => self.build_shape(node, ShapeKind::Star).await,
            NodeType::Vector => self.build_icon(node, diags).await,
            NodeType::BooleanOperation => self.build_boolean(node, diags).await,
        }
    }

    // ── Per-type creators ────────────────────────────────────────────

    async fn build_container(
        &mut self,
        node: &DesignNode,
        kind: ContainerKind,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        let handle = self.canvas.create_container(kind)?;
        self.apply_geometry(handle, node);
        self.apply_paint(handle, node).await;
        if let Some(radius) = node.corner_radius {
            self.canvas.set_corner_radius(handle, radius);
        }
        // Decode guarantees `layout` is only present when the mode is
        // not NONE.
        if let Some(layout) = &node.layout {
            self.canvas.set_layout(handle, layout.clone());
        }
        self.append_children(handle, node, diags).await;
        Ok(handle)
    }

    /// Grouping is post-hoc: children are created as free nodes first,
    /// then grouped. A group with no materialized children degrades to
    /// an empty, fill-less frame, since hosts reject empty groups.
    async fn build_group(
        &mut self,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        if node.children.is_empty() {
            diags.push(Diagnostic::validation(&node.name, "empty group, created empty frame"));
            let handle = self.canvas.create_container(ContainerKind::Frame)?;
            self.apply_geometry(handle, node);
            return Ok(handle);
        }
        let mut members = Vec::new();
        for child in &node.children {
            let (handle, d) = Box::pin(self.create_node(child)).await;
            diags.extend(d);
            if let Some(h) = handle {
                members.push(h);
            }
        }
        if members.is_empty() {
            diags.push(Diagnostic::partial(
                &node.name,
                "no group member materialized, created empty frame",
            ));
            let handle = self.canvas.create_container(ContainerKind::Frame)?;
            self.apply_geometry(handle, node);
            return Ok(handle);
        }
        match self.canvas.group(&members) {
            Ok(group) => Ok(group),
            Err(e) => {
                // Host rejected the combine: the detached members must
                // not stay behind as free roots.
                for member in members {
                    self.canvas.remove_node(member);
                }
                Err(e)
            }
        }
    }

    async fn build_shape(
        &mut self,
        node: &DesignNode,
        kind: ShapeKind,
    ) -> Result<NodeHandle, CanvasError> {
        let handle = self.canvas.create_shape(kind)?;
        self.apply_geometry(handle, node);
        self.apply_paint(handle, node).await;
        if let Some(radius) = node.corner_radius {
            self.canvas.set_corner_radius(handle, radius);
        }
        if node.arc_data.is_some() || node.point_count.is_some() || node.inner_radius.is_some() {
            self.canvas
                .set_shape_extras(handle, node.arc_data, node.point_count, node.inner_radius);
        }
        Ok(handle)
    }

    /// Characters cannot be set without a resolved font: the font is
    /// loaded first, falling back to the default font when resolution
    /// fails. The auto-resize mode is derived from which dimensions the
    /// document declares, unless it says so explicitly.
    async fn build_text(
        &mut self,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        let handle = self.canvas.create_text()?;
        let style = node.text.clone().unwrap_or_default();
        let mut font = FontName::new(
            style.font_family.as_deref().unwrap_or("Inter"),
            style.font_style.as_deref().unwrap_or("Regular"),
        );
        if let Err(e) = self.canvas.load_font(&font).await {
            diags.push(Diagnostic::resource(
                &node.name,
                format!("{e}, default font applied"),
            ));
            font = FontName::default();
            if let Err(e) = self.canvas.load_font(&font).await {
                // Even the default font is unavailable: remove the
                // half-built node so nothing leaks onto the canvas.
                self.canvas.remove_node(handle);
                return Err(e);
            }
        }
        let auto_resize = style.auto_resize.unwrap_or(match (node.width, node.height) {
            (Some(_), Some(_)) => TextAutoResize::None,
            (Some(_), None) => TextAutoResize::Height,
            _ => TextAutoResize::WidthAndHeight,
        });
        self.canvas.set_text(
            handle,
            TextProps {
                characters: style.characters.clone().unwrap_or_default(),
                font,
                font_size: style.font_size,
                align_h: style.align_h,
                align_v: style.align_v,
                line_height: style.line_height,
                letter_spacing: style.letter_spacing,
                case: style.case,
                decoration: style.decoration,
                auto_resize,
            },
        );
        self.apply_geometry(handle, node);
        self.apply_paint(handle, node).await;
        Ok(handle)
    }

    /// Lines have no fill concept: declared strokes win, fills are
    /// reinterpreted as strokes, and a default black 1px stroke closes
    /// the chain.
    async fn build_line(&mut self, node: &DesignNode) -> Result<NodeHandle, CanvasError> {
        let handle = self.canvas.create_shape(ShapeKind::Line)?;
        let source = node
            .strokes
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(node.fills.as_deref().filter(|f| !f.is_empty()));
        let mut paints = match source {
            Some(fills) => mapper::fills_to_native(self.canvas, fills).await,
            None => Vec::new(),
        };
        if paints.is_empty() {
            paints = vec![NativePaint::Solid {
                color: NativeColor {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                },
                opacity: 1.0,
            }];
        }
        self.canvas
            .set_strokes(handle, paints, node.stroke_weight.unwrap_or(1.0), node.stroke_align);
        self.apply_geometry(handle, node);
        Ok(handle)
    }

    async fn build_icon(
        &mut self,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        let (plan, d) = self.icons.synthesize(node).await;
        diags.extend(d);
        match plan {
            IconPlan::Paths(paths) => {
                let handle = self.canvas.create_vector()?;
                self.canvas.set_vector_paths(handle, paths);
                self.canvas
                    .resize(handle, node.width.unwrap_or(24.0), node.height.unwrap_or(24.0));
                if node.fills.is_some() {
                    self.apply_paint(handle, node).await;
                } else {
                    self.canvas.set_fills(
                        handle,
                        vec![NativePaint::Solid {
                            color: NativeColor {
                                r: 0.0,
                                g: 0.0,
                                b: 0.0,
                            },
                            opacity: 1.0,
                        }],
                    );
                }
                Ok(handle)
            }
            IconPlan::Placeholder { label } => {
                let handle = self.canvas.create_container(ContainerKind::Frame)?;
                self.canvas
                    .resize(handle, node.width.unwrap_or(24.0), node.height.unwrap_or(24.0));
                self.attach_placeholder_label(handle, label).await;
                Ok(handle)
            }
        }
    }

    /// Best effort: the label child is dropped when even the default
    /// font is unavailable.
    async fn attach_placeholder_label(&mut self, parent: NodeHandle, label: String) {
        let Ok(text) = self.canvas.create_text() else {
            return;
        };
        let font = FontName::default();
        if self.canvas.load_font(&font).await.is_err() {
            self.canvas.remove_node(text);
            return;
        }
        self.canvas.set_text(
            text,
            TextProps {
                characters: label,
                font,
                font_size: Some(8.0),
                align_h: None,
                align_v: None,
                line_height: None,
                letter_spacing: None,
                case: None,
                decoration: None,
                auto_resize: TextAutoResize::WidthAndHeight,
            },
        );
        self.canvas.append_child(parent, text);
    }

    /// Each operand is created detached, then combined. Fewer than two
    /// materialized operands degrade to a plain frame holding whatever
    /// did materialize — the boolean operator is never invoked.
    async fn build_boolean(
        &mut self,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<NodeHandle, CanvasError> {
        let mut members = Vec::new();
        for child in &node.children {
            let (handle, d) = Box::pin(self.create_node(child)).await;
            diags.extend(d);
            if let Some(h) = handle {
                members.push(h);
            }
        }
        if members.len() < 2 {
            diags.push(Diagnostic::validation(
                &node.name,
                format!(
                    "boolean operation needs 2 operands, got {}, degraded to frame",
                    members.len()
                ),
            ));
            let handle = self.canvas.create_container(ContainerKind::Frame)?;
            for member in &members {
                self.canvas.append_child(handle, *member);
            }
            return Ok(handle);
        }
        let op = node.boolean_operation.unwrap_or(BooleanOp::Union);
        match self.canvas.boolean_op(op, &members) {
            Ok(combined) => Ok(combined),
            Err(e) => {
                for member in members {
                    self.canvas.remove_node(member);
                }
                Err(e)
            }
        }
    }

    // ── Shared steps ─────────────────────────────────────────────────

    /// Children are created depth-first and appended in declaration
    /// order; a failed child is skipped, its siblings are kept.
    async fn append_children(
        &mut self,
        parent: NodeHandle,
        node: &DesignNode,
        diags: &mut Vec<Diagnostic>,
    ) {
        for child in &node.children {
            let (handle, d) = Box::pin(self.create_node(child)).await;
            diags.extend(d);
            if let Some(h) = handle {
                self.canvas.append_child(parent, h);
            }
        }
    }

    fn apply_geometry(&mut self, handle: NodeHandle, node: &DesignNode) {
        match (node.width, node.height) {
            (Some(w), Some(h)) => self.canvas.resize(handle, w, h),
            (Some(w), None) => {
                let h = self.canvas.node(handle).map_or(0.0, |n| n.height);
                self.canvas.resize(handle, w, h);
            }
            (None, Some(h)) => {
                let w = self.canvas.node(handle).map_or(0.0, |n| n.width);
                self.canvas.resize(handle, w, h);
            }
            (None, None) => {}
        }
    }

    async fn apply_paint(&mut self, handle: NodeHandle, node: &DesignNode) {
        if let Some(fills) = &node.fills {
            let paints = mapper::fills_to_native(self.canvas, fills).await;
            self.canvas.set_fills(handle, paints);
        }
        if let Some(strokes) = &node.strokes {
            let paints = mapper::fills_to_native(self.canvas, strokes).await;
            self.canvas
                .set_strokes(handle, paints, node.stroke_weight.unwrap_or(1.0), node.stroke_align);
        }
    }

    /// The single uniform finishing step: name, clamped opacity, blend
    /// mode, visibility, lock, rotation, and effects — applied the same
    /// way regardless of node kind.
    fn finish(&mut self, handle: NodeHandle, node: &DesignNode) {
        self.canvas.set_name(handle, &node.name);
        self.canvas.set_common(
            handle,
            CommonProps {
                opacity: clamp_unit(node.opacity.unwrap_or(1.0)),
                blend_mode: node.blend_mode.unwrap_or(BlendMode::Normal),
                visible: node.visible.unwrap_or(true),
                locked: node.locked.unwrap_or(false),
                rotation: node.rotation.unwrap_or(0.0),
            },
        );
        if let Some(effects) = &node.effects {
            self.canvas
                .set_effects(handle, effects.iter().map(mapper::effect_to_native).collect());
        }
    }
}
