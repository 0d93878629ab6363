//! In-memory reference implementation of the `Canvas` capability
//! surface.
//!
//! This is the headless host used by the round-trip tests and the demo
//! example. It keeps nodes in a flat slab keyed by handle, with an
//! explicit root list so top-level ordering is deterministic.

use crate::canvas::{
    Canvas, CanvasError, CommonProps, ContainerKind, FontName, ImageHandle, Mixed, NativeNode,
    NativePaint, NativeText, NodeHandle, ShapeKind, TextProps,
};
use std::collections::HashMap;
use sw_core::model::{ArcData, AutoLayout, BooleanOp, CornerRadius, StrokeAlign, TextAlignH, TextAlignV};
use sw_core::path::VectorPath;

/// Headless canvas host backed by a node slab.
pub struct MemoryCanvas {
    nodes: HashMap<NodeHandle, NativeNode>,
    roots: Vec<NodeHandle>,
    parents: HashMap<NodeHandle, NodeHandle>,
    selection: Vec<NodeHandle>,
    focused: Vec<NodeHandle>,
    font_families: Vec<String>,
    images: HashMap<String, ImageHandle>,
    next_id: u64,
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::with_fonts(&["Inter", "Roboto", "Arial"])
    }

    /// Host with a specific set of resolvable font families. Any style
    /// of a listed family loads; everything else fails resolution.
    pub fn with_fonts(families: &[&str]) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            parents: HashMap::new(),
            selection: Vec::new(),
            focused: Vec::new(),
            font_families: families.iter().map(|f| (*f).to_owned()).collect(),
            images: HashMap::new(),
            next_id: 1,
        }
    }

    /// Direct mutable access for tests and host-side tooling.
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut NativeNode> {
        self.nodes.get_mut(&handle)
    }

    /// Nodes the viewport was last asked to focus on.
    pub fn focused(&self) -> &[NodeHandle] {
        &self.focused
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, kind: &str) -> NodeHandle {
        let handle = NodeHandle(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, NativeNode::new(handle, kind));
        self.roots.push(handle);
        handle
    }

    fn detach(&mut self, child: NodeHandle) {
        self.roots.retain(|&r| r != child);
        if let Some(old_parent) = self.parents.remove(&child)
            && let Some(parent_node) = self.nodes.get_mut(&old_parent)
        {
            parent_node.children.retain(|&c| c != child);
        }
    }
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(bytes: &[u8]) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("{hash:016x}")
}

impl Canvas for MemoryCanvas {
    fn create_container(&mut self, kind: ContainerKind) -> Result<NodeHandle, CanvasError> {
        Ok(self.alloc(match kind {
            ContainerKind::Frame => "FRAME",
            ContainerKind::Component => "COMPONENT",
            ContainerKind::Instance => "INSTANCE",
        }))
    }

    fn create_shape(&mut self, kind: ShapeKind) -> Result<NodeHandle, CanvasError> {
        Ok(self.alloc(match kind {
            ShapeKind::Rectangle => "RECTANGLE",
            ShapeKind::Ellipse => "ELLIPSE",
            ShapeKind::Line => "LINE",
            ShapeKind::Polygon => "POLYGON",
            ShapeKind::Star => "STAR",
        }))
    }

    fn create_text(&mut self) -> Result<NodeHandle, CanvasError> {
        Ok(self.alloc("TEXT"))
    }

    fn create_vector(&mut self) -> Result<NodeHandle, CanvasError> {
        Ok(self.alloc("VECTOR"))
    }

    fn remove_node(&mut self, node: NodeHandle) {
        self.detach(node);
        let mut pending = vec![node];
        while let Some(next) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&next) {
                for child in removed.children {
                    self.parents.remove(&child);
                    pending.push(child);
                }
            }
            self.selection.retain(|&s| s != next);
        }
    }

    fn set_name(&mut self, node: NodeHandle, name: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.name = name.to_owned();
        }
    }

    fn set_position(&mut self, node: NodeHandle, x: f32, y: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.x = x;
            n.y = y;
        }
    }

    fn resize(&mut self, node: NodeHandle, width: f32, height: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.width = width.max(0.0);
            n.height = height.max(0.0);
        }
    }

    fn set_fills(&mut self, node: NodeHandle, fills: Vec<NativePaint>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.fills = fills;
        }
    }

    fn set_strokes(
        &mut self,
        node: NodeHandle,
        strokes: Vec<NativePaint>,
        weight: f32,
        align: Option<StrokeAlign>,
    ) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.strokes = strokes;
            n.stroke_weight = Mixed::Uniform(weight);
            n.stroke_align = align;
        }
    }

    fn set_corner_radius(&mut self, node: NodeHandle, radius: CornerRadius) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.corner_radius = Some(radius);
        }
    }

    fn set_text(&mut self, node: NodeHandle, text: TextProps) {
        if let Some(n) = self.nodes.get_mut(&node) {
            // Optional spans the caller never set have no single
            // reportable value; this host reports them as mixed.
            n.text = Some(NativeText {
                characters: text.characters,
                font: Mixed::Uniform(text.font),
                font_size: Mixed::Uniform(text.font_size.unwrap_or(14.0)),
                align_h: text.align_h.unwrap_or(TextAlignH::Left),
                align_v: text.align_v.unwrap_or(TextAlignV::Top),
                line_height: match text.line_height {
                    Some(lh) => Mixed::Uniform(lh),
                    None => Mixed::Mixed,
                },
                letter_spacing: match text.letter_spacing {
                    Some(ls) => Mixed::Uniform(ls),
                    None => Mixed::Mixed,
                },
                case: match text.case {
                    Some(c) => Mixed::Uniform(c),
                    None => Mixed::Mixed,
                },
                decoration: match text.decoration {
                    Some(d) => Mixed::Uniform(d),
                    None => Mixed::Mixed,
                },
                auto_resize: text.auto_resize,
            });
        }
    }

    fn set_layout(&mut self, node: NodeHandle, layout: AutoLayout) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.layout = Some(layout);
        }
    }

    fn set_common(&mut self, node: NodeHandle, props: CommonProps) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.opacity = props.opacity;
            n.blend_mode = props.blend_mode;
            n.visible = props.visible;
            n.locked = props.locked;
            n.rotation = props.rotation;
        }
    }

    fn set_effects(&mut self, node: NodeHandle, effects: Vec<crate::canvas::NativeEffect>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.effects = effects;
        }
    }

    fn set_shape_extras(
        &mut self,
        node: NodeHandle,
        arc_data: Option<ArcData>,
        point_count: Option<u32>,
        inner_radius: Option<f32>,
    ) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.arc_data = arc_data;
            n.point_count = point_count;
            n.inner_radius = inner_radius;
        }
    }

    fn set_vector_paths(&mut self, node: NodeHandle, paths: Vec<VectorPath>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.vector_paths = paths;
        }
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        self.parents.insert(child, parent);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
    }

    fn group(&mut self, nodes: &[NodeHandle]) -> Result<NodeHandle, CanvasError> {
        if nodes.is_empty() {
            return Err(CanvasError::Unsupported("cannot group zero nodes".into()));
        }
        // Group bounds are the union of member bounds.
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for handle in nodes {
            let Some(n) = self.nodes.get(handle) else {
                return Err(CanvasError::NodeCreation(format!("unknown node {handle:?}")));
            };
            min_x = min_x.min(n.x);
            min_y = min_y.min(n.y);
            max_x = max_x.max(n.x + n.width);
            max_y = max_y.max(n.y + n.height);
        }
        let group = self.alloc("GROUP");
        for &member in nodes {
            self.append_child(group, member);
        }
        if let Some(g) = self.nodes.get_mut(&group) {
            g.x = min_x;
            g.y = min_y;
            g.width = (max_x - min_x).max(0.0);
            g.height = (max_y - min_y).max(0.0);
        }
        Ok(group)
    }

    fn boolean_op(
        &mut self,
        op: BooleanOp,
        nodes: &[NodeHandle],
    ) -> Result<NodeHandle, CanvasError> {
        if nodes.len() < 2 {
            return Err(CanvasError::Unsupported(
                "boolean operation needs at least 2 nodes".into(),
            ));
        }
        let combined = self.alloc("BOOLEAN_OPERATION");
        for &member in nodes {
            self.append_child(combined, member);
        }
        if let Some(n) = self.nodes.get_mut(&combined) {
            n.boolean_op = Some(op);
        }
        Ok(combined)
    }

    async fn load_font(&mut self, font: &FontName) -> Result<(), CanvasError> {
        if self
            .font_families
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&font.family))
        {
            Ok(())
        } else {
            Err(CanvasError::FontUnavailable(format!(
                "{} {}",
                font.family, font.style
            )))
        }
    }

    async fn create_image(&mut self, bytes_base64: &str) -> Result<ImageHandle, CanvasError> {
        if bytes_base64.trim().is_empty() {
            return Err(CanvasError::ImageDecode("empty image payload".into()));
        }
        let hash = fnv1a(bytes_base64.as_bytes());
        let handle = ImageHandle(hash.clone());
        self.images.insert(hash, handle.clone());
        Ok(handle)
    }

    fn image_by_hash(&self, hash: &str) -> Option<ImageHandle> {
        self.images.get(hash).cloned()
    }

    fn current_selection(&self) -> Vec<NodeHandle> {
        self.selection.clone()
    }

    fn set_selection(&mut self, nodes: &[NodeHandle]) {
        self.selection = nodes.to_vec();
    }

    fn focus_viewport(&mut self, nodes: &[NodeHandle]) {
        self.focused = nodes.to_vec();
    }

    fn node(&self, handle: NodeHandle) -> Option<&NativeNode> {
        self.nodes.get(&handle)
    }

    fn root_nodes(&self) -> Vec<NodeHandle> {
        self.roots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_moves_node_out_of_roots() {
        let mut canvas = MemoryCanvas::new();
        let frame = canvas.create_container(ContainerKind::Frame).unwrap();
        let rect = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        assert_eq!(canvas.root_nodes().len(), 2);
        canvas.append_child(frame, rect);
        assert_eq!(canvas.root_nodes(), vec![frame]);
        assert_eq!(canvas.node(frame).unwrap().children, vec![rect]);
    }

    #[test]
    fn group_takes_union_bounds() {
        let mut canvas = MemoryCanvas::new();
        let a = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.set_position(a, 10.0, 10.0);
        canvas.resize(a, 20.0, 20.0);
        let b = canvas.create_shape(ShapeKind::Rectangle).unwrap();
        canvas.set_position(b, 50.0, 0.0);
        canvas.resize(b, 10.0, 10.0);

        let group = canvas.group(&[a, b]).unwrap();
        let g = canvas.node(group).unwrap();
        assert_eq!((g.x, g.y), (10.0, 0.0));
        assert_eq!((g.width, g.height), (50.0, 30.0));
        assert_eq!(g.children, vec![a, b]);
        assert_eq!(canvas.root_nodes(), vec![group]);
    }

    #[tokio::test]
    async fn unknown_font_family_fails_resolution() {
        let mut canvas = MemoryCanvas::new();
        assert!(canvas.load_font(&FontName::default()).await.is_ok());
        assert!(
            canvas
                .load_font(&FontName::new("Comic Neue", "Bold"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn created_images_are_reusable_by_hash() {
        let mut canvas = MemoryCanvas::new();
        let img = canvas.create_image("aGVsbG8=").await.unwrap();
        assert_eq!(canvas.image_by_hash(&img.0), Some(img));
        assert_eq!(canvas.image_by_hash("missing"), None);
    }
}
