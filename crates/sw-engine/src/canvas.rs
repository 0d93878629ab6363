//! Hosting-canvas capability surface.
//!
//! The transcoder never talks to a real canvas directly — everything
//! goes through the `Canvas` trait. The write half (creation engine)
//! uses the constructors and setters; the read half (export engine)
//! uses `node`/`root_nodes` snapshots. The only async operations are
//! the true I/O boundaries: font resolution and image creation.

use std::fmt;
use sw_core::model::{
    ArcData, AutoLayout, BlendMode, BooleanOp, CornerRadius, GradientKind, ImageScaleMode,
    StrokeAlign, TextAlignH, TextAlignV, TextAutoResize, TextCase, TextDecoration,
};
use sw_core::path::VectorPath;

// ─── Handles ─────────────────────────────────────────────────────────────

/// Opaque handle to one host-native node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Opaque handle to a host-side image, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub String);

/// Font identity as the host resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontName {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

// ─── Possibly-mixed host values ──────────────────────────────────────────

/// A value the host may report as a multi-value span (e.g. mixed stroke
/// weight, mixed font across a text run). The export engine treats
/// `Mixed` as absent rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mixed<T> {
    Uniform(T),
    Mixed,
}

impl<T> Mixed<T> {
    pub fn uniform(self) -> Option<T> {
        match self {
            Self::Uniform(v) => Some(v),
            Self::Mixed => None,
        }
    }

    pub fn as_uniform(&self) -> Option<&T> {
        match self {
            Self::Uniform(v) => Some(v),
            Self::Mixed => None,
        }
    }
}

// ─── Native paint & effects ──────────────────────────────────────────────

/// RGB color as the host stores it — no alpha channel; paint opacity is
/// carried separately. Channels are `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// A gradient stop on the native side: position, RGB, separate alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeStop {
    pub position: f32,
    pub color: NativeColor,
    pub alpha: f32,
}

/// Host-native paint. `Unknown` covers paint kinds the transcoder does
/// not model; the mappers drop those on export.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePaint {
    Solid {
        color: NativeColor,
        opacity: f32,
    },
    Gradient {
        kind: GradientKind,
        stops: Vec<NativeStop>,
        transform: [[f32; 3]; 2],
    },
    Image {
        image: ImageHandle,
        scale_mode: ImageScaleMode,
    },
    Unknown(String),
}

/// Host-native effect. `Unknown` is dropped by the mappers.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEffect {
    DropShadow {
        color: NativeColor,
        alpha: f32,
        offset: (f32, f32),
        radius: f32,
        spread: f32,
        blend_mode: BlendMode,
    },
    InnerShadow {
        color: NativeColor,
        alpha: f32,
        offset: (f32, f32),
        radius: f32,
        spread: f32,
        blend_mode: BlendMode,
    },
    LayerBlur {
        radius: f32,
    },
    BackgroundBlur {
        radius: f32,
    },
    Unknown(String),
}

// ─── Creation parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Frame,
    Component,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
    Polygon,
    Star,
}

/// Text content + resolved font, applied in one call. Callers must have
/// awaited `load_font` for `font` first — hosts cannot set characters
/// without a resolved font.
#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    pub characters: String,
    pub font: FontName,
    pub font_size: Option<f32>,
    pub align_h: Option<TextAlignH>,
    pub align_v: Option<TextAlignV>,
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub case: Option<TextCase>,
    pub decoration: Option<TextDecoration>,
    pub auto_resize: TextAutoResize,
}

/// The uniform finishing properties applied to every created node
/// regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonProps {
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub locked: bool,
    pub rotation: f32,
}

// ─── Readable node snapshot ──────────────────────────────────────────────

/// Text state as the host reports it. Fields that can vary across a
/// text run come back as `Mixed`.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeText {
    pub characters: String,
    pub font: Mixed<FontName>,
    pub font_size: Mixed<f32>,
    pub align_h: TextAlignH,
    pub align_v: TextAlignV,
    pub line_height: Mixed<f32>,
    pub letter_spacing: Mixed<f32>,
    pub case: Mixed<TextCase>,
    pub decoration: Mixed<TextDecoration>,
    pub auto_resize: TextAutoResize,
}

/// One host-native node, as readable state. `kind` is the host's own
/// type string (which may name kinds the transcoder does not model).
#[derive(Debug, Clone, PartialEq)]
pub struct NativeNode {
    pub id: NodeHandle,
    pub kind: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub fills: Vec<NativePaint>,
    pub strokes: Vec<NativePaint>,
    pub stroke_weight: Mixed<f32>,
    pub stroke_align: Option<StrokeAlign>,
    pub corner_radius: Option<CornerRadius>,
    pub text: Option<NativeText>,
    pub layout: Option<AutoLayout>,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub locked: bool,
    pub effects: Vec<NativeEffect>,
    pub arc_data: Option<ArcData>,
    pub point_count: Option<u32>,
    pub inner_radius: Option<f32>,
    pub boolean_op: Option<BooleanOp>,
    pub vector_paths: Vec<VectorPath>,
    pub children: Vec<NodeHandle>,
}

impl NativeNode {
    pub fn new(id: NodeHandle, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: Mixed::Uniform(1.0),
            stroke_align: None,
            corner_radius: None,
            text: None,
            layout: None,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            locked: false,
            effects: Vec::new(),
            arc_data: None,
            point_count: None,
            inner_radius: None,
            boolean_op: None,
            vector_paths: Vec::new(),
            children: Vec::new(),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────

/// Failure reported by the hosting canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    NodeCreation(String),
    FontUnavailable(String),
    ImageDecode(String),
    Unsupported(String),
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeCreation(msg) => write!(f, "node creation failed: {msg}"),
            Self::FontUnavailable(font) => write!(f, "font unavailable: {font}"),
            Self::ImageDecode(msg) => write!(f, "image decode failed: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported canvas operation: {msg}"),
        }
    }
}

impl std::error::Error for CanvasError {}

// ─── The capability trait ────────────────────────────────────────────────

/// The narrow surface the transcoder consumes from its hosting canvas.
///
/// Implementations are single-threaded collaborators; the engine never
/// calls them concurrently, and children are appended strictly in
/// declaration order so z-order matches the input document. Futures
/// returned here are not required to be `Send` — the whole transcoder
/// runs as one cooperative call chain.
#[allow(async_fn_in_trait)]
pub trait Canvas {
    // Construction
    fn create_container(&mut self, kind: ContainerKind) -> Result<NodeHandle, CanvasError>;
    fn create_shape(&mut self, kind: ShapeKind) -> Result<NodeHandle, CanvasError>;
    fn create_text(&mut self) -> Result<NodeHandle, CanvasError>;
    fn create_vector(&mut self) -> Result<NodeHandle, CanvasError>;
    fn remove_node(&mut self, node: NodeHandle);

    // Property setters
    fn set_name(&mut self, node: NodeHandle, name: &str);
    fn set_position(&mut self, node: NodeHandle, x: f32, y: f32);
    fn resize(&mut self, node: NodeHandle, width: f32, height: f32);
    fn set_fills(&mut self, node: NodeHandle, fills: Vec<NativePaint>);
    fn set_strokes(
        &mut self,
        node: NodeHandle,
        strokes: Vec<NativePaint>,
        weight: f32,
        align: Option<StrokeAlign>,
    );
    fn set_corner_radius(&mut self, node: NodeHandle, radius: CornerRadius);
    fn set_text(&mut self, node: NodeHandle, text: TextProps);
    fn set_layout(&mut self, node: NodeHandle, layout: AutoLayout);
    fn set_common(&mut self, node: NodeHandle, props: CommonProps);
    fn set_effects(&mut self, node: NodeHandle, effects: Vec<NativeEffect>);
    fn set_shape_extras(
        &mut self,
        node: NodeHandle,
        arc_data: Option<ArcData>,
        point_count: Option<u32>,
        inner_radius: Option<f32>,
    );
    fn set_vector_paths(&mut self, node: NodeHandle, paths: Vec<VectorPath>);

    // Structure
    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle);
    fn group(&mut self, nodes: &[NodeHandle]) -> Result<NodeHandle, CanvasError>;
    fn boolean_op(&mut self, op: BooleanOp, nodes: &[NodeHandle])
    -> Result<NodeHandle, CanvasError>;

    // I/O boundaries (the only suspension points in the transcoder)
    async fn load_font(&mut self, font: &FontName) -> Result<(), CanvasError>;
    /// `bytes_base64` is the inline image payload as it appears in the
    /// design document; decoding is the host's concern.
    async fn create_image(&mut self, bytes_base64: &str) -> Result<ImageHandle, CanvasError>;
    fn image_by_hash(&self, hash: &str) -> Option<ImageHandle>;

    // Selection & viewport
    fn current_selection(&self) -> Vec<NodeHandle>;
    fn set_selection(&mut self, nodes: &[NodeHandle]);
    fn focus_viewport(&mut self, nodes: &[NodeHandle]);

    // Read side (export engine)
    fn node(&self, handle: NodeHandle) -> Option<&NativeNode>;
    fn root_nodes(&self) -> Vec<NodeHandle>;
}
