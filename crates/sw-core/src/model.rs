//! Design-document data model.
//!
//! `DesignNode` is the host-independent interchange representation of one
//! visual element. It is created transiently per import/export call and
//! owns nothing durable — the hosting canvas's native nodes are the
//! persistent entities.
//!
//! The wire format is flat camelCase JSON as produced by the upstream AI
//! service. Decoding is tolerant: unknown node types fold to a safe
//! default, unrecognized fill/effect subtypes are dropped entry-wise, and
//! malformed children are skipped without failing their siblings.

use crate::path::{VectorPath, WindingRule};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use smallvec::SmallVec;

// ─── Scalar helpers ──────────────────────────────────────────────────────

/// Clamp a value to the unit interval. Used for opacity and color
/// channels throughout the transcoder.
pub fn clamp_unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Round to 4 decimal places. Shadow colors are rounded on export so
/// float churn does not dirty round-trips.
pub fn round4(v: f32) -> f32 {
    (v * 10_000.0).round() / 10_000.0
}

fn f32_of(v: &Value) -> Option<f32> {
    v.as_f64().map(|n| n as f32)
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32.
///
/// Input contract: channels are `[0.0, 1.0]` floats. Out-of-range input
/// is clamped per channel — there is no magnitude-based `0–255` rescaling
/// anywhere in the transcoder, so `{r:255,g:0,b:0}` decodes as `{1,0,0}`.
/// Export always emits `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let b = hex.as_bytes();
        let short = |d: u8| (d * 17) as f32 / 255.0;
        let wide = |hi: u8, lo: u8| ((hi << 4) | lo) as f32 / 255.0;
        match b.len() {
            3 => Some(Self::rgba(
                short(hex_val(b[0])?),
                short(hex_val(b[1])?),
                short(hex_val(b[2])?),
                1.0,
            )),
            4 => Some(Self::rgba(
                short(hex_val(b[0])?),
                short(hex_val(b[1])?),
                short(hex_val(b[2])?),
                short(hex_val(b[3])?),
            )),
            6 => Some(Self::rgba(
                wide(hex_val(b[0])?, hex_val(b[1])?),
                wide(hex_val(b[2])?, hex_val(b[3])?),
                wide(hex_val(b[4])?, hex_val(b[5])?),
                1.0,
            )),
            8 => Some(Self::rgba(
                wide(hex_val(b[0])?, hex_val(b[1])?),
                wide(hex_val(b[2])?, hex_val(b[3])?),
                wide(hex_val(b[4])?, hex_val(b[5])?),
                wide(hex_val(b[6])?, hex_val(b[7])?),
            )),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (clamp_unit(self.r) * 255.0).round() as u8;
        let g = (clamp_unit(self.g) * 255.0).round() as u8;
        let b = (clamp_unit(self.b) * 255.0).round() as u8;
        let a = (clamp_unit(self.a) * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Tolerant decode: `{r,g,b}` object (alpha optional, defaults 1),
    /// or a hex string. Channels clamp to `[0,1]`.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Self::from_hex(s),
            Value::Object(obj) => {
                let ch = |k: &str| obj.get(k).and_then(f32_of).map(clamp_unit);
                Some(Self::rgba(
                    ch("r")?,
                    ch("g")?,
                    ch("b")?,
                    ch("a").unwrap_or(1.0),
                ))
            }
            _ => None,
        }
    }

    /// Per-channel rounding to 4 decimals (export-side shadow colors).
    pub fn rounded(self) -> Self {
        Self::rgba(round4(self.r), round4(self.g), round4(self.b), round4(self.a))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        Color::from_value(&v)
            .ok_or_else(|| serde::de::Error::custom("expected color object or hex string"))
    }
}

// ─── Token enums ─────────────────────────────────────────────────────────

/// Declares a closed enum with case-insensitive token decoding.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $token:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Case-insensitive token lookup.
            pub fn from_token(s: &str) -> Option<Self> {
                $(if s.eq_ignore_ascii_case($token) { return Some(Self::$variant); })+
                None
            }

            /// The canonical wire token.
            pub fn as_token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }
    };
}

token_enum! {
    /// The closed set of node kinds the transcoder models.
    NodeType {
        Frame => "FRAME",
        Group => "GROUP",
        Rectangle => "RECTANGLE",
        Text => "TEXT",
        Ellipse => "ELLIPSE",
        Vector => "VECTOR",
        Instance => "INSTANCE",
        Component => "COMPONENT",
        Line => "LINE",
        Polygon => "POLYGON",
        Star => "STAR",
        BooleanOperation => "BOOLEAN_OPERATION",
    }
}

impl NodeType {
    /// Total, case-insensitive normalization. Unknown tokens (including
    /// the empty string) fold to `Frame` — never an error.
    pub fn normalize(s: &str) -> Self {
        Self::from_token(s.trim()).unwrap_or(Self::Frame)
    }

    /// Whether this kind can host children natively (frame-like
    /// containers plus boolean operations).
    pub fn supports_children(self) -> bool {
        matches!(
            self,
            Self::Frame
                | Self::Group
                | Self::Component
                | Self::Instance
                | Self::BooleanOperation
        )
    }

    /// Frame-like containers (create-container path in the engine).
    pub fn is_frame_like(self) -> bool {
        matches!(self, Self::Frame | Self::Component | Self::Instance)
    }
}

token_enum! {
    /// Blend modes. `Normal` is the node default and omitted on export.
    BlendMode {
        PassThrough => "PASS_THROUGH",
        Normal => "NORMAL",
        Darken => "DARKEN",
        Multiply => "MULTIPLY",
        ColorBurn => "COLOR_BURN",
        Lighten => "LIGHTEN",
        Screen => "SCREEN",
        ColorDodge => "COLOR_DODGE",
        Overlay => "OVERLAY",
        SoftLight => "SOFT_LIGHT",
        HardLight => "HARD_LIGHT",
        Difference => "DIFFERENCE",
        Exclusion => "EXCLUSION",
        Hue => "HUE",
        Saturation => "SATURATION",
        Color => "COLOR",
        Luminosity => "LUMINOSITY",
    }
}

impl BlendMode {
    /// Whether this mode is the pass-through/normal default.
    pub fn is_default(self) -> bool {
        matches!(self, Self::Normal | Self::PassThrough)
    }
}

token_enum! {
    StrokeAlign {
        Inside => "INSIDE",
        Outside => "OUTSIDE",
        Center => "CENTER",
    }
}

token_enum! {
    /// Auto-layout direction. `None` means free positioning; the engine
    /// applies layout properties only when the mode is not `None`.
    LayoutMode {
        None => "NONE",
        Horizontal => "HORIZONTAL",
        Vertical => "VERTICAL",
    }
}

token_enum! {
    AxisAlign {
        Min => "MIN",
        Center => "CENTER",
        Max => "MAX",
        SpaceBetween => "SPACE_BETWEEN",
    }
}

token_enum! {
    AxisSizing {
        Fixed => "FIXED",
        Auto => "AUTO",
    }
}

token_enum! {
    TextAlignH {
        Left => "LEFT",
        Center => "CENTER",
        Right => "RIGHT",
        Justified => "JUSTIFIED",
    }
}

token_enum! {
    TextAlignV {
        Top => "TOP",
        Center => "CENTER",
        Bottom => "BOTTOM",
    }
}

token_enum! {
    TextCase {
        Original => "ORIGINAL",
        Upper => "UPPER",
        Lower => "LOWER",
        Title => "TITLE",
    }
}

token_enum! {
    TextDecoration {
        None => "NONE",
        Underline => "UNDERLINE",
        Strikethrough => "STRIKETHROUGH",
    }
}

token_enum! {
    /// Derived on import when absent: both dimensions given → `None`
    /// (fixed size), only width → `Height`, neither → `WidthAndHeight`.
    TextAutoResize {
        None => "NONE",
        Height => "HEIGHT",
        WidthAndHeight => "WIDTH_AND_HEIGHT",
        Truncate => "TRUNCATE",
    }
}

token_enum! {
    /// Boolean-operation combinator. Defaults to `Union`.
    BooleanOp {
        Union => "UNION",
        Intersect => "INTERSECT",
        Subtract => "SUBTRACT",
        Exclude => "EXCLUDE",
    }
}

token_enum! {
    GradientKind {
        Linear => "GRADIENT_LINEAR",
        Radial => "GRADIENT_RADIAL",
        Angular => "GRADIENT_ANGULAR",
        Diamond => "GRADIENT_DIAMOND",
    }
}

token_enum! {
    ImageScaleMode {
        Fill => "FILL",
        Fit => "FIT",
        Crop => "CROP",
        Tile => "TILE",
    }
}

// ─── Fill ────────────────────────────────────────────────────────────────

/// A gradient stop: position in `[0,1]` plus color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

/// 2×3 affine transform for gradient geometry, row-major.
pub type GradientTransform = [[f32; 3]; 2];

/// Paint applied to fills and strokes — a closed tagged union.
/// Unrecognized subtypes are dropped on decode, never defaulted.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid {
        color: Color,
    },
    Gradient {
        kind: GradientKind,
        stops: SmallVec<[GradientStop; 4]>,
        transform: Option<GradientTransform>,
    },
    /// Image paint: inline base64 bytes or a reusable host-side hash.
    /// At least one of the two is present in a well-formed fill.
    Image {
        bytes: Option<String>,
        hash: Option<String>,
        scale_mode: ImageScaleMode,
    },
}

impl Fill {
    pub const fn solid(color: Color) -> Self {
        Self::Solid { color }
    }

    /// Tolerant decode keyed by the `type` tag. `None` means the entry
    /// is dropped (unknown subtype or missing required field).
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let tag = obj.get("type")?.as_str()?;
        if tag.eq_ignore_ascii_case("SOLID") {
            let color = Color::from_value(obj.get("color")?)?;
            return Some(Self::Solid { color });
        }
        if let Some(kind) = GradientKind::from_token(tag) {
            let stops = obj
                .get("gradientStops")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|s| {
                            let s = s.as_object()?;
                            Some(GradientStop {
                                position: s.get("position").and_then(f32_of)?,
                                color: Color::from_value(s.get("color")?)?,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            let transform = obj.get("gradientTransform").and_then(transform_from_value);
            return Some(Self::Gradient {
                kind,
                stops,
                transform,
            });
        }
        if tag.eq_ignore_ascii_case("IMAGE") {
            let bytes = obj
                .get("imageBytes")
                .and_then(Value::as_str)
                .map(str::to_owned);
            let hash = obj
                .get("imageHash")
                .and_then(Value::as_str)
                .map(str::to_owned);
            if bytes.is_none() && hash.is_none() {
                return None;
            }
            let scale_mode = obj
                .get("scaleMode")
                .and_then(Value::as_str)
                .and_then(ImageScaleMode::from_token)
                .unwrap_or(ImageScaleMode::Fill);
            return Some(Self::Image {
                bytes,
                hash,
                scale_mode,
            });
        }
        None
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Solid { color } => json!({ "type": "SOLID", "color": color }),
            Self::Gradient {
                kind,
                stops,
                transform,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), kind.as_token().into());
                obj.insert(
                    "gradientStops".into(),
                    Value::Array(
                        stops
                            .iter()
                            .map(|s| json!({ "position": s.position, "color": s.color }))
                            .collect(),
                    ),
                );
                if let Some(t) = transform {
                    obj.insert("gradientTransform".into(), json!(t));
                }
                Value::Object(obj)
            }
            Self::Image {
                bytes,
                hash,
                scale_mode,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), "IMAGE".into());
                if let Some(b) = bytes {
                    obj.insert("imageBytes".into(), b.clone().into());
                }
                if let Some(h) = hash {
                    obj.insert("imageHash".into(), h.clone().into());
                }
                obj.insert("scaleMode".into(), scale_mode.as_token().into());
                Value::Object(obj)
            }
        }
    }
}

fn transform_from_value(v: &Value) -> Option<GradientTransform> {
    let rows = v.as_array()?;
    if rows.len() != 2 {
        return None;
    }
    let mut out = [[0.0f32; 3]; 2];
    for (i, row) in rows.iter().enumerate() {
        let cells = row.as_array()?;
        if cells.len() != 3 {
            return None;
        }
        for (j, cell) in cells.iter().enumerate() {
            out[i][j] = f32_of(cell)?;
        }
    }
    Some(out)
}

/// Decode a fill list, dropping unrecognized entries one by one.
pub fn fills_from_value(v: &Value) -> Option<Vec<Fill>> {
    let arr = v.as_array()?;
    let fills: Vec<Fill> = arr.iter().filter_map(Fill::from_value).collect();
    if fills.len() < arr.len() {
        log::debug!("dropped {} unrecognized fill(s)", arr.len() - fills.len());
    }
    Some(fills)
}

// ─── Effect ──────────────────────────────────────────────────────────────

/// 2D offset (shadow direction).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Visual effect — a closed tagged union. Shadows carry the full set of
/// parameters; blurs carry only a radius. Unrecognized subtypes are
/// dropped silently in both directions.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DropShadow {
        color: Color,
        offset: Vec2,
        radius: f32,
        spread: f32,
        blend_mode: BlendMode,
    },
    InnerShadow {
        color: Color,
        offset: Vec2,
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
}

impl Effect {
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let tag = obj.get("type")?.as_str()?;
        let radius = obj.get("radius").and_then(f32_of).unwrap_or(0.0);
        if tag.eq_ignore_ascii_case("LAYER_BLUR") {
            return Some(Self::LayerBlur { radius });
        }
        if tag.eq_ignore_ascii_case("BACKGROUND_BLUR") {
            return Some(Self::BackgroundBlur { radius });
        }
        let inner = if tag.eq_ignore_ascii_case("DROP_SHADOW") {
            false
        } else if tag.eq_ignore_ascii_case("INNER_SHADOW") {
            true
        } else {
            return None;
        };
        let color = obj
            .get("color")
            .and_then(Color::from_value)
            .unwrap_or(Color::rgba(0.0, 0.0, 0.0, 0.25));
        let offset = obj
            .get("offset")
            .and_then(|o| {
                Some(Vec2 {
                    x: o.get("x").and_then(f32_of)?,
                    y: o.get("y").and_then(f32_of)?,
                })
            })
            .unwrap_or_default();
        let spread = obj.get("spread").and_then(f32_of).unwrap_or(0.0);
        let blend_mode = obj
            .get("blendMode")
            .and_then(Value::as_str)
            .and_then(BlendMode::from_token)
            .unwrap_or(BlendMode::Normal);
        Some(if inner {
            Self::InnerShadow {
                color,
                offset,
                radius,
                spread,
                blend_mode,
            }
        } else {
            Self::DropShadow {
                color,
                offset,
                radius,
                spread,
                blend_mode,
            }
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::DropShadow {
                color,
                offset,
                radius,
                spread,
                blend_mode,
            } => shadow_value("DROP_SHADOW", color, offset, *radius, *spread, *blend_mode),
            Self::InnerShadow {
                color,
                offset,
                radius,
                spread,
                blend_mode,
            } => shadow_value("INNER_SHADOW", color, offset, *radius, *spread, *blend_mode),
            Self::LayerBlur { radius } => json!({ "type": "LAYER_BLUR", "radius": radius }),
            Self::BackgroundBlur { radius } => {
                json!({ "type": "BACKGROUND_BLUR", "radius": radius })
            }
        }
    }
}

fn shadow_value(
    tag: &str,
    color: &Color,
    offset: &Vec2,
    radius: f32,
    spread: f32,
    blend_mode: BlendMode,
) -> Value {
    json!({
        "type": tag,
        "color": color,
        "offset": offset,
        "radius": radius,
        "spread": spread,
        "blendMode": blend_mode.as_token(),
    })
}

// ─── Corner radius ───────────────────────────────────────────────────────

/// Uniform or per-corner radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerRadius {
    Uniform(f32),
    /// Order: top-left, top-right, bottom-right, bottom-left.
    PerCorner([f32; 4]),
}

// ─── Text / layout / shape property groups ───────────────────────────────

/// Text properties. On the wire these are flat fields (`characters`,
/// `fontName`, `fontSize`, ...); they are grouped here so the text
/// creator takes one coherent value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub characters: Option<String>,
    pub font_family: Option<String>,
    pub font_style: Option<String>,
    pub font_size: Option<f32>,
    pub align_h: Option<TextAlignH>,
    pub align_v: Option<TextAlignV>,
    /// Pixel line height. Unit objects in input are dropped.
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub case: Option<TextCase>,
    pub decoration: Option<TextDecoration>,
    pub auto_resize: Option<TextAutoResize>,
}

/// Auto-layout properties. Present only when `layoutMode` is declared
/// and not `NONE`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoLayout {
    pub mode: LayoutMode,
    pub primary_align: Option<AxisAlign>,
    pub counter_align: Option<AxisAlign>,
    pub primary_sizing: Option<AxisSizing>,
    pub counter_sizing: Option<AxisSizing>,
    pub item_spacing: Option<f32>,
    pub padding: [f32; 4], // left, right, top, bottom
    pub wrap: bool,
}

/// Ellipse arc data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcData {
    pub starting_angle: f32,
    pub ending_angle: f32,
    pub inner_radius: f32,
}

// ─── DesignNode ──────────────────────────────────────────────────────────

/// One visual element. Required fields are `name`, `ty`, `x`, `y`;
/// everything else is optional and omitted from the wire when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignNode {
    pub name: String,
    pub ty: NodeType,
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub fills: Option<Vec<Fill>>,
    pub strokes: Option<Vec<Fill>>,
    pub stroke_weight: Option<f32>,
    pub stroke_align: Option<StrokeAlign>,
    pub corner_radius: Option<CornerRadius>,
    pub text: Option<TextStyle>,
    pub layout: Option<AutoLayout>,
    pub opacity: Option<f32>,
    pub blend_mode: Option<BlendMode>,
    pub effects: Option<Vec<Effect>>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub arc_data: Option<ArcData>,
    pub point_count: Option<u32>,
    pub inner_radius: Option<f32>,
    pub boolean_operation: Option<BooleanOp>,
    pub vector_paths: SmallVec<[VectorPath; 2]>,
    /// Explicit icon keyword attached by an upstream step.
    pub icon: Option<String>,
    pub children: Vec<DesignNode>,
}

impl DesignNode {
    /// A bare node of the given kind at a position; everything optional
    /// left empty.
    pub fn new(name: impl Into<String>, ty: NodeType, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            ty,
            x,
            y,
            width: None,
            height: None,
            rotation: None,
            fills: None,
            strokes: None,
            stroke_weight: None,
            stroke_align: None,
            corner_radius: None,
            text: None,
            layout: None,
            opacity: None,
            blend_mode: None,
            effects: None,
            visible: None,
            locked: None,
            arc_data: None,
            point_count: None,
            inner_radius: None,
            boolean_operation: None,
            vector_paths: SmallVec::new(),
            icon: None,
            children: Vec::new(),
        }
    }

    /// Whether this node should be routed to icon synthesis: explicit
    /// vector type, inline path data, an attached keyword, or an
    /// `icon:` name marker.
    pub fn wants_icon_synthesis(&self) -> bool {
        self.ty == NodeType::Vector
            || !self.vector_paths.is_empty()
            || self.icon.is_some()
            || self.name.to_ascii_lowercase().starts_with("icon:")
    }

    // ── Tolerant decode ──────────────────────────────────────────────

    /// Decode one node from a JSON value. Returns `None` when the value
    /// is not object-shaped at all; field-level problems degrade (bad
    /// children dropped, unknown enums ignored) instead of failing.
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let num = |k: &str| obj.get(k).and_then(f32_of);
        let s = |k: &str| obj.get(k).and_then(Value::as_str);

        let children: Vec<DesignNode> = obj
            .get("children")
            .and_then(Value::as_array)
            .map(|arr| {
                let kept: Vec<DesignNode> =
                    arr.iter().filter_map(DesignNode::from_value).collect();
                if kept.len() < arr.len() {
                    log::warn!(
                        "dropped {} malformed child node(s)",
                        arr.len() - kept.len()
                    );
                }
                kept
            })
            .unwrap_or_default();

        // Unknown type tokens degrade by shape: containers when children
        // are present, plain rectangles otherwise.
        let ty = match s("type") {
            Some(t) => NodeType::from_token(t.trim()).unwrap_or(if children.is_empty() {
                NodeType::Rectangle
            } else {
                NodeType::Frame
            }),
            None => {
                if children.is_empty() {
                    NodeType::Rectangle
                } else {
                    NodeType::Frame
                }
            }
        };

        let name = s("name")
            .map(str::to_owned)
            .unwrap_or_else(|| default_name(ty));

        let text = decode_text(obj);
        let layout = decode_layout(obj);
        let corner_radius = decode_corner_radius(obj);
        let vector_paths = obj
            .get("vectorPaths")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(vector_path_from_value).collect())
            .unwrap_or_default();

        Some(Self {
            name,
            ty,
            x: num("x").unwrap_or(0.0),
            y: num("y").unwrap_or(0.0),
            width: num("width"),
            height: num("height"),
            rotation: num("rotation"),
            fills: obj.get("fills").and_then(fills_from_value),
            strokes: obj.get("strokes").and_then(fills_from_value),
            stroke_weight: num("strokeWeight"),
            stroke_align: s("strokeAlign").and_then(StrokeAlign::from_token),
            corner_radius,
            text,
            layout,
            opacity: num("opacity"),
            blend_mode: s("blendMode").and_then(BlendMode::from_token),
            effects: obj.get("effects").and_then(Value::as_array).map(|arr| {
                arr.iter().filter_map(Effect::from_value).collect()
            }),
            visible: obj.get("visible").and_then(Value::as_bool),
            locked: obj.get("locked").and_then(Value::as_bool),
            arc_data: obj
                .get("arcData")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            point_count: obj.get("pointCount").and_then(Value::as_u64).map(|n| n as u32),
            inner_radius: num("innerRadius"),
            boolean_operation: s("booleanOperation").and_then(BooleanOp::from_token),
            vector_paths,
            icon: s("icon").map(str::to_owned),
            children,
        })
    }

    // ── Flat camelCase encode ────────────────────────────────────────

    /// Encode to the flat wire object. Absent optional fields are
    /// omitted entirely; an empty child list never appears as `[]`.
    pub fn to_value(&self) -> Value {
        let mut o = Map::new();
        o.insert("name".into(), self.name.clone().into());
        o.insert("type".into(), self.ty.as_token().into());
        o.insert("x".into(), json!(self.x));
        o.insert("y".into(), json!(self.y));
        put_num(&mut o, "width", self.width);
        put_num(&mut o, "height", self.height);
        put_num(&mut o, "rotation", self.rotation);
        if let Some(fills) = &self.fills {
            o.insert(
                "fills".into(),
                Value::Array(fills.iter().map(Fill::to_value).collect()),
            );
        }
        if let Some(strokes) = &self.strokes {
            o.insert(
                "strokes".into(),
                Value::Array(strokes.iter().map(Fill::to_value).collect()),
            );
        }
        put_num(&mut o, "strokeWeight", self.stroke_weight);
        if let Some(a) = self.stroke_align {
            o.insert("strokeAlign".into(), a.as_token().into());
        }
        match self.corner_radius {
            Some(CornerRadius::Uniform(r)) => {
                o.insert("cornerRadius".into(), json!(r));
            }
            Some(CornerRadius::PerCorner([tl, tr, br, bl])) => {
                o.insert("topLeftRadius".into(), json!(tl));
                o.insert("topRightRadius".into(), json!(tr));
                o.insert("bottomRightRadius".into(), json!(br));
                o.insert("bottomLeftRadius".into(), json!(bl));
            }
            None => {}
        }
        if let Some(text) = &self.text {
            encode_text(&mut o, text);
        }
        if let Some(layout) = &self.layout {
            encode_layout(&mut o, layout);
        }
        put_num(&mut o, "opacity", self.opacity);
        if let Some(bm) = self.blend_mode {
            o.insert("blendMode".into(), bm.as_token().into());
        }
        if let Some(effects) = &self.effects {
            o.insert(
                "effects".into(),
                Value::Array(effects.iter().map(Effect::to_value).collect()),
            );
        }
        if let Some(v) = self.visible {
            o.insert("visible".into(), v.into());
        }
        if let Some(l) = self.locked {
            o.insert("locked".into(), l.into());
        }
        if let Some(arc) = &self.arc_data {
            o.insert("arcData".into(), json!(arc));
        }
        if let Some(pc) = self.point_count {
            o.insert("pointCount".into(), json!(pc));
        }
        put_num(&mut o, "innerRadius", self.inner_radius);
        if let Some(op) = self.boolean_operation {
            o.insert("booleanOperation".into(), op.as_token().into());
        }
        if !self.vector_paths.is_empty() {
            o.insert(
                "vectorPaths".into(),
                Value::Array(
                    self.vector_paths
                        .iter()
                        .map(|p| {
                            json!({ "windingRule": p.winding_rule.as_token(), "data": p.data })
                        })
                        .collect(),
                ),
            );
        }
        if let Some(icon) = &self.icon {
            o.insert("icon".into(), icon.clone().into());
        }
        if !self.children.is_empty() {
            o.insert(
                "children".into(),
                Value::Array(self.children.iter().map(DesignNode::to_value).collect()),
            );
        }
        Value::Object(o)
    }
}

impl Serialize for DesignNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DesignNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        DesignNode::from_value(&v)
            .ok_or_else(|| serde::de::Error::custom("design node must be a JSON object"))
    }
}

/// Kind-derived name for unnamed nodes so exported JSON always carries
/// `name`.
pub fn default_name(ty: NodeType) -> String {
    let base = match ty {
        NodeType::Frame => "frame",
        NodeType::Group => "group",
        NodeType::Rectangle => "rectangle",
        NodeType::Text => "text",
        NodeType::Ellipse => "ellipse",
        NodeType::Vector => "vector",
        NodeType::Instance => "instance",
        NodeType::Component => "component",
        NodeType::Line => "line",
        NodeType::Polygon => "polygon",
        NodeType::Star => "star",
        NodeType::BooleanOperation => "boolean",
    };
    base.to_owned()
}

// ─── Decode helpers ──────────────────────────────────────────────────────

fn put_num(o: &mut Map<String, Value>, key: &str, v: Option<f32>) {
    if let Some(n) = v {
        o.insert(key.into(), json!(n));
    }
}

fn decode_text(obj: &Map<String, Value>) -> Option<TextStyle> {
    let num = |k: &str| obj.get(k).and_then(f32_of);
    let s = |k: &str| obj.get(k).and_then(Value::as_str);
    let font = obj.get("fontName").and_then(Value::as_object);
    let text = TextStyle {
        characters: s("characters").map(str::to_owned),
        font_family: font
            .and_then(|f| f.get("family"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        font_style: font
            .and_then(|f| f.get("style"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        font_size: num("fontSize"),
        align_h: s("textAlignHorizontal").and_then(TextAlignH::from_token),
        align_v: s("textAlignVertical").and_then(TextAlignV::from_token),
        line_height: num("lineHeight"),
        letter_spacing: num("letterSpacing"),
        case: s("textCase").and_then(TextCase::from_token),
        decoration: s("textDecoration").and_then(TextDecoration::from_token),
        auto_resize: s("textAutoResize").and_then(TextAutoResize::from_token),
    };
    if text == TextStyle::default() {
        None
    } else {
        Some(text)
    }
}

fn encode_text(o: &mut Map<String, Value>, text: &TextStyle) {
    if let Some(c) = &text.characters {
        o.insert("characters".into(), c.clone().into());
    }
    if text.font_family.is_some() || text.font_style.is_some() {
        o.insert(
            "fontName".into(),
            json!({
                "family": text.font_family.as_deref().unwrap_or("Inter"),
                "style": text.font_style.as_deref().unwrap_or("Regular"),
            }),
        );
    }
    put_num(o, "fontSize", text.font_size);
    if let Some(a) = text.align_h {
        o.insert("textAlignHorizontal".into(), a.as_token().into());
    }
    if let Some(a) = text.align_v {
        o.insert("textAlignVertical".into(), a.as_token().into());
    }
    put_num(o, "lineHeight", text.line_height);
    put_num(o, "letterSpacing", text.letter_spacing);
    if let Some(c) = text.case {
        o.insert("textCase".into(), c.as_token().into());
    }
    if let Some(d) = text.decoration {
        o.insert("textDecoration".into(), d.as_token().into());
    }
    if let Some(r) = text.auto_resize {
        o.insert("textAutoResize".into(), r.as_token().into());
    }
}

fn decode_layout(obj: &Map<String, Value>) -> Option<AutoLayout> {
    let mode = obj
        .get("layoutMode")
        .and_then(Value::as_str)
        .and_then(LayoutMode::from_token)?;
    if mode == LayoutMode::None {
        return None;
    }
    let num = |k: &str| obj.get(k).and_then(f32_of);
    let s = |k: &str| obj.get(k).and_then(Value::as_str);
    Some(AutoLayout {
        mode,
        primary_align: s("primaryAxisAlignItems").and_then(AxisAlign::from_token),
        counter_align: s("counterAxisAlignItems").and_then(AxisAlign::from_token),
        primary_sizing: s("primaryAxisSizingMode").and_then(AxisSizing::from_token),
        counter_sizing: s("counterAxisSizingMode").and_then(AxisSizing::from_token),
        item_spacing: num("itemSpacing"),
        padding: [
            num("paddingLeft").unwrap_or(0.0),
            num("paddingRight").unwrap_or(0.0),
            num("paddingTop").unwrap_or(0.0),
            num("paddingBottom").unwrap_or(0.0),
        ],
        wrap: s("layoutWrap").is_some_and(|w| w.eq_ignore_ascii_case("WRAP")),
    })
}

fn encode_layout(o: &mut Map<String, Value>, layout: &AutoLayout) {
    o.insert("layoutMode".into(), layout.mode.as_token().into());
    if let Some(a) = layout.primary_align {
        o.insert("primaryAxisAlignItems".into(), a.as_token().into());
    }
    if let Some(a) = layout.counter_align {
        o.insert("counterAxisAlignItems".into(), a.as_token().into());
    }
    if let Some(sz) = layout.primary_sizing {
        o.insert("primaryAxisSizingMode".into(), sz.as_token().into());
    }
    if let Some(sz) = layout.counter_sizing {
        o.insert("counterAxisSizingMode".into(), sz.as_token().into());
    }
    put_num(o, "itemSpacing", layout.item_spacing);
    let [l, r, t, b] = layout.padding;
    for (key, pad) in [
        ("paddingLeft", l),
        ("paddingRight", r),
        ("paddingTop", t),
        ("paddingBottom", b),
    ] {
        if pad != 0.0 {
            o.insert(key.into(), json!(pad));
        }
    }
    if layout.wrap {
        o.insert("layoutWrap".into(), "WRAP".into());
    }
}

fn decode_corner_radius(obj: &Map<String, Value>) -> Option<CornerRadius> {
    let num = |k: &str| obj.get(k).and_then(f32_of);
    let corners = [
        num("topLeftRadius"),
        num("topRightRadius"),
        num("bottomRightRadius"),
        num("bottomLeftRadius"),
    ];
    if corners.iter().any(Option::is_some) {
        return Some(CornerRadius::PerCorner(corners.map(|c| c.unwrap_or(0.0))));
    }
    num("cornerRadius").map(CornerRadius::Uniform)
}

fn vector_path_from_value(v: &Value) -> Option<VectorPath> {
    let obj = v.as_object()?;
    let data = obj.get("data")?.as_str()?.to_owned();
    let winding_rule = obj
        .get("windingRule")
        .and_then(Value::as_str)
        .and_then(WindingRule::from_token)
        .unwrap_or(WindingRule::Nonzero);
    Some(VectorPath { winding_rule, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_normalizer_is_total() {
        assert_eq!(NodeType::normalize("frame"), NodeType::Frame);
        assert_eq!(NodeType::normalize("ELLIPSE"), NodeType::Ellipse);
        assert_eq!(NodeType::normalize("Boolean_Operation"), NodeType::BooleanOperation);
        assert_eq!(NodeType::normalize(""), NodeType::Frame);
        assert_eq!(NodeType::normalize("blob"), NodeType::Frame);
        assert_eq!(NodeType::normalize("  text "), NodeType::Text);
    }

    #[test]
    fn unknown_type_degrades_by_shape() {
        let leaf = DesignNode::from_value(&json!({
            "name": "weird", "type": "SPARKLE", "x": 0, "y": 0
        }))
        .unwrap();
        assert_eq!(leaf.ty, NodeType::Rectangle);

        let container = DesignNode::from_value(&json!({
            "name": "weird", "type": "SPARKLE", "x": 0, "y": 0,
            "children": [{ "name": "kid", "type": "TEXT", "x": 0, "y": 0 }]
        }))
        .unwrap();
        assert_eq!(container.ty, NodeType::Frame);
        assert_eq!(container.children.len(), 1);
    }

    #[test]
    fn color_clamps_out_of_range_channels() {
        let c = Color::from_value(&json!({ "r": 255, "g": 0, "b": 0 })).unwrap();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 1.0));
        let c = Color::from_value(&json!({ "r": -0.5, "g": 0.5, "b": 1.2, "a": 0.5 })).unwrap();
        assert_eq!(c, Color::rgba(0.0, 0.5, 1.0, 0.5));
    }

    #[test]
    fn color_accepts_hex_strings() {
        let c = Color::from_value(&json!("#FF0000")).unwrap();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(c.to_hex(), "#FF0000");
        assert!(Color::from_value(&json!("#GG0000")).is_none());
    }

    #[test]
    fn unrecognized_fill_subtype_is_dropped_not_defaulted() {
        let fills = fills_from_value(&json!([
            { "type": "SOLID", "color": { "r": 1, "g": 0, "b": 0 } },
            { "type": "VIDEO", "url": "x" },
        ]))
        .unwrap();
        assert_eq!(fills.len(), 1);
        assert!(matches!(fills[0], Fill::Solid { .. }));
    }

    #[test]
    fn unrecognized_effect_subtype_is_dropped() {
        assert!(Effect::from_value(&json!({ "type": "NOISE", "radius": 4 })).is_none());
        assert!(
            Effect::from_value(&json!({ "type": "layer_blur", "radius": 4 }))
                .is_some()
        );
    }

    #[test]
    fn gradient_fill_round_trips() {
        let v = json!({
            "type": "GRADIENT_LINEAR",
            "gradientStops": [
                { "position": 0.0, "color": { "r": 1, "g": 0, "b": 0 } },
                { "position": 1.0, "color": "#0000FF" },
            ],
            "gradientTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        });
        let fill = Fill::from_value(&v).unwrap();
        let back = Fill::from_value(&fill.to_value()).unwrap();
        assert_eq!(fill, back);
    }

    #[test]
    fn layout_mode_none_yields_no_layout_group() {
        let node = DesignNode::from_value(&json!({
            "name": "f", "type": "FRAME", "x": 0, "y": 0, "layoutMode": "NONE"
        }))
        .unwrap();
        assert!(node.layout.is_none());
    }

    #[test]
    fn wire_encode_omits_absent_fields() {
        let node = DesignNode::new("box", NodeType::Rectangle, 10.0, 20.0);
        let v = node.to_value();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 4); // name, type, x, y only
        assert!(!obj.contains_key("children"));
        assert!(!obj.contains_key("opacity"));
    }

    #[test]
    fn icon_marker_detection() {
        let mut n = DesignNode::new("Icon: Home", NodeType::Frame, 0.0, 0.0);
        assert!(n.wants_icon_synthesis());
        n.name = "plain".into();
        assert!(!n.wants_icon_synthesis());
        n.icon = Some("cart".into());
        assert!(n.wants_icon_synthesis());
    }
}
