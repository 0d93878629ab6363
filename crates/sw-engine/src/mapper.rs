//! Pure, stateless codecs between `DesignNode` entity fields and the
//! host-native paint/effect/type representations.
//!
//! The fill codec has two entry points: a synchronous best-effort one
//! (image fills are skipped — resolving them needs I/O) and an async
//! full one that resolves image bytes/hashes through the canvas. The
//! creation engine uses the async one wherever an image fill can occur.
//!
//! Color channels cross this boundary as `[0,1]` floats in both
//! directions; export clamps and never rescales by magnitude.

use crate::canvas::{Canvas, CanvasError, NativeColor, NativeEffect, NativePaint, NativeStop};
use sw_core::model::{Color, Effect, Fill, GradientStop, NodeType, Vec2, clamp_unit};

// ─── Color helpers ───────────────────────────────────────────────────────

fn split_alpha(c: Color) -> (NativeColor, f32) {
    (
        NativeColor {
            r: clamp_unit(c.r),
            g: clamp_unit(c.g),
            b: clamp_unit(c.b),
        },
        clamp_unit(c.a),
    )
}

fn join_alpha(c: NativeColor, alpha: f32) -> Color {
    Color::rgba(clamp_unit(c.r), clamp_unit(c.g), clamp_unit(c.b), clamp_unit(alpha))
}

const IDENTITY_TRANSFORM: [[f32; 3]; 2] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

// ─── Fill codec ──────────────────────────────────────────────────────────

/// Synchronous best-effort fill mapping. Image fills return `None`
/// because resolving them requires an I/O round trip — use
/// [`fill_to_paint_async`] on any path where an image fill is possible.
pub fn fill_to_paint(fill: &Fill) -> Option<NativePaint> {
    match fill {
        Fill::Solid { color } => {
            let (color, opacity) = split_alpha(*color);
            Some(NativePaint::Solid { color, opacity })
        }
        Fill::Gradient {
            kind,
            stops,
            transform,
        } => Some(NativePaint::Gradient {
            kind: *kind,
            stops: stops.iter().map(stop_to_native).collect(),
            transform: transform.unwrap_or(IDENTITY_TRANSFORM),
        }),
        Fill::Image { .. } => None,
    }
}

/// Full fill mapping. Image fills resolve a reusable hash first, then
/// fall back to creating the image from inline bytes.
pub async fn fill_to_paint_async<C: Canvas>(
    canvas: &mut C,
    fill: &Fill,
) -> Result<Option<NativePaint>, CanvasError> {
    if let Fill::Image {
        bytes,
        hash,
        scale_mode,
    } = fill
    {
        let image = match hash.as_deref().and_then(|h| canvas.image_by_hash(h)) {
            Some(existing) => existing,
            None => match bytes {
                Some(b64) => canvas.create_image(b64).await?,
                None => return Ok(None), // hash unknown, no inline bytes
            },
        };
        return Ok(Some(NativePaint::Image {
            image,
            scale_mode: *scale_mode,
        }));
    }
    Ok(fill_to_paint(fill))
}

/// Map a fill list through the async codec, dropping entries that
/// cannot resolve (a failed image fill is dropped, not fatal).
pub async fn fills_to_native<C: Canvas>(canvas: &mut C, fills: &[Fill]) -> Vec<NativePaint> {
    let mut out = Vec::with_capacity(fills.len());
    for fill in fills {
        match fill_to_paint_async(canvas, fill).await {
            Ok(Some(paint)) => out.push(paint),
            Ok(None) => log::debug!("skipped unresolvable fill"),
            Err(e) => log::warn!("dropped image fill: {e}"),
        }
    }
    out
}

/// Export direction. Unknown native paints are dropped, never defaulted
/// to solid black.
pub fn paint_to_fill(paint: &NativePaint) -> Option<Fill> {
    match paint {
        NativePaint::Solid { color, opacity } => Some(Fill::Solid {
            color: join_alpha(*color, *opacity),
        }),
        NativePaint::Gradient {
            kind,
            stops,
            transform,
        } => Some(Fill::Gradient {
            kind: *kind,
            stops: stops.iter().map(stop_from_native).collect(),
            transform: (*transform != IDENTITY_TRANSFORM).then_some(*transform),
        }),
        NativePaint::Image { image, scale_mode } => Some(Fill::Image {
            bytes: None,
            hash: Some(image.0.clone()),
            scale_mode: *scale_mode,
        }),
        NativePaint::Unknown(kind) => {
            log::debug!("dropped unknown native paint kind {kind:?}");
            None
        }
    }
}

fn stop_to_native(stop: &GradientStop) -> NativeStop {
    let (color, alpha) = split_alpha(stop.color);
    NativeStop {
        position: stop.position.clamp(0.0, 1.0),
        color,
        alpha,
    }
}

fn stop_from_native(stop: &NativeStop) -> GradientStop {
    GradientStop {
        position: stop.position.clamp(0.0, 1.0),
        color: join_alpha(stop.color, stop.alpha),
    }
}

// ─── Effect codec ────────────────────────────────────────────────────────

pub fn effect_to_native(effect: &Effect) -> NativeEffect {
    match effect {
        Effect::DropShadow {
            color,
            offset,
            radius,
            spread,
            blend_mode,
        } => {
            let (color, alpha) = split_alpha(*color);
            NativeEffect::DropShadow {
                color,
                alpha,
                offset: (offset.x, offset.y),
                radius: *radius,
                spread: *spread,
                blend_mode: *blend_mode,
            }
        }
        Effect::InnerShadow {
            color,
            offset,
            radius,
            spread,
            blend_mode,
        } => {
            let (color, alpha) = split_alpha(*color);
            NativeEffect::InnerShadow {
                color,
                alpha,
                offset: (offset.x, offset.y),
                radius: *radius,
                spread: *spread,
                blend_mode: *blend_mode,
            }
        }
        Effect::LayerBlur { radius } => NativeEffect::LayerBlur { radius: *radius },
        Effect::BackgroundBlur { radius } => NativeEffect::BackgroundBlur { radius: *radius },
    }
}

/// Export direction. Shadow colors are rounded to 4 decimals so float
/// churn does not dirty round-trips; unknown native effects are dropped.
pub fn native_to_effect(effect: &NativeEffect) -> Option<Effect> {
    match effect {
        NativeEffect::DropShadow {
            color,
            alpha,
            offset,
            radius,
            spread,
            blend_mode,
        } => Some(Effect::DropShadow {
            color: join_alpha(*color, *alpha).rounded(),
            offset: Vec2 {
                x: offset.0,
                y: offset.1,
            },
            radius: *radius,
            spread: *spread,
            blend_mode: *blend_mode,
        }),
        NativeEffect::InnerShadow {
            color,
            alpha,
            offset,
            radius,
            spread,
            blend_mode,
        } => Some(Effect::InnerShadow {
            color: join_alpha(*color, *alpha).rounded(),
            offset: Vec2 {
                x: offset.0,
                y: offset.1,
            },
            radius: *radius,
            spread: *spread,
            blend_mode: *blend_mode,
        }),
        NativeEffect::LayerBlur { radius } => Some(Effect::LayerBlur { radius: *radius }),
        NativeEffect::BackgroundBlur { radius } => {
            Some(Effect::BackgroundBlur { radius: *radius })
        }
        NativeEffect::Unknown(kind) => {
            log::debug!("dropped unknown native effect kind {kind:?}");
            None
        }
    }
}

// ─── Type codec ──────────────────────────────────────────────────────────

/// Map a host-native type string to the closed node-type enum.
/// Case-insensitive; `COMPONENT_SET` folds into `Frame` (the transcoder
/// does not model variant sets). `None` means the native kind is not
/// representable and the exporter skips the node.
pub fn node_type_from_native(kind: &str) -> Option<NodeType> {
    let kind = kind.trim();
    if kind.eq_ignore_ascii_case("COMPONENT_SET") {
        return Some(NodeType::Frame);
    }
    NodeType::from_token(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCanvas;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;
    use sw_core::model::{BlendMode, GradientKind, ImageScaleMode};

    #[test]
    fn solid_fill_round_trips_with_alpha_fold() {
        let fill = Fill::solid(Color::rgba(0.2, 0.4, 0.6, 0.5));
        let paint = fill_to_paint(&fill).unwrap();
        match &paint {
            NativePaint::Solid { color, opacity } => {
                assert_eq!(*opacity, 0.5);
                assert_eq!(color.r, 0.2);
            }
            other => panic!("unexpected paint {other:?}"),
        }
        assert_eq!(paint_to_fill(&paint), Some(fill));
    }

    #[test]
    fn sync_mapper_skips_image_fills() {
        let fill = Fill::Image {
            bytes: Some("aGk=".into()),
            hash: None,
            scale_mode: ImageScaleMode::Fill,
        };
        assert_eq!(fill_to_paint(&fill), None);
    }

    #[test]
    fn gradient_identity_transform_is_omitted_on_export() {
        let fill = Fill::Gradient {
            kind: GradientKind::Linear,
            stops: smallvec![GradientStop {
                position: 0.0,
                color: Color::BLACK,
            }],
            transform: None,
        };
        let paint = fill_to_paint(&fill).unwrap();
        let back = paint_to_fill(&paint).unwrap();
        match back {
            Fill::Gradient { transform, .. } => assert_eq!(transform, None),
            other => panic!("unexpected fill {other:?}"),
        }
    }

    #[test]
    fn unknown_native_paint_is_dropped() {
        assert_eq!(paint_to_fill(&NativePaint::Unknown("VIDEO".into())), None);
    }

    #[test]
    fn shadow_color_is_rounded_on_export() {
        let native = NativeEffect::DropShadow {
            color: NativeColor {
                r: 0.123_456_78,
                g: 0.0,
                b: 0.0,
            },
            alpha: 0.333_333_3,
            offset: (0.0, 2.0),
            radius: 4.0,
            spread: 0.0,
            blend_mode: BlendMode::Normal,
        };
        match native_to_effect(&native).unwrap() {
            Effect::DropShadow { color, .. } => {
                assert_eq!(color.r, 0.1235);
                assert_eq!(color.a, 0.3333);
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn unknown_native_effect_is_dropped() {
        assert_eq!(native_to_effect(&NativeEffect::Unknown("NOISE".into())), None);
    }

    #[test]
    fn native_type_codec_folds_component_set() {
        assert_eq!(node_type_from_native("component_set"), Some(NodeType::Frame));
        assert_eq!(node_type_from_native("STAR"), Some(NodeType::Star));
        assert_eq!(node_type_from_native("SLICE"), None);
    }

    #[tokio::test]
    async fn image_fill_resolves_inline_bytes_through_the_canvas() {
        let mut canvas = MemoryCanvas::new();
        let fill = Fill::Image {
            bytes: Some("aGVsbG8=".into()),
            hash: None,
            scale_mode: ImageScaleMode::Fit,
        };
        let paints = fills_to_native(&mut canvas, &[fill]).await;
        assert_eq!(paints.len(), 1);
        let NativePaint::Image { image, scale_mode } = &paints[0] else {
            panic!("unexpected paint {:?}", paints[0]);
        };
        assert_eq!(*scale_mode, ImageScaleMode::Fit);
        assert_eq!(canvas.image_by_hash(&image.0), Some(image.clone()));

        // Export direction carries the reusable hash, not the bytes.
        match paint_to_fill(&paints[0]) {
            Some(Fill::Image { bytes, hash, .. }) => {
                assert_eq!(bytes, None);
                assert_eq!(hash.as_deref(), Some(image.0.as_str()));
            }
            other => panic!("unexpected fill {other:?}"),
        }
    }

    #[tokio::test]
    async fn image_fill_reuses_a_known_hash_without_bytes() {
        let mut canvas = MemoryCanvas::new();
        let created = canvas.create_image("aGVsbG8=").await.unwrap();
        let fill = Fill::Image {
            bytes: None,
            hash: Some(created.0.clone()),
            scale_mode: ImageScaleMode::Crop,
        };
        let paints = fills_to_native(&mut canvas, &[fill]).await;
        assert_eq!(
            paints,
            vec![NativePaint::Image {
                image: created,
                scale_mode: ImageScaleMode::Crop,
            }]
        );
    }

    #[tokio::test]
    async fn image_fill_with_unknown_hash_and_no_bytes_is_dropped() {
        let mut canvas = MemoryCanvas::new();
        let fill = Fill::Image {
            bytes: None,
            hash: Some("feedbeeffeedbeef".into()),
            scale_mode: ImageScaleMode::Fill,
        };
        assert!(fills_to_native(&mut canvas, &[fill]).await.is_empty());
    }
}
