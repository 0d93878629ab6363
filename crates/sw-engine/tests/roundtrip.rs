//! Integration tests: import → export → re-import round-trip.
//!
//! Verifies that a design document survives a full trip through the
//! canvas without drift: the second export must equal the first, and
//! fields left at their defaults must never reappear on the wire.

use pretty_assertions::assert_eq;

use sw_engine::icon::{IconSynthesizer, NullIconProvider};
use sw_engine::memory::MemoryCanvas;
use sw_engine::model::{DesignNode, Fill, ImageScaleMode, NodeType};
use sw_engine::usecase::{ImportSummary, export_nodes, import_from_response};
use sw_engine::ExportScope;

// ─── Helpers ─────────────────────────────────────────────────────────────

async fn import_into(canvas: &mut MemoryCanvas, text: &str) -> ImportSummary {
    let mut icons = IconSynthesizer::new(NullIconProvider);
    import_from_response(text, canvas, &mut icons)
        .await
        .expect("import failed")
}

async fn export_all(canvas: &MemoryCanvas) -> Vec<DesignNode> {
    let (nodes, _) = export_nodes(canvas, ExportScope::All).expect("export failed");
    nodes
}

/// Import, export, re-import the exported JSON into a fresh canvas, and
/// require the second export to equal the first.
async fn assert_stable_roundtrip(text: &str) -> Vec<DesignNode> {
    let mut canvas1 = MemoryCanvas::new();
    import_into(&mut canvas1, text).await;
    let first = export_all(&canvas1).await;

    let emitted = serde_json::to_string(&first).expect("serialize failed");
    let mut canvas2 = MemoryCanvas::new();
    import_into(&mut canvas2, &emitted).await;
    let second = export_all(&canvas2).await;

    assert_eq!(first, second, "round-trip drifted.\nEmitted:\n{emitted}");
    first
}

// ─── Structure ───────────────────────────────────────────────────────────

#[tokio::test]
async fn frame_tree_roundtrip_is_stable() {
    let nodes = assert_stable_roundtrip(
        r#"[{
            "name": "Card", "type": "FRAME", "x": 0, "y": 0,
            "width": 320, "height": 200, "cornerRadius": 8,
            "fills": [{"type": "SOLID", "color": {"r": 1, "g": 1, "b": 1}}],
            "layoutMode": "VERTICAL", "itemSpacing": 12,
            "paddingLeft": 16, "paddingRight": 16, "paddingTop": 16, "paddingBottom": 16,
            "children": [
                {"name": "Title", "type": "TEXT", "x": 16, "y": 16,
                 "characters": "Hello", "fontSize": 18},
                {"name": "Body", "type": "RECTANGLE", "x": 16, "y": 48,
                 "width": 288, "height": 120,
                 "fills": [{"type": "SOLID", "color": {"r": 0.9, "g": 0.9, "b": 0.95}}]}
            ]
        }]"#,
    )
    .await;

    assert_eq!(nodes.len(), 1);
    let card = &nodes[0];
    assert_eq!(card.ty, NodeType::Frame);
    assert_eq!(card.children.len(), 2);
    assert_eq!(card.children[0].ty, NodeType::Text);
    assert_eq!(card.layout.as_ref().unwrap().item_spacing, Some(12.0));
}

#[tokio::test]
async fn unknown_type_with_children_becomes_frame() {
    let mut canvas = MemoryCanvas::new();
    import_into(
        &mut canvas,
        r#"[{"name": "Mystery", "type": "HOLOGRAM", "x": 0, "y": 0,
             "children": [{"name": "Inner", "type": "RECTANGLE", "x": 0, "y": 0}]}]"#,
    )
    .await;
    let nodes = export_all(&canvas).await;
    assert_eq!(nodes[0].ty, NodeType::Frame);
    assert_eq!(nodes[0].children.len(), 1);
}

#[tokio::test]
async fn single_child_boolean_operation_degrades_to_frame() {
    let mut canvas = MemoryCanvas::new();
    let summary = import_into(
        &mut canvas,
        r#"[{"name": "Combined", "type": "BOOLEAN_OPERATION", "x": 0, "y": 0,
             "booleanOperation": "SUBTRACT",
             "children": [{"name": "Only", "type": "RECTANGLE", "x": 0, "y": 0,
                           "width": 10, "height": 10}]}]"#,
    )
    .await;
    assert!(!summary.diagnostics.is_empty());
    let nodes = export_all(&canvas).await;
    assert_eq!(nodes[0].ty, NodeType::Frame);
    assert_eq!(nodes[0].children.len(), 1);
}

#[tokio::test]
async fn double_import_is_idempotent() {
    let text = r#"[{"name": "A", "type": "RECTANGLE", "x": 0, "y": 0,
                    "width": 10, "height": 10}]"#;
    let mut canvas = MemoryCanvas::new();
    import_into(&mut canvas, text).await;
    import_into(&mut canvas, text).await;
    let nodes = export_all(&canvas).await;
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], nodes[1]);
}

// ─── Value normalization ─────────────────────────────────────────────────

#[tokio::test]
async fn defaults_never_reappear_after_roundtrip() {
    let nodes = assert_stable_roundtrip(
        r#"[{"name": "Plain", "type": "RECTANGLE", "x": 5, "y": 5,
             "width": 10, "height": 10,
             "opacity": 1.0, "visible": true, "locked": false,
             "rotation": 0, "blendMode": "NORMAL"}]"#,
    )
    .await;
    let n = &nodes[0];
    assert_eq!(n.opacity, None);
    assert_eq!(n.visible, None);
    assert_eq!(n.locked, None);
    assert_eq!(n.rotation, None);
    assert_eq!(n.blend_mode, None);
}

#[tokio::test]
async fn out_of_range_opacity_is_clamped() {
    let mut canvas = MemoryCanvas::new();
    import_into(
        &mut canvas,
        r#"[{"name": "Over", "type": "RECTANGLE", "x": 0, "y": 0, "opacity": 1.4},
            {"name": "Under", "type": "RECTANGLE", "x": 0, "y": 0, "opacity": -0.2}]"#,
    )
    .await;
    let nodes = export_all(&canvas).await;
    // 1.4 clamps to the default 1.0, which is then omitted.
    assert_eq!(nodes[0].opacity, None);
    assert_eq!(nodes[1].opacity, Some(0.0));
}

#[tokio::test]
async fn text_styling_roundtrip_is_stable() {
    let nodes = assert_stable_roundtrip(
        r#"[{"name": "Label", "type": "TEXT", "x": 0, "y": 0,
             "characters": "Checkout", "fontSize": 14,
             "fontName": {"family": "Roboto", "style": "Bold"},
             "textAlignHorizontal": "CENTER", "letterSpacing": 0.5,
             "textCase": "UPPER",
             "fills": [{"type": "SOLID", "color": {"r": 0.1, "g": 0.1, "b": 0.1}}]}]"#,
    )
    .await;
    let text = nodes[0].text.as_ref().unwrap();
    assert_eq!(text.characters.as_deref(), Some("Checkout"));
    assert_eq!(text.font_family.as_deref(), Some("Roboto"));
    assert_eq!(text.font_size, Some(14.0));
}

#[tokio::test]
async fn line_gets_default_stroke_when_none_given() {
    let mut canvas = MemoryCanvas::new();
    import_into(
        &mut canvas,
        r#"[{"name": "Divider", "type": "LINE", "x": 0, "y": 100, "width": 200}]"#,
    )
    .await;
    let nodes = export_all(&canvas).await;
    let strokes = nodes[0].strokes.as_ref().unwrap();
    assert_eq!(strokes.len(), 1);
    // Default weight is 1.0, so it is omitted on export.
    assert_eq!(nodes[0].stroke_weight, None);
}

#[tokio::test]
async fn explicit_vector_paths_roundtrip_is_stable() {
    let nodes = assert_stable_roundtrip(
        r#"[{"name": "Check", "type": "VECTOR", "x": 0, "y": 0,
             "width": 24, "height": 24,
             "vectorPaths": [{"windingRule": "NONZERO",
                              "data": "M5 13l4 4L19 7"}]}]"#,
    )
    .await;
    assert_eq!(nodes[0].ty, NodeType::Vector);
    assert_eq!(nodes[0].vector_paths.len(), 1);
    assert_eq!(nodes[0].vector_paths[0].data, "M5 13l4 4L19 7");
}

#[tokio::test]
async fn image_fill_exports_by_hash_and_reimports_on_the_same_canvas() {
    let mut canvas = MemoryCanvas::new();
    import_into(
        &mut canvas,
        r#"[{"name": "Photo", "type": "RECTANGLE", "x": 0, "y": 0,
             "width": 100, "height": 100,
             "fills": [{"type": "IMAGE", "imageBytes": "aGVsbG8=", "scaleMode": "FIT"}]}]"#,
    )
    .await;
    let first = export_all(&canvas).await;
    let fills = first[0].fills.as_ref().unwrap();
    match &fills[0] {
        Fill::Image {
            bytes,
            hash,
            scale_mode,
        } => {
            assert_eq!(*bytes, None);
            assert!(hash.is_some());
            assert_eq!(*scale_mode, ImageScaleMode::Fit);
        }
        other => panic!("unexpected fill {other:?}"),
    }

    // The hash-only export resolves against the canvas that owns the image.
    let emitted = serde_json::to_string(&first).expect("serialize failed");
    import_into(&mut canvas, &emitted).await;
    let all = export_all(&canvas).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].fills, all[1].fills);
}

#[tokio::test]
async fn gradient_fill_roundtrip_is_stable() {
    let nodes = assert_stable_roundtrip(
        r#"[{"name": "Hero", "type": "RECTANGLE", "x": 0, "y": 0,
             "width": 400, "height": 300,
             "fills": [{"type": "GRADIENT_LINEAR", "gradientStops": [
                 {"position": 0, "color": {"r": 1, "g": 0, "b": 0}},
                 {"position": 1, "color": {"r": 0, "g": 0, "b": 1}}
             ]}]}]"#,
    )
    .await;
    let fills = nodes[0].fills.as_ref().unwrap();
    assert_eq!(fills.len(), 1);
}
