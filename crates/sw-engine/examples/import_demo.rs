//! End-to-end demo: a raw AI chat response goes onto an in-memory
//! canvas and comes back out as clean design JSON.
//!
//! Run with `cargo run --example import_demo [response.txt]`.
//! With no argument a built-in sample response is used.

use std::env;
use std::fs;
use std::process::ExitCode;

use sw_engine::icon::{IconSynthesizer, NullIconProvider};
use sw_engine::memory::MemoryCanvas;
use sw_engine::usecase::{export_to_json, import_from_response};
use sw_engine::ExportScope;

const SAMPLE_RESPONSE: &str = r#"
Here's a simple login card for you:

```json
[{
    "name": "Login Card",
    "type": "FRAME",
    "x": 0, "y": 0,
    "width": 360, "height": 240,
    "cornerRadius": 12,
    "fills": [{"type": "SOLID", "color": {"r": 1, "g": 1, "b": 1}}],
    "layoutMode": "VERTICAL",
    "itemSpacing": 16,
    "paddingLeft": 24, "paddingRight": 24, "paddingTop": 24, "paddingBottom": 24,
    "children": [
        {"name": "icon:user", "type": "VECTOR", "x": 24, "y": 24,
         "width": 24, "height": 24},
        {"name": "Title", "type": "TEXT", "x": 24, "y": 56,
         "characters": "Welcome back", "fontSize": 20,
         "fontName": {"family": "Inter", "style": "Bold"}},
        {"name": "Sign in", "type": "RECTANGLE", "x": 24, "y": 180,
         "width": 312, "height": 40, "cornerRadius": 8,
         "fills": [{"type": "SOLID", "color": {"r": 0.2, "g": 0.4, "b": 1}}]}
    ]
}]
```

Let me know if you'd like any adjustments!
"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let response = match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("cannot read {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => SAMPLE_RESPONSE.to_owned(),
    };

    let mut canvas = MemoryCanvas::new();
    let mut icons = IconSynthesizer::new(NullIconProvider);

    let summary = match import_from_response(&response, &mut canvas, &mut icons).await {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("import failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", summary.notification());
    for diag in &summary.diagnostics {
        println!("  {diag}");
    }

    match export_to_json(&canvas, ExportScope::All) {
        Ok(json) => {
            println!("\nRe-exported document:");
            println!("{}", serde_json::to_string_pretty(&json).expect("pretty-print failed"));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            ExitCode::FAILURE
        }
    }
}
