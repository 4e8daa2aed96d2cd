//! Headless document round trip.
//!
//! Demonstrates:
//! - Building an editor control around an in-memory content surface
//! - Wiring native messages through a script interface adapter
//! - Importing, exporting and saving a document
//! - Receiving notifications
//!
//! Usage:
//!   cargo run --example headless_roundtrip
//!   cargo run --example headless_roundtrip -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;
use wordform_bridge::{
    ContentSurface, EditorAssets, EditorControl, EditorEvent, EditorOptions, JsInterface,
    JsInterfaceBridge, JsInterfaceHost, Result, SurfaceLink,
};

// ============================================================================
// In-memory Surface
// ============================================================================

/// Stands in for a web view: remembers the last imported payload and
/// hands it back on export.
struct MemorySurface {
    link: SurfaceLink,
    document: Mutex<String>,
    interface: Mutex<Option<Arc<dyn JsInterface>>>,
}

impl MemorySurface {
    fn new(link: SurfaceLink) -> Arc<Self> {
        Arc::new(Self {
            link,
            document: Mutex::new(String::new()),
            interface: Mutex::new(None),
        })
    }

    /// Plays the page's image context menu.
    fn click_save_image(&self) {
        let interface = self.interface.lock().clone();
        if let Some(interface) = interface {
            interface.post_message(
                r#"{"type":"saveImage","dataUrl":"data:image/png;base64,aGVsbG8="}"#.to_string(),
            );
        }
    }
}

#[async_trait]
impl ContentSurface for MemorySurface {
    async fn load_html(&self, html: &str) -> Result<()> {
        println!("[Surface] Loaded page ({} bytes)", html.len());
        self.link.navigated();
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<String> {
        if let Some(arg) = script
            .strip_prefix("window.importDocxFromBase64('")
            .and_then(|rest| rest.strip_suffix("')"))
        {
            *self.document.lock() = arg.to_string();
            return Ok("true".to_string());
        }

        if script == "exportDocx()" {
            return Ok(format!("\"{}\"", self.document.lock()));
        }

        Ok(String::new())
    }
}

impl JsInterfaceHost for MemorySurface {
    fn set_javascript_enabled(&self, _enabled: bool) {}

    fn set_dom_storage_enabled(&self, _enabled: bool) {}

    fn set_long_click_blocked(&self, _blocked: bool) {}

    fn remove_javascript_interface(&self, _name: &str) -> Result<()> {
        self.interface.lock().take();
        Ok(())
    }

    fn add_javascript_interface(&self, object: Arc<dyn JsInterface>, _name: &str) {
        *self.interface.lock() = Some(object);
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== Headless Round Trip ===\n");

    let out_dir = tempfile::tempdir()?;

    // ========================================================================
    // Build Control
    // ========================================================================

    let builder = EditorControl::builder();
    let surface = MemorySurface::new(builder.link());
    JsInterfaceBridge::attach(surface.as_ref(), Arc::new(builder.link()), true);

    let editor = builder
        .surface(surface.clone())
        .assets(EditorAssets::new("/* css */", "/* quill */", "/* mammoth */", "/* html-docx */"))
        .options(EditorOptions::new().with_cache_dir(out_dir.path()))
        .build()?;
    let mut events = editor.subscribe();
    println!("[Editor] Built {}", editor.surface_id());

    // ========================================================================
    // Import / Export
    // ========================================================================

    let original = b"PK\x03\x04 pretend this is a docx".to_vec();
    editor.load_docx(&original).await;

    let exported = editor.get_docx().await?.unwrap_or_default();
    println!(
        "[Editor] Round trip {}",
        if exported == original { "matches" } else { "DIFFERS" }
    );

    let path = out_dir.path().join("copy.docx");
    editor.save_docx_to_file(&path).await;
    editor.save_docx_with_picker().await;

    // ========================================================================
    // Push Message
    // ========================================================================

    surface.click_save_image();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    for entry in std::fs::read_dir(out_dir.path())? {
        println!("        {}", entry?.file_name().to_string_lossy());
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    while let Ok(event) = events.try_recv() {
        match event {
            EditorEvent::ErrorOccurred(e) => println!("[Event] Error: {e}"),
            other => println!("[Event] {other:?}"),
        }
    }

    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "wordform_bridge=debug"
    } else {
        "wordform_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
