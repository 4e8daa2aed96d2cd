//! WordForm bridge - Embedded rich-text editor host bridge.
//!
//! This library connects a native host application to a rich-text document
//! editor running inside an embedded web view. The host loads, edits and
//! exports Word-compatible documents without parsing the binary formats
//! itself: conversion runs inside the web view, and documents cross the
//! boundary as base64 text.
//!
//! # Architecture
//!
//! - **Bridge**: three native message mechanisms reduced to one
//!   [`MessageTransport`], resolved to the owning control through a
//!   non-owning [`ControlRegistry`]
//! - **Surface**: the [`ContentSurface`] facade (load HTML, evaluate
//!   script) and the readiness gate
//! - **Protocol**: script call building, result unwrapping, push message
//!   parsing and data URL decoding
//! - **Editor**: the [`EditorControl`] sequencing readiness, evaluation,
//!   decoding and persistence
//!
//! Key design principles:
//!
//! - Each [`EditorControl`] owns: content surface + readiness gate + owner loop
//! - Native callbacks never hold the control, only a [`SurfaceLink`]
//! - All state mutation happens on the owner loop
//! - Readiness waits are bounded (50 x 100 ms by default)
//!
//! # Quick Start
//!
//! ```ignore
//! use wordform_bridge::{EditorAssets, EditorControl, EditorEvent, Result};
//!
//! async fn run(web_view: std::sync::Arc<MyWebView>) -> Result<()> {
//!     let builder = EditorControl::builder();
//!     web_view.attach(builder.link());
//!
//!     let editor = builder
//!         .surface(web_view)
//!         .assets(EditorAssets::from_dir("./wwwroot")?)
//!         .build()?;
//!
//!     let mut events = editor.subscribe();
//!     editor.open_docx_file("report.docx").await?;
//!     editor.save_docx_to_file("copy.docx").await;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Native message adapters, registry, [`SurfaceLink`] |
//! | [`editor`] | [`EditorControl`], options, notifications, persistence |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Payload encoding and message parsing |
//! | [`surface`] | [`ContentSurface`] facade and readiness |

// ============================================================================
// Modules
// ============================================================================

/// Native message adapters and control registry.
///
/// - [`WebMessageBridge`] - request/response script messaging
/// - [`JsInterfaceBridge`] - script-callable interface object
/// - [`ScriptHandlerBridge`] - named user-content handler
pub mod bridge;

/// Editor control and document orchestration.
///
/// Use [`EditorControl::builder()`] to create a configured control.
pub mod editor;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Document exchange protocol.
///
/// Escaping, unwrapping and decoding rules for payloads crossing the
/// host/content boundary.
pub mod protocol;

/// Content surface facade and readiness gate.
pub mod surface;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{
    ControlRegistry, JsInterface, JsInterfaceBridge, JsInterfaceHost, MessageTransport,
    ScriptHandlerBridge, ScriptMessage, ScriptMessageHandler, SurfaceLink, UserContentController,
    WebMessageArgs, WebMessageBridge, WebMessageCore, WebMessageHost,
};

// Editor types
pub use editor::{
    EditorAssets, EditorControl, EditorControlBuilder, EditorEvent, EditorOptions, SavePicker,
    SaveRequest,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::SurfaceId;

// Protocol types
pub use protocol::{DataUrl, DocumentFormat};

// Surface types
pub use surface::{ContentSurface, PollPolicy, Readiness, ReadinessState};
