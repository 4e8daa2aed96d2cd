//! Document exchange protocol.
//!
//! Encoding rules for everything that crosses the host/content boundary.
//!
//! # Directions
//!
//! | Direction | Shape | Module |
//! |-----------|-------|--------|
//! | Host → Surface | `window.importDocxFromBase64('<b64>')` | `script` |
//! | Surface → Host (reply) | JSON-quoted base64 string | `script` |
//! | Surface → Host (push) | `{"type":"saveImage","dataUrl":...}` | `message`, `data_url` |
//!
//! Payloads are opaque bytes; nothing here inspects document contents.

// ============================================================================
// Submodules
// ============================================================================

/// Data URL decoding.
pub mod data_url;

/// Push message types.
pub mod message;

/// Script builders and result unwrapping.
pub mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use data_url::DataUrl;
pub use message::{BridgeMessage, ParsedMessage, parse_push_message};
pub use script::{
    DocumentFormat, decode_document, escape_js, import_script, import_succeeded,
    unwrap_script_result,
};
