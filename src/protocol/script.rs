//! Script call builders and result unwrapping.
//!
//! Outbound payloads are embedded as single-quoted string literals in a call
//! expression. Inbound results arrive as whatever the scripting engine
//! serialized, usually a JSON-quoted string.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// DocumentFormat
// ============================================================================

/// Binary document formats the content surface can convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Office Open XML word processing document.
    Docx,
    /// Rich Text Format.
    Rtf,
}

impl DocumentFormat {
    /// Script function that imports a base64 payload of this format.
    #[must_use]
    pub fn import_function(&self) -> &'static str {
        match self {
            Self::Docx => "importDocxFromBase64",
            Self::Rtf => "importRtfFromBase64",
        }
    }

    /// Script expression that exports the editor content in this format.
    #[must_use]
    pub fn export_script(&self) -> &'static str {
        match self {
            Self::Docx => "exportDocx()",
            Self::Rtf => "exportRtf()",
        }
    }

    /// File extension including the leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => ".docx",
            Self::Rtf => ".rtf",
        }
    }

    /// Human readable label for save dialogs.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Docx => "Word Document",
            Self::Rtf => "Rich Text Format",
        }
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// Escapes a string for use inside a single-quoted script literal.
///
/// Backslash goes first so the later substitutions are not escaped twice.
#[must_use]
pub fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Builds the script that imports `bytes` as a document of `format`.
///
/// # Example
///
/// ```ignore
/// let js = import_script(DocumentFormat::Docx, b"hi");
/// assert_eq!(js, "window.importDocxFromBase64('aGk=')");
/// ```
#[must_use]
pub fn import_script(format: DocumentFormat, bytes: &[u8]) -> String {
    let encoded = Base64Standard.encode(bytes);
    format!(
        "window.{}('{}')",
        format.import_function(),
        escape_js(&encoded)
    )
}

// ============================================================================
// Inbound
// ============================================================================

/// Strips JSON string quoting from a script result.
///
/// Results that are not wrapped in double quotes are returned unchanged,
/// so unwrapping an already unwrapped value is a no-op.
#[must_use]
pub fn unwrap_script_result(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1]
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\\"", "\"")
    } else {
        raw.to_string()
    }
}

/// Returns `true` if an unwrapped result means "nothing produced".
///
/// Engines report a missing value as an empty string or as the literal
/// `null`/`undefined`.
#[must_use]
pub fn is_empty_result(unwrapped: &str) -> bool {
    let trimmed = unwrapped.trim();
    trimmed.is_empty() || trimmed == "null" || trimmed == "undefined"
}

/// Decodes an export result into document bytes.
///
/// Returns `Ok(None)` when the surface produced no document.
///
/// # Errors
///
/// - [`Error::Base64Decode`] if the unwrapped result is not valid base64
pub fn decode_document(format: DocumentFormat, raw: &str) -> Result<Option<Vec<u8>>> {
    let unwrapped = unwrap_script_result(raw);
    if is_empty_result(&unwrapped) {
        trace!(?format, "Export produced no document");
        return Ok(None);
    }

    Base64Standard
        .decode(unwrapped.trim())
        .map(Some)
        .map_err(|e| Error::base64_decode(format.export_script(), e))
}

/// Interprets the result of an import call.
///
/// Only an explicit `false` counts as a failed import; async import
/// functions surface as an opaque promise result.
#[must_use]
pub fn import_succeeded(raw: &str) -> bool {
    unwrap_script_result(raw).trim() != "false"
}

// ============================================================================
// Tests
// ============================================================================
