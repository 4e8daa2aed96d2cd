//! Error types for the editor bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use wordform_bridge::{EditorControl, Result};
//!
//! async fn example(editor: &EditorControl) -> Result<()> {
//!     editor.open_docx_file("report.docx").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Policy |
//! |----------|----------|--------|
//! | Caller input | [`Error::FileNotFound`], [`Error::Config`] | Returned to caller |
//! | Readiness | [`Error::WebViewNotReady`] | Returned to caller |
//! | Boundary | [`Error::ScriptEvaluation`], [`Error::Base64Decode`] | Reported as notification |
//! | Lifecycle | [`Error::SurfaceClosed`], [`Error::ChannelClosed`] | Returned to caller |
//! | External | [`Error::Io`] | Depends on call site |
//!
//! A dismissed save dialog is not an error and has no variant here.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// Requested source document does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Configuration error.
    ///
    /// Returned when the editor control is built with missing or invalid
    /// settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Readiness Errors
    // ========================================================================
    /// Content surface did not finish its initial load in time.
    #[error("WebView is not ready after {attempts} attempts ({waited_ms}ms)")]
    WebViewNotReady {
        /// Poll attempts performed.
        attempts: u32,
        /// Milliseconds spent polling.
        waited_ms: u64,
    },

    // ========================================================================
    // Boundary Errors
    // ========================================================================
    /// Script inside the content surface threw or returned an unexpected shape.
    #[error("Script evaluation failed for `{script}`: {message}")]
    ScriptEvaluation {
        /// Script entry point that was evaluated.
        script: String,
        /// Description of the failure.
        message: String,
    },

    /// Payload returned by the content surface is not valid base64.
    #[error("Base64 decode failed ({context}): {message}")]
    Base64Decode {
        /// What was being decoded.
        context: String,
        /// Decoder error message.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The owner loop of the content surface has shut down.
    #[error("Content surface closed")]
    SurfaceClosed,

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a file not found error.
    #[inline]
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a readiness timeout error.
    #[inline]
    pub fn web_view_not_ready(attempts: u32, waited_ms: u64) -> Self {
        Self::WebViewNotReady {
            attempts,
            waited_ms,
        }
    }

    /// Creates a script evaluation error.
    #[inline]
    pub fn script_evaluation(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptEvaluation {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Creates a base64 decode error.
    #[inline]
    pub fn base64_decode(context: impl Into<String>, err: base64::DecodeError) -> Self {
        Self::Base64Decode {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a readiness timeout.
    #[inline]
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::WebViewNotReady { .. })
    }

    /// Returns `true` if the error originated from data crossing the
    /// host/content boundary.
    ///
    /// These are caught by the orchestration layer and reported as
    /// notifications instead of propagating past the public API.
    #[inline]
    #[must_use]
    pub fn is_boundary_error(&self) -> bool {
        matches!(self, Self::ScriptEvaluation { .. } | Self::Base64Decode { .. })
    }

    /// Returns `true` if the owning control or its surface went away.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::SurfaceClosed | Self::ChannelClosed(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as Base64Standard;

    #[test]
    fn test_error_display() {
        let err = Error::file_not_found("/tmp/missing.docx");
        assert_eq!(err.to_string(), "File not found: /tmp/missing.docx");
    }

    #[test]
    fn test_not_ready_display() {
        let err = Error::web_view_not_ready(50, 5000);
        assert_eq!(
            err.to_string(),
            "WebView is not ready after 50 attempts (5000ms)"
        );
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_is_boundary_error() {
        let script_err = Error::script_evaluation("exportDocx()", "threw");
        let decode_err = Error::base64_decode(
            "exportDocx()",
            Base64Standard.decode("@@@").unwrap_err(),
        );
        let config_err = Error::config("missing surface");

        assert!(script_err.is_boundary_error());
        assert!(decode_err.is_boundary_error());
        assert!(!config_err.is_boundary_error());
        assert!(!Error::Io(IoError::other("disk full")).is_boundary_error());
    }

    #[test]
    fn test_is_closed() {
        assert!(Error::SurfaceClosed.is_closed());
        assert!(!Error::config("x").is_closed());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
