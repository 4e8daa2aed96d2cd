//! Editor control configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use wordform_bridge::EditorOptions;
//!
//! let options = EditorOptions::new()
//!     .with_poll_interval(Duration::from_millis(50))
//!     .with_poll_attempts(100)
//!     .with_cache_dir("/tmp/wordform");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::surface::PollPolicy;
use crate::surface::readiness::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

// ============================================================================
// Constants
// ============================================================================

/// Subdirectory of the platform cache directory used for fallback saves.
const CACHE_SUBDIR: &str = "wordform";

/// Suggested base name for saved documents.
pub const DEFAULT_DOCUMENT_NAME: &str = "document";

/// Suggested base name for saved images.
pub const DEFAULT_IMAGE_NAME: &str = "image";

// ============================================================================
// EditorOptions
// ============================================================================

/// Editor control configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Delay between readiness checks.
    pub poll_interval: Duration,

    /// Maximum readiness checks before failing with `WebViewNotReady`.
    pub poll_attempts: u32,

    /// Directory for saves without a picker. `None` uses the platform cache.
    pub cache_dir: Option<PathBuf>,

    /// Suppress the page's own context menu (except on images).
    pub disable_context_menu: bool,

    /// Suggested base name for documents.
    pub document_name: String,

    /// Suggested base name for images.
    pub image_name: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl EditorOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            cache_dir: None,
            disable_context_menu: cfg!(target_os = "macos"),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl EditorOptions {
    /// Sets the delay between readiness checks.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum number of readiness checks.
    #[inline]
    #[must_use]
    pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_attempts = attempts;
        self
    }

    /// Sets the directory used for saves without a picker.
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Enables or disables page context menu suppression.
    #[inline]
    #[must_use]
    pub fn with_context_menu_disabled(mut self, disabled: bool) -> Self {
        self.disable_context_menu = disabled;
        self
    }

    /// Sets the suggested base name for documents.
    #[inline]
    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// Sets the suggested base name for images.
    #[inline]
    #[must_use]
    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = name.into();
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl EditorOptions {
    /// Readiness polling schedule.
    #[inline]
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_attempts: self.poll_attempts,
        }
    }

    /// Resolves the fallback save directory.
    ///
    /// Uses the configured directory, else `<platform cache>/wordform`,
    /// else `<temp>/wordform`.
    #[must_use]
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CACHE_SUBDIR)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EditorOptions::new();
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.poll_attempts, 50);
        assert_eq!(options.document_name, "document");
        assert_eq!(options.image_name, "image");
        assert_eq!(options, EditorOptions::default());
    }

    #[test]
    fn test_builder_methods() {
        let options = EditorOptions::new()
            .with_poll_interval(Duration::from_millis(10))
            .with_poll_attempts(3)
            .with_cache_dir("/tmp/wf")
            .with_context_menu_disabled(true)
            .with_document_name("report");

        let policy = options.poll_policy();
        assert_eq!(policy.interval, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(options.resolved_cache_dir(), PathBuf::from("/tmp/wf"));
        assert!(options.disable_context_menu);
        assert_eq!(options.document_name, "report");
    }

    #[test]
    fn test_default_cache_dir_is_namespaced() {
        let dir = EditorOptions::new().resolved_cache_dir();
        assert!(dir.ends_with(CACHE_SUBDIR));
    }
}
