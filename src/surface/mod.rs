//! Content surface facade and readiness gate.
//!
//! The rest of the crate needs exactly two things from the embedded
//! renderer: replace its content with HTML, and evaluate a script for a
//! string result. Notifications (navigation completed, inbound messages)
//! flow the other way through a [`SurfaceLink`](crate::bridge::SurfaceLink).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `readiness` | `NotReady`/`Ready` state machine and bounded polling |

// ============================================================================
// Submodules
// ============================================================================

/// Readiness state machine.
pub mod readiness;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use readiness::{PollPolicy, Readiness, ReadinessState};

// ============================================================================
// ContentSurface
// ============================================================================

/// Operations provided by one embedded renderer instance.
///
/// Implementations wrap a platform web view. Calls may come from any task;
/// implementations marshal onto the renderer's own thread as needed.
///
/// `evaluate_script` is only called once the surface reported readiness.
/// Checking readiness is the caller's job, not the facade's.
#[async_trait]
pub trait ContentSurface: Send + Sync {
    /// Replaces the surface content with `html`.
    ///
    /// Completion of the resulting navigation is reported separately through
    /// [`SurfaceLink::navigated`](crate::bridge::SurfaceLink::navigated).
    async fn load_html(&self, html: &str) -> Result<()>;

    /// Runs `script` inside the surface and returns its serialized result.
    ///
    /// A script that fails inside the surface may either return an empty
    /// string (the engine's "undefined") or an error.
    async fn evaluate_script(&self, script: &str) -> Result<String>;
}
