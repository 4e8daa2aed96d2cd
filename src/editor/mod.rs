//! Editor control and document orchestration.
//!
//! Sequences readiness, script evaluation, decoding and persistence for
//! each host operation, and raises notifications for the outcome.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `assets` | Editor page assembly |
//! | `builder` | `EditorControlBuilder` |
//! | `control` | `EditorControl` and its owner loop |
//! | `events` | `EditorEvent` notifications |
//! | `options` | `EditorOptions` |
//! | `persist` | Save targets and atomic writes |

// ============================================================================
// Submodules
// ============================================================================

/// Editor page assembly.
pub mod assets;

/// Editor control builder.
pub mod builder;

/// Editor control and owner loop.
pub mod control;

/// Host notifications.
pub mod events;

/// Editor control configuration.
pub mod options;

/// Save targets and atomic writes.
pub mod persist;

// ============================================================================
// Re-exports
// ============================================================================

pub use assets::{EditorAssets, build_editor_html};
pub use builder::EditorControlBuilder;
pub use control::EditorControl;
pub use events::EditorEvent;
pub use options::EditorOptions;
pub use persist::{SavePicker, SaveRequest};
