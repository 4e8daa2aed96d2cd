//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// SurfaceId
// ============================================================================

/// Process-wide counter for surface identifiers. Zero is never issued.
static NEXT_SURFACE_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies one content surface and the editor control that owns it.
///
/// Native callbacks carry a `SurfaceId` instead of a reference to the
/// control, and resolve it through the
/// [`ControlRegistry`](crate::bridge::ControlRegistry) on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u32);

impl SurfaceId {
    /// Allocates a new unique identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an identifier from a raw value.
    #[inline]
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
