//! Builder pattern for editor control configuration.
//!
//! The surface ID is allocated when the builder is created, so the native
//! side can be handed its [`SurfaceLink`] before the control exists.
//!
//! # Example
//!
//! ```ignore
//! use wordform_bridge::{EditorAssets, EditorControl};
//!
//! # async fn example() -> wordform_bridge::Result<()> {
//! let builder = EditorControl::builder();
//! let web_view = MyWebView::new(builder.link());
//!
//! let editor = builder
//!     .surface(web_view)
//!     .assets(EditorAssets::from_dir("./wwwroot")?)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::bridge::{ControlRegistry, SurfaceLink};
use crate::error::{Error, Result};
use crate::identifiers::SurfaceId;
use crate::surface::ContentSurface;

use super::assets::{EditorAssets, build_editor_html};
use super::control::EditorControl;
use super::options::EditorOptions;
use super::persist::SavePicker;

// ============================================================================
// EditorControlBuilder
// ============================================================================

/// Builder for configuring an [`EditorControl`].
///
/// Use [`EditorControl::builder()`] to create a new builder.
pub struct EditorControlBuilder {
    /// Identity of the control being built.
    surface_id: SurfaceId,
    /// Registry the control will be published in.
    registry: Arc<ControlRegistry>,
    /// Content surface.
    surface: Option<Arc<dyn ContentSurface>>,
    /// Native save dialog.
    picker: Option<Arc<dyn SavePicker>>,
    /// Page libraries.
    assets: Option<EditorAssets>,
    /// Control options.
    options: EditorOptions,
}

impl fmt::Debug for EditorControlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorControlBuilder")
            .field("surface_id", &self.surface_id)
            .field("surface", &self.surface.is_some())
            .field("picker", &self.picker.is_some())
            .field("assets", &self.assets.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for EditorControlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// EditorControlBuilder Implementation
// ============================================================================

impl EditorControlBuilder {
    /// Creates a builder with a fresh surface ID and its own registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surface_id: SurfaceId::generate(),
            registry: ControlRegistry::new(),
            surface: None,
            picker: None,
            assets: None,
            options: EditorOptions::default(),
        }
    }

    /// Returns the surface ID the control will be registered under.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the link native code should use for this control.
    ///
    /// Events sent through it before [`build`](Self::build) are dropped.
    #[must_use]
    pub fn link(&self) -> SurfaceLink {
        SurfaceLink::new(self.surface_id, Arc::clone(&self.registry))
    }

    /// Publishes the control in a shared registry.
    ///
    /// Links obtained earlier point at the previous registry; call this
    /// before [`link`](Self::link).
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: Arc<ControlRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the content surface.
    #[inline]
    #[must_use]
    pub fn surface(mut self, surface: Arc<dyn ContentSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Sets the native save dialog used by the `save_*_with_picker` calls
    /// and image saves.
    ///
    /// Without one, saves go to the cache directory.
    #[inline]
    #[must_use]
    pub fn picker(mut self, picker: Arc<dyn SavePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Sets the editor page libraries.
    #[inline]
    #[must_use]
    pub fn assets(mut self, assets: EditorAssets) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Sets the control options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the control and starts loading the editor page.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the surface or assets are not set
    /// - [`Error::Config`] if a required asset is empty
    /// - [`Error::Config`] if called outside a Tokio runtime
    pub fn build(self) -> Result<EditorControl> {
        let surface = self.surface.ok_or_else(|| {
            Error::config(
                "Content surface is required. Use .surface() to set it.\n\
                 Example: EditorControl::builder().surface(web_view)",
            )
        })?;

        let assets = self.assets.ok_or_else(|| {
            Error::config(
                "Editor assets are required. Use .assets() to set them.\n\
                 Example: EditorControl::builder().assets(EditorAssets::from_dir(\"./wwwroot\")?)",
            )
        })?;

        let page = build_editor_html(&assets, self.options.disable_context_menu)?;

        if Handle::try_current().is_err() {
            return Err(Error::config(
                "EditorControl must be built inside a Tokio runtime",
            ));
        }

        Ok(EditorControl::start(
            self.surface_id,
            self.registry,
            surface,
            self.picker,
            self.options,
            page,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::FakeSurface;

    fn assets() -> EditorAssets {
        EditorAssets::new("css", "quill", "mammoth", "html-docx")
    }

    #[test]
    fn test_new_builder_is_empty() {
        let builder = EditorControlBuilder::new();
        assert!(builder.surface.is_none());
        assert!(builder.picker.is_none());
        assert!(builder.assets.is_none());
        assert_eq!(builder.options, EditorOptions::default());
    }

    #[test]
    fn test_builders_get_distinct_ids() {
        let a = EditorControlBuilder::new();
        let b = EditorControlBuilder::new();
        assert_ne!(a.surface_id(), b.surface_id());
        assert_eq!(a.link().surface_id(), a.surface_id());
    }

    #[tokio::test]
    async fn test_missing_surface() {
        let err = EditorControlBuilder::new()
            .assets(assets())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("surface")));
    }

    #[tokio::test]
    async fn test_missing_assets() {
        let builder = EditorControlBuilder::new();
        let surface = FakeSurface::new(builder.link());
        let err = builder.surface(surface).build().unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("assets")));
    }

    #[tokio::test]
    async fn test_empty_required_asset() {
        let builder = EditorControlBuilder::new();
        let surface = FakeSurface::new(builder.link());
        let err = builder
            .surface(surface)
            .assets(EditorAssets::new("css", "", "mammoth", "html-docx"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_outside_runtime() {
        let builder = EditorControlBuilder::new();
        let surface = FakeSurface::new(builder.link());
        let err = builder.surface(surface).assets(assets()).build().unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("runtime")));
    }

    #[tokio::test]
    async fn test_shared_registry() {
        let registry = ControlRegistry::new();
        let builder = EditorControlBuilder::new().registry(Arc::clone(&registry));
        let surface = FakeSurface::new(builder.link());
        let editor = builder.surface(surface).assets(assets()).build().expect("build");

        assert!(registry.contains(editor.surface_id()));
    }
}
