//! Editor control: owner loop and host API.
//!
//! Each control owns one content surface, one readiness gate and one owner
//! loop task. Native callbacks reach the loop through a [`SurfaceLink`];
//! host calls reach the surface through the methods below.
//!
//! # Operation Results
//!
//! | Operation | Readiness timeout | Boundary failure | Nothing produced |
//! |-----------|-------------------|------------------|------------------|
//! | `open_*_file` | `Err` | `Ok(false)` + event | n/a |
//! | `load_*` | `false` + event | `false` + event | n/a |
//! | `get_*` | `Err` | `Ok(None)` + event | `Ok(None)` |
//! | `save_*` | `false` + event | `false` + event | `false` |
//!
//! A dismissed save dialog returns `false` without an event.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, MutexGuard, broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::bridge::SurfaceLink;
use crate::bridge::registry::{ControlRegistry, Dispatcher, SurfaceEvent};
use crate::error::{Error, Result};
use crate::identifiers::SurfaceId;
use crate::protocol::{
    DataUrl, DocumentFormat, ParsedMessage, decode_document, import_script, import_succeeded,
    parse_push_message,
};
use crate::surface::readiness::ReadinessGate;
use crate::surface::{ContentSurface, Readiness};

use super::builder::EditorControlBuilder;
use super::events::EditorEvent;
use super::options::EditorOptions;
use super::persist::{SaveOutcome, SavePicker, SaveRequest, save_bytes, write_atomic};

// ============================================================================
// Constants
// ============================================================================

/// Buffered notifications per subscriber before it starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// ControlInner
// ============================================================================

/// State shared between the control handle and its owner loop.
struct ControlInner {
    surface_id: SurfaceId,
    surface: Arc<dyn ContentSurface>,
    registry: Arc<ControlRegistry>,
    readiness: Readiness,
    options: EditorOptions,
    picker: Option<Arc<dyn SavePicker>>,
    events: broadcast::Sender<EditorEvent>,
    /// One document operation in flight per surface.
    op_lock: AsyncMutex<()>,
    page: String,
}

// ============================================================================
// EditorControl
// ============================================================================

/// Host-side handle to an embedded document editor.
///
/// Created with [`EditorControl::builder`]. Dropping the control stops its
/// owner loop; native callbacks that arrive later are discarded.
pub struct EditorControl {
    inner: Arc<ControlInner>,
    /// Keeps the owner loop alive; the registry only holds it weakly.
    dispatcher: Arc<Dispatcher>,
}

impl fmt::Debug for EditorControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorControl")
            .field("surface_id", &self.inner.surface_id)
            .field("ready", &self.inner.readiness.is_ready())
            .finish_non_exhaustive()
    }
}

impl Drop for EditorControl {
    fn drop(&mut self) {
        self.inner.registry.unregister(self.inner.surface_id);
        debug!(surface_id = %self.inner.surface_id, "Editor control dropped");
    }
}

// ============================================================================
// EditorControl - Construction
// ============================================================================

impl EditorControl {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> EditorControlBuilder {
        EditorControlBuilder::new()
    }

    /// Registers the control, spawns its owner loop and loads the page.
    ///
    /// Must run inside a Tokio runtime; the builder checks this.
    pub(crate) fn start(
        surface_id: SurfaceId,
        registry: Arc<ControlRegistry>,
        surface: Arc<dyn ContentSurface>,
        picker: Option<Arc<dyn SavePicker>>,
        options: EditorOptions,
        page: String,
    ) -> Self {
        let gate = ReadinessGate::new();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (dispatcher, rx) = Dispatcher::new(surface_id);

        let inner = Arc::new(ControlInner {
            surface_id,
            surface,
            registry: Arc::clone(&registry),
            readiness: gate.watcher(),
            options,
            picker,
            events,
            op_lock: AsyncMutex::new(()),
            page,
        });

        registry.register(surface_id, &dispatcher);
        tokio::spawn(run_owner_loop(Arc::clone(&inner), gate, rx));

        // Initial load; a failure is reported as a notification.
        let (done, _) = oneshot::channel();
        dispatcher.post(SurfaceEvent::Load {
            html: inner.page.clone(),
            done,
        });

        info!(%surface_id, "Editor control started");
        Self { inner, dispatcher }
    }
}

// ============================================================================
// EditorControl - Accessors
// ============================================================================

impl EditorControl {
    /// Returns the surface ID.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.inner.surface_id
    }

    /// Returns the link native code uses to reach this control.
    #[must_use]
    pub fn link(&self) -> SurfaceLink {
        SurfaceLink::new(self.inner.surface_id, Arc::clone(&self.inner.registry))
    }

    /// Returns a readiness watcher.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.clone()
    }

    /// Returns the control options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.inner.options
    }

    /// Subscribes to notifications.
    ///
    /// Only notifications raised after subscribing are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.inner.events.subscribe()
    }

    /// Reloads the editor page, discarding the current document.
    ///
    /// Readiness re-arms to `NotReady` until the surface reports the new
    /// navigation.
    ///
    /// # Errors
    ///
    /// - [`Error::SurfaceClosed`] if the owner loop has stopped
    /// - Any error from loading the page into the surface
    pub async fn reload(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        let posted = self.dispatcher.post(SurfaceEvent::Load {
            html: self.inner.page.clone(),
            done,
        });
        if !posted {
            return Err(Error::SurfaceClosed);
        }
        rx.await?
    }
}

// ============================================================================
// EditorControl - Open / Load
// ============================================================================

impl EditorControl {
    /// Opens a docx file into the editor.
    ///
    /// Returns `Ok(false)` if the surface rejected the document; the reason
    /// is reported as [`EditorEvent::ErrorOccurred`].
    ///
    /// # Errors
    ///
    /// - [`Error::FileNotFound`] if `path` is not a file
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::WebViewNotReady`] if the surface does not become ready
    pub async fn open_docx_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.open_file(DocumentFormat::Docx, path.as_ref()).await
    }

    /// Opens an rtf file into the editor.
    ///
    /// # Errors
    ///
    /// See [`open_docx_file`](Self::open_docx_file).
    pub async fn open_rtf_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.open_file(DocumentFormat::Rtf, path.as_ref()).await
    }

    /// Same as [`open_rtf_file`](Self::open_rtf_file).
    ///
    /// # Errors
    ///
    /// See [`open_docx_file`](Self::open_docx_file).
    pub async fn open_rtf_file_no_prompt(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.open_rtf_file(path).await
    }

    /// Same as [`open_rtf_file`](Self::open_rtf_file).
    ///
    /// # Errors
    ///
    /// See [`open_docx_file`](Self::open_docx_file).
    pub async fn open_rtf_file_prompt(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.open_rtf_file(path).await
    }

    /// Imports docx bytes into the editor.
    ///
    /// Raises [`EditorEvent::ImportCompleted`] on success and
    /// [`EditorEvent::ErrorOccurred`] on any failure.
    pub async fn load_docx(&self, bytes: &[u8]) -> bool {
        self.import_document(DocumentFormat::Docx, bytes).await
    }

    /// Imports rtf bytes into the editor.
    ///
    /// See [`load_docx`](Self::load_docx).
    pub async fn load_rtf(&self, bytes: &[u8]) -> bool {
        self.import_document(DocumentFormat::Rtf, bytes).await
    }

    async fn open_file(&self, format: DocumentFormat, path: &Path) -> Result<bool> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Error::file_not_found(path));
        }

        let bytes = tokio::fs::read(path).await?;
        debug!(surface_id = %self.inner.surface_id, ?format, path = %path.display(), len = bytes.len(), "Opening document");

        self.inner
            .readiness
            .wait_ready(self.inner.options.poll_policy())
            .await?;

        Ok(self.import_document(format, &bytes).await)
    }

    async fn import_document(&self, format: DocumentFormat, bytes: &[u8]) -> bool {
        match self.try_import(format, bytes).await {
            Ok(()) => {
                self.inner.emit(EditorEvent::ImportCompleted);
                true
            }
            Err(e) => {
                warn!(surface_id = %self.inner.surface_id, ?format, error = %e, "Import failed");
                self.inner.emit(EditorEvent::error(e));
                false
            }
        }
    }

    async fn try_import(&self, format: DocumentFormat, bytes: &[u8]) -> Result<()> {
        let _guard = self.lock_when_ready().await?;
        self.inner.import(format, bytes).await
    }

    /// Takes the operation lock once the surface is ready.
    ///
    /// Readiness is awaited before queueing on the lock. If the surface
    /// reloads while queued, only the unspent polling budget is waited.
    async fn lock_when_ready(&self) -> Result<MutexGuard<'_, ()>> {
        let policy = self.inner.options.poll_policy();
        let started = Instant::now();
        self.inner.readiness.wait_ready(policy).await?;

        let guard = self.inner.op_lock.lock().await;
        if !self.inner.readiness.is_ready() {
            trace!(surface_id = %self.inner.surface_id, "Surface reloaded while queued");
            self.inner
                .readiness
                .wait_ready(policy.remaining(started.elapsed()))
                .await?;
        }
        Ok(guard)
    }
}

// ============================================================================
// EditorControl - Export / Save
// ============================================================================

impl EditorControl {
    /// Exports the editor content as docx.
    ///
    /// Returns `Ok(None)` if the surface produced no document. Malformed
    /// results are reported as [`EditorEvent::ErrorOccurred`] and also
    /// yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`Error::WebViewNotReady`] if the surface does not become ready
    /// - [`Error::SurfaceClosed`] if the owner loop has stopped
    pub async fn get_docx(&self) -> Result<Option<Vec<u8>>> {
        self.get_document(DocumentFormat::Docx).await
    }

    /// Exports the editor content as rtf.
    ///
    /// # Errors
    ///
    /// See [`get_docx`](Self::get_docx).
    pub async fn get_rtf(&self) -> Result<Option<Vec<u8>>> {
        self.get_document(DocumentFormat::Rtf).await
    }

    /// Exports docx and writes it to `path`, creating parent directories.
    ///
    /// Returns `false` if nothing was produced or any step failed; failures
    /// are reported as [`EditorEvent::ErrorOccurred`].
    pub async fn save_docx_to_file(&self, path: impl AsRef<Path>) -> bool {
        self.save_to_file(DocumentFormat::Docx, path.as_ref()).await
    }

    /// Exports rtf and writes it to `path`.
    ///
    /// See [`save_docx_to_file`](Self::save_docx_to_file).
    pub async fn save_rtf_to_file(&self, path: impl AsRef<Path>) -> bool {
        self.save_to_file(DocumentFormat::Rtf, path.as_ref()).await
    }

    /// Exports docx and saves it through the picker.
    ///
    /// Without a picker the document goes to the cache directory as
    /// `document_<yyyyMMdd_HHmmss>.docx`. A dismissed picker returns `false`
    /// without a notification.
    pub async fn save_docx_with_picker(&self) -> bool {
        self.save_with_picker(DocumentFormat::Docx).await
    }

    /// Exports rtf and saves it through the picker.
    ///
    /// See [`save_docx_with_picker`](Self::save_docx_with_picker).
    pub async fn save_rtf_with_picker(&self) -> bool {
        self.save_with_picker(DocumentFormat::Rtf).await
    }

    async fn get_document(&self, format: DocumentFormat) -> Result<Option<Vec<u8>>> {
        match self.try_export(format).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_boundary_error() => {
                warn!(surface_id = %self.inner.surface_id, ?format, error = %e, "Export failed");
                self.inner.emit(EditorEvent::error(e));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_to_file(&self, format: DocumentFormat, path: &Path) -> bool {
        let result = self.try_save_to_file(format, path).await;
        self.finish_save(format, result)
    }

    async fn save_with_picker(&self, format: DocumentFormat) -> bool {
        let result = self.try_save_with_picker(format).await;
        self.finish_save(format, result)
    }

    async fn try_save_to_file(&self, format: DocumentFormat, path: &Path) -> Result<bool> {
        let Some(bytes) = self.export_locked(format).await? else {
            return Ok(false);
        };
        write_atomic(path, bytes).await?;
        Ok(true)
    }

    async fn try_save_with_picker(&self, format: DocumentFormat) -> Result<bool> {
        let Some(bytes) = self.export_locked(format).await? else {
            return Ok(false);
        };

        let request = SaveRequest::new(
            self.inner.options.document_name.clone(),
            format.type_label(),
            format.extension(),
        );
        let cache_dir = self.inner.options.resolved_cache_dir();
        let outcome = save_bytes(self.inner.picker.as_deref(), &request, &cache_dir, bytes).await?;
        Ok(matches!(outcome, SaveOutcome::Written(_)))
    }

    async fn try_export(&self, format: DocumentFormat) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock_when_ready().await?;
        self.inner.export(format).await
    }

    /// Exports under the operation lock, releasing it before persisting.
    async fn export_locked(&self, format: DocumentFormat) -> Result<Option<Vec<u8>>> {
        let bytes = self.try_export(format).await?;
        Ok(bytes.filter(|b| !b.is_empty()))
    }

    fn finish_save(&self, format: DocumentFormat, result: Result<bool>) -> bool {
        match result {
            Ok(true) => {
                self.inner.emit(EditorEvent::export_completed(format));
                true
            }
            Ok(false) => {
                debug!(surface_id = %self.inner.surface_id, ?format, "Nothing saved");
                false
            }
            Err(e) => {
                warn!(surface_id = %self.inner.surface_id, ?format, error = %e, "Save failed");
                self.inner.emit(EditorEvent::error(e));
                false
            }
        }
    }
}

// ============================================================================
// ControlInner - Surface Operations
// ============================================================================

impl ControlInner {
    /// Runs the import script. The caller holds the operation lock on a
    /// ready surface.
    async fn import(&self, format: DocumentFormat, bytes: &[u8]) -> Result<()> {
        let script = import_script(format, bytes);
        trace!(surface_id = %self.surface_id, ?format, script_len = script.len(), "Evaluating import");
        let raw = self.surface.evaluate_script(&script).await?;

        if !import_succeeded(&raw) {
            return Err(Error::script_evaluation(
                format.import_function(),
                "import reported failure",
            ));
        }
        Ok(())
    }

    async fn export(&self, format: DocumentFormat) -> Result<Option<Vec<u8>>> {
        let raw = self.surface.evaluate_script(format.export_script()).await?;
        trace!(surface_id = %self.surface_id, ?format, raw_len = raw.len(), "Export evaluated");
        decode_document(format, &raw)
    }

    async fn save_image(&self, data_url: &str) {
        let image = DataUrl::decode(data_url);
        if image.is_empty() {
            debug!(surface_id = %self.surface_id, "Image save skipped, nothing decoded");
            return;
        }

        let extension = image.extension();
        let request = SaveRequest::new(
            self.options.image_name.clone(),
            format!("{} Image", extension.to_ascii_uppercase()),
            format!(".{extension}"),
        );
        let cache_dir = self.options.resolved_cache_dir();

        match save_bytes(self.picker.as_deref(), &request, &cache_dir, image.bytes).await {
            Ok(SaveOutcome::Written(path)) => {
                info!(surface_id = %self.surface_id, path = %path.display(), mime = %image.mime, "Image saved");
            }
            Ok(SaveOutcome::Cancelled) => {}
            Err(e) => {
                warn!(surface_id = %self.surface_id, error = %e, "Image save failed");
                self.emit(EditorEvent::error(e));
            }
        }
    }

    fn emit(&self, event: EditorEvent) {
        if self.events.send(event).is_err() {
            trace!(surface_id = %self.surface_id, "No subscribers for notification");
        }
    }
}

// ============================================================================
// Owner Loop
// ============================================================================

/// Processes surface events until the control is dropped.
///
/// The only place readiness is mutated.
async fn run_owner_loop(
    inner: Arc<ControlInner>,
    gate: ReadinessGate,
    mut rx: mpsc::UnboundedReceiver<SurfaceEvent>,
) {
    let surface_id = inner.surface_id;
    debug!(%surface_id, "Owner loop started");

    while let Some(event) = rx.recv().await {
        match event {
            SurfaceEvent::Navigated => {
                if gate.mark_ready() {
                    info!(%surface_id, "Surface ready");
                } else {
                    trace!(%surface_id, "Navigation while already ready");
                }
            }

            SurfaceEvent::Message(payload) => {
                if let Some(ParsedMessage::SaveImage { data_url }) = parse_push_message(&payload) {
                    let inner = Arc::clone(&inner);
                    tokio::spawn(async move { inner.save_image(&data_url).await });
                }
            }

            SurfaceEvent::Load { html, done } => {
                gate.arm();
                let result = inner.surface.load_html(&html).await;
                if let Err(Err(e)) = done.send(result) {
                    warn!(%surface_id, error = %e, "Page load failed");
                    inner.emit(EditorEvent::error(e));
                }
            }
        }
    }

    debug!(%surface_id, "Owner loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
