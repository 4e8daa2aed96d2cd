//! Test doubles for the native side.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::bridge::{MessageTransport, SurfaceLink};
use crate::editor::{SavePicker, SaveRequest};
use crate::error::{Error, Result};
use crate::surface::ContentSurface;

// ============================================================================
// RecordingTransport
// ============================================================================

/// Transport that keeps every message it receives.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    messages: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl MessageTransport for RecordingTransport {
    fn on_message(&self, payload: String) {
        self.messages.lock().push(payload);
    }
}

// ============================================================================
// FakeSurface
// ============================================================================

enum Reply {
    Value(String),
    Throw(String),
}

/// Scriptable content surface.
///
/// Import calls answer `true` and everything else `null` unless a reply is
/// programmed with [`respond`](Self::respond) or [`fail`](Self::fail).
pub(crate) struct FakeSurface {
    link: SurfaceLink,
    auto_navigate: bool,
    loads: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    replies: Mutex<Vec<(String, Reply)>>,
    eval_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSurface {
    /// A surface that reports navigation as soon as a page is loaded.
    pub(crate) fn new(link: SurfaceLink) -> Arc<Self> {
        Self::with_navigation(link, true)
    }

    /// A surface that never reports navigation on its own.
    pub(crate) fn silent(link: SurfaceLink) -> Arc<Self> {
        Self::with_navigation(link, false)
    }

    fn with_navigation(link: SurfaceLink, auto_navigate: bool) -> Arc<Self> {
        Arc::new(Self {
            link,
            auto_navigate,
            loads: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            eval_delay: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Answers scripts starting with `prefix` with `raw`.
    pub(crate) fn respond(&self, prefix: &str, raw: &str) {
        self.replies
            .lock()
            .push((prefix.to_string(), Reply::Value(raw.to_string())));
    }

    /// Fails scripts starting with `prefix`.
    pub(crate) fn fail(&self, prefix: &str, message: &str) {
        self.replies
            .lock()
            .push((prefix.to_string(), Reply::Throw(message.to_string())));
    }

    pub(crate) fn set_eval_delay(&self, delay: Duration) {
        *self.eval_delay.lock() = delay;
    }

    pub(crate) fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }

    pub(crate) fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply_for(&self, script: &str) -> Result<String> {
        let replies = self.replies.lock();
        // Latest programmed reply wins.
        let reply = replies
            .iter()
            .rev()
            .find(|(prefix, _)| script.starts_with(prefix.as_str()));

        match reply {
            Some((_, Reply::Value(raw))) => Ok(raw.clone()),
            Some((_, Reply::Throw(message))) => {
                Err(Error::script_evaluation(script, message.as_str()))
            }
            None if script.starts_with("window.import") => Ok("true".to_string()),
            None => Ok("null".to_string()),
        }
    }
}

#[async_trait]
impl ContentSurface for FakeSurface {
    async fn load_html(&self, html: &str) -> Result<()> {
        self.loads.lock().push(html.to_string());
        if self.auto_navigate {
            self.link.navigated();
        }
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<String> {
        self.scripts.lock().push(script.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.eval_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reply_for(script)
    }
}

// ============================================================================
// FakePicker
// ============================================================================

enum PickerMode {
    Choose(PathBuf),
    Dismiss,
    Fail,
}

/// Save dialog with a scripted answer.
pub(crate) struct FakePicker {
    mode: Mutex<PickerMode>,
    requests: Mutex<Vec<SaveRequest>>,
}

impl FakePicker {
    fn with_mode(mode: PickerMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Picks `path` every time.
    pub(crate) fn choosing(path: &Path) -> Self {
        Self::with_mode(PickerMode::Choose(path.to_path_buf()))
    }

    /// Is dismissed every time.
    pub(crate) fn dismissing() -> Self {
        Self::with_mode(PickerMode::Dismiss)
    }

    /// Fails to open every time.
    pub(crate) fn failing() -> Self {
        Self::with_mode(PickerMode::Fail)
    }

    /// Switches to dismissing.
    pub(crate) fn dismiss(&self) {
        *self.mode.lock() = PickerMode::Dismiss;
    }

    pub(crate) fn requests(&self) -> Vec<SaveRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SavePicker for FakePicker {
    async fn pick_save_file(&self, request: &SaveRequest) -> Result<Option<PathBuf>> {
        self.requests.lock().push(request.clone());
        match &*self.mode.lock() {
            PickerMode::Choose(path) => Ok(Some(path.clone())),
            PickerMode::Dismiss => Ok(None),
            PickerMode::Fail => Err(Error::config("save dialog unavailable")),
        }
    }
}
