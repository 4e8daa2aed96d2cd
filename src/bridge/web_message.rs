//! Request/response web message channel adapter.
//!
//! Models a renderer whose scripting core raises a "web message received"
//! event with an argument object. The core may not exist yet when the
//! adapter attaches; registration is then deferred until the host reports
//! the core initialized.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;

use super::MessageTransport;

// ============================================================================
// Types
// ============================================================================

/// Arguments of one web message event.
pub trait WebMessageArgs {
    /// Returns the message if it was posted as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not a string.
    fn try_get_web_message_as_string(&self) -> Result<String>;
}

/// Handler invoked for every web message event.
pub type WebMessageCallback = Arc<dyn Fn(&dyn WebMessageArgs) + Send + Sync>;

/// Registration token returned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WebMessageToken(pub u64);

/// Scripting core of an initialized web view.
pub trait WebMessageCore: Send + Sync {
    /// Enables or disables the renderer's default context menus.
    fn set_default_context_menus_enabled(&self, enabled: bool);

    /// Subscribes to web message events.
    fn add_web_message_received(&self, handler: WebMessageCallback) -> WebMessageToken;

    /// Removes a subscription. Unknown tokens are ignored.
    fn remove_web_message_received(&self, token: WebMessageToken);
}

/// Web view control that owns a scripting core.
pub trait WebMessageHost: Send + Sync {
    /// Returns the core if it is initialized.
    fn core(&self) -> Option<Arc<dyn WebMessageCore>>;

    /// Runs `callback` once the core is initialized.
    fn on_core_initialized(&self, callback: Box<dyn FnOnce(Arc<dyn WebMessageCore>) + Send>);
}

// ============================================================================
// WebMessageBridge
// ============================================================================

/// Forwards web message events to a [`MessageTransport`].
///
/// Dropping the bridge removes its handler from the core.
pub struct WebMessageBridge {
    transport: Arc<dyn MessageTransport>,
    disable_context_menu: bool,
    registration: Mutex<Option<(Arc<dyn WebMessageCore>, WebMessageToken)>>,
}

impl fmt::Debug for WebMessageBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebMessageBridge")
            .field("disable_context_menu", &self.disable_context_menu)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

impl WebMessageBridge {
    /// Creates a bridge forwarding to `transport`.
    ///
    /// Default context menus are disabled on attach.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Arc<Self> {
        Self::with_context_menu_disabled(transport, true)
    }

    /// Creates a bridge, choosing whether to disable default context menus.
    #[must_use]
    pub fn with_context_menu_disabled(
        transport: Arc<dyn MessageTransport>,
        disable_context_menu: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            disable_context_menu,
            registration: Mutex::new(None),
        })
    }

    /// Attaches to a web view, now or once its core is initialized.
    pub fn attach(self: &Arc<Self>, host: &dyn WebMessageHost) {
        match host.core() {
            Some(core) => self.setup(core),
            None => {
                debug!("Scripting core not initialized, deferring bridge setup");
                let bridge = Arc::clone(self);
                host.on_core_initialized(Box::new(move |core| bridge.setup(core)));
            }
        }
    }

    /// Returns `true` if a handler is currently registered.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.registration.lock().is_some()
    }

    /// Removes the registered handler, if any.
    pub fn detach(&self) {
        if let Some((core, token)) = self.registration.lock().take() {
            core.remove_web_message_received(token);
            debug!(token = token.0, "Web message handler removed");
        }
    }

    fn setup(&self, core: Arc<dyn WebMessageCore>) {
        if self.disable_context_menu {
            core.set_default_context_menus_enabled(false);
        }

        let mut registration = self.registration.lock();
        if let Some((previous_core, token)) = registration.take() {
            previous_core.remove_web_message_received(token);
            trace!(token = token.0, "Replaced previous web message handler");
        }

        let transport = Arc::clone(&self.transport);
        let token = core.add_web_message_received(Arc::new(move |args: &dyn WebMessageArgs| {
            match args.try_get_web_message_as_string() {
                Ok(message) => transport.on_message(message),
                Err(e) => trace!(error = %e, "Dropping non-string web message"),
            }
        }));

        debug!(token = token.0, "Web message handler registered");
        *registration = Some((core, token));
    }
}

impl Drop for WebMessageBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use rustc_hash::FxHashMap;

    use crate::error::Error;
    use crate::testing::RecordingTransport;

    enum Args {
        Text(&'static str),
        Json,
    }

    impl WebMessageArgs for Args {
        fn try_get_web_message_as_string(&self) -> Result<String> {
            match self {
                Self::Text(s) => Ok((*s).to_string()),
                Self::Json => Err(Error::script_evaluation("postMessage", "not a string")),
            }
        }
    }

    #[derive(Default)]
    struct FakeCore {
        next: AtomicU64,
        menus_enabled: AtomicBool,
        handlers: Mutex<FxHashMap<u64, WebMessageCallback>>,
    }

    impl FakeCore {
        fn raise(&self, args: &dyn WebMessageArgs) {
            let handlers: Vec<_> = self.handlers.lock().values().cloned().collect();
            for handler in handlers {
                handler(args);
            }
        }

        fn handler_count(&self) -> usize {
            self.handlers.lock().len()
        }
    }

    impl WebMessageCore for FakeCore {
        fn set_default_context_menus_enabled(&self, enabled: bool) {
            self.menus_enabled.store(enabled, Ordering::SeqCst);
        }

        fn add_web_message_received(&self, handler: WebMessageCallback) -> WebMessageToken {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            self.handlers.lock().insert(id, handler);
            WebMessageToken(id)
        }

        fn remove_web_message_received(&self, token: WebMessageToken) {
            self.handlers.lock().remove(&token.0);
        }
    }

    #[derive(Default)]
    struct FakeHost {
        core: Mutex<Option<Arc<FakeCore>>>,
        pending: Mutex<Vec<Box<dyn FnOnce(Arc<dyn WebMessageCore>) + Send>>>,
    }

    impl FakeHost {
        fn initialize(&self, core: Arc<FakeCore>) {
            *self.core.lock() = Some(Arc::clone(&core));
            for callback in self.pending.lock().drain(..) {
                callback(Arc::clone(&core) as Arc<dyn WebMessageCore>);
            }
        }
    }

    impl WebMessageHost for FakeHost {
        fn core(&self) -> Option<Arc<dyn WebMessageCore>> {
            self.core
                .lock()
                .clone()
                .map(|core| core as Arc<dyn WebMessageCore>)
        }

        fn on_core_initialized(
            &self,
            callback: Box<dyn FnOnce(Arc<dyn WebMessageCore>) + Send>,
        ) {
            self.pending.lock().push(callback);
        }
    }

    #[test]
    fn test_forwards_string_messages() {
        let core = Arc::new(FakeCore::default());
        core.menus_enabled.store(true, Ordering::SeqCst);
        let host = FakeHost::default();
        host.initialize(Arc::clone(&core));

        let transport = RecordingTransport::new();
        let bridge = WebMessageBridge::new(transport.clone());
        bridge.attach(&host);

        core.raise(&Args::Text("{\"type\":\"saveImage\"}"));
        core.raise(&Args::Json);

        assert_eq!(transport.messages(), vec!["{\"type\":\"saveImage\"}"]);
        assert!(!core.menus_enabled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reattach_is_idempotent() {
        let core = Arc::new(FakeCore::default());
        let host = FakeHost::default();
        host.initialize(Arc::clone(&core));

        let transport = RecordingTransport::new();
        let bridge = WebMessageBridge::new(transport.clone());
        bridge.attach(&host);
        bridge.attach(&host);
        bridge.attach(&host);

        assert_eq!(core.handler_count(), 1);
        core.raise(&Args::Text("once"));
        assert_eq!(transport.messages(), vec!["once"]);
    }

    #[test]
    fn test_deferred_until_core_initialized() {
        let host = FakeHost::default();
        let transport = RecordingTransport::new();
        let bridge = WebMessageBridge::new(transport.clone());

        bridge.attach(&host);
        assert!(!bridge.is_attached());

        let core = Arc::new(FakeCore::default());
        host.initialize(Arc::clone(&core));
        assert!(bridge.is_attached());

        core.raise(&Args::Text("late init"));
        assert_eq!(transport.messages(), vec!["late init"]);
    }

    #[test]
    fn test_drop_removes_handler() {
        let core = Arc::new(FakeCore::default());
        let host = FakeHost::default();
        host.initialize(Arc::clone(&core));

        let bridge = WebMessageBridge::with_context_menu_disabled(RecordingTransport::new(), false);
        bridge.attach(&host);
        assert_eq!(core.handler_count(), 1);

        drop(bridge);
        assert_eq!(core.handler_count(), 0);
    }
}
