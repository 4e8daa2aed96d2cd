//! Script-callable interface object adapter.
//!
//! Models a renderer that injects a host object into the page under a
//! global name; script calls `native.postMessage(msg)` directly. Calls
//! arrive on a renderer-owned background thread.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;

use super::MessageTransport;

// ============================================================================
// Constants
// ============================================================================

/// Global name of the injected interface object.
pub const INTERFACE_NAME: &str = "native";

// ============================================================================
// Types
// ============================================================================

/// Object exposed to script.
pub trait JsInterface: Send + Sync {
    /// Called by script as `native.postMessage(message)`.
    fn post_message(&self, message: String);
}

/// Web view that can expose host objects to script.
pub trait JsInterfaceHost: Send + Sync {
    /// Enables script execution.
    fn set_javascript_enabled(&self, enabled: bool);

    /// Enables DOM storage.
    fn set_dom_storage_enabled(&self, enabled: bool);

    /// Blocks the platform long-press handling (selection popups, menus).
    fn set_long_click_blocked(&self, blocked: bool);

    /// Removes the object registered under `name`.
    ///
    /// # Errors
    ///
    /// Platforms may fail when nothing is registered; callers ignore it.
    fn remove_javascript_interface(&self, name: &str) -> Result<()>;

    /// Exposes `object` to script under `name`.
    fn add_javascript_interface(&self, object: Arc<dyn JsInterface>, name: &str);
}

// ============================================================================
// JsInterfaceBridge
// ============================================================================

/// Interface object forwarding `postMessage` calls to a [`MessageTransport`].
pub struct JsInterfaceBridge {
    transport: Arc<dyn MessageTransport>,
}

impl fmt::Debug for JsInterfaceBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsInterfaceBridge").finish_non_exhaustive()
    }
}

impl JsInterfaceBridge {
    /// Configures `host` and registers a fresh interface object.
    ///
    /// Any object previously registered under [`INTERFACE_NAME`] is removed
    /// first, so attaching twice leaves exactly one registration.
    pub fn attach(
        host: &dyn JsInterfaceHost,
        transport: Arc<dyn MessageTransport>,
        block_long_click: bool,
    ) -> Arc<Self> {
        host.set_javascript_enabled(true);
        host.set_dom_storage_enabled(true);
        host.set_long_click_blocked(block_long_click);

        if let Err(e) = host.remove_javascript_interface(INTERFACE_NAME) {
            trace!(error = %e, "No previous interface object to remove");
        }

        let bridge = Arc::new(Self { transport });
        host.add_javascript_interface(Arc::clone(&bridge) as Arc<dyn JsInterface>, INTERFACE_NAME);
        debug!(name = INTERFACE_NAME, "Script interface object registered");
        bridge
    }
}

impl JsInterface for JsInterfaceBridge {
    fn post_message(&self, message: String) {
        self.transport.on_message(message);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;

    use crate::error::Error;
    use crate::testing::RecordingTransport;

    #[derive(Default)]
    struct FakeWebView {
        javascript: AtomicBool,
        dom_storage: AtomicBool,
        long_click_blocked: AtomicBool,
        adds: Mutex<u32>,
        interfaces: Mutex<FxHashMap<String, Arc<dyn JsInterface>>>,
    }

    impl FakeWebView {
        fn call_from_script(&self, message: &str) {
            let object = self.interfaces.lock().get(INTERFACE_NAME).cloned();
            if let Some(object) = object {
                object.post_message(message.to_string());
            }
        }
    }

    impl JsInterfaceHost for FakeWebView {
        fn set_javascript_enabled(&self, enabled: bool) {
            self.javascript.store(enabled, Ordering::SeqCst);
        }

        fn set_dom_storage_enabled(&self, enabled: bool) {
            self.dom_storage.store(enabled, Ordering::SeqCst);
        }

        fn set_long_click_blocked(&self, blocked: bool) {
            self.long_click_blocked.store(blocked, Ordering::SeqCst);
        }

        fn remove_javascript_interface(&self, name: &str) -> Result<()> {
            self.interfaces
                .lock()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| Error::config(format!("no interface named {name}")))
        }

        fn add_javascript_interface(&self, object: Arc<dyn JsInterface>, name: &str) {
            *self.adds.lock() += 1;
            self.interfaces.lock().insert(name.to_string(), object);
        }
    }

    #[test]
    fn test_attach_configures_host() {
        let view = FakeWebView::default();
        JsInterfaceBridge::attach(&view, RecordingTransport::new(), true);

        assert!(view.javascript.load(Ordering::SeqCst));
        assert!(view.dom_storage.load(Ordering::SeqCst));
        assert!(view.long_click_blocked.load(Ordering::SeqCst));
    }

    #[test]
    fn test_script_call_is_forwarded() {
        let view = FakeWebView::default();
        let transport = RecordingTransport::new();
        JsInterfaceBridge::attach(&view, transport.clone(), false);

        let view = Arc::new(view);
        let background = Arc::clone(&view);
        std::thread::spawn(move || background.call_from_script("{\"type\":\"saveImage\"}"))
            .join()
            .expect("join");

        assert_eq!(transport.messages(), vec!["{\"type\":\"saveImage\"}"]);
    }

    #[test]
    fn test_reattach_replaces_previous_object() {
        let view = FakeWebView::default();
        let transport = RecordingTransport::new();

        JsInterfaceBridge::attach(&view, transport.clone(), false);
        JsInterfaceBridge::attach(&view, transport.clone(), false);

        assert_eq!(*view.adds.lock(), 2);
        assert_eq!(view.interfaces.lock().len(), 1);

        view.call_from_script("once");
        assert_eq!(transport.messages(), vec!["once"]);
    }
}
