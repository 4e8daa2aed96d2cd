//! Named user-content message handler adapter.
//!
//! Models a renderer whose user content controller routes
//! `webkit.messageHandlers.<name>.postMessage(body)` to a registered
//! handler object. The body can be any script value; it is flattened to a
//! string before forwarding.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;

use super::MessageTransport;

// ============================================================================
// Constants
// ============================================================================

/// Name the page posts to.
pub const HANDLER_NAME: &str = "invokeAction";

// ============================================================================
// Types
// ============================================================================

/// One message posted to a named handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptMessage {
    /// Handler name the page posted to.
    pub name: String,
    /// Posted value; `None` for `undefined`.
    pub body: Option<Value>,
}

impl ScriptMessage {
    /// Returns the body as a string.
    ///
    /// Strings pass through unquoted, other values use their JSON text, and
    /// a missing body is empty.
    #[must_use]
    pub fn body_string(&self) -> String {
        match &self.body {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Handler object registered with a user content controller.
pub trait ScriptMessageHandler: Send + Sync {
    /// Called for each message posted to the handler's name.
    fn did_receive_script_message(&self, message: &ScriptMessage);
}

/// Routes named script messages to handler objects.
pub trait UserContentController: Send + Sync {
    /// Removes the handler registered under `name`.
    ///
    /// # Errors
    ///
    /// Platforms may fail when nothing is registered; callers ignore it.
    fn remove_script_message_handler(&self, name: &str) -> Result<()>;

    /// Registers `handler` under `name`.
    fn add_script_message_handler(&self, handler: Arc<dyn ScriptMessageHandler>, name: &str);
}

// ============================================================================
// ScriptHandlerBridge
// ============================================================================

/// Handler forwarding script messages to a [`MessageTransport`].
pub struct ScriptHandlerBridge {
    transport: Arc<dyn MessageTransport>,
}

impl fmt::Debug for ScriptHandlerBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHandlerBridge").finish_non_exhaustive()
    }
}

impl ScriptHandlerBridge {
    /// Registers a fresh handler under [`HANDLER_NAME`].
    ///
    /// Any previous handler with that name is removed first.
    pub fn attach(
        controller: &dyn UserContentController,
        transport: Arc<dyn MessageTransport>,
    ) -> Arc<Self> {
        if let Err(e) = controller.remove_script_message_handler(HANDLER_NAME) {
            trace!(error = %e, "No previous script message handler to remove");
        }

        let bridge = Arc::new(Self { transport });
        controller.add_script_message_handler(
            Arc::clone(&bridge) as Arc<dyn ScriptMessageHandler>,
            HANDLER_NAME,
        );
        debug!(name = HANDLER_NAME, "Script message handler registered");
        bridge
    }
}

impl ScriptMessageHandler for ScriptHandlerBridge {
    fn did_receive_script_message(&self, message: &ScriptMessage) {
        self.transport.on_message(message.body_string());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;
    use serde_json::json;

    use crate::error::Error;
    use crate::testing::RecordingTransport;

    #[derive(Default)]
    struct FakeController {
        handlers: Mutex<FxHashMap<String, Arc<dyn ScriptMessageHandler>>>,
    }

    impl FakeController {
        fn post(&self, name: &str, body: Option<Value>) {
            let handler = self.handlers.lock().get(name).cloned();
            if let Some(handler) = handler {
                handler.did_receive_script_message(&ScriptMessage {
                    name: name.to_string(),
                    body,
                });
            }
        }
    }

    impl UserContentController for FakeController {
        fn remove_script_message_handler(&self, name: &str) -> Result<()> {
            self.handlers
                .lock()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| Error::config(format!("no handler named {name}")))
        }

        fn add_script_message_handler(&self, handler: Arc<dyn ScriptMessageHandler>, name: &str) {
            let previous = self.handlers.lock().insert(name.to_string(), handler);
            assert!(previous.is_none(), "duplicate handler for {name}");
        }
    }

    #[test]
    fn test_body_string() {
        let message = |body| ScriptMessage {
            name: HANDLER_NAME.to_string(),
            body,
        };

        assert_eq!(message(None).body_string(), "");
        assert_eq!(message(Some(json!("text"))).body_string(), "text");
        assert_eq!(
            message(Some(json!({"type": "saveImage"}))).body_string(),
            r#"{"type":"saveImage"}"#
        );
    }

    #[test]
    fn test_forwards_posted_messages() {
        let controller = FakeController::default();
        let transport = RecordingTransport::new();
        ScriptHandlerBridge::attach(&controller, transport.clone());

        controller.post(HANDLER_NAME, Some(json!("hello")));
        controller.post("otherHandler", Some(json!("ignored")));

        assert_eq!(transport.messages(), vec!["hello"]);
    }

    #[test]
    fn test_reattach_does_not_duplicate() {
        let controller = FakeController::default();
        let transport = RecordingTransport::new();

        ScriptHandlerBridge::attach(&controller, transport.clone());
        ScriptHandlerBridge::attach(&controller, transport.clone());

        controller.post(HANDLER_NAME, Some(json!("once")));
        assert_eq!(transport.messages(), vec!["once"]);
    }
}
