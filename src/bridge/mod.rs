//! Message bridge adapters.
//!
//! Platform web views deliver script messages in three structurally
//! different ways. Each adapter reduces its mechanism to one call:
//! [`MessageTransport::on_message`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ web_message          │ request/response channel,
//! │  (WebView2-style)    │ handler token per core          ┐
//! ├──────────────────────┤                                  │
//! │ js_interface         │ object injected into script,     │  MessageTransport
//! │  (Android-style)     │ `native.postMessage(msg)`        ├─────────────────►  SurfaceLink ──► owner loop
//! ├──────────────────────┤                                  │   on_message(s)
//! │ script_handler       │ user-content handler keyed by    │
//! │  (WebKit-style)      │ name, `invokeAction`             ┘
//! └──────────────────────┘
//! ```
//!
//! Every adapter registers at most one forwarding handler per surface:
//! attaching again removes the previous registration first. Adapters hold
//! the transport, never the editor control.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | `ControlRegistry`, `SurfaceLink`, owner-loop dispatch |
//! | `web_message` | Request/response script messaging channel |
//! | `js_interface` | Script-callable interface object |
//! | `script_handler` | Named user-content message handler |

// ============================================================================
// Submodules
// ============================================================================

/// Script-callable interface object adapter.
pub mod js_interface;

/// Control registry and owner-loop dispatch.
pub mod registry;

/// Named user-content message handler adapter.
pub mod script_handler;

/// Request/response web message channel adapter.
pub mod web_message;

// ============================================================================
// Re-exports
// ============================================================================

pub use js_interface::{JsInterface, JsInterfaceBridge, JsInterfaceHost};
pub use registry::{ControlRegistry, SurfaceLink};
pub use script_handler::{
    ScriptHandlerBridge, ScriptMessage, ScriptMessageHandler, UserContentController,
};
pub use web_message::{WebMessageArgs, WebMessageBridge, WebMessageCore, WebMessageHost};

// ============================================================================
// MessageTransport
// ============================================================================

/// Receiver of string messages emitted by a content surface.
///
/// Implementations must not panic and must tolerate being called from any
/// thread.
pub trait MessageTransport: Send + Sync {
    /// Handles one inbound message.
    fn on_message(&self, payload: String);
}
