//! Push messages from the content surface.
//!
//! The surface may post a JSON object at any time, unprompted:
//!
//! ```json
//! { "type": "saveImage", "dataUrl": "data:image/png;base64,..." }
//! ```
//!
//! Unknown types and malformed JSON are dropped, never reported.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

// ============================================================================
// Constants
// ============================================================================

/// Message type requesting that an image be saved on the host.
pub const SAVE_IMAGE: &str = "saveImage";

// ============================================================================
// BridgeMessage
// ============================================================================

/// A structured message pushed by the content surface.
///
/// Every field other than `type` is collected into `payload`; non-string
/// values are kept in their JSON text form.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeMessage {
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Remaining fields.
    #[serde(flatten)]
    pub payload: FxHashMap<String, Value>,
}

impl BridgeMessage {
    /// Parses a raw message string.
    ///
    /// Returns `None` for blank input, invalid JSON, non-object JSON, or an
    /// object without a string `type`.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<Self>(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                trace!(error = %e, len = raw.len(), "Ignoring malformed bridge message");
                None
            }
        }
    }

    /// Gets a payload field as a string.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.payload.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Parses the message into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedMessage {
        if self.message_type.eq_ignore_ascii_case(SAVE_IMAGE) {
            match self.get_string("dataUrl") {
                Some(data_url) if !data_url.trim().is_empty() => {
                    return ParsedMessage::SaveImage { data_url };
                }
                _ => debug!("saveImage message without dataUrl"),
            }
        }

        ParsedMessage::Unknown {
            message_type: self.message_type.clone(),
        }
    }
}

// ============================================================================
// ParsedMessage
// ============================================================================

/// Parsed message types for type-safe handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessage {
    /// The user asked to save an image from the editor.
    SaveImage {
        /// Image encoded as a data URL.
        data_url: String,
    },

    /// Anything else; kept for forward compatibility and ignored.
    Unknown {
        /// The message type.
        message_type: String,
    },
}

/// Parses a raw push message, returning `None` if it is not actionable.
#[must_use]
pub fn parse_push_message(raw: &str) -> Option<ParsedMessage> {
    match BridgeMessage::from_json(raw)?.parse() {
        ParsedMessage::Unknown { message_type } => {
            trace!(%message_type, "Ignoring unrecognized bridge message");
            None
        }
        parsed => Some(parsed),
    }
}

// ============================================================================
// Tests
// ============================================================================
