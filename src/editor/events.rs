//! Host notifications.

use std::sync::Arc;

use crate::error::Error;
use crate::protocol::DocumentFormat;

/// Notification raised by an editor control.
///
/// Delivered through the broadcast channel returned by
/// [`EditorControl::subscribe`](super::EditorControl::subscribe).
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// A document was imported into the editor.
    ImportCompleted,
    /// A docx export was written.
    ExportCompleted,
    /// An rtf export was written.
    RtfExportCompleted,
    /// An operation failed at the host/content boundary.
    ErrorOccurred(Arc<Error>),
}

impl EditorEvent {
    /// Wraps an error as a notification.
    #[inline]
    #[must_use]
    pub fn error(err: Error) -> Self {
        Self::ErrorOccurred(Arc::new(err))
    }

    /// Completion notification for a written export.
    #[must_use]
    pub fn export_completed(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Docx => Self::ExportCompleted,
            DocumentFormat::Rtf => Self::RtfExportCompleted,
        }
    }

    /// Returns the error if this is an error notification.
    #[must_use]
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            Self::ErrorOccurred(err) => Some(err),
            _ => None,
        }
    }
}
