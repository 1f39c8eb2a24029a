//! Error taxonomy of the archive client
//!
//! Every error here is recoverable. Front ends present them as dismissible
//! messages and keep running.

use crate::document::DocumentId;

/// Failure to turn capsule text back into a document snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed capsule payload: {message}")]
    MalformedPayload { message: String },

    #[error("Capsule is missing required field '{field}'")]
    MissingRequiredField { field: &'static str },
}

impl DecodeError {
    pub fn malformed(message: impl Into<String>) -> Self {
        DecodeError::MalformedPayload {
            message: message.into(),
        }
    }
}

/// Failures surfaced by a scan session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// No camera, permission denied, device busy or lost
    #[error("Camera unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// A code was read but it is not a document capsule. Scanning goes on.
    #[error("Invalid QR code, not a document capsule: {source}")]
    InvalidCapsule { source: DecodeError },
}

/// Failures of the remote document service, one kind per operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Failed to load documents: {message}")]
    LoadFailed { message: String },

    #[error("Failed to create document: {message}")]
    CreateFailed { message: String },

    #[error("Failed to update document {id}: {message}")]
    UpdateFailed { id: DocumentId, message: String },

    #[error("Failed to delete document {id}: {message}")]
    DeleteFailed { id: DocumentId, message: String },

    #[error("Failed to generate receipt for document {id}: {message}")]
    ReceiptFailed { id: DocumentId, message: String },
}

impl RemoteError {
    /// Underlying cause, without the operation prefix
    pub fn message(&self) -> &str {
        match self {
            RemoteError::LoadFailed { message }
            | RemoteError::CreateFailed { message }
            | RemoteError::UpdateFailed { message, .. }
            | RemoteError::DeleteFailed { message, .. }
            | RemoteError::ReceiptFailed { message, .. } => message,
        }
    }
}
