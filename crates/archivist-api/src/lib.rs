//! Shared types for the document archive
//!
//! This crate holds what every other archive crate agrees on:
//! - `document` - `DocumentRecord` and the editable `DocumentFields`
//! - `timestamp` - wire format of registration timestamps
//! - `error` - the typed error taxonomy (decode, scan, remote)

pub mod document;
pub mod error;
pub mod timestamp;

pub use document::{location_line, non_empty, DocumentFields, DocumentId, DocumentRecord};
pub use error::{DecodeError, RemoteError, ScanError};
