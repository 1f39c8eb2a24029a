//! Core engine of the document archive client
//!
//! - `capsule` - encode a document into QR capsule text and decode it back
//! - `collection` - the fetched document list, unique by id
//! - `query` - filtered, paginated views derived from the collection
//! - `sync` - `CollectionSynchronizer`, which reconciles the collection with the remote service
//! - `scan` - camera-backed scan sessions that end in a decoded capsule
//! - `traits` - the `DocumentService` seam to the remote service
//! - `memory_service` - in-memory `DocumentService` for tests and offline use

pub mod capsule;
pub mod collection;
pub mod liveness;
pub mod memory_service;
pub mod query;
pub mod receipt;
pub mod scan;
pub mod sync;
pub mod traits;

pub use archivist_api::{
    DecodeError, DocumentFields, DocumentId, DocumentRecord, RemoteError, ScanError,
};
pub use capsule::{decode, encode, Capsule};
pub use collection::Collection;
pub use liveness::{Liveness, TeardownGuard};
pub use memory_service::{MemoryDocumentService, ServiceOperation};
pub use query::{facets, view, Page, PageView, ViewState, DEFAULT_PAGE_SIZE};
pub use receipt::Receipt;
pub use scan::{
    Camera, CameraError, CapturePipeline, DetectionWindow, RenderTarget, ScanCancel, ScanConfig,
    ScanEvent, ScanOutcome, ScanSessionManager, ScanState,
};
pub use sync::{CollectionSynchronizer, DeleteConfirmation, Reconciled};
pub use traits::{DocumentService, Result};
