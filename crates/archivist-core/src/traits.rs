//! Seam between the core and the remote document service

use archivist_api::{DocumentFields, DocumentId, DocumentRecord};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Remote document storage and receipt rendering
///
/// Mirrors the archive server's HTTP contract. `id` and `date_registered`
/// of created documents are assigned by the service.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch every stored document, in server order
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>>;

    async fn create_document(&self, fields: &DocumentFields) -> Result<DocumentRecord>;

    /// Apply the set fields of `fields` to document `id`
    async fn update_document(&self, id: DocumentId, fields: &DocumentFields)
        -> Result<DocumentRecord>;

    async fn delete_document(&self, id: DocumentId) -> Result<()>;

    /// Render the PDF receipt whose QR code holds the document's capsule
    async fn generate_receipt(&self, id: DocumentId) -> Result<Vec<u8>>;
}
