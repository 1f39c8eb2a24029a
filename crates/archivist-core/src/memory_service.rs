//! In-memory DocumentService
//!
//! Behaves like the archive server (server-assigned ids and timestamps,
//! patch-style updates, receipts carrying the capsule) without any network.
//! Failures can be injected per operation to exercise error paths.

use archivist_api::{DocumentFields, DocumentId, DocumentRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::capsule;
use crate::traits::{DocumentService, Result};

/// Operations of the remote contract, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    List,
    Create,
    Update,
    Delete,
    Receipt,
}

#[derive(Default)]
struct MemoryState {
    records: Vec<DocumentRecord>,
    next_id: DocumentId,
    failing: HashSet<ServiceOperation>,
}

pub struct MemoryDocumentService {
    state: RwLock<MemoryState>,
    calls: AtomicUsize,
}

impl Default for MemoryDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentService {
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    /// Seed with existing documents; new ids continue after the highest one
    pub fn with_documents(records: Vec<DocumentRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            state: RwLock::new(MemoryState {
                records,
                next_id,
                failing: HashSet::new(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every call of `operation` fail until `recover` is called
    pub async fn fail_on(&self, operation: ServiceOperation) {
        self.state.write().await.failing.insert(operation);
    }

    pub async fn recover(&self, operation: ServiceOperation) {
        self.state.write().await.failing.remove(&operation);
    }

    /// Number of remote calls served so far, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current server-side contents
    pub async fn snapshot(&self) -> Vec<DocumentRecord> {
        self.state.read().await.records.clone()
    }

    fn check(&self, state: &MemoryState, operation: ServiceOperation) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if state.failing.contains(&operation) {
            return Err(format!("injected failure for {:?}", operation).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentService for MemoryDocumentService {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let state = self.state.read().await;
        self.check(&state, ServiceOperation::List)?;
        Ok(state.records.clone())
    }

    async fn create_document(&self, fields: &DocumentFields) -> Result<DocumentRecord> {
        let mut state = self.state.write().await;
        self.check(&state, ServiceOperation::Create)?;

        let title = fields.title().ok_or("HTTP 422: title is required")?;
        let mut record = DocumentRecord::new(state.next_id, title, Utc::now());
        fields.apply_to(&mut record);
        state.next_id += 1;
        state.records.push(record.clone());

        debug!("[MemoryDocumentService] Created document {}", record.id);
        Ok(record)
    }

    async fn update_document(
        &self,
        id: DocumentId,
        fields: &DocumentFields,
    ) -> Result<DocumentRecord> {
        let mut state = self.state.write().await;
        self.check(&state, ServiceOperation::Update)?;

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("HTTP 404: Document {} not found", id))?;
        fields.apply_to(record);
        Ok(record.clone())
    }

    async fn delete_document(&self, id: DocumentId) -> Result<()> {
        let mut state = self.state.write().await;
        self.check(&state, ServiceOperation::Delete)?;

        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Err(format!("HTTP 404: Document {} not found", id).into());
        }
        Ok(())
    }

    async fn generate_receipt(&self, id: DocumentId) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        self.check(&state, ServiceOperation::Receipt)?;

        let record = state
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("HTTP 404: Document {} not found", id))?;

        // Stand-in for the rendered PDF: the capsule the QR code would carry
        let mut pdf = b"%PDF-1.4\n% ".to_vec();
        pdf.extend_from_slice(capsule::encode(record).as_bytes());
        pdf.extend_from_slice(b"\n%%EOF\n");
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_server_assigned() {
        let service = MemoryDocumentService::new();
        let a = service
            .create_document(&DocumentFields::titled("A"))
            .await
            .unwrap();
        let b = service
            .create_document(&DocumentFields::titled("B").with_department("HR"))
            .await
            .unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.department.as_deref(), Some("HR"));
        assert_eq!(service.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let service = MemoryDocumentService::new();
        let result = service.create_document(&DocumentFields::default()).await;
        assert!(result.is_err());
        assert!(service.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let service = MemoryDocumentService::new();
        service.fail_on(ServiceOperation::List).await;
        assert!(service.list_documents().await.is_err());

        service.recover(ServiceOperation::List).await;
        assert!(service.list_documents().await.is_ok());
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_receipt_embeds_capsule() {
        let service = MemoryDocumentService::new();
        let record = service
            .create_document(&DocumentFields::titled("Deed"))
            .await
            .unwrap();

        let pdf = service.generate_receipt(record.id).await.unwrap();
        let text = String::from_utf8(pdf).unwrap();
        assert!(text.starts_with("%PDF"));
        assert!(text.contains(&capsule::encode(&record)));

        assert!(service.generate_receipt(99).await.is_err());
    }
}
