use archivist_api::{DocumentId, DocumentRecord};
use std::collections::HashSet;
use tracing::warn;

/// Documents as last fetched from the remote service
///
/// Keeps fetch order and holds each id at most once. Only the
/// `CollectionSynchronizer` replaces it; everything else reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    records: Vec<DocumentRecord>,
}

impl Collection {
    /// Build from a fetch result. A repeated id keeps its first occurrence.
    pub fn from_fetch(records: Vec<DocumentRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let total = records.len();
        let records: Vec<DocumentRecord> = records
            .into_iter()
            .filter(|record| seen.insert(record.id))
            .collect();

        if records.len() != total {
            warn!(
                "[Collection] Dropped {} duplicate document(s) from fetch",
                total - records.len()
            );
        }

        Self { records }
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&DocumentRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.get(id).is_some()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a DocumentRecord;
    type IntoIter = std::slice::Iter<'a, DocumentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
