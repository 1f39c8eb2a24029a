use archivist_api::DocumentId;

/// A rendered PDF receipt for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub document_id: DocumentId,
    pub file_name: String,
    pub pdf: Vec<u8>,
    /// Capsule text the receipt's QR code should hold, when the document was in the local collection
    pub capsule: Option<String>,
}

impl Receipt {
    pub fn file_name_for(id: DocumentId) -> String {
        format!("document_receipt_{}.pdf", id)
    }
}
