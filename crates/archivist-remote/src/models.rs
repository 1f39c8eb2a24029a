use archivist_api::{DocumentFields, DocumentRecord};
use serde::{Deserialize, Serialize};

/// Body of create and update requests
///
/// The archive server spells the category key `departement`. Unset fields are
/// omitted so an update only touches what was given.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,

    #[serde(rename = "departement", skip_serializing_if = "Option::is_none")]
    pub department: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_code: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_number: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_number: Option<&'a str>,
}

impl<'a> From<&'a DocumentFields> for DocumentPayload<'a> {
    fn from(fields: &'a DocumentFields) -> Self {
        Self {
            title: fields.title.as_deref(),
            description: fields.description.as_deref(),
            department: fields.department.as_deref(),
            owner_name: fields.owner_name.as_deref(),
            owner_contact: fields.owner_contact.as_deref(),
            shelf_code: fields.shelf_code.as_deref(),
            box_number: fields.box_number.as_deref(),
            folder_number: fields.folder_number.as_deref(),
        }
    }
}

/// `GET /documents`
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
}

/// `GET /documents/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentResponse {
    pub document: DocumentRecord,
}

/// `GET /documents/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub count: usize,
}

/// Acknowledgement returned by `DELETE /documents/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
