use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned document identifier
pub type DocumentId = i64;

/// Treat absent and blank text the same way: both carry no value.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Present location tokens joined as `shelf - box - folder`, or `No location`
pub fn location_line(
    shelf: Option<&str>,
    box_number: Option<&str>,
    folder: Option<&str>,
) -> String {
    let parts: Vec<&str> = [shelf, box_number, folder]
        .into_iter()
        .filter_map(non_empty)
        .collect();

    if parts.is_empty() {
        "No location".to_string()
    } else {
        parts.join(" - ")
    }
}

/// A physical document registered in the archive.
///
/// `id` and `date_registered` are assigned by the server and never change.
/// `title` is always present; every other field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form category used for faceting
    #[serde(default, alias = "departement")]
    pub department: Option<String>,

    #[serde(default)]
    pub owner_name: Option<String>,

    #[serde(default)]
    pub owner_contact: Option<String>,

    #[serde(default)]
    pub shelf_code: Option<String>,

    #[serde(default)]
    pub box_number: Option<String>,

    #[serde(default)]
    pub folder_number: Option<String>,

    #[serde(with = "crate::timestamp")]
    pub date_registered: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(id: DocumentId, title: impl Into<String>, date_registered: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            department: None,
            owner_name: None,
            owner_contact: None,
            shelf_code: None,
            box_number: None,
            folder_number: None,
            date_registered,
        }
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn department(&self) -> Option<&str> {
        non_empty(self.department.as_deref())
    }

    pub fn owner_name(&self) -> Option<&str> {
        non_empty(self.owner_name.as_deref())
    }

    pub fn owner_contact(&self) -> Option<&str> {
        non_empty(self.owner_contact.as_deref())
    }

    /// Storage location as `shelf - box - folder`, skipping missing parts
    pub fn location_line(&self) -> String {
        location_line(
            self.shelf_code.as_deref(),
            self.box_number.as_deref(),
            self.folder_number.as_deref(),
        )
    }
}

/// Editable fields of a document.
///
/// Used as the body of create and update requests. A `None` field is left
/// unset: create omits it and update keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_number: Option<String>,
}

impl DocumentFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Prefill from an existing record, the way an edit form starts out
    pub fn from_record(record: &DocumentRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            description: record.description.clone(),
            department: record.department.clone(),
            owner_name: record.owner_name.clone(),
            owner_contact: record.owner_contact.clone(),
            shelf_code: record.shelf_code.clone(),
            box_number: record.box_number.clone(),
            folder_number: record.folder_number.clone(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    pub fn with_owner_contact(mut self, owner_contact: impl Into<String>) -> Self {
        self.owner_contact = Some(owner_contact.into());
        self
    }

    pub fn with_location(
        mut self,
        shelf_code: Option<String>,
        box_number: Option<String>,
        folder_number: Option<String>,
    ) -> Self {
        self.shelf_code = shelf_code.or(self.shelf_code);
        self.box_number = box_number.or(self.box_number);
        self.folder_number = folder_number.or(self.folder_number);
        self
    }

    /// The title, if one is set and not blank
    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    /// True when no field is set at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields of `record` that are set here
    pub fn apply_to(&self, record: &mut DocumentRecord) {
        fn set(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        set(&mut record.description, &self.description);
        set(&mut record.department, &self.department);
        set(&mut record.owner_name, &self.owner_name);
        set(&mut record.owner_contact, &self.owner_contact);
        set(&mut record.shelf_code, &self.shelf_code);
        set(&mut record.box_number, &self.box_number);
        set(&mut record.folder_number, &self.folder_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registered() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_blank_fields_have_no_value() {
        let mut record = DocumentRecord::new(1, "Lease", registered());
        record.description = Some("   ".to_string());
        record.department = Some(String::new());

        assert_eq!(record.description(), None);
        assert_eq!(record.department(), None);
        assert_eq!(record.owner_name(), None);
    }

    #[test]
    fn test_location_line() {
        let mut record = DocumentRecord::new(1, "Lease", registered());
        assert_eq!(record.location_line(), "No location");

        record.shelf_code = Some("A3".to_string());
        record.folder_number = Some("12".to_string());
        assert_eq!(record.location_line(), "A3 - 12");

        record.box_number = Some("7".to_string());
        assert_eq!(record.location_line(), "A3 - 7 - 12");
    }

    #[test]
    fn test_server_json_with_legacy_department_key() {
        let json = r#"{
            "id": 4,
            "title": "Payroll 2023",
            "description": null,
            "departement": "HR",
            "owner_name": "J. Doe",
            "owner_contact": null,
            "shelf_code": "B1",
            "box_number": null,
            "folder_number": null,
            "date_registered": "2024-03-01T09:30:00"
        }"#;

        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 4);
        assert_eq!(record.department.as_deref(), Some("HR"));
        assert_eq!(record.description, None);
        assert_eq!(record.date_registered, registered());
    }

    #[test]
    fn test_fields_skip_unset_on_the_wire() {
        let fields = DocumentFields::titled("Invoice").with_department("Finance");
        let json = serde_json::to_value(&fields).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "title": "Invoice", "department": "Finance" })
        );
    }

    #[test]
    fn test_apply_patch_keeps_unset_fields() {
        let mut record = DocumentRecord::new(9, "Old title", registered());
        record.owner_name = Some("Alice".to_string());

        let patch = DocumentFields::titled("New title").with_department("Legal");
        patch.apply_to(&mut record);

        assert_eq!(record.title, "New title");
        assert_eq!(record.department.as_deref(), Some("Legal"));
        assert_eq!(record.owner_name.as_deref(), Some("Alice"));
        assert_eq!(record.id, 9);
    }

    #[test]
    fn test_title_validation() {
        assert_eq!(DocumentFields::default().title(), None);
        assert_eq!(DocumentFields::titled("  ").title(), None);
        assert_eq!(DocumentFields::titled("Deed").title(), Some("Deed"));
        assert!(DocumentFields::default().is_empty());
        assert!(!DocumentFields::titled("Deed").is_empty());
    }
}
