//! Capsule codec
//!
//! A capsule is the JSON snapshot of a document printed as a QR code on its
//! receipt. It is self-contained: decoding never touches the network.
//!
//! Wire format: a flat object with the keys below. Absent keys and `null`
//! values both mean "no value". Unknown keys are ignored, so any producer
//! that writes at least `id` and `title` is understood.

use archivist_api::{timestamp, DecodeError, DocumentId, DocumentRecord};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const KEY_ID: &str = "id";
pub const KEY_TITLE: &str = "title";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_DEPARTMENT: &str = "department";
pub const KEY_OWNER_NAME: &str = "owner_name";
pub const KEY_OWNER_CONTACT: &str = "owner_contact";
pub const KEY_SHELF_CODE: &str = "shelf_code";
pub const KEY_BOX_NUMBER: &str = "box_number";
pub const KEY_FOLDER_NUMBER: &str = "folder_number";
pub const KEY_DATE_REGISTERED: &str = "date_registered";

/// Spelling used on receipts printed by older archive servers
const LEGACY_KEY_DEPARTMENT: &str = "departement";

/// Document snapshot carried by a QR code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capsule {
    pub id: DocumentId,
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub owner_name: Option<String>,
    pub owner_contact: Option<String>,
    pub shelf_code: Option<String>,
    pub box_number: Option<String>,
    pub folder_number: Option<String>,
    pub date_registered: Option<DateTime<Utc>>,
}

impl From<&DocumentRecord> for Capsule {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            department: record.department.clone(),
            owner_name: record.owner_name.clone(),
            owner_contact: record.owner_contact.clone(),
            shelf_code: record.shelf_code.clone(),
            box_number: record.box_number.clone(),
            folder_number: record.folder_number.clone(),
            date_registered: Some(record.date_registered),
        }
    }
}

impl Capsule {
    /// Rebuild the full record. `None` when the capsule carries no registration date.
    pub fn to_record(&self) -> Option<DocumentRecord> {
        let date_registered = self.date_registered?;
        Some(DocumentRecord {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            department: self.department.clone(),
            owner_name: self.owner_name.clone(),
            owner_contact: self.owner_contact.clone(),
            shelf_code: self.shelf_code.clone(),
            box_number: self.box_number.clone(),
            folder_number: self.folder_number.clone(),
            date_registered,
        })
    }

    fn optional_text_fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (KEY_DESCRIPTION, self.description.as_deref()),
            (KEY_DEPARTMENT, self.department.as_deref()),
            (KEY_OWNER_NAME, self.owner_name.as_deref()),
            (KEY_OWNER_CONTACT, self.owner_contact.as_deref()),
            (KEY_SHELF_CODE, self.shelf_code.as_deref()),
            (KEY_BOX_NUMBER, self.box_number.as_deref()),
            (KEY_FOLDER_NUMBER, self.folder_number.as_deref()),
        ]
    }
}

/// Encode a record as capsule text
pub fn encode(record: &DocumentRecord) -> String {
    encode_capsule(&Capsule::from(record))
}

/// Encode a capsule. Missing optional fields are written as explicit `null`.
pub fn encode_capsule(capsule: &Capsule) -> String {
    let mut map = Map::new();
    map.insert(KEY_ID.to_string(), Value::from(capsule.id));
    map.insert(KEY_TITLE.to_string(), Value::from(capsule.title.as_str()));
    for (key, value) in capsule.optional_text_fields() {
        map.insert(key.to_string(), value.map_or(Value::Null, Value::from));
    }
    map.insert(
        KEY_DATE_REGISTERED.to_string(),
        capsule
            .date_registered
            .map_or(Value::Null, |ts| Value::String(timestamp::format(&ts))),
    );
    Value::Object(map).to_string()
}

/// Decode capsule text
pub fn decode(text: &str) -> Result<Capsule, DecodeError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| DecodeError::malformed(e.to_string()))?;

    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::malformed(format!(
                "expected an object, found {}",
                kind_of(&other)
            )))
        }
    };

    let id = match present(&map, KEY_ID) {
        Some(value) => parse_id(value)?,
        None => return Err(DecodeError::MissingRequiredField { field: KEY_ID }),
    };

    let title = match present(&map, KEY_TITLE) {
        Some(value) => text_of(value, KEY_TITLE)?,
        None => return Err(DecodeError::MissingRequiredField { field: KEY_TITLE }),
    };
    if title.trim().is_empty() {
        return Err(DecodeError::MissingRequiredField { field: KEY_TITLE });
    }

    let department = match optional_text(&map, KEY_DEPARTMENT)? {
        Some(department) => Some(department),
        None => optional_text(&map, LEGACY_KEY_DEPARTMENT)?,
    };

    let date_registered = match present(&map, KEY_DATE_REGISTERED) {
        None => None,
        Some(Value::String(text)) => Some(timestamp::parse(text).ok_or_else(|| {
            DecodeError::malformed(format!("invalid {} '{}'", KEY_DATE_REGISTERED, text))
        })?),
        Some(other) => {
            return Err(DecodeError::malformed(format!(
                "{} must be a string, found {}",
                KEY_DATE_REGISTERED,
                kind_of(other)
            )))
        }
    };

    Ok(Capsule {
        id,
        title,
        description: optional_text(&map, KEY_DESCRIPTION)?,
        department,
        owner_name: optional_text(&map, KEY_OWNER_NAME)?,
        owner_contact: optional_text(&map, KEY_OWNER_CONTACT)?,
        shelf_code: optional_text(&map, KEY_SHELF_CODE)?,
        box_number: optional_text(&map, KEY_BOX_NUMBER)?,
        folder_number: optional_text(&map, KEY_FOLDER_NUMBER)?,
        date_registered,
    })
}

/// Value under `key`, treating `null` like a missing key
fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn parse_id(value: &Value) -> Result<DocumentId, DecodeError> {
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_integral_id(*f)).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<DocumentId>().ok(),
        _ => None,
    };
    id.ok_or_else(|| DecodeError::malformed(format!("{} is not an integer: {}", KEY_ID, value)))
}

/// Whole and within `i64`. `i64::MAX as f64` is 2^63, so the upper bound is open.
fn is_integral_id(f: f64) -> bool {
    f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f)
}

fn text_of(value: &Value, key: &str) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        // Box and folder numbers are often typed as numbers by other encoders
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DecodeError::malformed(format!(
            "{} must be text, found {}",
            key,
            kind_of(other)
        ))),
    }
}

fn optional_text(map: &Map<String, Value>, key: &str) -> Result<Option<String>, DecodeError> {
    present(map, key).map(|v| text_of(v, key)).transpose()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
