//! Property-based tests for capsule encoding
//!
//! Any record, with any subset of its optional fields set, must decode back
//! to exactly the capsule it was encoded from.

use archivist_core::capsule::{decode, encode, Capsule};
use archivist_core::{DecodeError, DocumentRecord};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970..2100, with and without sub-second precision
    (0i64..4_102_444_800, prop_oneof![Just(0u32), 0u32..1_000_000_000])
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn optional_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z0-9 \"\\\\/:{}éü-]{0,30}")
}

fn record_strategy() -> impl Strategy<Value = DocumentRecord> {
    (
        (any::<i64>(), "[a-zA-Z0-9]{1}[a-zA-Z0-9 \"{}é]{0,40}"),
        (optional_text(), optional_text(), optional_text()),
        (optional_text(), optional_text(), optional_text(), optional_text()),
        timestamp_strategy(),
    )
        .prop_map(
            |(
                (id, title),
                (description, department, owner_name),
                (owner_contact, shelf_code, box_number, folder_number),
                date_registered,
            )| {
                let mut record = DocumentRecord::new(id, title, date_registered);
                record.description = description;
                record.department = department;
                record.owner_name = owner_name;
                record.owner_contact = owner_contact;
                record.shelf_code = shelf_code;
                record.box_number = box_number;
                record.folder_number = folder_number;
                record
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn encode_then_decode_preserves_every_field(record in record_strategy()) {
        let text = encode(&record);
        let capsule = decode(&text).expect("encoded capsule must decode");

        prop_assert_eq!(&capsule, &Capsule::from(&record));
        prop_assert_eq!(capsule.to_record(), Some(record));
    }

    #[test]
    fn decode_never_panics_on_arbitrary_text(text in ".{0,200}") {
        let _ = decode(&text);
    }

    #[test]
    fn non_object_json_is_malformed(value in prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        "[a-z]{0,10}".prop_map(|s| format!("\"{}\"", s)),
        Just("[]".to_string()),
        Just("true".to_string()),
        Just("null".to_string()),
    ]) {
        let is_malformed = matches!(decode(&value), Err(DecodeError::MalformedPayload { .. }));
        prop_assert!(is_malformed);
    }
}
