//! Canonical hashing of a record set.
//!
//! Deterministic serialization + SHA-256, independent of insertion order.
//!
//! Rules:
//!   - Records sorted by id
//!   - Fields in the stored order: serialNo, date, candidateName, contactNo,
//!     batchId, trainer, photo, timestamp, id
//!   - UTF-8 JSON, no whitespace
//!   - The identifier allocator is not part of the hash; only live records are

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::RegistrationRecord;

/// Canonical serialization of a record set to UTF-8 JSON bytes.
pub fn canonical_serialize(records: &[RegistrationRecord]) -> Vec<u8> {
    let value = build_canonical_value(records);
    serde_json::to_vec(&value).expect("canonical_serialize: JSON serialization failed")
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(records: &[RegistrationRecord]) -> String {
    let digest = Sha256::digest(canonical_serialize(records));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn build_canonical_value(records: &[RegistrationRecord]) -> Value {
    let mut sorted: Vec<&RegistrationRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.id);

    let list = sorted
        .into_iter()
        .map(|r| {
            let mut m = Map::new();
            m.insert("serialNo".to_string(), Value::String(r.serial_no.clone()));
            m.insert("date".to_string(), Value::String(r.date.to_string()));
            m.insert(
                "candidateName".to_string(),
                Value::String(r.candidate_name.clone()),
            );
            m.insert("contactNo".to_string(), Value::String(r.contact_no.clone()));
            m.insert("batchId".to_string(), Value::String(r.batch_id.clone()));
            m.insert("trainer".to_string(), Value::String(r.trainer.clone()));
            m.insert("photo".to_string(), Value::String(r.photo.clone()));
            m.insert(
                "timestamp".to_string(),
                Value::Number(r.timestamp.timestamp_millis().into()),
            );
            m.insert("id".to_string(), Value::Number(r.id.into()));
            Value::Object(m)
        })
        .collect();

    Value::Array(list)
}
