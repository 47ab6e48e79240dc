//! Registration roster: core domain types.
//!
//! Pure data. No transition logic lives here.
//! Field names serialize in camelCase to match the stored record layout.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Core Domain Types ──────────────────────────────────────────────

/// One submitted registration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistrationRecord {
    pub serial_no: String,
    pub date: NaiveDate,
    pub candidate_name: String,
    pub contact_no: String, // exactly 10 ASCII digits
    pub batch_id: String,
    pub trainer: String,
    #[serde(default)]
    pub photo: String, // data URI or empty
    pub timestamp: DateTime<Utc>,
    pub id: u64,
}

impl RegistrationRecord {
    pub fn has_photo(&self) -> bool {
        !self.photo.is_empty()
    }

    /// Case-insensitive serial comparison key.
    pub fn serial_key(&self) -> String {
        serial_key(&self.serial_no)
    }
}

/// Normalized form used for serial uniqueness.
pub fn serial_key(serial: &str) -> String {
    serial.trim().to_lowercase()
}

/// Raw form input before validation. Every field is free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    /// Blank means "generate one".
    pub serial_no: String,
    pub date: String,
    pub candidate_name: String,
    pub contact_no: String,
    pub batch_id: String,
    pub trainer: String,
    pub photo: String,
}

/// A draft that passed validation. Identity and timestamp are assigned by
/// the transition that stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub serial_no: Option<String>,
    pub date: NaiveDate,
    pub candidate_name: String,
    pub contact_no: String,
    pub batch_id: String,
    pub trainer: String,
    pub photo: String,
}

/// The live record set in insertion order, plus the identifier allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub records: Vec<RegistrationRecord>,
    pub next_id: u64,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

impl Roster {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&RegistrationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Record whose serial matches case-insensitively.
    pub fn find_serial(&self, serial: &str) -> Option<&RegistrationRecord> {
        let key = serial_key(serial);
        self.records.iter().find(|r| r.serial_key() == key)
    }
}

/// Independent filter bounds, combined with logical AND.
/// `None` or an empty string disables a bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub trainer: Option<String>,
    pub batch: Option<String>,
}

impl FilterState {
    /// Both bounds set to the same day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            date_from: Some(day),
            date_to: Some(day),
            ..Default::default()
        }
    }
}

/// Counts derived on demand from the current roster. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub total: usize,
    pub distinct_trainers: usize,
    pub distinct_batches: usize,
    pub today: usize,
    pub per_batch: BTreeMap<String, usize>,
    /// Keyed by `YYYY-MM`.
    pub per_month: BTreeMap<String, usize>,
}

/// Outcome of a roster transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Added(RegistrationRecord),
    Replaced {
        previous: RegistrationRecord,
        current: RegistrationRecord,
    },
    Deleted(RegistrationRecord),
}

impl TransitionOutcome {
    /// The record the transition produced or removed.
    pub fn record(&self) -> &RegistrationRecord {
        match self {
            TransitionOutcome::Added(r) | TransitionOutcome::Deleted(r) => r,
            TransitionOutcome::Replaced { current, .. } => current,
        }
    }
}
