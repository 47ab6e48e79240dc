//! Centralized transition logic.
//!
//! All roster mutation lives here. The input roster is never mutated;
//! a clone is made first and returned only if the transition succeeds.

use chrono::{DateTime, Utc};

use crate::domain::{
    serial_key, RegistrationRecord, Roster, TransitionOutcome, ValidatedRegistration,
};
use crate::error::{RegistryError, Result};
use crate::events::RosterEvent;
use crate::validation::{generate_serial, validate_draft};

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `event` to `roster` at time `now` and return `(new_roster, outcome)`.
pub fn apply_event(
    roster: &Roster,
    event: &RosterEvent,
    now: DateTime<Utc>,
) -> Result<(Roster, TransitionOutcome)> {
    let mut next = roster.clone();

    let outcome = match event {
        RosterEvent::Register { draft } => {
            let registration = validate_draft(draft)?;
            apply_register(&mut next, registration, now)?
        }
        RosterEvent::Replace { id, draft } => {
            let registration = validate_draft(draft)?;
            apply_replace(&mut next, *id, registration, now)?
        }
        RosterEvent::Delete { id } => apply_delete(&mut next, *id)?,
    };

    Ok((next, outcome))
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn apply_register(
    roster: &mut Roster,
    registration: ValidatedRegistration,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome> {
    let serial = match registration.serial_no.clone() {
        Some(serial) => {
            ensure_serial_free(roster, &serial, None)?;
            serial
        }
        None => free_generated_serial(roster, now),
    };

    let id = roster.next_id;
    roster.next_id = id.checked_add(1).ok_or_else(|| {
        RegistryError::Invariant("record identifier space exhausted".to_string())
    })?;

    let record = build_record(id, serial, registration, now);
    roster.records.push(record.clone());
    Ok(TransitionOutcome::Added(record))
}

fn apply_replace(
    roster: &mut Roster,
    id: u64,
    registration: ValidatedRegistration,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome> {
    let pos = roster
        .position(id)
        .ok_or(RegistryError::RecordNotFound(id))?;

    // A blank serial on resubmission keeps the existing one.
    let serial = registration
        .serial_no
        .clone()
        .unwrap_or_else(|| roster.records[pos].serial_no.clone());
    ensure_serial_free(roster, &serial, Some(id))?;

    let current = build_record(id, serial, registration, now);
    let previous = std::mem::replace(&mut roster.records[pos], current.clone());
    Ok(TransitionOutcome::Replaced { previous, current })
}

fn apply_delete(roster: &mut Roster, id: u64) -> Result<TransitionOutcome> {
    let pos = roster
        .position(id)
        .ok_or(RegistryError::RecordNotFound(id))?;
    // Vec::remove shifts the tail, keeping survivors in relative order.
    let removed = roster.records.remove(pos);
    Ok(TransitionOutcome::Deleted(removed))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject `serial` if any record other than `except` already holds it,
/// compared case-insensitively.
fn ensure_serial_free(roster: &Roster, serial: &str, except: Option<u64>) -> Result<()> {
    let key = serial_key(serial);
    let taken = roster
        .records
        .iter()
        .any(|r| Some(r.id) != except && r.serial_key() == key);
    if taken {
        return Err(RegistryError::DuplicateSerial(serial.to_string()));
    }
    Ok(())
}

fn serial_taken(roster: &Roster, serial: &str) -> bool {
    let key = serial_key(serial);
    roster.records.iter().any(|r| r.serial_key() == key)
}

/// Generated serial for `now`, suffixed `-2`, `-3`, ... when an earlier
/// registration in the same millisecond already holds it.
fn free_generated_serial(roster: &Roster, now: DateTime<Utc>) -> String {
    let base = generate_serial(now);
    if !serial_taken(roster, &base) {
        return base;
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !serial_taken(roster, candidate))
        .unwrap_or(base)
}

fn build_record(
    id: u64,
    serial_no: String,
    registration: ValidatedRegistration,
    now: DateTime<Utc>,
) -> RegistrationRecord {
    RegistrationRecord {
        serial_no,
        date: registration.date,
        candidate_name: registration.candidate_name,
        contact_no: registration.contact_no,
        batch_id: registration.batch_id,
        trainer: registration.trainer,
        photo: registration.photo,
        timestamp: now,
        id,
    }
}
