//! Roster invariant checks.
//!
//! Run after every transition and on reload. Returns the first failure as
//! `RegistryError::Invariant`.

use std::collections::BTreeSet;

use crate::capture::data_uri::{header_mime, is_image_mime};
use crate::domain::Roster;
use crate::error::{RegistryError, Result};
use crate::validation::CONTACT_DIGITS;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn validate_invariants(roster: &Roster) -> Result<()> {
    check_serial_present(roster)?;
    check_unique_serials(roster)?;
    check_unique_ids(roster)?;
    check_next_id(roster)?;
    check_contact_format(roster)?;
    check_photo_payloads(roster)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_serial_present(roster: &Roster) -> Result<()> {
    if let Some(r) = roster.records.iter().find(|r| r.serial_no.trim().is_empty()) {
        return Err(RegistryError::Invariant(format!(
            "[serial_present] record {} has an empty serial number",
            r.id
        )));
    }
    Ok(())
}

/// Serial numbers are unique case-insensitively.
fn check_unique_serials(roster: &Roster) -> Result<()> {
    let mut seen = BTreeSet::new();
    for r in &roster.records {
        if !seen.insert(r.serial_key()) {
            return Err(RegistryError::Invariant(format!(
                "[unique_serial] serial {:?} appears more than once",
                r.serial_no
            )));
        }
    }
    Ok(())
}

fn check_unique_ids(roster: &Roster) -> Result<()> {
    let mut seen = BTreeSet::new();
    for r in &roster.records {
        if r.id == 0 {
            return Err(RegistryError::Invariant(
                "[unique_id] identifier 0 is reserved".to_string(),
            ));
        }
        if !seen.insert(r.id) {
            return Err(RegistryError::Invariant(format!(
                "[unique_id] identifier {} appears more than once",
                r.id
            )));
        }
    }
    Ok(())
}

/// The allocator must never hand out a live identifier.
fn check_next_id(roster: &Roster) -> Result<()> {
    if let Some(max) = roster.records.iter().map(|r| r.id).max() {
        if roster.next_id <= max {
            return Err(RegistryError::Invariant(format!(
                "[next_id] next identifier {} does not exceed live identifier {}",
                roster.next_id, max
            )));
        }
    }
    Ok(())
}

fn check_contact_format(roster: &Roster) -> Result<()> {
    for r in &roster.records {
        let ok = r.contact_no.len() == CONTACT_DIGITS
            && r.contact_no.bytes().all(|b| b.is_ascii_digit());
        if !ok {
            return Err(RegistryError::Invariant(format!(
                "[contact_format] record {} has contact {:?}, expected {} digits",
                r.id, r.contact_no, CONTACT_DIGITS
            )));
        }
    }
    Ok(())
}

/// Header only. Payloads are decoded once, when a draft is validated.
fn check_photo_payloads(roster: &Roster) -> Result<()> {
    for r in roster.records.iter().filter(|r| r.has_photo()) {
        let is_image = header_mime(&r.photo).map(is_image_mime).unwrap_or(false);
        if !is_image {
            return Err(RegistryError::Invariant(format!(
                "[photo_payload] record {} photo is not an image data URI",
                r.id
            )));
        }
    }
    Ok(())
}
