//! Roster construction.

use crate::domain::{RegistrationRecord, Roster};
use crate::error::Result;
use crate::invariants::validate_invariants;

/// Build a roster from records in stored (insertion) order.
///
/// The next identifier continues after the highest live one. The result
/// must satisfy every roster invariant.
pub fn create_roster(records: Vec<RegistrationRecord>) -> Result<Roster> {
    let next_id = records.iter().map(|r| r.id).max().unwrap_or(0).saturating_add(1);
    let roster = Roster { records, next_id };
    validate_invariants(&roster)?;
    Ok(roster)
}
