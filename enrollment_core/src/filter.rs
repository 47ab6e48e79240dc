//! Derived views over the roster.
//!
//! Pure functions. Results borrow from the roster and are ordered
//! most-recent-first, i.e. reverse insertion order.

use crate::domain::{FilterState, RegistrationRecord, Roster};

/// Records matching every active bound of `filter`.
///
/// Date bounds are inclusive whole days. Trainer and batch match exactly
/// when set and non-empty.
pub fn filter_records<'a>(roster: &'a Roster, filter: &FilterState) -> Vec<&'a RegistrationRecord> {
    let trainer = active_text(&filter.trainer);
    let batch = active_text(&filter.batch);

    roster
        .records
        .iter()
        .rev()
        .filter(|r| filter.date_from.map_or(true, |from| r.date >= from))
        .filter(|r| filter.date_to.map_or(true, |to| r.date <= to))
        .filter(|r| trainer.map_or(true, |t| r.trainer == t))
        .filter(|r| batch.map_or(true, |b| r.batch_id == b))
        .collect()
}

/// The `limit` most recently inserted records.
pub fn recent(roster: &Roster, limit: usize) -> Vec<&RegistrationRecord> {
    roster.records.iter().rev().take(limit).collect()
}

fn active_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
