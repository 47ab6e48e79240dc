//! Aggregate counts and pick lists derived from the roster.
//!
//! Nothing here is cached; every call recomputes from the live records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{Aggregates, Roster};

pub fn compute_aggregates(roster: &Roster, today: NaiveDate) -> Aggregates {
    let mut trainers: BTreeSet<&str> = BTreeSet::new();
    let mut per_batch: BTreeMap<String, usize> = BTreeMap::new();
    let mut per_month: BTreeMap<String, usize> = BTreeMap::new();
    let mut today_count = 0;

    for r in &roster.records {
        trainers.insert(r.trainer.as_str());
        *per_batch.entry(r.batch_id.clone()).or_default() += 1;
        *per_month
            .entry(r.date.format("%Y-%m").to_string())
            .or_default() += 1;
        if r.date == today {
            today_count += 1;
        }
    }

    Aggregates {
        total: roster.records.len(),
        distinct_trainers: trainers.len(),
        distinct_batches: per_batch.len(),
        today: today_count,
        per_batch,
        per_month,
    }
}

/// Sorted, de-duplicated batch identifiers: configured defaults plus every
/// batch seen in the roster.
pub fn known_batches(roster: &Roster, defaults: &[String]) -> Vec<String> {
    merge_options(defaults, roster.records.iter().map(|r| r.batch_id.as_str()))
}

/// Sorted, de-duplicated trainer names, as for [`known_batches`].
pub fn known_trainers(roster: &Roster, defaults: &[String]) -> Vec<String> {
    merge_options(defaults, roster.records.iter().map(|r| r.trainer.as_str()))
}

fn merge_options<'a>(defaults: &'a [String], seen: impl Iterator<Item = &'a str>) -> Vec<String> {
    defaults
        .iter()
        .map(String::as_str)
        .chain(seen)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
