//! Registry engine.
//!
//! Stateful wrapper around the pure transition layer. Every event is
//! applied to a clone, checked against the roster invariants, and only
//! then committed.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::aggregate::compute_aggregates;
use crate::domain::{
    Aggregates, FilterState, RegistrationDraft, RegistrationRecord, Roster, TransitionOutcome,
};
use crate::error::Result;
use crate::events::RosterEvent;
use crate::filter::{filter_records, recent};
use crate::invariants::validate_invariants;
use crate::state::create_roster;
use crate::transitions::apply_event as transition_apply;

#[derive(Debug, Clone, Default)]
pub struct RegistryEngine {
    roster: Roster,
}

impl RegistryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine over previously stored records, in stored order.
    pub fn from_records(records: Vec<RegistrationRecord>) -> Result<Self> {
        Ok(Self {
            roster: create_roster(records)?,
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn records(&self) -> &[RegistrationRecord] {
        &self.roster.records
    }

    /// Apply a single event:
    ///   1. Delegate to `transitions::apply_event` (validation + mutation)
    ///   2. Validate invariants on the new roster
    ///   3. Commit and return the outcome
    ///
    /// On any error the engine is left unchanged.
    pub fn apply(&mut self, event: &RosterEvent, now: DateTime<Utc>) -> Result<TransitionOutcome> {
        self.apply_with_undo(event, now).map(|(outcome, _)| outcome)
    }

    /// Like [`apply`](Self::apply), but hands back the roster that was
    /// replaced so the caller can [`restore`](Self::restore) it.
    pub fn apply_with_undo(
        &mut self,
        event: &RosterEvent,
        now: DateTime<Utc>,
    ) -> Result<(TransitionOutcome, Roster)> {
        let (next, outcome) = transition_apply(&self.roster, event, now)?;
        validate_invariants(&next)?;
        let previous = std::mem::replace(&mut self.roster, next);

        let record = outcome.record();
        info!(
            event = event.kind(),
            id = record.id,
            serial = %record.serial_no,
            total = self.roster.len(),
            "roster updated"
        );
        Ok((outcome, previous))
    }

    pub fn register(&mut self, draft: RegistrationDraft, now: DateTime<Utc>) -> Result<RegistrationRecord> {
        let outcome = self.apply(&RosterEvent::Register { draft }, now)?;
        Ok(outcome.record().clone())
    }

    pub fn replace(
        &mut self,
        id: u64,
        draft: RegistrationDraft,
        now: DateTime<Utc>,
    ) -> Result<RegistrationRecord> {
        let outcome = self.apply(&RosterEvent::Replace { id, draft }, now)?;
        Ok(outcome.record().clone())
    }

    pub fn delete(&mut self, id: u64, now: DateTime<Utc>) -> Result<RegistrationRecord> {
        let outcome = self.apply(&RosterEvent::Delete { id }, now)?;
        Ok(outcome.record().clone())
    }

    /// Swap in a previously captured roster, e.g. to undo a commit whose
    /// persistence failed.
    pub fn restore(&mut self, roster: Roster) -> Result<()> {
        validate_invariants(&roster)?;
        self.roster = roster;
        Ok(())
    }

    pub fn filter(&self, filter: &FilterState) -> Vec<&RegistrationRecord> {
        filter_records(&self.roster, filter)
    }

    pub fn recent(&self, limit: usize) -> Vec<&RegistrationRecord> {
        recent(&self.roster, limit)
    }

    pub fn aggregates(&self, today: NaiveDate) -> Aggregates {
        compute_aggregates(&self.roster, today)
    }
}
