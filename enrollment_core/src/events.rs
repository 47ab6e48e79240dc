//! Roster events.
//!
//! Events are pure data. They carry intent and payload only;
//! every mutation rule lives in `transitions`.

use serde::{Deserialize, Serialize};

use crate::domain::RegistrationDraft;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterEvent {
    /// Submit a new registration.
    Register { draft: RegistrationDraft },
    /// Edit-and-resubmit: full overwrite of an existing record.
    Replace { id: u64, draft: RegistrationDraft },
    Delete { id: u64 },
}

impl RosterEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RosterEvent::Register { .. } => "register",
            RosterEvent::Replace { .. } => "replace",
            RosterEvent::Delete { .. } => "delete",
        }
    }
}
