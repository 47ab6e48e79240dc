//! Session: the explicitly owned application context.
//!
//! A session owns the engine, the storage slot and the optional remote
//! submitter. It is single-threaded; nothing here is shared.
//!
//! Apply-before-persist order for every mutation:
//!   1. engine.apply(event)  (validation, transition, invariants)
//!   2. save the full record list; on failure roll the engine back
//!   3. best-effort remote submission for register/replace

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use enrollment_core::aggregate::{known_batches, known_trainers};
use enrollment_core::events::RosterEvent;
use enrollment_core::hashing::canonical_hash;
use enrollment_core::{
    Aggregates, FilterState, RegistrationDraft, RegistrationRecord, RegistryEngine,
    TransitionOutcome,
};

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::reload;
use crate::remote::{HttpSubmitter, RemoteSubmitter};
use crate::storage::{save_records, FileStore, KeyValueStore};

pub struct Session<S: KeyValueStore> {
    engine: RegistryEngine,
    store: S,
    storage_key: String,
    submitter: Option<Box<dyn RemoteSubmitter>>,
    default_batches: Vec<String>,
    default_trainers: Vec<String>,
}

impl Session<FileStore> {
    /// File-backed session wired from configuration, including the remote
    /// submitter when an endpoint is set.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let store = FileStore::open(&config.data_dir)?;
        let mut session = Session::open(store, &config.storage_key)?.with_defaults(
            config.default_batches.clone(),
            config.default_trainers.clone(),
        );
        if let Some(url) = &config.submit_url {
            session = session.with_submitter(Box::new(HttpSubmitter::new(url, config.submit_timeout)?));
        }
        Ok(session)
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Open a session over `store`, reloading whatever is under `storage_key`.
    pub fn open(store: S, storage_key: &str) -> Result<Self> {
        let (engine, hash) = reload::reload(&store, storage_key)?;
        info!(
            records = engine.records().len(),
            hash = %hash,
            key = storage_key,
            "registry loaded"
        );
        Ok(Self {
            engine,
            store,
            storage_key: storage_key.to_string(),
            submitter: None,
            default_batches: Vec::new(),
            default_trainers: Vec::new(),
        })
    }

    pub fn with_submitter(mut self, submitter: Box<dyn RemoteSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_defaults(mut self, batches: Vec<String>, trainers: Vec<String>) -> Self {
        self.default_batches = batches;
        self.default_trainers = trainers;
        self
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn register(&mut self, draft: RegistrationDraft, now: DateTime<Utc>) -> Result<RegistrationRecord> {
        let outcome = self.commit(&RosterEvent::Register { draft }, now)?;
        let record = outcome.record().clone();
        self.submit_remote(&record);
        Ok(record)
    }

    /// Edit-and-resubmit: overwrite record `id` with `draft`.
    pub fn replace(
        &mut self,
        id: u64,
        draft: RegistrationDraft,
        now: DateTime<Utc>,
    ) -> Result<RegistrationRecord> {
        let outcome = self.commit(&RosterEvent::Replace { id, draft }, now)?;
        let record = outcome.record().clone();
        self.submit_remote(&record);
        Ok(record)
    }

    pub fn delete(&mut self, id: u64, now: DateTime<Utc>) -> Result<RegistrationRecord> {
        let outcome = self.commit(&RosterEvent::Delete { id }, now)?;
        Ok(outcome.record().clone())
    }

    /// Apply to the engine, then persist. A failed write restores the
    /// previous roster so memory and storage never diverge.
    fn commit(&mut self, event: &RosterEvent, now: DateTime<Utc>) -> Result<TransitionOutcome> {
        let (outcome, previous) = self.engine.apply_with_undo(event, now)?;

        if let Err(e) = self.persist() {
            warn!(error = %e, event = event.kind(), "persist failed, rolling back");
            self.engine.restore(previous)?;
            return Err(e);
        }
        Ok(outcome)
    }

    /// Write the full record list to the storage slot.
    pub fn persist(&mut self) -> Result<()> {
        save_records(&mut self.store, &self.storage_key, self.engine.records())
    }

    fn submit_remote(&self, record: &RegistrationRecord) {
        if let Some(submitter) = &self.submitter {
            if let Err(e) = submitter.submit(record) {
                warn!(
                    error = %e,
                    serial = %record.serial_no,
                    "remote submission failed, record kept locally"
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn records(&self) -> &[RegistrationRecord] {
        self.engine.records()
    }

    pub fn get(&self, id: u64) -> Option<&RegistrationRecord> {
        self.engine.roster().get(id)
    }

    pub fn filter(&self, filter: &FilterState) -> Vec<&RegistrationRecord> {
        self.engine.filter(filter)
    }

    pub fn recent(&self, limit: usize) -> Vec<&RegistrationRecord> {
        self.engine.recent(limit)
    }

    pub fn aggregates(&self, today: NaiveDate) -> Aggregates {
        self.engine.aggregates(today)
    }

    pub fn known_batches(&self) -> Vec<String> {
        known_batches(self.engine.roster(), &self.default_batches)
    }

    pub fn known_trainers(&self) -> Vec<String> {
        known_trainers(self.engine.roster(), &self.default_trainers)
    }

    /// Order-independent hash of the live record set.
    pub fn current_hash(&self) -> String {
        canonical_hash(self.engine.records())
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
