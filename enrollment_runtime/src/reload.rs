//! Reload: rebuild the roster from storage.
//!
//! Records are re-validated against every roster invariant on the way in.
//! No cached state is trusted.

use enrollment_core::hashing::canonical_hash;
use enrollment_core::{RegistrationRecord, RegistryEngine};

use crate::error::Result;
use crate::storage::{load_records, KeyValueStore};

/// Rebuild an engine from records in stored order.
///
/// Returns `(engine, canonical_hash)`; the hash is independent of order.
pub fn rebuild_engine(records: Vec<RegistrationRecord>) -> Result<(RegistryEngine, String)> {
    let hash = canonical_hash(&records);
    let engine = RegistryEngine::from_records(records)?;
    Ok((engine, hash))
}

/// Load the list under `key` and rebuild from it.
pub fn reload<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<(RegistryEngine, String)> {
    rebuild_engine(load_records(store, key)?)
}

/// True if what is stored under `key` is the same record set as `expected`,
/// ignoring order.
pub fn verify_round_trip<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    expected: &[RegistrationRecord],
) -> Result<bool> {
    let (_, hash) = reload(store, key)?;
    Ok(hash == canonical_hash(expected))
}
