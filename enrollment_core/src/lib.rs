#![forbid(unsafe_code)]

//! Registration roster domain.
//!
//! Pure, synchronous logic for the student registration desk: record
//! validation, roster transitions and invariants, filtered views,
//! aggregates, canonical hashing, and the photo capture lifecycle.
//! Persistence and I/O wiring live in `enrollment_runtime`.

pub mod error;
pub mod domain;
pub mod validation;
pub mod events;
pub mod state;
pub mod transitions;
pub mod invariants;
pub mod filter;
pub mod aggregate;
pub mod hashing;
pub mod engine;
pub mod capture;

pub use domain::{
    Aggregates, FilterState, RegistrationDraft, RegistrationRecord, Roster, TransitionOutcome,
};
pub use engine::RegistryEngine;
pub use error::{RegistryError, Result};
