#![forbid(unsafe_code)]

//! Registration runtime.
//!
//! Wraps the `enrollment_core` roster with storage, reload, configuration,
//! logging and best-effort remote submission.
//!
//! No domain rules live here; validation, transitions and invariants
//! are delegated to the core.

pub mod error;
pub mod config;
pub mod logging;
pub mod storage;
pub mod reload;
pub mod remote;
pub mod session;

pub use config::RegistryConfig;
pub use error::{Result, RuntimeError};
pub use session::Session;
