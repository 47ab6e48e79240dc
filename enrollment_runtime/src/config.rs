//! Runtime configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use enrollment_core::capture::lifecycle::DEFAULT_MAX_UPLOAD_BYTES;
use enrollment_core::capture::StreamConstraints;

use crate::error::{Result, RuntimeError};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "studentRegistrations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Directory holding the storage files.
    pub data_dir: PathBuf,
    pub storage_key: String,
    /// Remote endpoint for best-effort submission. `None` disables it.
    pub submit_url: Option<String>,
    pub submit_timeout: Duration,
    pub max_photo_bytes: u64,
    pub capture_width: u32,
    pub capture_height: u32,
    /// Pick-list entries offered before any record uses them.
    pub default_batches: Vec<String>,
    pub default_trainers: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let constraints = StreamConstraints::default();
        Self {
            data_dir: PathBuf::from("./registry-data"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            submit_url: None,
            submit_timeout: Duration::from_secs(10),
            max_photo_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            capture_width: constraints.width,
            capture_height: constraints.height,
            default_batches: Vec::new(),
            default_trainers: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables
    /// take their defaults; malformed numbers are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            data_dir: get("REGISTRY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_key: get("REGISTRY_STORAGE_KEY").unwrap_or(defaults.storage_key),
            submit_url: get("REGISTRY_SUBMIT_URL"),
            submit_timeout: Duration::from_secs(parse_var(
                get("REGISTRY_SUBMIT_TIMEOUT_SECS"),
                "REGISTRY_SUBMIT_TIMEOUT_SECS",
                defaults.submit_timeout.as_secs(),
            )?),
            max_photo_bytes: parse_var(
                get("REGISTRY_MAX_PHOTO_BYTES"),
                "REGISTRY_MAX_PHOTO_BYTES",
                defaults.max_photo_bytes,
            )?,
            capture_width: parse_var(
                get("REGISTRY_CAPTURE_WIDTH"),
                "REGISTRY_CAPTURE_WIDTH",
                defaults.capture_width,
            )?,
            capture_height: parse_var(
                get("REGISTRY_CAPTURE_HEIGHT"),
                "REGISTRY_CAPTURE_HEIGHT",
                defaults.capture_height,
            )?,
            default_batches: get("REGISTRY_BATCHES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            default_trainers: get("REGISTRY_TRAINERS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        })
    }

    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            width: self.capture_width,
            height: self.capture_height,
            ..StreamConstraints::default()
        }
    }
}

fn parse_var<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| RuntimeError::Config(format!("{} has invalid value {:?}", key, v))),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
