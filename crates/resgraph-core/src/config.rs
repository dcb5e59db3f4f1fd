//! # Store Configuration
//!
//! Tuning for the binary medium behind a recording session.
//! The core only defines the shape; the app layer reads it from TOML.

use crate::primitives::DEFAULT_SPILL_THRESHOLD;
use crate::storage::SpillStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and when a result store leaves memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Buffered bytes after which records move to a temporary file.
    /// `0` spills on the first record.
    pub spill_threshold_bytes: u64,
    /// Directory for spill files. Defaults to the system temp directory.
    pub spill_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            spill_threshold_bytes: DEFAULT_SPILL_THRESHOLD,
            spill_dir: None,
        }
    }
}

impl StoreConfig {
    /// Never spill.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            spill_threshold_bytes: u64::MAX,
            spill_dir: None,
        }
    }

    /// Spill on the first record.
    #[must_use]
    pub fn always_spill() -> Self {
        Self {
            spill_threshold_bytes: 0,
            spill_dir: None,
        }
    }

    /// Open a fresh store for one resolution session.
    #[must_use]
    pub fn open_store(&self) -> SpillStore {
        SpillStore::new(self.clone())
    }
}
