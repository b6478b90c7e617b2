//! Check-in storage.
//!
//! [`CheckInStore`] is the single interface the rest of the crate uses to
//! append, list and clear check-ins. Two implementations exist:
//!
//! - [`SqliteStore`]: a durable named list plus a named sequence counter kept
//!   in a `SQLite` database. Safe for several processes sharing one file.
//! - [`MemoryStore`]: a process-local list, mainly for development and tests.
//!
//! The backend is picked once, from configuration, by [`open_store`].

mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::checkin::{CheckIn, CheckInInput};
use crate::config::{Config, StorageBackend};
use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Append-only storage for check-in records.
#[async_trait]
pub trait CheckInStore: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn backend(&self) -> StorageBackend;

    /// Database file backing the store, if it has one.
    fn database_path(&self) -> Option<&Path> {
        None
    }

    /// Append a check-in and return the stored record.
    ///
    /// The sequence number comes from an atomic increment of the store's
    /// counter, so concurrent appends never share or skip a number.
    /// `received_at` is set to now, and so is `submitted_at` when the input
    /// has none.
    async fn append(&self, input: CheckInInput) -> Result<CheckIn>;

    /// Every stored record, newest `submitted_at` first.
    ///
    /// Records with equal `submitted_at` stay in insertion order.
    async fn list_all(&self) -> Result<Vec<CheckIn>>;

    /// Remove every record and reset the counter. Returns how many were
    /// removed.
    async fn clear_all(&self) -> Result<usize>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;
}

/// Construct the store selected by `config.storage.backend`.
///
/// # Errors
///
/// Returns an error if the `SQLite` database cannot be opened.
pub fn open_store(config: &Config) -> Result<Arc<dyn CheckInStore>> {
    let keys = StoreKeys::from_config(config);
    match config.storage.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::open(
            config.database_path(),
            keys,
        )?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Names of the list and counter a store writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Key of the check-in list.
    pub list: String,
    /// Key of the sequence counter.
    pub counter: String,
}

impl StoreKeys {
    /// Keys from the storage configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            list: config.storage.list_key.clone(),
            counter: config.storage.counter_key.clone(),
        }
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            list: "alerts".to_string(),
            counter: "alert_count".to_string(),
        }
    }
}
