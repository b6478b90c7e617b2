//! Process-local check-in store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::CheckInStore;
use crate::checkin::{sort_newest_first, CheckIn, CheckInInput};
use crate::config::StorageBackend;
use crate::error::Result;

#[derive(Debug, Default)]
struct State {
    records: Vec<CheckIn>,
    counter: u64,
}

/// In-memory check-in store. Contents are lost when the process exits.
///
/// The counter and the list are updated under one lock, so sequence numbers
/// stay unique across tasks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckInStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn append(&self, input: CheckInInput) -> Result<CheckIn> {
        let mut state = self.state.lock().await;
        state.counter += 1;
        let record = CheckIn::from_input(state.counter, input, Utc::now());
        state.records.push(record.clone());
        debug!(
            "Appended check-in {} for {} in memory",
            record.sequence_id, record.user_id
        );
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<CheckIn>> {
        let mut records = self.state.lock().await.records.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn clear_all(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let removed = state.records.len();
        state.records.clear();
        state.counter = 0;
        info!("Cleared {} check-ins from in-memory storage", removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.lock().await.records.len())
    }
}
