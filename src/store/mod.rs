mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StoreError;
use crate::models::{NewSession, SessionRecord};

/// Full collection snapshot, ascending by `created_at`. Shared so a burst of
/// subscribers never clones the record set.
pub type Snapshot = Arc<Vec<SessionRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAsc,
    CreatedDesc,
}

/// An append-only, subscribe-able collection of session records. Every write
/// re-publishes the entire collection; there is no delta path and no
/// update/delete path.
pub trait SessionStore: Send + Sync {
    /// Assigns `id` and `created_at`, persists the record, and publishes a
    /// fresh snapshot to all subscribers.
    fn append(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionRecord, StoreError>> + Send;

    /// Fires immediately with the current full set and again after every
    /// append. Dropping the subscription tears it down.
    fn subscribe(&self, order: SortOrder) -> SnapshotSubscription;
}

/// Live view onto the store's snapshot stream. Readers always observe a
/// fully-formed snapshot; intermediate snapshots missed between reads are
/// superseded, never interleaved.
#[derive(Clone)]
pub struct SnapshotSubscription {
    rx: watch::Receiver<Snapshot>,
    order: SortOrder,
}

impl SnapshotSubscription {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>, order: SortOrder) -> Self {
        Self { rx, order }
    }

    /// The latest snapshot, in this subscription's order.
    pub fn current(&self) -> Vec<SessionRecord> {
        let snapshot = self.rx.borrow().clone();
        match self.order {
            SortOrder::CreatedAsc => snapshot.as_ref().clone(),
            SortOrder::CreatedDesc => {
                let mut records = snapshot.as_ref().clone();
                records.reverse();
                records
            }
        }
    }

    /// Waits for the next snapshot after the last one observed. Returns
    /// `Err` once the store has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// Marks the current snapshot as seen without reading it.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }
}
