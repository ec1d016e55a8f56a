use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewSession, SessionRecord};
use crate::store::{SessionStore, Snapshot, SnapshotSubscription, SortOrder};

/// In-process store with no persistence. Stands in for the real backend in
/// tests and offline runs; identical snapshot semantics to [`SqliteStore`].
///
/// [`SqliteStore`]: crate::store::SqliteStore
#[derive(Clone)]
pub struct MemoryStore {
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            snapshot_tx: Arc::new(watch::channel(Arc::new(Vec::new())).0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    async fn append(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            topic: session.topic,
            description: session.description,
            duration: session.duration,
            hours: session.hours,
            motivation: session.motivation,
            created_at: Utc::now(),
        };

        let published = record.clone();
        self.snapshot_tx.send_modify(move |snapshot| {
            let mut records = snapshot.as_ref().clone();
            records.push(published);
            *snapshot = Arc::new(records);
        });

        Ok(record)
    }

    fn subscribe(&self, order: SortOrder) -> SnapshotSubscription {
        SnapshotSubscription::new(self.snapshot_tx.subscribe(), order)
    }
}
