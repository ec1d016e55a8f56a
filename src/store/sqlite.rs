use std::{
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use log::error;
use rusqlite::{params, Connection, Row};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewSession, SessionRecord};
use crate::store::{SessionStore, Snapshot, SnapshotSubscription, SortOrder};

const CURRENT_SCHEMA_VERSION: i32 = 1;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct WorkerInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for WorkerInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed session store. All connection access happens on a dedicated
/// worker thread fed by a command channel; callers await the result over a
/// oneshot. Appends re-publish the full collection through a watch channel.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<WorkerInner>,
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
}

impl SqliteStore {
    pub async fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory {}", parent.display()))
                .map_err(StoreError::Unavailable)?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("lockin-store".into())
            .spawn(move || {
                let mut conn = match Connection::open(&db_path) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(
                            anyhow::Error::new(err).context("failed to open SQLite database")
                        ));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run store migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }
            })
            .context("failed to spawn store thread")
            .map_err(StoreError::Unavailable)?;

        ready_rx
            .recv()
            .map_err(|_| StoreError::Unavailable(anyhow!("store thread exited during startup")))?
            .map_err(StoreError::Unavailable)?;

        let store = Self {
            inner: Arc::new(WorkerInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            snapshot_tx: Arc::new(watch::channel(Arc::new(Vec::new())).0),
        };

        let existing = store
            .execute(load_all_sessions)
            .await
            .map_err(StoreError::Unavailable)?;
        store.snapshot_tx.send_replace(Arc::new(existing));

        Ok(store)
    }

    async fn execute<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let boxed: DbTask = Box::new(move |conn| {
            let _ = reply_tx.send(task(conn));
        });

        self.inner
            .sender
            .send(DbCommand::Execute(boxed))
            .map_err(|_| anyhow!("store thread is gone"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("store thread dropped the reply"))?
    }
}

impl SessionStore for SqliteStore {
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

        let to_insert = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, topic, description, duration, hours, motivation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    to_insert.id,
                    to_insert.topic,
                    to_insert.description,
                    to_i64(to_insert.duration)?,
                    to_insert.hours,
                    to_insert.motivation,
                    to_insert.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(StoreError::Unavailable)?;

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

fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &rusqlite::Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(include_str!("schema_v1.sql"))
                .context("failed to execute schema_v1.sql")?;
            Ok(())
        }
        other => bail!("no migration defined for version {other}"),
    }
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let duration: i64 = row.get("duration")?;
    let created_at: String = row.get("created_at")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        topic: row.get("topic")?,
        description: row.get("description")?,
        duration: to_u64(duration, "duration")?,
        hours: row.get("hours")?,
        motivation: row.get("motivation")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn load_all_sessions(conn: &mut Connection) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, topic, description, duration, hours, motivation, created_at
         FROM sessions
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let mut records = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        records.push(row_to_record(row)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSession;

    fn session(topic: &str, duration: u64) -> NewSession {
        NewSession::from_stopped_timer(topic, "", duration, None)
    }

    #[tokio::test]
    async fn append_persists_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("sessions.db"))
            .await
            .unwrap();

        let sub = store.subscribe(SortOrder::CreatedAsc);
        assert!(sub.current().is_empty());

        let record = store.append(session("Morning Grind", 3600)).await.unwrap();
        assert!(!record.id.is_empty());
        assert_eq!(record.hours, 1.0);

        let current = sub.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].topic, "Morning Grind");
    }

    #[tokio::test]
    async fn reopen_loads_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        {
            let store = SqliteStore::open(path.clone()).await.unwrap();
            store.append(session("one", 60)).await.unwrap();
            store.append(session("two", 120)).await.unwrap();
        }

        let reopened = SqliteStore::open(path).await.unwrap();
        let current = reopened.subscribe(SortOrder::CreatedAsc).current();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].topic, "one");
        assert_eq!(current[1].topic, "two");
    }

    #[tokio::test]
    async fn descending_subscription_reverses_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("sessions.db"))
            .await
            .unwrap();

        store.append(session("first", 60)).await.unwrap();
        store.append(session("second", 120)).await.unwrap();

        let desc = store.subscribe(SortOrder::CreatedDesc).current();
        assert_eq!(desc[0].topic, "second");
        assert_eq!(desc[1].topic, "first");
    }

    #[tokio::test]
    async fn subscription_sees_subsequent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("sessions.db"))
            .await
            .unwrap();

        let mut sub = store.subscribe(SortOrder::CreatedAsc);
        sub.mark_seen();

        store.append(session("late", 90)).await.unwrap();
        sub.changed().await.unwrap();
        assert_eq!(sub.current().len(), 1);
    }
}
