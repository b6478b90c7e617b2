//! Durable check-in store on `SQLite`.
//!
//! Check-ins are JSON values in a named list; sequence numbers come from a
//! named counter. The increment and the list insert share one immediate
//! transaction, so writers in other processes are serialized by the
//! database lock.
//!
//! `rusqlite` is synchronous and a writer may wait up to [`BUSY_TIMEOUT`]
//! for another process, so every database call runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use super::schema::{INCREMENT_COUNTER, SET_COUNTER};
use super::{migrations, CheckInStore, StoreKeys};
use crate::checkin::{sort_newest_first, CheckIn, CheckInInput};
use crate::config::StorageBackend;
use crate::error::{Error, Result};

/// How long a writer waits for another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `SQLite`-backed check-in store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file, `None` for an in-memory database.
    path: Option<PathBuf>,
    /// List and counter names.
    keys: Arc<StoreKeys>,
    /// Database connection, used only from blocking tasks.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>, keys: StoreKeys) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening check-in database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::initialize_schema(&conn)?;

        info!("Check-in database opened at {}", path.display());
        Ok(Self::from_connection(Some(path), keys, conn))
    }

    /// Create an in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(keys: StoreKeys) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self::from_connection(None, keys, conn))
    }

    fn from_connection(path: Option<PathBuf>, keys: StoreKeys, conn: Connection) -> Self {
        Self {
            path,
            keys: Arc::new(keys),
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &StoreKeys) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let keys = Arc::clone(&self.keys);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| Error::backend("database connection lock poisoned"))?;
            op(&mut conn, &keys)
        })
        .await
        .map_err(|e| Error::backend(e.to_string()))?
    }
}

fn append_entry(conn: &mut Connection, keys: &StoreKeys, input: CheckInInput) -> Result<CheckIn> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let next: i64 = tx.query_row(INCREMENT_COUNTER, [&keys.counter], |row| row.get(0))?;
    let sequence_id = u64::try_from(next)
        .map_err(|_| Error::backend(format!("counter '{}' is negative", keys.counter)))?;

    let record = CheckIn::from_input(sequence_id, input, Utc::now());
    let value = serde_json::to_string(&record)?;
    tx.execute(
        "INSERT INTO list_entries (list_key, value) VALUES (?1, ?2)",
        params![keys.list, value],
    )?;

    tx.commit()?;
    Ok(record)
}

fn clear_entries(conn: &mut Connection, keys: &StoreKeys) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let removed = tx.execute("DELETE FROM list_entries WHERE list_key = ?1", [&keys.list])?;
    tx.execute(SET_COUNTER, params![keys.counter, 0_i64])?;

    tx.commit()?;
    Ok(removed)
}

fn read_list(conn: &Connection, keys: &StoreKeys) -> Result<Vec<CheckIn>> {
    let mut stmt = conn.prepare(
        "SELECT position, value FROM list_entries WHERE list_key = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt
        .query_map([&keys.list], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(rows.len());
    for (position, value) in rows {
        match serde_json::from_str::<CheckIn>(&value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                "Skipping unreadable entry {} in list '{}': {}",
                position, keys.list, e
            ),
        }
    }
    Ok(records)
}

#[async_trait]
impl CheckInStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    fn database_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn append(&self, input: CheckInInput) -> Result<CheckIn> {
        let record = self
            .with_conn(move |conn, keys| append_entry(conn, keys, input))
            .await?;
        debug!(
            "Appended check-in {} for {} to '{}'",
            record.sequence_id, record.user_id, self.keys.list
        );
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<CheckIn>> {
        let mut records = self.with_conn(|conn, keys| read_list(conn, keys)).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn clear_all(&self) -> Result<usize> {
        let removed = self.with_conn(clear_entries).await?;
        info!("Cleared {} check-ins from sqlite storage", removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = self
            .with_conn(|conn, keys| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM list_entries WHERE list_key = ?1",
                    [&keys.list],
                    |row| row.get(0),
                )?)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::sync::Arc;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory(StoreKeys::default()).expect("failed to create test store")
    }

    fn input(user_id: &str, location: &str, submitted_at: Option<DateTime<Utc>>) -> CheckInInput {
        CheckInInput {
            user_id: user_id.to_string(),
            display_name: format!("User {user_id}"),
            email: format!("{user_id}@example.edu"),
            location: location.to_string(),
            notes: String::new(),
            submitted_at,
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, minute, 0).unwrap()
    }

    fn remove_db(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequence_ids() {
        let store = create_test_store();

        let first = store.append(input("ab1c", "Library", None)).await.unwrap();
        let second = store.append(input("cd2e", "Garrett Hall", None)).await.unwrap();

        assert_eq!(first.sequence_id, 1);
        assert_eq!(second.sequence_id, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_append_fills_timestamps() {
        let store = create_test_store();

        let explicit = store
            .append(input("ab1c", "Library", Some(at(5))))
            .await
            .unwrap();
        assert_eq!(explicit.submitted_at, at(5));
        assert!(explicit.received_at > at(5));

        let implicit = store.append(input("ab1c", "Library", None)).await.unwrap();
        assert_eq!(implicit.submitted_at, implicit.received_at);
    }

    #[tokio::test]
    async fn test_list_all_sorts_newest_first_with_stable_ties() {
        let store = create_test_store();
        store.append(input("a", "One", Some(at(1)))).await.unwrap();
        store.append(input("b", "Two", Some(at(3)))).await.unwrap();
        store.append(input("c", "Three", Some(at(1)))).await.unwrap();

        let records = store.list_all().await.unwrap();
        let order: Vec<u64> = records.iter().map(|r| r.sequence_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_list_round_trips_all_fields() {
        let store = create_test_store();
        let mut with_notes = input("ab1c", "Rotunda, north steps", Some(at(7)));
        with_notes.notes = "with two students".to_string();

        let stored = store.append(with_notes).await.unwrap();
        let listed = store.list_all().await.unwrap();

        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_clear_all_is_idempotent_and_resets_counter() {
        let store = create_test_store();
        store.append(input("a", "One", None)).await.unwrap();
        store.append(input("b", "Two", None)).await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert_eq!(store.clear_all().await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());

        let next = store.append(input("c", "Three", None)).await.unwrap();
        assert_eq!(next.sequence_id, 1);
    }

    #[tokio::test]
    async fn test_lists_are_isolated_by_key() {
        let db_path = std::env::temp_dir().join(format!(
            "muster_sqlite_keys_{}.db",
            std::process::id()
        ));
        let drill = SqliteStore::open(
            &db_path,
            StoreKeys {
                list: "drill".to_string(),
                counter: "drill_count".to_string(),
            },
        )
        .unwrap();
        let live = SqliteStore::open(&db_path, StoreKeys::default()).unwrap();

        drill.append(input("a", "Field", None)).await.unwrap();
        let first_live = live.append(input("b", "Hall", None)).await.unwrap();

        assert_eq!(first_live.sequence_id, 1);
        assert_eq!(drill.count().await.unwrap(), 1);
        assert_eq!(live.clear_all().await.unwrap(), 1);
        assert_eq!(drill.count().await.unwrap(), 1);

        drop(drill);
        drop(live);
        remove_db(&db_path);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_share_sequence_ids() {
        let store = Arc::new(create_test_store());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append(input(&format!("u{i}"), "Quad", None))
                    .await
                    .unwrap()
                    .sequence_id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_two_connections_share_one_counter() {
        let db_path = std::env::temp_dir().join(format!(
            "muster_sqlite_shared_{}.db",
            std::process::id()
        ));
        let a = SqliteStore::open(&db_path, StoreKeys::default()).unwrap();
        let b = SqliteStore::open(&db_path, StoreKeys::default()).unwrap();

        let first = a.append(input("a", "One", None)).await.unwrap();
        let second = b.append(input("b", "Two", None)).await.unwrap();
        let third = a.append(input("c", "Three", None)).await.unwrap();

        assert_eq!(
            (first.sequence_id, second.sequence_id, third.sequence_id),
            (1, 2, 3)
        );
        assert_eq!(b.list_all().await.unwrap().len(), 3);

        drop(a);
        drop(b);
        remove_db(&db_path);
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_skipped() {
        let store = create_test_store();
        store.append(input("a", "One", None)).await.unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO list_entries (list_key, value) VALUES ('alerts', 'not json')",
                [],
            )
            .unwrap();
        }

        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let nested_path = std::env::temp_dir().join(format!(
            "muster_test_{}/nested/checkins.db",
            std::process::id()
        ));
        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }

        let store = SqliteStore::open(&nested_path, StoreKeys::default()).unwrap();
        assert!(nested_path.exists());
        assert_eq!(store.database_path(), Some(nested_path.as_path()));

        drop(store);
        if let Some(root) = nested_path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn test_in_memory_has_no_database_path() {
        let store = create_test_store();
        assert!(store.database_path().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiting_writer_does_not_block_runtime() {
        let db_path = std::env::temp_dir().join(format!(
            "muster_sqlite_locked_{}.db",
            std::process::id()
        ));
        let store = SqliteStore::open(&db_path, StoreKeys::default()).unwrap();

        // Another connection holds the write lock for a moment.
        let holder = Connection::open(&db_path).unwrap();
        holder.execute_batch("BEGIN IMMEDIATE").unwrap();

        let pending = tokio::spawn(async move { store.append(input("a", "One", None)).await });

        // The runtime keeps running other tasks while the append waits.
        let ticked = tokio::spawn(async { 42 }).await.unwrap();
        assert_eq!(ticked, 42);

        holder.execute_batch("COMMIT").unwrap();
        let record = pending.await.unwrap().unwrap();
        assert_eq!(record.sequence_id, 1);

        drop(holder);
        remove_db(&db_path);
    }
}
