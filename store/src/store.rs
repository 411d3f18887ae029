//! Store: JSONL append log (source of truth) + SQLite index (derived, rebuildable)
//!
//! Each record type lives in its own collection: a `<collection>.jsonl` file
//! holding one JSON line per write (last line for an id wins) and a partition
//! of a shared `index.db` SQLite table holding the fields `indexed_fields()`
//! exposes, for cheap equality filtering without deserializing every record.
//!
//! A single advisory file lock (`fs2`) serializes writers across processes so
//! that a record's JSONL append and its index update are never observed half
//! done by a concurrent reader. The index is a cache: [`Store::rebuild_indexes`]
//! replays the log and restores it from scratch, so a crash between the log
//! append and the index update is recoverable, never corrupting.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::record::{Filter, IndexValue, Record, filters_match};

const TOMBSTONE_KEY: &str = "__tombstone__";

/// Persistent, crash-safe store for [`Record`] types.
pub struct Store {
    base_path: PathBuf,
    conn: Connection,
    caches: HashMap<String, HashMap<String, Value>>,
}

impl Store {
    /// Open (creating if absent) a store rooted at `base_path`.
    pub fn open(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let conn = Connection::open(base_path.join("index.db"))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS record_index (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (collection, id, field)
            );",
        )?;

        debug!(base_path = %base_path.display(), "Store::open: opened");
        Ok(Self {
            base_path,
            conn,
            caches: HashMap::new(),
        })
    }

    fn jsonl_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{collection}.jsonl"))
    }

    fn lock_path(&self) -> PathBuf {
        self.base_path.join(".store.lock")
    }

    fn with_lock<R>(&self, f: impl FnOnce() -> StoreResult<R>) -> StoreResult<R> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        let result = f();
        let _ = fs2::FileExt::unlock(&lock_file);
        result
    }

    /// Replay a collection's JSONL log into an id -> latest-value map.
    fn replay(&self, collection: &str) -> StoreResult<HashMap<String, Value>> {
        let path = self.jsonl_path(collection);
        let mut map = HashMap::new();
        if !path.exists() {
            return Ok(map);
        }

        let file = File::open(&path)?;
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    warn!(collection, lineno, error = %e, "Store::replay: skipping unparsable line");
                    continue;
                }
            };
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| value.get("__id__").and_then(Value::as_str).map(str::to_string));
            let Some(id) = id else { continue };

            if value.get(TOMBSTONE_KEY).and_then(Value::as_bool).unwrap_or(false) {
                map.remove(&id);
            } else {
                map.insert(id, value);
            }
        }
        Ok(map)
    }

    fn ensure_loaded(&mut self, collection: &str) -> StoreResult<()> {
        if !self.caches.contains_key(collection) {
            let map = self.replay(collection)?;
            self.caches.insert(collection.to_string(), map);
        }
        Ok(())
    }

    fn append_line(&self, collection: &str, value: &Value) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.jsonl_path(collection))?;
        let mut line = serde_json::to_string(value)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    fn write_index_rows(&self, collection: &str, id: &str, fields: &HashMap<String, IndexValue>) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM record_index WHERE collection = ?1 AND id = ?2", (collection, id))?;
        for (field, value) in fields {
            self.conn.execute(
                "INSERT OR REPLACE INTO record_index (collection, id, field, value) VALUES (?1, ?2, ?3, ?4)",
                (collection, id, field, value.as_text()),
            )?;
        }
        Ok(())
    }

    fn delete_index_rows(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM record_index WHERE collection = ?1 AND id = ?2", (collection, id))?;
        Ok(())
    }

    /// Persist a new record, appending to the collection's JSONL log.
    pub fn create<T: Record>(&mut self, record: T) -> StoreResult<String> {
        self.upsert(record)
    }

    /// Persist a record update; identical to `create` since both append to
    /// the log and the last line for an id always wins.
    pub fn update<T: Record>(&mut self, record: T) -> StoreResult<()> {
        self.upsert(record)?;
        Ok(())
    }

    fn upsert<T: Record>(&mut self, record: T) -> StoreResult<String> {
        let collection = T::collection_name();
        self.ensure_loaded(collection)?;

        let id = record.id().to_string();
        let fields = record.indexed_fields();
        let value = serde_json::to_value(&record)?;

        self.with_lock(|| {
            self.append_line(collection, &value)?;
            self.write_index_rows(collection, &id, &fields)
        })?;

        self.caches.get_mut(collection).unwrap().insert(id.clone(), value);
        Ok(id)
    }

    /// Fetch a single record by id.
    pub fn get<T: Record>(&mut self, id: &str) -> StoreResult<Option<T>> {
        let collection = T::collection_name();
        self.ensure_loaded(collection)?;
        match self.caches.get(collection).and_then(|m| m.get(id)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// List all records of a type matching the given filters (AND semantics).
    /// An empty filter set returns every record in the collection.
    pub fn list<T: Record>(&mut self, filters: &[Filter]) -> StoreResult<Vec<T>> {
        let collection = T::collection_name();
        self.ensure_loaded(collection)?;

        let mut out = Vec::new();
        for value in self.caches.get(collection).unwrap().values() {
            let record: T = serde_json::from_value(value.clone())?;
            if filters.is_empty() || filters_match(filters, &record.indexed_fields()) {
                out.push(record);
            }
        }
        out.sort_by_key(|r| r.updated_at());
        Ok(out)
    }

    /// Delete every record of type `T` whose indexed field `field` equals `value`.
    /// Returns the number of records removed.
    pub fn delete_by_index<T: Record>(&mut self, field: &str, value: IndexValue) -> StoreResult<usize> {
        let collection = T::collection_name();
        self.ensure_loaded(collection)?;

        let matching: Vec<String> = self
            .caches
            .get(collection)
            .unwrap()
            .iter()
            .filter_map(|(id, json)| {
                let record: T = serde_json::from_value(json.clone()).ok()?;
                (record.indexed_fields().get(field) == Some(&value)).then(|| id.clone())
            })
            .collect();

        for id in &matching {
            let tombstone = serde_json::json!({ "id": id, TOMBSTONE_KEY: true });
            self.with_lock(|| {
                self.append_line(collection, &tombstone)?;
                self.delete_index_rows(collection, id)
            })?;
            self.caches.get_mut(collection).unwrap().remove(id);
        }

        Ok(matching.len())
    }

    /// Rebuild the SQLite index for `T` from its JSONL log, discarding
    /// whatever index rows existed for the collection beforehand. Returns
    /// the number of live records indexed. Use after a crash, or at startup.
    pub fn rebuild_indexes<T: Record>(&mut self) -> StoreResult<usize> {
        let collection = T::collection_name();
        let map = self.replay(collection)?;

        self.conn
            .execute("DELETE FROM record_index WHERE collection = ?1", (collection,))?;
        for (id, json) in &map {
            let record: T = serde_json::from_value(json.clone())?;
            self.write_index_rows(collection, id, &record.indexed_fields())?;
        }

        let count = map.len();
        self.caches.insert(collection.to_string(), map);
        debug!(collection, count, "Store::rebuild_indexes: done");
        Ok(count)
    }

    /// Force durability of pending writes. JSONL appends are already
    /// fsync'd per write; this additionally checkpoints the SQLite index.
    pub fn sync(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        status: String,
        updated_at: i64,
    }

    impl Record for Widget {
        fn id(&self) -> &str {
            &self.id
        }
        fn updated_at(&self) -> i64 {
            self.updated_at
        }
        fn collection_name() -> &'static str {
            "widgets"
        }
        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut m = HashMap::new();
            m.insert("status".to_string(), IndexValue::String(self.status.clone()));
            m
        }
    }

    fn widget(id: &str, status: &str) -> Widget {
        Widget {
            id: id.to_string(),
            status: status.to_string(),
            updated_at: now_ms_for_test(),
        }
    }

    fn now_ms_for_test() -> i64 {
        crate::now_ms()
    }

    #[test]
    fn create_then_get_roundtrips() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let w = widget("w1", "pending");
        store.create(w.clone()).unwrap();

        let loaded: Option<Widget> = store.get("w1").unwrap();
        assert_eq!(loaded, Some(w));
    }

    #[test]
    fn update_overwrites_prior_value() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        store.create(widget("w1", "pending")).unwrap();
        store.update(widget("w1", "completed")).unwrap();

        let loaded: Widget = store.get("w1").unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
    }

    #[test]
    fn list_filters_by_indexed_field() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        store.create(widget("w1", "pending")).unwrap();
        store.create(widget("w2", "completed")).unwrap();
        store.create(widget("w3", "completed")).unwrap();

        let completed = store
            .list::<Widget>(&[Filter {
                field: "status".to_string(),
                op: crate::record::FilterOp::Eq,
                value: IndexValue::String("completed".to_string()),
            }])
            .unwrap();

        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|w| w.status == "completed"));
    }

    #[test]
    fn delete_by_index_removes_matching_records() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        store.create(widget("w1", "failed")).unwrap();
        store.create(widget("w2", "completed")).unwrap();

        let deleted = store
            .delete_by_index::<Widget>("status", IndexValue::String("failed".to_string()))
            .unwrap();
        assert_eq!(deleted, 1);

        assert!(store.get::<Widget>("w1").unwrap().is_none());
        assert!(store.get::<Widget>("w2").unwrap().is_some());
    }

    #[test]
    fn rebuild_indexes_replays_log_from_scratch() {
        let dir = tempdir().unwrap();
        {
            let mut store = Store::open(dir.path()).unwrap();
            store.create(widget("w1", "pending")).unwrap();
            store.update(widget("w1", "completed")).unwrap();
        }

        // Fresh Store instance simulating a process restart.
        let mut store = Store::open(dir.path()).unwrap();
        let count = store.rebuild_indexes::<Widget>().unwrap();
        assert_eq!(count, 1);

        let loaded: Widget = store.get("w1").unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
    }

    #[test]
    fn crash_between_log_and_index_is_recoverable_via_rebuild() {
        // Simulates a crash: the JSONL log has two writes for the same id,
        // but the index.db was never touched. A fresh Store + rebuild_indexes
        // must reconstruct both the cache and the index purely from the log.
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("widgets.jsonl");
        fs::create_dir_all(dir.path()).unwrap();
        let mut f = File::create(&log_path).unwrap();
        writeln!(f, "{}", serde_json::to_string(&widget("w1", "pending")).unwrap()).unwrap();
        writeln!(f, "{}", serde_json::to_string(&widget("w1", "completed")).unwrap()).unwrap();
        drop(f);

        let mut store = Store::open(dir.path()).unwrap();
        let count = store.rebuild_indexes::<Widget>().unwrap();
        assert_eq!(count, 1);
        let loaded: Widget = store.get("w1").unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
    }
}
