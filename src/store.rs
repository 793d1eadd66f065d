//! Durable roster slot on top of a swappable key-value backend.
//!
//! The roster is always written as one serialized collection under a single
//! key. When no roster has been persisted yet, the first `load` seeds it from
//! the static default dataset and persists it immediately; after that the
//! dataset is never consulted again.

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::model::StudentRecord;
use crate::snapshot::{self, BUILTIN_DATASET};

pub const ROSTER_KEY: &str = "roster";
pub const DATASET_FILE_NAME: &str = "data.js";

pub trait KvBackend {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

/// `kv_store` table in the workspace database. Clones share the connection.
#[derive(Clone)]
pub struct SqliteKv {
    conn: Rc<Connection>,
}

impl SqliteKv {
    pub fn new(conn: Rc<Connection>) -> Self {
        Self { conn }
    }
}

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        // Single statement, so readers never see a half-written slot.
        self.conn.execute(
            "INSERT INTO kv_store(key, value, updated_at)
             VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
        Ok(())
    }
}

/// Process-local backend; nothing survives the process.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Snapshot text the store seeds from on first run.
#[derive(Debug, Clone)]
pub struct SeedSource {
    text: String,
}

impl SeedSource {
    pub fn builtin() -> Self {
        Self::from_text(BUILTIN_DATASET)
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// `<workspace>/data.js` when present, otherwise the built-in dataset.
    pub fn for_workspace(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(DATASET_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::builtin());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read dataset {}", path.to_string_lossy()))?;
        Ok(Self::from_text(text))
    }
}

pub struct RosterStore<K: KvBackend> {
    backend: K,
    seed: SeedSource,
}

impl<K: KvBackend> RosterStore<K> {
    pub fn new(backend: K, seed: SeedSource) -> Self {
        Self { backend, seed }
    }

    pub fn load(&mut self) -> Result<Vec<StudentRecord>> {
        if let Some(raw) = self.backend.get(ROSTER_KEY)? {
            let mut roster: Vec<StudentRecord> =
                serde_json::from_str(&raw).context("persisted roster is not valid JSON")?;
            if assign_missing_uids(&mut roster) {
                self.save(&roster)?;
            }
            return Ok(roster);
        }

        let mut roster = snapshot::parse_snapshot(&self.seed.text)?;
        assign_missing_uids(&mut roster);
        self.save(&roster)?;
        info!(students = roster.len(), "seeded roster from default dataset");
        Ok(roster)
    }

    pub fn save(&mut self, roster: &[StudentRecord]) -> Result<()> {
        let raw = serde_json::to_string(roster).context("failed to serialize roster")?;
        self.backend.set(ROSTER_KEY, &raw)?;
        debug!(students = roster.len(), bytes = raw.len(), "roster persisted");
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.backend.remove(ROSTER_KEY)?;
        info!("persisted roster erased");
        Ok(())
    }
}

fn assign_missing_uids(roster: &mut [StudentRecord]) -> bool {
    let mut changed = false;
    for rec in roster.iter_mut().filter(|r| r.uid.is_empty()) {
        rec.uid = Uuid::new_v4().to_string();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_record;

    fn seed_of(records: &[StudentRecord]) -> SeedSource {
        SeedSource::from_text(snapshot::render_snapshot(records).expect("render"))
    }

    #[test]
    fn first_load_seeds_and_persists() {
        let mut store = RosterStore::new(
            MemoryKv::default(),
            seed_of(&[sample_record("Asha", Some("12345"))]),
        );
        let roster = store.load().expect("load");
        assert_eq!(roster.len(), 1);
        assert!(!roster[0].uid.is_empty());
        assert!(store.backend.get(ROSTER_KEY).expect("get").is_some());
    }

    #[test]
    fn repeated_load_returns_equal_rosters() {
        let mut store = RosterStore::new(MemoryKv::default(), SeedSource::builtin());
        let first = store.load().expect("first");
        let second = store.load().expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn persisted_roster_wins_over_seed() {
        let mut store = RosterStore::new(
            MemoryKv::default(),
            seed_of(&[sample_record("Asha", None), sample_record("Ravi", None)]),
        );
        let mut roster = store.load().expect("load");
        roster.pop();
        store.save(&roster).expect("save");
        assert_eq!(store.load().expect("reload"), roster);
    }

    #[test]
    fn reset_reseeds_on_next_load() {
        let mut store = RosterStore::new(
            MemoryKv::default(),
            seed_of(&[sample_record("Asha", None), sample_record("Ravi", None)]),
        );
        store.save(&[]).expect("save empty");
        assert!(store.load().expect("load").is_empty());
        store.reset().expect("reset");
        let reseeded = store.load().expect("reseed");
        assert_eq!(reseeded.len(), 2);
        assert_eq!(reseeded[1].name, "Ravi");
    }

    #[test]
    fn exported_snapshot_reseeds_identical_roster() {
        let mut original = RosterStore::new(MemoryKv::default(), SeedSource::builtin());
        let roster = original.load().expect("load");
        let text = snapshot::render_snapshot(&roster).expect("export");

        let mut fresh = RosterStore::new(MemoryKv::default(), SeedSource::from_text(text));
        assert_eq!(fresh.load().expect("seed"), roster);
    }

    #[test]
    fn sqlite_backend_upserts_and_removes() {
        let conn = Connection::open_in_memory().expect("open");
        crate::db::init_schema(&conn).expect("schema");
        let mut kv = SqliteKv::new(Rc::new(conn));
        kv.set("k", "one").expect("set");
        kv.set("k", "two").expect("overwrite");
        assert_eq!(kv.get("k").expect("get").as_deref(), Some("two"));
        kv.remove("k").expect("remove");
        assert_eq!(kv.get("k").expect("get"), None);
    }
}
