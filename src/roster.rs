use tracing::info;
use uuid::Uuid;

use crate::error::{OutingError, Result};
use crate::model::StudentRecord;
use crate::snapshot;
use crate::store::{KvBackend, RosterStore};

/// In-memory roster that writes the whole collection back after every
/// mutation. Indices are positions in `list()` and shift down after a delete.
pub struct RosterManager<K: KvBackend> {
    store: RosterStore<K>,
    records: Vec<StudentRecord>,
}

impl<K: KvBackend> RosterManager<K> {
    pub fn open(mut store: RosterStore<K>) -> Result<Self> {
        let records = store.load()?;
        Ok(Self { store, records })
    }

    pub fn list(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, index: usize) -> Result<&StudentRecord> {
        self.records.get(index).ok_or(OutingError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn position_of_uid(&self, uid: &str) -> Option<usize> {
        if uid.is_empty() {
            return None;
        }
        self.records.iter().position(|r| r.uid == uid)
    }

    /// Appends `record` and persists. Returns the new record's index.
    pub fn add(&mut self, mut record: StudentRecord) -> Result<usize> {
        if record.uid.is_empty() {
            record.uid = Uuid::new_v4().to_string();
        }
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)?;
        Ok(self.records.len() - 1)
    }

    /// Replaces the record at `index` wholesale. A blank uid on `record`
    /// keeps the existing one.
    pub fn edit(&mut self, index: usize, mut record: StudentRecord) -> Result<()> {
        let current = self.get(index)?;
        if record.uid.is_empty() {
            record.uid = current.uid.clone();
        }
        let mut next = self.records.clone();
        next[index] = record;
        self.commit(next)
    }

    pub fn delete(&mut self, index: usize) -> Result<StudentRecord> {
        self.get(index)?;
        let mut next = self.records.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    /// Erases the persisted roster and reloads, which re-seeds from the
    /// default dataset.
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        self.records = self.store.load()?;
        info!(students = self.records.len(), "roster reset to default dataset");
        Ok(())
    }

    pub fn export_snapshot(&self) -> Result<String> {
        snapshot::render_snapshot(&self.records)
    }

    // Persist first so a failed write leaves memory and storage in agreement.
    fn commit(&mut self, next: Vec<StudentRecord>) -> Result<()> {
        self.store.save(&next)?;
        self.records = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_record;
    use crate::store::{MemoryKv, SeedSource};

    fn manager(names: &[&str]) -> RosterManager<MemoryKv> {
        let seed: Vec<_> = names.iter().map(|n| sample_record(n, None)).collect();
        let text = snapshot::render_snapshot(&seed).expect("render");
        RosterManager::open(RosterStore::new(MemoryKv::default(), SeedSource::from_text(text)))
            .expect("open")
    }

    #[test]
    fn edit_replaces_record_at_index() {
        let mut m = manager(&["Asha", "Ravi", "Kiran"]);
        for i in 0..m.len() {
            let mut replacement = sample_record("Neha", Some("11111"));
            replacement.uid = format!("uid-{i}");
            m.edit(i, replacement.clone()).expect("edit");
            assert_eq!(m.list()[i], replacement);
        }
    }

    #[test]
    fn edit_keeps_uid_when_blank() {
        let mut m = manager(&["Asha"]);
        let uid = m.list()[0].uid.clone();
        m.edit(0, sample_record("Asha Rao", None)).expect("edit");
        assert_eq!(m.list()[0].uid, uid);
        assert_eq!(m.list()[0].name, "Asha Rao");
    }

    #[test]
    fn delete_shrinks_and_shifts() {
        let mut m = manager(&["Asha", "Ravi", "Kiran"]);
        let removed = m.delete(1).expect("delete");
        assert_eq!(removed.name, "Ravi");
        assert_eq!(m.len(), 2);
        assert_eq!(m.list()[1].name, "Kiran");
    }

    #[test]
    fn out_of_range_never_mutates() {
        let mut m = manager(&["Asha", "Ravi"]);
        let before = m.list().to_vec();
        assert!(matches!(
            m.edit(2, sample_record("X", None)),
            Err(OutingError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            m.delete(7),
            Err(OutingError::IndexOutOfRange { index: 7, len: 2 })
        ));
        assert_eq!(m.list(), before.as_slice());
    }

    #[test]
    fn mutations_are_persisted() {
        let mut m = manager(&["Asha"]);
        m.add(sample_record("Ravi", Some("22222"))).expect("add");
        m.delete(0).expect("delete");
        let reloaded = m.store.load().expect("reload");
        assert_eq!(reloaded, m.list());
        assert_eq!(reloaded[0].name, "Ravi");
    }

    #[test]
    fn add_assigns_uid_and_accepts_empty_fields() {
        let mut m = manager(&[]);
        let mut blank = sample_record("", None);
        blank.id.clear();
        blank.program.clear();
        let idx = m.add(blank).expect("add");
        assert_eq!(idx, 0);
        assert!(!m.list()[0].uid.is_empty());
        assert_eq!(m.position_of_uid(&m.list()[0].uid.clone()), Some(0));
    }

    #[test]
    fn reset_restores_seed() {
        let mut m = manager(&["Asha", "Ravi"]);
        m.delete(0).expect("delete");
        m.reset().expect("reset");
        assert_eq!(m.len(), 2);
        assert_eq!(m.list()[0].name, "Asha");
    }

    #[test]
    fn export_snapshot_is_dataset_shaped() {
        let m = manager(&["Asha"]);
        let text = m.export_snapshot().expect("export");
        assert_eq!(snapshot::parse_snapshot(&text).expect("parse"), m.list());
    }
}
