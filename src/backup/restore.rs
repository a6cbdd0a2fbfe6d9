//! Restore orchestration
//!
//! Reverses the backup pipeline for one chosen generation: fetch the two
//! sealed artifacts from the selected store, open them, and hand the
//! plaintexts to the database and site restore collaborators. Restore is an
//! operator-supervised, non-atomic action: it fails fast and performs no
//! cleanup of the target website or database.

use std::fs;
use std::path::PathBuf;

use crate::config::layout::Layout;
use crate::crypto::{envelope, KeyMaterial};
use crate::error::{VaultError, VaultResult};
use crate::producer::ArtifactProducer;
use crate::store::RetentionStore;

/// Sequences one restore run over an injected store and producer
pub struct RestoreOrchestrator<'a> {
    producer: &'a dyn ArtifactProducer,
    store: &'a mut dyn RetentionStore,
    key: &'a KeyMaterial,
    layout: Layout,
    scratch: PathBuf,
}

impl<'a> RestoreOrchestrator<'a> {
    pub fn new(
        producer: &'a dyn ArtifactProducer,
        store: &'a mut dyn RetentionStore,
        key: &'a KeyMaterial,
        layout: Layout,
        scratch: PathBuf,
    ) -> Self {
        Self {
            producer,
            store,
            key,
            layout,
            scratch,
        }
    }

    /// Restore the generation at the given recency index (0 = most recent)
    pub fn run(&mut self, generation: u32) -> VaultResult<()> {
        if generation >= self.store.depth() {
            return Err(VaultError::slot_not_found(format!(
                "{} (retention depth is {})",
                self.layout.slot_name(generation),
                self.store.depth()
            )));
        }

        fs::create_dir_all(&self.scratch)?;

        let names = self.layout.sealed_artifact_names();
        let sealed = self.store.fetch(generation, &names, &self.scratch)?;

        // sealed_artifact_names lists the dump first, the site archive second
        let dump = envelope::open_file(&sealed[0], self.key)?;
        let archive = envelope::open_file(&sealed[1], self.key)?;

        self.producer.restore_database(&dump)?;
        self.producer.restore_site(&archive)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{BackupOrchestrator, BackupOutcome};
    use crate::config::layout::Layout;
    use crate::notify::NullNotifier;
    use crate::producer::fake::FakeProducer;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn layout() -> Layout {
        Layout::new("wordpress")
    }

    fn key() -> KeyMaterial {
        KeyMaterial::new([0x11; 32])
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn backup(
        producer: &FakeProducer,
        store: &mut MemoryStore,
        scratch: PathBuf,
        today: NaiveDate,
    ) {
        let k = key();
        let mut orchestrator =
            BackupOrchestrator::new(producer, store, None, &NullNotifier, &k, scratch);
        assert_eq!(orchestrator.run(today).unwrap(), BackupOutcome::Completed);
    }

    #[test]
    fn test_restore_most_recent_generation() {
        let temp = TempDir::new().unwrap();
        let producer = FakeProducer::new(layout());
        let mut store = MemoryStore::new(3, layout());
        backup(&producer, &mut store, temp.path().join("work"), day("2021-09-21"));

        let k = key();
        let mut restorer = RestoreOrchestrator::new(
            &producer,
            &mut store,
            &k,
            layout(),
            temp.path().join("restore"),
        );
        restorer.run(0).unwrap();

        assert_eq!(
            producer.restored_dumps.borrow().as_slice(),
            &[b"-- fake dump\n".to_vec()]
        );
        assert_eq!(
            producer.restored_archives.borrow().as_slice(),
            &[b"fake archive".to_vec()]
        );
    }

    #[test]
    fn test_restore_by_index_after_rotation() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::new(3, layout());

        // Day one publishes generation A
        let mut producer = FakeProducer::new(layout());
        producer.dump_bytes = b"-- dump A\n".to_vec();
        backup(&producer, &mut store, temp.path().join("work1"), day("2021-09-21"));

        // Day two rotates A into DAYJ-1 and publishes B
        producer.dump_bytes = b"-- dump B\n".to_vec();
        backup(&producer, &mut store, temp.path().join("work2"), day("2021-09-22"));

        // Generation index 1 must decrypt back to A
        let k = key();
        let mut restorer = RestoreOrchestrator::new(
            &producer,
            &mut store,
            &k,
            layout(),
            temp.path().join("restore"),
        );
        restorer.run(1).unwrap();

        assert_eq!(
            producer.restored_dumps.borrow().as_slice(),
            &[b"-- dump A\n".to_vec()]
        );
    }

    #[test]
    fn test_restore_absent_generation() {
        let temp = TempDir::new().unwrap();
        let producer = FakeProducer::new(layout());
        let mut store = MemoryStore::new(3, layout());

        let k = key();
        let mut restorer = RestoreOrchestrator::new(
            &producer,
            &mut store,
            &k,
            layout(),
            temp.path().join("restore"),
        );
        let err = restorer.run(2).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restore_index_beyond_depth() {
        let temp = TempDir::new().unwrap();
        let producer = FakeProducer::new(layout());
        let mut store = MemoryStore::new(3, layout());

        let k = key();
        let mut restorer = RestoreOrchestrator::new(
            &producer,
            &mut store,
            &k,
            layout(),
            temp.path().join("restore"),
        );
        let err = restorer.run(3).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restore_with_wrong_key_fails_authentication() {
        let temp = TempDir::new().unwrap();
        let producer = FakeProducer::new(layout());
        let mut store = MemoryStore::new(3, layout());
        backup(&producer, &mut store, temp.path().join("work"), day("2021-09-21"));

        let wrong_key = KeyMaterial::new([0x22; 32]);
        let mut restorer = RestoreOrchestrator::new(
            &producer,
            &mut store,
            &wrong_key,
            layout(),
            temp.path().join("restore"),
        );
        let err = restorer.run(0).unwrap_err();
        assert!(err.is_authentication());

        // Nothing was handed to the collaborators
        assert!(producer.restored_dumps.borrow().is_empty());
        assert!(producer.restored_archives.borrow().is_empty());
    }
}
