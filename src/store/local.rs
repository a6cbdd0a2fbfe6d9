//! Local filesystem retention store
//!
//! Slots are directories under a retention root. Rotation uses `fs::rename`,
//! which is atomic within a single filesystem; the oldest slot is removed
//! recursively before the shift.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::layout::{Layout, DATE_MARKER_NAME};
use crate::error::{VaultError, VaultResult};

use super::{decode_date_marker, encode_date_marker, RetentionStore};

/// Retention store backed by directories under a local root
pub struct LocalStore {
    root: PathBuf,
    depth: u32,
    layout: Layout,
}

impl LocalStore {
    pub fn new(root: PathBuf, depth: u32, layout: Layout) -> Self {
        Self {
            root,
            depth,
            layout,
        }
    }

    /// Absolute path of a slot directory
    pub fn slot_dir(&self, index: u32) -> PathBuf {
        self.root.join(self.layout.slot_name(index))
    }
}

impl RetentionStore for LocalStore {
    fn depth(&self) -> u32 {
        self.depth
    }

    fn ensure_slots(&mut self) -> VaultResult<()> {
        for index in 0..self.depth {
            // create_dir_all is a no-op for an existing directory
            fs::create_dir_all(self.slot_dir(index)).map_err(|e| {
                VaultError::Io(format!(
                    "Failed to create slot {}: {}",
                    self.layout.slot_name(index),
                    e
                ))
            })?;
        }
        Ok(())
    }

    fn delete_slot_contents(&mut self, index: u32) -> VaultResult<()> {
        let dir = self.slot_dir(index);
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&dir)
            .map_err(|e| VaultError::Io(format!("Failed to list {}: {}", dir.display(), e)))?
        {
            let entry = entry.map_err(|e| VaultError::Io(e.to_string()))?;
            let path = entry.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|e| {
                VaultError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn remove_slot(&mut self, index: u32) -> VaultResult<()> {
        let dir = self.slot_dir(index);
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir(&dir)
            .map_err(|e| VaultError::Io(format!("Failed to remove {}: {}", dir.display(), e)))
    }

    fn shift_slot(&mut self, from: u32, to: u32) -> VaultResult<()> {
        let src = self.slot_dir(from);
        let dst = self.slot_dir(to);
        fs::rename(&src, &dst).map_err(|e| {
            VaultError::Io(format!(
                "Failed to rename {} to {}: {}",
                src.display(),
                dst.display(),
                e
            ))
        })
    }

    fn create_slot(&mut self, index: u32) -> VaultResult<()> {
        fs::create_dir_all(self.slot_dir(index)).map_err(|e| {
            VaultError::Io(format!(
                "Failed to create slot {}: {}",
                self.layout.slot_name(index),
                e
            ))
        })
    }

    fn publish(&mut self, files: &[PathBuf]) -> VaultResult<()> {
        let current = self.slot_dir(0);
        for file in files {
            let name = file
                .file_name()
                .ok_or_else(|| VaultError::Io(format!("{} has no file name", file.display())))?;
            fs::copy(file, current.join(name)).map_err(|e| {
                VaultError::Io(format!("Failed to publish {}: {}", file.display(), e))
            })?;
        }
        Ok(())
    }

    fn fetch(&mut self, index: u32, names: &[String], dest: &Path) -> VaultResult<Vec<PathBuf>> {
        let dir = self.slot_dir(index);
        if !dir.is_dir() {
            return Err(VaultError::slot_not_found(self.layout.slot_name(index)));
        }

        let mut fetched = Vec::with_capacity(names.len());
        for name in names {
            let src = dir.join(name);
            if !src.is_file() {
                return Err(VaultError::artifact_not_found(format!(
                    "{}/{}",
                    self.layout.slot_name(index),
                    name
                )));
            }
            let target = dest.join(name);
            fs::copy(&src, &target).map_err(|e| {
                VaultError::Io(format!("Failed to fetch {}: {}", src.display(), e))
            })?;
            fetched.push(target);
        }
        Ok(fetched)
    }

    fn read_date_marker(&mut self) -> VaultResult<Option<NaiveDate>> {
        let marker = self.slot_dir(0).join(DATE_MARKER_NAME);
        if !marker.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&marker)
            .map_err(|e| VaultError::Io(format!("Failed to read date marker: {}", e)))?;
        Ok(decode_date_marker(&contents))
    }

    fn write_date_marker(&mut self, date: NaiveDate) -> VaultResult<()> {
        let marker = self.slot_dir(0).join(DATE_MARKER_NAME);
        fs::write(&marker, encode_date_marker(date))
            .map_err(|e| VaultError::Io(format!("Failed to write date marker: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotate::rotate;
    use tempfile::TempDir;

    fn test_store(depth: u32) -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(
            temp_dir.path().to_path_buf(),
            depth,
            Layout::new("wordpress"),
        );
        (store, temp_dir)
    }

    fn tag_slot(store: &LocalStore, index: u32, tag: &str) {
        fs::write(store.slot_dir(index).join("marker.txt"), tag).unwrap();
    }

    fn slot_tag(store: &LocalStore, index: u32) -> Option<String> {
        fs::read_to_string(store.slot_dir(index).join("marker.txt")).ok()
    }

    #[test]
    fn test_ensure_slots_idempotent() {
        let (mut store, _temp) = test_store(3);
        store.ensure_slots().unwrap();
        store.ensure_slots().unwrap();

        for index in 0..3 {
            assert!(store.slot_dir(index).is_dir());
        }
    }

    #[test]
    fn test_rotation_shifts_directories() {
        let (mut store, _temp) = test_store(3);
        store.ensure_slots().unwrap();
        tag_slot(&store, 0, "A");
        tag_slot(&store, 1, "B");
        tag_slot(&store, 2, "C");

        rotate(&mut store).unwrap();

        assert_eq!(slot_tag(&store, 0), None);
        assert_eq!(slot_tag(&store, 1), Some("A".into()));
        assert_eq!(slot_tag(&store, 2), Some("B".into()));
    }

    #[test]
    fn test_delete_contents_keeps_container() {
        let (mut store, _temp) = test_store(2);
        store.ensure_slots().unwrap();
        tag_slot(&store, 1, "C");

        store.delete_slot_contents(1).unwrap();
        assert!(store.slot_dir(1).is_dir());
        assert_eq!(slot_tag(&store, 1), None);

        // Already-empty slot deletes as success
        store.delete_slot_contents(1).unwrap();
    }

    #[test]
    fn test_publish_and_fetch() {
        let (mut store, temp) = test_store(2);
        store.ensure_slots().unwrap();

        let artifact = temp.path().join("site.tar.gz.enc");
        fs::write(&artifact, b"sealed bytes").unwrap();
        store.publish(&[artifact]).unwrap();

        let scratch = temp.path().join("scratch");
        fs::create_dir(&scratch).unwrap();
        let fetched = store
            .fetch(0, &["site.tar.gz.enc".to_string()], &scratch)
            .unwrap();
        assert_eq!(fs::read(&fetched[0]).unwrap(), b"sealed bytes");
    }

    #[test]
    fn test_fetch_missing_artifact() {
        let (mut store, temp) = test_store(2);
        store.ensure_slots().unwrap();

        let err = store
            .fetch(0, &["absent.enc".to_string()], temp.path())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_fetch_missing_slot() {
        let (mut store, temp) = test_store(2);
        let err = store
            .fetch(1, &["site.tar.gz.enc".to_string()], temp.path())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_date_marker_round_trip() {
        let (mut store, _temp) = test_store(2);
        store.ensure_slots().unwrap();

        assert_eq!(store.read_date_marker().unwrap(), None);

        let date = NaiveDate::from_ymd_opt(2021, 10, 1).unwrap();
        store.write_date_marker(date).unwrap();
        assert_eq!(store.read_date_marker().unwrap(), Some(date));
    }
}
