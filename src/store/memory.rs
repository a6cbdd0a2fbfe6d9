//! In-memory retention store
//!
//! Fake backend used to unit test the rotation engine and the orchestrators
//! without touching a real filesystem or network. Slots are hash maps of
//! artifact name to bytes; an absent map models an absent slot container.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::layout::{Layout, DATE_MARKER_NAME};
use crate::error::{VaultError, VaultResult};

use super::{decode_date_marker, encode_date_marker, RetentionStore};

/// Retention store held entirely in memory
pub struct MemoryStore {
    depth: u32,
    layout: Layout,
    slots: Vec<Option<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new(depth: u32, layout: Layout) -> Self {
        Self {
            depth,
            layout,
            slots: (0..depth).map(|_| None).collect(),
        }
    }

    /// Insert an artifact directly into a slot (test setup)
    pub fn insert(&mut self, index: u32, name: &str, bytes: Vec<u8>) {
        self.slots[index as usize]
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), bytes);
    }

    /// Artifacts currently held by a slot, if the slot exists
    pub fn slot(&self, index: u32) -> Option<&HashMap<String, Vec<u8>>> {
        self.slots[index as usize].as_ref()
    }

    /// True when the slot container exists and holds nothing
    pub fn slot_is_empty(&self, index: u32) -> bool {
        self.slot(index).map_or(false, HashMap::is_empty)
    }
}

impl RetentionStore for MemoryStore {
    fn depth(&self) -> u32 {
        self.depth
    }

    fn ensure_slots(&mut self) -> VaultResult<()> {
        for slot in &mut self.slots {
            slot.get_or_insert_with(HashMap::new);
        }
        Ok(())
    }

    fn delete_slot_contents(&mut self, index: u32) -> VaultResult<()> {
        if let Some(slot) = &mut self.slots[index as usize] {
            slot.clear();
        }
        Ok(())
    }

    fn remove_slot(&mut self, index: u32) -> VaultResult<()> {
        self.slots[index as usize] = None;
        Ok(())
    }

    fn shift_slot(&mut self, from: u32, to: u32) -> VaultResult<()> {
        let moved = self.slots[from as usize].take();
        self.slots[to as usize] = moved;
        Ok(())
    }

    fn create_slot(&mut self, index: u32) -> VaultResult<()> {
        self.slots[index as usize] = Some(HashMap::new());
        Ok(())
    }

    fn publish(&mut self, files: &[PathBuf]) -> VaultResult<()> {
        for file in files {
            let name = file
                .file_name()
                .ok_or_else(|| VaultError::Io(format!("{} has no file name", file.display())))?
                .to_string_lossy()
                .to_string();
            let bytes = std::fs::read(file)
                .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
            self.slots[0].get_or_insert_with(HashMap::new).insert(name, bytes);
        }
        Ok(())
    }

    fn fetch(&mut self, index: u32, names: &[String], dest: &Path) -> VaultResult<Vec<PathBuf>> {
        let slot = self.slots[index as usize]
            .as_ref()
            .ok_or_else(|| VaultError::slot_not_found(self.layout.slot_name(index)))?;

        let mut fetched = Vec::with_capacity(names.len());
        for name in names {
            let bytes = slot.get(name).ok_or_else(|| {
                VaultError::artifact_not_found(format!(
                    "{}/{}",
                    self.layout.slot_name(index),
                    name
                ))
            })?;
            let target = dest.join(name);
            std::fs::write(&target, bytes)
                .map_err(|e| VaultError::Io(format!("Failed to write fetched file: {}", e)))?;
            fetched.push(target);
        }
        Ok(fetched)
    }

    fn read_date_marker(&mut self) -> VaultResult<Option<NaiveDate>> {
        Ok(self.slots[0]
            .as_ref()
            .and_then(|slot| slot.get(DATE_MARKER_NAME))
            .and_then(|bytes| decode_date_marker(&String::from_utf8_lossy(bytes))))
    }

    fn write_date_marker(&mut self, date: NaiveDate) -> VaultResult<()> {
        self.slots[0]
            .get_or_insert_with(HashMap::new)
            .insert(DATE_MARKER_NAME.to_string(), encode_date_marker(date).into_bytes());
        Ok(())
    }
}
