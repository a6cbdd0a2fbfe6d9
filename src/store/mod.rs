//! Retention stores
//!
//! A retention store keeps up to `N` daily generations of backup artifacts in
//! named slots (`DAYJ`, `DAYJ-1`, …). Three media implement the same
//! contract: local directories, S3 key prefixes, and FTP directories. The
//! rotation engine (`crate::rotate`) is written once against the trait; the
//! backends only realize "move", "delete-all" and the slot containers for
//! their medium.

pub mod ftp;
pub mod local;
pub mod memory;
pub mod s3;

pub use ftp::FtpStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::VaultResult;

/// Generation-rotation contract shared by all storage media
///
/// Slot indices run `0..depth`; slot 0 is the current generation, slot
/// `depth - 1` the oldest. Implementations must make `ensure_slots`
/// idempotent and treat `delete_slot_contents` of an already-empty slot as
/// success.
pub trait RetentionStore {
    /// Configured retention depth `N` (always >= 2)
    fn depth(&self) -> u32;

    /// Idempotently create slots `0..N-1` where the medium has containers
    fn ensure_slots(&mut self) -> VaultResult<()>;

    /// Remove every artifact under the given slot, leaving the container
    fn delete_slot_contents(&mut self, index: u32) -> VaultResult<()>;

    /// Remove the (empty) slot container, where the medium has one
    fn remove_slot(&mut self, index: u32) -> VaultResult<()>;

    /// Move a whole slot to another index (rename on media that support it)
    fn shift_slot(&mut self, from: u32, to: u32) -> VaultResult<()>;

    /// Create an empty slot container at the given index
    fn create_slot(&mut self, index: u32) -> VaultResult<()>;

    /// Write the given local files into slot 0, replacing same-named content
    fn publish(&mut self, files: &[PathBuf]) -> VaultResult<()>;

    /// Retrieve named artifacts from a slot into a local scratch directory
    fn fetch(&mut self, index: u32, names: &[String], dest: &Path) -> VaultResult<Vec<PathBuf>>;

    /// Read the date marker from slot 0, if present
    fn read_date_marker(&mut self) -> VaultResult<Option<NaiveDate>>;

    /// Write the date marker into slot 0
    fn write_date_marker(&mut self, date: NaiveDate) -> VaultResult<()>;
}

/// Serialize a date marker to its on-disk form (ISO date plus newline)
pub(crate) fn encode_date_marker(date: NaiveDate) -> String {
    format!("{}\n", date.format("%Y-%m-%d"))
}

/// Parse a date marker, tolerating surrounding whitespace
pub(crate) fn decode_date_marker(contents: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(contents.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_marker_round_trip() {
        let date = NaiveDate::from_ymd_opt(2021, 10, 1).unwrap();
        let encoded = encode_date_marker(date);
        assert_eq!(encoded, "2021-10-01\n");
        assert_eq!(decode_date_marker(&encoded), Some(date));
    }

    #[test]
    fn test_date_marker_garbage() {
        assert_eq!(decode_date_marker("yesterday"), None);
        assert_eq!(decode_date_marker(""), None);
    }
}
