//! Persisted layout of a retention tree
//!
//! Local, S3 and FTP stores all use the same slot and artifact names so that
//! operators can reason about local/remote parity by name alone:
//!
//! ```text
//! <root>/DAYJ/            current generation (slot 0)
//! <root>/DAYJ-1/          one day old
//! <root>/DAYJ-(N-1)/      oldest retained generation
//! ```
//!
//! Each populated slot holds `<db>.sql.gz.enc`, `site.tar.gz.enc` and
//! `date.txt`.

use chrono::NaiveDate;

/// Extension appended to a sealed artifact
pub const SEALED_EXT: &str = "enc";

/// Filename of the site file-tree archive
pub const SITE_ARCHIVE_NAME: &str = "site.tar.gz";

/// Filename of the date marker in slot 0
pub const DATE_MARKER_NAME: &str = "date.txt";

/// Naming scheme shared by every retention store
#[derive(Debug, Clone)]
pub struct Layout {
    /// Database name, used to name the dump artifact
    db_name: String,
}

impl Layout {
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
        }
    }

    /// Name of the generation slot at the given recency index.
    /// Slot 0 is `DAYJ` (current), slot k is `DAYJ-k` (k days old).
    pub fn slot_name(&self, index: u32) -> String {
        if index == 0 {
            "DAYJ".to_string()
        } else {
            format!("DAYJ-{}", index)
        }
    }

    /// Name of the gzipped database dump artifact
    pub fn db_dump_name(&self) -> String {
        format!("{}.sql.gz", self.db_name)
    }

    /// Name of the site archive artifact
    pub fn site_archive_name(&self) -> String {
        SITE_ARCHIVE_NAME.to_string()
    }

    /// Sealed counterpart of an artifact name
    pub fn sealed_name(&self, name: &str) -> String {
        format!("{}.{}", name, SEALED_EXT)
    }

    /// The sealed artifact names a populated slot is expected to hold
    pub fn sealed_artifact_names(&self) -> Vec<String> {
        vec![
            self.sealed_name(&self.db_dump_name()),
            self.sealed_name(&self.site_archive_name()),
        ]
    }

    /// Scratch directory name for a backup run on the given date
    pub fn backup_scratch_name(&self, date: NaiveDate) -> String {
        format!("WORK-{}", date.format("%Y%m%d"))
    }

    /// Scratch directory name for a restore run on the given date
    pub fn restore_scratch_name(&self, date: NaiveDate) -> String {
        format!("RESTORE-{}", date.format("%Y%m%d"))
    }
}
