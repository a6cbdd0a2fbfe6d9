//! Backup orchestration
//!
//! One run is a linear pipeline: rotate the local store, produce the two
//! artifacts, seal them, rotate the remote store, publish to remote then
//! local slot 0, and finally write the date marker. Any failure is terminal
//! for the run and leaves the date marker untouched, so the next scheduled
//! run retries the whole day's backup from scratch.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::crypto::{envelope, KeyMaterial};
use crate::error::VaultResult;
use crate::notify::NotificationSink;
use crate::producer::ArtifactProducer;
use crate::rotate::rotate;
use crate::store::RetentionStore;

/// Result of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A backup already ran today; nothing was rotated or written
    AlreadyDone,
    /// A new generation was published
    Completed,
}

/// Sequences one backup run over injected stores and producer
pub struct BackupOrchestrator<'a> {
    producer: &'a dyn ArtifactProducer,
    local: &'a mut dyn RetentionStore,
    // The `'static` bound keeps the borrow of a boxed remote store from
    // tying the box's contents to `'a`, which would trip dropck for
    // backends with destructors (the FTP session).
    remote: Option<&'a mut (dyn RetentionStore + 'static)>,
    notifier: &'a dyn NotificationSink,
    key: &'a KeyMaterial,
    scratch: PathBuf,
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(
        producer: &'a dyn ArtifactProducer,
        local: &'a mut dyn RetentionStore,
        remote: Option<&'a mut (dyn RetentionStore + 'static)>,
        notifier: &'a dyn NotificationSink,
        key: &'a KeyMaterial,
        scratch: PathBuf,
    ) -> Self {
        Self {
            producer,
            local,
            remote,
            notifier,
            key,
            scratch,
        }
    }

    /// Run the backup pipeline for the given calendar day
    pub fn run(&mut self, today: NaiveDate) -> VaultResult<BackupOutcome> {
        match self.execute(today) {
            Ok(BackupOutcome::AlreadyDone) => Ok(BackupOutcome::AlreadyDone),
            Ok(BackupOutcome::Completed) => {
                self.notifier
                    .notify("Backup completed", &format!("Generation {} published", today));
                Ok(BackupOutcome::Completed)
            }
            Err(e) => {
                self.notifier.notify("Backup failed", &e.to_string());
                Err(e)
            }
        }
    }

    fn execute(&mut self, today: NaiveDate) -> VaultResult<BackupOutcome> {
        // Idempotent short-circuit: at most one rotation per calendar day
        if self.local.read_date_marker()? == Some(today) {
            return Ok(BackupOutcome::AlreadyDone);
        }

        rotate(self.local)?;

        fs::create_dir_all(&self.scratch)?;
        let dump = self.producer.database_dump(&self.scratch)?;
        let archive = self.producer.site_archive(&self.scratch)?;

        let sealed = vec![
            envelope::seal_file(&dump, self.key)?,
            envelope::seal_file(&archive, self.key)?,
        ];

        if let Some(remote) = self.remote.as_deref_mut() {
            rotate(remote)?;
            remote.publish(&sealed)?;
        }
        self.local.publish(&sealed)?;

        // The remote marker mirrors the layout; the local marker is the
        // authority for the once-per-day guard and is written last.
        if let Some(remote) = self.remote.as_deref_mut() {
            remote.write_date_marker(today)?;
        }
        self.local.write_date_marker(today)?;

        // Plaintext and sealed scratch files are no longer needed
        let _ = fs::remove_dir_all(&self.scratch);

        Ok(BackupOutcome::Completed)
    }
}
