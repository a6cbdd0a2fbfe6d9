//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the orchestrators.

pub mod backup;
pub mod key;
pub mod restore;

pub use backup::handle_backup_command;
pub use key::handle_keygen_command;
pub use restore::handle_restore_command;

use crate::config::layout::Layout;
use crate::config::settings::{Destination, Settings};
use crate::error::{VaultError, VaultResult};
use crate::store::{FtpStore, LocalStore, RetentionStore, S3Store};

/// Build the retention store for a destination from the loaded settings
pub(crate) fn open_store(
    settings: &Settings,
    destination: Destination,
    layout: &Layout,
) -> VaultResult<Box<dyn RetentionStore>> {
    let depth = settings.retention_depth;
    match destination {
        Destination::Local => Ok(Box::new(LocalStore::new(
            settings.local_root.clone(),
            depth,
            layout.clone(),
        ))),
        Destination::S3 => {
            let s3 = settings
                .s3
                .as_ref()
                .ok_or_else(|| VaultError::Config("Missing [s3] section".into()))?;
            Ok(Box::new(S3Store::from_settings(s3, depth, layout.clone())?))
        }
        Destination::Ftp => {
            let ftp = settings
                .ftp
                .as_ref()
                .ok_or_else(|| VaultError::Config("Missing [ftp] section".into()))?;
            Ok(Box::new(FtpStore::connect(ftp, depth, layout.clone())?))
        }
    }
}

/// Remote store for a backup run, None when the destination is local-only
pub(crate) fn open_remote(
    settings: &Settings,
    layout: &Layout,
) -> VaultResult<Option<Box<dyn RetentionStore>>> {
    match settings.destination {
        Destination::Local => Ok(None),
        other => open_store(settings, other, layout).map(Some),
    }
}
