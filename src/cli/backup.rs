//! Backup CLI command

use chrono::Local;

use crate::backup::{BackupOrchestrator, BackupOutcome};
use crate::config::layout::Layout;
use crate::config::settings::Settings;
use crate::crypto::load_key_file;
use crate::error::VaultResult;
use crate::notify::ConsoleNotifier;
use crate::producer::ShellProducer;
use crate::store::LocalStore;

use super::open_remote;

/// Run today's backup against the configured stores
pub fn handle_backup_command(settings: &Settings) -> VaultResult<()> {
    let layout = Layout::new(settings.database.name.clone());
    let key = load_key_file(&settings.key_file)?;
    let today = Local::now().date_naive();

    let producer = ShellProducer::new(
        settings.database.clone(),
        settings.site.clone(),
        layout.clone(),
    );
    let mut local = LocalStore::new(
        settings.local_root.clone(),
        settings.retention_depth,
        layout.clone(),
    );
    let mut remote = open_remote(settings, &layout)?;
    let notifier = ConsoleNotifier;

    let scratch = settings
        .local_root
        .join(layout.backup_scratch_name(today));

    println!("Starting backup of {} to {}", settings.site.path.display(), settings.destination);

    let mut orchestrator = BackupOrchestrator::new(
        &producer,
        &mut local,
        remote.as_deref_mut(),
        &notifier,
        &key,
        scratch,
    );

    match orchestrator.run(today)? {
        BackupOutcome::AlreadyDone => {
            println!("A backup already ran today ({}); nothing to do.", today);
        }
        BackupOutcome::Completed => {
            println!("Backup completed.");
            println!(
                "Current generation: {}",
                settings.local_root.join(layout.slot_name(0)).display()
            );
        }
    }

    Ok(())
}
