//! Restore CLI command

use chrono::Local;

use crate::backup::RestoreOrchestrator;
use crate::config::layout::Layout;
use crate::config::settings::{Destination, Settings};
use crate::crypto::load_key_file;
use crate::error::VaultResult;
use crate::producer::ShellProducer;

use super::open_store;

/// Restore a chosen generation from a chosen store
///
/// `generation` 0 is the most recent backup; `from` defaults to the
/// configured backup destination.
pub fn handle_restore_command(
    settings: &Settings,
    generation: u32,
    from: Option<Destination>,
) -> VaultResult<()> {
    let source = from.unwrap_or(settings.destination);
    let layout = Layout::new(settings.database.name.clone());
    let key = load_key_file(&settings.key_file)?;
    let today = Local::now().date_naive();

    let producer = ShellProducer::new(
        settings.database.clone(),
        settings.site.clone(),
        layout.clone(),
    );
    let mut store = open_store(settings, source, &layout)?;

    let scratch = settings
        .local_root
        .join(layout.restore_scratch_name(today));

    println!(
        "Restoring generation {} ({}) from {}",
        generation,
        layout.slot_name(generation),
        source
    );

    let mut orchestrator =
        RestoreOrchestrator::new(&producer, store.as_mut(), &key, layout, scratch);
    orchestrator.run(generation)?;

    println!("Restore completed.");
    println!("Database and site tree were reinstated; verify the site before serving traffic.");
    Ok(())
}
