//! Generation rotation engine
//!
//! One store-agnostic algorithm shared by the local, S3 and FTP backends:
//!
//! 1. ensure slots exist
//! 2. delete the contents of slot `N-1`, then its container
//! 3. shift `N-2 -> N-1`, …, `0 -> 1` in descending order
//! 4. create a fresh, empty slot 0
//!
//! The descending shift order is load-bearing: ascending order would
//! overwrite a generation that has not been relocated yet. Any failing step
//! aborts the rotation; a partially rotated store is left for operator
//! inspection, never resumed automatically. The once-per-day guard is the
//! caller's job (the backup orchestrator checks the date marker before
//! rotating).

use crate::error::VaultResult;
use crate::store::RetentionStore;

/// Rotate every generation of the given store one slot towards the oldest
///
/// Discards the previous contents of slot `N-1` and leaves slot 0 empty.
/// Must be called at most once per calendar day per store.
pub fn rotate(store: &mut dyn RetentionStore) -> VaultResult<()> {
    let depth = store.depth();

    store.ensure_slots()?;

    // The oldest generation goes first. If this fails the shift chain is
    // never started and every retained generation is still intact.
    store.delete_slot_contents(depth - 1)?;
    store.remove_slot(depth - 1)?;

    for k in (0..depth - 1).rev() {
        store.shift_slot(k, k + 1)?;
    }

    store.create_slot(0)
}
