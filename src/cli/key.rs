//! Key generation CLI command

use std::path::Path;

use crate::crypto::generate_key_file;
use crate::error::VaultResult;

/// Generate a fresh 256-bit key file
pub fn handle_keygen_command(path: &Path) -> VaultResult<()> {
    generate_key_file(path)?;
    println!("Key written to {}", path.display());
    println!("Store a copy in a safe place: losing it makes every sealed backup unrecoverable.");
    Ok(())
}
