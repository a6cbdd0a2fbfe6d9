//! Key file handling
//!
//! The encryption key is a 256-bit secret generated once out-of-band
//! (`sitevault keygen`) and loaded read-only at the start of any run that
//! seals or opens artifacts. The key is never persisted alongside artifacts
//! and its in-memory copy is zeroed on drop.

use std::fs;
use std::io::Read;
use std::path::Path;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{VaultError, VaultResult};

/// Size of the key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// A 256-bit encryption key, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_SIZE],
}

impl KeyMaterial {
    /// Wrap raw key bytes
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key bytes
        write!(f, "KeyMaterial([REDACTED; {} bytes])", KEY_SIZE)
    }
}

/// Load the key from a file
///
/// The file handle is scoped to this function and released as soon as the
/// bytes are read; it is never held open across network calls.
pub fn load_key_file(path: &Path) -> VaultResult<KeyMaterial> {
    let mut file = fs::File::open(path).map_err(|e| {
        VaultError::Io(format!("Failed to open key file {}: {}", path.display(), e))
    })?;

    let mut bytes = [0u8; KEY_SIZE];
    file.read_exact(&mut bytes).map_err(|e| {
        VaultError::Crypto(format!(
            "Key file {} does not hold {} bytes: {}",
            path.display(),
            KEY_SIZE,
            e
        ))
    })?;

    // Reject files with trailing content: likely not a raw key file
    let mut probe = [0u8; 1];
    match file.read(&mut probe) {
        Ok(0) => {}
        Ok(_) => {
            bytes.zeroize();
            return Err(VaultError::Crypto(format!(
                "Key file {} is longer than {} bytes",
                path.display(),
                KEY_SIZE
            )));
        }
        Err(e) => {
            bytes.zeroize();
            return Err(VaultError::Io(format!("Failed to read key file: {}", e)));
        }
    }

    Ok(KeyMaterial::new(bytes))
}

/// Generate a fresh 256-bit key and write it to a file
///
/// Refuses to overwrite an existing key file: losing a key makes every
/// sealed generation unrecoverable.
pub fn generate_key_file(path: &Path) -> VaultResult<()> {
    if path.exists() {
        return Err(VaultError::Crypto(format!(
            "Key file {} already exists; refusing to overwrite",
            path.display()
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);

    let result = fs::write(path, bytes)
        .map_err(|e| VaultError::Io(format!("Failed to write key file: {}", e)));
    bytes.zeroize();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("key");

        generate_key_file(&key_path).unwrap();
        let key = load_key_file(&key_path).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("key");

        generate_key_file(&key_path).unwrap();
        let err = generate_key_file(&key_path).unwrap_err();
        assert!(matches!(err, VaultError::Crypto(_)));
    }

    #[test]
    fn test_load_short_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("key");
        std::fs::write(&key_path, [0u8; 16]).unwrap();

        let err = load_key_file(&key_path).unwrap_err();
        assert!(matches!(err, VaultError::Crypto(_)));
    }

    #[test]
    fn test_load_long_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("key");
        std::fs::write(&key_path, [0u8; 48]).unwrap();

        let err = load_key_file(&key_path).unwrap_err();
        assert!(matches!(err, VaultError::Crypto(_)));
    }

    #[test]
    fn test_load_missing_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_key_file(&temp_dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = KeyMaterial::new([7u8; KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));
    }
}
