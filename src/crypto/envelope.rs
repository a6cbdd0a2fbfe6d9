//! AES-256-GCM envelope for artifact files
//!
//! Every artifact is sealed before it leaves the local host. The sealed file
//! layout is `nonce (16 bytes) ‖ tag (16 bytes) ‖ ciphertext`, written next
//! to the plaintext with an `.enc` extension appended. A fresh random nonce
//! is generated per call; a counter is never used, so nonce reuse cannot be
//! reintroduced by a reset.
//!
//! Both operations leave their input file in place; cleanup of plaintext
//! scratch files is the orchestrator's responsibility.

use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore, Aead, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce,
};

use crate::config::layout::SEALED_EXT;
use crate::error::{VaultError, VaultResult};

use super::keyfile::KeyMaterial;

/// Size of the nonce in bytes
const NONCE_SIZE: usize = 16;

/// Size of the authentication tag in bytes
const TAG_SIZE: usize = 16;

/// AES-256-GCM with a 16-byte nonce, matching the persisted envelope layout
type EnvelopeCipher = AesGcm<Aes256, U16>;

fn cipher(key: &KeyMaterial) -> VaultResult<EnvelopeCipher> {
    EnvelopeCipher::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(format!("Invalid key length: {}", e)))
}

/// Seal a plaintext file, producing `<path>.enc`
///
/// Returns the path of the sealed file. The plaintext file is left in place.
pub fn seal_file(path: &Path, key: &KeyMaterial) -> VaultResult<PathBuf> {
    let plaintext = std::fs::read(path)
        .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    let cipher = cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::<U16>::from_slice(&nonce_bytes);

    // The aead API appends the tag to the ciphertext; the envelope stores it
    // detached, between the nonce and the ciphertext.
    let mut sealed = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|e| VaultError::Crypto(format!("Encryption failed: {}", e)))?;
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);
    let ciphertext = sealed;

    let sealed_path = sealed_path_for(path);
    let mut contents = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + ciphertext.len());
    contents.extend_from_slice(&nonce_bytes);
    contents.extend_from_slice(&tag);
    contents.extend_from_slice(&ciphertext);

    std::fs::write(&sealed_path, contents).map_err(|e| {
        VaultError::Io(format!(
            "Failed to write sealed file {}: {}",
            sealed_path.display(),
            e
        ))
    })?;

    Ok(sealed_path)
}

/// Open a sealed file, producing the plaintext at the path with `.enc`
/// stripped
///
/// Fails with an authentication error if the tag does not verify (tampered
/// data or wrong key). The sealed file is left in place.
pub fn open_file(path: &Path, key: &KeyMaterial) -> VaultResult<PathBuf> {
    let plain_path = plaintext_path_for(path)?;

    let contents = std::fs::read(path)
        .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    if contents.len() < NONCE_SIZE + TAG_SIZE {
        return Err(VaultError::Crypto(format!(
            "Sealed file {} is shorter than the {}-byte envelope header",
            path.display(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let nonce = Nonce::<U16>::from_slice(&contents[..NONCE_SIZE]);
    let tag = &contents[NONCE_SIZE..NONCE_SIZE + TAG_SIZE];
    let ciphertext = &contents[NONCE_SIZE + TAG_SIZE..];

    let cipher = cipher(key)?;

    let mut buffer = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    buffer.extend_from_slice(ciphertext);
    buffer.extend_from_slice(tag);

    let plaintext = cipher.decrypt(nonce, buffer.as_ref()).map_err(|_| {
        VaultError::Authentication(format!(
            "Tag verification failed for {}: tampered data or wrong key",
            path.display()
        ))
    })?;

    std::fs::write(&plain_path, plaintext).map_err(|e| {
        VaultError::Io(format!(
            "Failed to write plaintext {}: {}",
            plain_path.display(),
            e
        ))
    })?;

    Ok(plain_path)
}

/// Sealed counterpart of a plaintext path (`.enc` appended)
fn sealed_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(SEALED_EXT);
    PathBuf::from(os)
}

/// Plaintext counterpart of a sealed path (`.enc` stripped)
fn plaintext_path_for(path: &Path) -> VaultResult<PathBuf> {
    match path.extension() {
        Some(ext) if ext == SEALED_EXT => Ok(path.with_extension("")),
        _ => Err(VaultError::Crypto(format!(
            "{} does not carry the .{} extension",
            path.display(),
            SEALED_EXT
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_key() -> KeyMaterial {
        KeyMaterial::new([0x42; 32])
    }

    fn seal_bytes(dir: &Path, data: &[u8]) -> PathBuf {
        let plain = dir.join("artifact.sql.gz");
        std::fs::write(&plain, data).unwrap();
        seal_file(&plain, &test_key()).unwrap()
    }

    #[test]
    fn test_seal_open_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let data = b"-- MySQL dump\nINSERT INTO wp_posts VALUES (1);\n";

        let sealed = seal_bytes(temp_dir.path(), data);
        assert_eq!(sealed, temp_dir.path().join("artifact.sql.gz.enc"));

        // Clear the plaintext so the round trip is observable
        std::fs::remove_file(temp_dir.path().join("artifact.sql.gz")).unwrap();

        let opened = open_file(&sealed, &test_key()).unwrap();
        assert_eq!(opened, temp_dir.path().join("artifact.sql.gz"));
        assert_eq!(std::fs::read(&opened).unwrap(), data);
    }

    #[test]
    fn test_round_trip_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let sealed = seal_bytes(temp_dir.path(), b"");

        // Envelope header only: nonce + tag
        assert_eq!(std::fs::metadata(&sealed).unwrap().len(), 32);

        std::fs::remove_file(temp_dir.path().join("artifact.sql.gz")).unwrap();
        let opened = open_file(&sealed, &test_key()).unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), b"");
    }

    #[test]
    fn test_inputs_left_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let sealed = seal_bytes(temp_dir.path(), b"payload");

        assert!(temp_dir.path().join("artifact.sql.gz").exists());

        open_file(&sealed, &test_key()).unwrap();
        assert!(sealed.exists());
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("artifact.sql.gz");
        std::fs::write(&plain, b"same plaintext").unwrap();

        let sealed = seal_file(&plain, &test_key()).unwrap();
        let first = std::fs::read(&sealed).unwrap();
        let sealed = seal_file(&plain, &test_key()).unwrap();
        let second = std::fs::read(&sealed).unwrap();

        assert_ne!(first[..16], second[..16]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_single_bit_tamper_detected() {
        let temp_dir = TempDir::new().unwrap();
        let sealed = seal_bytes(temp_dir.path(), b"generation A contents");
        let original = std::fs::read(&sealed).unwrap();

        // Flip one bit in the nonce, the tag and the ciphertext in turn
        for offset in [0, 16, 32, original.len() - 1] {
            let mut tampered = original.clone();
            tampered[offset] ^= 0x01;
            std::fs::write(&sealed, &tampered).unwrap();

            let err = open_file(&sealed, &test_key()).unwrap_err();
            assert!(err.is_authentication(), "offset {}: {:?}", offset, err);
        }
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let temp_dir = TempDir::new().unwrap();
        let sealed = seal_bytes(temp_dir.path(), b"payload");

        let wrong_key = KeyMaterial::new([0x43; 32]);
        let err = open_file(&sealed, &wrong_key).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let sealed = temp_dir.path().join("stub.enc");
        std::fs::write(&sealed, [0u8; 20]).unwrap();

        let err = open_file(&sealed, &test_key()).unwrap_err();
        assert!(matches!(err, VaultError::Crypto(_)));
    }

    #[test]
    fn test_open_requires_sealed_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("artifact.sql.gz");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let err = open_file(&path, &test_key()).unwrap_err();
        assert!(matches!(err, VaultError::Crypto(_)));
    }

    #[test]
    fn test_seal_missing_source_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = seal_file(&temp_dir.path().join("absent"), &test_key()).unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }
}
