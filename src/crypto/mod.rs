//! Cryptographic functions for sitevault
//!
//! Provides the AES-256-GCM envelope applied to every artifact before it
//! leaves the local host, and loading/generation of the 256-bit key file.

pub mod envelope;
pub mod keyfile;

pub use envelope::{open_file, seal_file};
pub use keyfile::{generate_key_file, load_key_file, KeyMaterial};
