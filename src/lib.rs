//! sitevault - generational, encrypted website backups
//!
//! This library implements scheduled, retention-bounded backups of a website
//! file tree and its MySQL database. Each daily generation is sealed with
//! AES-256-GCM and replicated to one of three retention stores: the local
//! filesystem, an S3 bucket, or an FTP server. Generations rotate through a
//! fixed-depth window of named slots (`DAYJ`, `DAYJ-1`, …), and a date marker
//! keeps rotation to at most once per calendar day.
//!
//! # Architecture
//!
//! - `config`: settings file and persisted naming layout
//! - `error`: custom error types
//! - `crypto`: envelope sealing/opening and key-file handling
//! - `store`: the retention-store contract and its three backends
//! - `rotate`: the store-agnostic generation rotation engine
//! - `producer`: database dump / site archive production and restore
//! - `backup`: the backup and restore orchestrators
//! - `notify`: best-effort operator notifications
//! - `cli`: command handlers for the `sitevault` binary

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod notify;
pub mod producer;
pub mod rotate;
pub mod store;

pub use error::{VaultError, VaultResult};
