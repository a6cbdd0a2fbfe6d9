//! S3 retention store
//!
//! Slots are key prefixes inside one bucket (`DAYJ/`, `DAYJ-1/`, …). Object
//! storage has no rename, so a shift lists every object under the source
//! prefix, server-side copies it under the destination prefix and deletes the
//! source object. Slot containers do not exist on this medium; the container
//! operations are no-ops.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use crate::config::layout::{Layout, DATE_MARKER_NAME};
use crate::config::settings::S3Settings;
use crate::error::{VaultError, VaultResult};

use super::{decode_date_marker, encode_date_marker, RetentionStore};

/// Retention store backed by key prefixes in an S3 bucket
pub struct S3Store {
    bucket: Bucket,
    depth: u32,
    layout: Layout,
}

impl S3Store {
    /// Build a store from the configured credentials and endpoint
    ///
    /// The underlying client retries transient HTTP failures with a bounded
    /// budget; exhaustion surfaces here as a single `Transfer` error.
    pub fn from_settings(settings: &S3Settings, depth: u32, layout: Layout) -> VaultResult<Self> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| VaultError::Config(format!("Invalid S3 region: {}", e)))?,
        };

        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| VaultError::Config(format!("Invalid S3 credentials: {}", e)))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials)?;
        if settings.endpoint.is_some() {
            // Compatible stores (MinIO and friends) want path-style requests
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            depth,
            layout,
        })
    }

    /// Key prefix of a slot, with trailing separator
    fn slot_prefix(&self, index: u32) -> String {
        format!("{}/", self.layout.slot_name(index))
    }

    /// Full key of an artifact inside a slot
    fn object_key(&self, index: u32, name: &str) -> String {
        format!("{}/{}", self.layout.slot_name(index), name)
    }

    /// List every object key under a slot prefix
    fn list_slot(&self, index: u32) -> VaultResult<Vec<String>> {
        let pages = self.bucket.list(self.slot_prefix(index), None)?;
        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key)
            .collect())
    }
}

/// Map a GET failure to NotFound when the object is absent
fn map_get_error(err: S3Error, what: impl Into<String>) -> VaultError {
    match err {
        S3Error::HttpFailWithBody(404, _) => VaultError::artifact_not_found(what.into()),
        other => other.into(),
    }
}

impl RetentionStore for S3Store {
    fn depth(&self) -> u32 {
        self.depth
    }

    fn ensure_slots(&mut self) -> VaultResult<()> {
        // Key prefixes spring into existence with their first object
        Ok(())
    }

    fn delete_slot_contents(&mut self, index: u32) -> VaultResult<()> {
        // No recursive delete in the protocol: list, then delete each.
        // An empty listing means an already-empty slot, which is success.
        for key in self.list_slot(index)? {
            self.bucket.delete_object(&key)?;
        }
        Ok(())
    }

    fn remove_slot(&mut self, _index: u32) -> VaultResult<()> {
        Ok(())
    }

    fn shift_slot(&mut self, from: u32, to: u32) -> VaultResult<()> {
        for key in self.list_slot(from)? {
            let name = key.rsplit('/').next().unwrap_or(&key);
            let new_key = self.object_key(to, name);
            self.bucket.copy_object_internal(&key, &new_key)?;
            self.bucket.delete_object(&key)?;
        }
        Ok(())
    }

    fn create_slot(&mut self, _index: u32) -> VaultResult<()> {
        Ok(())
    }

    fn publish(&mut self, files: &[PathBuf]) -> VaultResult<()> {
        for file in files {
            let name = file
                .file_name()
                .ok_or_else(|| VaultError::Io(format!("{} has no file name", file.display())))?
                .to_string_lossy()
                .to_string();
            let bytes = std::fs::read(file)
                .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
            self.bucket.put_object(self.object_key(0, &name), &bytes)?;
        }
        Ok(())
    }

    fn fetch(&mut self, index: u32, names: &[String], dest: &Path) -> VaultResult<Vec<PathBuf>> {
        let mut fetched = Vec::with_capacity(names.len());
        for name in names {
            let key = self.object_key(index, name);
            let response = self
                .bucket
                .get_object(&key)
                .map_err(|e| map_get_error(e, &key))?;

            let target = dest.join(name);
            std::fs::write(&target, response.bytes())
                .map_err(|e| VaultError::Io(format!("Failed to write fetched file: {}", e)))?;
            fetched.push(target);
        }
        Ok(fetched)
    }

    fn read_date_marker(&mut self) -> VaultResult<Option<NaiveDate>> {
        let key = self.object_key(0, DATE_MARKER_NAME);
        match self.bucket.get_object(&key) {
            Ok(response) => Ok(decode_date_marker(&String::from_utf8_lossy(
                response.bytes(),
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_date_marker(&mut self, date: NaiveDate) -> VaultResult<()> {
        let key = self.object_key(0, DATE_MARKER_NAME);
        self.bucket
            .put_object(key, encode_date_marker(date).as_bytes())?;
        Ok(())
    }
}
