//! FTP retention store
//!
//! Slots are directories under a configured remote root. The protocol rename
//! (`RNFR`/`RNTO`) is atomic when source and destination live on the same
//! server, so a shift is one rename per slot. Directory contents must be
//! deleted file by file before the container can be removed.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use suppaftp::{FtpError, FtpStream, Mode, Status};

use crate::config::layout::{Layout, DATE_MARKER_NAME};
use crate::config::settings::FtpSettings;
use crate::error::{VaultError, VaultResult};

use super::{decode_date_marker, encode_date_marker, RetentionStore};

/// Retention store backed by directories on an FTP server
pub struct FtpStore {
    ftp: FtpStream,
    root: String,
    depth: u32,
    layout: Layout,
}

impl FtpStore {
    /// Connect and log in with the configured credentials
    pub fn connect(settings: &FtpSettings, depth: u32, layout: Layout) -> VaultResult<Self> {
        let address = if settings.server.contains(':') {
            settings.server.clone()
        } else {
            format!("{}:21", settings.server)
        };

        let mut ftp = FtpStream::connect(&address)
            .map_err(|e| VaultError::Transfer(format!("Failed to connect to {}: {}", address, e)))?;
        ftp.login(&settings.user, &settings.password)
            .map_err(|e| VaultError::Transfer(format!("FTP login failed: {}", e)))?;
        ftp.set_mode(if settings.passive {
            Mode::Passive
        } else {
            Mode::Active
        });

        Ok(Self {
            ftp,
            root: settings.root_path.trim_end_matches('/').to_string(),
            depth,
            layout,
        })
    }

    fn slot_path(&self, index: u32) -> String {
        remote_slot_path(&self.root, &self.layout, index)
    }

    fn file_path(&self, index: u32, name: &str) -> String {
        format!("{}/{}", self.slot_path(index), name)
    }

    /// File names currently under a slot directory; an absent directory
    /// reads as empty
    fn list_slot(&mut self, index: u32) -> VaultResult<Vec<String>> {
        let path = self.slot_path(index);
        match self.ftp.nlst(Some(&path)) {
            Ok(entries) => Ok(entries
                .into_iter()
                .map(|entry| entry.rsplit('/').next().unwrap_or(&entry).to_string())
                .filter(|name| name != "." && name != "..")
                .collect()),
            Err(ref e) if is_file_unavailable(e) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Absolute remote path of a slot directory
fn remote_slot_path(root: &str, layout: &Layout, index: u32) -> String {
    format!("{}/{}", root, layout.slot_name(index))
}

/// True for a 550 response: file or directory unavailable
fn is_file_unavailable(err: &FtpError) -> bool {
    matches!(
        err,
        FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable
    )
}

impl RetentionStore for FtpStore {
    fn depth(&self) -> u32 {
        self.depth
    }

    fn ensure_slots(&mut self) -> VaultResult<()> {
        for index in 0..self.depth {
            let path = self.slot_path(index);
            match self.ftp.mkdir(&path) {
                Ok(()) => {}
                // An existing directory answers 550; that is success here
                Err(ref e) if is_file_unavailable(e) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn delete_slot_contents(&mut self, index: u32) -> VaultResult<()> {
        for name in self.list_slot(index)? {
            let path = self.file_path(index, &name);
            self.ftp
                .rm(&path)
                .map_err(|e| VaultError::Transfer(format!("Failed to delete {}: {}", path, e)))?;
        }
        Ok(())
    }

    fn remove_slot(&mut self, index: u32) -> VaultResult<()> {
        let path = self.slot_path(index);
        match self.ftp.rmdir(&path) {
            Ok(()) => Ok(()),
            Err(ref e) if is_file_unavailable(e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn shift_slot(&mut self, from: u32, to: u32) -> VaultResult<()> {
        let src = self.slot_path(from);
        let dst = self.slot_path(to);
        self.ftp
            .rename(&src, &dst)
            .map_err(|e| VaultError::Transfer(format!("Failed to rename {} to {}: {}", src, dst, e)))
    }

    fn create_slot(&mut self, index: u32) -> VaultResult<()> {
        let path = self.slot_path(index);
        self.ftp
            .mkdir(&path)
            .map_err(|e| VaultError::Transfer(format!("Failed to create {}: {}", path, e)))
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

            let remote = self.file_path(0, &name);
            self.ftp
                .put_file(&remote, &mut Cursor::new(bytes))
                .map_err(|e| VaultError::Transfer(format!("Failed to upload {}: {}", remote, e)))?;
        }
        Ok(())
    }

    fn fetch(&mut self, index: u32, names: &[String], dest: &Path) -> VaultResult<Vec<PathBuf>> {
        let mut fetched = Vec::with_capacity(names.len());
        for name in names {
            let remote = self.file_path(index, name);
            let buffer = match self.ftp.retr_as_buffer(&remote) {
                Ok(buffer) => buffer,
                Err(ref e) if is_file_unavailable(e) => {
                    return Err(VaultError::artifact_not_found(remote));
                }
                Err(e) => return Err(e.into()),
            };

            let target = dest.join(name);
            std::fs::write(&target, buffer.into_inner())
                .map_err(|e| VaultError::Io(format!("Failed to write fetched file: {}", e)))?;
            fetched.push(target);
        }
        Ok(fetched)
    }

    fn read_date_marker(&mut self) -> VaultResult<Option<NaiveDate>> {
        let remote = self.file_path(0, DATE_MARKER_NAME);
        match self.ftp.retr_as_buffer(&remote) {
            Ok(buffer) => Ok(decode_date_marker(&String::from_utf8_lossy(
                &buffer.into_inner(),
            ))),
            Err(ref e) if is_file_unavailable(e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_date_marker(&mut self, date: NaiveDate) -> VaultResult<()> {
        let remote = self.file_path(0, DATE_MARKER_NAME);
        self.ftp
            .put_file(&remote, &mut Cursor::new(encode_date_marker(date).into_bytes()))
            .map_err(|e| VaultError::Transfer(format!("Failed to upload {}: {}", remote, e)))?;
        Ok(())
    }
}

impl Drop for FtpStore {
    fn drop(&mut self) {
        // Best-effort QUIT; the server reaps dead sessions anyway
        let _ = self.ftp.quit();
    }
}
