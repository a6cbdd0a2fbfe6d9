//! Artifact production and restoration
//!
//! The backup pipeline consumes two artifacts per run: a gzipped database
//! dump and a gzipped tar of the website file tree. Producing and restoring
//! them involves external tools (`mysqldump`, `mysql`), so the capability is
//! behind a trait and the orchestrators are tested against an in-memory fake.

use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::layout::Layout;
use crate::config::settings::{DatabaseSettings, SiteSettings};
use crate::error::{VaultError, VaultResult};

/// Produces backup artifacts and reinstates them on restore
pub trait ArtifactProducer {
    /// Dump the database as `<db>.sql.gz` into the scratch directory
    fn database_dump(&self, scratch: &Path) -> VaultResult<PathBuf>;

    /// Archive the site file tree as `site.tar.gz` into the scratch directory
    fn site_archive(&self, scratch: &Path) -> VaultResult<PathBuf>;

    /// Feed a gzipped dump back into the database
    fn restore_database(&self, dump: &Path) -> VaultResult<()>;

    /// Unpack a site archive over the site root
    fn restore_site(&self, archive: &Path) -> VaultResult<()>;
}

/// Real producer: `mysqldump`/`mysql` child processes, in-process tar + gzip
pub struct ShellProducer {
    database: DatabaseSettings,
    site: SiteSettings,
    layout: Layout,
}

impl ShellProducer {
    pub fn new(database: DatabaseSettings, site: SiteSettings, layout: Layout) -> Self {
        Self {
            database,
            site,
            layout,
        }
    }

    fn mysql_command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("-h")
            .arg(&self.database.host)
            .arg("-u")
            .arg(&self.database.user)
            // The password travels through the environment, never argv,
            // where any local user could read it from the process table.
            .env("MYSQL_PWD", &self.database.password)
            .arg(&self.database.name);
        cmd
    }
}

impl ArtifactProducer for ShellProducer {
    fn database_dump(&self, scratch: &Path) -> VaultResult<PathBuf> {
        let dump_path = scratch.join(self.layout.db_dump_name());

        let mut child = self
            .mysql_command("mysqldump")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VaultError::External(format!("Failed to run mysqldump: {}", e)))?;
        let stderr = drain_stderr(&mut child);

        let out_file = fs::File::create(&dump_path)
            .map_err(|e| VaultError::Io(format!("Failed to create dump file: {}", e)))?;
        let mut encoder = GzEncoder::new(out_file, Compression::default());

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| VaultError::External("mysqldump produced no stdout".into()))?;
        io::copy(&mut stdout, &mut encoder)
            .map_err(|e| VaultError::Io(format!("Failed to write dump: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| VaultError::Io(format!("Failed to finish gzip stream: {}", e)))?;

        let status = child
            .wait()
            .map_err(|e| VaultError::External(format!("mysqldump did not exit: {}", e)))?;
        if !status.success() {
            return Err(VaultError::External(format!(
                "mysqldump exited with {}: {}",
                status,
                stderr_text(stderr)
            )));
        }

        Ok(dump_path)
    }

    fn site_archive(&self, scratch: &Path) -> VaultResult<PathBuf> {
        let archive_path = scratch.join(self.layout.site_archive_name());
        archive_tree(&self.site.path, &archive_path)?;
        Ok(archive_path)
    }

    fn restore_database(&self, dump: &Path) -> VaultResult<()> {
        let file = fs::File::open(dump)
            .map_err(|e| VaultError::Io(format!("Failed to open dump {}: {}", dump.display(), e)))?;
        let mut decoder = GzDecoder::new(BufReader::new(file));

        let mut child = self
            .mysql_command("mysql")
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VaultError::External(format!("Failed to run mysql: {}", e)))?;
        let stderr = drain_stderr(&mut child);

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| VaultError::External("mysql accepted no stdin".into()))?;
            io::copy(&mut decoder, &mut stdin)
                .map_err(|e| VaultError::External(format!("Failed to feed dump to mysql: {}", e)))?;
            stdin
                .flush()
                .map_err(|e| VaultError::External(format!("Failed to flush mysql stdin: {}", e)))?;
        }

        let status = child
            .wait()
            .map_err(|e| VaultError::External(format!("mysql did not exit: {}", e)))?;
        if !status.success() {
            return Err(VaultError::External(format!(
                "mysql exited with {}: {}",
                status,
                stderr_text(stderr)
            )));
        }
        Ok(())
    }

    fn restore_site(&self, archive: &Path) -> VaultResult<()> {
        unpack_tree(archive, &self.site.path)
    }
}

/// Start collecting the child's stderr on a background thread.
///
/// A pipe holds about 64 KiB. A child that fills its stderr pipe blocks,
/// and if this process is simultaneously blocked on the child's other
/// pipe (reading its stdout, or feeding its stdin), neither side ever
/// moves again. Draining stderr concurrently keeps the child runnable
/// no matter how much it writes.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<Vec<u8>>> {
    child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        })
    })
}

/// Collect the drained stderr as trimmed text for an error message
fn stderr_text(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
        .unwrap_or_default()
}

/// Archive a directory tree into a gzipped tar
fn archive_tree(tree: &Path, archive_path: &Path) -> VaultResult<()> {
    let file = fs::File::create(archive_path)
        .map_err(|e| VaultError::Io(format!("Failed to create archive: {}", e)))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    builder
        .append_dir_all(".", tree)
        .map_err(|e| VaultError::Io(format!("Failed to archive {}: {}", tree.display(), e)))?;
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| VaultError::Io(format!("Failed to finish archive: {}", e)))?;
    Ok(())
}

/// Unpack a gzipped tar over a directory tree
fn unpack_tree(archive_path: &Path, tree: &Path) -> VaultResult<()> {
    let file = fs::File::open(archive_path)
        .map_err(|e| VaultError::Io(format!("Failed to open archive: {}", e)))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    fs::create_dir_all(tree)
        .map_err(|e| VaultError::Io(format!("Failed to create {}: {}", tree.display(), e)))?;
    archive
        .unpack(tree)
        .map_err(|e| VaultError::Io(format!("Failed to unpack into {}: {}", tree.display(), e)))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_and_unpack_tree() {
        let temp_dir = TempDir::new().unwrap();
        let site = temp_dir.path().join("site");
        fs::create_dir_all(site.join("wp-content")).unwrap();
        fs::write(site.join("index.php"), "<?php // front controller").unwrap();
        fs::write(site.join("wp-content").join("style.css"), "body {}").unwrap();

        let archive = temp_dir.path().join("site.tar.gz");
        archive_tree(&site, &archive).unwrap();
        assert!(archive.is_file());

        let restored = temp_dir.path().join("restored");
        unpack_tree(&archive, &restored).unwrap();

        assert_eq!(
            fs::read_to_string(restored.join("index.php")).unwrap(),
            "<?php // front controller"
        );
        assert_eq!(
            fs::read_to_string(restored.join("wp-content").join("style.css")).unwrap(),
            "body {}"
        );
    }

    #[test]
    fn test_unpack_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let err = unpack_tree(&temp_dir.path().join("absent.tar.gz"), temp_dir.path()).unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }

    /// The child writes far more than a pipe buffer to stderr before it
    /// produces any stdout. Without the concurrent drain the child blocks
    /// on its full stderr pipe while we block reading its stdout, and
    /// this test never finishes.
    #[test]
    fn test_stderr_drained_while_reading_stdout() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("head -c 200000 /dev/zero | tr '\\0' x >&2; echo done")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stderr = drain_stderr(&mut child);

        let mut stdout = child.stdout.take().unwrap();
        let mut out = Vec::new();
        io::copy(&mut stdout, &mut out).unwrap();
        let status = child.wait().unwrap();

        assert!(status.success());
        assert_eq!(out, b"done\n");
        assert_eq!(stderr_text(stderr).len(), 200_000);
    }

    #[test]
    fn test_fake_producer_artifacts() {
        use fake::FakeProducer;

        let temp_dir = TempDir::new().unwrap();
        let producer = FakeProducer::new(Layout::new("wordpress"));

        let dump = producer.database_dump(temp_dir.path()).unwrap();
        assert_eq!(dump.file_name().unwrap(), "wordpress.sql.gz");

        let archive = producer.site_archive(temp_dir.path()).unwrap();
        assert_eq!(archive.file_name().unwrap(), "site.tar.gz");
    }
}
