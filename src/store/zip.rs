//! # Filesystem archive store backed by zip files.
//!
//! [`ZipArchiveStore`] packs a source directory (the managed process's save
//! state) into `<backup_dir>/<prefix>-<tier>-<timestamp>[-<tag>].zip`. The
//! tier and creation instant are part of the name, so [`list`] recovers both
//! without touching the calendar — the tier a record was created with is the
//! tier it keeps.
//!
//! ## Rules
//! - Packing runs on the blocking thread pool; the async caller only awaits.
//! - A half-written archive is removed when packing fails.
//! - `delete` is best-effort and returns `false` instead of erroring.
//!
//! [`list`]: ArchiveStore::list

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

use super::{ArchiveStore, BackupRecord, BackupTier};

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Archive store writing zip files into a backup directory.
pub struct ZipArchiveStore {
    source_dir: PathBuf,
    backup_dir: PathBuf,
    prefix: String,
}

impl ZipArchiveStore {
    /// Creates a store packing `source_dir` into archives under `backup_dir`.
    ///
    /// `prefix` namespaces this store's archives; `list` ignores files that
    /// do not carry it. The backup directory is created if absent.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> io::Result<Self> {
        let backup_dir = backup_dir.into();
        fs::create_dir_all(&backup_dir)?;
        Ok(Self {
            source_dir: source_dir.into(),
            backup_dir,
            prefix: prefix.into(),
        })
    }

    fn archive_name(&self, tier: BackupTier, at: DateTime<Utc>, tag: Option<&str>) -> String {
        let stamp = at.format(STAMP_FORMAT);
        match tag {
            Some(tag) => format!("{}-{}-{}-{}.zip", self.prefix, tier, stamp, sanitize(tag)),
            None => format!("{}-{}-{}.zip", self.prefix, tier, stamp),
        }
    }

    /// Parses `<prefix>-<tier>-<stamp>[-<tag>].zip` back into tier and
    /// creation time. Foreign files return `None` and are skipped by `list`.
    fn parse_name(&self, filename: &str) -> Option<(BackupTier, DateTime<Utc>)> {
        let stem = filename.strip_suffix(".zip")?;
        let rest = stem.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (tier_token, rest) = rest.split_once('-')?;
        let tier = BackupTier::parse(tier_token)?;
        let stamp = rest.split('-').next()?;
        let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        Some((tier, naive.and_utc()))
    }
}

#[async_trait]
impl ArchiveStore for ZipArchiveStore {
    async fn create(
        &self,
        tier: BackupTier,
        tag: Option<&str>,
    ) -> Result<BackupRecord, ArchiveError> {
        if !self.source_dir.is_dir() {
            return Err(ArchiveError::MissingSource {
                path: self.source_dir.clone(),
            });
        }

        let created = Utc::now();
        let filename = self.archive_name(tier, created, tag);
        let path = self.backup_dir.join(&filename);

        let source = self.source_dir.clone();
        let dest = path.clone();
        let size_bytes = tokio::task::spawn_blocking(move || pack_dir(&source, &dest))
            .await
            .map_err(|e| ArchiveError::Pack {
                message: format!("packing task failed: {e}"),
            })??;

        debug!(archive = %filename, tier = %tier, size_bytes, "archive created");
        Ok(BackupRecord {
            filename,
            path,
            size_bytes,
            created,
            tier,
        })
    }

    async fn list(&self) -> Result<Vec<BackupRecord>, ArchiveError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            let Some((tier, created)) = self.parse_name(&filename) else {
                continue;
            };
            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            records.push(BackupRecord {
                filename,
                path: entry.path(),
                size_bytes,
                created,
                tier,
            });
        }
        Ok(records)
    }

    async fn delete(&self, record: &BackupRecord) -> bool {
        match fs::remove_file(&record.path) {
            Ok(()) => {
                debug!(archive = %record.filename, "archive deleted");
                true
            }
            Err(e) => {
                warn!(archive = %record.filename, error = %e, "failed to delete archive");
                false
            }
        }
    }
}

/// Packs every file under `source` into a zip at `dest`, returning the
/// archive size. Removes the partial archive on failure.
fn pack_dir(source: &Path, dest: &Path) -> Result<u64, ArchiveError> {
    let result = write_archive(source, dest);
    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}

fn write_archive(source: &Path, dest: &Path) -> Result<u64, ArchiveError> {
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in collect_files(source)? {
        let rel = file
            .strip_prefix(source)
            .map_err(|e| ArchiveError::Pack {
                message: format!("path outside source tree: {e}"),
            })?;
        let entry_name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(entry_name, options)
            .map_err(|e| ArchiveError::Pack {
                message: e.to_string(),
            })?;
        io::copy(&mut File::open(&file)?, &mut writer)?;
    }

    writer.finish().map_err(|e| ArchiveError::Pack {
        message: e.to_string(),
    })?;
    Ok(fs::metadata(dest)?.len())
}

/// Recursively collects regular files under `root`, sorted for a stable
/// archive layout.
fn collect_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Restricts operator-supplied tags to archive-name-safe characters.
fn sanitize(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_source(dir: &Path) {
        fs::create_dir_all(dir.join("world/region")).unwrap();
        fs::write(dir.join("world/level.dat"), b"level-data").unwrap();
        fs::write(dir.join("world/region/r.0.0.dat"), b"region-data").unwrap();
        fs::write(dir.join("settings.ini"), b"[server]").unwrap();
    }

    fn store(tmp: &TempDir) -> ZipArchiveStore {
        let source = tmp.path().join("save");
        seed_source(&source);
        ZipArchiveStore::new(source, tmp.path().join("backups"), "save").unwrap()
    }

    #[tokio::test]
    async fn test_create_list_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let record = store.create(BackupTier::Weekly, None).await.unwrap();
        assert!(record.path.exists());
        assert!(record.size_bytes > 0);
        assert_eq!(record.tier, BackupTier::Weekly);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tier, BackupTier::Weekly);
        assert_eq!(listed[0].filename, record.filename);
        // The listed creation time comes from the name stamp, which has
        // one-second resolution.
        assert!((listed[0].created - record.created).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_manual_tag_is_sanitized() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let record = store
            .create(BackupTier::Manual, Some("pre wipe/2"))
            .await
            .unwrap();
        assert!(record.filename.ends_with("-pre_wipe_2.zip"));

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tier, BackupTier::Manual);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = ZipArchiveStore::new(
            tmp.path().join("nonexistent"),
            tmp.path().join("backups"),
            "save",
        )
        .unwrap();

        let err = store.create(BackupTier::Daily, None).await.unwrap_err();
        assert_eq!(err.as_label(), "archive_missing_source");
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let record = store.create(BackupTier::Daily, None).await.unwrap();
        assert!(store.delete(&record).await);
        assert!(!record.path.exists());
        // Second delete is a no-op failure, not a panic.
        assert!(!store.delete(&record).await);
    }

    #[tokio::test]
    async fn test_foreign_files_are_ignored_by_list() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        fs::write(tmp.path().join("backups/README.txt"), b"not an archive").unwrap();
        fs::write(tmp.path().join("backups/other-daily-20250601020000.zip"), b"x").unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }
}
