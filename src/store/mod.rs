//! Backup archive storage.
//!
//! This module groups the archive-side data model and the store contract:
//! - [`BackupTier`], [`BackupRecord`] record classification and metadata
//! - [`ArchiveStore`] the collaborator trait the retention engine drives
//! - [`ZipArchiveStore`] a filesystem implementation packing a directory
//!   into timestamped zip archives
//!
//! The retention engine only ever talks to `dyn ArchiveStore`; swapping the
//! zip store for object storage or a remote snapshot API is a matter of
//! implementing the trait.

mod record;
mod zip;

use async_trait::async_trait;

use crate::error::ArchiveError;

pub use record::{BackupRecord, BackupTier};
pub use zip::ZipArchiveStore;

/// Contract for backup archive storage.
///
/// Implementations own the packing format and the listing medium; the core
/// cares only about records and their creation metadata.
#[async_trait]
pub trait ArchiveStore: Send + Sync + 'static {
    /// Creates one archive of the managed state, tagged with `tier`.
    ///
    /// `tag` is an optional operator-supplied label folded into the archive
    /// name (used by manual backups).
    async fn create(&self, tier: BackupTier, tag: Option<&str>)
        -> Result<BackupRecord, ArchiveError>;

    /// Lists every record currently in the store, in no particular order.
    async fn list(&self) -> Result<Vec<BackupRecord>, ArchiveError>;

    /// Deletes one record. Best-effort: returns `false` on failure and the
    /// caller moves on.
    async fn delete(&self, record: &BackupRecord) -> bool;
}
