//! # Backup record metadata.
//!
//! [`BackupRecord`] describes one stored archive; [`BackupTier`] is the
//! retention bucket it was classified into **at creation time**. The tier is
//! immutable afterwards: listing re-reads it from the name written at
//! creation, never from the calendar.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Retention bucket a backup is classified into when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackupTier {
    /// Regular scheduled backup.
    Daily,
    /// Scheduled backup promoted by the weekly calendar rule.
    Weekly,
    /// Scheduled backup promoted by the monthly calendar rule.
    Monthly,
    /// Operator-requested backup; pruned by count, never by age.
    Manual,
}

impl BackupTier {
    /// Stable lowercase token used in archive names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupTier::Daily => "daily",
            BackupTier::Weekly => "weekly",
            BackupTier::Monthly => "monthly",
            BackupTier::Manual => "manual",
        }
    }

    /// Parses the token produced by [`BackupTier::as_str`].
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "daily" => Some(BackupTier::Daily),
            "weekly" => Some(BackupTier::Weekly),
            "monthly" => Some(BackupTier::Monthly),
            "manual" => Some(BackupTier::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for BackupTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one stored backup archive.
#[derive(Clone, Debug)]
pub struct BackupRecord {
    /// Archive file name (unique within the store).
    pub filename: String,
    /// Full path of the archive.
    pub path: PathBuf,
    /// Archive size in bytes.
    pub size_bytes: u64,
    /// Creation instant, written into the archive name at creation.
    pub created: DateTime<Utc>,
    /// Retention tier, fixed at creation.
    pub tier: BackupTier,
}

impl BackupRecord {
    /// Age of this record relative to `now`.
    ///
    /// A record stamped in the future (clock skew) reports zero age rather
    /// than wrapping.
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.created).to_std().unwrap_or_default()
    }
}
