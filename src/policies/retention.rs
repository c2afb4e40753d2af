//! # Backup retention policy and tier calendar.
//!
//! [`RetentionPolicy`] bounds how long each backup tier is kept and how many
//! records may exist in total. [`TierSchedule`] classifies a creation tick
//! into a tier from the calendar instant the tick fires at.
//!
//! ## Cleanup ordering
//! A cleanup pass applies, in order:
//! 1. per-tier age limits (daily/weekly/monthly);
//! 2. the manual keep-count (newest `manual_keep_count` survive);
//! 3. the global cap — oldest records deleted, irrespective of tier, until
//!    the total equals `global_max_count`.
//!
//! ## Tier classification
//! Evaluated once, at the instant a scheduled tick fires; a delayed tick that
//! misses its monthly/weekly window falls back to `Daily` for that cycle and
//! is **not** caught up later.
//!
//! # Example
//! ```rust
//! use chrono::NaiveDate;
//! use gamevisor::{BackupTier, TierSchedule};
//!
//! let schedule = TierSchedule::default();
//! // 1st of the month at 02:xx → monthly
//! let at = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(2, 0, 0).unwrap();
//! assert_eq!(schedule.tier_for(&at), BackupTier::Monthly);
//! ```

use std::time::Duration;

use chrono::{Datelike, Timelike, Weekday};

use crate::store::BackupTier;

/// Limits applied by every retention-cleanup pass.
#[derive(Clone, Copy, Debug)]
pub struct RetentionPolicy {
    /// Maximum age of daily-tier records.
    pub daily_max_age: Duration,
    /// Maximum age of weekly-tier records.
    pub weekly_max_age: Duration,
    /// Maximum age of monthly-tier records.
    pub monthly_max_age: Duration,
    /// Number of newest manual-tier records to keep; older manual records
    /// are deleted regardless of age.
    pub manual_keep_count: usize,
    /// Hard cap on the total number of retained records across all tiers.
    pub global_max_count: usize,
}

impl Default for RetentionPolicy {
    /// Returns a policy with:
    /// - `daily_max_age = 7d`, `weekly_max_age = 28d`, `monthly_max_age = 180d`;
    /// - `manual_keep_count = 5`;
    /// - `global_max_count = 100`.
    fn default() -> Self {
        const DAY: u64 = 24 * 3600;
        Self {
            daily_max_age: Duration::from_secs(7 * DAY),
            weekly_max_age: Duration::from_secs(28 * DAY),
            monthly_max_age: Duration::from_secs(180 * DAY),
            manual_keep_count: 5,
            global_max_count: 100,
        }
    }
}

impl RetentionPolicy {
    /// Returns the age limit for a scheduled tier, or `None` for the manual
    /// tier, which is pruned by count rather than by age.
    pub fn max_age_for(&self, tier: BackupTier) -> Option<Duration> {
        match tier {
            BackupTier::Daily => Some(self.daily_max_age),
            BackupTier::Weekly => Some(self.weekly_max_age),
            BackupTier::Monthly => Some(self.monthly_max_age),
            BackupTier::Manual => None,
        }
    }
}

/// Calendar rules mapping a creation tick to a [`BackupTier`].
///
/// A tick lands in the monthly tier when it fires on `monthly_day` during
/// `rollup_hour`, in the weekly tier when it fires on `weekly_weekday`
/// during `rollup_hour`, and in the daily tier otherwise. Monthly wins over
/// weekly when both match. Classification happens in local time, at tick
/// time only.
#[derive(Clone, Copy, Debug)]
pub struct TierSchedule {
    /// Day of month (1-based) that promotes a tick to the monthly tier.
    pub monthly_day: u32,
    /// Weekday that promotes a tick to the weekly tier.
    pub weekly_weekday: Weekday,
    /// Hour of day (0-23) during which the monthly/weekly promotions apply.
    pub rollup_hour: u32,
}

impl Default for TierSchedule {
    /// Returns: monthly on the 1st, weekly on Sundays, both at hour 02.
    fn default() -> Self {
        Self {
            monthly_day: 1,
            weekly_weekday: Weekday::Sun,
            rollup_hour: 2,
        }
    }
}

impl TierSchedule {
    /// Classifies the given instant into a scheduled tier.
    ///
    /// Never returns [`BackupTier::Manual`]; manual records are created only
    /// through on-demand requests.
    pub fn tier_for<T: Datelike + Timelike>(&self, at: &T) -> BackupTier {
        if at.day() == self.monthly_day && at.hour() == self.rollup_hour {
            BackupTier::Monthly
        } else if at.weekday() == self.weekly_weekday && at.hour() == self.rollup_hour {
            BackupTier::Weekly
        } else {
            BackupTier::Daily
        }
    }
}
