//! # RetentionEngine: tiered backup creation and cleanup.
//!
//! Two independently scheduled activities sharing one policy:
//!
//! - **Creation** (`backup-create` loop): each tick is classified into a
//!   tier by the [`TierSchedule`] **at the instant the tick fires**, and one
//!   archive is created with that tier. Packing is handed to `tokio::spawn`
//!   so a slow archive never delays the next scheduling tick. A tick that
//!   misses its monthly/weekly calendar window falls back to daily and is
//!   not caught up.
//! - **Cleanup** (`backup-cleanup` loop): applies, in order, per-tier age
//!   limits, the manual keep-count, and finally the global cap (oldest
//!   records deleted irrespective of tier until the total equals
//!   `global_max_count`). Every deletion is best-effort: one failure is
//!   logged and the pass continues.
//!
//! Manual, operator-requested backups go through
//! [`backup_now`](RetentionEngine::backup_now) and land in the manual tier,
//! which is pruned by count, never by age.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::ticker::Ticker;
use crate::error::ArchiveError;
use crate::events::{Event, EventRouter};
use crate::policies::{RetentionPolicy, TierSchedule};
use crate::store::{ArchiveStore, BackupRecord, BackupTier};

use super::Monitor;

/// Read-only view of the engine's counters.
#[derive(Debug, Clone, Default)]
pub struct RetentionStatus {
    /// Archives created successfully.
    pub created: u64,
    /// Archive creations that failed.
    pub create_failures: u64,
    /// Records deleted across all cleanup passes.
    pub deleted: u64,
    /// Completed cleanup passes.
    pub cleanup_passes: u64,
    /// The most recently created record.
    pub last_backup: Option<BackupRecord>,
}

/// Creates tiered backups on schedule and prunes them by policy.
pub struct RetentionEngine {
    store: Arc<dyn ArchiveStore>,
    router: Arc<EventRouter>,
    policy: RetentionPolicy,
    schedule: TierSchedule,
    create_interval: Duration,
    cleanup_interval: Duration,

    created: AtomicU64,
    create_failures: AtomicU64,
    deleted: AtomicU64,
    cleanup_passes: AtomicU64,
    last_backup: Mutex<Option<BackupRecord>>,
}

impl RetentionEngine {
    /// Creates an engine over `store`, dispatching through `router`.
    pub fn new(store: Arc<dyn ArchiveStore>, router: Arc<EventRouter>, cfg: &Config) -> Self {
        Self {
            store,
            router,
            policy: cfg.retention,
            schedule: cfg.schedule,
            create_interval: cfg.backup_interval,
            cleanup_interval: cfg.cleanup_interval,
            created: AtomicU64::new(0),
            create_failures: AtomicU64::new(0),
            deleted: AtomicU64::new(0),
            cleanup_passes: AtomicU64::new(0),
            last_backup: Mutex::new(None),
        }
    }

    /// Returns the engine's counters.
    pub fn status(&self) -> RetentionStatus {
        RetentionStatus {
            created: self.created.load(Ordering::Relaxed),
            create_failures: self.create_failures.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            cleanup_passes: self.cleanup_passes.load(Ordering::Relaxed),
            last_backup: self.last_backup.lock().expect("backup stats poisoned").clone(),
        }
    }

    /// Creates an operator-requested manual backup immediately.
    pub async fn backup_now(&self, tag: &str) -> Result<BackupRecord, ArchiveError> {
        self.create_one(BackupTier::Manual, Some(tag)).await
    }

    /// Classifies the current instant and hands the archive job off the
    /// scheduling path.
    fn spawn_scheduled_backup(self: &Arc<Self>) {
        let tier = self.schedule.tier_for(&Local::now());
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let _ = engine.create_one(tier, None).await;
        });
    }

    /// Creates one archive and reports the outcome.
    async fn create_one(
        &self,
        tier: BackupTier,
        tag: Option<&str>,
    ) -> Result<BackupRecord, ArchiveError> {
        match self.store.create(tier, tag).await {
            Ok(record) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                *self.last_backup.lock().expect("backup stats poisoned") = Some(record.clone());
                info!(
                    archive = %record.filename,
                    tier = %record.tier,
                    size_bytes = record.size_bytes,
                    "backup created"
                );
                self.router
                    .dispatch(&Event::BackupCompleted {
                        record: record.clone(),
                        at: SystemTime::now(),
                    })
                    .await;
                Ok(record)
            }
            Err(e) => {
                self.create_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, label = e.as_label(), tier = %tier, "backup creation failed");
                Err(e)
            }
        }
    }

    /// One cleanup pass. Returns the number of records actually deleted.
    pub async fn cleanup(&self) -> usize {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "cannot list archives; skipping cleanup pass");
                return 0;
            }
        };

        let now = Utc::now();
        let mut deleted = 0usize;

        // Per-tier age limits run before everything else.
        let mut survivors = Vec::with_capacity(records.len());
        for record in records {
            let expired = self
                .policy
                .max_age_for(record.tier)
                .is_some_and(|max_age| record.age(now) > max_age);
            if expired && self.try_delete(&record, "tier age").await {
                deleted += 1;
            } else {
                survivors.push(record);
            }
        }

        // Manual tier keeps only the newest N, regardless of age.
        let (mut manual, mut survivors): (Vec<_>, Vec<_>) = survivors
            .into_iter()
            .partition(|r| r.tier == BackupTier::Manual);
        manual.sort_by_key(|r| std::cmp::Reverse(r.created));
        for (index, record) in manual.into_iter().enumerate() {
            if index >= self.policy.manual_keep_count
                && self.try_delete(&record, "manual keep-count").await
            {
                deleted += 1;
            } else {
                survivors.push(record);
            }
        }

        // Global cap last: oldest first, irrespective of tier.
        if survivors.len() > self.policy.global_max_count {
            survivors.sort_by_key(|r| r.created);
            let overflow = survivors.len() - self.policy.global_max_count;
            for record in survivors.iter().take(overflow) {
                if self.try_delete(record, "global cap").await {
                    deleted += 1;
                }
            }
        }

        self.deleted.fetch_add(deleted as u64, Ordering::Relaxed);
        self.cleanup_passes.fetch_add(1, Ordering::Relaxed);
        if deleted > 0 {
            info!(deleted, "cleanup pass removed old backups");
        }
        deleted
    }

    async fn try_delete(&self, record: &BackupRecord, rule: &str) -> bool {
        if self.store.delete(record).await {
            debug!(archive = %record.filename, rule, "backup pruned");
            true
        } else {
            warn!(archive = %record.filename, rule, "failed to prune backup; continuing");
            false
        }
    }
}

/// Scheduled-creation loop of a shared [`RetentionEngine`].
pub struct BackupCycle(pub Arc<RetentionEngine>);

#[async_trait]
impl Monitor for BackupCycle {
    fn name(&self) -> &'static str {
        "backup-create"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(interval = ?self.0.create_interval, "backup scheduler started");
        let ticker = Ticker::new(self.0.create_interval, ctx.clone());
        // The archive job runs detached; only the schedule lives here.
        while ticker.tick().await {
            self.0.spawn_scheduled_backup();
        }
        info!("backup scheduler stopped");
    }
}

/// Cleanup loop of a shared [`RetentionEngine`].
pub struct CleanupCycle(pub Arc<RetentionEngine>);

#[async_trait]
impl Monitor for CleanupCycle {
    fn name(&self) -> &'static str {
        "backup-cleanup"
    }

    async fn run(&self, ctx: CancellationToken) {
        info!(interval = ?self.0.cleanup_interval, "retention cleanup started");
        let ticker = Ticker::new(self.0.cleanup_interval, ctx.clone());
        while ticker.tick().await {
            self.0.cleanup().await;
        }
        info!("retention cleanup stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, Handler};
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// In-memory store with scripted deletion failures.
    struct MemStore {
        records: Mutex<Vec<BackupRecord>>,
        refuse_delete: Mutex<HashSet<String>>,
        fail_create: Mutex<bool>,
        next_id: AtomicU64,
    }

    impl MemStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                refuse_delete: Mutex::new(HashSet::new()),
                fail_create: Mutex::new(false),
                next_id: AtomicU64::new(0),
            })
        }

        /// Seeds a record `age` old, returning its filename.
        fn seed(&self, tier: BackupTier, age: Duration) -> String {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let filename = format!("seed-{id}.zip");
            let created = Utc::now() - chrono::Duration::from_std(age).unwrap();
            self.records.lock().unwrap().push(BackupRecord {
                filename: filename.clone(),
                path: PathBuf::from(&filename),
                size_bytes: 1,
                created,
                tier,
            });
            filename
        }

        fn filenames(&self) -> HashSet<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.filename.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ArchiveStore for MemStore {
        async fn create(
            &self,
            tier: BackupTier,
            _tag: Option<&str>,
        ) -> Result<BackupRecord, ArchiveError> {
            if *self.fail_create.lock().unwrap() {
                return Err(ArchiveError::Pack {
                    message: "disk full".into(),
                });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let record = BackupRecord {
                filename: format!("new-{id}.zip"),
                path: PathBuf::from(format!("new-{id}.zip")),
                size_bytes: 1,
                created: Utc::now(),
                tier,
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn list(&self) -> Result<Vec<BackupRecord>, ArchiveError> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn delete(&self, record: &BackupRecord) -> bool {
            if self.refuse_delete.lock().unwrap().contains(&record.filename) {
                return false;
            }
            self.records
                .lock()
                .unwrap()
                .retain(|r| r.filename != record.filename);
            true
        }
    }

    struct Recording {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl Handler for Recording {
        async fn handle(&self, event: &Event) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn engine_with(store: Arc<MemStore>, policy: RetentionPolicy) -> (RetentionEngine, Arc<Recording>) {
        let recorder = Arc::new(Recording {
            events: Mutex::new(Vec::new()),
        });
        let mut router = EventRouter::new();
        router.register(EventKind::BackupCompleted, recorder.clone());

        let cfg = Config {
            retention: policy,
            ..Config::default()
        };
        (RetentionEngine::new(store, Arc::new(router), &cfg), recorder)
    }

    fn lenient_policy() -> RetentionPolicy {
        RetentionPolicy {
            daily_max_age: Duration::from_secs(u32::MAX as u64),
            weekly_max_age: Duration::from_secs(u32::MAX as u64),
            monthly_max_age: Duration::from_secs(u32::MAX as u64),
            manual_keep_count: usize::MAX,
            global_max_count: usize::MAX,
        }
    }

    #[tokio::test]
    async fn test_tier_age_cleanup_deletes_only_expired_records() {
        let store = MemStore::new();
        let keep = store.seed(BackupTier::Daily, 3 * DAY);
        store.seed(BackupTier::Daily, 8 * DAY);
        store.seed(BackupTier::Daily, 10 * DAY);

        let policy = RetentionPolicy {
            daily_max_age: 7 * DAY,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store.clone(), policy);

        assert_eq!(engine.cleanup().await, 2);
        assert_eq!(store.filenames(), HashSet::from([keep]));
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let store = MemStore::new();
        store.seed(BackupTier::Daily, 3 * DAY);
        store.seed(BackupTier::Daily, 9 * DAY);

        let policy = RetentionPolicy {
            daily_max_age: 7 * DAY,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store, policy);

        assert_eq!(engine.cleanup().await, 1);
        assert_eq!(engine.cleanup().await, 0);
        assert_eq!(engine.status().cleanup_passes, 2);
        assert_eq!(engine.status().deleted, 1);
    }

    #[tokio::test]
    async fn test_tier_ages_are_independent() {
        let store = MemStore::new();
        store.seed(BackupTier::Daily, 10 * DAY);
        let weekly = store.seed(BackupTier::Weekly, 10 * DAY);
        let manual = store.seed(BackupTier::Manual, 400 * DAY);

        let policy = RetentionPolicy {
            daily_max_age: 7 * DAY,
            weekly_max_age: 28 * DAY,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store.clone(), policy);

        assert_eq!(engine.cleanup().await, 1);
        // The same-age weekly record survives, and manual records never
        // expire by age.
        assert_eq!(store.filenames(), HashSet::from([weekly, manual]));
    }

    #[tokio::test]
    async fn test_manual_tier_keeps_newest_n() {
        let store = MemStore::new();
        let mut names = Vec::new();
        for days in 1..=7u32 {
            names.push(store.seed(BackupTier::Manual, days * DAY));
        }

        let policy = RetentionPolicy {
            manual_keep_count: 5,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store.clone(), policy);

        assert_eq!(engine.cleanup().await, 2);
        // The two oldest manual records (6d, 7d) are gone.
        let expected: HashSet<String> = names[..5].iter().cloned().collect();
        assert_eq!(store.filenames(), expected);
    }

    #[tokio::test]
    async fn test_global_cap_deletes_oldest_regardless_of_tier() {
        let store = MemStore::new();
        // 105 records, none individually expired; the 5 oldest span tiers.
        let mut names = Vec::new();
        for hours in 0..105u64 {
            let tier = if hours >= 100 {
                BackupTier::Weekly
            } else {
                BackupTier::Daily
            };
            names.push(store.seed(tier, Duration::from_secs(hours * 3600)));
        }

        let policy = RetentionPolicy {
            global_max_count: 100,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store.clone(), policy);

        assert_eq!(engine.cleanup().await, 5);
        // seed ages grow with the index, so the last five seeded are oldest.
        let expected: HashSet<String> = names[..100].iter().cloned().collect();
        assert_eq!(store.filenames(), expected);
    }

    #[tokio::test]
    async fn test_failed_deletion_does_not_abort_the_pass() {
        let store = MemStore::new();
        store.seed(BackupTier::Daily, 8 * DAY);
        let stubborn = store.seed(BackupTier::Daily, 9 * DAY);
        store.seed(BackupTier::Daily, 10 * DAY);
        store.refuse_delete.lock().unwrap().insert(stubborn.clone());

        let policy = RetentionPolicy {
            daily_max_age: 7 * DAY,
            ..lenient_policy()
        };
        let (engine, _) = engine_with(store.clone(), policy);

        assert_eq!(engine.cleanup().await, 2);
        assert_eq!(store.filenames(), HashSet::from([stubborn]));
    }

    #[tokio::test]
    async fn test_backup_now_creates_manual_record_and_dispatches() {
        let store = MemStore::new();
        let (engine, recorder) = engine_with(store.clone(), lenient_policy());

        let record = engine.backup_now("pre-wipe").await.unwrap();
        assert_eq!(record.tier, BackupTier::Manual);
        assert_eq!(engine.status().created, 1);
        assert!(engine.status().last_backup.is_some());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::BackupCompleted { .. }));
    }

    #[tokio::test]
    async fn test_failed_creation_is_counted_not_dispatched() {
        let store = MemStore::new();
        *store.fail_create.lock().unwrap() = true;
        let (engine, recorder) = engine_with(store, lenient_policy());

        assert!(engine.backup_now("doomed").await.is_err());
        assert_eq!(engine.status().create_failures, 1);
        assert_eq!(engine.status().created, 0);
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
