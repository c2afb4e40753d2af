//! # Orchestrator: lifecycle of the monitor tasks and aggregate status.
//!
//! The [`Orchestrator`] owns the already-constructed trackers, spawns each
//! monitor loop as an independent task under a child [`CancellationToken`],
//! and tears everything down with a bounded grace period.
//!
//! ## High-level architecture
//! ```text
//! Inputs to start():
//!   PresenceTracker ─┐
//!   ProcessHealth  ──┼─► one task per loop ──► JoinSet<&'static str>
//!   IdleSupervisor ──┤      (child token each)
//!   RetentionEngine ─┘
//!
//! Event flow (wired at build time):
//!   monitor loop ── dispatch(Event) ──► EventRouter ──► handler 1..N
//!
//! Shutdown path:
//!   stop():
//!     runtime_token.cancel()   → propagates to child tokens
//!     timeout(grace, join all):
//!       ├─ Ok (all joined)  → Ok(())
//!       └─ grace exceeded   → abort + RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - Handler registration happens only before construction (builder); the
//!   router is immutable once any monitor runs.
//! - A task that ignores cancellation past the grace period is abandoned
//!   and reported by name, never awaited forever.

use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::monitors::{
    BackupCycle, CleanupCycle, HealthCycle, IdleStatus, IdleSupervisor, MonitorRef,
    PresenceStatus, PresenceTracker, ProcessHealthTracker, ProcessStatus, RetentionEngine,
    RetentionStatus, StatusCycle,
};

/// Aggregate snapshot combining every tracker's own status accessor.
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    /// True while the monitor tasks are running.
    pub running: bool,
    /// Presence tracker counters.
    pub presence: PresenceStatus,
    /// Last observed process status, if any status cycle completed yet.
    pub process: Option<ProcessStatus>,
    /// Idle timer state and statistics.
    pub idle: IdleStatus,
    /// Retention engine counters.
    pub retention: RetentionStatus,
}

/// Handles of one running supervision session.
struct Running {
    token: CancellationToken,
    tasks: JoinSet<&'static str>,
    names: Vec<&'static str>,
}

/// Owns and schedules the six monitor loops.
pub struct Orchestrator {
    cfg: Config,
    presence: Arc<PresenceTracker>,
    health: Arc<ProcessHealthTracker>,
    idle: Arc<IdleSupervisor>,
    retention: Arc<RetentionEngine>,
    running: Mutex<Option<Running>>,
}

impl Orchestrator {
    /// Creates an orchestrator over already-constructed trackers.
    ///
    /// Most callers go through
    /// [`OrchestratorBuilder`](crate::OrchestratorBuilder), which wires the
    /// shared router into each tracker before handing the parts over.
    pub fn new(
        cfg: Config,
        presence: Arc<PresenceTracker>,
        health: Arc<ProcessHealthTracker>,
        idle: Arc<IdleSupervisor>,
        retention: Arc<RetentionEngine>,
    ) -> Self {
        Self {
            cfg,
            presence,
            health,
            idle,
            retention,
            running: Mutex::new(None),
        }
    }

    /// The presence tracker (read accessors).
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// The health tracker (read accessors).
    pub fn health(&self) -> &Arc<ProcessHealthTracker> {
        &self.health
    }

    /// The idle supervisor (read accessors).
    pub fn idle(&self) -> &Arc<IdleSupervisor> {
        &self.idle
    }

    /// The retention engine (read accessors and `backup_now`).
    pub fn retention(&self) -> &Arc<RetentionEngine> {
        &self.retention
    }

    /// True while the monitor tasks are running.
    pub fn is_running(&self) -> bool {
        self.running.lock().expect("run state poisoned").is_some()
    }

    /// Spawns every monitor loop as an independent task.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let mut guard = self.running.lock().expect("run state poisoned");
        if guard.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let mut names = Vec::new();
        for monitor in self.monitors() {
            let child = token.child_token();
            names.push(monitor.name());
            tasks.spawn(async move {
                monitor.run(child).await;
                monitor.name()
            });
        }

        info!(monitors = ?names, "supervision started");
        *guard = Some(Running {
            token,
            tasks,
            names,
        });
        Ok(())
    }

    /// Cancels every monitor task and waits up to the configured grace.
    ///
    /// Tasks that do not respond to cancellation within the grace period are
    /// aborted and named in [`RuntimeError::GraceExceeded`].
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let Some(mut running) = self.running.lock().expect("run state poisoned").take() else {
            return Err(RuntimeError::NotRunning);
        };

        info!("stopping supervision");
        running.token.cancel();

        let grace = self.cfg.grace;
        let mut finished: Vec<&'static str> = Vec::new();
        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = running.tasks.join_next().await {
                match result {
                    Ok(name) => finished.push(name),
                    Err(e) => warn!(error = %e, "monitor task ended abnormally"),
                }
            }
        })
        .await;

        match drained {
            Ok(()) => {
                info!("all monitors stopped within grace");
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = running
                    .names
                    .iter()
                    .filter(|name| !finished.contains(name))
                    .map(|name| name.to_string())
                    .collect();
                warn!(?stuck, ?grace, "grace exceeded; abandoning monitor tasks");
                running.tasks.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Returns the composed status snapshot.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            presence: self.presence.status(),
            process: self.health.last_status(),
            idle: self.idle.status(),
            retention: self.retention.status(),
        }
    }

    /// The six monitor loops, one task each.
    fn monitors(&self) -> Vec<MonitorRef> {
        vec![
            self.presence.clone(),
            Arc::new(StatusCycle(self.health.clone())),
            Arc::new(HealthCycle(self.health.clone())),
            self.idle.clone(),
            Arc::new(BackupCycle(self.retention.clone())),
            Arc::new(CleanupCycle(self.retention.clone())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::OrchestratorBuilder;
    use crate::error::{ArchiveError, FacadeError};
    use crate::facades::{GameServerFacade, Notifier, PlayerInfo, ProcessController, ServerInfo};
    use crate::store::{ArchiveStore, BackupRecord, BackupTier};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::Duration;

    struct QuietFacade;

    #[async_trait]
    impl GameServerFacade for QuietFacade {
        async fn players(&self) -> Result<Vec<PlayerInfo>, FacadeError> {
            Ok(Vec::new())
        }

        async fn server_info(&self) -> Result<ServerInfo, FacadeError> {
            Ok(ServerInfo {
                name: "test".into(),
                version: "v1".into(),
            })
        }

        async fn announce(&self, _text: &str) -> bool {
            true
        }

        async fn request_stop(&self, _wait: Duration, _message: &str) -> bool {
            true
        }
    }

    /// Controller whose `stop` can be made to hang forever, pinning the idle
    /// workflow mid-restart.
    struct FakeController {
        running: AtomicBool,
        hang_on_stop: bool,
    }

    #[async_trait]
    impl ProcessController for FakeController {
        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn pid(&self) -> Option<u32> {
            self.is_running().then_some(1)
        }

        fn uptime(&self) -> Duration {
            Duration::ZERO
        }

        async fn start(&self) -> bool {
            self.running.store(true, Ordering::SeqCst);
            true
        }

        async fn stop(&self) -> bool {
            if self.hang_on_stop {
                std::future::pending::<()>().await;
            }
            self.running.store(false, Ordering::SeqCst);
            true
        }
    }

    struct NullStore {
        creates: AtomicU64,
    }

    #[async_trait]
    impl ArchiveStore for NullStore {
        async fn create(
            &self,
            tier: BackupTier,
            _tag: Option<&str>,
        ) -> Result<BackupRecord, ArchiveError> {
            let id = self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(BackupRecord {
                filename: format!("null-{id}.zip"),
                path: PathBuf::from(format!("null-{id}.zip")),
                size_bytes: 0,
                created: Utc::now(),
                tier,
            })
        }

        async fn list(&self) -> Result<Vec<BackupRecord>, ArchiveError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _record: &BackupRecord) -> bool {
            true
        }
    }

    struct CountingNotifier {
        sent: AtomicU64,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _event: &crate::events::Event) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn quiet_config() -> Config {
        // Every loop parked on an hour-long interval; individual tests tune
        // down the cadence they exercise.
        let hour = Duration::from_secs(3600);
        Config {
            presence_interval: hour,
            status_interval: hour,
            health_interval: hour,
            idle_check_interval: hour,
            idle_threshold: hour,
            backup_interval: hour,
            cleanup_interval: hour,
            grace: Duration::from_secs(5),
            ..Config::default()
        }
    }

    fn orchestrator(cfg: Config, hang_on_stop: bool) -> Orchestrator {
        OrchestratorBuilder::new(cfg).build(
            Arc::new(QuietFacade),
            Arc::new(FakeController {
                running: AtomicBool::new(true),
                hang_on_stop,
            }),
            Arc::new(NullStore {
                creates: AtomicU64::new(0),
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop_round_trip() {
        let orch = orchestrator(quiet_config(), false);

        orch.start().await.unwrap();
        assert!(orch.status().running);

        // Let every loop run its first cycle.
        tokio::time::sleep(Duration::from_secs(1)).await;

        orch.stop().await.unwrap();
        assert!(!orch.status().running);
        assert!(orch.status().presence.cycles >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_and_stray_stop_are_rejected() {
        let orch = orchestrator(quiet_config(), false);

        assert!(matches!(orch.stop().await, Err(RuntimeError::NotRunning)));

        orch.start().await.unwrap();
        assert!(matches!(
            orch.start().await,
            Err(RuntimeError::AlreadyRunning)
        ));

        orch.stop().await.unwrap();
        assert!(matches!(orch.stop().await, Err(RuntimeError::NotRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restartable_after_stop() {
        let orch = orchestrator(quiet_config(), false);

        orch.start().await.unwrap();
        orch.stop().await.unwrap();
        orch.start().await.unwrap();
        assert!(orch.status().running);
        orch.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_names_the_stuck_task() {
        // A hung controller pins the idle loop inside its restart workflow,
        // which by design does not observe cancellation mid-restart.
        let mut cfg = quiet_config();
        cfg.idle_check_interval = Duration::from_secs(1);
        cfg.idle_threshold = Duration::from_secs(1);
        let orch = orchestrator(cfg, true);

        orch.start().await.unwrap();
        // First cycle arms the timer; the next one breaches the threshold
        // and enters the workflow, where stop() hangs forever.
        tokio::time::sleep(Duration::from_secs(3)).await;

        match orch.stop().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, vec!["idle".to_string()]);
            }
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
        assert!(!orch.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_builder_wires_notifier_observer() {
        let notifier = Arc::new(CountingNotifier {
            sent: AtomicU64::new(0),
        });

        let mut cfg = quiet_config();
        cfg.backup_interval = Duration::from_secs(1);

        let orch = OrchestratorBuilder::new(cfg)
            .with_observer(Arc::new(crate::handlers::NotifierHandler::new(
                notifier.clone(),
            )))
            .build(
                Arc::new(QuietFacade),
                Arc::new(FakeController {
                    running: AtomicBool::new(true),
                    hang_on_stop: false,
                }),
                Arc::new(NullStore {
                    creates: AtomicU64::new(0),
                }),
            );

        orch.start().await.unwrap();
        // One backup tick fires and dispatches BackupCompleted through the
        // notifier observer.
        tokio::time::sleep(Duration::from_secs(2)).await;
        orch.stop().await.unwrap();

        assert!(notifier.sent.load(Ordering::SeqCst) >= 1);
        assert!(orch.status().retention.created >= 1);
    }
}
