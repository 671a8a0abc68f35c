//! The sweep driver.
//!
//! One driver per process. `start` spawns the periodic loop and fails on
//! a second call; `run_cycle` is also callable directly (manual trigger)
//! and skips itself if a cycle is already in flight, so a manual trigger
//! racing the timer cannot double-process a schedule. Per-item failures
//! are logged and counted, never abort the cycle.

use crate::error::StartError;
use chrono::{DateTime, Duration, Utc};
use quiet_sentinel_escalation::{
    EscalationEngine, EscalationStateStore, NotificationDispatcher, NotificationRequest,
};
use quiet_sentinel_prep::{MemoryRetriever, PrepArtifactStore, PrepService};
use quiet_sentinel_schedule::{
    Account, AccountStore, NotificationChannel, Schedule, ScheduleStore, SubscriptionTier,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Configuration for the sweep driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep cycles.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// How far ahead a schedule may start and still be swept, in minutes.
    #[serde(default = "default_horizon_minutes")]
    pub horizon_minutes: i64,

    /// Channel reminders are dispatched on.
    #[serde(default = "default_channel")]
    pub channel: NotificationChannel,
}

fn default_interval_seconds() -> u64 {
    300
}

fn default_horizon_minutes() -> i64 {
    24 * 60
}

fn default_channel() -> NotificationChannel {
    NotificationChannel::Push
}

/// Upper bound on a single dispatch call. A hung dispatch backend must
/// not wedge the sweep; the unconfirmed intent is retried next cycle.
const DISPATCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            horizon_minutes: default_horizon_minutes(),
            channel: default_channel(),
        }
    }
}

/// Counters from one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    /// True if the cycle was skipped because another was running.
    pub skipped: bool,
    /// Schedules examined.
    pub examined: u32,
    /// Notifications dispatched and confirmed.
    pub sent: u32,
    /// Prep artifacts available after the cycle.
    pub prepared: u32,
    /// Items that failed (malformed records, store or dispatch errors).
    pub failures: u32,
}

impl CycleStats {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// The process-wide background driver.
pub struct SweepDriver<S, PS, M> {
    engine: Arc<EscalationEngine<S>>,
    prep: Arc<PrepService<PS, M>>,
    schedules: Arc<dyn ScheduleStore>,
    accounts: Arc<dyn AccountStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: SweepConfig,
    started: AtomicBool,
    cycle_lock: Mutex<()>,
}

impl<S, PS, M> SweepDriver<S, PS, M>
where
    S: EscalationStateStore + 'static,
    PS: PrepArtifactStore + 'static,
    M: MemoryRetriever + 'static,
{
    /// Creates a driver over the given collaborators.
    pub fn new(
        engine: Arc<EscalationEngine<S>>,
        prep: Arc<PrepService<PS, M>>,
        schedules: Arc<dyn ScheduleStore>,
        accounts: Arc<dyn AccountStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: SweepConfig,
    ) -> Self {
        Self {
            engine,
            prep,
            schedules,
            accounts,
            dispatcher,
            config,
            started: AtomicBool::new(false),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Starts the periodic sweep loop.
    ///
    /// Succeeds at most once per driver; subsequent calls fail with
    /// [`StartError::AlreadyStarted`]. The returned handle can be
    /// aborted on shutdown; in-flight work is safe to abandon because
    /// sends are intent-recorded before dispatch.
    ///
    /// # Errors
    ///
    /// Fails if the driver was already started.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>, StartError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StartError::AlreadyStarted);
        }

        let driver = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(driver.config.interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let stats = driver.run_cycle(Utc::now()).await;
                if !stats.skipped {
                    tracing::debug!(
                        examined = stats.examined,
                        sent = stats.sent,
                        prepared = stats.prepared,
                        failures = stats.failures,
                        "sweep cycle finished"
                    );
                }
            }
        });

        tracing::info!(
            interval_seconds = self.config.interval_seconds,
            "sweep driver started"
        );

        Ok(handle)
    }

    /// Runs one sweep cycle.
    ///
    /// Skips itself if another cycle holds the lock. Public so a manual
    /// trigger (API call, operator tooling) can run a cycle between
    /// timer ticks.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleStats {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            tracing::debug!("sweep cycle already running, skipping");
            return CycleStats::skipped();
        };

        let mut stats = CycleStats::default();

        let horizon = Duration::minutes(self.config.horizon_minutes);
        let records = match self.schedules.upcoming_within(now, horizon).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list upcoming schedules");
                stats.failures += 1;
                return stats;
            }
        };

        for record in records {
            stats.examined += 1;
            let schedule_id = record.id;

            let schedule = match record.try_into_schedule() {
                Ok(schedule) => schedule,
                Err(e) => {
                    // Surfaced, never downgraded to "not important".
                    tracing::warn!(schedule_id = %schedule_id, error = %e, "malformed schedule record");
                    stats.failures += 1;
                    continue;
                }
            };

            if schedule.has_started(now) {
                continue;
            }

            let account = self.account_for(&schedule).await;

            self.process_notification(&schedule, now, &mut stats).await;
            self.process_prep(&schedule, &account, now, &mut stats).await;
        }

        stats
    }

    /// Loads the owner's account, defaulting to the free tier.
    async fn account_for(&self, schedule: &Schedule) -> Account {
        match self.accounts.find_by_user(schedule.owner_id).await {
            Ok(Some(account)) => account,
            Ok(None) => Account::new(schedule.owner_id, SubscriptionTier::Free),
            Err(e) => {
                tracing::warn!(
                    user_id = %schedule.owner_id,
                    error = %e,
                    "account lookup failed, assuming free tier"
                );
                Account::new(schedule.owner_id, SubscriptionTier::Free)
            }
        }
    }

    /// Runs decide/dispatch/confirm for one schedule.
    async fn process_notification(
        &self,
        schedule: &Schedule,
        now: DateTime<Utc>,
        stats: &mut CycleStats,
    ) {
        let decision = match self.engine.decide(schedule, schedule.owner_id, now).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(schedule_id = %schedule.id, error = %e, "decide failed");
                stats.failures += 1;
                return;
            }
        };

        if !decision.action.is_send() {
            return;
        }

        let request = NotificationRequest::for_schedule(schedule, self.config.channel, now);
        let dispatched =
            tokio::time::timeout(DISPATCH_TIMEOUT, self.dispatcher.dispatch(&request)).await;
        match dispatched {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                // Intent stays unconfirmed; the next cycle re-emits the send.
                tracing::warn!(schedule_id = %schedule.id, error = %e, "dispatch failed");
                stats.failures += 1;
                return;
            }
            Err(_) => {
                tracing::warn!(schedule_id = %schedule.id, "dispatch timed out");
                stats.failures += 1;
                return;
            }
        }

        match self
            .engine
            .confirm_sent(schedule.owner_id, schedule.id, now)
            .await
        {
            Ok(_) => stats.sent += 1,
            Err(e) => {
                tracing::warn!(schedule_id = %schedule.id, error = %e, "send confirmation failed");
                stats.failures += 1;
            }
        }
    }

    /// Runs the prep trigger for one schedule.
    async fn process_prep(
        &self,
        schedule: &Schedule,
        account: &Account,
        now: DateTime<Utc>,
        stats: &mut CycleStats,
    ) {
        match self.prep.maybe_generate_prep(schedule, account, now).await {
            Ok(Some(_)) => stats.prepared += 1,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(schedule_id = %schedule.id, error = %e, "prep generation failed");
                stats.failures += 1;
            }
        }
    }
}
