use std::sync::Arc;

use chrono::Local;
use log::info;
use tokio::sync::{watch, Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::models::Goal;
use crate::store::SnapshotSubscription;

use super::config::AnalyticsConfig;
use super::derive::{derive_stats, DerivedStats};

/// Reactive wrapper around [`derive_stats`]: holds one live store
/// subscription and republishes fresh stats on every snapshot or goal edit.
/// Snapshots that arrive while a recomputation is in flight are superseded
/// by the latest one, in arrival order; partial results never mix.
pub struct AnalyticsEngine {
    stats_rx: watch::Receiver<DerivedStats>,
    goal: Arc<Mutex<Goal>>,
    goal_changed: Arc<Notify>,
    cancel: CancellationToken,
}

impl AnalyticsEngine {
    /// Start the recompute loop over the given subscription. The first
    /// stats value is derived before this returns, so readers never see an
    /// uninitialized view.
    pub fn spawn(mut subscription: SnapshotSubscription, config: AnalyticsConfig) -> Self {
        let goal = Arc::new(Mutex::new(Goal::default()));
        let goal_changed = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        subscription.mark_seen();
        let initial = derive_stats(
            &subscription.current(),
            &Goal::default(),
            &config,
            Local::now(),
        );
        let (stats_tx, stats_rx) = watch::channel(initial);

        let loop_goal = goal.clone();
        let loop_notify = goal_changed.clone();
        let loop_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    changed = subscription.changed() => {
                        if changed.is_err() {
                            // Store dropped; the last stats stay readable.
                            break;
                        }
                    }
                    _ = loop_notify.notified() => {}
                }

                subscription.mark_seen();
                let records = subscription.current();
                let goal = *loop_goal.lock().await;
                let stats = derive_stats(&records, &goal, &config, Local::now());
                if stats_tx.send(stats).is_err() {
                    break;
                }
            }
            info!("Analytics engine stopped");
        });

        Self {
            stats_rx,
            goal,
            goal_changed,
            cancel,
        }
    }

    /// The latest derived view.
    pub fn stats(&self) -> DerivedStats {
        self.stats_rx.borrow().clone()
    }

    /// Watch for recomputations; each observed value is a complete view.
    pub fn subscribe(&self) -> watch::Receiver<DerivedStats> {
        self.stats_rx.clone()
    }

    pub async fn goal(&self) -> Goal {
        *self.goal.lock().await
    }

    /// Edit the in-memory goal. Rejected (returning false) for non-positive
    /// targets; otherwise visible in the next recomputation, which this
    /// triggers immediately.
    pub async fn set_target_hours(&self, hours: f64) -> bool {
        let accepted = self.goal.lock().await.set_target_hours(hours);
        if accepted {
            self.goal_changed.notify_one();
        }
        accepted
    }

    /// Tear down the recompute loop. The last published stats stay readable.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for AnalyticsEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
