use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

/// Whole seconds until the hold expires, clamped so the display never goes
/// negative.
pub fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((expires_at - now).num_milliseconds() / 1000).max(0)
}

/// The tick task behind the hold countdown. Owned by the active hold and
/// aborted on drop, so the timer cannot outlive the reservation it belongs
/// to on any exit path.
pub struct Countdown {
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Starts a 1 Hz tick which recomputes the remaining seconds from the
    /// server-supplied expiry. When it reaches zero the expiry action runs
    /// once and the task ends on its own.
    pub fn start<F, Fut>(
        expires_at: DateTime<Utc>,
        remaining: Sender<Option<i64>>,
        on_expired: F,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let task = tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(1));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let now = Utc::now();
                let left = remaining_seconds(expires_at, now);
                if let Err(err) = remaining.send(Some(left)) {
                    error!(?err, "Failed to send countdown value");
                }
                // The display rounds down and shows 0 for the last partial
                // second; the hold is only treated as gone once the expiry
                // itself has passed.
                if now >= expires_at {
                    debug!(%expires_at, "Hold countdown reached zero");
                    on_expired().await;
                    break;
                }
            }
        });
        Self { task: Some(task) }
    }

    /// Lets the tick task finish on its own instead of aborting it. Only
    /// called from the expiry path, which runs inside that task.
    pub fn disarm(mut self) {
        self.task = None;
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
