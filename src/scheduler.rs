// src/scheduler.rs
use std::future::Future;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::time::{self, Duration};

use crate::error::ConfigError;

/// Cloneable stop flag shared by the scheduler and the retrieval engine.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl Shutdown {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called (immediately if it already was).
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Trigger on the first Ctrl-C.
    pub fn listen_for_ctrl_c(&self) {
        let me = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(target: "scheduler", "interrupt received, stopping");
                me.trigger();
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Once,
    /// Every day at this local wall-clock time.
    Daily(NaiveTime),
    Hourly,
    EveryMinutes(u64),
}

impl Schedule {
    /// Parse "HH:MM" for a daily run.
    pub fn daily(at: &str) -> Result<Self, ConfigError> {
        NaiveTime::parse_from_str(at.trim(), "%H:%M")
            .map(Schedule::Daily)
            .map_err(|_| ConfigError::Invalid {
                key: "daily",
                value: at.to_string(),
            })
    }

    pub fn every_minutes(minutes: u64) -> Result<Self, ConfigError> {
        if minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "interval",
                value: minutes.to_string(),
            });
        }
        Ok(Schedule::EveryMinutes(minutes))
    }

    /// How long to wait from `now` until the next run.
    pub fn delay_from(&self, now: NaiveDateTime) -> Duration {
        match self {
            Schedule::Once => Duration::ZERO,
            Schedule::Hourly => Duration::from_secs(3600),
            Schedule::EveryMinutes(m) => Duration::from_secs(m * 60),
            Schedule::Daily(at) => (next_daily_after(now, *at) - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Next occurrence of `at` strictly after `now`.
pub fn next_daily_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Run `job` according to `schedule` until `shutdown` fires. `Once` runs the
/// job a single time; periodic schedules wait one period before the first run.
pub async fn run<F, Fut>(schedule: Schedule, shutdown: Shutdown, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    if schedule == Schedule::Once {
        job().await;
        return;
    }

    tracing::info!(target: "scheduler", ?schedule, "scheduler started, Ctrl-C to stop");
    loop {
        let wait = schedule.delay_from(Local::now().naive_local());
        tracing::debug!(target: "scheduler", secs = wait.as_secs(), "sleeping until next run");
        tokio::select! {
            _ = time::sleep(wait) => {}
            _ = shutdown.wait() => break,
        }
        if shutdown.is_triggered() {
            break;
        }
        job().await;
    }
    tracing::info!(target: "scheduler", "scheduler stopped");
}
