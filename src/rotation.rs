//! Automatic background/quote rotation timer
//!
//! The scheduler never touches the state. It runs as a tokio task and sends a
//! [`RotationTick`] every period; the owner of the session applies it. Period
//! and pause flag live in a `watch` channel so a change restarts the timer at
//! once instead of waiting out the old period.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::constants::rotation::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use crate::types::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    period: Duration,
    paused: bool,
}

impl RotationConfig {
    pub fn new(interval_secs: u32, paused: bool) -> Self {
        let secs = interval_secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        Self {
            period: Duration::from_secs(u64::from(secs)),
            paused,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.rotation_interval, settings.is_rotation_paused)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Time to rotate; `sequence` counts ticks since spawn, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationTick {
    pub sequence: u64,
}

pub struct RotationScheduler {
    config_tx: watch::Sender<RotationConfig>,
    task: Option<JoinHandle<()>>,
}

impl RotationScheduler {
    /// Start the timer task. Must be called inside a tokio runtime.
    pub fn spawn(config: RotationConfig) -> (Self, mpsc::UnboundedReceiver<RotationTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (config_tx, config_rx) = watch::channel(config);

        info!(
            period_secs = config.period.as_secs(),
            paused = config.paused,
            "Starting rotation scheduler"
        );
        let task = tokio::spawn(run_timer(config_rx, tick_tx));

        (
            Self {
                config_tx,
                task: Some(task),
            },
            tick_rx,
        )
    }

    /// Apply new timing; an unchanged config keeps the running period
    pub fn reconfigure(&self, config: RotationConfig) {
        let changed = self.config_tx.send_if_modified(|current| {
            if *current == config {
                false
            } else {
                *current = config;
                true
            }
        });

        if changed {
            info!(
                period_secs = config.period.as_secs(),
                paused = config.paused,
                "Rotation timing changed"
            );
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Rotation scheduler stopped");
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_timer(
    mut config_rx: watch::Receiver<RotationConfig>,
    tick_tx: mpsc::UnboundedSender<RotationTick>,
) {
    let mut sequence = 0u64;

    loop {
        let config = *config_rx.borrow_and_update();

        if config.paused {
            debug!("Rotation paused, waiting for a config change");
            if config_rx.changed().await.is_err() {
                return;
            }
            continue;
        }

        // First tick one full period from now
        let mut timer = interval_at(Instant::now() + config.period, config.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    sequence += 1;
                    debug!(sequence, "Rotation tick");
                    if tick_tx.send(RotationTick { sequence }).is_err() {
                        debug!("Tick receiver dropped, stopping rotation timer");
                        return;
                    }
                }
                changed = config_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
