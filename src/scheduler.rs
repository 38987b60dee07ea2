//! Polling scheduler: three independent fixed-period timers.
//!
//! - clock: re-render the header date/time
//! - sensor: poll the sensor controller; each tick runs in its own task so a
//!   hung request never delays the next poll
//! - resync: redraw every chart from its bound data
//!
//! Timers run for the lifetime of the process.

use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::dashboard::AppState;
use crate::sensor;

// ---

/// Handles of the running timers.
pub struct Scheduler {
    pub clock: JoinHandle<()>,
    pub sensor: JoinHandle<()>,
    pub resync: JoinHandle<()>,
}

impl Scheduler {
    /// Start all three timers. The first tick of each fires immediately.
    pub fn start(state: &AppState) -> Self {
        // ---
        let config = &state.config;
        tracing::info!(
            "Starting timers: clock {:?}, sensor {:?}, chart resync {:?}",
            config.clock_interval,
            config.sensor_poll_interval,
            config.chart_resync_interval
        );

        Scheduler {
            clock: spawn_clock(state.clone(), config.clock_interval),
            sensor: spawn_sensor_poll(state.clone(), config.sensor_poll_interval),
            resync: spawn_chart_resync(state.clone(), config.chart_resync_interval),
        }
    }

    pub fn abort(&self) {
        self.clock.abort();
        self.sensor.abort();
        self.resync.abort();
    }
}

fn spawn_clock(state: AppState, period: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            state.dashboard.lock().await.tick_clock(&Local::now());
        }
    })
}

fn spawn_sensor_poll(state: AppState, period: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = sensor::poll(&state).await {
                    tracing::error!("Failed to store sensor history: {}", e);
                }
            });
        }
    })
}

fn spawn_chart_resync(state: AppState, period: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let redrawn = state.dashboard.lock().await.resync_charts();
            tracing::trace!("Resynced {} charts", redrawn);
        }
    })
}
