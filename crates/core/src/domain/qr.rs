//! Timestamped check-in QR payloads.
//!
//! The vendor scanner rejects stale payloads, so while a code is on screen it
//! is rebuilt once it gets older than the refresh interval. Age is checked on
//! a short tick rather than by sleeping the full interval so that a paused
//! screen picks up a fresh payload soon after it resumes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::models::QrData;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct QrPayloadGenerator {
    member_id: String,
    refresh_interval: Duration,
    check_interval: Duration,
}

impl QrPayloadGenerator {
    pub fn new(member_id: &str) -> Result<Self> {
        let member_id = member_id.trim();

        if member_id.is_empty() {
            return Err(Error::InvalidInput("member id cannot be empty".into()));
        }

        Ok(Self {
            member_id: member_id.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            check_interval: DEFAULT_CHECK_INTERVAL,
        })
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;

        self
    }

    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;

        self
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn payload_at(&self, time: DateTime<Utc>) -> QrData {
        QrData::at(self.member_id.clone(), time)
    }

    pub fn current_json(&self) -> Result<String> {
        self.payload_at(Utc::now()).to_json()
    }

    /// Start refreshing the payload in the background.
    ///
    /// Must be called from within a tokio runtime. The task stops when the
    /// returned handle is dropped.
    pub fn spawn(self) -> Result<QrRefreshHandle> {
        let initial = self.current_json()?;
        let (payloads, _) = watch::channel(initial);
        let (visible, visible_rx) = watch::channel(true);

        let task = tokio::spawn(refresh_loop(self, payloads.clone(), visible_rx));

        Ok(QrRefreshHandle {
            payloads,
            visible,
            task,
        })
    }
}

async fn refresh_loop(
    generator: QrPayloadGenerator,
    payloads: watch::Sender<String>,
    mut visible: watch::Receiver<bool>,
) {
    let mut generated_at = Instant::now();
    let mut ticker = tokio::time::interval(generator.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = visible.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if !*visible.borrow() || generated_at.elapsed() < generator.refresh_interval {
            continue;
        }

        match generator.current_json() {
            Ok(json) => {
                generated_at = Instant::now();
                payloads.send_replace(json);
                tracing::debug!(member_id = %generator.member_id, "Refreshed QR payload");
            }
            Err(e) => tracing::error!(error = %e, "Failed to build QR payload"),
        }
    }
}

/// Running QR refresher. Dropping it stops the refresh task.
#[derive(Debug)]
pub struct QrRefreshHandle {
    payloads: watch::Sender<String>,
    visible: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl QrRefreshHandle {
    /// JSON payload currently on display
    pub fn current(&self) -> String {
        self.payloads.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.payloads.subscribe()
    }

    /// Stop refreshing while the code is off screen
    pub fn pause(&self) {
        self.visible.send_replace(false);
    }

    pub fn resume(&self) {
        self.visible.send_replace(true);
    }

    pub fn is_paused(&self) -> bool {
        !*self.visible.borrow()
    }

    pub fn stop(self) {}
}

impl Drop for QrRefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
