//! Background poll loop.
//!
//! Runs [`Coordinator::refresh`] on a fixed interval until stopped. The first
//! refresh happens immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::coordinator::Coordinator;

/// Drives a shared [`Coordinator`] from a spawned task.
pub struct Poller {
    coordinator: Arc<Mutex<Coordinator>>,
    period: Duration,
    running: Arc<RwLock<bool>>,
    shutdown: Arc<Notify>,
    task_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl Poller {
    /// Poll every `period`.
    pub fn new(coordinator: Coordinator, period: Duration) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
            period,
            running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(Notify::new()),
            task_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// The polled coordinator, for reading its snapshot.
    pub fn coordinator(&self) -> Arc<Mutex<Coordinator>> {
        self.coordinator.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start polling. Does nothing if already running.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        let coordinator = self.coordinator.clone();
        let running_flag = self.running.clone();
        let shutdown = self.shutdown.clone();
        let period = self.period;

        info!(
            category = "poll",
            period_secs = period.as_secs(),
            "Poller started"
        );

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.notified() => break,
                }

                if !*running_flag.read().await {
                    break;
                }

                let mut coordinator = coordinator.lock().await;
                if let Err(e) = coordinator.refresh().await {
                    warn!(category = "poll", error = %e, "Refresh failed, will retry next interval");
                }
            }

            info!(category = "poll", "Poller stopped");
        });

        let mut task = self.task_handle.write().await;
        *task = Some(handle);
    }

    /// Stop polling and wait for an in-flight refresh to finish.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        drop(running);
        self.shutdown.notify_one();

        let mut task = self.task_handle.write().await;
        if let Some(handle) = task.take() {
            drop(task);
            handle.await.ok();
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
