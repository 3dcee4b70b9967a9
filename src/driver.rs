//! Async driver for a shared engine.
//!
//! `SharedEngine` wraps a [`FlowEngine`] in `Arc<Mutex<_>>` so a fetch task,
//! the animation loop and UI handlers can all reach it. The lock is only ever
//! held for synchronous engine calls, never across an `.await`.

use crate::animation::Surface;
use crate::engine::{EngineStats, FlowEngine, LoadStatus};
use crate::provider::{FlowProvider, fetch_cancellable};
use crate::streamline::ProcessReport;
use parking_lot::{Mutex, MutexGuard};
use riverflow_types::month::Month;
use riverflow_types::viewport::Viewport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Thread-safe handle to a [`FlowEngine`]. Cloning shares the engine.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<FlowEngine>>,
}

impl SharedEngine {
    pub fn new(engine: FlowEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for direct access. Do not hold the guard across an
    /// `.await`.
    pub fn lock(&self) -> MutexGuard<'_, FlowEngine> {
        self.inner.lock()
    }

    /// Reset the view. Any load in flight resolves to `Cancelled`.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.lock().stats()
    }

    /// Fetch data for the current view, rebuild the index and fill the pool.
    pub async fn load<P: FlowProvider + ?Sized>(&self, provider: &P) -> LoadStatus {
        let request = {
            let mut engine = self.inner.lock();
            engine.begin_load()
        };
        let Some(request) = request else {
            return LoadStatus::Disabled;
        };

        let outcome = fetch_cancellable(provider, &request).await;

        let status = {
            let mut engine = self.inner.lock();
            engine.complete_load(&request, outcome)
        };
        if let LoadStatus::Loaded { samples } = status {
            let report = self.top_up().await;
            log::debug!(
                "Loaded {} samples, {} of {} streamlines",
                samples,
                report.pool_size,
                report.target
            );
        }
        status
    }

    /// Fill the pool batch by batch, yielding to the scheduler in between.
    ///
    /// Stops when the pool is full or a batch makes no progress.
    pub async fn top_up(&self) -> ProcessReport {
        let mut total = ProcessReport::default();
        loop {
            let report = {
                let mut engine = self.inner.lock();
                engine.process_batch()
            };
            total.merge(&report);
            if report.is_complete() || report.added == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        total
    }

    /// Switch month and regenerate from the loaded index.
    pub async fn set_month(&self, month: Month) -> ProcessReport {
        self.inner.lock().set_month(month);
        self.top_up().await
    }

    /// Pan or zoom: reset immediately, then load the new view.
    pub async fn pan<P: FlowProvider + ?Sized>(
        &self,
        viewport: Viewport,
        zoom: u8,
        provider: &P,
    ) -> LoadStatus {
        self.inner.lock().set_viewport(viewport, zoom);
        self.load(provider).await
    }

    /// Paint a frame every `1 / frame_rate` seconds until `shutdown` is
    /// cancelled. Returns the number of frames painted.
    pub async fn animate<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        shutdown: CancellationToken,
    ) -> u64 {
        let period = {
            let engine = self.inner.lock();
            Duration::from_millis(engine.config().frame_interval_ms())
        };
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut painted = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let frame = {
                        let mut engine = self.inner.lock();
                        engine.tick()
                    };
                    frame.paint(surface);
                    painted += 1;
                }
            }
        }
        log::debug!("Animation stopped after {} frames", painted);
        painted
    }
}

// Ensure SharedEngine is Send + Sync
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SharedEngine>;
};
