//! The flow engine: one owned context holding the loaded index, the
//! streamline pool and the animation state for a single map view.
//!
//! The engine itself is synchronous. Loading is split into
//! [`FlowEngine::begin_load`], which hands out a cancellable [`LoadRequest`],
//! and [`FlowEngine::complete_load`], which accepts the fetched records only if
//! that request is still current. [`crate::driver::SharedEngine`] wires the
//! two halves to an async provider.

use crate::animation::{Frame, step_pool};
use crate::builder::EngineBuilder;
use crate::classify::DisplayMode;
use crate::config::{Config, Level};
use crate::error::Result;
use crate::field::FlowField;
use crate::provider::{FetchOutcome, FlowQuery};
use crate::sample::samples_from_records;
use crate::spatial_hash::SpatialHash;
use crate::streamline::{ProcessReport, Streamline, StreamlineGenerator};
use crate::summary::MonthlySummary;
use rand_chacha::ChaCha8Rng;
use riverflow_types::month::Month;
use riverflow_types::viewport::Viewport;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A fetch the engine is waiting on.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    query: FlowQuery,
    level: Level,
    viewport: Viewport,
    token: CancellationToken,
}

impl LoadRequest {
    pub fn query(&self) -> &FlowQuery {
        &self.query
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Viewport the records will be projected onto.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once a reset or a newer load has superseded this request.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// What happened to a load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// No level is configured for the zoom, or the viewport is empty
    Disabled,
    /// Superseded before the results arrived; nothing was changed
    Cancelled,
    /// Index rebuilt from this many samples
    Loaded { samples: usize },
    /// The provider failed; the engine stays empty
    Failed(String),
}

/// Snapshot of engine state, in the spirit of database statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Samples in the current index
    pub samples: usize,
    /// Occupied grid cells
    pub cells: usize,
    /// Live streamlines
    pub streamlines: usize,
    /// A fetch is in flight
    pub pending_load: bool,
    /// Frames produced since construction
    pub frames: u64,
    pub month: Month,
    pub zoom: u8,
}

/// Streamline engine for one map view.
///
/// # Examples
///
/// ```rust
/// use riverflow::{Config, EngineBuilder, FetchOutcome, FlowRecord, Level, LoadStatus, Viewport};
///
/// let level = Level {
///     zoom: 5,
///     buffer: 5.0,
///     hash_size: 10.0,
///     search_radius: 8.0,
///     polyline_count: 4,
///     segment_length: 4.0,
///     segment_count_min: 2,
///     segment_count_max: 10,
///     url: String::new(),
/// };
/// let config = Config::default().with_level(level).with_rng_seed(1);
/// let mut engine = EngineBuilder::new()
///     .config(config)
///     .viewport(Viewport::pixels(100, 100))
///     .zoom(5)
///     .build()?;
///
/// let records: Vec<FlowRecord> = (0..25)
///     .map(|i| FlowRecord::new(i as f64 * 4.0, 50.0).with_flows(90.0, [700.0; 12]))
///     .collect();
/// let request = engine.begin_load().unwrap();
/// let status = engine.complete_load(&request, FetchOutcome::Ready(records));
/// assert_eq!(status, LoadStatus::Loaded { samples: 25 });
///
/// engine.process();
/// let frame = engine.tick();
/// assert_eq!(frame.segments.len(), engine.pool().len());
/// # Ok::<(), riverflow::FlowError>(())
/// ```
#[derive(Debug)]
pub struct FlowEngine {
    pub(crate) config: Config,
    pub(crate) viewport: Viewport,
    pub(crate) zoom: u8,
    pub(crate) month: Month,
    pub(crate) display: DisplayMode,
    pub(crate) index: Option<SpatialHash>,
    pub(crate) pool: Vec<Streamline>,
    pub(crate) pending: Option<CancellationToken>,
    pub(crate) clear_pending: bool,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) frames: u64,
}

impl FlowEngine {
    /// Shorthand for [`EngineBuilder`] with a configuration, viewport and zoom.
    pub fn new(config: Config, viewport: Viewport, zoom: u8) -> Result<Self> {
        EngineBuilder::new()
            .config(config)
            .viewport(viewport)
            .zoom(zoom)
            .build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn display(&self) -> DisplayMode {
        self.display
    }

    /// Generation parameters for the current zoom, if any.
    pub fn level(&self) -> Option<&Level> {
        self.config.level_for(self.zoom)
    }

    pub fn index(&self) -> Option<&SpatialHash> {
        self.index.as_ref()
    }

    pub fn pool(&self) -> &[Streamline] {
        &self.pool
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            samples: self.index.as_ref().map_or(0, SpatialHash::len),
            cells: self.index.as_ref().map_or(0, SpatialHash::cell_count),
            streamlines: self.pool.len(),
            pending_load: self.pending.is_some(),
            frames: self.frames,
            month: self.month,
            zoom: self.zoom,
        }
    }

    /// Drop everything tied to the current view.
    ///
    /// Cancels any in-flight fetch before returning, so its results can never
    /// be applied. The next frame clears the surface.
    pub fn reset(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.clear_pending = true;
        self.index = None;
        self.pool.clear();
    }

    /// Move to a new viewport and zoom. Always resets.
    pub fn set_viewport(&mut self, viewport: Viewport, zoom: u8) {
        self.reset();
        self.viewport = viewport;
        self.zoom = zoom;
    }

    /// Start a load for the current view, cancelling any previous one.
    ///
    /// Returns `None` when nothing should be fetched: no level for this zoom
    /// or an empty viewport.
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }

        let Some(level) = self.level() else {
            log::debug!("No flow level configured for zoom {}", self.zoom);
            return None;
        };
        if self.viewport.is_empty() {
            log::debug!("Skipping flow load for an empty viewport");
            return None;
        }

        let request = LoadRequest {
            query: FlowQuery::for_level(level, &self.viewport),
            level: level.clone(),
            viewport: self.viewport.clone(),
            token: CancellationToken::new(),
        };
        self.pending = Some(request.token.clone());
        Some(request)
    }

    /// Apply the result of a fetch started by [`FlowEngine::begin_load`].
    ///
    /// Results for a cancelled request are discarded without touching the
    /// engine. A successful load rebuilds the index and empties the pool;
    /// call [`FlowEngine::process`] to generate streamlines.
    pub fn complete_load(&mut self, request: &LoadRequest, outcome: FetchOutcome) -> LoadStatus {
        if request.is_cancelled() {
            return LoadStatus::Cancelled;
        }
        self.pending = None;

        match outcome {
            FetchOutcome::Cancelled => LoadStatus::Cancelled,
            FetchOutcome::Failed(e) => {
                log::error!("Flow data fetch from {} failed: {}", request.query.url, e);
                LoadStatus::Failed(e.to_string())
            }
            FetchOutcome::Ready(records) => {
                let samples = samples_from_records(&records, &request.viewport);
                let index = SpatialHash::from_samples(request.level.hash_size, samples);
                let count = index.len();
                log::debug!(
                    "Indexed {} flow samples into {} cells",
                    count,
                    index.cell_count()
                );
                self.index = Some(index);
                self.pool.clear();
                LoadStatus::Loaded { samples: count }
            }
        }
    }

    /// Switch month: the pool is regenerated from the loaded index without
    /// refetching.
    pub fn set_month(&mut self, month: Month) {
        self.month = month;
        self.pool.clear();
        self.clear_pending = true;
    }

    pub fn set_display(&mut self, display: DisplayMode) {
        self.display = display;
    }

    /// Top the pool up to the level target in one bounded pass.
    pub fn process(&mut self) -> ProcessReport {
        let missing = self.missing();
        let attempts = missing.saturating_mul(self.config.seed_attempts_per_streamline);
        let report = self.generate(missing, attempts);
        if !report.is_complete() && report.target > 0 {
            log::debug!(
                "Streamline pool short of target: {}/{} after {} seeds ({} dead, {} too short)",
                report.pool_size,
                report.target,
                report.attempts,
                report.dead_seeds,
                report.short_discards
            );
        }
        report
    }

    /// Add at most one batch of streamlines.
    pub fn process_batch(&mut self) -> ProcessReport {
        let batch = self.missing().min(self.config.seed_batch);
        let attempts = batch.saturating_mul(self.config.seed_attempts_per_streamline);
        self.generate(batch, attempts)
    }

    fn missing(&self) -> usize {
        self.level()
            .map_or(0, |level| level.polyline_count.saturating_sub(self.pool.len()))
    }

    fn generate(&mut self, max_new: usize, max_attempts: usize) -> ProcessReport {
        let Some(level) = self.config.level_for(self.zoom) else {
            return ProcessReport {
                pool_size: self.pool.len(),
                ..ProcessReport::default()
            };
        };
        let Some(index) = self.index.as_ref() else {
            return ProcessReport {
                target: level.polyline_count,
                pool_size: self.pool.len(),
                ..ProcessReport::default()
            };
        };

        let field = FlowField::new(index, self.month, level.search_radius, self.config.weighting);
        let generator = StreamlineGenerator::new(field, level, self.viewport.size());
        generator.top_up(&mut self.pool, &mut self.rng, max_new, max_attempts)
    }

    /// Produce the next frame and advance every streamline.
    pub fn tick(&mut self) -> Frame {
        self.frames += 1;
        let (width, height) = self.viewport.size();
        Frame {
            width,
            height,
            clear: std::mem::take(&mut self.clear_pending),
            fade_alpha: self.config.fade_alpha,
            segments: step_pool(&mut self.pool, self.display),
        }
    }

    /// Monthly means over the loaded samples.
    pub fn summary(&self) -> Option<MonthlySummary> {
        self.index
            .as_ref()
            .and_then(|index| MonthlySummary::from_samples(index.iter()))
    }
}
