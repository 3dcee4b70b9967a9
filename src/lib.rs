//! Animated river discharge flow maps: spatial hashing of point samples,
//! flow field reconstruction, streamline generation and frame-by-frame
//! animation.
//!
//! ```rust
//! use riverflow::{Config, FetchOutcome, FlowEngine, FlowRecord, Level, Viewport};
//!
//! let level = Level {
//!     zoom: 5,
//!     buffer: 5.0,
//!     hash_size: 10.0,
//!     search_radius: 8.0,
//!     polyline_count: 10,
//!     segment_length: 4.0,
//!     segment_count_min: 3,
//!     segment_count_max: 20,
//!     url: "https://example.com/FeatureServer/0".to_string(),
//! };
//! let config = Config::default().with_level(level).with_rng_seed(7);
//! let mut engine = FlowEngine::new(config, Viewport::pixels(100, 100), 5)?;
//!
//! let records: Vec<FlowRecord> = (0..25)
//!     .map(|i| FlowRecord::new(i as f64 * 4.0, 50.0).with_flows(90.0, [700.0; 12]))
//!     .collect();
//! if let Some(request) = engine.begin_load() {
//!     engine.complete_load(&request, FetchOutcome::Ready(records));
//! }
//! engine.process();
//! let frame = engine.tick();
//! assert_eq!(frame.segments.len(), engine.pool().len());
//! # Ok::<(), riverflow::FlowError>(())
//! ```

pub mod animation;
pub mod builder;
pub mod classify;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod field;
pub mod provider;
pub mod sample;
pub mod spatial_hash;
pub mod streamline;
pub mod summary;

pub use builder::EngineBuilder;
pub use config::{Config, Level};
pub use driver::SharedEngine;
pub use engine::{EngineStats, FlowEngine, LoadRequest, LoadStatus};
pub use error::{FlowError, Result};

pub use animation::{Frame, Segment, Surface};
pub use classify::DisplayMode;
pub use field::{FieldEstimate, FlowField, WeightingScheme, interpolate};
pub use provider::{FetchOutcome, FlowProvider, FlowQuery, MemoryProvider, fetch_cancellable};
#[cfg(feature = "geojson")]
pub use provider::records_from_geojson;
pub use sample::{FlowRecord, Sample};
pub use spatial_hash::SpatialHash;
pub use streamline::{ProcessReport, Streamline, StreamlineGenerator, StreamlinePoint};
pub use summary::MonthlySummary;

pub use riverflow_types::color::Rgba;
pub use riverflow_types::month::Month;
pub use riverflow_types::viewport::Viewport;

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, EngineBuilder, FlowEngine, FlowError, Level, Result, SharedEngine};

    pub use crate::{DisplayMode, FetchOutcome, FlowProvider, FlowRecord, MemoryProvider};

    pub use crate::{Frame, Segment, Surface};

    pub use crate::{Month, Rgba, Viewport};

    pub use std::time::Duration;
}
