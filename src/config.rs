//! Engine configuration and per-zoom-level generation parameters.
//!
//! Configuration is plain serde data so it can be loaded from JSON (or TOML
//! with the `toml` feature) alongside the rest of a map application's
//! settings.

use crate::classify::DisplayMode;
use crate::error::{FlowError, Result};
use crate::field::WeightingScheme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest accepted frame rate. Faster rates would need sub-millisecond
/// tick intervals.
pub const MAX_FRAME_RATE: u32 = 1000;

/// Largest `search_radius / hash_size` ratio a level may use. A field
/// lookup walks `(2 * ratio + 1)^2` cells, so this bounds it to about 16k.
pub const MAX_RADIUS_CELLS: f64 = 64.0;

/// Generation parameters for one map zoom level.
///
/// Distances are in screen pixels except `buffer`, which is the maximum
/// sample distance to a river (the `D` attribute) requested from the data
/// source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Level {
    /// Map zoom level this entry applies to
    pub zoom: u8,
    /// Maximum distance from a river for fetched samples
    pub buffer: f64,
    /// Spatial hash cell size
    pub hash_size: f64,
    /// Field reconstruction search radius
    pub search_radius: f64,
    /// Target number of live streamlines
    pub polyline_count: usize,
    /// Base advance length per step
    pub segment_length: f64,
    /// Shortest accepted streamline, in points
    pub segment_count_min: usize,
    /// Longest streamline, in points
    pub segment_count_max: usize,
    /// Data source for this level
    pub url: String,
}

impl Level {
    /// Validate a single level.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.hash_size.is_finite() || self.hash_size <= 0.0 {
            return Err(format!(
                "Level {}: hash_size must be finite and positive",
                self.zoom
            ));
        }
        if !self.segment_length.is_finite() || self.segment_length <= 0.0 {
            return Err(format!(
                "Level {}: segment_length must be finite and positive",
                self.zoom
            ));
        }
        if !self.search_radius.is_finite() || self.search_radius < 0.0 {
            return Err(format!(
                "Level {}: search_radius must be finite and non-negative",
                self.zoom
            ));
        }
        if self.search_radius / self.hash_size > MAX_RADIUS_CELLS {
            return Err(format!(
                "Level {}: search_radius spans more than {} hash cells",
                self.zoom, MAX_RADIUS_CELLS
            ));
        }
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(format!(
                "Level {}: buffer must be finite and non-negative",
                self.zoom
            ));
        }
        if self.segment_count_max < 2 {
            return Err(format!(
                "Level {}: segment_count_max must be at least 2",
                self.zoom
            ));
        }
        if self.segment_count_min > self.segment_count_max {
            return Err(format!(
                "Level {}: segment_count_min ({}) exceeds segment_count_max ({})",
                self.zoom, self.segment_count_min, self.segment_count_max
            ));
        }
        Ok(())
    }

    /// Shortest streamline the generator keeps. A single point has no
    /// drawable segment, so this never drops below two.
    pub fn min_points(&self) -> usize {
        self.segment_count_min.max(2)
    }

    /// True when this level cannot produce anything to draw.
    pub fn is_degenerate(&self) -> bool {
        self.polyline_count == 0 || self.search_radius <= 0.0
    }
}

/// Engine configuration.
///
/// # Example
///
/// ```rust
/// use riverflow::Config;
///
/// let json = r#"{
///     "frame_rate": 20,
///     "levels": [{
///         "zoom": 5,
///         "buffer": 5.0,
///         "hash_size": 10.0,
///         "search_radius": 20.0,
///         "polyline_count": 500,
///         "segment_length": 4.0,
///         "segment_count_min": 5,
///         "segment_count_max": 30,
///         "url": "https://example.com/FeatureServer/0"
///     }]
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert!(config.level_for(5).is_some());
/// assert!(config.level_for(6).is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Animation ticks per second
    #[serde(default = "Config::default_frame_rate")]
    pub frame_rate: u32,

    /// Alpha kept from the previous frame on every tick
    #[serde(default = "Config::default_fade_alpha")]
    pub fade_alpha: f64,

    /// Seed attempts allowed per missing streamline before a top-up gives up
    #[serde(default = "Config::default_seed_attempts")]
    pub seed_attempts_per_streamline: usize,

    /// Streamlines added per top-up batch before yielding
    #[serde(default = "Config::default_seed_batch")]
    pub seed_batch: usize,

    #[serde(default)]
    pub weighting: WeightingScheme,

    #[serde(default)]
    pub display: DisplayMode,

    /// Fixed RNG seed for reproducible streamlines
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Basemap tile service, passed through to the map collaborator
    #[serde(default)]
    pub basemap: Option<String>,

    #[serde(default)]
    pub levels: Vec<Level>,
}

impl Config {
    const fn default_frame_rate() -> u32 {
        20
    }

    const fn default_fade_alpha() -> f64 {
        0.90
    }

    const fn default_seed_attempts() -> usize {
        50
    }

    const fn default_seed_batch() -> usize {
        25
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.levels.retain(|l| l.zoom != level.zoom);
        self.levels.push(level);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        assert!(frame_rate > 0, "Frame rate must be greater than zero");
        assert!(
            frame_rate <= MAX_FRAME_RATE,
            "Frame rate must be at most {}",
            MAX_FRAME_RATE
        );
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_fade_alpha(mut self, alpha: f64) -> Self {
        self.fade_alpha = alpha;
        self
    }

    pub fn with_weighting(mut self, weighting: WeightingScheme) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_seed_attempts(mut self, attempts: usize) -> Self {
        assert!(attempts > 0, "Seed attempts must be greater than zero");
        self.seed_attempts_per_streamline = attempts;
        self
    }

    pub fn with_seed_batch(mut self, batch: usize) -> Self {
        assert!(batch > 0, "Seed batch must be greater than zero");
        self.seed_batch = batch;
        self
    }

    /// Level for a zoom, if generation is enabled there.
    pub fn level_for(&self, zoom: u8) -> Option<&Level> {
        self.levels.iter().find(|l| l.zoom == zoom)
    }

    /// Milliseconds between animation ticks, never less than one.
    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / u64::from(self.frame_rate.max(1))).max(1)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.frame_rate == 0 {
            return Err("Frame rate must be greater than zero".to_string());
        }
        if self.frame_rate > MAX_FRAME_RATE {
            return Err(format!("Frame rate must be at most {}", MAX_FRAME_RATE));
        }
        if !self.fade_alpha.is_finite() || !(0.0..=1.0).contains(&self.fade_alpha) {
            return Err("Fade alpha must be between 0 and 1".to_string());
        }
        if self.seed_attempts_per_streamline == 0 {
            return Err("Seed attempts must be greater than zero".to_string());
        }
        if self.seed_batch == 0 {
            return Err("Seed batch must be greater than zero".to_string());
        }
        for (i, level) in self.levels.iter().enumerate() {
            level.validate()?;
            if self.levels[..i].iter().any(|l| l.zoom == level.zoom) {
                return Err(format!("Duplicate level for zoom {}", level.zoom));
            }
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate().map_err(FlowError::InvalidConfig)?;
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate().map_err(FlowError::InvalidConfig)?;
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a `.json` (or, with the toml feature, `.toml`) file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml(&text),
            _ => Err(FlowError::InvalidConfig(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_rate: Self::default_frame_rate(),
            fade_alpha: Self::default_fade_alpha(),
            seed_attempts_per_streamline: Self::default_seed_attempts(),
            seed_batch: Self::default_seed_batch(),
            weighting: WeightingScheme::default(),
            display: DisplayMode::default(),
            rng_seed: None,
            basemap: None,
            levels: Vec::new(),
        }
    }
}
