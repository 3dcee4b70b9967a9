//! Engine builder.
//!
//! Collects the configuration and the initial view, validates the
//! configuration and seeds the streamline RNG.

use crate::config::Config;
use crate::engine::FlowEngine;
use crate::error::{FlowError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use riverflow_types::month::Month;
use riverflow_types::viewport::Viewport;

/// Builder for [`FlowEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: Config,
    viewport: Viewport,
    zoom: u8,
    month: Month,
}

impl EngineBuilder {
    /// Start from the default configuration, an empty viewport, zoom 0 and
    /// January.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            viewport: Viewport::pixels(0, 0),
            zoom: 0,
            month: Month::JANUARY,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn month(mut self, month: Month) -> Self {
        self.month = month;
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// The RNG is seeded from `Config::rng_seed` when set, otherwise from
    /// system entropy.
    pub fn build(self) -> Result<FlowEngine> {
        self.config.validate().map_err(FlowError::InvalidConfig)?;

        let seed = self.config.rng_seed.unwrap_or_else(rand::random);
        let display = self.config.display;
        Ok(FlowEngine {
            config: self.config,
            viewport: self.viewport,
            zoom: self.zoom,
            month: self.month,
            display,
            index: None,
            pool: Vec::new(),
            pending: None,
            clear_pending: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            frames: 0,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DisplayMode;

    #[test]
    fn test_builder_default() {
        let engine = EngineBuilder::new().build().unwrap();
        assert_eq!(engine.month(), Month::JANUARY);
        assert!(engine.level().is_none());
        assert!(engine.viewport().is_empty());
        assert_eq!(engine.stats().frames, 0);
    }

    #[test]
    fn test_builder_with_settings() {
        let config = Config::default().with_display(DisplayMode::Flow);
        let engine = EngineBuilder::new()
            .config(config)
            .viewport(Viewport::pixels(640, 480))
            .zoom(6)
            .month(Month::new(3).unwrap())
            .build()
            .unwrap();
        assert_eq!(engine.display(), DisplayMode::Flow);
        assert_eq!(engine.zoom(), 6);
        assert_eq!(engine.month().number(), 3);
        assert_eq!(engine.viewport().size(), (640, 480));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = Config::default();
        config.fade_alpha = 1.5;
        let err = EngineBuilder::new().config(config).build().unwrap_err();
        assert!(matches!(err, FlowError::InvalidConfig(_)));
    }
}
