//! Flow field reconstruction from nearby samples.
//!
//! Given a query point, every sample within `search_radius` contributes to a
//! weighted average of direction and monthly flow. With one neighbor its
//! weight is 1; with several, each gets `1 - d / sum(d)`. Those weights do
//! not add up to 1 once more than two samples qualify, which shapes the
//! rendered speeds, so it remains the default. `WeightingScheme::Normalized`
//! opts into a proper convex combination.

use crate::sample::Sample;
use crate::spatial_hash::SpatialHash;
use riverflow_types::month::Month;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How neighbor weights are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// `1 - d/sum`, unnormalized
    #[default]
    Reference,
    /// `1 - d/sum`, divided by the total weight
    Normalized,
}

/// Reconstructed flow at one point for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEstimate {
    /// Query x
    pub x: f64,
    /// Query y
    pub y: f64,
    /// Weighted direction x component
    pub dx: f64,
    /// Weighted direction y component
    pub dy: f64,
    /// Weighted flow for the month
    pub f: f64,
    /// Weighted ten-year average, when every neighbor has one
    pub average: Option<f64>,
    /// Stream order of the nearest contributing sample
    pub order: Option<u8>,
    /// Number of samples that contributed
    pub neighbors: usize,
}

/// Reconstruct the flow at `(x, y)`.
///
/// Returns `None` when no sample lies within `search_radius`; that is the
/// signal for "outside the field", not an error.
pub fn interpolate(
    index: &SpatialHash,
    x: f64,
    y: f64,
    month: Month,
    search_radius: f64,
    weighting: WeightingScheme,
) -> Option<FieldEstimate> {
    let mut nearby: SmallVec<[(f64, &Sample); 16]> = SmallVec::new();
    let mut sum = 0.0;
    for sample in index.query(x, y, search_radius) {
        let d = sample.distance_to(x, y);
        if d > search_radius {
            continue;
        }
        sum += d;
        nearby.push((d, sample));
    }
    if nearby.is_empty() {
        return None;
    }

    let single = nearby.len() == 1;
    let order = nearby
        .iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .and_then(|(_, sample)| sample.order());
    let mut estimate = FieldEstimate {
        x,
        y,
        dx: 0.0,
        dy: 0.0,
        f: 0.0,
        average: Some(0.0),
        order,
        neighbors: nearby.len(),
    };
    let mut total = 0.0;
    for (d, sample) in &nearby {
        // All neighbors coincide with the query point when sum is zero
        let w = if single || sum == 0.0 { 1.0 } else { 1.0 - d / sum };
        let (ux, uy) = sample.direction();
        estimate.dx += w * ux;
        estimate.dy += w * uy;
        estimate.f += w * sample.flow(month);
        estimate.average = match (estimate.average, sample.average()) {
            (Some(acc), Some(v)) => Some(acc + w * v),
            _ => None,
        };
        total += w;
    }

    if weighting == WeightingScheme::Normalized && total > 0.0 {
        estimate.dx /= total;
        estimate.dy /= total;
        estimate.f /= total;
        estimate.average = estimate.average.map(|v| v / total);
    }
    Some(estimate)
}

/// A sample index bound to the month and radius of one generation cycle.
#[derive(Debug, Clone, Copy)]
pub struct FlowField<'a> {
    index: &'a SpatialHash,
    month: Month,
    search_radius: f64,
    weighting: WeightingScheme,
}

impl<'a> FlowField<'a> {
    pub fn new(
        index: &'a SpatialHash,
        month: Month,
        search_radius: f64,
        weighting: WeightingScheme,
    ) -> Self {
        Self {
            index,
            month,
            search_radius,
            weighting,
        }
    }

    /// Reconstruct the flow at a point.
    pub fn at(&self, x: f64, y: f64) -> Option<FieldEstimate> {
        interpolate(
            self.index,
            x,
            y,
            self.month,
            self.search_radius,
            self.weighting,
        )
    }

    pub fn month(&self) -> Month {
        self.month
    }
}
