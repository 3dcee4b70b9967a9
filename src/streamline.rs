//! Streamline tracing and pool top-up.
//!
//! A streamline starts at a random seed inside the viewport and follows the
//! reconstructed field one step at a time, each step scaled by the flow
//! class of the current estimate. Growth stops when the field runs out or the
//! polyline reaches `segment_count_max` points; polylines shorter than the
//! level minimum are thrown away.

use crate::classify::{line_width, speed_scale};
use crate::config::Level;
use crate::field::FlowField;
use rand::Rng;

/// A vertex of a streamline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamlinePoint {
    pub x: f64,
    pub y: f64,
    /// Stroke width for the segment ending here; `None` for the seed
    pub w: Option<f64>,
    /// Reconstructed flow at this point
    pub f: f64,
    /// Reconstructed ten-year average at this point
    pub average: Option<f64>,
    /// Stream order of the nearest sample
    pub order: Option<u8>,
}

/// A traced polyline plus its animation cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub(crate) points: Vec<StreamlinePoint>,
    pub(crate) cursor: usize,
}

impl Streamline {
    /// Wrap a traced polyline. Returns `None` for fewer than two points,
    /// which have nothing to draw. The cursor is clamped to the last segment.
    pub fn new(points: Vec<StreamlinePoint>, cursor: usize) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let cursor = cursor.min(points.len() - 2);
        Some(Self { points, cursor })
    }

    pub fn points(&self) -> &[StreamlinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the segment drawn on the next tick.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Result of tracing from one seed.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    /// No sample within reach of the seed
    DeadSeed,
    /// Traced, but shorter than the level minimum
    TooShort(usize),
    Complete(Vec<StreamlinePoint>),
}

/// Outcome of one top-up pass over the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Pool size the level asks for
    pub target: usize,
    /// Pool size after the pass
    pub pool_size: usize,
    pub added: usize,
    pub attempts: usize,
    pub dead_seeds: usize,
    pub short_discards: usize,
}

impl ProcessReport {
    /// True once the pool has reached its target.
    pub fn is_complete(&self) -> bool {
        self.pool_size >= self.target
    }

    pub(crate) fn merge(&mut self, other: &ProcessReport) {
        self.target = other.target;
        self.pool_size = other.pool_size;
        self.added += other.added;
        self.attempts += other.attempts;
        self.dead_seeds += other.dead_seeds;
        self.short_discards += other.short_discards;
    }
}

/// Traces streamlines through a field for one level and viewport.
pub struct StreamlineGenerator<'a> {
    field: FlowField<'a>,
    level: &'a Level,
    width: f64,
    height: f64,
}

impl<'a> StreamlineGenerator<'a> {
    /// `size` is the viewport size in pixels; seeds are drawn from it.
    pub fn new(field: FlowField<'a>, level: &'a Level, size: (u32, u32)) -> Self {
        Self {
            field,
            level,
            width: f64::from(size.0),
            height: f64::from(size.1),
        }
    }

    /// Trace a streamline from a seed point.
    pub fn trace(&self, x: f64, y: f64) -> Trace {
        let Some(mut estimate) = self.field.at(x, y) else {
            return Trace::DeadSeed;
        };

        let mut points = vec![StreamlinePoint {
            x,
            y,
            w: None,
            f: estimate.f,
            average: estimate.average,
            order: estimate.order,
        }];
        while points.len() < self.level.segment_count_max {
            let step = self.level.segment_length * speed_scale(estimate.f);
            let Some(next) = self
                .field
                .at(estimate.x + estimate.dx * step, estimate.y + estimate.dy * step)
            else {
                break;
            };
            points.push(StreamlinePoint {
                x: next.x,
                y: next.y,
                w: Some(line_width(next.f)),
                f: next.f,
                average: next.average,
                order: next.order,
            });
            estimate = next;
        }

        if points.len() < self.level.min_points() {
            Trace::TooShort(points.len())
        } else {
            Trace::Complete(points)
        }
    }

    /// Add streamlines to `pool` until it reaches the level target, `max_new`
    /// streamlines have been added, or `max_attempts` seeds have been tried.
    ///
    /// Never removes anything from the pool.
    pub fn top_up<R: Rng>(
        &self,
        pool: &mut Vec<Streamline>,
        rng: &mut R,
        max_new: usize,
        max_attempts: usize,
    ) -> ProcessReport {
        let target = self.level.polyline_count;
        let mut report = ProcessReport {
            target,
            pool_size: pool.len(),
            ..ProcessReport::default()
        };
        if self.level.is_degenerate() || self.width <= 0.0 || self.height <= 0.0 {
            return report;
        }

        while pool.len() < target && report.added < max_new && report.attempts < max_attempts {
            report.attempts += 1;
            let x = rng.gen_range(0.0..self.width);
            let y = rng.gen_range(0.0..self.height);
            match self.trace(x, y) {
                Trace::DeadSeed => report.dead_seeds += 1,
                Trace::TooShort(_) => report.short_discards += 1,
                Trace::Complete(points) => {
                    let cursor = rng.gen_range(0..=points.len() - 2);
                    pool.push(Streamline { points, cursor });
                    report.added += 1;
                }
            }
        }

        report.pool_size = pool.len();
        report
    }
}
