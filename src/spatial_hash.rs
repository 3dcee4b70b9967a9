//! Uniform grid hash over screen-space flow samples.
//!
//! Samples are bucketed by `(floor(x / cell), floor(y / cell))`. A radius
//! query walks every cell overlapping the square `[x-r, x+r] x [y-r, y+r]`,
//! so it may over-return; callers apply the exact distance filter. The index
//! is rebuilt whenever a new data set is loaded and never shrinks.

use crate::sample::Sample;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

type CellKey = (i64, i64);

/// Grid hash mapping cells to the samples inside them.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    samples: Vec<Sample>,
    cells: FxHashMap<CellKey, SmallVec<[u32; 4]>>,
}

impl SpatialHash {
    /// Create an empty hash. `cell_size` must be finite and positive; the
    /// configuration layer validates it before it gets here.
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0);
        Self {
            cell_size,
            samples: Vec::new(),
            cells: FxHashMap::default(),
        }
    }

    /// Build a hash from a freshly loaded sample set.
    pub fn from_samples(cell_size: f64, samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut hash = Self::new(cell_size);
        for sample in samples {
            hash.insert(sample);
        }
        hash
    }

    fn cell(&self, n: f64) -> i64 {
        (n / self.cell_size).floor() as i64
    }

    /// Insert a sample into the cell containing it.
    ///
    /// Returns `false` if the sample was rejected: non-finite coordinates, or
    /// an entry with the same position and source record already present.
    pub fn insert(&mut self, sample: Sample) -> bool {
        if !sample.x().is_finite() || !sample.y().is_finite() {
            log::warn!("Rejecting flow sample {} with non-finite coordinates", sample.id());
            return false;
        }

        let key = (self.cell(sample.x()), self.cell(sample.y()));
        let samples = &self.samples;
        let bucket = self.cells.entry(key).or_default();
        if bucket
            .iter()
            .any(|&i| samples[i as usize].same_source(&sample))
        {
            return false;
        }

        bucket.push(self.samples.len() as u32);
        self.samples.push(sample);
        true
    }

    /// All samples in cells overlapping the square of half-width `radius`
    /// around `(x, y)`. Negative or non-finite inputs return nothing. Cost
    /// grows with `(radius / cell_size)^2`, which level validation caps.
    pub fn query(&self, x: f64, y: f64, radius: f64) -> Vec<&Sample> {
        let mut found = Vec::new();
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) || radius < 0.0 {
            return found;
        }

        let (xmin, xmax) = (self.cell(x - radius), self.cell(x + radius));
        let (ymin, ymax) = (self.cell(y - radius), self.cell(y + radius));
        for i in xmin..=xmax {
            for j in ymin..=ymax {
                if let Some(bucket) = self.cells.get(&(i, j)) {
                    found.extend(bucket.iter().map(|&k| &self.samples[k as usize]));
                }
            }
        }
        found
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of indexed samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Indexed samples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
