//! Monthly discharge summary over a loaded sample set, used for legends.

use crate::sample::Sample;
use riverflow_types::month::Month;
use serde::{Deserialize, Serialize};

/// Mean flow per month and mean ten-year average across a set of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Number of samples summarized
    pub samples: usize,
    /// Mean flow for each month, January first
    pub mean_flows: [f64; 12],
    /// Mean of `V` over the samples that carry one
    pub ten_year_average: Option<f64>,
}

impl MonthlySummary {
    /// Summarize samples. Returns `None` for an empty set.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Option<Self> {
        let mut count = 0usize;
        let mut sums = [0.0; 12];
        let mut average_sum = 0.0;
        let mut average_count = 0usize;

        for sample in samples {
            count += 1;
            for (sum, flow) in sums.iter_mut().zip(sample.flows()) {
                *sum += flow;
            }
            if let Some(v) = sample.average() {
                average_sum += v;
                average_count += 1;
            }
        }
        if count == 0 {
            return None;
        }

        let n = count as f64;
        Some(Self {
            samples: count,
            mean_flows: sums.map(|sum| sum / n),
            ten_year_average: (average_count > 0).then(|| average_sum / average_count as f64),
        })
    }

    pub fn mean_flow(&self, month: Month) -> f64 {
        self.mean_flows[month.index()]
    }

    /// Month mean as a percentage of the ten-year average.
    pub fn percent_of_average(&self, month: Month) -> Option<f64> {
        self.ten_year_average
            .filter(|v| *v > 0.0)
            .map(|v| self.mean_flow(month) / v * 100.0)
    }

    /// Month with the highest mean flow.
    pub fn peak_month(&self) -> Month {
        Month::all()
            .max_by(|a, b| self.mean_flow(*a).total_cmp(&self.mean_flow(*b)))
            .unwrap_or_default()
    }
}
