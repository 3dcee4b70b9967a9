//! Data providers and cancellable fetching.
//!
//! A provider answers a [`FlowQuery`] (extent, river buffer, attribute list)
//! with raw [`FlowRecord`]s in map coordinates. Fetches are raced against the
//! load's cancellation token, so a reset that cancels the token guarantees the
//! results never reach the engine.

use crate::config::Level;
use crate::engine::LoadRequest;
use crate::error::{FlowError, Result};
use crate::sample::{FlowRecord, out_fields};
use geo::Rect;
use riverflow_types::viewport::Viewport;
use std::future::Future;
use std::time::Duration;

/// What to ask the data source for.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowQuery {
    /// Feature service endpoint for the active level
    pub url: String,
    /// Map-space extent to clip to
    pub extent: Rect,
    /// Maximum distance to a river (`D`)
    pub buffer: f64,
    /// Attribute names to return
    pub out_fields: Vec<String>,
}

impl FlowQuery {
    pub fn for_level(level: &Level, viewport: &Viewport) -> Self {
        Self {
            url: level.url.clone(),
            extent: viewport.extent,
            buffer: level.buffer,
            out_fields: out_fields(),
        }
    }

    /// SQL-style filter understood by feature services.
    pub fn where_clause(&self) -> String {
        format!("D<={}", self.buffer)
    }

    /// Local evaluation of the query. Records without a `D` attribute are
    /// not filtered by distance.
    pub fn matches(&self, record: &FlowRecord) -> bool {
        let (x, y) = (record.geometry.x, record.geometry.y);
        let (min, max) = (self.extent.min(), self.extent.max());
        let inside = x >= min.x && x <= max.x && y >= min.y && y <= max.y;
        inside && record.river_distance().is_none_or(|d| d <= self.buffer)
    }
}

/// Source of flow records, typically a remote feature service.
pub trait FlowProvider: Send + Sync {
    fn fetch(&self, query: &FlowQuery) -> impl Future<Output = Result<Vec<FlowRecord>>> + Send;
}

/// Raw result of a fetch as seen by the engine.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The load was cancelled before the provider answered
    Cancelled,
    Ready(Vec<FlowRecord>),
    Failed(FlowError),
}

/// Run a provider fetch for `request`, resolving to `Cancelled` as soon as
/// the request's token is cancelled.
pub async fn fetch_cancellable<P: FlowProvider + ?Sized>(
    provider: &P,
    request: &LoadRequest,
) -> FetchOutcome {
    let token = request.token().clone();
    tokio::select! {
        biased;
        _ = token.cancelled() => FetchOutcome::Cancelled,
        result = provider.fetch(request.query()) => match result {
            Ok(records) => FetchOutcome::Ready(records),
            Err(e) => FetchOutcome::Failed(e),
        },
    }
}

/// Provider over an in-memory record set, evaluating queries locally.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    records: Vec<FlowRecord>,
    latency: Option<Duration>,
}

impl MemoryProvider {
    pub fn new(records: Vec<FlowRecord>) -> Self {
        Self {
            records,
            latency: None,
        }
    }

    /// Delay every answer, to mimic a slow service.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Load records from a GeoJSON FeatureCollection.
    #[cfg(feature = "geojson")]
    pub fn from_geojson(text: &str) -> Result<Self> {
        Ok(Self::new(records_from_geojson(text)?))
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }
}

impl FlowProvider for MemoryProvider {
    async fn fetch(&self, query: &FlowQuery) -> Result<Vec<FlowRecord>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self
            .records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }
}

/// Parse a GeoJSON FeatureCollection of point features into flow records.
///
/// Numeric properties become attributes and `null` properties stay as
/// missing values; features without point geometry are skipped.
#[cfg(feature = "geojson")]
pub fn records_from_geojson(text: &str) -> Result<Vec<FlowRecord>> {
    use geojson::{GeoJson, Value};

    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(FlowError::InvalidData(
                "expected a GeoJSON FeatureCollection".to_string(),
            ));
        }
    };

    let mut records = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(Value::Point(position)) = feature.geometry.map(|g| g.value) else {
            log::debug!("Skipping GeoJSON feature without point geometry");
            continue;
        };
        let (Some(&x), Some(&y)) = (position.first(), position.get(1)) else {
            continue;
        };

        let mut record = FlowRecord::new(x, y);
        for (name, value) in feature.properties.unwrap_or_default() {
            if value.is_null() {
                record.attributes.insert(name, None);
            } else if let Some(number) = value.as_f64() {
                record.attributes.insert(name, Some(number));
            }
        }
        records.push(record);
    }
    Ok(records)
}
