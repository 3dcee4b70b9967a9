//! Flow samples and the raw records they are ingested from.
//!
//! A [`FlowRecord`] is what a feature service hands back: a map-space point
//! plus a bag of numeric attributes (`B` azimuth, `F1`..`F12` monthly flows,
//! optionally `V` ten-year average, `D` distance to river, `S` stream order,
//! `OBJECTID`). A [`Sample`] is the immutable, screen-projected form the
//! engine indexes.

use crate::error::{FlowError, Result};
use riverflow_types::month::Month;
use riverflow_types::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AZIMUTH_FIELD: &str = "B";
pub const AVERAGE_FIELD: &str = "V";
pub const DISTANCE_FIELD: &str = "D";
pub const ORDER_FIELD: &str = "S";
pub const ID_FIELD: &str = "OBJECTID";

/// Name of the flow attribute for a month (`F1`..`F12`).
pub fn flow_field(month: Month) -> String {
    format!("F{}", month.number())
}

/// Attribute names requested from the data source.
pub fn out_fields() -> Vec<String> {
    let mut fields = vec![
        AZIMUTH_FIELD.to_string(),
        AVERAGE_FIELD.to_string(),
        ORDER_FIELD.to_string(),
    ];
    fields.extend(Month::all().map(flow_field));
    fields
}

/// Map-space location of a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordGeometry {
    pub x: f64,
    pub y: f64,
}

/// One raw feature as delivered by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub geometry: RecordGeometry,
    #[serde(default)]
    pub attributes: BTreeMap<String, Option<f64>>,
}

impl FlowRecord {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            geometry: RecordGeometry { x, y },
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute, builder style.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.attributes.insert(name.to_string(), Some(value));
        self
    }

    /// Set azimuth and all twelve monthly flows at once.
    pub fn with_flows(mut self, azimuth: f64, flows: [f64; 12]) -> Self {
        self.attributes
            .insert(AZIMUTH_FIELD.to_string(), Some(azimuth));
        for month in Month::all() {
            self.attributes
                .insert(flow_field(month), Some(flows[month.index()]));
        }
        self
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied().flatten()
    }

    /// Distance to the nearest river (`D`), if present.
    pub fn river_distance(&self) -> Option<f64> {
        self.attribute(DISTANCE_FIELD)
    }

    fn require(&self, index: usize, name: &str) -> Result<f64> {
        match self.attribute(name) {
            Some(v) if v.is_finite() => Ok(v),
            Some(_) => Err(FlowError::InvalidRecord {
                index,
                reason: format!("attribute {} is not finite", name),
            }),
            None => Err(FlowError::InvalidRecord {
                index,
                reason: format!("missing attribute {}", name),
            }),
        }
    }
}

/// An immutable flow measurement positioned in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    id: u64,
    x: f64,
    y: f64,
    azimuth: f64,
    dx: f64,
    dy: f64,
    flows: [f64; 12],
    average: Option<f64>,
    order: Option<u8>,
}

impl Sample {
    /// Create a sample.
    ///
    /// `azimuth` is in degrees; the direction vector is
    /// `(sin(azimuth), -cos(azimuth))` in screen space.
    pub fn new(id: u64, x: f64, y: f64, azimuth: f64, flows: [f64; 12]) -> Self {
        let radians = azimuth.to_radians();
        Self {
            id,
            x,
            y,
            azimuth,
            dx: radians.sin(),
            dy: -radians.cos(),
            flows,
            average: None,
            order: None,
        }
    }

    pub fn with_average(mut self, average: f64) -> Self {
        self.average = Some(average);
        self
    }

    pub fn with_order(mut self, order: u8) -> Self {
        self.order = Some(order);
        self
    }

    /// Build a sample from a raw record, projecting it onto the viewport.
    ///
    /// `index` is the record's position in its batch; it becomes the sample
    /// id when the record carries no `OBJECTID`.
    pub fn from_record(index: usize, record: &FlowRecord, viewport: &Viewport) -> Result<Self> {
        let (gx, gy) = (record.geometry.x, record.geometry.y);
        if !gx.is_finite() || !gy.is_finite() {
            return Err(FlowError::InvalidRecord {
                index,
                reason: "non-finite geometry".to_string(),
            });
        }

        let azimuth = record.require(index, AZIMUTH_FIELD)?;
        let mut flows = [0.0; 12];
        for month in Month::all() {
            flows[month.index()] = record.require(index, &flow_field(month))?;
        }

        let screen = viewport.to_screen(&geo::Point::new(gx, gy));
        let id = record
            .attribute(ID_FIELD)
            .and_then(object_id)
            .unwrap_or(index as u64);

        let mut sample = Sample::new(id, screen.x(), screen.y(), azimuth, flows);
        sample.average = record.attribute(AVERAGE_FIELD).filter(|v| v.is_finite());
        sample.order = record
            .attribute(ORDER_FIELD)
            .filter(|v| (0.0..=f64::from(u8::MAX)).contains(v) && v.fract() == 0.0)
            .map(|v| v as u8);
        Ok(sample)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    /// Unit direction vector in screen space.
    pub fn direction(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Flow for a month.
    pub fn flow(&self, month: Month) -> f64 {
        self.flows[month.index()]
    }

    pub fn flows(&self) -> &[f64; 12] {
        &self.flows
    }

    /// Ten-year average flow (`V`).
    pub fn average(&self) -> Option<f64> {
        self.average
    }

    /// Stream order (`S`).
    pub fn order(&self) -> Option<u8> {
        self.order
    }

    /// Euclidean distance to a screen point.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Identity used to suppress duplicate inserts: position plus source record.
    pub(crate) fn same_source(&self, other: &Sample) -> bool {
        self.id == other.id && self.x == other.x && self.y == other.y
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_ID: f64 = 9_007_199_254_740_992.0;

/// An `OBJECTID` usable as a sample id: a whole number in `[0, 2^53]`.
/// Anything else would collapse onto another id when cast.
fn object_id(value: f64) -> Option<u64> {
    ((0.0..=MAX_EXACT_ID).contains(&value) && value.fract() == 0.0).then_some(value as u64)
}

/// Convert a batch of records into samples, skipping (and logging) records
/// that lack required attributes.
pub fn samples_from_records(records: &[FlowRecord], viewport: &Viewport) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(records.len());
    let mut rejected = 0usize;
    for (index, record) in records.iter().enumerate() {
        match Sample::from_record(index, record, viewport) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                rejected += 1;
                log::debug!("Skipping flow record: {}", e);
            }
        }
    }
    if rejected > 0 {
        log::warn!(
            "Skipped {} of {} flow records with missing or invalid attributes",
            rejected,
            records.len()
        );
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flows(value: f64) -> [f64; 12] {
        [value; 12]
    }

    #[test]
    fn test_direction_north_is_up() {
        let sample = Sample::new(1, 0.0, 0.0, 0.0, flows(1.0));
        let (dx, dy) = sample.direction();
        assert!(dx.abs() < 1e-12);
        assert!((dy + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_direction_east() {
        let sample = Sample::new(1, 0.0, 0.0, 90.0, flows(1.0));
        let (dx, dy) = sample.direction();
        assert!((dx - 1.0).abs() < 1e-12);
        assert!(dy.abs() < 1e-12);
    }

    #[test]
    fn test_from_record_projects_and_reads_attributes() {
        let viewport = Viewport::new(0.0, 0.0, 100.0, 100.0, 200, 200);
        let mut monthly = [0.0; 12];
        monthly[2] = 300.0;
        let record = FlowRecord::new(25.0, 75.0)
            .with_flows(45.0, monthly)
            .with(AVERAGE_FIELD, 150.0)
            .with(ORDER_FIELD, 7.0)
            .with(ID_FIELD, 42.0);

        let sample = Sample::from_record(0, &record, &viewport).unwrap();
        assert_eq!(sample.id(), 42);
        assert_eq!((sample.x(), sample.y()), (50.0, 50.0));
        assert_eq!(sample.flow(Month::new(3).unwrap()), 300.0);
        assert_eq!(sample.average(), Some(150.0));
        assert_eq!(sample.order(), Some(7));
    }

    #[test]
    fn test_from_record_missing_month() {
        let viewport = Viewport::pixels(10, 10);
        let record = FlowRecord::new(1.0, 1.0).with(AZIMUTH_FIELD, 0.0).with("F1", 1.0);
        let err = Sample::from_record(3, &record, &viewport).unwrap_err();
        assert!(matches!(err, FlowError::InvalidRecord { index: 3, .. }));
    }

    #[test]
    fn test_null_attribute_is_missing() {
        let mut record = FlowRecord::new(1.0, 1.0).with_flows(0.0, flows(5.0));
        record.attributes.insert("F6".to_string(), None);
        assert!(Sample::from_record(0, &record, &Viewport::pixels(10, 10)).is_err());
    }

    #[test]
    fn test_samples_from_records_skips_invalid() {
        let viewport = Viewport::pixels(10, 10);
        let records = vec![
            FlowRecord::new(1.0, 1.0).with_flows(0.0, flows(5.0)),
            FlowRecord::new(2.0, 2.0),
            FlowRecord::new(3.0, 3.0).with_flows(90.0, flows(6.0)),
        ];
        let samples = samples_from_records(&records, &viewport);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].id(), 2);
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{
            "geometry": { "x": 10.0, "y": 20.0 },
            "attributes": { "B": 180.0, "F1": 1.0, "D": 2.5, "V": null }
        }"#;
        let record: FlowRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.attribute("B"), Some(180.0));
        assert_eq!(record.river_distance(), Some(2.5));
        assert_eq!(record.attribute("V"), None);
    }

    #[test]
    fn test_out_fields() {
        let fields = out_fields();
        assert_eq!(fields.len(), 15);
        assert_eq!(fields[3], "F1");
        assert_eq!(fields[14], "F12");
        assert!(fields.contains(&ORDER_FIELD.to_string()));
    }

    #[test]
    fn test_unusable_object_ids_fall_back_to_position() {
        let viewport = Viewport::pixels(10, 10);
        let records: Vec<FlowRecord> = [-1.0, -2.0, 2.5, f64::INFINITY, 1e300]
            .iter()
            .map(|&id| {
                FlowRecord::new(5.0, 5.0)
                    .with_flows(0.0, flows(1.0))
                    .with(ID_FIELD, id)
            })
            .collect();
        let samples = samples_from_records(&records, &viewport);
        let ids: Vec<u64> = samples.iter().map(Sample::id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_colocated_records_with_negative_ids_are_kept() {
        let viewport = Viewport::pixels(10, 10);
        let records = vec![
            FlowRecord::new(5.0, 5.0)
                .with_flows(0.0, flows(1.0))
                .with(ID_FIELD, -1.0),
            FlowRecord::new(5.0, 5.0)
                .with_flows(90.0, flows(2.0))
                .with(ID_FIELD, -2.0),
        ];
        let hash = crate::spatial_hash::SpatialHash::from_samples(
            10.0,
            samples_from_records(&records, &viewport),
        );
        assert_eq!(hash.len(), 2);
    }

    #[test]
    fn test_fractional_order_is_ignored() {
        let record = FlowRecord::new(1.0, 1.0)
            .with_flows(0.0, flows(1.0))
            .with(ORDER_FIELD, 6.5);
        let sample = Sample::from_record(0, &record, &Viewport::pixels(10, 10)).unwrap();
        assert_eq!(sample.order(), None);
    }
}
