//! Street segments and the parsed records they are built from.

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::geometry;

/// Per-segment category scores, roughly on a 0-10 scale.
///
/// `disruption` is a penalty magnitude rather than a rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub infra: f64,
    pub light: f64,
    pub crime: f64,
    pub amenity: f64,
    pub disruption: f64,
}

impl Default for Scores {
    // crime and disruption have no backing dataset yet; these are static placeholders.
    fn default() -> Self {
        Self {
            infra: 3.0,
            light: 5.0,
            crime: 5.0,
            amenity: 5.0,
            disruption: 0.0,
        }
    }
}

/// A contiguous piece of street or path geometry with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetSegment {
    pub id: String,
    /// Ordered (lat, lon) points, at least two.
    pub coordinates: Vec<Coordinate>,
    pub street_name: String,
    pub bikeway_type: String,
    pub speed_limit: Option<u32>,
    pub length_km: f64,
    pub start: Coordinate,
    pub end: Coordinate,
    pub scores: Scores,
}

impl StreetSegment {
    /// Build a segment from a coordinate sequence.
    ///
    /// Returns `None` for fewer than two points. A missing, negative or
    /// non-finite `length_km` is replaced by the great-circle distance
    /// between the endpoints.
    pub fn new(
        id: impl Into<String>,
        coordinates: Vec<Coordinate>,
        length_km: Option<f64>,
        scores: Scores,
    ) -> Option<Self> {
        if coordinates.len() < 2 || !coordinates.iter().all(|c| c.is_finite()) {
            return None;
        }
        let start = coordinates[0];
        let end = coordinates[coordinates.len() - 1];
        let length_km = length_km
            .filter(|l| l.is_finite() && *l >= 0.0)
            .unwrap_or_else(|| start.distance_km(end));

        Some(Self {
            id: id.into(),
            coordinates,
            street_name: String::new(),
            bikeway_type: String::new(),
            speed_limit: None,
            length_km,
            start,
            end,
            scores,
        })
    }

    pub fn with_street_name(mut self, name: impl Into<String>) -> Self {
        self.street_name = name.into();
        self
    }

    pub fn with_bikeway_type(mut self, bikeway_type: impl Into<String>) -> Self {
        self.bikeway_type = bikeway_type.into();
        self
    }
}

/// Baseline infrastructure score for a bikeway/path category.
pub fn infra_baseline(bikeway_type: &str) -> f64 {
    let t = bikeway_type.to_ascii_lowercase();
    if t.contains("protected") || t.contains("separated") || t.contains("multi-use") {
        8.0
    } else if t.contains("painted") || t.contains("bike lane") {
        6.0
    } else if t.contains("shared") || t.contains("local street") {
        4.0
    } else {
        3.0
    }
}

/// A street row as handed over by the external loader.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentRecord {
    pub id: String,
    /// Embedded GeoJSON LineString/MultiLineString, see [`geometry::normalize_line`].
    pub geometry: String,
    #[serde(default)]
    pub street_name: String,
    #[serde(default)]
    pub bikeway_type: String,
    #[serde(default)]
    pub speed_limit: Option<u32>,
    #[serde(default)]
    pub length_km: Option<f64>,
}

impl SegmentRecord {
    /// Returns `None` when the geometry is unusable; the caller skips the row.
    pub fn into_segment(self) -> Option<StreetSegment> {
        let coordinates = geometry::normalize_line(&self.geometry);
        let scores = Scores {
            infra: infra_baseline(&self.bikeway_type),
            ..Scores::default()
        };
        let mut segment = StreetSegment::new(self.id, coordinates, self.length_km, scores)?
            .with_street_name(self.street_name)
            .with_bikeway_type(self.bikeway_type);
        segment.speed_limit = self.speed_limit;
        Some(segment)
    }
}

/// A pavement/surface condition line from the auxiliary dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionRecord {
    pub geometry: String,
    #[serde(default)]
    pub condition: String,
}

/// A lighting fixture location.
#[derive(Debug, Clone, Deserialize)]
pub struct LightRecord {
    pub geometry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(geometry: &str, length_km: Option<f64>) -> SegmentRecord {
        SegmentRecord {
            id: "s1".into(),
            geometry: geometry.into(),
            street_name: "Main St".into(),
            bikeway_type: "Protected Bike Lanes".into(),
            speed_limit: Some(30),
            length_km,
        }
    }

    #[test]
    fn derives_length_from_endpoints() {
        let r = record(
            r#"{"type": "LineString", "coordinates": [[-123.0, 49.0], [-123.0, 49.01]]}"#,
            None,
        );
        let seg = r.into_segment().unwrap();
        assert!((seg.length_km - 1.112).abs() < 0.01, "got {}", seg.length_km);
        assert_eq!(seg.start, Coordinate::new(49.0, -123.0));
        assert_eq!(seg.end, Coordinate::new(49.01, -123.0));
        assert_eq!(seg.scores.infra, 8.0);
        assert_eq!(seg.speed_limit, Some(30));
    }

    #[test]
    fn keeps_given_length() {
        let r = record(
            r#"{"type": "LineString", "coordinates": [[-123.0, 49.0], [-123.0, 49.01]]}"#,
            Some(0.5),
        );
        assert_eq!(r.into_segment().unwrap().length_km, 0.5);
    }

    #[test]
    fn rejects_short_or_broken_geometry() {
        assert!(record(r#"{"type": "LineString", "coordinates": [[-123.0, 49.0]]}"#, None)
            .into_segment()
            .is_none());
        assert!(record("garbage", None).into_segment().is_none());
    }

    #[test]
    fn zero_length_segment_is_allowed() {
        let p = Coordinate::new(49.0, -123.0);
        let seg = StreetSegment::new("z", vec![p, p], None, Scores::default()).unwrap();
        assert_eq!(seg.length_km, 0.0);
    }

    #[test]
    fn baseline_by_bikeway_type() {
        assert_eq!(infra_baseline("Painted Lanes"), 6.0);
        assert_eq!(infra_baseline("Local Street"), 4.0);
        assert_eq!(infra_baseline(""), 3.0);
    }
}
