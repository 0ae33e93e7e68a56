//! Coordinates, great-circle distance and rounded grid keys.

use geo::prelude::*;
use geo::Point;
use serde::{Deserialize, Serialize};

/// Decimal places used to canonicalize segment endpoints into graph nodes (~0.1 m).
pub const NODE_KEY_PRECISION: u32 = 6;

/// A decimal-degree (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `geo` points are x = longitude, y = latitude.
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Haversine distance in metres.
    pub fn distance_m(self, other: Coordinate) -> f64 {
        self.to_point().haversine_distance(&other.to_point())
    }

    pub fn distance_km(self, other: Coordinate) -> f64 {
        self.distance_m(other) / 1000.0
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// GeoJSON order.
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for Coordinate {
    /// `[lat, lon]`, the order API callers send.
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A coordinate rounded to a fixed number of decimal places.
///
/// Used both as the canonical node identity (at [`NODE_KEY_PRECISION`]) and as
/// the bucket key of the coarser enrichment grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    lat: i64,
    lon: i64,
}

impl GridKey {
    pub fn new(coord: Coordinate, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            lat: (coord.lat * factor).round() as i64,
            lon: (coord.lon * factor).round() as i64,
        }
    }

    /// Canonical node key for a segment endpoint.
    pub fn node(coord: Coordinate) -> Self {
        Self::new(coord, NODE_KEY_PRECISION)
    }

    /// This bucket and its eight neighbours.
    pub fn neighbourhood(self) -> impl Iterator<Item = GridKey> {
        (-1..=1).flat_map(move |dlat| {
            (-1..=1).map(move |dlon| GridKey {
                lat: self.lat + dlat,
                lon: self.lon + dlon,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_one_degree_of_latitude() {
        let a = Coordinate::new(49.0, -123.0);
        let b = Coordinate::new(50.0, -123.0);
        let km = a.distance_km(b);
        assert!((km - 111.2).abs() < 0.5, "got {km}");
    }

    #[test]
    fn coincident_points_have_zero_distance() {
        let a = Coordinate::new(49.28, -123.12);
        assert_eq!(a.distance_m(a), 0.0);
    }

    #[test]
    fn node_keys_collapse_sub_precision_noise() {
        let a = Coordinate::new(49.280_000_01, -123.120_000_02);
        let b = Coordinate::new(49.28, -123.12);
        assert_eq!(GridKey::node(a), GridKey::node(b));

        let c = Coordinate::new(49.280_01, -123.12);
        assert_ne!(GridKey::node(b), GridKey::node(c));
    }

    #[test]
    fn neighbourhood_has_nine_distinct_cells() {
        let key = GridKey::new(Coordinate::new(49.2805, -123.1201), 3);
        let mut cells: Vec<_> = key.neighbourhood().collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&key));
    }
}
