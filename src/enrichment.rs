//! Spatial joins of auxiliary datasets onto street segments.
//!
//! Both passes bucket the auxiliary records into a [`SpatialGridIndex`] keyed
//! by rounded coordinates and only ever raise segment scores. Malformed
//! records are skipped.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::coord::{Coordinate, GridKey};
use crate::geometry;
use crate::segment::{ConditionRecord, LightRecord, StreetSegment};

/// Condition grid precision (~11 m cells).
pub const CONDITION_GRID_DECIMALS: u32 = 4;
/// Lighting grid precision (~110 m cells).
pub const LIGHT_GRID_DECIMALS: u32 = 3;
/// Fixtures closer than this to a segment start count towards its lighting.
pub const LIGHT_RADIUS_M: f64 = 30.0;

/// Transient hash grid from rounded-coordinate buckets to records.
pub struct SpatialGridIndex<T> {
    decimals: u32,
    cells: HashMap<GridKey, Vec<T>>,
}

impl<T> SpatialGridIndex<T> {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            cells: HashMap::new(),
        }
    }

    pub fn key(&self, coord: Coordinate) -> GridKey {
        GridKey::new(coord, self.decimals)
    }

    pub fn insert(&mut self, coord: Coordinate, value: T) {
        let key = self.key(coord);
        self.cells.entry(key).or_default().push(value);
    }

    /// Records in the bucket containing `coord`.
    pub fn bucket(&self, coord: Coordinate) -> &[T] {
        self.cells
            .get(&self.key(coord))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records in the bucket containing `coord` and its eight neighbours.
    pub fn around(&self, coord: Coordinate) -> impl Iterator<Item = &T> {
        self.key(coord)
            .neighbourhood()
            .filter_map(|key| self.cells.get(&key))
            .flatten()
    }

    pub fn entry_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}

/// Ordinal score for a condition rating.
pub fn condition_score(condition: &str) -> f64 {
    match condition.trim().to_ascii_lowercase().as_str() {
        "very good" | "excellent" => 9.0,
        "good" => 7.0,
        "fair" => 5.0,
        "poor" => 3.0,
        "very poor" => 2.0,
        _ => 1.0,
    }
}

/// Raise `infra` to the best condition score found at either segment endpoint.
///
/// Returns the number of segments whose score changed.
pub fn apply_conditions(segments: &mut [StreetSegment], records: &[ConditionRecord]) -> usize {
    let mut grid = SpatialGridIndex::new(CONDITION_GRID_DECIMALS);
    let mut skipped = 0;
    for record in records {
        let line = geometry::normalize_line(&record.geometry);
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            skipped += 1;
            continue;
        };
        let score = condition_score(&record.condition);
        grid.insert(*first, score);
        if last != first {
            grid.insert(*last, score);
        }
    }
    debug!(
        "Condition grid holds {} entries ({skipped} records skipped)",
        grid.entry_count()
    );

    let mut raised = 0;
    for segment in segments.iter_mut() {
        let best = grid
            .bucket(segment.start)
            .iter()
            .chain(grid.bucket(segment.end))
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if best > segment.scores.infra {
            segment.scores.infra = best;
            raised += 1;
        }
    }
    info!("Condition enrichment raised infra on {raised} segments");
    raised
}

/// Set `light = min(10, 5 + fixtures within LIGHT_RADIUS_M of the start)`,
/// never lowering an existing score.
///
/// Returns the number of segments whose score changed.
pub fn apply_lighting(segments: &mut [StreetSegment], records: &[LightRecord]) -> usize {
    let mut grid = SpatialGridIndex::new(LIGHT_GRID_DECIMALS);
    let mut skipped = 0;
    for record in records {
        match geometry::normalize_point(&record.geometry) {
            Some(point) if point.is_finite() => grid.insert(point, point),
            _ => skipped += 1,
        }
    }
    debug!(
        "Lighting grid holds {} fixtures ({skipped} records skipped)",
        grid.entry_count()
    );

    let mut raised = 0;
    for segment in segments.iter_mut() {
        let count = grid
            .around(segment.start)
            .filter(|fixture| fixture.distance_m(segment.start) <= LIGHT_RADIUS_M)
            .count();
        let light = (5.0 + count as f64).min(10.0);
        if light > segment.scores.light {
            segment.scores.light = light;
            raised += 1;
        }
    }
    info!("Lighting enrichment raised light on {raised} segments");
    raised
}
