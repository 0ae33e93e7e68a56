//! Normalization of embedded GeoJSON geometry strings.
//!
//! Street, condition and lighting rows carry their geometry as a GeoJSON
//! string that went through a delimited-text export, so it usually arrives
//! wrapped in quotes with every inner quote doubled:
//!
//! ```text
//! "{""type"": ""LineString"", ""coordinates"": [[-123.12, 49.28], [-123.11, 49.28]]}"
//! ```
//!
//! Positions are longitude-first; everything handed back here is
//! latitude-first [`Coordinate`]s. Failures are never fatal: an unparseable or
//! unsupported geometry yields an empty result and the caller skips the row.

use geojson::{Geometry, Value};
use tracing::trace;

use crate::coord::Coordinate;

/// Undo quoting artifacts: one pair of surrounding quotes and doubled inner quotes.
fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    inner.replace("\"\"", "\"")
}

fn parse(raw: &str) -> Option<Value> {
    match unquote(raw).parse::<Geometry>() {
        Ok(geometry) => Some(geometry.value),
        Err(err) => {
            trace!("Unparseable geometry: {err}");
            None
        }
    }
}

fn position(values: &[f64]) -> Option<Coordinate> {
    match values {
        [lon, lat, ..] => Some(Coordinate::new(*lat, *lon)),
        _ => None,
    }
}

fn positions<'a, I>(positions: I) -> Vec<Coordinate>
where
    I: IntoIterator<Item = &'a Vec<f64>>,
{
    positions
        .into_iter()
        .map(|p| position(p))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// Parse a LineString or MultiLineString into one ordered (lat, lon) sequence.
///
/// MultiLineString parts are concatenated in order. Returns an empty vector
/// on any parse failure, malformed position or other geometry type.
pub fn normalize_line(raw: &str) -> Vec<Coordinate> {
    match parse(raw) {
        Some(Value::LineString(line)) => positions(&line),
        Some(Value::MultiLineString(parts)) => positions(parts.iter().flatten()),
        _ => Vec::new(),
    }
}

/// Parse a Point geometry.
pub fn normalize_point(raw: &str) -> Option<Coordinate> {
    match parse(raw)? {
        Value::Point(p) => position(&p),
        _ => None,
    }
}
