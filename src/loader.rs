//! Turning parsed record files into enriched street segments.
//!
//! The files hold JSON arrays of records produced by the upstream CSV
//! cleanup. A file that cannot be read or is not a JSON array is an error;
//! individual records that fail to deserialize are skipped.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::enrichment;
use crate::error::Result;
use crate::segment::{ConditionRecord, LightRecord, SegmentRecord, StreetSegment};

pub fn parse_records<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if records.len() < total {
        debug!("Skipped {} malformed records", total - records.len());
    }
    Ok(records)
}

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)?;
    parse_records(&content)
}

/// Convert records into segments and run both enrichment passes.
pub fn prepare_segments(
    records: Vec<SegmentRecord>,
    conditions: &[ConditionRecord],
    lights: &[LightRecord],
) -> Vec<StreetSegment> {
    let total = records.len();
    let mut segments: Vec<StreetSegment> = records
        .into_iter()
        .filter_map(SegmentRecord::into_segment)
        .collect();
    if segments.len() < total {
        warn!(
            "Skipped {} of {total} street records with unusable geometry",
            total - segments.len()
        );
    }

    if !conditions.is_empty() {
        enrichment::apply_conditions(&mut segments, conditions);
    }
    if !lights.is_empty() {
        enrichment::apply_lighting(&mut segments, lights);
    }

    warn!("No crime or disruption dataset joined; crime and disruption scores are static defaults");
    info!("Prepared {} street segments", segments.len());
    segments
}

pub fn load_segments(data: &DataConfig) -> Result<Vec<StreetSegment>> {
    info!("Loading street records: {}", data.segments_path.display());
    let records: Vec<SegmentRecord> = read_records(&data.segments_path)?;

    let conditions: Vec<ConditionRecord> = match &data.conditions_path {
        Some(path) => read_records(path)?,
        None => Vec::new(),
    };
    let lights: Vec<LightRecord> = match &data.lights_path {
        Some(path) => read_records(path)?,
        None => Vec::new(),
    };

    Ok(prepare_segments(records, &conditions, &lights))
}
