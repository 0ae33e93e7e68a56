use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::segment::Scores;

// Baseline weights of the linear safety score.
const INFRA_WEIGHT: f64 = 2.5;
const AMENITY_WEIGHT: f64 = 1.5;
const CRIME_WEIGHT: f64 = -2.0;
const DISRUPTION_WEIGHT: f64 = -2.0;
const LIGHT_WEIGHT_NIGHT: f64 = 2.0;
const LIGHT_WEIGHT_DAY: f64 = 0.1;
const NIGHT_CRIME_MULTIPLIER: f64 = 1.5;

/// Safety score change that scales an edge's cost by a factor of e.
pub const SAFETY_SCALE: f64 = 20.0;
const MAX_EXPONENT: f64 = 30.0;
/// Lower bound of every safety-weighted edge cost, in metres.
pub const MIN_EDGE_COST: f64 = 0.1;

/// The time a route is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTime {
    Hour(u8),
    Timestamp(DateTime<FixedOffset>),
}

impl QueryTime {
    /// Hour of day in the timestamp's own offset.
    pub fn hour(&self) -> u8 {
        match self {
            QueryTime::Hour(h) => *h,
            QueryTime::Timestamp(ts) => ts.hour() as u8,
        }
    }
}

impl FromStr for QueryTime {
    type Err = RoutingError;

    /// `"0"`..`"23"` or an RFC 3339 timestamp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(hour) = s.parse::<u8>() {
            return if hour < 24 {
                Ok(QueryTime::Hour(hour))
            } else {
                Err(RoutingError::InvalidTime(s.to_string()))
            };
        }
        DateTime::parse_from_rfc3339(s)
            .map(QueryTime::Timestamp)
            .map_err(|_| RoutingError::InvalidTime(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayNight {
    Day,
    Night,
}

/// Fixed daylight window `[day_start_hour, day_end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaylightWindow {
    pub day_start_hour: u8,
    pub day_end_hour: u8,
}

impl Default for DaylightWindow {
    fn default() -> Self {
        Self {
            day_start_hour: 7,
            day_end_hour: 19,
        }
    }
}

impl DaylightWindow {
    pub fn regime(&self, time: QueryTime) -> DayNight {
        let hour = time.hour();
        if hour >= self.day_start_hour && hour < self.day_end_hour {
            DayNight::Day
        } else {
            DayNight::Night
        }
    }

    pub fn profile(&self, time: QueryTime) -> WeightProfile {
        WeightProfile::for_regime(self.regime(time))
    }
}

/// Weights selected by the day/night regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightProfile {
    pub light_weight: f64,
    /// Scales the (negative) baseline crime weight.
    pub crime_multiplier: f64,
}

impl WeightProfile {
    pub const DAY: WeightProfile = WeightProfile {
        light_weight: LIGHT_WEIGHT_DAY,
        crime_multiplier: 1.0,
    };

    pub const NIGHT: WeightProfile = WeightProfile {
        light_weight: LIGHT_WEIGHT_NIGHT,
        crime_multiplier: NIGHT_CRIME_MULTIPLIER,
    };

    pub fn for_regime(regime: DayNight) -> Self {
        match regime {
            DayNight::Day => Self::DAY,
            DayNight::Night => Self::NIGHT,
        }
    }

    /// Weighted safety score; higher is safer.
    pub fn safety_score(&self, scores: &Scores) -> f64 {
        INFRA_WEIGHT * scores.infra
            + self.light_weight * scores.light
            + AMENITY_WEIGHT * scores.amenity
            + CRIME_WEIGHT * self.crime_multiplier * scores.crime
            + DISRUPTION_WEIGHT * scores.disruption
    }

    /// Traversal cost in metres: distance shrunk or stretched exponentially by
    /// the safety score, floored at [`MIN_EDGE_COST`].
    pub fn edge_cost(&self, length_km: f64, scores: &Scores) -> f64 {
        let score = self.safety_score(scores);
        // NaN scores count as maximally unsafe.
        let exponent = if score.is_nan() {
            MAX_EXPONENT
        } else {
            (-score / SAFETY_SCALE).clamp(-MAX_EXPONENT, MAX_EXPONENT)
        };
        let metres = if length_km.is_finite() {
            length_km.max(0.0) * 1000.0
        } else {
            0.0
        };
        (metres * exponent.exp()).max(MIN_EDGE_COST)
    }
}
