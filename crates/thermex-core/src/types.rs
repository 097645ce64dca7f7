//! Core data types for readings, weather snapshots and calendar tags

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::conditions::UNKNOWN_CONDITION;

/// Emission time of a settled reading, carrying the local UTC offset
pub type Timestamp = DateTime<FixedOffset>;

/// Point-in-time ambient conditions at the configured coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Human-readable condition label ("Clear", "Light Rain", ...)
    pub condition: String,

    /// Relative humidity (%)
    pub humidity: f64,

    /// Ambient temperature (°C); absent in the fallback snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl WeatherSnapshot {
    /// Substitute used whenever the provider cannot be reached or parsed
    pub fn fallback() -> Self {
        Self {
            condition: UNKNOWN_CONDITION.to_string(),
            humidity: 0.0,
            temperature: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

/// Part of the day, bucketed by local hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl PeriodOfDay {
    /// [0,6) night, [6,12) morning, [12,18) afternoon, everything else evening
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => PeriodOfDay::Night,
            6..=11 => PeriodOfDay::Morning,
            12..=17 => PeriodOfDay::Afternoon,
            _ => PeriodOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodOfDay::Night => "night",
            PeriodOfDay::Morning => "morning",
            PeriodOfDay::Afternoon => "afternoon",
            PeriodOfDay::Evening => "evening",
        }
    }
}

/// Season label as stored alongside each reading.
///
/// The month buckets are fixed: Dec-Feb is `Summer`, Mar-May `Autumn`,
/// Jun-Aug `Winter` and Sep-Nov `Spring`. Downstream consumers of the
/// table rely on these exact labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    /// `month` is 1-based
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Summer,
            3..=5 => Season::Autumn,
            6..=8 => Season::Winter,
            _ => Season::Spring,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
            Season::Spring => "spring",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for PeriodOfDay {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "night" => Ok(PeriodOfDay::Night),
            "morning" => Ok(PeriodOfDay::Morning),
            "afternoon" => Ok(PeriodOfDay::Afternoon),
            "evening" => Ok(PeriodOfDay::Evening),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

impl FromStr for Season {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summer" => Ok(Season::Summer),
            "autumn" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for PeriodOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
