//! # Bay Tides Core Library
//!
//! This library turns hourly ocean-model sea level output into the tide
//! forecast shown for a coastal site: the next low tide, the next high tide,
//! whether the tide is flooding or ebbing, and the level right now.
//!
//! ## Data Flow
//! 1. **Load**: Read the model extract (cached JSON, local file or HTTP) → [`dataset`]
//! 2. **Locate**: Pick the grid cell for each site, skipping cells that dry out → [`grid`], [`quality`]
//! 3. **Interpolate**: Hourly sea level → one sample per minute (cubic spline) → [`interpolate`]
//! 4. **Scan**: Trend reversals from "now" give the next low/high → [`extrema`]
//! 5. **Fall back**: Storm surges produce extra wiggles; use the windowed min/max → [`fallback`]
//! 6. **Report**: Format strings and write one JSON file per site → [`report`]
//!
//! ## Core Types
//! - [`Sample`]: one sea level value at an instant
//! - [`Extremum`]: a local low or high in a series
//! - [`Trend`]: flood (rising) or ebb (falling)
//! - [`TidalState`]: everything the forecast needs to say about the tide
//! - [`TideParams`]: the empirically chosen thresholds, all configurable

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod dataset;
pub mod error;
pub mod extrema;
pub mod fallback;
pub mod forecast;
pub mod grid;
pub mod interpolate;
pub mod quality;
pub mod renderer;
pub mod report;
pub mod synthetic;

pub use error::TideError;

/// A single sea level value in metres at a UTC instant.
///
/// # Example
/// ```
/// use bay_tides_lib::Sample;
/// use chrono::{TimeZone, Utc};
///
/// let s = Sample {
///     time: Utc.with_ymd_and_hms(2025, 1, 24, 6, 0, 0).unwrap(),
///     level: 3.42,
/// };
/// assert_eq!(s.level, 3.42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    /// Sea level in metres
    pub level: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, level: f64) -> Self {
        Sample { time, level }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Low,
    High,
}

/// A local minimum (low tide) or maximum (high tide) of a sea level series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub time: DateTime<Utc>,
    pub level: f64,
    pub kind: ExtremumKind,
}

/// Direction the tide is moving in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Rising tide
    Flood,
    /// Falling tide
    Ebb,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Flood => "flood",
            Trend::Ebb => "ebb",
        }
    }
}

/// Next low and high tide plus the current state of the tide at a site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidalState {
    pub low: Extremum,
    pub high: Extremum,
    pub trend: Trend,
    /// Sea level at "now" in metres
    pub level: f64,
    /// Number of extrema the trend-reversal scan found
    pub extremum_count: usize,
    /// True when the storm-surge fallback picked the low/high
    pub windowed: bool,
}

impl TidalState {
    /// The two upcoming extremes in the order they are shown to users.
    ///
    /// On a flooding tide the high comes first, on an ebbing tide the low.
    pub fn next_extremes(&self) -> (Extremum, Extremum) {
        match self.trend {
            Trend::Flood => (self.high, self.low),
            Trend::Ebb => (self.low, self.high),
        }
    }
}

/// Thresholds used by the extremum finder and the quality check.
///
/// The defaults are the values the forecast has been tuned with; none of them
/// has a derivation beyond "works for the bay", so all are configurable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideParams {
    /// Minimum time between the low and high tide before the scan stops
    pub min_separation: Duration,
    /// Three consecutive values closer than this (metres) mean a dry cell
    pub flat_tolerance: f64,
    /// Extrema later than this after "now" are ignored by the fallback (M2 period)
    pub fallback_window: Duration,
    /// Spacing of the interpolated series
    pub step: Duration,
}

impl Default for TideParams {
    fn default() -> Self {
        TideParams {
            min_separation: Duration::hours(5),
            flat_tolerance: 0.05,
            fallback_window: Duration::hours(12) + Duration::minutes(25),
            step: Duration::seconds(60),
        }
    }
}
