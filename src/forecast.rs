//! # Forecast Assembly
//!
//! Glues the pieces together for one site:
//!
//! 1. Find the current model hour and the grid cells for the site
//! 2. Summarise the temperature and salinity forecast from now on
//! 3. Interpolate the tide cell's sea level to minute resolution
//! 4. Scan for the next low and high tide from "now", falling back to the
//!    windowed min/max when the scan finds anything but one low and one high
//! 5. Read the trend from the next sample after "now"

use crate::config::SiteConfig;
use crate::dataset::ModelExtract;
use crate::grid::{self, SiteCells};
use crate::{extrema, fallback, interpolate, Sample, TidalState, TideError, TideParams, Trend};
use chrono::{DateTime, Duration, DurationRound, Utc};
use log::{info, warn};
use serde::Serialize;

/// Minute-resolution tide series with the derived state.
#[derive(Clone, Debug)]
pub struct TideOutlook {
    pub state: TidalState,
    /// Interpolated series over the whole model run
    pub series: Vec<Sample>,
    /// Index of "now" in `series`
    pub now_index: usize,
}

/// Low/high of a forecast field with their times.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FieldSummary {
    pub min: f64,
    pub min_time: DateTime<Utc>,
    pub max: f64,
    pub max_time: DateTime<Utc>,
}

impl FieldSummary {
    /// Summarise `values` (aligned with `times`); the first occurrence wins on ties.
    pub fn from_series(times: &[DateTime<Utc>], values: &[f64]) -> Option<Self> {
        let mut pairs = times.iter().copied().zip(values.iter().copied());
        let (t0, v0) = pairs.next()?;
        let mut summary = FieldSummary {
            min: v0,
            min_time: t0,
            max: v0,
            max_time: t0,
        };
        for (t, v) in pairs {
            if v < summary.min {
                summary.min = v;
                summary.min_time = t;
            }
            if v > summary.max {
                summary.max = v;
                summary.max_time = t;
            }
        }
        Some(summary)
    }
}

/// Tidal state from a series whose first sample is "now".
///
/// Needs at least three samples. When the scan does not come back with
/// exactly one low and one high, the low/high are taken from the extrema
/// inside [`TideParams::fallback_window`] instead.
pub fn tidal_state(from_now: &[Sample], params: &TideParams) -> Result<TidalState, TideError> {
    let outcome = extrema::scan(from_now, params)?;
    let now = from_now[0].time;

    let (low, high, windowed) = if outcome.is_regular() {
        (outcome.low, outcome.high, false)
    } else {
        warn!(
            "Found {} extrema after {} (storm surge?), using windowed min/max",
            outcome.count(),
            now
        );
        let picked = fallback::windowed_extrema(now, &outcome.extrema, params.fallback_window);
        (picked.low, picked.high, true)
    };

    let trend = if from_now[1].level - from_now[0].level > 0.0 {
        Trend::Flood
    } else {
        Trend::Ebb
    };

    Ok(TidalState {
        low: low.ok_or(TideError::NoLowTide)?,
        high: high.ok_or(TideError::NoHighTide)?,
        trend,
        level: from_now[0].level,
        extremum_count: outcome.count(),
        windowed,
    })
}

/// Interpolate an hourly series and derive the tidal state at `now`.
///
/// `now` is truncated to the minute; the first interpolated sample at or
/// after it is taken as "now".
pub fn tidal_outlook(
    hourly: &[Sample],
    now: DateTime<Utc>,
    params: &TideParams,
) -> Result<TideOutlook, TideError> {
    info!("Interpolating sea level to {}s resolution", params.step.num_seconds());
    let series = interpolate::resample(hourly, params.step)?;

    let now = now
        .duration_trunc(Duration::minutes(1))
        .map_err(|_| TideError::NowOutOfRange(now))?;
    let first = series.first().map(|s| s.time);
    let last = series.last().map(|s| s.time);
    if first.map_or(true, |t| now < t) || last.map_or(true, |t| now > t) {
        return Err(TideError::NowOutOfRange(now));
    }
    let now_index = series.partition_point(|s| s.time < now);

    info!("Finding next high and low tides");
    let state = tidal_state(&series[now_index..], params)?;

    Ok(TideOutlook {
        state,
        series,
        now_index,
    })
}

/// Everything the report needs for one site.
#[derive(Clone, Debug)]
pub struct SiteForecast {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub cells: SiteCells,
    /// Whether the site cell is wet at the current model hour
    pub wet: bool,
    pub temperature: f64,
    pub salinity: f64,
    pub temperature_range: FieldSummary,
    pub salinity_range: FieldSummary,
    pub tide: TideOutlook,
}

/// Build the forecast for `site` from a model extract.
pub fn site_forecast(
    extract: &ModelExtract,
    site: &SiteConfig,
    now: DateTime<Utc>,
    params: &TideParams,
) -> Result<SiteForecast, TideError> {
    let hour = extract.hour_index(now)?;
    let cells = grid::select_cells(extract, site, params)?;
    let (ix, iy) = (cells.site.ix, cells.site.iy);

    let temps = extract.temp_series(ix, iy);
    let salts = extract.salt_series(ix, iy);
    let future = &extract.time[hour..];
    let missing = |field| TideError::Shape {
        field,
        detail: "no forecast steps".to_string(),
    };
    let temperature_range =
        FieldSummary::from_series(future, &temps[hour..]).ok_or_else(|| missing("temp"))?;
    let salinity_range =
        FieldSummary::from_series(future, &salts[hour..]).ok_or_else(|| missing("salt"))?;

    let hourly: Vec<Sample> = extract
        .time
        .iter()
        .zip(extract.level_series(cells.tide.ix, cells.tide.iy))
        .map(|(&time, level)| Sample { time, level })
        .collect();
    let tide = tidal_outlook(&hourly, now, params)?;

    Ok(SiteForecast {
        name: site.name.clone(),
        lon: site.lon,
        lat: site.lat,
        cells,
        wet: extract.wet_series(ix, iy)[hour],
        temperature: temps[hour],
        salinity: salts[hour],
        temperature_range,
        salinity_range,
        tide,
    })
}
