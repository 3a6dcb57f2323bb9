//! # Site Reports
//!
//! Turns a [`SiteForecast`] into the strings shown on the site's web page and
//! writes them as `<site>.json`.
//!
//! ## Formatting Rules
//! - Levels and temperatures: one decimal (`3.4`)
//! - Salinity: whole numbers (`33`)
//! - Times: `Fri 24 14:05` in the configured timezone (summer time applies)
//! - Coordinates: degrees/minutes/seconds (`53º16´8.4"`) plus the decimal value
//! - When the site has dried out, the "right now" values read `LOW TIDE`

use crate::forecast::SiteForecast;
use crate::{Extremum, ExtremumKind, TideError};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Shown instead of current values when the site is dry
pub const DRY_LABEL: &str = "LOW TIDE";

/// One upcoming tide as displayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtremeReport {
    /// `HIGH` or `LOW`
    pub label: String,
    pub value: String,
    pub time: String,
}

/// Display strings for one site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    pub name: String,
    pub issued: String,
    pub lon: String,
    pub lat: String,
    pub lon_dec: String,
    pub lat_dec: String,
    /// Current sea level, or `LOW TIDE`
    pub sea_level: String,
    /// Current surface temperature, or `LOW TIDE`
    pub temperature: String,
    /// Current surface salinity, or `LOW TIDE`
    pub salinity: String,
    pub temperature_min: String,
    pub temperature_min_time: String,
    pub temperature_max: String,
    pub temperature_max_time: String,
    pub salinity_min: String,
    pub salinity_min_time: String,
    pub salinity_max: String,
    pub salinity_max_time: String,
    /// `flood` or `ebb`
    pub status: String,
    pub first_extreme: ExtremeReport,
    pub second_extreme: ExtremeReport,
    pub extremum_count: usize,
    pub windowed: bool,
    /// Minute-resolution sea level for the page's chart
    pub series: Vec<f64>,
    pub series_start: DateTime<Utc>,
    pub series_step_seconds: i64,
    pub now_index: usize,
}

/// Display timezone from its IANA name, e.g. `Europe/Dublin`.
pub fn display_timezone(name: &str) -> Result<Tz, TideError> {
    name.parse::<Tz>()
        .map_err(|_| TideError::UnknownTimezone(name.to_string()))
}

/// Decimal degrees to `DDºMM´SS.S"`; the sign is dropped.
pub fn decdeg_to_dms(dd: f64) -> String {
    let total = dd.abs() * 3600.0;
    let sec = total % 60.0;
    let minutes = (total / 60.0).floor();
    let deg = (minutes / 60.0).floor();
    let min = minutes % 60.0;
    format!("{:02}º{:02}´{:.1}\"", deg as u32, min as u32, sec)
}

/// `Galway-Docks` → `Galway Docks`, `Mutton_s-Island` → `Mutton's Island`
pub fn display_name(name: &str) -> String {
    name.replace('-', " ").replace('_', "'")
}

fn format_time(t: DateTime<Utc>, tz: &Tz) -> String {
    t.with_timezone(tz).format("%a %d %H:%M").to_string()
}

fn one_decimal(v: f64) -> String {
    format!("{:.1}", v)
}

fn whole(v: f64) -> String {
    format!("{:.0}", v.round())
}

fn extreme(e: &Extremum, tz: &Tz) -> ExtremeReport {
    ExtremeReport {
        label: match e.kind {
            ExtremumKind::High => "HIGH",
            ExtremumKind::Low => "LOW",
        }
        .to_string(),
        value: one_decimal(e.level),
        time: format_time(e.time, tz),
    }
}

impl SiteReport {
    pub fn from_forecast(
        forecast: &SiteForecast,
        issued: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let state = &forecast.tide.state;
        let (first, second) = state.next_extremes();
        let now_or_dry = |value: String| {
            if forecast.wet {
                value
            } else {
                DRY_LABEL.to_string()
            }
        };
        let t = &forecast.temperature_range;
        let s = &forecast.salinity_range;
        let series = &forecast.tide.series;
        let step = match series.as_slice() {
            [a, b, ..] => (b.time - a.time).num_seconds(),
            _ => 0,
        };

        SiteReport {
            name: display_name(&forecast.name),
            issued: format_time(issued, tz),
            lon: decdeg_to_dms(forecast.lon),
            lat: decdeg_to_dms(forecast.lat),
            lon_dec: forecast.lon.to_string(),
            lat_dec: forecast.lat.to_string(),
            sea_level: now_or_dry(one_decimal(state.level)),
            temperature: now_or_dry(one_decimal(forecast.temperature)),
            salinity: now_or_dry(whole(forecast.salinity)),
            temperature_min: one_decimal(t.min),
            temperature_min_time: format_time(t.min_time, tz),
            temperature_max: one_decimal(t.max),
            temperature_max_time: format_time(t.max_time, tz),
            salinity_min: whole(s.min),
            salinity_min_time: format_time(s.min_time, tz),
            salinity_max: whole(s.max),
            salinity_max_time: format_time(s.max_time, tz),
            status: state.trend.label().to_string(),
            first_extreme: extreme(&first, tz),
            second_extreme: extreme(&second, tz),
            extremum_count: state.extremum_count,
            windowed: state.windowed,
            series: series.iter().map(|s| s.level).collect(),
            series_start: series.first().map_or(issued, |s| s.time),
            series_step_seconds: step,
            now_index: forecast.tide.now_index,
        }
    }
}

/// Write `<file_stem>.json` into `dir`, creating the directory if needed.
pub fn write_report<P: AsRef<Path>>(
    dir: P,
    file_stem: &str,
    report: &SiteReport,
) -> Result<PathBuf, TideError> {
    fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join(format!("{file_stem}.json"));
    fs::write(&path, serde_json::to_vec_pretty(report)?)?;
    info!("Saved report to {}", path.display());
    Ok(path)
}
