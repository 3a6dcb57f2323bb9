//! # Trend-Reversal Scanner
//!
//! Walks a sea level series forward from "now" and records every point where
//! the tide turns. A turn from falling to rising is a low tide, from rising
//! to falling a high tide.
//!
//! On a well-behaved tidal signal the scan stops after exactly two extrema:
//! the next low and the next high. Short-period wiggles can produce a low and
//! a high only minutes apart, so the scan keeps going until the two are at
//! least [`TideParams::min_separation`] apart. Storm surges break that
//! assumption and leave more than two extrema in the outcome; callers detect
//! this with [`ScanOutcome::is_regular`] and switch to
//! [`crate::fallback::windowed_extrema`].

use crate::{Extremum, ExtremumKind, Sample, TideError, TideParams};
use chrono::Duration;

/// Result of a trend-reversal scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanOutcome {
    /// Most recent low tide seen before the scan stopped
    pub low: Option<Extremum>,
    /// Most recent high tide seen before the scan stopped
    pub high: Option<Extremum>,
    /// Every extremum found, in time order
    pub extrema: Vec<Extremum>,
}

impl ScanOutcome {
    pub fn count(&self) -> usize {
        self.extrema.len()
    }

    /// Exactly one low and one high: the normal semi-diurnal case.
    pub fn is_regular(&self) -> bool {
        self.count() == 2
    }
}

/// Scan `series` (starting at "now") for the next low and high tide.
///
/// Fails if the series has fewer than three samples. A series with no turns
/// at all is not an error; it comes back with an empty extrema list.
pub fn scan(series: &[Sample], params: &TideParams) -> Result<ScanOutcome, TideError> {
    if series.len() < 3 {
        return Err(TideError::TooFewSamples {
            needed: 3,
            got: series.len(),
        });
    }

    let mut outcome = ScanOutcome {
        low: None,
        high: None,
        extrema: Vec::new(),
    };

    // Running trend; zero differences (plateaus) leave it unchanged.
    let mut trend = 0.0_f64;

    for (i, pair) in series.windows(2).enumerate() {
        let change = pair[1].level - pair[0].level;
        if change == 0.0 {
            continue;
        }

        if change * trend < 0.0 {
            let turn = &series[i];
            let kind = if trend < 0.0 {
                ExtremumKind::Low
            } else {
                ExtremumKind::High
            };
            let extremum = Extremum {
                time: turn.time,
                level: turn.level,
                kind,
            };
            outcome.extrema.push(extremum);
            match kind {
                ExtremumKind::Low => outcome.low = Some(extremum),
                ExtremumKind::High => outcome.high = Some(extremum),
            }

            if let (Some(low), Some(high)) = (outcome.low, outcome.high) {
                if separation(&low, &high) >= params.min_separation {
                    break;
                }
            }
        }

        trend = change;
    }

    Ok(outcome)
}

fn separation(a: &Extremum, b: &Extremum) -> Duration {
    (a.time - b.time).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::f64::consts::TAU;

    const M2_MINUTES: f64 = 745.2;

    fn minute_series(minutes: i64, f: impl Fn(f64) -> f64) -> Vec<Sample> {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 24, 0, 0, 0).unwrap();
        (0..=minutes)
            .map(|m| Sample::new(t0 + Duration::minutes(m), f(m as f64)))
            .collect()
    }

    #[test]
    fn single_period_gives_one_low_and_one_high() {
        // Starts rising: high near 186 min, low near 559 min
        let series = minute_series(900, |m| 2.0 * (TAU * m / M2_MINUTES).sin());
        let outcome = scan(&series, &TideParams::default()).unwrap();

        assert_eq!(outcome.count(), 2);
        assert!(outcome.is_regular());

        let high = outcome.high.unwrap();
        let low = outcome.low.unwrap();
        assert_eq!(high.kind, ExtremumKind::High);
        assert_eq!(low.kind, ExtremumKind::Low);
        assert!(high.level > 1.99);
        assert!(low.level < -1.99);
        assert!((low.time - high.time) >= Duration::hours(5));
        assert_eq!(outcome.extrema, vec![high, low]);
    }

    #[test]
    fn stops_after_separated_pair() {
        // Three full periods, but only the first low/high pair is reported
        let series = minute_series(3 * 745, |m| (TAU * m / M2_MINUTES).cos());
        let outcome = scan(&series, &TideParams::default()).unwrap();

        assert_eq!(outcome.count(), 2);
        assert_eq!(outcome.extrema[0].kind, ExtremumKind::Low);
        assert_eq!(outcome.extrema[1].kind, ExtremumKind::High);
    }

    #[test]
    fn storm_wiggles_raise_the_count() {
        // Fast surge oscillation on top of the tide
        let series = minute_series(900, |m| {
            (TAU * m / M2_MINUTES).sin() + 0.6 * (TAU * m / 120.0).sin()
        });
        let outcome = scan(&series, &TideParams::default()).unwrap();

        assert!(outcome.count() > 2, "count was {}", outcome.count());
        assert!(!outcome.is_regular());
    }

    #[test]
    fn close_pair_does_not_stop_the_scan() {
        let params = TideParams {
            min_separation: Duration::minutes(30),
            ..TideParams::default()
        };
        // Low at 10, high at 20, then a long fall to a low at 400
        let series = minute_series(500, |m| {
            if m <= 10.0 {
                -m
            } else if m <= 20.0 {
                m - 20.0
            } else if m <= 400.0 {
                -(m - 20.0)
            } else {
                m - 780.0
            }
        });
        let outcome = scan(&series, &params).unwrap();

        assert_eq!(outcome.count(), 3);
        assert_eq!(outcome.low.unwrap().time, series[400].time);
        assert_eq!(outcome.high.unwrap().time, series[20].time);
    }

    #[test]
    fn plateau_keeps_running_trend() {
        let levels = [1.0, 1.0, 1.2, 1.4, 1.4, 1.4, 1.1, 0.9, 1.3];
        let series = minute_series(levels.len() as i64 - 1, |m| levels[m as usize]);
        let params = TideParams {
            min_separation: Duration::zero(),
            ..TideParams::default()
        };
        let outcome = scan(&series, &params).unwrap();

        assert_eq!(outcome.count(), 2);
        let high = outcome.high.unwrap();
        assert_eq!(high.level, 1.4);
        assert_eq!(high.time, series[5].time);
        assert_eq!(outcome.low.unwrap().level, 0.9);
    }

    #[test]
    fn flat_series_has_no_extrema() {
        let series = minute_series(10, |_| 2.0);
        let outcome = scan(&series, &TideParams::default()).unwrap();
        assert_eq!(outcome.count(), 0);
        assert!(outcome.low.is_none() && outcome.high.is_none());
    }

    #[test]
    fn too_short_series_fails() {
        let series = minute_series(1, |m| m);
        assert!(matches!(
            scan(&series, &TideParams::default()),
            Err(TideError::TooFewSamples { needed: 3, got: 2 })
        ));
    }
}
