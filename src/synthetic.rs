//! # Synthetic Harmonic Tides
//!
//! Generates hourly sea level series from a sum of harmonic constituents, the
//! same way an equilibrium tide model works. Used by the `--demo` mode of the
//! binary (no model extract needed) and as test input with known answers.
//!
//! ## Model
//! `level(t) = mean + Σ amplitude · cos(2π (t − t0) / period − phase)`
//!
//! - **M2**: principal lunar semi-diurnal, 12.42 h
//! - **S2**: principal solar semi-diurnal, 12.00 h
//!
//! An optional surge term adds a damped short-period oscillation, which is
//! what a storm does to the gauge record and what trips the extremum count.

use crate::Sample;
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::TAU;

/// A single harmonic constituent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constituent {
    /// Amplitude in metres
    pub amplitude: f64,
    /// Period in hours
    pub period_hours: f64,
    /// Phase lag in radians
    pub phase: f64,
}

impl Constituent {
    pub const fn m2(amplitude: f64) -> Self {
        Constituent {
            amplitude,
            period_hours: 12.42,
            phase: 0.0,
        }
    }

    pub const fn s2(amplitude: f64) -> Self {
        Constituent {
            amplitude,
            period_hours: 12.0,
            phase: 0.0,
        }
    }

    fn level_at(&self, hours: f64) -> f64 {
        self.amplitude * (TAU * hours / self.period_hours - self.phase).cos()
    }
}

/// Damped storm-surge oscillation starting at `onset_hours`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surge {
    pub amplitude: f64,
    pub period_hours: f64,
    pub onset_hours: f64,
    /// e-folding time of the envelope in hours
    pub decay_hours: f64,
}

impl Surge {
    fn level_at(&self, hours: f64) -> f64 {
        let since = hours - self.onset_hours;
        if since < 0.0 {
            return 0.0;
        }
        self.amplitude * (-since / self.decay_hours).exp() * (TAU * since / self.period_hours).sin()
    }
}

/// Harmonic tide description.
#[derive(Clone, Debug, PartialEq)]
pub struct TideModel {
    /// Mean level in metres above chart datum
    pub mean: f64,
    pub constituents: Vec<Constituent>,
    pub surge: Option<Surge>,
}

impl Default for TideModel {
    /// Galway Bay-like tide: M2 1.6 m, S2 0.55 m around 3 m mean
    fn default() -> Self {
        TideModel {
            mean: 3.0,
            constituents: vec![Constituent::m2(1.6), Constituent::s2(0.55)],
            surge: None,
        }
    }
}

impl TideModel {
    /// Level at `hours` after the series origin.
    pub fn level_at(&self, hours: f64) -> f64 {
        self.mean
            + self
                .constituents
                .iter()
                .map(|c| c.level_at(hours))
                .sum::<f64>()
            + self.surge.map_or(0.0, |s| s.level_at(hours))
    }

    /// Hourly samples from `start` for `hours` hours (inclusive of both ends).
    pub fn hourly_series(&self, start: DateTime<Utc>, hours: usize) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(hours + 1);
        for h in 0..=hours {
            samples.push(Sample {
                time: start + Duration::hours(h as i64),
                level: self.level_at(h as f64),
            });
        }
        samples
    }
}
