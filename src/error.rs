//! Error type shared by the library modules.

use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error;

/// Errors that can occur while loading model output and computing forecasts.
///
/// A storm-surge series with more than two extrema is *not* an error: the
/// forecast switches to the windowed fallback instead.
#[derive(Error, Debug)]
pub enum TideError {
    /// Not enough samples to interpolate or to establish a trend
    #[error("need at least {needed} samples, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    /// Interpolation step shorter than one millisecond
    #[error("interpolation step must be at least 1 ms")]
    InvalidStep,

    /// Timestamps must strictly increase
    #[error("timestamps not strictly increasing at index {0}")]
    Unordered(usize),

    /// "Now" does not fall on a sample of the series
    #[error("no sample at {0}")]
    NowOutOfRange(DateTime<Utc>),

    /// The series never reached a low tide
    #[error("no low tide found")]
    NoLowTide,

    /// The series never reached a high tide
    #[error("no high tide found")]
    NoHighTide,

    /// A model field does not match the grid/time axes
    #[error("field `{field}` has shape mismatch: {detail}")]
    Shape { field: &'static str, detail: String },

    /// The nearest grid cell to a site is never wet
    #[error("site `{0}` is on land")]
    OnLand(String),

    /// No sea cell with a usable tidal signal near an intertidal site
    #[error("no usable sea level cell near site `{0}`")]
    NoUsableCell(String),

    /// Display timezone is not an IANA name known to the tz database
    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),

    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Model extract or cache file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File operations failed (permissions, disk space, missing file)
    #[error("IO: {0}")]
    Io(#[from] io::Error),
}
