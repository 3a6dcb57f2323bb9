//! # Minute-Resolution Interpolation
//!
//! The ocean model writes sea level once an hour, which is far too coarse to
//! say when high water happens. This module fits a cubic spline through the
//! hourly values and evaluates it on a fine grid (one sample per minute by
//! default).
//!
//! ## Spline
//! Not-a-knot end conditions: the third derivative is continuous across the
//! second and the second-to-last knot. With two points the spline degrades to
//! a straight line, with three to the parabola through them. The fit only
//! depends on the input points, so the same input always gives the same
//! output.
//!
//! ## Range
//! The output starts at the first input timestamp and stops at the last step
//! that does not pass the final input timestamp; nothing is extrapolated.

use crate::{Sample, TideError};
use chrono::{DateTime, Duration, Utc};

/// Cubic spline through `(x, y)` knots, stored as knot second derivatives.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a not-a-knot spline. `x` must strictly increase.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, TideError> {
        if x.len() != y.len() {
            return Err(TideError::Shape {
                field: "y",
                detail: format!("{} values for {} knots", y.len(), x.len()),
            });
        }
        if x.len() < 2 {
            return Err(TideError::TooFewSamples {
                needed: 2,
                got: x.len(),
            });
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TideError::Unordered(i + 1));
        }

        let m = second_derivatives(x, y);

        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Evaluate the spline at `xq`; `None` outside the knot range.
    pub fn eval(&self, xq: f64) -> Option<f64> {
        let n = self.x.len() - 1;
        if xq < self.x[0] || xq > self.x[n] {
            return None;
        }

        let i = self.x.partition_point(|&xi| xi <= xq).clamp(1, n) - 1;
        let h = self.x[i + 1] - self.x[i];
        let a = self.x[i + 1] - xq;
        let b = xq - self.x[i];

        Some(
            self.m[i] * a.powi(3) / (6.0 * h)
                + self.m[i + 1] * b.powi(3) / (6.0 * h)
                + (self.y[i] / h - self.m[i] * h / 6.0) * a
                + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * b,
        )
    }
}

/// Solve for the knot second derivatives.
fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len() - 1;
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = (0..n).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    match n {
        1 => return vec![0.0; 2],
        2 => {
            // Parabola: constant curvature
            let curvature = 2.0 * (d[1] - d[0]) / (x[2] - x[0]);
            return vec![curvature; 3];
        }
        _ => {}
    }

    // Unknowns M[1..n-1]; M[0] and M[n] are eliminated with the not-a-knot
    // conditions, which keeps the system tridiagonal.
    let k = n - 1;
    let mut lower = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut upper = vec![0.0; k];
    let mut rhs = vec![0.0; k];

    for j in 0..k {
        let i = j + 1;
        lower[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        upper[j] = h[i];
        rhs[j] = 6.0 * (d[i] - d[i - 1]);
    }

    let (h0, h1) = (h[0], h[1]);
    lower[0] = 0.0;
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    upper[0] = (h1 * h1 - h0 * h0) / h1;

    let (ha, hb) = (h[n - 2], h[n - 1]);
    lower[k - 1] = (ha * ha - hb * hb) / ha;
    diag[k - 1] = (ha + hb) * (2.0 * ha + hb) / ha;
    upper[k - 1] = 0.0;

    let inner = solve_tridiagonal(&lower, &diag, &upper, &rhs);

    let mut m = Vec::with_capacity(n + 1);
    m.push(((h0 + h1) * inner[0] - h0 * inner[1]) / h1);
    m.extend_from_slice(&inner);
    m.push(((ha + hb) * inner[k - 1] - hb * inner[k - 2]) / ha);
    m
}

/// Thomas algorithm. `lower[0]` and `upper[last]` are ignored.
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let k = diag.len();
    let mut c = vec![0.0; k];
    let mut r = vec![0.0; k];

    c[0] = upper[0] / diag[0];
    r[0] = rhs[0] / diag[0];
    for j in 1..k {
        let denom = diag[j] - lower[j] * c[j - 1];
        c[j] = upper[j] / denom;
        r[j] = (rhs[j] - lower[j] * r[j - 1]) / denom;
    }

    let mut out = vec![0.0; k];
    out[k - 1] = r[k - 1];
    for j in (0..k - 1).rev() {
        out[j] = r[j] - c[j] * out[j + 1];
    }
    out
}

fn seconds_since(t0: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - t0).num_milliseconds() as f64 / 1000.0
}

/// Interpolate an hourly series to samples every `step`.
///
/// # Example
/// ```
/// use bay_tides_lib::{interpolate::resample, Sample};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 24, 0, 0, 0).unwrap();
/// let hourly: Vec<Sample> = (0..4)
///     .map(|h| Sample::new(t0 + Duration::hours(h), h as f64))
///     .collect();
///
/// let minutes = resample(&hourly, Duration::seconds(60)).unwrap();
/// assert_eq!(minutes.len(), 3 * 60 + 1);
/// ```
pub fn resample(hourly: &[Sample], step: Duration) -> Result<Vec<Sample>, TideError> {
    // Sample times are resolved to the millisecond
    if step < Duration::milliseconds(1) {
        return Err(TideError::InvalidStep);
    }
    let first = hourly.first().ok_or(TideError::TooFewSamples {
        needed: 2,
        got: 0,
    })?;
    let t0 = first.time;

    let x: Vec<f64> = hourly.iter().map(|s| seconds_since(t0, s.time)).collect();
    let y: Vec<f64> = hourly.iter().map(|s| s.level).collect();
    let spline = CubicSpline::fit(&x, &y)?;

    let last = hourly[hourly.len() - 1].time;
    let count = ((last - t0).num_milliseconds() / step.num_milliseconds()) as usize + 1;

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let time = t0 + step * i as i32;
        if let Some(level) = spline.eval(seconds_since(t0, time)) {
            out.push(Sample { time, level });
        }
    }

    Ok(out)
}
