//! # Ocean-Model Extract Loading and Caching
//!
//! The forecasts are driven by an hourly ocean-model run over the bay. This
//! module reads an extract of that run (surface fields on the model's regular
//! lon/lat grid) and keeps a local copy so repeated runs do not hit the
//! server.
//!
//! ## Extract Format
//! A JSON document with two axes, a time list and four `[t][y][x]` fields:
//! ```json
//! {
//!   "lon": [-9.30, -9.29, ...],
//!   "lat": [53.05, 53.06, ...],
//!   "time": ["2025-01-24T00:00:00Z", "2025-01-24T01:00:00Z", ...],
//!   "zeta":   [[[...]]],
//!   "wetdry": [[[...]]],
//!   "temp":   [[[...]]],
//!   "salt":   [[[...]]]
//! }
//! ```
//! - **zeta**: sea level in metres relative to the model datum
//! - **wetdry**: 1 where the cell is wet, 0 where it has dried out
//! - **temp**, **salt**: surface temperature (°C) and salinity (PSU)
//!
//! ## Caching Strategy
//! - **Location**: configurable, `/tmp/bay_tides_cache.json` by default
//! - **TTL**: configurable, 30 minutes by default
//! - **Validation**: file modification time checked before loading, and the
//!   cached copy is only used for the source it was read from
//! - **Write failures**: ignored, the run continues with fresh data

use crate::TideError;
use chrono::{DateTime, Duration, DurationRound, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, time::SystemTime};

/// Surface fields of one model run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelExtract {
    /// Longitudes of the grid columns (x axis)
    pub lon: Vec<f64>,
    /// Latitudes of the grid rows (y axis)
    pub lat: Vec<f64>,
    /// Hourly output times
    pub time: Vec<DateTime<Utc>>,
    /// Sea level `[t][y][x]` in metres
    pub zeta: Vec<Vec<Vec<f64>>>,
    /// Wet (1) / dry (0) mask `[t][y][x]`
    pub wetdry: Vec<Vec<Vec<u8>>>,
    /// Surface temperature `[t][y][x]`
    pub temp: Vec<Vec<Vec<f64>>>,
    /// Surface salinity `[t][y][x]`
    pub salt: Vec<Vec<Vec<f64>>>,
}

impl ModelExtract {
    /// Parse and validate an extract; times are truncated to the hour.
    pub fn from_json(data: &[u8]) -> Result<Self, TideError> {
        let mut extract: ModelExtract = serde_json::from_slice(data)?;
        for t in extract.time.iter_mut() {
            // Model output is hourly; drop any sub-hour jitter
            if let Ok(hour) = t.duration_trunc(Duration::hours(1)) {
                *t = hour;
            }
        }
        extract.validate()?;
        Ok(extract)
    }

    /// Check field shapes against the axes and the time ordering.
    pub fn validate(&self) -> Result<(), TideError> {
        if let Some(i) = self.time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TideError::Unordered(i + 1));
        }
        check_shape("zeta", &self.zeta, self.dims())?;
        check_shape("wetdry", &self.wetdry, self.dims())?;
        check_shape("temp", &self.temp, self.dims())?;
        check_shape("salt", &self.salt, self.dims())?;
        Ok(())
    }

    /// (time steps, rows, columns)
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.time.len(), self.lat.len(), self.lon.len())
    }

    /// Add a constant to every sea level value (datum shift).
    pub fn shift_levels(&mut self, offset: f64) {
        self.zeta
            .iter_mut()
            .flatten()
            .flatten()
            .for_each(|z| *z += offset);
    }

    /// Index of the output time equal to `now` truncated to the hour.
    pub fn hour_index(&self, now: DateTime<Utc>) -> Result<usize, TideError> {
        let hour = now
            .duration_trunc(Duration::hours(1))
            .map_err(|_| TideError::NowOutOfRange(now))?;
        self.time
            .binary_search(&hour)
            .map_err(|_| TideError::NowOutOfRange(hour))
    }

    pub fn level_series(&self, ix: usize, iy: usize) -> Vec<f64> {
        column(&self.zeta, ix, iy)
    }

    pub fn wet_series(&self, ix: usize, iy: usize) -> Vec<bool> {
        column(&self.wetdry, ix, iy)
            .into_iter()
            .map(|w| w != 0)
            .collect()
    }

    pub fn temp_series(&self, ix: usize, iy: usize) -> Vec<f64> {
        column(&self.temp, ix, iy)
    }

    pub fn salt_series(&self, ix: usize, iy: usize) -> Vec<f64> {
        column(&self.salt, ix, iy)
    }
}

fn column<T: Copy>(field: &[Vec<Vec<T>>], ix: usize, iy: usize) -> Vec<T> {
    field.iter().map(|grid| grid[iy][ix]).collect()
}

fn check_shape<T>(
    field: &'static str,
    values: &[Vec<Vec<T>>],
    (nt, ny, nx): (usize, usize, usize),
) -> Result<(), TideError> {
    let mismatch = |detail: String| TideError::Shape { field, detail };

    if values.len() != nt {
        return Err(mismatch(format!("{} time steps, expected {}", values.len(), nt)));
    }
    for (t, grid) in values.iter().enumerate() {
        if grid.len() != ny {
            return Err(mismatch(format!("step {t}: {} rows, expected {ny}", grid.len())));
        }
        if let Some((y, row)) = grid.iter().enumerate().find(|(_, row)| row.len() != nx) {
            return Err(mismatch(format!(
                "step {t} row {y}: {} columns, expected {nx}",
                row.len()
            )));
        }
    }
    Ok(())
}

/// Cache file contents: the extract tagged with the source it came from.
#[derive(Serialize)]
struct CacheEntry<'a> {
    source: &'a str,
    extract: &'a ModelExtract,
}

#[derive(Deserialize)]
struct CachedExtract {
    source: String,
    extract: ModelExtract,
}

/// Where to read the extract from and how long a cached copy stays valid.
#[derive(Clone, Debug)]
pub struct Source<'a> {
    pub location: &'a str,
    pub cache_path: &'a str,
    pub ttl_secs: u64,
}

/// Fetch the model extract from the cache or its source.
///
/// Cache-first: a cached copy younger than the TTL is used as-is. Otherwise
/// the source is read (HTTP GET for `http://`/`https://` locations, a file
/// read for anything else) and the cache rewritten.
///
/// # Example
/// ```no_run
/// use bay_tides_lib::dataset::{fetch, Source};
///
/// # async fn run() -> Result<(), bay_tides_lib::TideError> {
/// let extract = fetch(&Source {
///     location: "https://example.org/galway/extract.json",
///     cache_path: "/tmp/bay_tides_cache.json",
///     ttl_secs: 1800,
/// })
/// .await?;
/// println!("{} hourly steps", extract.time.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(source: &Source<'_>) -> Result<ModelExtract, TideError> {
    match load_cache(source.cache_path, source.location, source.ttl_secs) {
        Ok(extract) => {
            debug!("Using cached model extract {}", source.cache_path);
            return Ok(extract);
        }
        Err(e) => debug!("Cache miss: {}", e),
    }

    let data = read_source(source.location).await?;
    let extract = ModelExtract::from_json(&data)?;
    info!(
        "Loaded model extract: {} steps on a {}x{} grid",
        extract.time.len(),
        extract.lon.len(),
        extract.lat.len()
    );

    // Save for future runs (ignore cache write failures)
    let entry = CacheEntry {
        source: source.location,
        extract: &extract,
    };
    if let Ok(json) = serde_json::to_vec(&entry) {
        let _ = fs::write(source.cache_path, json);
    }

    Ok(extract)
}

async fn read_source(location: &str) -> Result<Vec<u8>, TideError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        info!("Downloading model extract from {}", location);
        let response = reqwest::get(location).await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    } else {
        info!("Reading model extract from {}", location);
        Ok(fs::read(location)?)
    }
}

/// Load a cached extract if the file is younger than `ttl_secs` and was
/// read from `location`.
fn load_cache<P: AsRef<Path>>(
    path: P,
    location: &str,
    ttl_secs: u64,
) -> Result<ModelExtract, TideError> {
    let meta = fs::metadata(&path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale").into());
    }

    let cached: CachedExtract = serde_json::from_slice(&fs::read(path)?)?;
    if cached.source != location {
        return Err(io::Error::other(format!("cache holds {}", cached.source)).into());
    }
    cached.extract.validate()?;
    Ok(cached.extract)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    /// 2x2 grid, `nt` hourly steps, column 0 sea and column 1 land.
    pub(crate) fn small_extract(nt: usize) -> ModelExtract {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 24, 0, 0, 0).unwrap();
        ModelExtract {
            lon: vec![-9.1, -9.0],
            lat: vec![53.2, 53.3],
            time: (0..nt).map(|h| t0 + Duration::hours(h as i64)).collect(),
            zeta: (0..nt)
                .map(|h| vec![vec![h as f64 * 0.1, 0.0]; 2])
                .collect(),
            wetdry: vec![vec![vec![1, 0]; 2]; nt],
            temp: vec![vec![vec![9.5, 9.0]; 2]; nt],
            salt: vec![vec![vec![33.2, 0.0]; 2]; nt],
        }
    }

    #[test]
    fn parses_and_truncates_times() {
        let mut extract = small_extract(3);
        extract.time[1] += Duration::minutes(7);
        let json = serde_json::to_vec(&extract).unwrap();

        let parsed = ModelExtract::from_json(&json).unwrap();
        assert_eq!(parsed.time[1], small_extract(3).time[1]);
        assert_eq!(parsed.dims(), (3, 2, 2));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let mut extract = small_extract(3);
        extract.temp[2][1].pop();
        let err = extract.validate().unwrap_err();
        assert!(matches!(err, TideError::Shape { field: "temp", .. }));

        let mut extract = small_extract(3);
        extract.salt.pop();
        assert!(matches!(
            extract.validate(),
            Err(TideError::Shape { field: "salt", .. })
        ));
    }

    #[test]
    fn rejects_unordered_times() {
        let mut extract = small_extract(3);
        extract.time.swap(0, 1);
        assert!(matches!(extract.validate(), Err(TideError::Unordered(1))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ModelExtract::from_json(b"{\"lon\": [1.0]"),
            Err(TideError::Json(_))
        ));
    }

    #[test]
    fn extracts_cell_series() {
        let mut extract = small_extract(4);
        extract.shift_levels(3.0);
        let levels = extract.level_series(0, 1);
        assert_eq!(levels.len(), 4);
        assert!((levels[2] - 3.2).abs() < 1e-12);
        assert_eq!(extract.wet_series(1, 0), vec![false; 4]);
        assert_eq!(extract.temp_series(0, 0), vec![9.5; 4]);
        assert_eq!(extract.salt_series(0, 0), vec![33.2; 4]);
    }

    #[test]
    fn finds_current_hour() {
        let extract = small_extract(6);
        let now = extract.time[0] + Duration::minutes(3 * 60 + 42);
        assert_eq!(extract.hour_index(now).unwrap(), 3);
        assert!(matches!(
            extract.hour_index(now + Duration::hours(10)),
            Err(TideError::NowOutOfRange(_))
        ));
    }

    fn write_cache(path: &Path, location: &str, extract: &ModelExtract) {
        let entry = CacheEntry {
            source: location,
            extract,
        };
        fs::write(path, serde_json::to_vec(&entry).unwrap()).unwrap();
    }

    #[test]
    fn fresh_cache_is_used() {
        let cache = NamedTempFile::new().unwrap();
        write_cache(cache.path(), "extract.json", &small_extract(2));

        let loaded = load_cache(cache.path(), "extract.json", 1800).unwrap();
        assert_eq!(loaded.time.len(), 2);
    }

    #[test]
    fn stale_cache_is_rejected() {
        let cache = NamedTempFile::new().unwrap();
        write_cache(cache.path(), "extract.json", &small_extract(2));
        std::thread::sleep(std::time::Duration::from_millis(1100));

        assert!(load_cache(cache.path(), "extract.json", 0).is_err());
    }

    #[test]
    fn cache_from_other_source_is_rejected() {
        let cache = NamedTempFile::new().unwrap();
        write_cache(cache.path(), "old-run.json", &small_extract(2));

        assert!(load_cache(cache.path(), "new-run.json", 1800).is_err());
    }

    #[test]
    fn malformed_cached_extract_is_rejected() {
        let cache = NamedTempFile::new().unwrap();
        let mut extract = small_extract(3);
        extract.zeta[1].pop();
        write_cache(cache.path(), "extract.json", &extract);

        assert!(matches!(
            load_cache(cache.path(), "extract.json", 1800),
            Err(TideError::Shape { field: "zeta", .. })
        ));
    }

    #[tokio::test]
    async fn fetch_reads_file_and_fills_cache() {
        let source_file = NamedTempFile::new().unwrap();
        fs::write(source_file.path(), serde_json::to_vec(&small_extract(5)).unwrap()).unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache_path = cache_dir.path().join("cache.json");

        let source = Source {
            location: source_file.path().to_str().unwrap(),
            cache_path: cache_path.to_str().unwrap(),
            ttl_secs: 1800,
        };
        let extract = fetch(&source).await.unwrap();

        assert_eq!(extract.time.len(), 5);
        assert!(cache_path.exists());
    }

    #[tokio::test]
    async fn changed_source_bypasses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, serde_json::to_vec(&small_extract(3)).unwrap()).unwrap();
        fs::write(&second, serde_json::to_vec(&small_extract(6)).unwrap()).unwrap();
        let cache_path = dir.path().join("cache.json");

        let cache = cache_path.to_str().unwrap();
        let a = fetch(&Source {
            location: first.to_str().unwrap(),
            cache_path: cache,
            ttl_secs: 1800,
        })
        .await
        .unwrap();
        let b = fetch(&Source {
            location: second.to_str().unwrap(),
            cache_path: cache,
            ttl_secs: 1800,
        })
        .await
        .unwrap();

        assert_eq!(a.time.len(), 3);
        assert_eq!(b.time.len(), 6);
    }
}
