//! # Grid Cell Selection
//!
//! Sites are given as lon/lat; the model works on a regular grid. Each site
//! maps to its nearest grid node, and the node's wet/dry history says what
//! kind of place it is:
//!
//! - **Land**: never wet. The site coordinates are wrong.
//! - **Intertidal**: wet at high water, dry at low water. Sea level there sits
//!   flat while the cell is dry, so low tide times must come from elsewhere.
//! - **Sea**: always wet, sea level usable directly.
//!
//! For intertidal sites the tide series is taken from a substitute cell: the
//! one configured for the site, or else the nearest sea cell whose series
//! passes [`crate::quality::is_usable`].

use crate::config::SiteConfig;
use crate::dataset::ModelExtract;
use crate::{quality, TideError, TideParams};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Land,
    Intertidal,
    Sea,
}

/// Grid node by column (`ix`, longitude) and row (`iy`, latitude).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub ix: usize,
    pub iy: usize,
}

/// Where a site's values come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiteCells {
    /// Nearest node to the site: temperature, salinity and wet/dry status
    pub site: Cell,
    pub kind: CellKind,
    /// Node supplying the sea level used for tide times
    pub tide: Cell,
}

/// Index of the axis value closest to `value`.
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .map(|(i, _)| i)
}

/// Classify a cell from its wet/dry history.
pub fn classify_cell(wet: &[bool]) -> CellKind {
    let wet_steps = wet.iter().filter(|&&w| w).count();
    if wet_steps == 0 {
        CellKind::Land
    } else if wet_steps == wet.len() {
        CellKind::Sea
    } else {
        CellKind::Intertidal
    }
}

pub fn nearest_cell(extract: &ModelExtract, lon: f64, lat: f64) -> Result<Cell, TideError> {
    let ix = nearest_index(&extract.lon, lon).ok_or_else(|| TideError::Shape {
        field: "lon",
        detail: "empty axis".to_string(),
    })?;
    let iy = nearest_index(&extract.lat, lat).ok_or_else(|| TideError::Shape {
        field: "lat",
        detail: "empty axis".to_string(),
    })?;
    Ok(Cell { ix, iy })
}

/// Pick the site cell and the cell whose sea level gives the tide times.
///
/// Fails with [`TideError::Shape`] on an extract whose fields do not match
/// its axes.
pub fn select_cells(
    extract: &ModelExtract,
    site: &SiteConfig,
    params: &TideParams,
) -> Result<SiteCells, TideError> {
    extract.validate()?;
    let cell = nearest_cell(extract, site.lon, site.lat)?;
    let kind = classify_cell(&extract.wet_series(cell.ix, cell.iy));
    debug!("Site {} -> {:?} cell {:?}", site.name, kind, cell);

    let tide = match kind {
        CellKind::Land => return Err(TideError::OnLand(site.name.clone())),
        CellKind::Sea => cell,
        CellKind::Intertidal => match site.substitute {
            Some([ix, iy]) => {
                let (_, ny, nx) = extract.dims();
                if ix >= nx || iy >= ny {
                    return Err(TideError::Shape {
                        field: "substitute",
                        detail: format!("[{ix}, {iy}] outside {nx}x{ny} grid"),
                    });
                }
                if !quality::is_usable(&extract.level_series(ix, iy), params.flat_tolerance) {
                    warn!("Substitute cell [{ix}, {iy}] for {} looks dry", site.name);
                }
                Cell { ix, iy }
            }
            None => nearest_usable_sea_cell(extract, cell, params.flat_tolerance)
                .ok_or_else(|| TideError::NoUsableCell(site.name.clone()))?,
        },
    };

    Ok(SiteCells {
        site: cell,
        kind,
        tide,
    })
}

/// Search rings of growing radius around `origin` for a sea cell with a
/// usable sea level series; within a ring the closest cell wins.
fn nearest_usable_sea_cell(extract: &ModelExtract, origin: Cell, tolerance: f64) -> Option<Cell> {
    let (_, ny, nx) = extract.dims();
    let max_radius = nx.max(ny);

    for radius in 1..=max_radius {
        let mut best: Option<(usize, Cell)> = None;

        for cell in ring(origin, radius, nx, ny) {
            if classify_cell(&extract.wet_series(cell.ix, cell.iy)) != CellKind::Sea {
                continue;
            }
            if !quality::is_usable(&extract.level_series(cell.ix, cell.iy), tolerance) {
                continue;
            }
            let dx = cell.ix.abs_diff(origin.ix);
            let dy = cell.iy.abs_diff(origin.iy);
            let dist2 = dx * dx + dy * dy;
            if best.map_or(true, |(d, _)| dist2 < d) {
                best = Some((dist2, cell));
            }
        }

        if let Some((_, cell)) = best {
            return Some(cell);
        }
    }
    None
}

/// Cells at Chebyshev distance `radius` from `origin`, clipped to the grid,
/// row by row.
fn ring(origin: Cell, radius: usize, nx: usize, ny: usize) -> impl Iterator<Item = Cell> {
    let r = radius as i64;
    let (ox, oy) = (origin.ix as i64, origin.iy as i64);
    (oy - r..=oy + r)
        .flat_map(move |y| (ox - r..=ox + r).map(move |x| (x, y)))
        .filter(move |&(x, y)| (x - ox).abs() == r || (y - oy).abs() == r)
        .filter(move |&(x, y)| x >= 0 && y >= 0 && (x as usize) < nx && (y as usize) < ny)
        .map(|(x, y)| Cell {
            ix: x as usize,
            iy: y as usize,
        })
}
