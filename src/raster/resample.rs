//! Raster reprojection and resampling.
//!
//! Output cells are filled by inverse mapping: each output cell centre is
//! transformed back into the source CRS and sampled there. The resampling
//! method is always chosen by the caller.
//!
//! ```ignore
//! let utm = Reprojector::new(&sst, ResamplingMethod::Bilinear)
//!     .to_crs(Crs::from_epsg(32610)?)
//!     .resolution(1000.0, 1000.0)
//!     .run()?;
//! ```

use tracing::debug;

use super::cells;
use super::grid::{GridGeometry, RasterGrid};
use crate::crs::{describe, Crs, CrsTransform, Extent};
use crate::error::CrsError;

/// Points sampled along each extent edge when transforming bounds.
const EDGE_SAMPLES: usize = 20;

/// How a source value is picked for an output cell centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingMethod {
    /// Value of the source cell containing the point; right for categories
    NearestNeighbor,
    /// Distance-weighted mean of the four nearest cell centres
    Bilinear,
}

/// Builder for reprojecting a grid into another CRS or resolution.
#[derive(Debug, Clone)]
pub struct Reprojector<'a> {
    source: &'a RasterGrid,
    method: ResamplingMethod,
    target_crs: Option<Crs>,
    resolution: Option<(f64, f64)>,
}

impl<'a> Reprojector<'a> {
    pub fn new(source: &'a RasterGrid, method: ResamplingMethod) -> Self {
        Self {
            source,
            method,
            target_crs: None,
            resolution: None,
        }
    }

    /// Target CRS. Defaults to the source CRS.
    pub fn to_crs(mut self, crs: Crs) -> Self {
        self.target_crs = Some(crs);
        self
    }

    /// Output cell size in target CRS units. Defaults to keeping the
    /// source's column and row counts.
    pub fn resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution = Some((x, y));
        self
    }

    pub fn run(self) -> Result<RasterGrid, CrsError> {
        let source_crs = self
            .source
            .crs()
            .ok_or_else(|| CrsError::Unset("source raster".to_string()))?;
        let target_crs = self.target_crs.unwrap_or(source_crs);
        let forward = CrsTransform::new(source_crs, target_crs)?;

        if forward.is_identity() && self.resolution.is_none() {
            return Ok(self.source.clone());
        }

        let source_extent = self.source.extent();
        let extent = source_extent
            .transform(&forward, EDGE_SAMPLES)
            .ok_or_else(|| {
                let (x, y) = source_extent.center();
                CrsError::OutOfDomain {
                    x,
                    y,
                    crs: describe(Some(target_crs)),
                }
            })?;

        let (cols, rows) = match self.resolution {
            Some((rx, ry)) => {
                if !(rx > 0.0 && ry > 0.0) {
                    return Err(CrsError::Unsupported(format!(
                        "resolution must be positive, got ({rx}, {ry})"
                    )));
                }
                (
                    (extent.width() / rx).ceil().max(1.0) as usize,
                    (extent.height() / ry).ceil().max(1.0) as usize,
                )
            }
            None => self.source.dimensions(),
        };
        let geometry = output_geometry(&extent, self.resolution, cols, rows, target_crs)?;

        debug!(
            from = %source_crs,
            to = %target_crs,
            cols = geometry.cols,
            rows = geometry.rows,
            method = ?self.method,
            "reprojecting raster"
        );

        resample_onto(self.source, source_crs, geometry, self.method)
    }
}

/// Output grid over `extent`; cell size is `resolution` or the extent split
/// into `cols` x `rows`.
fn output_geometry(
    extent: &Extent,
    resolution: Option<(f64, f64)>,
    cols: usize,
    rows: usize,
    crs: Crs,
) -> Result<GridGeometry, CrsError> {
    let (cell_width, cell_height) =
        resolution.unwrap_or((extent.width() / cols as f64, extent.height() / rows as f64));
    GridGeometry::new(extent.min_x, extent.max_y, cell_width, cell_height, cols, rows, Some(crs))
        .map_err(|e| {
            debug!(error = %e, "degenerate reprojected extent");
            let (x, y) = extent.center();
            CrsError::OutOfDomain {
                x,
                y,
                crs: describe(Some(crs)),
            }
        })
}

/// Resample `grid` onto exactly the geometry of `template`.
///
/// The result is aligned with the template, so it can be combined with it.
pub fn project_to_match(
    grid: &RasterGrid,
    template: &RasterGrid,
    method: ResamplingMethod,
) -> Result<RasterGrid, CrsError> {
    let source_crs = grid
        .crs()
        .ok_or_else(|| CrsError::Unset("source raster".to_string()))?;
    if template.crs().is_none() {
        return Err(CrsError::Unset("template raster".to_string()));
    }
    if grid.check_alignment(template).is_ok() {
        return Ok(grid.clone());
    }
    debug!(
        from = %source_crs,
        to = %describe(template.crs()),
        "resampling raster onto template grid"
    );
    resample_onto(grid, source_crs, *template.geometry(), method)
}

fn resample_onto(
    source: &RasterGrid,
    source_crs: Crs,
    target: GridGeometry,
    method: ResamplingMethod,
) -> Result<RasterGrid, CrsError> {
    // Target CRS is always set by the callers
    let target_crs = target.crs.unwrap_or(source_crs);
    let inverse = CrsTransform::new(target_crs, source_crs)?;

    let values = cells::build(target.len(), |i| {
        let (row, col) = target.row_col(i);
        let (x, y) = target.cell_center(row, col);
        let (sx, sy) = inverse.transform(x, y)?;
        match method {
            ResamplingMethod::NearestNeighbor => source.value_at(sx, sy),
            ResamplingMethod::Bilinear => bilinear(source, sx, sy),
        }
    });

    Ok(RasterGrid::from_parts(target, values))
}

/// Bilinear sample between the four surrounding cell centres.
///
/// Near the border the nearest row or column is repeated. Falls back to
/// nearest neighbour when any of the four is no data.
fn bilinear(source: &RasterGrid, x: f64, y: f64) -> Option<f64> {
    let geometry = source.geometry();
    geometry.cell_at(x, y)?;

    let (fr, fc) = geometry.fractional_cell(x, y);
    let (fr, fc) = (fr - 0.5, fc - 0.5);
    let max_row = (geometry.rows - 1) as f64;
    let max_col = (geometry.cols - 1) as f64;

    let r0 = fr.floor().clamp(0.0, max_row);
    let c0 = fc.floor().clamp(0.0, max_col);
    let r1 = (r0 + 1.0).min(max_row);
    let c1 = (c0 + 1.0).min(max_col);
    let tr = (fr - r0).clamp(0.0, 1.0);
    let tc = (fc - c0).clamp(0.0, 1.0);

    let (r0, r1, c0, c1) = (r0 as usize, r1 as usize, c0 as usize, c1 as usize);
    let corners = (
        source.get(r0, c0),
        source.get(r0, c1),
        source.get(r1, c0),
        source.get(r1, c1),
    );

    match corners {
        (Some(v00), Some(v01), Some(v10), Some(v11)) => {
            let top = v00 + (v01 - v00) * tc;
            let bottom = v10 + (v11 - v10) * tc;
            Some(top + (bottom - top) * tr)
        }
        _ => source.value_at(x, y),
    }
}
