//! Georeferenced numeric grids.
//!
//! A [`RasterGrid`] is a row-major array of `Option<f64>` cells, `None`
//! meaning "no data", plus a [`GridGeometry`] that places it on the map.
//! Row 0 is the northern (top) edge.

use std::fmt;

use super::cells;
use crate::crs::{describe, Crs, Extent};
use crate::error::{AlignmentError, ConfigError};

/// Relative tolerance used when comparing origins and resolutions.
const ALIGN_TOL: f64 = 1e-9;

/// Placement of a grid: top-left origin, cell size, dimensions and CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// X coordinate of the top-left corner
    pub origin_x: f64,
    /// Y coordinate of the top-left corner
    pub origin_y: f64,
    /// Cell width in CRS units (positive)
    pub cell_width: f64,
    /// Cell height in CRS units (positive, rows grow southward)
    pub cell_height: f64,
    pub cols: usize,
    pub rows: usize,
    pub crs: Option<Crs>,
}

impl GridGeometry {
    /// Create a grid geometry, validating sizes.
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_width: f64,
        cell_height: f64,
        cols: usize,
        rows: usize,
        crs: Option<Crs>,
    ) -> Result<Self, ConfigError> {
        if !(cell_width > 0.0 && cell_height > 0.0) || !cell_width.is_finite() || !cell_height.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "cell size must be positive, got {cell_width} x {cell_height}"
            )));
        }
        if cols == 0 || rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one cell, got {cols} x {rows}"
            )));
        }
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(ConfigError::Invalid("grid origin must be finite".to_string()));
        }
        Ok(Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
            cols,
            rows,
            crs,
        })
    }

    /// Grid of `cols` x `rows` cells exactly covering `extent`.
    pub fn from_extent(
        extent: Extent,
        cols: usize,
        rows: usize,
        crs: Option<Crs>,
    ) -> Result<Self, ConfigError> {
        if cols == 0 || rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one cell, got {cols} x {rows}"
            )));
        }
        Self::new(
            extent.min_x,
            extent.max_y,
            extent.width() / cols as f64,
            extent.height() / rows as f64,
            cols,
            rows,
            crs,
        )
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extent(&self) -> Extent {
        Extent::new(
            self.origin_x,
            self.origin_y - self.rows as f64 * self.cell_height,
            self.origin_x + self.cols as f64 * self.cell_width,
            self.origin_y,
        )
    }

    /// Cell size as (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Row-major index of a cell.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// (row, col) of a row-major index.
    #[inline]
    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Map coordinates of a cell centre.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell_width,
            self.origin_y - (row as f64 + 0.5) * self.cell_height,
        )
    }

    /// Fractional (row, col) of a map coordinate; cell centres sit at `.5`.
    #[inline]
    pub fn fractional_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (self.origin_y - y) / self.cell_height,
            (x - self.origin_x) / self.cell_width,
        )
    }

    /// Cell containing a map coordinate. The right and bottom edges are open.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (row, col) = self.fractional_cell(x, y);
        if !(row >= 0.0 && col >= 0.0) {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Check that two grids are co-registered: same CRS, dimensions,
    /// resolution and origin.
    pub fn check_alignment(&self, other: &GridGeometry) -> Result<(), AlignmentError> {
        if self.crs != other.crs {
            return Err(AlignmentError::Crs {
                left: describe(self.crs),
                right: describe(other.crs),
            });
        }
        if self.cols != other.cols || self.rows != other.rows {
            return Err(AlignmentError::Dimensions {
                left_cols: self.cols,
                left_rows: self.rows,
                right_cols: other.cols,
                right_rows: other.rows,
            });
        }
        if !close(self.cell_width, other.cell_width, self.cell_width)
            || !close(self.cell_height, other.cell_height, self.cell_height)
        {
            return Err(AlignmentError::Resolution {
                left_x: self.cell_width,
                left_y: self.cell_height,
                right_x: other.cell_width,
                right_y: other.cell_height,
            });
        }
        if !close(self.origin_x, other.origin_x, self.cell_width)
            || !close(self.origin_y, other.origin_y, self.cell_height)
        {
            return Err(AlignmentError::Origin {
                left_x: self.origin_x,
                left_y: self.origin_y,
                right_x: other.origin_x,
                right_y: other.origin_y,
            });
        }
        Ok(())
    }
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= ALIGN_TOL * scale.abs().max(1.0)
}

/// A georeferenced grid of optional values.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    geometry: GridGeometry,
    values: Vec<Option<f64>>,
}

impl RasterGrid {
    /// Create a grid from row-major values.
    ///
    /// Non-finite values are stored as no data.
    pub fn new(geometry: GridGeometry, values: Vec<Option<f64>>) -> Result<Self, ConfigError> {
        if values.len() != geometry.len() {
            return Err(ConfigError::Invalid(format!(
                "expected {} values for a {}x{} grid, got {}",
                geometry.len(),
                geometry.cols,
                geometry.rows,
                values.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(Self { geometry, values })
    }

    /// Create a grid from plain values, treating NaN as no data.
    pub fn from_values(geometry: GridGeometry, values: Vec<f64>) -> Result<Self, ConfigError> {
        Self::new(geometry, values.into_iter().map(Some).collect())
    }

    /// Grid with every cell set to `value`.
    pub fn filled(geometry: GridGeometry, value: Option<f64>) -> Self {
        Self {
            geometry,
            values: vec![value.filter(|x| x.is_finite()); geometry.len()],
        }
    }

    pub(crate) fn from_parts(geometry: GridGeometry, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), geometry.len());
        Self { geometry, values }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn crs(&self) -> Option<Crs> {
        self.geometry.crs
    }

    /// Label the grid with a CRS without moving any cell.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.geometry.crs = Some(crs);
        self
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Option<f64>> {
        self.values
    }

    /// Dimensions as (cols, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.geometry.cols, self.geometry.rows)
    }

    pub fn extent(&self) -> Extent {
        self.geometry.extent()
    }

    /// Cell value; `None` for no data or out-of-range indices.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.geometry.rows || col >= self.geometry.cols {
            return None;
        }
        self.values[self.geometry.index(row, col)]
    }

    /// Set a cell. Out-of-range indices are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        if row < self.geometry.rows && col < self.geometry.cols {
            let i = self.geometry.index(row, col);
            self.values[i] = value.filter(|x| x.is_finite());
        }
    }

    /// Value at a map coordinate (nearest cell).
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.geometry.cell_at(x, y)?;
        self.get(row, col)
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.geometry.cell_center(row, col)
    }

    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        self.geometry.cell_at(x, y)
    }

    pub fn check_alignment(&self, other: &RasterGrid) -> Result<(), AlignmentError> {
        self.geometry.check_alignment(&other.geometry)
    }

    /// Apply `f` to every present cell; no data stays no data.
    ///
    /// Results that are not finite become no data.
    pub fn map_values<F>(&self, f: F) -> RasterGrid
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let values = cells::map(&self.values, |v| v.map(&f).filter(|x| x.is_finite()));
        RasterGrid::from_parts(self.geometry, values)
    }

    /// Add a constant to every present cell (e.g. Kelvin to Celsius).
    pub fn offset(&self, delta: f64) -> RasterGrid {
        self.map_values(|v| v + delta)
    }

    /// Multiply every present cell by a constant.
    pub fn scale(&self, factor: f64) -> RasterGrid {
        self.map_values(|v| v * factor)
    }

    /// Cut out the cells overlapping `extent` (in the grid's own CRS).
    ///
    /// The result snaps outward to whole cells.
    pub fn crop(&self, extent: &Extent) -> Result<RasterGrid, ConfigError> {
        let g = &self.geometry;
        let overlap = self.extent().intersection(extent).ok_or_else(|| {
            ConfigError::Invalid("crop extent does not overlap the raster".to_string())
        })?;

        let col0 = ((overlap.min_x - g.origin_x) / g.cell_width).floor().max(0.0) as usize;
        let col1 = (((overlap.max_x - g.origin_x) / g.cell_width).ceil() as usize).min(g.cols);
        let row0 = ((g.origin_y - overlap.max_y) / g.cell_height).floor().max(0.0) as usize;
        let row1 = (((g.origin_y - overlap.min_y) / g.cell_height).ceil() as usize).min(g.rows);

        let geometry = GridGeometry::new(
            g.origin_x + col0 as f64 * g.cell_width,
            g.origin_y - row0 as f64 * g.cell_height,
            g.cell_width,
            g.cell_height,
            col1 - col0,
            row1 - row0,
            g.crs,
        )?;

        let mut values = Vec::with_capacity(geometry.len());
        for row in row0..row1 {
            let start = g.index(row, col0);
            values.extend_from_slice(&self.values[start..start + (col1 - col0)]);
        }
        Ok(RasterGrid::from_parts(geometry, values))
    }

    /// Number of cells holding a value.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Summary statistics over present cells.
    pub fn statistics(&self) -> RasterStatistics {
        let mut count = 0usize;
        let mut sum = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in self.values.iter().flatten() {
            count += 1;
            sum += v;
            min = min.min(*v);
            max = max.max(*v);
        }

        RasterStatistics {
            cols: self.geometry.cols,
            rows: self.geometry.rows,
            count,
            nodata_count: self.values.len() - count,
            min: (count > 0).then_some(min),
            max: (count > 0).then_some(max),
            mean: (count > 0).then(|| sum / count as f64),
            extent: self.extent(),
            crs: self.geometry.crs,
        }
    }
}

/// Statistics about a raster's present cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub cols: usize,
    pub rows: usize,
    /// Number of cells with a value
    pub count: usize,
    /// Number of no-data cells
    pub nodata_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub extent: Extent,
    pub crs: Option<Crs>,
}

impl fmt::Display for RasterStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| format!("{v:.4}"));
        writeln!(f, "Raster Statistics:")?;
        writeln!(f, "  Dimensions: {}x{} cells", self.cols, self.rows)?;
        writeln!(f, "  CRS: {}", describe(self.crs))?;
        writeln!(f, "  Cells with data: {}", self.count)?;
        writeln!(f, "  NoData cells: {}", self.nodata_count)?;
        writeln!(f, "  Range: {} to {}", show(self.min), show(self.max))?;
        writeln!(f, "  Mean: {}", show(self.mean))?;
        write!(
            f,
            "  Extent: x [{:.4}, {:.4}], y [{:.4}, {:.4}]",
            self.extent.min_x, self.extent.max_x, self.extent.min_y, self.extent.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(cols: usize, rows: usize) -> GridGeometry {
        GridGeometry::new(0.0, 10.0, 1.0, 1.0, cols, rows, Some(Crs::Geographic)).unwrap()
    }

    #[test]
    fn test_geometry_validation() {
        assert!(GridGeometry::new(0.0, 0.0, 0.0, 1.0, 2, 2, None).is_err());
        assert!(GridGeometry::new(0.0, 0.0, 1.0, 1.0, 0, 2, None).is_err());
        assert!(GridGeometry::new(f64::NAN, 0.0, 1.0, 1.0, 2, 2, None).is_err());
    }

    #[test]
    fn test_cell_lookup() {
        let g = geometry(4, 3);
        assert_eq!(g.extent(), Extent::new(0.0, 7.0, 4.0, 10.0));
        assert_eq!(g.cell_center(0, 0), (0.5, 9.5));
        assert_eq!(g.cell_at(0.5, 9.5), Some((0, 0)));
        assert_eq!(g.cell_at(3.99, 7.01), Some((2, 3)));
        assert_eq!(g.cell_at(4.0, 9.0), None);
        assert_eq!(g.cell_at(-0.1, 9.0), None);
        assert_eq!(g.row_col(g.index(2, 1)), (2, 1));
    }

    #[test]
    fn test_value_count_must_match() {
        assert!(RasterGrid::new(geometry(2, 2), vec![Some(1.0); 3]).is_err());
    }

    #[test]
    fn test_nan_becomes_nodata() {
        let grid = RasterGrid::from_values(geometry(2, 1), vec![f64::NAN, 2.0]).unwrap();
        assert_eq!(grid.get(0, 0), None);
        assert_eq!(grid.get(0, 1), Some(2.0));
    }

    #[test]
    fn test_map_values_keeps_nodata() {
        let grid = RasterGrid::new(geometry(2, 1), vec![None, Some(300.0)]).unwrap();
        let celsius = grid.offset(-273.15);
        assert_eq!(celsius.get(0, 0), None);
        assert!((celsius.get(0, 1).unwrap() - 26.85).abs() < 1e-9);
    }

    #[test]
    fn test_alignment_checks() {
        let a = geometry(4, 3);
        assert!(a.check_alignment(&a).is_ok());

        let mut shifted = a;
        shifted.origin_x += 0.5;
        assert!(matches!(a.check_alignment(&shifted), Err(AlignmentError::Origin { .. })));

        let mut finer = a;
        finer.cell_width = 0.5;
        assert!(matches!(a.check_alignment(&finer), Err(AlignmentError::Resolution { .. })));

        let mut other_crs = a;
        other_crs.crs = Some(Crs::WebMercator);
        assert!(matches!(a.check_alignment(&other_crs), Err(AlignmentError::Crs { .. })));

        assert!(matches!(
            a.check_alignment(&geometry(3, 3)),
            Err(AlignmentError::Dimensions { .. })
        ));
    }

    #[test]
    fn test_crop_snaps_to_cells() {
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let grid = RasterGrid::from_values(geometry(4, 3), values).unwrap();

        let cropped = grid.crop(&Extent::new(1.2, 7.5, 2.8, 9.2)).unwrap();
        assert_eq!(cropped.dimensions(), (2, 3));
        assert_eq!(cropped.get(0, 0), Some(1.0));
        assert_eq!(cropped.get(2, 1), Some(10.0));
        assert_eq!(cropped.extent(), Extent::new(1.0, 7.0, 3.0, 10.0));

        assert!(grid.crop(&Extent::new(20.0, 20.0, 30.0, 30.0)).is_err());
    }

    #[test]
    fn test_statistics() {
        let grid = RasterGrid::new(geometry(3, 1), vec![Some(1.0), None, Some(3.0)]).unwrap();
        let stats = grid.statistics();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.nodata_count, 1);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.mean, Some(2.0));
        assert!(stats.to_string().contains("Cells with data: 2"));

        let empty = RasterGrid::filled(geometry(2, 2), None).statistics();
        assert_eq!(empty.mean, None);
    }
}
