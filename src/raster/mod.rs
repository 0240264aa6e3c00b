//! Raster grids and the cell-wise algebra run on them.
//!
//! - [`RasterGrid`]: georeferenced `Option<f64>` cells
//! - [`reclassify`], [`combine`], [`combine_with`]: cell algebra on aligned grids
//! - [`mask`]: clip to polygons
//! - [`RasterStack`]: per-cell statistics over aligned layers
//! - [`Reprojector`], [`project_to_match`]: the only places cells are resampled

mod algebra;
mod cells;
mod grid;
mod mask;
mod resample;
mod stack;

pub use algebra::{combine, combine_with, reclassify, CombineOp, ReclassRule, ReclassTable};
pub use grid::{GridGeometry, RasterGrid, RasterStatistics};
pub use mask::mask;
pub use resample::{project_to_match, Reprojector, ResamplingMethod};
pub use stack::{NoDataPolicy, RasterStack};
