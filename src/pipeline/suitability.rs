//! Aquaculture suitability from sea surface temperature and productivity.
//!
//! A cell is suitable when its mean SST (in Celsius) and its NPP both fall
//! inside their windows and its centre lies inside the boundary.

use tracing::info;

use crate::error::{CrsError, SpatialError};
use crate::raster::{
    combine, mask, project_to_match, reclassify, CombineOp, NoDataPolicy, RasterGrid,
    RasterStack, ReclassTable, ResamplingMethod,
};
use crate::vector::{reproject_layer, VectorLayer};

/// Marker stored in suitable cells.
pub const SUITABLE: f64 = 1.0;

/// Parameters for [`suitability`].
#[derive(Debug, Clone, PartialEq)]
pub struct SuitabilitySpec {
    /// Subtracted from the SST mean (273.15 converts Kelvin to Celsius)
    pub kelvin_offset: f64,
    /// Suitable SST range `[lo, hi)` in Celsius
    pub sst_window: (f64, f64),
    /// Suitable NPP range `[lo, hi)`
    pub npp_window: (f64, f64),
    /// Used when NPP is resampled onto the SST grid
    pub resampling: ResamplingMethod,
    /// How missing years are treated in the SST mean
    pub nodata_policy: NoDataPolicy,
}

/// Result of [`suitability`], with the intermediate layers kept for plotting.
#[derive(Debug, Clone)]
pub struct SuitabilityOutcome {
    /// [`SUITABLE`] where suitable, no data elsewhere
    pub suitability: RasterGrid,
    pub suitable_cells: usize,
    /// Mean SST in Celsius
    pub sst_celsius: RasterGrid,
    /// NPP on the SST grid
    pub npp_aligned: RasterGrid,
    pub sst_suitable: RasterGrid,
    pub npp_suitable: RasterGrid,
}

/// Overlay SST and NPP suitability and clip it to the boundary.
///
/// The SST stack defines the output grid. NPP is resampled onto it with
/// `spec.resampling`; the boundary is reprojected into the SST CRS.
pub fn suitability(
    sst: &RasterStack,
    npp: &RasterGrid,
    boundary: &VectorLayer,
    spec: &SuitabilitySpec,
) -> Result<SuitabilityOutcome, SpatialError> {
    let sst_table = ReclassTable::window(spec.sst_window.0, spec.sst_window.1, SUITABLE)?;
    let npp_table = ReclassTable::window(spec.npp_window.0, spec.npp_window.1, SUITABLE)?;

    let sst_celsius = sst.mean(spec.nodata_policy).offset(-spec.kelvin_offset);
    let sst_crs = sst_celsius
        .crs()
        .ok_or_else(|| CrsError::Unset("SST raster".to_string()))?;

    let npp_aligned = project_to_match(npp, &sst_celsius, spec.resampling)?;

    let sst_suitable = reclassify(&sst_celsius, &sst_table);
    let npp_suitable = reclassify(&npp_aligned, &npp_table);
    let combined = combine(&sst_suitable, &npp_suitable, CombineOp::Multiply)?;

    let boundary = reproject_layer(boundary, sst_crs)?;
    let suitability = mask(&combined, &boundary)?;
    let suitable_cells = suitability.count_present();

    info!(
        layers = sst.len(),
        sst_cells = sst_suitable.count_present(),
        npp_cells = npp_suitable.count_present(),
        suitable_cells,
        "suitability computed"
    );

    Ok(SuitabilityOutcome {
        suitability,
        suitable_cells,
        sst_celsius,
        npp_aligned,
        sst_suitable,
        npp_suitable,
    })
}
