//! The walkthrough steps, end to end.
//!
//! [`region_totals`] and [`suitability`] work on in-memory layers;
//! [`run`] wraps them with the file I/O described by a [`PipelineConfig`].

mod config;
mod region;
mod suitability;

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{FormatError, SpatialError};
use crate::io::{
    read_geotiff, read_geotiff_stack, read_point_table, read_shapefile, render_png,
    write_geotiff, write_shapefile, ColorRamp, PointTableOptions, RenderOptions,
};
use crate::vector::{JoinSpec, VectorLayer};

pub use config::{PipelineConfig, RasterConfig, VectorConfig};
pub use region::{region_totals, RegionTotals, RegionTotalsSpec};
pub use suitability::{suitability, SuitabilityOutcome, SuitabilitySpec, SUITABLE};

/// What [`run`] produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub region_totals: Option<RegionTotals>,
    pub suitability: Option<SuitabilityOutcome>,
}

fn ensure_parent(path: &Path) -> Result<(), FormatError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| FormatError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Read a shapefile, falling back to `fallback` when it has no `.prj`.
fn read_layer(path: &Path, fallback: Option<crate::crs::Crs>) -> Result<VectorLayer, FormatError> {
    let layer = read_shapefile(path)?;
    Ok(match (layer.crs, fallback) {
        (None, Some(crs)) => {
            warn!(layer = %layer.name, crs = %crs, "no .prj, using CRS from config");
            layer.with_crs(crs)
        }
        _ => layer,
    })
}

fn run_vector(config: &VectorConfig) -> Result<RegionTotals, SpatialError> {
    let regions = read_layer(&config.regions, config.regions_crs)?;
    let options = PointTableOptions::new(&config.x_column, &config.y_column)
        .with_crs(config.points_crs);
    let points = read_point_table(&config.points, &options)?;

    let spec = RegionTotalsSpec {
        target_crs: config.target_crs,
        join: JoinSpec::new(&config.id_field, config.overlap),
        value_field: config.value_field.clone(),
        output_field: config.output_field.clone(),
    };
    let totals = region_totals(&regions, &points, &spec)?;

    if let Some(output) = &config.output {
        ensure_parent(output)?;
        write_shapefile(&totals.regions, output)?;
    }
    Ok(totals)
}

fn run_raster(config: &RasterConfig) -> Result<SuitabilityOutcome, SpatialError> {
    let sst = read_geotiff_stack(&config.sst)?;
    let npp = read_geotiff(&config.npp)?;
    let boundary = read_layer(&config.boundary, config.boundary_crs)?;

    let spec = SuitabilitySpec {
        kelvin_offset: config.kelvin_offset,
        sst_window: (config.sst_window[0], config.sst_window[1]),
        npp_window: (config.npp_window[0], config.npp_window[1]),
        resampling: config.resampling,
        nodata_policy: config.nodata_policy,
    };
    let outcome = suitability(&sst, &npp, &boundary, &spec)?;

    if let Some(png) = &config.png {
        ensure_parent(png)?;
        let options = RenderOptions::new(ColorRamp::Suitability).with_range(0.0, SUITABLE);
        render_png(&outcome.suitability, png, &options)?;
    }
    if let Some(geotiff) = &config.geotiff {
        ensure_parent(geotiff)?;
        write_geotiff(&outcome.suitability, geotiff)?;
    }
    Ok(outcome)
}

/// Run every configured step and write the configured outputs.
///
/// The vector step runs first. Any error stops the run.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport, SpatialError> {
    config.validate()?;

    let mut report = PipelineReport::default();
    if let Some(vector) = &config.vector {
        info!("running region totals");
        report.region_totals = Some(run_vector(vector)?);
    }
    if let Some(raster) = &config.raster {
        info!("running suitability overlay");
        report.suitability = Some(run_raster(raster)?);
    }
    Ok(report)
}
