//! # aquaspatial
//!
//! A small geospatial pipeline for vector and raster analysis.
//!
//! This crate provides the building blocks of a classic spatial-data
//! walkthrough:
//! - Coordinate reference systems and exact transforms (UTM, Web Mercator, Mollweide)
//! - Shapefile, GeoTIFF and delimited point-table I/O
//! - Point-in-polygon joins and per-region sums
//! - Raster algebra: reclassification, cell-wise combination, polygon masks
//! - Raster reprojection with explicit resampling
//! - An aquaculture suitability overlay driven by a TOML config
//!
//! Every error is fatal and typed; see [`error`].

pub mod crs;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod vector;

// Re-export main types for convenience
pub use crs::{Crs, CrsTransform, Extent};
pub use error::{AlignmentError, ConfigError, CrsError, FormatError, Result, SpatialError};

// Vector types
pub use vector::{
    attach_group_sums, reproject_layer, spatial_join, sum_by_group, AttributeValue, Feature,
    GroupSum, JoinSpec, JoinedRecord, OverlapPolicy, VectorLayer,
};

// Raster types
pub use raster::{
    combine, combine_with, mask, project_to_match, reclassify, CombineOp, GridGeometry,
    NoDataPolicy, RasterGrid, RasterStack, RasterStatistics, ReclassRule, ReclassTable,
    Reprojector, ResamplingMethod,
};

// Pipeline
pub use pipeline::{
    region_totals, run, suitability, PipelineConfig, PipelineReport, RegionTotals,
    RegionTotalsSpec, SuitabilityOutcome, SuitabilitySpec,
};
