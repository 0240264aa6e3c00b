//! Readers and writers for the pipeline's file formats.
//!
//! This module provides:
//! - **Shapefiles**: vector layers with `.prj` sidecars ([`read_shapefile`], [`write_shapefile`])
//! - **GeoTIFF**: single-band rasters ([`read_geotiff`], [`read_geotiff_stack`], [`write_geotiff`])
//! - **Point tables**: delimited text with coordinate columns ([`read_point_table`])
//! - **PNG**: colour-ramped quick looks of rasters ([`render_png`])
//!
//! # Example
//!
//! ```ignore
//! use aquaspatial::io::{read_point_table, read_shapefile, PointTableOptions};
//! use aquaspatial::crs::Crs;
//!
//! let states = read_shapefile("data/states.shp")?;
//! let options = PointTableOptions::new("lon", "lat").with_crs(Crs::Geographic);
//! let cities = read_point_table("data/cities.csv", &options)?;
//! ```

mod geotiff;
mod point_table;
mod render;
mod shapefile;

pub use self::geotiff::{read_geotiff, read_geotiff_stack, write_geotiff};
pub use self::point_table::{read_point_table, PointTableOptions};
pub use self::render::{render_image, render_png, ColorRamp, RenderOptions};
pub use self::shapefile::{read_shapefile, write_shapefile};
