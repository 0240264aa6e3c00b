//! Pipeline configuration loaded from TOML.
//!
//! ```toml
//! [vector]
//! regions = "data/states.shp"
//! id_field = "NAME"
//! points = "data/cities.csv"
//! value_field = "pop"
//! points_crs = "EPSG:4326"
//! target_crs = "ESRI:54009"
//! overlap = "first_match"
//! output = "out/state_totals.shp"
//!
//! [raster]
//! sst = ["data/sst_2008.tif", "data/sst_2009.tif"]
//! npp = "data/npp.tif"
//! boundary = "data/eez.shp"
//! sst_window = [12.0, 18.0]
//! npp_window = [2.6, 3.0]
//! resampling = "nearest_neighbor"
//! png = "out/suitability.png"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crs::Crs;
use crate::error::ConfigError;
use crate::raster::{NoDataPolicy, ResamplingMethod};
use crate::vector::OverlapPolicy;

/// Top-level configuration. At least one section must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub vector: Option<VectorConfig>,
    #[serde(default)]
    pub raster: Option<RasterConfig>,
}

/// Region totals: join points to regions and sum a field per region.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorConfig {
    /// Region polygons shapefile
    pub regions: PathBuf,
    /// Region attribute used as the group key
    pub id_field: String,
    /// CRS assumed for the regions when the shapefile has no `.prj`
    #[serde(default)]
    pub regions_crs: Option<Crs>,

    /// Delimited point table
    pub points: PathBuf,
    #[serde(default = "default_x_column")]
    pub x_column: String,
    #[serde(default = "default_y_column")]
    pub y_column: String,
    /// Numeric point attribute to sum
    pub value_field: String,
    pub points_crs: Crs,

    /// CRS both layers are projected to before the join
    pub target_crs: Crs,
    #[serde(default = "default_overlap")]
    pub overlap: OverlapPolicy,

    /// Attribute that receives the totals on the output layer
    #[serde(default = "default_output_field")]
    pub output_field: String,
    /// Shapefile to write the regions with their totals to
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Aquaculture suitability from SST and NPP rasters.
#[derive(Debug, Clone, Deserialize)]
pub struct RasterConfig {
    /// Sea surface temperature layers in Kelvin, averaged cell by cell
    pub sst: Vec<PathBuf>,
    /// Net primary productivity layer
    pub npp: PathBuf,
    /// Polygons the result is clipped to (e.g. an EEZ)
    pub boundary: PathBuf,
    /// CRS assumed for the boundary when the shapefile has no `.prj`
    #[serde(default)]
    pub boundary_crs: Option<Crs>,

    #[serde(default = "default_kelvin_offset")]
    pub kelvin_offset: f64,
    /// Suitable SST range in degrees Celsius, `[lo, hi)`
    pub sst_window: [f64; 2],
    /// Suitable NPP range, `[lo, hi)`
    pub npp_window: [f64; 2],
    /// Used when NPP is resampled onto the SST grid
    pub resampling: ResamplingMethod,
    #[serde(default)]
    pub nodata_policy: NoDataPolicy,

    #[serde(default)]
    pub png: Option<PathBuf>,
    #[serde(default)]
    pub geotiff: Option<PathBuf>,
}

fn default_x_column() -> String {
    "lon".to_string()
}

fn default_y_column() -> String {
    "lat".to_string()
}

fn default_overlap() -> OverlapPolicy {
    OverlapPolicy::FirstMatch
}

fn default_output_field() -> String {
    "total".to_string()
}

/// Default Kelvin to Celsius offset
fn default_kelvin_offset() -> f64 {
    273.15
}

fn check_window(name: &str, window: [f64; 2]) -> Result<(), ConfigError> {
    let [lo, hi] = window;
    if lo.is_nan() || hi.is_nan() || lo >= hi {
        return Err(ConfigError::InvalidBreakpoints(format!(
            "{name} must satisfy lo < hi, got [{lo}, {hi}]"
        )));
    }
    Ok(())
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse and validate configuration text. Paths are kept as written.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vector.is_none() && self.raster.is_none() {
            return Err(ConfigError::Invalid(
                "config needs a [vector] or [raster] section".to_string(),
            ));
        }

        if let Some(vector) = &self.vector {
            if vector.id_field.is_empty() || vector.value_field.is_empty() {
                return Err(ConfigError::Invalid(
                    "vector.id_field and vector.value_field must not be empty".to_string(),
                ));
            }
        }

        if let Some(raster) = &self.raster {
            if raster.sst.is_empty() {
                return Err(ConfigError::Invalid(
                    "raster.sst needs at least one layer".to_string(),
                ));
            }
            if !raster.kelvin_offset.is_finite() {
                return Err(ConfigError::Invalid(
                    "raster.kelvin_offset must be finite".to_string(),
                ));
            }
            check_window("raster.sst_window", raster.sst_window)?;
            check_window("raster.npp_window", raster.npp_window)?;
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(vector) = &mut self.vector {
            resolve(base, &mut vector.regions);
            resolve(base, &mut vector.points);
            if let Some(output) = &mut vector.output {
                resolve(base, output);
            }
        }
        if let Some(raster) = &mut self.raster {
            for sst in &mut raster.sst {
                resolve(base, sst);
            }
            resolve(base, &mut raster.npp);
            resolve(base, &mut raster.boundary);
            if let Some(png) = &mut raster.png {
                resolve(base, png);
            }
            if let Some(geotiff) = &mut raster.geotiff {
                resolve(base, geotiff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [vector]
        regions = "states.shp"
        id_field = "NAME"
        points = "cities.csv"
        value_field = "pop"
        points_crs = "EPSG:4326"
        target_crs = "ESRI:54009"

        [raster]
        sst = ["sst_2008.tif", "sst_2009.tif"]
        npp = "npp.tif"
        boundary = "eez.shp"
        sst_window = [12.0, 18.0]
        npp_window = [2.6, 3.0]
        resampling = "bilinear"
        nodata_policy = "skip"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_toml_str(FULL).unwrap();

        let vector = config.vector.unwrap();
        assert_eq!(vector.points_crs, Crs::Geographic);
        assert_eq!(vector.target_crs, Crs::Mollweide);
        assert_eq!(vector.overlap, OverlapPolicy::FirstMatch);
        assert_eq!(vector.x_column, "lon");
        assert_eq!(vector.output_field, "total");
        assert!(vector.output.is_none());

        let raster = config.raster.unwrap();
        assert_eq!(raster.sst.len(), 2);
        assert_eq!(raster.kelvin_offset, 273.15);
        assert_eq!(raster.resampling, ResamplingMethod::Bilinear);
        assert_eq!(raster.nodata_policy, NoDataPolicy::Skip);
    }

    #[test]
    fn test_resampling_is_required() {
        let text = FULL.replace("resampling = \"bilinear\"", "");
        assert!(matches!(
            PipelineConfig::from_toml_str(&text),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            PipelineConfig::from_toml_str(""),
            Err(ConfigError::Invalid(_))
        ));

        let reversed = FULL.replace("[12.0, 18.0]", "[18.0, 12.0]");
        assert!(matches!(
            PipelineConfig::from_toml_str(&reversed),
            Err(ConfigError::InvalidBreakpoints(_))
        ));

        let no_layers = FULL.replace("[\"sst_2008.tif\", \"sst_2009.tif\"]", "[]");
        assert!(matches!(
            PipelineConfig::from_toml_str(&no_layers),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_crs_is_a_parse_error() {
        let text = FULL.replace("ESRI:54009", "EPSG:2154");
        assert!(matches!(
            PipelineConfig::from_toml_str(&text),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.vector.unwrap().regions, dir.path().join("states.shp"));
        assert_eq!(config.raster.unwrap().npp, dir.path().join("npp.tif"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PipelineConfig::from_file("/nonexistent/pipeline.toml"),
            Err(ConfigError::FileRead(_))
        ));
    }
}
