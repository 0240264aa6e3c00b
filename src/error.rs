//! Error taxonomy shared by every pipeline step.
//!
//! Each step returns the narrowest error it can produce. [`SpatialError`]
//! gathers them for code that chains several steps. All errors are fatal:
//! nothing here is retried or partially recovered.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SpatialError>;

/// Unreadable, missing or malformed input and output files.
#[derive(Debug, Error)]
pub enum FormatError {
    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TIFF decoding or encoding error
    #[error("TIFF error: {0}")]
    Tiff(String),

    /// Shapefile or dBase error
    #[error("Shapefile error: {0}")]
    Shapefile(String),

    /// Missing or invalid geotransform tags
    #[error("Missing geotransform: {0}")]
    MissingGeotransform(String),

    /// Unsupported sample type or geometry kind
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Parse error in delimited text
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Required column absent from a table header
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// dBase field names are limited to 10 ASCII characters
    #[error("Invalid dBase field name: {0}")]
    InvalidFieldName(String),

    /// Text attribute wider than a dBase character field
    #[error("Value of field {field} is {len} bytes, the limit is {max}")]
    ValueTooLong { field: String, len: usize, max: usize },

    /// Input held no usable records
    #[error("No data: {0}")]
    Empty(String),

    /// PNG rendering error
    #[error("Image error: {0}")]
    Image(String),
}

impl FormatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormatError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<tiff::TiffError> for FormatError {
    fn from(e: tiff::TiffError) -> Self {
        FormatError::Tiff(e.to_string())
    }
}

impl From<shapefile::Error> for FormatError {
    fn from(e: shapefile::Error) -> Self {
        FormatError::Shapefile(e.to_string())
    }
}

impl From<image::ImageError> for FormatError {
    fn from(e: image::ImageError) -> Self {
        FormatError::Image(e.to_string())
    }
}

/// Missing, unknown or mismatched coordinate reference systems.
#[derive(Debug, Error, PartialEq)]
pub enum CrsError {
    /// A layer has no CRS attached
    #[error("CRS is not set on {0}")]
    Unset(String),

    /// The CRS code or WKT is not one this crate can transform
    #[error("Unsupported CRS: {0}")]
    Unsupported(String),

    /// Two layers were combined with different CRSs
    #[error("CRS mismatch: {left} vs {right}")]
    Mismatch { left: String, right: String },

    /// A coordinate falls outside the valid domain of the target projection
    #[error("Coordinate ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { x: f64, y: f64, crs: String },
}

/// Rasters that are not co-registered.
#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("CRS differs: {left} vs {right}")]
    Crs { left: String, right: String },

    #[error("Dimensions differ: {left_cols}x{left_rows} vs {right_cols}x{right_rows}")]
    Dimensions {
        left_cols: usize,
        left_rows: usize,
        right_cols: usize,
        right_rows: usize,
    },

    #[error("Resolution differs: ({left_x}, {left_y}) vs ({right_x}, {right_y})")]
    Resolution {
        left_x: f64,
        left_y: f64,
        right_x: f64,
        right_y: f64,
    },

    #[error("Origin differs: ({left_x}, {left_y}) vs ({right_x}, {right_y})")]
    Origin {
        left_x: f64,
        left_y: f64,
        right_x: f64,
        right_y: f64,
    },

    #[error("Raster stack is empty")]
    EmptyStack,
}

/// Malformed parameters: breakpoints, config files, grid definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid reclassification breakpoints: {0}")]
    InvalidBreakpoints(String),

    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Umbrella error for chained pipeline steps.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Crs(#[from] CrsError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A point fell inside several polygons under `OverlapPolicy::Reject`
    #[error("Point {point} is contained by {candidates} polygons")]
    AmbiguousJoin { point: usize, candidates: usize },
}
