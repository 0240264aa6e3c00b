//! GeoTIFF raster reader and writer.
//!
//! Single-band GeoTIFFs of any integer or float sample type are decoded into
//! [`RasterGrid`]. Uses the pure Rust `tiff` crate, so no GDAL is required.
//!
//! Georeferencing comes from ModelPixelScale (33550) + ModelTiepoint (33922)
//! or from ModelTransformation (34264). The CRS is read from the
//! GeoKeyDirectory (34735) and no data from the GDAL_NODATA tag (42113).
//!
//! # Example
//!
//! ```ignore
//! use aquaspatial::io::{read_geotiff, write_geotiff};
//!
//! let sst = read_geotiff("data/sst_2008.tif")?;
//! println!("{}", sst.statistics());
//! write_geotiff(&sst.offset(-273.15), "out/sst_celsius.tif")?;
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, info, warn};

use crate::crs::Crs;
use crate::error::{FormatError, SpatialError};
use crate::raster::{GridGeometry, RasterGrid, RasterStack};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const KEY_MODEL_TYPE: u16 = 1024;
const KEY_RASTER_TYPE: u16 = 1025;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// GeoKeys with inline SHORT values, as (key, value).
fn parse_geo_keys(directory: &[u16]) -> Vec<(u16, u16)> {
    if directory.len() < 4 {
        return Vec::new();
    }
    let count = directory[3] as usize;
    directory[4..]
        .chunks_exact(4)
        .take(count)
        // Location 0 means the value is stored in the entry itself
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn geo_key(keys: &[(u16, u16)], key: u16) -> Option<u16> {
    keys.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn crs_from_geo_keys(keys: &[(u16, u16)], path: &Path) -> Option<Crs> {
    let code = geo_key(keys, KEY_PROJECTED_CS_TYPE).or_else(|| geo_key(keys, KEY_GEOGRAPHIC_TYPE))?;
    match Crs::from_epsg(u32::from(code)) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(path = %path.display(), code, error = %e, "leaving raster CRS unset");
            None
        }
    }
}

/// Top-left origin and cell size from the georeferencing tags.
fn geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(f64, f64, f64, f64), FormatError> {
    let pixel_scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tie)) = (pixel_scale, tiepoint) {
        // ModelTiepoint format: [I, J, K, X, Y, Z]
        // ModelPixelScale format: [ScaleX, ScaleY, ScaleZ]
        if tie.len() >= 6 && scale.len() >= 2 {
            let origin_x = tie[3] - tie[0] * scale[0];
            let origin_y = tie[4] + tie[1] * scale[1];
            return Ok((origin_x, origin_y, scale[0], scale[1]));
        }
        return Err(FormatError::MissingGeotransform(
            "ModelPixelScale/ModelTiepoint tags are truncated".to_string(),
        ));
    }

    if let Ok(m) = decoder.get_tag_f64_vec(tag(MODEL_TRANSFORMATION)) {
        if m.len() < 16 {
            return Err(FormatError::MissingGeotransform(
                "ModelTransformation tag is truncated".to_string(),
            ));
        }
        if m[1] != 0.0 || m[4] != 0.0 {
            return Err(FormatError::Unsupported(
                "rotated or sheared rasters".to_string(),
            ));
        }
        return Ok((m[3], m[7], m[0], -m[5]));
    }

    Err(FormatError::MissingGeotransform(
        "no ModelPixelScale/ModelTiepoint or ModelTransformation tags".to_string(),
    ))
}

fn samples_to_f64(result: DecodingResult) -> Result<Vec<f64>, FormatError> {
    let values = match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(FormatError::Unsupported(
                "TIFF sample format".to_string(),
            ))
        }
    };
    Ok(values)
}

/// Load a single-band GeoTIFF.
///
/// A CRS code this crate does not know leaves the grid's CRS unset with a
/// warning; attach one with [`RasterGrid::with_crs`].
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<RasterGrid, FormatError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(FormatError::Unsupported(format!(
                "{other:?} images; only single-band rasters are read"
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let (mut origin_x, mut origin_y, cell_width, cell_height) = geotransform(&mut decoder)?;

    let keys = decoder
        .get_tag_u16_vec(tag(GEO_KEY_DIRECTORY))
        .map(|d| parse_geo_keys(&d))
        .unwrap_or_default();
    let crs = crs_from_geo_keys(&keys, path);

    // Tiepoints of PixelIsPoint rasters refer to cell centres
    if geo_key(&keys, KEY_RASTER_TYPE) == Some(RASTER_PIXEL_IS_POINT) {
        origin_x -= cell_width / 2.0;
        origin_y += cell_height / 2.0;
    }

    let nodata = decoder
        .get_tag_ascii_string(tag(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());

    let samples = samples_to_f64(decoder.read_image()?)?;
    let values: Vec<Option<f64>> = samples
        .into_iter()
        .map(|v| match nodata {
            Some(nd) if v == nd => None,
            _ => Some(v),
        })
        .collect();

    let geometry = GridGeometry::new(
        origin_x,
        origin_y,
        cell_width,
        cell_height,
        width as usize,
        height as usize,
        crs,
    )
    .map_err(|e| FormatError::MissingGeotransform(e.to_string()))?;
    let grid = RasterGrid::new(geometry, values)
        .map_err(|e| FormatError::Tiff(e.to_string()))?;

    info!(
        path = %path.display(),
        cols = width,
        rows = height,
        crs = %crate::crs::describe(crs),
        nodata_cells = grid.values().len() - grid.count_present(),
        "loaded raster"
    );

    Ok(grid)
}

/// Load several GeoTIFFs as one aligned stack, in the given order.
pub fn read_geotiff_stack<P: AsRef<Path>>(paths: &[P]) -> Result<RasterStack, SpatialError> {
    let layers = paths
        .iter()
        .map(read_geotiff)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RasterStack::new(layers)?)
}

/// Write a grid as a Float64 GeoTIFF.
///
/// No-data cells are written as NaN and flagged through GDAL_NODATA.
pub fn write_geotiff<P: AsRef<Path>>(grid: &RasterGrid, path: P) -> Result<(), FormatError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;

    let g = grid.geometry();
    let mut image = encoder.new_image::<colortype::Gray64Float>(g.cols as u32, g.rows as u32)?;

    let scale = [g.cell_width, g.cell_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, g.origin_x, g.origin_y, 0.0];
    image.encoder().write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])?;
    image.encoder().write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])?;

    if let Some(crs) = g.crs {
        let (model, key, code) = if crs.is_geographic() {
            (MODEL_TYPE_GEOGRAPHIC, KEY_GEOGRAPHIC_TYPE, crs.code())
        } else {
            (MODEL_TYPE_PROJECTED, KEY_PROJECTED_CS_TYPE, crs.code())
        };
        let code = u16::try_from(code)
            .map_err(|_| FormatError::Unsupported(format!("CRS code {code} as a GeoKey")))?;
        let directory: [u16; 16] = [
            1, 1, 0, 3, // version, revision, minor, key count
            KEY_MODEL_TYPE, 0, 1, model,
            KEY_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
            key, 0, 1, code,
        ];
        image.encoder().write_tag(tag(GEO_KEY_DIRECTORY), &directory[..])?;
    }
    image.encoder().write_tag(tag(GDAL_NODATA), "nan")?;

    let data: Vec<f64> = grid.values().iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    image.write_data(&data)?;

    debug!(path = %path.display(), cols = g.cols, rows = g.rows, "wrote raster");
    Ok(())
}
