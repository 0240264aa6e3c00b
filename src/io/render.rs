//! Quick-look PNG rendering of raster grids.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::error::FormatError;
use crate::raster::RasterGrid;

/// Colour ramps for [`render_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRamp {
    /// Perceptually uniform purple-green-yellow
    #[default]
    Viridis,
    Greys,
    /// Sand to deep teal, for suitability scores
    Suitability,
}

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];
const GREYS: [[u8; 3]; 2] = [[0, 0, 0], [255, 255, 255]];
const SUITABILITY: [[u8; 3]; 3] = [[237, 226, 190], [102, 194, 164], [0, 88, 92]];

impl ColorRamp {
    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            ColorRamp::Viridis => &VIRIDIS,
            ColorRamp::Greys => &GREYS,
            ColorRamp::Suitability => &SUITABILITY,
        }
    }

    /// Colour at `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn color(self, t: f64) -> [u8; 3] {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - i as f64;
        let mut rgb = [0u8; 3];
        for (c, out) in rgb.iter_mut().enumerate() {
            let a = f64::from(stops[i][c]);
            let b = f64::from(stops[i + 1][c]);
            *out = (a + (b - a) * frac).round() as u8;
        }
        rgb
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub ramp: ColorRamp,
    /// Value range mapped onto the ramp; the data range when `None`
    pub range: Option<(f64, f64)>,
}

impl RenderOptions {
    pub fn new(ramp: ColorRamp) -> Self {
        Self { ramp, range: None }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }
}

/// Render a grid to an RGBA image, one pixel per cell.
///
/// No-data cells are fully transparent.
pub fn render_image(grid: &RasterGrid, options: &RenderOptions) -> RgbaImage {
    let (cols, rows) = grid.dimensions();
    let (lo, hi) = options.range.unwrap_or_else(|| {
        let stats = grid.statistics();
        (stats.min.unwrap_or(0.0), stats.max.unwrap_or(1.0))
    });
    let span = hi - lo;

    let mut img = RgbaImage::new(cols as u32, rows as u32);
    for row in 0..rows {
        for col in 0..cols {
            let pixel = match grid.get(row, col) {
                Some(v) => {
                    let t = if span > 0.0 { (v - lo) / span } else { 0.0 };
                    let [r, g, b] = options.ramp.color(t);
                    Rgba([r, g, b, 255])
                }
                None => Rgba([0, 0, 0, 0]),
            };
            img.put_pixel(col as u32, row as u32, pixel);
        }
    }
    img
}

/// Render a grid and save it as PNG.
pub fn render_png<P: AsRef<Path>>(
    grid: &RasterGrid,
    path: P,
    options: &RenderOptions,
) -> Result<(), FormatError> {
    let path = path.as_ref();
    let img = render_image(grid, options);
    img.save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), ramp = ?options.ramp, "rendered raster");
    Ok(())
}
