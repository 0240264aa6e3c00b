//! Map projections between WGS84 geographic coordinates and planar metres.
//!
//! # Supported Projections
//!
//! - **UtmProjection**: Universal Transverse Mercator, any zone and hemisphere
//! - **WebMercatorProjection**: spherical "pseudo" Mercator used by web maps
//! - **MollweideProjection**: equal-area world projection for global rasters
//!
//! # Example
//!
//! ```ignore
//! use aquaspatial::crs::{CoordinateProjection, UtmProjection};
//!
//! let proj = UtmProjection::new(33, true);
//! let (x, y) = proj.geo_to_xy(52.0, 15.0);
//! let (lat, lon) = proj.xy_to_geo(x, y);
//! ```

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

/// WGS84 equatorial radius in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Trait for coordinate projections.
///
/// Inverse results may be NaN for planar points outside the projection's
/// valid domain.
pub trait CoordinateProjection {
    /// Convert geographic coordinates (lat, lon) to projected (x, y) in meters.
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64);

    /// Convert projected coordinates (x, y) to geographic (lat, lon).
    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64);
}

/// UTM projection for a specific zone.
///
/// Series expansion after Snyder (1987), accurate to well under a metre
/// inside the zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjection {
    /// Central meridian in degrees
    central_meridian: f64,
    /// False northing in meters (0 north, 10,000,000 south)
    false_northing: f64,
    /// Zone number (1-60)
    zone: u8,
    /// Northern hemisphere flag
    northern: bool,
}

impl UtmProjection {
    const SCALE: f64 = 0.9996;
    const FALSE_EASTING: f64 = 500_000.0;

    /// Create a UTM projection for a given zone and hemisphere.
    pub fn new(zone: u8, northern: bool) -> Self {
        assert!((1..=60).contains(&zone), "UTM zone must be 1-60");
        Self {
            central_meridian: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            false_northing: if northern { 0.0 } else { 10_000_000.0 },
            zone,
            northern,
        }
    }

    /// Get the zone number.
    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// True for the northern hemisphere variant.
    pub fn is_northern(&self) -> bool {
        self.northern
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }
}

impl CoordinateProjection for UtmProjection {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlam = (lon - self.central_meridian).to_radians();

        let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
        let ep2 = e2 / (1.0 - e2);
        let (e4, e6) = (e2 * e2, e2 * e2 * e2);

        let n = WGS84_A / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let t = phi.tan().powi(2);
        let c = ep2 * phi.cos().powi(2);
        let a = dlam * phi.cos();

        // Meridian arc length
        let m = WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let x = Self::SCALE
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + Self::FALSE_EASTING;

        let y = Self::SCALE
            * (m + n
                * phi.tan()
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0))
            + self.false_northing;

        (x, y)
    }

    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - Self::FALSE_EASTING;
        let y = y - self.false_northing;

        let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let mu = (y / Self::SCALE)
            / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin2 = phi1.sin().powi(2);
        let n1 = WGS84_A / (1.0 - e2 * sin2).sqrt();
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        let t1 = phi1.tan().powi(2);
        let c1 = ep2 * phi1.cos().powi(2);
        let d = x / (n1 * Self::SCALE);

        let lat = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let dlam = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / phi1.cos();

        (lat.to_degrees(), self.central_meridian + dlam.to_degrees())
    }
}

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WebMercatorProjection;

impl WebMercatorProjection {
    /// Latitude limit where the projection becomes square.
    pub const MAX_LAT: f64 = 85.051_128_779_806_59;
}

impl CoordinateProjection for WebMercatorProjection {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = WGS84_A * lon.to_radians();
        let y = WGS84_A * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let lat = 2.0 * (y / WGS84_A).exp().atan() - FRAC_PI_2;
        let lon = x / WGS84_A;
        (lat.to_degrees(), lon.to_degrees())
    }
}

/// Mollweide equal-area projection (ESRI:54009), spherical form on the
/// WGS84 semi-major axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MollweideProjection;

impl MollweideProjection {
    const MAX_ITER: usize = 50;

    /// Solve 2θ + sin 2θ = π sin φ for the auxiliary angle θ.
    fn auxiliary_angle(phi: f64) -> f64 {
        if (phi.abs() - FRAC_PI_2).abs() < 1e-12 {
            return phi;
        }
        let target = PI * phi.sin();
        let mut theta = phi;
        for _ in 0..Self::MAX_ITER {
            let f = 2.0 * theta + (2.0 * theta).sin() - target;
            let df = 2.0 + 2.0 * (2.0 * theta).cos();
            if df.abs() < 1e-15 {
                break;
            }
            let step = f / df;
            theta -= step;
            if step.abs() < 1e-13 {
                break;
            }
        }
        theta
    }
}

impl CoordinateProjection for MollweideProjection {
    fn geo_to_xy(&self, lat: f64, lon: f64) -> (f64, f64) {
        let theta = Self::auxiliary_angle(lat.to_radians());
        let x = WGS84_A * 2.0 * SQRT_2 / PI * lon.to_radians() * theta.cos();
        let y = WGS84_A * SQRT_2 * theta.sin();
        (x, y)
    }

    fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let s = y / (WGS84_A * SQRT_2);
        if s.abs() > 1.0 {
            return (f64::NAN, f64::NAN);
        }
        let theta = s.asin();
        let phi = ((2.0 * theta + (2.0 * theta).sin()) / PI).clamp(-1.0, 1.0).asin();
        let cos_theta = theta.cos();
        let lam = if cos_theta.abs() < 1e-15 {
            0.0
        } else {
            PI * x / (2.0 * SQRT_2 * WGS84_A * cos_theta)
        };
        if lam.abs() > PI + 1e-9 {
            return (f64::NAN, f64::NAN);
        }
        (phi.to_degrees(), lam.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_zone_32n_bergen() {
        let proj = UtmProjection::new(32, true);

        // Bergen (60.39N, 5.32E), approximately 297000 E, 6700000 N
        let (x, y) = proj.geo_to_xy(60.39, 5.32);
        assert!((x - 297_000.0).abs() < 1000.0, "UTM easting for Bergen: {}", x);
        assert!((y - 6_700_000.0).abs() < 10_000.0, "UTM northing for Bergen: {}", y);

        let (lat, lon) = proj.xy_to_geo(x, y);
        assert!((lat - 60.39).abs() < 1e-6, "UTM lat roundtrip: {}", lat);
        assert!((lon - 5.32).abs() < 1e-6, "UTM lon roundtrip: {}", lon);
    }

    #[test]
    fn test_utm_southern_hemisphere() {
        let proj = UtmProjection::new(56, false);
        // Sydney sits near 334000 E, 6250000 N in zone 56S
        let (x, y) = proj.geo_to_xy(-33.87, 151.21);
        assert!((x - 334_000.0).abs() < 2_000.0, "easting {}", x);
        assert!((y - 6_250_000.0).abs() < 10_000.0, "northing {}", y);
    }

    #[test]
    fn test_web_mercator_known_values() {
        let proj = WebMercatorProjection;
        let (x, y) = proj.geo_to_xy(0.0, 180.0);
        assert!((x - 20_037_508.342_789).abs() < 1e-3);
        assert!(y.abs() < 1e-6);

        let (_, y) = proj.geo_to_xy(WebMercatorProjection::MAX_LAT, 0.0);
        assert!((y - 20_037_508.342_789).abs() < 1e-2);
    }

    #[test]
    fn test_mollweide_roundtrip_and_domain() {
        let proj = MollweideProjection;
        for (lat, lon) in [(0.0, 0.0), (45.0, -120.0), (-60.0, 170.0), (80.0, 10.0)] {
            let (x, y) = proj.geo_to_xy(lat, lon);
            let (lat2, lon2) = proj.xy_to_geo(x, y);
            assert!((lat - lat2).abs() < 1e-8, "lat {} -> {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-8, "lon {} -> {}", lon, lon2);
        }

        // Corner of the bounding square lies outside the ellipse
        let (lat, lon) = proj.xy_to_geo(17_000_000.0, 8_000_000.0);
        assert!(lat.is_nan() && lon.is_nan());
    }

    #[test]
    fn test_mollweide_pole() {
        let (x, y) = MollweideProjection.geo_to_xy(90.0, 45.0);
        assert!(x.abs() < 1e-6);
        assert!((y - WGS84_A * SQRT_2).abs() < 1e-6);
    }
}
