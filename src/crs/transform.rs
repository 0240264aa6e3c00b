//! Point transforms between two [`Crs`] values, routed through WGS84.

use super::projection::{
    CoordinateProjection, MollweideProjection, UtmProjection, WebMercatorProjection,
};
use super::{describe, Crs};
use crate::error::CrsError;

/// Planar side of a CRS; `Identity` means coordinates are already lon/lat.
#[derive(Debug, Clone, Copy)]
enum Planar {
    Identity,
    Utm(UtmProjection),
    WebMercator(WebMercatorProjection),
    Mollweide(MollweideProjection),
}

impl Planar {
    fn for_crs(crs: Crs) -> Result<Self, CrsError> {
        Ok(match crs {
            Crs::Geographic => Planar::Identity,
            Crs::WebMercator => Planar::WebMercator(WebMercatorProjection),
            Crs::Mollweide => Planar::Mollweide(MollweideProjection),
            Crs::Utm { zone, northern } => {
                Crs::utm(zone, northern)?;
                Planar::Utm(UtmProjection::new(zone, northern))
            }
        })
    }

    fn projection(&self) -> Option<&dyn CoordinateProjection> {
        match self {
            Planar::Identity => None,
            Planar::Utm(p) => Some(p as &dyn CoordinateProjection),
            Planar::WebMercator(p) => Some(p as &dyn CoordinateProjection),
            Planar::Mollweide(p) => Some(p as &dyn CoordinateProjection),
        }
    }

    /// Planar (x, y) to (lon, lat).
    fn to_lonlat(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (lon, lat) = match self.projection() {
            None => (x, y),
            Some(p) => {
                let (lat, lon) = p.xy_to_geo(x, y);
                (lon, lat)
            }
        };
        (lon.is_finite() && lat.is_finite() && lat.abs() <= 90.0).then_some((lon, lat))
    }

    /// (lon, lat) to planar (x, y).
    fn from_lonlat(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if lat.abs() > 90.0 {
            return None;
        }
        let (x, y) = match self {
            Planar::Identity => (lon, lat),
            Planar::WebMercator(p) => {
                if lat.abs() >= 90.0 {
                    return None;
                }
                p.geo_to_xy(lat, lon)
            }
            Planar::Utm(p) => p.geo_to_xy(lat, lon),
            Planar::Mollweide(p) => p.geo_to_xy(lat, wrap_longitude(lon)),
        };
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }
}

/// Fold a longitude into [-180, 180].
fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Reusable transform from one CRS to another.
///
/// # Example
///
/// ```ignore
/// use aquaspatial::crs::{Crs, CrsTransform};
///
/// let t = CrsTransform::new(Crs::Geographic, Crs::from_epsg(32633)?)?;
/// let (x, y) = t.transform(15.0, 52.0).unwrap();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CrsTransform {
    source: Crs,
    target: Crs,
    from: Planar,
    to: Planar,
}

impl CrsTransform {
    /// Create a transform between two known systems.
    ///
    /// Fails with [`CrsError::Unsupported`] for a UTM zone outside 1-60.
    pub fn new(source: Crs, target: Crs) -> Result<Self, CrsError> {
        Ok(Self {
            source,
            target,
            from: Planar::for_crs(source)?,
            to: Planar::for_crs(target)?,
        })
    }

    /// Create a transform from optional CRSs, failing when either is unset.
    ///
    /// `what` names the layer being transformed for the error message.
    pub fn between(
        source: Option<Crs>,
        target: Option<Crs>,
        what: &str,
    ) -> Result<Self, CrsError> {
        let source = source.ok_or_else(|| CrsError::Unset(what.to_string()))?;
        let target = target.ok_or_else(|| CrsError::Unset("target".to_string()))?;
        Self::new(source, target)
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    /// True when source and target are the same system.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// The transform in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            from: self.to,
            to: self.from,
        }
    }

    /// Transform one coordinate; `None` outside the valid domain.
    pub fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.is_identity() {
            return Some((x, y));
        }
        let (lon, lat) = self.from.to_lonlat(x, y)?;
        self.to.from_lonlat(lon, lat)
    }

    /// Like [`CrsTransform::transform`] but with an error naming the point.
    pub fn try_transform(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        self.transform(x, y).ok_or_else(|| CrsError::OutOfDomain {
            x,
            y,
            crs: describe(Some(self.target)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let t = CrsTransform::new(Crs::WebMercator, Crs::WebMercator).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.transform(1.0, 2.0), Some((1.0, 2.0)));
    }

    #[test]
    fn test_utm_to_mercator_roundtrip() {
        let utm = Crs::utm(33, true).unwrap();
        let forward = CrsTransform::new(utm, Crs::WebMercator).unwrap();
        let back = forward.inverse();

        let (x, y) = forward.transform(500_000.0, 5_760_000.0).unwrap();
        let (x2, y2) = back.transform(x, y).unwrap();
        assert!((x2 - 500_000.0).abs() < 0.05, "x {}", x2);
        assert!((y2 - 5_760_000.0).abs() < 0.05, "y {}", y2);
    }

    #[test]
    fn test_out_of_domain() {
        let t = CrsTransform::new(Crs::Mollweide, Crs::Geographic).unwrap();
        assert!(t.transform(17_000_000.0, 8_000_000.0).is_none());
        assert!(matches!(
            t.try_transform(17_000_000.0, 8_000_000.0),
            Err(CrsError::OutOfDomain { .. })
        ));

        let t = CrsTransform::new(Crs::Geographic, Crs::WebMercator).unwrap();
        assert!(t.transform(0.0, 90.0).is_none());
    }

    #[test]
    fn test_between_requires_both() {
        let err = CrsTransform::between(None, Some(Crs::Geographic), "cities").unwrap_err();
        assert_eq!(err, CrsError::Unset("cities".to_string()));
        assert!(CrsTransform::between(Some(Crs::Geographic), Some(Crs::Mollweide), "x").is_ok());
    }

    #[test]
    fn test_invalid_utm_zone_is_an_error() {
        let bad = Crs::Utm {
            zone: 61,
            northern: true,
        };
        assert!(matches!(
            CrsTransform::new(Crs::Geographic, bad),
            Err(CrsError::Unsupported(_))
        ));
        assert!(matches!(
            CrsTransform::between(Some(Crs::Utm { zone: 0, northern: false }), Some(Crs::Geographic), "x"),
            Err(CrsError::Unsupported(_))
        ));
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(10.0), 10.0);
        assert!((wrap_longitude(190.0) + 170.0).abs() < 1e-12);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-12);
    }
}
