//! Coordinate reference systems.
//!
//! A [`Crs`] names one of the systems this crate can transform between.
//! Every layer carries an `Option<Crs>`: `None` means the source never said,
//! and any cross-layer operation on such a layer fails with
//! [`CrsError::Unset`](crate::error::CrsError::Unset).
//!
//! # Supported systems
//!
//! | Crs                      | Code           | Units   |
//! |--------------------------|----------------|---------|
//! | `Geographic`             | EPSG:4326      | degrees |
//! | `WebMercator`            | EPSG:3857      | metres  |
//! | `Utm { zone, northern }` | EPSG:326zz/327zz | metres |
//! | `Mollweide`              | ESRI:54009     | metres  |

mod extent;
mod projection;
mod transform;
mod wkt;

use std::fmt;
use std::str::FromStr;

use crate::error::CrsError;

pub use extent::Extent;
pub use projection::{
    CoordinateProjection, MollweideProjection, UtmProjection, WebMercatorProjection, WGS84_A,
    WGS84_F,
};
pub use transform::CrsTransform;

/// Coordinate reference system identifier.
///
/// Deserializes from the `"AUTHORITY:CODE"` string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Crs {
    /// WGS84 longitude/latitude in degrees (EPSG:4326), x = lon, y = lat
    Geographic,
    /// Spherical Web Mercator (EPSG:3857)
    WebMercator,
    /// WGS84 / UTM
    Utm { zone: u8, northern: bool },
    /// World Mollweide (ESRI:54009)
    Mollweide,
}

impl Crs {
    pub const EPSG_WGS84: u32 = 4326;
    pub const EPSG_WEB_MERCATOR: u32 = 3857;
    pub const ESRI_MOLLWEIDE: u32 = 54009;

    /// Look up a CRS by numeric code.
    ///
    /// ESRI:54009 is accepted here as well because GeoTIFF key directories
    /// store it in the same slot as EPSG codes.
    pub fn from_epsg(code: u32) -> Result<Self, CrsError> {
        match code {
            Self::EPSG_WGS84 => Ok(Crs::Geographic),
            Self::EPSG_WEB_MERCATOR | 900_913 => Ok(Crs::WebMercator),
            Self::ESRI_MOLLWEIDE => Ok(Crs::Mollweide),
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                northern: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                northern: false,
            }),
            _ => Err(CrsError::Unsupported(format!("code {code}"))),
        }
    }

    /// Create a UTM CRS, validating the zone.
    pub fn utm(zone: u8, northern: bool) -> Result<Self, CrsError> {
        if (1..=60).contains(&zone) {
            Ok(Crs::Utm { zone, northern })
        } else {
            Err(CrsError::Unsupported(format!("UTM zone {zone}")))
        }
    }

    /// UTM zone containing a longitude.
    pub fn utm_for(lat: f64, lon: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64).rem_euclid(60) as u8 + 1;
        Crs::Utm {
            zone,
            northern: lat >= 0.0,
        }
    }

    /// Numeric authority code.
    pub fn code(&self) -> u32 {
        match *self {
            Crs::Geographic => Self::EPSG_WGS84,
            Crs::WebMercator => Self::EPSG_WEB_MERCATOR,
            Crs::Mollweide => Self::ESRI_MOLLWEIDE,
            Crs::Utm { zone, northern } => {
                if northern {
                    32600 + zone as u32
                } else {
                    32700 + zone as u32
                }
            }
        }
    }

    /// Authority that issued [`Crs::code`].
    pub fn authority(&self) -> &'static str {
        match self {
            Crs::Mollweide => "ESRI",
            _ => "EPSG",
        }
    }

    /// True when coordinates are degrees rather than metres.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Geographic)
    }

    /// Parse a WKT string (`.prj` sidecar contents).
    pub fn from_wkt(wkt: &str) -> Result<Self, CrsError> {
        wkt::parse_wkt(wkt)
    }

    /// ESRI-flavoured WKT suitable for a `.prj` sidecar.
    pub fn to_wkt(&self) -> String {
        wkt::to_wkt(self)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority(), self.code())
    }
}

impl FromStr for Crs {
    type Err = CrsError;

    /// Accepts `EPSG:4326`, `esri:54009` or a bare code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (authority, code) = match s.split_once(':') {
            Some((a, c)) => (a.trim().to_ascii_uppercase(), c.trim()),
            None => ("EPSG".to_string(), s),
        };
        let code: u32 = code
            .parse()
            .map_err(|_| CrsError::Unsupported(s.to_string()))?;
        let crs = Crs::from_epsg(code)?;
        if crs.authority() != authority {
            return Err(CrsError::Unsupported(s.to_string()));
        }
        Ok(crs)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Name used in error messages for an optional CRS.
pub(crate) fn describe(crs: Option<Crs>) -> String {
    crs.map_or_else(|| "<unset>".to_string(), |c| c.to_string())
}
