//! Minimal WKT support for `.prj` sidecar files.
//!
//! Only recognition is needed, not a general WKT parser: an authority code
//! on the root node wins, otherwise the root name is matched against the
//! ESRI and OGC spellings of the supported systems.

use super::Crs;
use crate::error::CrsError;

const GEOGCS_WGS84: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

pub(super) fn to_wkt(crs: &Crs) -> String {
    match *crs {
        Crs::Geographic => GEOGCS_WGS84.to_string(),
        Crs::WebMercator => format!(
            "PROJCS[\"WGS_1984_Web_Mercator_Auxiliary_Sphere\",{GEOGCS_WGS84},\
PROJECTION[\"Mercator_Auxiliary_Sphere\"],PARAMETER[\"False_Easting\",0.0],\
PARAMETER[\"False_Northing\",0.0],PARAMETER[\"Central_Meridian\",0.0],\
PARAMETER[\"Standard_Parallel_1\",0.0],PARAMETER[\"Auxiliary_Sphere_Type\",0.0],\
UNIT[\"Meter\",1.0]]"
        ),
        Crs::Mollweide => format!(
            "PROJCS[\"World_Mollweide\",{GEOGCS_WGS84},PROJECTION[\"Mollweide\"],\
PARAMETER[\"False_Easting\",0.0],PARAMETER[\"False_Northing\",0.0],\
PARAMETER[\"Central_Meridian\",0.0],UNIT[\"Meter\",1.0]]"
        ),
        Crs::Utm { zone, northern } => {
            let hemisphere = if northern { 'N' } else { 'S' };
            let false_northing = if northern { 0.0 } else { 10_000_000.0 };
            let central_meridian = (zone as f64 - 1.0) * 6.0 - 177.0;
            format!(
                "PROJCS[\"WGS_1984_UTM_Zone_{zone}{hemisphere}\",{GEOGCS_WGS84},\
PROJECTION[\"Transverse_Mercator\"],PARAMETER[\"False_Easting\",500000.0],\
PARAMETER[\"False_Northing\",{false_northing:.1}],\
PARAMETER[\"Central_Meridian\",{central_meridian:.1}],\
PARAMETER[\"Scale_Factor\",0.9996],PARAMETER[\"Latitude_Of_Origin\",0.0],\
UNIT[\"Meter\",1.0]]"
            )
        }
    }
}

pub(super) fn parse_wkt(wkt: &str) -> Result<Crs, CrsError> {
    let wkt = wkt.trim();
    let unsupported = || CrsError::Unsupported(truncate(wkt));

    let root_name = root_name(wkt).ok_or_else(unsupported)?;

    // OGC WKT1 puts the root AUTHORITY last
    if let Some(code) = root_authority(wkt) {
        if let Ok(crs) = Crs::from_epsg(code) {
            return Ok(crs);
        }
    }

    let name = root_name.to_ascii_lowercase().replace(' ', "_");
    let is_projected = wkt.starts_with("PROJCS") || wkt.starts_with("PROJCRS");

    if !is_projected {
        if name.contains("wgs_1984") || name.contains("wgs_84") || name.contains("wgs84") {
            return Ok(Crs::Geographic);
        }
        return Err(unsupported());
    }

    if let Some(rest) = name.split("utm_zone_").nth(1) {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let zone: u8 = digits.parse().map_err(|_| unsupported())?;
        let northern = !rest[digits.len()..].starts_with('s');
        return Crs::utm(zone, northern);
    }
    if name.contains("mollweide") {
        return Ok(Crs::Mollweide);
    }
    if name.contains("web_mercator") || name.contains("pseudo-mercator") {
        return Ok(Crs::WebMercator);
    }
    Err(unsupported())
}

/// Quoted name of the root node, e.g. `WGS_1984_UTM_Zone_33N`.
fn root_name(wkt: &str) -> Option<&str> {
    let start = wkt.find("[\"")? + 2;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}

/// Code of an `AUTHORITY["EPSG","n"]` or `ID["EPSG",n]` directly under the root.
fn root_authority(wkt: &str) -> Option<u32> {
    let mut depth = 0usize;
    let bytes = wkt.as_bytes();
    let mut last = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            _ => {
                if depth == 1 && wkt.is_char_boundary(i) {
                    let rest = &wkt[i..];
                    if rest.starts_with("AUTHORITY[") || rest.starts_with("ID[") {
                        last = Some(i);
                    }
                }
            }
        }
    }
    let rest = &wkt[last?..];
    let body = &rest[rest.find('[')? + 1..rest.find(']')?];
    let mut parts = body.split(',').map(|p| p.trim().trim_matches('"'));
    let authority = parts.next()?;
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn truncate(s: &str) -> String {
    s.chars().take(60).collect()
}
