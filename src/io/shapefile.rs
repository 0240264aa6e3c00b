//! ESRI shapefile reader and writer.
//!
//! Reads `.shp/.shx/.dbf` triples into a [`VectorLayer`], taking the CRS from
//! the `.prj` sidecar when there is one. Writing produces the same set of
//! files, plus a `.prj` when the layer's CRS is known.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::record::EsriShape;
use shapefile::{PointM, PointZ, PolygonRing, Reader, Shape, Writer};
use tracing::{debug, info, warn};

use crate::crs::Crs;
use crate::error::FormatError;
use crate::vector::{AttributeValue, Feature, VectorLayer};

/// Longest field name a dBase table accepts.
const MAX_FIELD_NAME: usize = 10;
const TEXT_FIELD_WIDTH: u8 = 254;
const NUMERIC_FIELD_WIDTH: u8 = 20;
const NUMERIC_DECIMALS: u8 = 6;

/// Planar part of a shapefile point; measures and elevations are dropped.
trait PlanarPoint {
    fn coord(&self) -> Coord<f64>;
}

impl PlanarPoint for shapefile::Point {
    fn coord(&self) -> Coord<f64> {
        Coord { x: self.x, y: self.y }
    }
}

impl PlanarPoint for PointM {
    fn coord(&self) -> Coord<f64> {
        Coord { x: self.x, y: self.y }
    }
}

impl PlanarPoint for PointZ {
    fn coord(&self) -> Coord<f64> {
        Coord { x: self.x, y: self.y }
    }
}

fn coords<P: PlanarPoint>(points: &[P]) -> Vec<Coord<f64>> {
    points.iter().map(PlanarPoint::coord).collect()
}

fn multipoint<P: PlanarPoint>(points: &[P]) -> Geometry<f64> {
    Geometry::MultiPoint(MultiPoint::new(
        points.iter().map(|p| Point::from(p.coord())).collect(),
    ))
}

fn polyline<P: PlanarPoint>(parts: &[Vec<P>]) -> Option<Geometry<f64>> {
    let mut parts: Vec<LineString<f64>> = parts
        .iter()
        .map(|part| LineString::from(coords(part)))
        .collect();
    if parts.len() == 1 {
        parts.pop().map(Geometry::LineString)
    } else {
        Some(Geometry::MultiLineString(MultiLineString::new(parts)))
    }
}

/// Group rings into polygons; each inner ring joins the outer ring before it.
fn polygon_from_rings<P: PlanarPoint>(rings: &[PolygonRing<P>]) -> Option<Geometry<f64>> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let line = LineString::from(coords(ring.points()));
        match ring {
            PolygonRing::Outer(_) => polygons.push((line, Vec::new())),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(line),
                None => {
                    warn!("inner ring without an outer ring, reading it as outer");
                    polygons.push((line, Vec::new()));
                }
            },
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointM(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointZ(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::Multipoint(mp) => Some(multipoint(mp.points())),
        Shape::MultipointM(mp) => Some(multipoint(mp.points())),
        Shape::MultipointZ(mp) => Some(multipoint(mp.points())),
        Shape::Polyline(line) => polyline(line.parts()),
        Shape::PolylineM(line) => polyline(line.parts()),
        Shape::PolylineZ(line) => polyline(line.parts()),
        Shape::Polygon(polygon) => polygon_from_rings(polygon.rings()),
        Shape::PolygonM(polygon) => polygon_from_rings(polygon.rings()),
        Shape::PolygonZ(polygon) => polygon_from_rings(polygon.rings()),
        Shape::NullShape => None,
        other => {
            warn!(shape_type = ?other.shapetype(), "skipping unsupported shape type");
            None
        }
    }
}

fn field_to_attribute(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::Text(s.trim().to_string()),
        FieldValue::Numeric(Some(v)) => AttributeValue::Number(v),
        FieldValue::Float(Some(v)) => AttributeValue::Number(f64::from(v)),
        FieldValue::Double(v) => AttributeValue::Number(v),
        FieldValue::Integer(v) => AttributeValue::Number(f64::from(v)),
        FieldValue::Currency(v) => AttributeValue::Number(v),
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(b),
        FieldValue::Memo(s) => AttributeValue::Text(s),
        _ => AttributeValue::Null,
    }
}

/// Read the CRS from a `.prj` sidecar, if present and recognised.
fn read_prj(shp_path: &Path) -> Option<Crs> {
    let prj = shp_path.with_extension("prj");
    let wkt = match fs::read_to_string(&prj) {
        Ok(wkt) => wkt,
        Err(_) => {
            debug!(path = %prj.display(), "no .prj sidecar, CRS left unset");
            return None;
        }
    };
    match Crs::from_wkt(&wkt) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(path = %prj.display(), error = %e, "unrecognised .prj, CRS left unset");
            None
        }
    }
}

/// Load a shapefile as a vector layer.
///
/// Null and unsupported shapes are skipped with a warning. The layer is
/// named after the file stem.
pub fn read_shapefile<P: AsRef<Path>>(path: P) -> Result<VectorLayer, FormatError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FormatError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "shapefile not found"),
        ));
    }
    let mut reader = Reader::from_path(path)?;
    let mut features = Vec::new();
    let mut skipped = 0usize;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let Some(geometry) = shape_to_geometry(shape) else {
            skipped += 1;
            continue;
        };
        let attributes: BTreeMap<String, AttributeValue> = HashMap::<String, FieldValue>::from(record)
            .into_iter()
            .map(|(name, value)| (name, field_to_attribute(value)))
            .collect();
        features.push(Feature {
            geometry,
            attributes,
        });
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped null or unsupported shapes");
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let crs = read_prj(path);

    info!(
        path = %path.display(),
        features = features.len(),
        crs = %crate::crs::describe(crs),
        "loaded shapefile"
    );

    Ok(VectorLayer::new(name, features, crs))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind {
    Text,
    Number,
    Bool,
}

fn field_kind(layer: &VectorLayer, field: &str) -> FieldKind {
    let mut kind = None;
    for value in layer.values(field) {
        let this = match value {
            AttributeValue::Null => continue,
            AttributeValue::Number(_) => FieldKind::Number,
            AttributeValue::Bool(_) => FieldKind::Bool,
            AttributeValue::Text(_) => FieldKind::Text,
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => return FieldKind::Text,
            Some(_) => {}
        }
    }
    kind.unwrap_or(FieldKind::Text)
}

fn field_value(kind: FieldKind, value: &AttributeValue) -> FieldValue {
    match kind {
        FieldKind::Number => FieldValue::Numeric(value.as_f64()),
        FieldKind::Bool => FieldValue::Logical(match value {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }),
        FieldKind::Text => FieldValue::Character(value.as_text()),
    }
}

/// Character fields hold at most [`TEXT_FIELD_WIDTH`] bytes.
fn check_text_width(layer: &VectorLayer, field: &str) -> Result<(), FormatError> {
    for value in layer.values(field) {
        if let Some(text) = value.as_text() {
            if text.len() > usize::from(TEXT_FIELD_WIDTH) {
                return Err(FormatError::ValueTooLong {
                    field: field.to_string(),
                    len: text.len(),
                    max: usize::from(TEXT_FIELD_WIDTH),
                });
            }
        }
    }
    Ok(())
}

enum Shapes {
    Points(Vec<shapefile::Point>),
    Multipoints(Vec<shapefile::Multipoint>),
    Polylines(Vec<shapefile::Polyline>),
    Polygons(Vec<shapefile::Polygon>),
}

fn to_points(coords: impl Iterator<Item = Coord<f64>>) -> Vec<shapefile::Point> {
    coords.map(|c| shapefile::Point::new(c.x, c.y)).collect()
}

fn polygon_rings(polygon: &Polygon<f64>, rings: &mut Vec<PolygonRing<shapefile::Point>>) {
    rings.push(PolygonRing::Outer(to_points(polygon.exterior().coords().copied())));
    for hole in polygon.interiors() {
        rings.push(PolygonRing::Inner(to_points(hole.coords().copied())));
    }
}

fn mixed(index: usize) -> FormatError {
    FormatError::Unsupported(format!(
        "feature {index} differs in geometry type; shapefiles hold one type"
    ))
}

fn collect_shapes(layer: &VectorLayer) -> Result<Shapes, FormatError> {
    let first = layer
        .features
        .first()
        .ok_or_else(|| FormatError::Empty(format!("layer '{}' has no features", layer.name)))?;

    let mut shapes = match &first.geometry {
        Geometry::Point(_) => Shapes::Points(Vec::new()),
        Geometry::MultiPoint(_) => Shapes::Multipoints(Vec::new()),
        Geometry::LineString(_) | Geometry::MultiLineString(_) => Shapes::Polylines(Vec::new()),
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Shapes::Polygons(Vec::new()),
        other => {
            return Err(FormatError::Unsupported(format!(
                "writing {other:?} geometries"
            )))
        }
    };

    for (index, feature) in layer.features.iter().enumerate() {
        match (&mut shapes, &feature.geometry) {
            (Shapes::Points(out), Geometry::Point(p)) => out.push(shapefile::Point::new(p.x(), p.y())),
            (Shapes::Multipoints(out), Geometry::MultiPoint(mp)) => out.push(
                shapefile::Multipoint::new(to_points(mp.iter().map(|p| p.0))),
            ),
            (Shapes::Polylines(out), Geometry::LineString(line)) => out.push(
                shapefile::Polyline::new(to_points(line.coords().copied())),
            ),
            (Shapes::Polylines(out), Geometry::MultiLineString(lines)) => {
                out.push(shapefile::Polyline::with_parts(
                    lines
                        .iter()
                        .map(|l| to_points(l.coords().copied()))
                        .collect(),
                ))
            }
            (Shapes::Polygons(out), Geometry::Polygon(polygon)) => {
                let mut rings = Vec::new();
                polygon_rings(polygon, &mut rings);
                out.push(shapefile::Polygon::with_rings(rings));
            }
            (Shapes::Polygons(out), Geometry::MultiPolygon(polygons)) => {
                let mut rings = Vec::new();
                for polygon in polygons {
                    polygon_rings(polygon, &mut rings);
                }
                out.push(shapefile::Polygon::with_rings(rings));
            }
            _ => return Err(mixed(index)),
        }
    }

    Ok(shapes)
}

fn write_all<S: EsriShape>(
    mut writer: Writer<std::io::BufWriter<fs::File>>,
    shapes: &[S],
    records: &[Record],
) -> Result<(), FormatError> {
    for (shape, record) in shapes.iter().zip(records) {
        writer.write_shape_and_record(shape, record)?;
    }
    Ok(())
}

/// Write a layer as a shapefile.
///
/// All features must share one geometry family (points, multipoints, lines
/// or polygons). Attribute columns become character, numeric or logical
/// fields depending on their values; missing values are written as null.
pub fn write_shapefile<P: AsRef<Path>>(layer: &VectorLayer, path: P) -> Result<(), FormatError> {
    let path = path.as_ref();
    let fields = layer.field_names();

    let mut builder = TableWriterBuilder::new();
    let mut kinds = Vec::with_capacity(fields.len());
    for field in &fields {
        if field.len() > MAX_FIELD_NAME || !field.is_ascii() {
            return Err(FormatError::InvalidFieldName(field.clone()));
        }
        let name = FieldName::try_from(field.as_str())
            .map_err(|_| FormatError::InvalidFieldName(field.clone()))?;
        let kind = field_kind(layer, field);
        builder = match kind {
            FieldKind::Text => builder.add_character_field(name, TEXT_FIELD_WIDTH),
            FieldKind::Number => builder.add_numeric_field(name, NUMERIC_FIELD_WIDTH, NUMERIC_DECIMALS),
            FieldKind::Bool => builder.add_logical_field(name),
        };
        if kind == FieldKind::Text {
            check_text_width(layer, field)?;
        }
        kinds.push(kind);
    }

    let shapes = collect_shapes(layer)?;

    let records: Vec<Record> = layer
        .features
        .iter()
        .map(|feature| {
            let mut record = Record::default();
            for (field, kind) in fields.iter().zip(&kinds) {
                record.insert(field.clone(), field_value(*kind, feature.attribute(field)));
            }
            record
        })
        .collect();

    let writer = Writer::from_path(path, builder)?;
    match &shapes {
        Shapes::Points(s) => write_all(writer, s, &records)?,
        Shapes::Multipoints(s) => write_all(writer, s, &records)?,
        Shapes::Polylines(s) => write_all(writer, s, &records)?,
        Shapes::Polygons(s) => write_all(writer, s, &records)?,
    }

    if let Some(crs) = layer.crs {
        let prj = path.with_extension("prj");
        fs::write(&prj, crs.to_wkt()).map_err(|e| FormatError::io(&prj, e))?;
    }

    info!(path = %path.display(), features = layer.len(), "wrote shapefile");
    Ok(())
}
