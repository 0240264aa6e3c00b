//! Point-in-polygon spatial join.
//!
//! Each point is matched to the polygon whose interior strictly contains it.
//! A point lying exactly on a polygon edge is not contained. When polygons
//! overlap, the caller must say what to do through [`OverlapPolicy`].

use std::collections::BTreeMap;

use geo::{BoundingRect, Centroid, Contains, Geometry, Point, Rect};
use tracing::{debug, info};

use super::layer::{AttributeValue, VectorLayer};
use crate::crs::describe;
use crate::error::{ConfigError, CrsError, SpatialError};

/// What to do when a point lies inside more than one polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The first containing polygon in layer order wins
    FirstMatch,
    /// Fail with [`SpatialError::AmbiguousJoin`]
    Reject,
}

/// Parameters of a join.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    /// Polygon attribute that identifies a region
    pub id_field: String,
    pub policy: OverlapPolicy,
}

impl JoinSpec {
    pub fn new(id_field: impl Into<String>, policy: OverlapPolicy) -> Self {
        Self {
            id_field: id_field.into(),
            policy,
        }
    }
}

/// A point record annotated with its enclosing polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    /// Index of the point in its layer
    pub point_index: usize,
    /// Index of the matched polygon, if any
    pub polygon_index: Option<usize>,
    /// Identifier of the matched polygon, if any
    pub group: Option<String>,
    /// The point's own attributes
    pub attributes: BTreeMap<String, AttributeValue>,
}

struct Candidate<'a> {
    index: usize,
    id: String,
    bounds: Rect<f64>,
    geometry: &'a Geometry<f64>,
}

fn strictly_contains(geometry: &Geometry<f64>, point: &Point<f64>) -> bool {
    match geometry {
        Geometry::Polygon(p) => p.contains(point),
        Geometry::MultiPolygon(mp) => mp.contains(point),
        Geometry::Rect(r) => r.to_polygon().contains(point),
        Geometry::Triangle(t) => t.to_polygon().contains(point),
        _ => false,
    }
}

fn in_rect(rect: &Rect<f64>, p: &Point<f64>) -> bool {
    p.x() >= rect.min().x && p.x() <= rect.max().x && p.y() >= rect.min().y && p.y() <= rect.max().y
}

/// Join every feature of `points` to the polygon of `polygons` containing it.
///
/// Both layers must carry the same explicit CRS. Non-point features are
/// represented by their centroid. The output has one record per input point,
/// in input order.
pub fn spatial_join(
    points: &VectorLayer,
    polygons: &VectorLayer,
    spec: &JoinSpec,
) -> Result<Vec<JoinedRecord>, SpatialError> {
    let point_crs = points
        .crs
        .ok_or_else(|| CrsError::Unset(points.name.clone()))?;
    let polygon_crs = polygons
        .crs
        .ok_or_else(|| CrsError::Unset(polygons.name.clone()))?;
    if point_crs != polygon_crs {
        return Err(CrsError::Mismatch {
            left: describe(points.crs),
            right: describe(polygons.crs),
        }
        .into());
    }

    let mut candidates = Vec::with_capacity(polygons.len());
    for (index, feature) in polygons.features.iter().enumerate() {
        let Some(bounds) = feature.geometry.bounding_rect() else {
            continue;
        };
        let id = feature.attribute(&spec.id_field).as_text().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "polygon {index} of '{}' has no '{}' attribute",
                polygons.name, spec.id_field
            ))
        })?;
        candidates.push(Candidate {
            index,
            id,
            bounds,
            geometry: &feature.geometry,
        });
    }

    let mut records = Vec::with_capacity(points.len());
    let mut matched = 0usize;

    for (point_index, feature) in points.features.iter().enumerate() {
        let location = match &feature.geometry {
            Geometry::Point(p) => Some(*p),
            other => other.centroid(),
        };

        let mut hit: Option<&Candidate> = None;
        if let Some(p) = location {
            let mut containing = candidates
                .iter()
                .filter(|c| in_rect(&c.bounds, &p) && strictly_contains(c.geometry, &p));
            hit = containing.next();
            if hit.is_some() && spec.policy == OverlapPolicy::Reject {
                let extra = containing.count();
                if extra > 0 {
                    return Err(SpatialError::AmbiguousJoin {
                        point: point_index,
                        candidates: extra + 1,
                    });
                }
            }
        }

        if hit.is_some() {
            matched += 1;
        } else {
            debug!(point = point_index, "point matched no polygon");
        }

        records.push(JoinedRecord {
            point_index,
            polygon_index: hit.map(|c| c.index),
            group: hit.map(|c| c.id.clone()),
            attributes: feature.attributes.clone(),
        });
    }

    info!(
        points = points.len(),
        polygons = polygons.len(),
        matched,
        unmatched = points.len() - matched,
        "spatial join complete"
    );

    Ok(records)
}
