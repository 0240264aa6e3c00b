//! Polygon masking of raster grids.
//!
//! A cell keeps its value when its centre lies inside, or on the edge of,
//! any polygon of the boundary layer. Every other cell becomes no data.

use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point, Rect};
use tracing::debug;

use super::cells;
use super::grid::RasterGrid;
use crate::crs::describe;
use crate::error::CrsError;
use crate::vector::VectorLayer;

struct Region {
    bounds: Rect<f64>,
    shape: MultiPolygon<f64>,
}

fn polygonal(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .iter()
                .filter_map(polygonal)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

fn regions(boundary: &VectorLayer) -> Vec<Region> {
    boundary
        .features
        .iter()
        .filter_map(|f| polygonal(&f.geometry))
        .filter_map(|shape| {
            shape
                .bounding_rect()
                .map(|bounds| Region { bounds, shape })
        })
        .collect()
}

/// Keep cells whose centre is inside the boundary polygons.
///
/// The grid and the boundary must share an explicit CRS. Non-polygonal
/// boundary features are ignored; a boundary with no polygons masks out
/// every cell.
pub fn mask(grid: &RasterGrid, boundary: &VectorLayer) -> Result<RasterGrid, CrsError> {
    let grid_crs = grid
        .crs()
        .ok_or_else(|| CrsError::Unset("raster".to_string()))?;
    let boundary_crs = boundary
        .crs
        .ok_or_else(|| CrsError::Unset(boundary.name.clone()))?;
    if grid_crs != boundary_crs {
        return Err(CrsError::Mismatch {
            left: describe(Some(grid_crs)),
            right: describe(Some(boundary_crs)),
        });
    }

    let regions = regions(boundary);
    debug!(
        regions = regions.len(),
        layer = boundary.name.as_str(),
        "masking raster by boundary"
    );

    let geometry = *grid.geometry();
    let values = grid.values();
    let masked = cells::build(values.len(), |i| {
        let value = values[i]?;
        let (row, col) = geometry.row_col(i);
        let (x, y) = geometry.cell_center(row, col);
        let centre = Point::new(x, y);
        let inside = regions.iter().any(|r| {
            x >= r.bounds.min().x
                && x <= r.bounds.max().x
                && y >= r.bounds.min().y
                && y <= r.bounds.max().y
                && r.shape.intersects(&centre)
        });
        inside.then_some(value)
    });

    Ok(RasterGrid::from_parts(geometry, masked))
}
