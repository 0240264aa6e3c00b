//! Exact coordinate-wise reprojection of vector layers.

use geo::{Coord, MapCoords};
use tracing::debug;

use super::layer::{Feature, VectorLayer};
use crate::crs::{Crs, CrsTransform};
use crate::error::CrsError;

/// Reproject every coordinate of a layer into `target`.
///
/// Fails with [`CrsError::Unset`] when the layer has no CRS and with
/// [`CrsError::OutOfDomain`] when a vertex cannot be represented in the
/// target system.
pub fn reproject_layer(layer: &VectorLayer, target: Crs) -> Result<VectorLayer, CrsError> {
    let transform = CrsTransform::between(layer.crs, Some(target), &layer.name)?;
    if transform.is_identity() {
        return Ok(layer.clone());
    }

    debug!(
        layer = %layer.name,
        from = %transform.source(),
        to = %target,
        features = layer.len(),
        "reprojecting layer"
    );

    let t = &transform;
    let features = layer
        .features
        .iter()
        .map(|f| {
            let geometry = f.geometry.try_map_coords(|c: Coord<f64>| {
                t.try_transform(c.x, c.y).map(|(x, y)| Coord { x, y })
            })?;
            Ok(Feature {
                geometry,
                attributes: f.attributes.clone(),
            })
        })
        .collect::<Result<Vec<_>, CrsError>>()?;

    Ok(VectorLayer::new(layer.name.clone(), features, Some(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, Geometry};

    fn coords(geometry: &Geometry<f64>) -> Vec<(f64, f64)> {
        use geo::CoordsIter;
        geometry.coords_iter().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn test_unset_crs_is_rejected() {
        let layer = VectorLayer::new("cities", vec![Feature::new(point!(x: 1.0, y: 1.0))], None);
        assert_eq!(
            reproject_layer(&layer, Crs::Mollweide).unwrap_err(),
            CrsError::Unset("cities".to_string())
        );
    }

    #[test]
    fn test_roundtrip_through_utm() {
        let poly = polygon![
            (x: 14.0, y: 52.0),
            (x: 16.0, y: 52.0),
            (x: 16.0, y: 54.0),
            (x: 14.0, y: 52.0),
        ];
        let layer = VectorLayer::new(
            "box",
            vec![Feature::new(poly).with_attribute("id", "a")],
            Some(Crs::Geographic),
        );

        let utm = Crs::utm(33, true).unwrap();
        let there = reproject_layer(&layer, utm).unwrap();
        assert_eq!(there.crs, Some(utm));
        assert_eq!(there.features[0].attribute("id").as_text().as_deref(), Some("a"));

        let back = reproject_layer(&there, Crs::Geographic).unwrap();
        for (a, b) in coords(&layer.features[0].geometry)
            .into_iter()
            .zip(coords(&back.features[0].geometry))
        {
            assert!((a.0 - b.0).abs() < 1e-7, "{:?} vs {:?}", a, b);
            assert!((a.1 - b.1).abs() < 1e-7, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_out_of_domain_vertex() {
        let layer = VectorLayer::new(
            "pole",
            vec![Feature::new(point!(x: 0.0, y: 90.0))],
            Some(Crs::Geographic),
        );
        assert!(matches!(
            reproject_layer(&layer, Crs::WebMercator),
            Err(CrsError::OutOfDomain { .. })
        ));
    }
}
