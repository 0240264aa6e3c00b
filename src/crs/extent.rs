//! Axis-aligned extents in CRS units.

use super::transform::CrsTransform;

/// Axis-aligned bounding extent in the units of its CRS.
///
/// For geographic data x is longitude and y is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Create a new extent.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest extent holding every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = (f64, f64)>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut extent = Self::new(x0, y0, x0, y0);
        for (x, y) in iter {
            extent.min_x = extent.min_x.min(x);
            extent.min_y = extent.min_y.min(y);
            extent.max_x = extent.max_x.max(x);
            extent.max_y = extent.max_y.max(y);
        }
        Some(extent)
    }

    /// Check if a point is within this extent (edges inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get the center of the extent as (x, y).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Expand the extent by a factor (1.1 = 10% expansion).
    pub fn expand(&self, factor: f64) -> Self {
        let x_margin = self.width() * (factor - 1.0) / 2.0;
        let y_margin = self.height() * (factor - 1.0) / 2.0;

        Self {
            min_x: self.min_x - x_margin,
            min_y: self.min_y - y_margin,
            max_x: self.max_x + x_margin,
            max_y: self.max_y + y_margin,
        }
    }

    /// Overlapping part of two extents, if any.
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        let out = Extent::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (out.min_x < out.max_x && out.min_y < out.max_y).then_some(out)
    }

    /// Transform the extent by sampling `densify` points along every edge.
    ///
    /// Straight edges bend under most projections, so corner-only transforms
    /// undershoot. Samples outside the target domain are skipped; `None` means
    /// no sample survived.
    pub fn transform(&self, transform: &CrsTransform, densify: usize) -> Option<Extent> {
        let n = densify.max(1);
        let mut samples = Vec::with_capacity(4 * (n + 1));
        for i in 0..=n {
            let t = i as f64 / n as f64;
            let x = self.min_x + t * self.width();
            let y = self.min_y + t * self.height();
            samples.push((x, self.min_y));
            samples.push((x, self.max_y));
            samples.push((self.min_x, y));
            samples.push((self.max_x, y));
        }
        Extent::from_points(
            samples
                .into_iter()
                .filter_map(|(x, y)| transform.transform(x, y)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_extent_basics() {
        let extent = Extent::new(8.0, 63.5, 9.5, 64.0);

        assert!(extent.contains(8.75, 63.75));
        assert!(extent.contains(8.0, 63.5));
        assert!(!extent.contains(8.75, 65.0));
        assert!(!extent.contains(10.0, 63.75));

        let (cx, cy) = extent.center();
        assert!((cx - 8.75).abs() < TOL);
        assert!((cy - 63.75).abs() < TOL);

        let expanded = extent.expand(1.1);
        assert!(expanded.min_x < extent.min_x);
        assert!(expanded.max_y > extent.max_y);
    }

    #[test]
    fn test_intersection() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, -5.0, 15.0, 5.0);
        assert_eq!(a.intersection(&b), Some(Extent::new(5.0, 0.0, 10.0, 5.0)));

        let c = Extent::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_transform_identity() {
        let extent = Extent::new(-10.0, -5.0, 10.0, 5.0);
        let t = CrsTransform::new(Crs::Geographic, Crs::Geographic).unwrap();
        let out = extent.transform(&t, 8).unwrap();
        assert!((out.min_x - extent.min_x).abs() < TOL);
        assert!((out.max_y - extent.max_y).abs() < TOL);
    }

    #[test]
    fn test_transform_to_mercator_is_symmetric() {
        let extent = Extent::new(-20.0, -10.0, 20.0, 10.0);
        let t = CrsTransform::new(Crs::Geographic, Crs::WebMercator).unwrap();
        let out = extent.transform(&t, 16).unwrap();
        assert!((out.min_x + out.max_x).abs() < 1e-6);
        assert!((out.min_y + out.max_y).abs() < 1e-6);
        assert!(out.max_x > 2_000_000.0);
    }
}
