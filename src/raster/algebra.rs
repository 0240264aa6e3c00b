//! Cell-wise raster algebra: reclassification and two-grid combination.

use super::cells;
use super::grid::RasterGrid;
use crate::error::{AlignmentError, ConfigError};

/// One half-open interval `[lo, hi)` and the value it maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReclassRule {
    pub lo: f64,
    pub hi: f64,
    /// `None` maps the interval to no data
    pub code: Option<f64>,
}

impl ReclassRule {
    pub fn new(lo: f64, hi: f64, code: Option<f64>) -> Self {
        Self { lo, hi, code }
    }

    #[inline]
    fn covers(&self, value: f64) -> bool {
        value >= self.lo && value < self.hi
    }
}

/// Validated, ascending set of non-overlapping intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct ReclassTable {
    rules: Vec<ReclassRule>,
}

impl ReclassTable {
    /// Build a table from rules in ascending order.
    ///
    /// Every rule needs `lo < hi`, and each interval must start at or after
    /// the end of the previous one. Gaps are allowed; values that fall in a
    /// gap become no data.
    pub fn new(rules: Vec<ReclassRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::InvalidBreakpoints(
                "table has no intervals".to_string(),
            ));
        }
        for (i, rule) in rules.iter().enumerate() {
            if rule.lo.is_nan() || rule.hi.is_nan() || !(rule.lo < rule.hi) {
                return Err(ConfigError::InvalidBreakpoints(format!(
                    "interval {i} [{}, {}) is empty or undefined",
                    rule.lo, rule.hi
                )));
            }
            if rule.code.is_some_and(|c| !c.is_finite()) {
                return Err(ConfigError::InvalidBreakpoints(format!(
                    "interval {i} maps to a non-finite code"
                )));
            }
        }
        for (i, pair) in rules.windows(2).enumerate() {
            if pair[1].lo < pair[0].hi {
                return Err(ConfigError::InvalidBreakpoints(format!(
                    "interval {} [{}, {}) overlaps or precedes [{}, {})",
                    i + 1,
                    pair[1].lo,
                    pair[1].hi,
                    pair[0].lo,
                    pair[0].hi
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Keep `[lo, hi)` as `code`, everything else becomes no data.
    pub fn window(lo: f64, hi: f64, code: f64) -> Result<Self, ConfigError> {
        Self::new(vec![
            ReclassRule::new(f64::NEG_INFINITY, lo, None),
            ReclassRule::new(lo, hi, Some(code)),
            ReclassRule::new(hi, f64::INFINITY, None),
        ])
    }

    pub fn rules(&self) -> &[ReclassRule] {
        &self.rules
    }

    /// Code for a single value, `None` when no interval covers it.
    pub fn lookup(&self, value: f64) -> Option<f64> {
        // First rule whose upper bound lies above the value
        let i = self.rules.partition_point(|r| r.hi <= value);
        self.rules
            .get(i)
            .filter(|r| r.covers(value))
            .and_then(|r| r.code)
    }
}

/// Map every present cell through `table`.
///
/// No data stays no data; values outside every interval become no data.
pub fn reclassify(grid: &RasterGrid, table: &ReclassTable) -> RasterGrid {
    let values = cells::map(grid.values(), |v| v.and_then(|x| table.lookup(x)));
    RasterGrid::from_parts(*grid.geometry(), values)
}

/// Binary cell operators for [`combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Add,
    Subtract,
    Multiply,
    /// Division by zero gives no data
    Divide,
    Min,
    Max,
}

impl CombineOp {
    /// Apply the operator to two present values.
    pub fn apply(self, a: f64, b: f64) -> Option<f64> {
        let out = match self {
            CombineOp::Add => a + b,
            CombineOp::Subtract => a - b,
            CombineOp::Multiply => a * b,
            CombineOp::Divide => {
                if b == 0.0 {
                    return None;
                }
                a / b
            }
            CombineOp::Min => a.min(b),
            CombineOp::Max => a.max(b),
        };
        out.is_finite().then_some(out)
    }
}

/// Combine two aligned grids cell by cell.
///
/// No data in either input gives no data. Grids must share CRS, extent and
/// resolution; nothing is resampled here.
pub fn combine(a: &RasterGrid, b: &RasterGrid, op: CombineOp) -> Result<RasterGrid, AlignmentError> {
    a.check_alignment(b)?;
    let values = cells::zip(a.values(), b.values(), |x, y| match (x, y) {
        (Some(x), Some(y)) => op.apply(x, y),
        _ => None,
    });
    Ok(RasterGrid::from_parts(*a.geometry(), values))
}

/// Combine two aligned grids with an arbitrary cell function.
///
/// Unlike [`combine`], `f` sees no-data cells and decides what they mean.
pub fn combine_with<F>(a: &RasterGrid, b: &RasterGrid, f: F) -> Result<RasterGrid, AlignmentError>
where
    F: Fn(Option<f64>, Option<f64>) -> Option<f64> + Sync + Send,
{
    a.check_alignment(b)?;
    let values = cells::zip(a.values(), b.values(), |x, y| f(x, y).filter(|v| v.is_finite()));
    Ok(RasterGrid::from_parts(*a.geometry(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use crate::raster::GridGeometry;

    fn grid(values: Vec<Option<f64>>) -> RasterGrid {
        let geometry =
            GridGeometry::new(0.0, 1.0, 1.0, 1.0, values.len(), 1, Some(Crs::Geographic)).unwrap();
        RasterGrid::new(geometry, values).unwrap()
    }

    #[test]
    fn test_window_reclassification() {
        let table = ReclassTable::window(12.0, 18.0, 1.0).unwrap();
        let out = reclassify(&grid(vec![Some(5.0), Some(15.0), Some(20.0)]), &table);
        assert_eq!(out.values(), &[None, Some(1.0), None]);
    }

    #[test]
    fn test_intervals_are_half_open() {
        let table = ReclassTable::window(12.0, 18.0, 1.0).unwrap();
        assert_eq!(table.lookup(12.0), Some(1.0));
        assert_eq!(table.lookup(18.0), None);
        assert_eq!(table.lookup(17.999), Some(1.0));
    }

    #[test]
    fn test_gaps_become_nodata() {
        let table = ReclassTable::new(vec![
            ReclassRule::new(0.0, 1.0, Some(10.0)),
            ReclassRule::new(2.0, 3.0, Some(20.0)),
        ])
        .unwrap();
        assert_eq!(table.lookup(0.5), Some(10.0));
        assert_eq!(table.lookup(1.5), None);
        assert_eq!(table.lookup(2.0), Some(20.0));
        assert_eq!(table.lookup(-1.0), None);
        assert_eq!(table.lookup(5.0), None);
    }

    #[test]
    fn test_invalid_breakpoints() {
        assert!(matches!(
            ReclassTable::new(vec![]),
            Err(ConfigError::InvalidBreakpoints(_))
        ));
        assert!(ReclassTable::window(18.0, 12.0, 1.0).is_err());
        assert!(ReclassTable::window(f64::NAN, 12.0, 1.0).is_err());
        assert!(ReclassTable::new(vec![
            ReclassRule::new(0.0, 5.0, None),
            ReclassRule::new(4.0, 8.0, Some(1.0)),
        ])
        .is_err());
    }

    #[test]
    fn test_combine_ops() {
        let a = grid(vec![Some(6.0), Some(1.0), None]);
        let b = grid(vec![Some(3.0), Some(0.0), Some(2.0)]);

        let sum = combine(&a, &b, CombineOp::Add).unwrap();
        assert_eq!(sum.values(), &[Some(9.0), Some(1.0), None]);

        let quotient = combine(&a, &b, CombineOp::Divide).unwrap();
        assert_eq!(quotient.values(), &[Some(2.0), None, None]);

        let max = combine(&a, &b, CombineOp::Max).unwrap();
        assert_eq!(max.values(), &[Some(6.0), Some(1.0), None]);
    }

    #[test]
    fn test_combine_with_sees_nodata() {
        let a = grid(vec![Some(1.0), None]);
        let b = grid(vec![None, None]);
        let filled = combine_with(&a, &b, |x, y| Some(x.unwrap_or(0.0) + y.unwrap_or(0.0))).unwrap();
        assert_eq!(filled.values(), &[Some(1.0), Some(0.0)]);
    }

    #[test]
    fn test_combine_rejects_misaligned() {
        let a = grid(vec![Some(1.0); 3]);
        let b = grid(vec![Some(1.0); 2]);
        assert!(matches!(
            combine(&a, &b, CombineOp::Multiply),
            Err(AlignmentError::Dimensions { .. })
        ));
    }
}
