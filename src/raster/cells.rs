//! Per-cell loops, data-parallel with the `parallel` feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build `len` cells from a function of the cell index.
#[cfg(feature = "parallel")]
pub(crate) fn build<F>(len: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(usize) -> Option<f64> + Sync + Send,
{
    (0..len).into_par_iter().map(f).collect()
}

/// Build `len` cells from a function of the cell index.
#[cfg(not(feature = "parallel"))]
pub(crate) fn build<F>(len: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(usize) -> Option<f64> + Sync + Send,
{
    (0..len).map(f).collect()
}

/// Apply `f` to every cell.
pub(crate) fn map<F>(values: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(Option<f64>) -> Option<f64> + Sync + Send,
{
    build(values.len(), |i| f(values[i]))
}

/// Apply `f` to matching cells of two equally sized slices.
pub(crate) fn zip<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(Option<f64>, Option<f64>) -> Option<f64> + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());
    build(a.len(), |i| f(a[i], b[i]))
}
