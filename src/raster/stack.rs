//! Aligned multi-layer rasters, e.g. one SST grid per year.

use super::cells;
use super::grid::{GridGeometry, RasterGrid};
use crate::error::AlignmentError;

/// How cell statistics across layers treat no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Any no-data layer makes the result no data
    #[default]
    Propagate,
    /// Use the layers that have a value; no data only when all are missing
    Skip,
}

/// A non-empty stack of co-registered layers.
#[derive(Debug, Clone)]
pub struct RasterStack {
    layers: Vec<RasterGrid>,
}

impl RasterStack {
    /// Build a stack, checking every layer against the first.
    pub fn new(layers: Vec<RasterGrid>) -> Result<Self, AlignmentError> {
        let first = layers.first().ok_or(AlignmentError::EmptyStack)?;
        for layer in &layers[1..] {
            first.check_alignment(layer)?;
        }
        Ok(Self { layers })
    }

    /// Append a layer aligned with the existing ones.
    pub fn push(&mut self, layer: RasterGrid) -> Result<(), AlignmentError> {
        self.layers[0].check_alignment(&layer)?;
        self.layers.push(layer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[RasterGrid] {
        &self.layers
    }

    pub fn geometry(&self) -> &GridGeometry {
        self.layers[0].geometry()
    }

    /// Cell-wise mean across layers.
    pub fn mean(&self, policy: NoDataPolicy) -> RasterGrid {
        self.reduce(policy, |sum, n| sum / n as f64)
    }

    /// Cell-wise sum across layers.
    pub fn sum(&self, policy: NoDataPolicy) -> RasterGrid {
        self.reduce(policy, |sum, _| sum)
    }

    fn reduce<F>(&self, policy: NoDataPolicy, finish: F) -> RasterGrid
    where
        F: Fn(f64, usize) -> f64 + Sync + Send,
    {
        let geometry = *self.geometry();
        let values = cells::build(geometry.len(), |i| {
            let mut sum = 0.0;
            let mut n = 0usize;
            for layer in &self.layers {
                match layer.values()[i] {
                    Some(v) => {
                        sum += v;
                        n += 1;
                    }
                    None if policy == NoDataPolicy::Propagate => return None,
                    None => {}
                }
            }
            (n > 0).then(|| finish(sum, n))
        });
        RasterGrid::from_parts(geometry, values)
    }
}
