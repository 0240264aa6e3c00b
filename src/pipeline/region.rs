//! Region totals: how many people live in each region?

use tracing::info;

use crate::crs::Crs;
use crate::error::SpatialError;
use crate::vector::{
    attach_group_sums, reproject_layer, spatial_join, sum_by_group, GroupSum, JoinSpec,
    VectorLayer,
};

/// Parameters for [`region_totals`].
#[derive(Debug, Clone)]
pub struct RegionTotalsSpec {
    /// CRS both layers are projected to before joining
    pub target_crs: Crs,
    pub join: JoinSpec,
    /// Numeric point attribute to sum
    pub value_field: String,
    /// Region attribute that receives the totals
    pub output_field: String,
}

/// Result of [`region_totals`].
#[derive(Debug, Clone)]
pub struct RegionTotals {
    /// Regions in the target CRS, with the totals attached
    pub regions: VectorLayer,
    /// One entry per region that received at least one point
    pub sums: Vec<GroupSum>,
    /// Points that fell inside no region
    pub unmatched: usize,
}

impl RegionTotals {
    /// Sum over all groups.
    pub fn grand_total(&self) -> f64 {
        self.sums.iter().map(|s| s.sum).sum()
    }
}

/// Reproject, join and sum points per region.
pub fn region_totals(
    regions: &VectorLayer,
    points: &VectorLayer,
    spec: &RegionTotalsSpec,
) -> Result<RegionTotals, SpatialError> {
    let regions = reproject_layer(regions, spec.target_crs)?;
    let points = reproject_layer(points, spec.target_crs)?;

    let records = spatial_join(&points, &regions, &spec.join)?;
    let unmatched = records.iter().filter(|r| r.group.is_none()).count();
    let sums = sum_by_group(&records, &spec.value_field);
    let regions = attach_group_sums(&regions, &spec.join.id_field, &sums, &spec.output_field);

    let totals = RegionTotals {
        regions,
        sums,
        unmatched,
    };
    info!(
        groups = totals.sums.len(),
        unmatched,
        total = totals.grand_total(),
        crs = %spec.target_crs,
        "region totals computed"
    );
    Ok(totals)
}
