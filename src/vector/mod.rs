//! Vector data: feature layers, reprojection, spatial join and aggregation.
//!
//! # Example
//!
//! ```ignore
//! use aquaspatial::crs::Crs;
//! use aquaspatial::vector::{spatial_join, sum_by_group, JoinSpec, OverlapPolicy};
//!
//! let records = spatial_join(&cities, &regions, &JoinSpec::new("name", OverlapPolicy::FirstMatch))?;
//! for group in sum_by_group(&records, "population") {
//!     println!("{}: {}", group.group, group.sum);
//! }
//! ```

mod aggregate;
mod join;
mod layer;
mod reproject;

pub use aggregate::{attach_group_sums, sum_by_group, GroupSum};
pub use join::{spatial_join, JoinSpec, JoinedRecord, OverlapPolicy};
pub use layer::{AttributeValue, Feature, VectorLayer};
pub use reproject::reproject_layer;
