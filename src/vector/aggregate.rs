//! Group-by-key sums over joined records.

use std::collections::BTreeMap;

use tracing::debug;

use super::join::JoinedRecord;
use super::layer::{AttributeValue, Feature, VectorLayer};

/// Sum of one field over all records sharing a group key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSum {
    pub group: String,
    pub sum: f64,
    /// Number of records that contributed a numeric value
    pub count: usize,
}

/// Sum `value_field` per group.
///
/// Records without a group (unmatched points) are dropped, as are
/// non-numeric values. Groups are returned in ascending key order; a group
/// only appears if at least one record contributed to it.
pub fn sum_by_group(records: &[JoinedRecord], value_field: &str) -> Vec<GroupSum> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(group) = record.group.as_deref() else {
            continue;
        };
        match record.attributes.get(value_field).and_then(AttributeValue::as_f64) {
            Some(value) => {
                let entry = sums.entry(group).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, field = value_field, "records without a numeric value");
    }

    sums.into_iter()
        .map(|(group, (sum, count))| GroupSum {
            group: group.to_string(),
            sum,
            count,
        })
        .collect()
}

/// Left-join group sums back onto the polygon layer.
///
/// Every polygon is kept. Polygons whose `id_field` matches a group get the
/// sum in `out_field`; the rest get `Null`, never zero.
pub fn attach_group_sums(
    polygons: &VectorLayer,
    id_field: &str,
    sums: &[GroupSum],
    out_field: &str,
) -> VectorLayer {
    let lookup: BTreeMap<&str, f64> = sums.iter().map(|s| (s.group.as_str(), s.sum)).collect();

    let features = polygons
        .features
        .iter()
        .map(|f| {
            let value = f
                .attribute(id_field)
                .as_text()
                .and_then(|id| lookup.get(id.as_str()).copied())
                .map_or(AttributeValue::Null, AttributeValue::Number);
            let mut out = Feature {
                geometry: f.geometry.clone(),
                attributes: f.attributes.clone(),
            };
            out.attributes.insert(out_field.to_string(), value);
            out
        })
        .collect();

    VectorLayer::new(polygons.name.clone(), features, polygons.crs)
}
