//! Feature collections with attributes and an optional CRS.

use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, Geometry};

use crate::crs::{Crs, Extent};

/// One attribute value of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl AttributeValue {
    /// Numeric view, if the value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view; numbers and booleans are formatted.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(s) => Some(s.clone()),
            AttributeValue::Number(v) => Some(format_number(*v)),
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Integers print without a trailing `.0` so numeric ids read naturally.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NA"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

static NULL_ATTRIBUTE: AttributeValue = AttributeValue::Null;

/// A geometry plus its attribute record.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Attribute by name; absent attributes read as `Null`.
    pub fn attribute(&self, name: &str) -> &AttributeValue {
        self.attributes.get(name).unwrap_or(&NULL_ATTRIBUTE)
    }
}

/// A collection of features sharing one CRS.
///
/// Selecting attributes never drops the geometry: a feature always keeps
/// its shape, whatever columns are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    /// Layer name, used in logs and error messages
    pub name: String,
    pub features: Vec<Feature>,
    /// `None` when the source did not declare a CRS
    pub crs: Option<Crs>,
}

impl VectorLayer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>, crs: Option<Crs>) -> Self {
        Self {
            name: name.into(),
            features,
            crs,
        }
    }

    /// Declare the CRS of a layer whose source did not carry one.
    ///
    /// This only labels the coordinates; use
    /// [`reproject_layer`](crate::vector::reproject_layer) to move them.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Union of attribute names over all features, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.attributes.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Keep only the named attributes.
    pub fn select(&self, fields: &[&str]) -> VectorLayer {
        let features = self
            .features
            .iter()
            .map(|f| Feature {
                geometry: f.geometry.clone(),
                attributes: f
                    .attributes
                    .iter()
                    .filter(|(k, _)| fields.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();
        VectorLayer::new(self.name.clone(), features, self.crs)
    }

    /// Keep features matching a predicate.
    pub fn filter<F: Fn(&Feature) -> bool>(&self, predicate: F) -> VectorLayer {
        let features = self
            .features
            .iter()
            .filter(|f| predicate(f))
            .cloned()
            .collect();
        VectorLayer::new(self.name.clone(), features, self.crs)
    }

    /// Values of one attribute, in feature order.
    pub fn values(&self, field: &str) -> Vec<&AttributeValue> {
        self.features.iter().map(|f| f.attribute(field)).collect()
    }

    /// Extent covering every geometry, or `None` for an empty layer.
    pub fn bounding_extent(&self) -> Option<Extent> {
        let corners = self
            .features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .flat_map(|r| [(r.min().x, r.min().y), (r.max().x, r.max().y)]);
        Extent::from_points(corners)
    }
}
