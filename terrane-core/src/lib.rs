//! Core domain types for the Terrane layer store.
//!
//! A layer is a named container of geometries sharing one attribute schema
//! and an optional coordinate reference system. These types stay free of any
//! file format: datasets arrive through [`FeatureDataset`] and persistence goes
//! through [`LayerStore`].

use geo::Geometry;

mod attribute;
mod crs;
mod dataset;
mod geometry;
mod layer;
mod schema;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use attribute::AttributeValue;
pub use crs::CoordinateReferenceSystem;
pub use dataset::{
    AttributeReadError, AttributeRecord, FeatureDataset, FeatureStreams, GeometryRecord,
    ShapeDecodeError,
};
pub use geometry::{GeometryFactory, PrecisionModel, PrecisionModelError, is_empty_geometry};
pub use layer::{Layer, LayerId};
pub use schema::merge_field_names;
pub use store::{LayerSession, LayerStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::{SCHEMA_VERSION, SqliteLayerStore};

/// One logical record: a geometry and its positionally aligned attributes.
///
/// # Examples
///
/// ```
/// use geo::{Geometry, Point};
/// use terrane_core::{AttributeValue, Feature};
///
/// let feature = Feature::new(
///     Geometry::Point(Point::new(1.0, 2.0)),
///     vec!["name".into()],
///     vec![AttributeValue::Text("Well".into())],
/// );
/// assert_eq!(feature.value("name"), Some(&AttributeValue::Text("Well".into())));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Decoded geometry.
    pub geometry: Geometry<f64>,
    /// Attribute names in source order.
    pub field_names: Vec<String>,
    /// Attribute values aligned with `field_names`.
    pub values: Vec<AttributeValue>,
}

impl Feature {
    /// Construct a feature from its parts.
    #[must_use]
    pub const fn new(
        geometry: Geometry<f64>,
        field_names: Vec<String>,
        values: Vec<AttributeValue>,
    ) -> Self {
        Self {
            geometry,
            field_names,
            values,
        }
    }

    /// Look up the value stored under `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        self.field_names
            .iter()
            .position(|field| field == name)
            .and_then(|index| self.values.get(index))
    }
}
