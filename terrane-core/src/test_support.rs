//! In-memory store and dataset doubles used by unit and behaviour tests.

use std::collections::BTreeMap;

use geo::{Geometry, GeometryCollection};

use crate::{
    AttributeReadError, AttributeRecord, AttributeValue, CoordinateReferenceSystem, Feature,
    FeatureDataset, FeatureStreams, GeometryFactory, GeometryRecord, Layer, LayerId,
    LayerSession, LayerStore, ShapeDecodeError, StoreError, merge_field_names,
};

/// Store operation recorded by [`MemoryLayerStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A layer was created.
    CreateLayer {
        /// Layer name.
        name: String,
    },
    /// A coordinate reference system was assigned.
    SetCoordinateReferenceSystem {
        /// Layer name.
        layer: String,
        /// Assigned WKT.
        wkt: String,
    },
    /// Property names were merged into a layer schema.
    MergeSchema {
        /// Layer name.
        layer: String,
        /// Names offered for merging.
        names: Vec<String>,
    },
    /// A feature was appended.
    Add {
        /// Layer name.
        layer: String,
    },
}

/// Operations performed inside one transaction and how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// `true` when the transaction committed.
    pub committed: bool,
    /// Operations in call order.
    pub operations: Vec<Operation>,
}

impl TransactionRecord {
    /// Number of features appended by this transaction.
    #[must_use]
    pub fn added(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Add { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i64,
    layers: BTreeMap<String, Layer>,
    features: BTreeMap<String, Vec<Feature>>,
}

/// Layer store held entirely in memory.
///
/// Each transaction works on a copy of the committed state and swaps it in
/// only on commit. Every transaction is journalled so tests can assert on
/// batch boundaries.
#[derive(Debug, Default)]
pub struct MemoryLayerStore {
    state: MemoryState,
    transactions: Vec<TransactionRecord>,
}

impl MemoryLayerStore {
    /// Committed snapshot of layer `name`.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.state.layers.get(name)
    }

    /// Names of committed layers, sorted.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&str> {
        self.state.layers.keys().map(String::as_str).collect()
    }

    /// Committed features of layer `name`, in insertion order.
    #[must_use]
    pub fn features(&self, name: &str) -> &[Feature] {
        self.state
            .features
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Journal of every finished transaction.
    #[must_use]
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    /// Committed transactions that appended at least one feature.
    pub fn feature_batches(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.transactions
            .iter()
            .filter(|record| record.committed && record.added() > 0)
    }
}

impl LayerStore for MemoryLayerStore {
    fn run_in_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LayerSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut session = MemorySession {
            state: self.state.clone(),
            operations: Vec::new(),
        };
        let outcome = work(&mut session);
        let committed = outcome.is_ok();
        if committed {
            self.state = session.state;
        }
        self.transactions.push(TransactionRecord {
            committed,
            operations: session.operations,
        });
        outcome
    }
}

struct MemorySession {
    state: MemoryState,
    operations: Vec<Operation>,
}

impl MemorySession {
    fn layer_mut(&mut self, name: &str) -> Result<&mut Layer, StoreError> {
        self.state
            .layers
            .get_mut(name)
            .ok_or_else(|| StoreError::LayerNotFound {
                name: name.to_owned(),
            })
    }
}

impl LayerSession for MemorySession {
    fn contains_layer(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state.layers.contains_key(name))
    }

    fn layer(&self, name: &str) -> Result<Layer, StoreError> {
        self.state
            .layers
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::LayerNotFound {
                name: name.to_owned(),
            })
    }

    fn create_layer_with_factory(
        &mut self,
        name: &str,
        geometry_factory: GeometryFactory,
    ) -> Result<Layer, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyLayerName);
        }
        if self.state.layers.contains_key(name) {
            return Err(StoreError::LayerExists {
                name: name.to_owned(),
            });
        }
        self.state.next_id += 1;
        let layer = Layer::new(LayerId(self.state.next_id), name, geometry_factory);
        self.state.layers.insert(name.to_owned(), layer.clone());
        self.operations.push(Operation::CreateLayer {
            name: name.to_owned(),
        });
        Ok(layer)
    }

    fn set_coordinate_reference_system(
        &mut self,
        layer: &Layer,
        crs: &CoordinateReferenceSystem,
    ) -> Result<(), StoreError> {
        let stored = self.layer_mut(layer.name())?;
        *stored = stored
            .clone()
            .with_coordinate_reference_system(Some(crs.clone()));
        self.operations.push(Operation::SetCoordinateReferenceSystem {
            layer: layer.name().to_owned(),
            wkt: crs.wkt().to_owned(),
        });
        Ok(())
    }

    fn merge_extra_property_names(
        &mut self,
        layer: &Layer,
        names: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let stored = self.layer_mut(layer.name())?;
        let merged = merge_field_names(stored.field_names(), names);
        *stored = stored.clone().with_field_names(merged.clone());
        self.operations.push(Operation::MergeSchema {
            layer: layer.name().to_owned(),
            names: names.to_vec(),
        });
        Ok(merged)
    }

    fn add(
        &mut self,
        layer: &Layer,
        geometry: &Geometry<f64>,
        field_names: &[String],
        values: &[AttributeValue],
    ) -> Result<(), StoreError> {
        if !self.state.layers.contains_key(layer.name()) {
            return Err(StoreError::LayerNotFound {
                name: layer.name().to_owned(),
            });
        }
        if field_names.len() != values.len() {
            return Err(StoreError::FieldCountMismatch {
                layer: layer.name().to_owned(),
                names: field_names.len(),
                values: values.len(),
            });
        }
        self.state
            .features
            .entry(layer.name().to_owned())
            .or_default()
            .push(Feature::new(
                geometry.clone(),
                field_names.to_vec(),
                values.to_vec(),
            ));
        self.operations.push(Operation::Add {
            layer: layer.name().to_owned(),
        });
        Ok(())
    }
}

/// Scripted dataset that counts how many records each stream hands out.
#[derive(Debug, Default)]
pub struct MemoryDataset {
    field_names: Vec<String>,
    crs: Option<CoordinateReferenceSystem>,
    declared_records: Option<u64>,
    geometries: Vec<GeometryRecord>,
    attributes: Vec<AttributeRecord>,
    geometry_pulls: usize,
    attribute_pulls: usize,
}

impl MemoryDataset {
    /// Create an empty dataset with the given attribute header.
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Attach a coordinate reference system parsed from `wkt`.
    #[must_use]
    pub fn with_crs(mut self, wkt: &str) -> Self {
        self.crs = CoordinateReferenceSystem::from_wkt(wkt);
        self
    }

    /// Report `count` as the attribute header's record count.
    #[must_use]
    pub const fn with_declared_records(mut self, count: u64) -> Self {
        self.declared_records = Some(count);
        self
    }

    /// Append a geometry and its attribute row.
    #[must_use]
    pub fn with_feature(self, geometry: Geometry<f64>, values: Vec<AttributeValue>) -> Self {
        self.with_geometry(geometry).with_attributes(values)
    }

    /// Append a geometry record only.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry<f64>) -> Self {
        self.geometries.push(Ok(geometry));
        self
    }

    /// Append a geometry record without coordinates.
    #[must_use]
    pub fn with_empty_geometry(self) -> Self {
        self.with_geometry(Geometry::GeometryCollection(GeometryCollection::default()))
    }

    /// Append a geometry record that fails to decode.
    #[must_use]
    pub fn with_decode_error(mut self, message: &str) -> Self {
        self.geometries.push(Err(ShapeDecodeError::new(message)));
        self
    }

    /// Append an attribute row only.
    #[must_use]
    pub fn with_attributes(mut self, values: Vec<AttributeValue>) -> Self {
        self.attributes.push(Ok(values));
        self
    }

    /// Append an attribute row that fails to read.
    #[must_use]
    pub fn with_attribute_error(mut self, message: &str) -> Self {
        self.attributes.push(Err(AttributeReadError::new(message)));
        self
    }

    /// Geometry records handed out so far.
    #[must_use]
    pub const fn geometry_pulls(&self) -> usize {
        self.geometry_pulls
    }

    /// Attribute records handed out so far.
    #[must_use]
    pub const fn attribute_pulls(&self) -> usize {
        self.attribute_pulls
    }
}

impl FeatureDataset for MemoryDataset {
    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn coordinate_reference_system(&self) -> Option<&CoordinateReferenceSystem> {
        self.crs.as_ref()
    }

    fn declared_records(&self) -> Option<u64> {
        self.declared_records
    }

    fn streams(&mut self) -> FeatureStreams<'_> {
        let geometry_pulls = &mut self.geometry_pulls;
        let attribute_pulls = &mut self.attribute_pulls;
        FeatureStreams {
            geometries: Box::new(
                self.geometries
                    .drain(..)
                    .inspect(move |_| *geometry_pulls += 1),
            ),
            attributes: Box::new(
                self.attributes
                    .drain(..)
                    .inspect(move |_| *attribute_pulls += 1),
            ),
        }
    }
}
