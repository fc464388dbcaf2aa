//! Storage seam for layered feature stores.
//!
//! Every read or write happens inside [`LayerStore::run_in_transaction`]. The
//! store commits when the closure returns `Ok` and rolls back on `Err` or
//! unwind, so a transaction is always finalised.

use geo::Geometry;
use thiserror::Error;

use crate::{AttributeValue, CoordinateReferenceSystem, GeometryFactory, Layer};

#[cfg(feature = "store-sqlite")]
mod migrations;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use migrations::SCHEMA_VERSION;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteLayerStore;

/// A store of named layers with transactional writes.
///
/// # Examples
///
/// ```
/// use terrane_core::{LayerSession, LayerStore, SqliteLayerStore, StoreError};
///
/// let mut store = SqliteLayerStore::open_in_memory()?;
/// let layer = store.run_in_transaction(|session| session.get_or_create_layer("roads"))?;
/// assert_eq!(layer.name(), "roads");
///
/// let failed: Result<(), StoreError> = store.run_in_transaction(|session| {
///     session.create_layer("parks")?;
///     Err(StoreError::EmptyLayerName)
/// });
/// assert!(failed.is_err());
/// assert!(store.layer("parks")?.is_none(), "rolled back");
/// # Ok::<(), StoreError>(())
/// ```
pub trait LayerStore {
    /// Run `work` inside one transaction.
    ///
    /// The transaction commits when `work` succeeds and rolls back otherwise.
    /// Commit failures surface as [`StoreError`] converted into `E`.
    fn run_in_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LayerSession) -> Result<T, E>,
        E: From<StoreError>;
}

/// Operations available while a transaction is open.
pub trait LayerSession {
    /// Report whether a layer named `name` exists.
    fn contains_layer(&self, name: &str) -> Result<bool, StoreError>;

    /// Load the layer named `name`.
    fn layer(&self, name: &str) -> Result<Layer, StoreError>;

    /// Create a layer with an explicit geometry factory.
    fn create_layer_with_factory(
        &mut self,
        name: &str,
        geometry_factory: GeometryFactory,
    ) -> Result<Layer, StoreError>;

    /// Replace the coordinate reference system of `layer`.
    fn set_coordinate_reference_system(
        &mut self,
        layer: &Layer,
        crs: &CoordinateReferenceSystem,
    ) -> Result<(), StoreError>;

    /// Merge `names` into the schema of `layer`, returning the merged schema.
    fn merge_extra_property_names(
        &mut self,
        layer: &Layer,
        names: &[String],
    ) -> Result<Vec<String>, StoreError>;

    /// Append one feature to `layer`.
    ///
    /// `field_names` and `values` must have equal length.
    fn add(
        &mut self,
        layer: &Layer,
        geometry: &Geometry<f64>,
        field_names: &[String],
        values: &[AttributeValue],
    ) -> Result<(), StoreError>;

    /// Create a layer with floating precision.
    fn create_layer(&mut self, name: &str) -> Result<Layer, StoreError> {
        self.create_layer_with_factory(name, GeometryFactory::floating())
    }

    /// Load `name`, creating it first when absent.
    fn get_or_create_layer(&mut self, name: &str) -> Result<Layer, StoreError> {
        if self.contains_layer(name)? {
            self.layer(name)
        } else {
            self.create_layer(name)
        }
    }
}

/// Errors raised by layer stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Layer names must contain visible characters.
    #[error("layer name must not be blank")]
    EmptyLayerName,
    /// The requested layer does not exist.
    #[error("layer {name:?} does not exist")]
    LayerNotFound {
        /// Requested name.
        name: String,
    },
    /// A layer with this name already exists.
    #[error("layer {name:?} already exists")]
    LayerExists {
        /// Conflicting name.
        name: String,
    },
    /// Field names and values were not positionally aligned.
    #[error("feature for layer {layer:?} has {names} field names but {values} values")]
    FieldCountMismatch {
        /// Target layer.
        layer: String,
        /// Number of field names supplied.
        names: usize,
        /// Number of values supplied.
        values: usize,
    },
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database location.
        path: std::path::PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A schema migration step failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Migration step label.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database was created by an incompatible schema version.
    #[cfg(feature = "store-sqlite")]
    #[error("expected layer schema version {expected} but found {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// A SQLite statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}")]
    Sqlite {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Serialising a geometry failed.
    #[cfg(feature = "serde")]
    #[error("failed to encode geometry for layer {layer:?}")]
    EncodeGeometry {
        /// Target layer.
        layer: String,
        /// Source error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// A stored geometry could not be decoded.
    #[cfg(feature = "serde")]
    #[error("failed to decode stored geometry {feature_id}")]
    DecodeGeometry {
        /// Row identifier of the feature.
        feature_id: i64,
        /// Source error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Attribute names or values could not be serialised or parsed.
    #[cfg(feature = "serde")]
    #[error("failed to {operation} for layer {layer:?}")]
    Attributes {
        /// Operation being performed.
        operation: &'static str,
        /// Layer whose attributes were involved.
        layer: String,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}
