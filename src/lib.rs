//! Facade crate for the Terrane layer store.
//!
//! This crate re-exports the core domain types and exposes the SQLite store
//! and the shapefile importer behind feature flags.

#![forbid(unsafe_code)]

pub use terrane_core::{
    AttributeReadError, AttributeValue, CoordinateReferenceSystem, Feature, FeatureDataset,
    FeatureStreams, GeometryFactory, Layer, LayerId, LayerSession, LayerStore, PrecisionModel,
    ShapeDecodeError, StoreError, merge_field_names,
};

#[cfg(feature = "store-sqlite")]
pub use terrane_core::SqliteLayerStore;

#[cfg(feature = "shapefile")]
pub use terrane_data::{
    DEFAULT_COMMIT_INTERVAL, DatasetError, ImportError, ImportObserver, ImportReport,
    LayerImporter, LogObserver, ShapefileDataset,
};

#[cfg(feature = "test-support")]
pub use terrane_core::test_support;
