//! Dataset adapters and the ingestion pipeline for Terrane layers.
//!
//! Responsibilities:
//! - Open shapefile datasets and stream their geometry and attribute records.
//! - Import paired records into a [`terrane_core::LayerStore`] in bounded
//!   transactions, evolving the layer schema on the way.
//!
//! Boundaries:
//! - Domain types and storage live in `terrane-core`.
//! - Geometries are stored as decoded; no repair or reprojection happens here.

mod dataset;
mod ingest;

pub use dataset::{DatasetError, ShapefileDataset};
pub use ingest::{
    DEFAULT_COMMIT_INTERVAL, DecodedFeature, ImportError, ImportObserver, ImportReport,
    LayerImporter, LogObserver, PairedRecords, SkipReason, UnpairedStream,
};
