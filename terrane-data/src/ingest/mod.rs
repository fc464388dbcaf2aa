//! Batched, transactional import of a dataset into a named layer.
//!
//! An import runs in phases, each in its own committed transaction: resolve
//! or create the layer, assign the dataset's coordinate reference system when
//! it has one, merge the attribute header into the layer schema, and then
//! ingest paired records in batches of at most `commit_interval`.
//!
//! Undecodable or empty geometries are skipped and reported; attribute read
//! failures and store failures abort the import, rolling back the open batch
//! while earlier batches stay committed.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use terrane_core::{
    AttributeReadError, FeatureDataset, Layer, LayerSession, LayerStore, StoreError,
};
use thiserror::Error;

use crate::{DatasetError, ShapefileDataset};

mod decode;
mod observer;
mod paired;

pub use decode::DecodedFeature;
pub use observer::{ImportObserver, LogObserver, SkipReason};
pub use paired::{PairedRecords, UnpairedStream};

/// Records per ingestion transaction when no interval is configured.
pub const DEFAULT_COMMIT_INTERVAL: usize = 1000;

/// Errors that abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The commit interval was zero.
    #[error("commit interval must be at least 1")]
    InvalidCommitInterval,
    /// The dataset could not be opened.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// The store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An attribute row could not be read.
    #[error("failed to read attributes of record {record}")]
    AttributeRead {
        /// 1-based record index.
        record: u64,
        /// Reader error.
        #[source]
        source: AttributeReadError,
    },
}

/// Outcome of a completed import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Target layer.
    pub layer: String,
    /// Records pulled from the dataset, skipped ones included.
    pub records_read: u64,
    /// Features handed to the store.
    pub features_added: u64,
    /// Records skipped for having no coordinates.
    pub skipped_empty: u64,
    /// Records skipped because their geometry failed to decode.
    pub skipped_invalid: u64,
    /// Committed ingestion transactions.
    pub batches: u64,
    /// Wall-clock duration of the whole import.
    pub elapsed: Duration,
    /// Stream that still had records when pairing stopped.
    pub unpaired: Option<UnpairedStream>,
}

/// Imports datasets into layers of a [`LayerStore`].
///
/// # Examples
///
/// ```
/// use geo::{Geometry, Point};
/// use terrane_core::{AttributeValue, FeatureDataset, FeatureStreams, SqliteLayerStore};
/// use terrane_data::LayerImporter;
///
/// struct Wells;
///
/// impl FeatureDataset for Wells {
///     fn field_names(&self) -> &[String] {
///         &[]
///     }
///
///     fn coordinate_reference_system(&self) -> Option<&terrane_core::CoordinateReferenceSystem> {
///         None
///     }
///
///     fn streams(&mut self) -> FeatureStreams<'_> {
///         FeatureStreams {
///             geometries: Box::new((0..5).map(|i| Ok(Geometry::Point(Point::new(f64::from(i), 0.0))))),
///             attributes: Box::new((0..5).map(|_| Ok(Vec::<AttributeValue>::new()))),
///         }
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteLayerStore::open_in_memory()?;
/// let mut importer = LayerImporter::new(store, 2)?;
/// let report = importer.import_dataset(&mut Wells, "wells")?;
/// assert_eq!(report.features_added, 5);
/// assert_eq!(report.batches, 3);
/// assert_eq!(importer.store().feature_count("wells")?, 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LayerImporter<S, O = LogObserver> {
    store: S,
    commit_interval: NonZeroUsize,
    observer: O,
}

impl<S> LayerImporter<S>
where
    S: LayerStore,
{
    /// Create an importer committing every `commit_interval` records.
    pub fn new(store: S, commit_interval: usize) -> Result<Self, ImportError> {
        let commit_interval =
            NonZeroUsize::new(commit_interval).ok_or(ImportError::InvalidCommitInterval)?;
        Ok(Self {
            store,
            commit_interval,
            observer: LogObserver,
        })
    }
}

impl<S, O> LayerImporter<S, O>
where
    S: LayerStore,
    O: ImportObserver,
{
    /// Replace the progress observer.
    pub fn with_observer<P>(self, observer: P) -> LayerImporter<S, P>
    where
        P: ImportObserver,
    {
        LayerImporter {
            store: self.store,
            commit_interval: self.commit_interval,
            observer,
        }
    }

    /// Records per ingestion transaction.
    #[must_use]
    pub const fn commit_interval(&self) -> usize {
        self.commit_interval.get()
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Borrow the progress observer.
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Release the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Open the shapefile at `path` and import it.
    ///
    /// `layer_name` defaults to the file stem of the `.shp` file.
    pub fn import_path(
        &mut self,
        path: &Utf8Path,
        layer_name: Option<&str>,
    ) -> Result<ImportReport, ImportError> {
        let mut dataset = ShapefileDataset::open(path)?;
        let layer_name = layer_name.map_or_else(|| dataset.layer_name().to_owned(), str::to_owned);
        self.import_dataset(&mut dataset, &layer_name)
    }

    /// Import every paired record of `dataset` into `layer_name`.
    pub fn import_dataset<D>(
        &mut self,
        dataset: &mut D,
        layer_name: &str,
    ) -> Result<ImportReport, ImportError>
    where
        D: FeatureDataset + ?Sized,
    {
        let started = Instant::now();

        let layer = self
            .store
            .run_in_transaction(|session| session.get_or_create_layer(layer_name))?;

        if let Some(crs) = dataset.coordinate_reference_system() {
            self.store
                .run_in_transaction(|session| session.set_coordinate_reference_system(&layer, crs))?;
        }

        let field_names = dataset.field_names().to_vec();
        let layer = self.store.run_in_transaction(|session| {
            session.merge_extra_property_names(&layer, &field_names)?;
            session.layer(layer.name())
        })?;

        let declared_records = dataset.declared_records();
        let streams = dataset.streams();
        let mut pairs = PairedRecords::new(streams.geometries, streams.attributes);
        let mut report = ImportReport {
            layer: layer.name().to_owned(),
            ..ImportReport::default()
        };

        while pairs.has_next() {
            let batch = Batch {
                layer: &layer,
                field_names: &field_names,
                size: self.commit_interval.get(),
            };
            let observer = &mut self.observer;
            self.store.run_in_transaction(|session| {
                batch.ingest(session, &mut pairs, &mut report, observer)
            })?;
            report.batches += 1;
            self.observer.batch_committed(layer.name(), report.records_read);
        }

        report.unpaired = pairs.unpaired();
        if let Some(stream) = report.unpaired {
            self.observer.unpaired_records(layer.name(), stream);
        }
        let attributes_exhausted = report.unpaired != Some(UnpairedStream::Attributes);
        if let Some(declared) = declared_records
            .filter(|declared| attributes_exhausted && *declared > report.records_read)
        {
            self.observer
                .attribute_rows_missing(layer.name(), declared, report.records_read);
        }

        report.elapsed = started.elapsed();
        self.observer.import_finished(&report);
        Ok(report)
    }
}

struct Batch<'a> {
    layer: &'a Layer,
    field_names: &'a [String],
    size: usize,
}

impl Batch<'_> {
    fn ingest<G, A, O>(
        &self,
        session: &mut dyn LayerSession,
        pairs: &mut PairedRecords<G, A>,
        report: &mut ImportReport,
        observer: &mut O,
    ) -> Result<(), ImportError>
    where
        G: Iterator<Item = terrane_core::GeometryRecord>,
        A: Iterator<Item = terrane_core::AttributeRecord>,
        O: ImportObserver,
    {
        for (geometry, attributes) in pairs.by_ref().take(self.size) {
            report.records_read += 1;
            let record = report.records_read;
            let values =
                attributes.map_err(|source| ImportError::AttributeRead { record, source })?;

            match DecodedFeature::from(geometry) {
                DecodedFeature::Ready(geometry) => {
                    let geometry = self.layer.geometry_factory().create(geometry);
                    session.add(self.layer, &geometry, self.field_names, &values)?;
                    report.features_added += 1;
                }
                DecodedFeature::SkippedEmpty => {
                    report.skipped_empty += 1;
                    observer.record_skipped(record, SkipReason::Empty);
                }
                DecodedFeature::SkippedInvalid(cause) => {
                    report.skipped_invalid += 1;
                    observer.record_skipped(record, SkipReason::Invalid(&cause));
                }
            }
        }
        Ok(())
    }
}
