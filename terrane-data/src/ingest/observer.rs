use log::{info, warn};
use terrane_core::ShapeDecodeError;

use super::{ImportReport, UnpairedStream};

/// Why a record was left out of the layer.
#[derive(Debug, Clone, Copy)]
pub enum SkipReason<'a> {
    /// The geometry has no coordinates.
    Empty,
    /// The geometry could not be decoded.
    Invalid(&'a ShapeDecodeError),
}

/// Receives progress notifications from a [`super::LayerImporter`].
///
/// Record indices are 1-based and count every record pulled, including
/// skipped ones.
pub trait ImportObserver {
    /// A batch transaction committed; `records_read` is the running total.
    fn batch_committed(&mut self, _layer: &str, _records_read: u64) {}

    /// Record `record` was skipped.
    fn record_skipped(&mut self, _record: u64, _reason: SkipReason<'_>) {}

    /// Pairing stopped while `stream` still had records.
    fn unpaired_records(&mut self, _layer: &str, _stream: UnpairedStream) {}

    /// The attribute stream ended after `read` rows although its header
    /// declares `declared`. Rows the reader dropped, such as deleted rows,
    /// pair later attributes with the wrong geometries.
    fn attribute_rows_missing(&mut self, _layer: &str, _declared: u64, _read: u64) {}

    /// The import completed.
    fn import_finished(&mut self, _report: &ImportReport) {}
}

/// Observer that forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ImportObserver for LogObserver {
    fn batch_committed(&mut self, layer: &str, records_read: u64) {
        info!("layer {layer}: inserted geometries: {records_read}");
    }

    fn record_skipped(&mut self, record: u64, reason: SkipReason<'_>) {
        match reason {
            SkipReason::Empty => warn!("found empty geometry in record {record}"),
            SkipReason::Invalid(cause) => {
                warn!("found invalid geometry in record {record}: {cause}");
            }
        }
    }

    fn unpaired_records(&mut self, layer: &str, stream: UnpairedStream) {
        warn!(
            "layer {layer}: {stream} records remain after the other stream ended and were not imported"
        );
    }

    fn attribute_rows_missing(&mut self, layer: &str, declared: u64, read: u64) {
        warn!(
            "layer {layer}: attribute table declares {declared} records but only {read} were read; attributes may be misaligned with geometries"
        );
    }

    fn import_finished(&mut self, report: &ImportReport) {
        info!(
            "layer {}: added {} of {} records, elapsed time in seconds: {:.3}",
            report.layer,
            report.features_added,
            report.records_read,
            report.elapsed.as_secs_f64()
        );
    }
}
