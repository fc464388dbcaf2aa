use geo::Geometry;
use terrane_core::{GeometryRecord, ShapeDecodeError, is_empty_geometry};

/// Outcome of validating one geometry record.
#[derive(Debug)]
pub enum DecodedFeature {
    /// The geometry can be stored.
    Ready(Geometry<f64>),
    /// The record decoded to a geometry without coordinates.
    SkippedEmpty,
    /// The record could not be decoded.
    SkippedInvalid(ShapeDecodeError),
}

impl From<GeometryRecord> for DecodedFeature {
    fn from(record: GeometryRecord) -> Self {
        match record {
            Ok(geometry) if is_empty_geometry(&geometry) => Self::SkippedEmpty,
            Ok(geometry) => Self::Ready(geometry),
            Err(cause) => Self::SkippedInvalid(cause),
        }
    }
}
