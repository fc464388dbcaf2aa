//! Source seam for datasets that deliver geometries and attributes as two
//! separate record streams.

use std::error::Error as StdError;

use geo::Geometry;
use thiserror::Error;

use crate::{AttributeValue, CoordinateReferenceSystem};

/// One pull from the geometry stream.
pub type GeometryRecord = Result<Geometry<f64>, ShapeDecodeError>;

/// One pull from the attribute stream: values aligned with the header fields.
pub type AttributeRecord = Result<Vec<AttributeValue>, AttributeReadError>;

/// A geometry record could not be decoded.
///
/// The record is unusable but the stream can still advance.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ShapeDecodeError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ShapeDecodeError {
    /// Decode failure described only by a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Decode failure caused by a parser error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An attribute row could not be read.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AttributeReadError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AttributeReadError {
    /// Read failure described only by a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Read failure caused by a parser error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// The two record streams of an opened dataset.
///
/// Both iterators yield one item per logical feature. Nothing guarantees they
/// have the same length.
pub struct FeatureStreams<'a> {
    /// Geometry records in file order.
    pub geometries: Box<dyn Iterator<Item = GeometryRecord> + 'a>,
    /// Attribute rows in file order.
    pub attributes: Box<dyn Iterator<Item = AttributeRecord> + 'a>,
}

/// A dataset whose headers have been read and whose records can be streamed.
///
/// # Examples
///
/// ```
/// use geo::{Geometry, Point};
/// use terrane_core::{
///     AttributeValue, CoordinateReferenceSystem, FeatureDataset, FeatureStreams,
/// };
///
/// struct OnePoint {
///     fields: Vec<String>,
/// }
///
/// impl FeatureDataset for OnePoint {
///     fn field_names(&self) -> &[String] {
///         &self.fields
///     }
///
///     fn coordinate_reference_system(&self) -> Option<&CoordinateReferenceSystem> {
///         None
///     }
///
///     fn streams(&mut self) -> FeatureStreams<'_> {
///         FeatureStreams {
///             geometries: Box::new(std::iter::once(Ok(Geometry::Point(Point::new(1.0, 1.0))))),
///             attributes: Box::new(std::iter::once(Ok(vec![AttributeValue::from("a")]))),
///         }
///     }
/// }
///
/// let mut dataset = OnePoint { fields: vec!["name".into()] };
/// let streams = dataset.streams();
/// assert_eq!(streams.geometries.count(), 1);
/// ```
pub trait FeatureDataset {
    /// Attribute field names from the attribute header, in column order.
    fn field_names(&self) -> &[String];

    /// Coordinate reference system supplied alongside the data, if any.
    fn coordinate_reference_system(&self) -> Option<&CoordinateReferenceSystem>;

    /// Number of attribute records the attribute header declares, if known.
    ///
    /// Readers may yield fewer rows, for example when rows are flagged as
    /// deleted.
    fn declared_records(&self) -> Option<u64> {
        None
    }

    /// Borrow the geometry and attribute streams.
    fn streams(&mut self) -> FeatureStreams<'_>;
}
