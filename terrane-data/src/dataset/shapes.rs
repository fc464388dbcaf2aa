//! Shape records framed by their record headers and converted into `geo`
//! geometries.

use std::io::{Cursor, Read};

use geo::{Geometry, GeometryCollection};
use shapefile::{ReadableShape, Shape, header::Header};
use terrane_core::{GeometryRecord, ShapeDecodeError};

const FILE_HEADER_BYTES: u64 = 100;
const RECORD_HEADER_BYTES: usize = 8;

/// Sequential reader over the records of a `.shp` file.
///
/// Each record's content is buffered using the length from its header before
/// it is decoded, so a malformed record consumes exactly its own bytes and
/// the next pull starts on the following record. A record header that cannot
/// be read or that claims more bytes than the file holds ends the stream.
pub(super) struct ShapeRecords<R> {
    source: R,
    remaining: u64,
}

impl<R: Read> ShapeRecords<R> {
    /// Read the file header and position the reader on the first record.
    pub(super) fn new(mut source: R) -> Result<Self, shapefile::Error> {
        let header = Header::read_from(&mut source)?;
        let file_bytes = u64::try_from(header.file_length).unwrap_or_default() * 2;
        Ok(Self {
            source,
            remaining: file_bytes.saturating_sub(FILE_HEADER_BYTES),
        })
    }

    fn read_content(&mut self) -> Result<Vec<u8>, ShapeDecodeError> {
        let mut header = [0_u8; RECORD_HEADER_BYTES];
        self.source.read_exact(&mut header).map_err(|source| {
            ShapeDecodeError::with_source("failed to read shape record header", source)
        })?;
        self.remaining = self.remaining.saturating_sub(RECORD_HEADER_BYTES as u64);

        let [_, _, _, _, size @ ..] = header;
        let words = i32::from_be_bytes(size);
        let length = u64::try_from(words)
            .ok()
            .map(|words| words * 2)
            .filter(|length| *length <= self.remaining)
            .ok_or_else(|| {
                ShapeDecodeError::new(format!(
                    "shape record length of {words} words exceeds the file"
                ))
            })?;
        let length_bytes = usize::try_from(length)
            .map_err(|source| ShapeDecodeError::with_source("shape record is too large", source))?;
        let mut content = vec![0_u8; length_bytes];
        self.source.read_exact(&mut content).map_err(|source| {
            ShapeDecodeError::with_source("failed to read shape record", source)
        })?;
        self.remaining -= length;
        Ok(content)
    }
}

impl<R: Read> Iterator for ShapeRecords<R> {
    type Item = GeometryRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining < RECORD_HEADER_BYTES as u64 {
            return None;
        }
        match self.read_content() {
            Ok(content) => Some(decode_content(&content)),
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }
}

fn decode_content(content: &[u8]) -> GeometryRecord {
    let size = i32::try_from(content.len())
        .map_err(|source| ShapeDecodeError::with_source("shape record is too large", source))?;
    decode_shape(Shape::read_from(&mut Cursor::new(content), size))
}

/// Convert one decoded shape into a geometry record.
///
/// Null shapes become an empty collection so the ingestion loop can skip them
/// as empty rather than invalid.
pub(super) fn decode_shape(record: Result<Shape, shapefile::Error>) -> GeometryRecord {
    match record {
        Ok(Shape::NullShape) => Ok(Geometry::GeometryCollection(GeometryCollection::default())),
        Ok(shape) => {
            let shape_type = shape.shapetype();
            Geometry::<f64>::try_from(shape).map_err(|reason| {
                ShapeDecodeError::new(format!("cannot convert {shape_type:?} shape: {reason}"))
            })
        }
        Err(source) => Err(ShapeDecodeError::with_source(
            "failed to decode shape record",
            source,
        )),
    }
}
