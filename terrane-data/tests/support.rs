//! Shared helpers for the `terrane-data` integration tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use terrane_data::{ImportObserver, ImportReport, SkipReason, UnpairedStream};

const SHAPE_FILE_CODE: i32 = 9994;
const SHAPE_VERSION: i32 = 1000;
const SHAPE_TYPE_NULL: i32 = 0;
const SHAPE_TYPE_POINT: i32 = 1;
const SHAPE_HEADER_BYTES: usize = 100;

/// Temporary directory addressed through a UTF-8 path.
pub struct FixtureDir {
    _guard: TempDir,
    root: Utf8PathBuf,
}

impl FixtureDir {
    pub fn new() -> Self {
        let guard = TempDir::new().unwrap_or_else(|err| panic!("create temp dir: {err}"));
        let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir is not UTF-8: {path:?}"));
        Self {
            _guard: guard,
            root,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.root
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Character,
    Numeric,
}

impl FieldKind {
    const fn code(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ShapeSpec {
    Null,
    Point { shape_type: i32, x: f64, y: f64 },
}

/// Writes small point shapefiles byte by byte.
#[derive(Debug, Default, Clone)]
pub struct ShapefileBuilder {
    shapes: Vec<ShapeSpec>,
    fields: Vec<(String, FieldKind, u8)>,
    rows: Vec<(bool, Vec<String>)>,
    projection: Option<String>,
}

impl ShapefileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character_field(mut self, name: &str, length: u8) -> Self {
        self.fields
            .push((name.to_owned(), FieldKind::Character, length));
        self
    }

    pub fn numeric_field(mut self, name: &str, length: u8) -> Self {
        self.fields.push((name.to_owned(), FieldKind::Numeric, length));
        self
    }

    pub fn point(self, x: f64, y: f64) -> Self {
        self.point_tagged(SHAPE_TYPE_POINT, x, y)
    }

    /// Point-sized record written with an arbitrary shape type code.
    pub fn point_tagged(mut self, shape_type: i32, x: f64, y: f64) -> Self {
        self.shapes.push(ShapeSpec::Point { shape_type, x, y });
        self
    }

    pub fn null_shape(mut self) -> Self {
        self.shapes.push(ShapeSpec::Null);
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push((false, owned(values)));
        self
    }

    /// Row flagged as deleted in the attribute table.
    pub fn deleted_row(mut self, values: &[&str]) -> Self {
        self.rows.push((true, owned(values)));
        self
    }

    pub fn projection(mut self, wkt: &str) -> Self {
        self.projection = Some(wkt.to_owned());
        self
    }

    /// Write `<stem>.shp`, `<stem>.dbf` and optionally `<stem>.prj` under
    /// `dir`, returning the path without extension.
    pub fn write(&self, dir: &Utf8Path, stem: &str) -> Utf8PathBuf {
        let base = dir.join(stem);
        write_file(&base.with_extension("shp"), &self.shape_bytes());
        write_file(&base.with_extension("dbf"), &self.dbase_bytes());
        if let Some(wkt) = &self.projection {
            write_file(&base.with_extension("prj"), wkt.as_bytes());
        }
        base
    }

    fn shape_bytes(&self) -> Vec<u8> {
        let mut records = Vec::new();
        for (index, shape) in self.shapes.iter().enumerate() {
            let mut content = Vec::new();
            match shape {
                ShapeSpec::Point { shape_type, x, y } => {
                    content.extend_from_slice(&shape_type.to_le_bytes());
                    content.extend_from_slice(&x.to_le_bytes());
                    content.extend_from_slice(&y.to_le_bytes());
                }
                ShapeSpec::Null => content.extend_from_slice(&SHAPE_TYPE_NULL.to_le_bytes()),
            }
            let number = i32::try_from(index + 1).expect("record number fits");
            records.extend_from_slice(&number.to_be_bytes());
            records.extend_from_slice(&words(content.len()).to_be_bytes());
            records.extend_from_slice(&content);
        }

        let (min, max) = self.bounds();
        let mut bytes = Vec::with_capacity(SHAPE_HEADER_BYTES + records.len());
        bytes.extend_from_slice(&SHAPE_FILE_CODE.to_be_bytes());
        bytes.extend_from_slice(&[0; 20]);
        bytes.extend_from_slice(&words(SHAPE_HEADER_BYTES + records.len()).to_be_bytes());
        bytes.extend_from_slice(&SHAPE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&SHAPE_TYPE_POINT.to_le_bytes());
        for value in [min.0, min.1, max.0, max.1, 0.0, 0.0, 0.0, 0.0] {
            bytes.extend_from_slice(&f64::to_le_bytes(value));
        }
        bytes.extend_from_slice(&records);
        bytes
    }

    fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        self.shapes
            .iter()
            .filter_map(|shape| match shape {
                ShapeSpec::Point { x, y, .. } => Some((*x, *y)),
                ShapeSpec::Null => None,
            })
            .fold(
                ((f64::MAX, f64::MAX), (f64::MIN, f64::MIN)),
                |((min_x, min_y), (max_x, max_y)), (x, y)| {
                    ((min_x.min(x), min_y.min(y)), (max_x.max(x), max_y.max(y)))
                },
            )
    }

    fn dbase_bytes(&self) -> Vec<u8> {
        let field_count = self.fields.len();
        let header_len = u16::try_from(32 + 32 * field_count + 1).expect("header fits");
        let record_len = u16::try_from(
            1 + self
                .fields
                .iter()
                .map(|(_, _, length)| usize::from(*length))
                .sum::<usize>(),
        )
        .expect("record fits");
        let record_count = u32::try_from(self.rows.len()).expect("row count fits");

        let mut bytes = vec![0x03, 124, 1, 1];
        bytes.extend_from_slice(&record_count.to_le_bytes());
        bytes.extend_from_slice(&header_len.to_le_bytes());
        bytes.extend_from_slice(&record_len.to_le_bytes());
        bytes.extend_from_slice(&[0; 20]);

        for (name, kind, length) in &self.fields {
            let mut descriptor = [0_u8; 32];
            for (slot, byte) in descriptor.iter_mut().zip(name.bytes().take(10)) {
                *slot = byte;
            }
            descriptor[11] = kind.code();
            descriptor[16] = *length;
            bytes.extend_from_slice(&descriptor);
        }
        bytes.push(0x0D);

        for (deleted, row) in &self.rows {
            bytes.push(if *deleted { b'*' } else { b' ' });
            for ((_, kind, length), value) in self.fields.iter().zip(row) {
                let width = usize::from(*length);
                let cell = match kind {
                    FieldKind::Character => format!("{value:<width$}"),
                    FieldKind::Numeric => format!("{value:>width$}"),
                };
                bytes.extend_from_slice(cell.as_bytes());
            }
        }
        bytes.push(0x1A);
        bytes
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn words(bytes: usize) -> i32 {
    i32::try_from(bytes / 2).expect("length fits in 16-bit words")
}

fn write_file(path: &Utf8Path, bytes: &[u8]) {
    fs::write(path, bytes).unwrap_or_else(|err| panic!("write fixture {path}: {err}"));
}

/// Observer that keeps every notification for later assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub batches: Vec<u64>,
    pub skipped: Vec<(u64, String)>,
    pub unpaired: Vec<UnpairedStream>,
    pub missing_rows: Vec<(u64, u64)>,
    pub reports: Vec<ImportReport>,
}

impl ImportObserver for RecordingObserver {
    fn batch_committed(&mut self, _layer: &str, records_read: u64) {
        self.batches.push(records_read);
    }

    fn record_skipped(&mut self, record: u64, reason: SkipReason<'_>) {
        let label = match reason {
            SkipReason::Empty => "empty".to_owned(),
            SkipReason::Invalid(cause) => format!("invalid: {cause}"),
        };
        self.skipped.push((record, label));
    }

    fn unpaired_records(&mut self, _layer: &str, stream: UnpairedStream) {
        self.unpaired.push(stream);
    }

    fn attribute_rows_missing(&mut self, _layer: &str, declared: u64, read: u64) {
        self.missing_rows.push((declared, read));
    }

    fn import_finished(&mut self, report: &ImportReport) {
        self.reports.push(report.clone());
    }
}
