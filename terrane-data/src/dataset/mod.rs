//! Shapefile datasets: a `.shp` geometry file, its `.dbf` attribute table and
//! an optional `.prj` projection.

use std::fs::File;
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use shapefile::dbase;
use terrane_core::{CoordinateReferenceSystem, FeatureDataset, FeatureStreams};

mod attributes;
mod error;
mod shapes;

pub use error::DatasetError;

use attributes::decode_record;
use shapes::ShapeRecords;

/// A shapefile opened for streaming.
///
/// Opening reads both headers and the projection text, so format problems
/// surface before anything is written to a store.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use terrane_core::FeatureDataset;
/// use terrane_data::ShapefileDataset;
///
/// # fn main() -> Result<(), terrane_data::DatasetError> {
/// let dataset = ShapefileDataset::open(Utf8Path::new("data/roads"))?;
/// assert_eq!(dataset.layer_name(), "roads");
/// println!("fields: {:?}", dataset.field_names());
/// # Ok(())
/// # }
/// ```
pub struct ShapefileDataset {
    shape_path: Utf8PathBuf,
    shapes: ShapeRecords<BufReader<File>>,
    records: dbase::Reader<BufReader<File>>,
    field_names: Vec<String>,
    declared_records: u64,
    crs: Option<CoordinateReferenceSystem>,
}

impl std::fmt::Debug for ShapefileDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapefileDataset")
            .field("shape_path", &self.shape_path)
            .field("field_names", &self.field_names)
            .field("declared_records", &self.declared_records)
            .field("crs", &self.crs)
            .finish_non_exhaustive()
    }
}

impl ShapefileDataset {
    /// Open the dataset at `path`, given with or without the `.shp` extension.
    pub fn open(path: &Utf8Path) -> Result<Self, DatasetError> {
        let shape_path = locate_shape_file(path)?;
        let attribute_path = require_component(&shape_path, "dbf", "attribute")?;

        let shapes = open_shapes(&shape_path).map_err(|source| DatasetError::Format {
            component: "shape",
            path: shape_path.clone(),
            source: Box::new(source),
        })?;
        let records =
            dbase::Reader::from_path(&attribute_path).map_err(|source| DatasetError::Format {
                component: "attribute",
                path: attribute_path.clone(),
                source: Box::new(source),
            })?;
        let field_names = records
            .fields()
            .iter()
            .map(|field| field.name().to_owned())
            .collect();
        let declared_records = u64::from(records.header().num_records);
        let crs = read_projection(&shape_path)?;

        Ok(Self {
            shape_path,
            shapes,
            records,
            field_names,
            declared_records,
            crs,
        })
    }

    /// Location of the `.shp` file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.shape_path
    }

    /// Default layer name: the file stem of the `.shp` file.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        self.shape_path.file_stem().unwrap_or_default()
    }
}

impl FeatureDataset for ShapefileDataset {
    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn coordinate_reference_system(&self) -> Option<&CoordinateReferenceSystem> {
        self.crs.as_ref()
    }

    fn declared_records(&self) -> Option<u64> {
        Some(self.declared_records)
    }

    fn streams(&mut self) -> FeatureStreams<'_> {
        let field_names = &self.field_names;
        FeatureStreams {
            geometries: Box::new(self.shapes.by_ref()),
            attributes: Box::new(
                self.records
                    .iter_records()
                    .map(move |record| decode_record(field_names, record)),
            ),
        }
    }
}

fn open_shapes(path: &Utf8Path) -> Result<ShapeRecords<BufReader<File>>, shapefile::Error> {
    let file = File::open(path)?;
    ShapeRecords::new(BufReader::new(file))
}

fn locate_shape_file(path: &Utf8Path) -> Result<Utf8PathBuf, DatasetError> {
    let has_shape_extension = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("shp"));
    if has_shape_extension {
        return if file_exists(path)? {
            Ok(path.to_path_buf())
        } else {
            Err(DatasetError::NotFound {
                component: "shape",
                path: path.to_path_buf(),
            })
        };
    }

    for extension in ["shp", "SHP"] {
        let candidate = Utf8PathBuf::from(format!("{path}.{extension}"));
        if file_exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(DatasetError::NotFound {
        component: "shape",
        path: Utf8PathBuf::from(format!("{path}.shp")),
    })
}

fn require_component(
    shape_path: &Utf8Path,
    extension: &str,
    component: &'static str,
) -> Result<Utf8PathBuf, DatasetError> {
    find_component(shape_path, extension)?.ok_or_else(|| DatasetError::NotFound {
        component,
        path: shape_path.with_extension(extension),
    })
}

fn find_component(
    shape_path: &Utf8Path,
    extension: &str,
) -> Result<Option<Utf8PathBuf>, DatasetError> {
    terrane_fs::find_sibling(shape_path, extension).map_err(|source| DatasetError::Inspect {
        path: shape_path.with_extension(extension),
        source,
    })
}

fn file_exists(path: &Utf8Path) -> Result<bool, DatasetError> {
    terrane_fs::file_is_file(path).map_err(|source| DatasetError::Inspect {
        path: path.to_path_buf(),
        source,
    })
}

fn read_projection(
    shape_path: &Utf8Path,
) -> Result<Option<CoordinateReferenceSystem>, DatasetError> {
    let Some(path) = find_component(shape_path, "prj")? else {
        return Ok(None);
    };
    let wkt = terrane_fs::read_to_string(&path)
        .map_err(|source| DatasetError::ReadProjection { path, source })?;
    Ok(CoordinateReferenceSystem::from_wkt(wkt))
}
