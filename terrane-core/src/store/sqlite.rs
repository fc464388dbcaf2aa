//! SQLite-backed layer store.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use geo::{BoundingRect, Geometry, Rect};
use rusqlite::{Connection, OptionalExtension, Params, params};

use crate::{
    AttributeValue, CoordinateReferenceSystem, Feature, GeometryFactory, Layer, LayerId,
    PrecisionModel, merge_field_names,
};

use super::migrations::initialise_schema;
use super::{LayerSession, LayerStore, StoreError};

/// Layer store persisted in a single SQLite database.
///
/// Geometries are stored as `bincode` blobs next to their envelope, and
/// attribute rows as JSON arrays of `[name, value]` pairs so field order
/// survives a round trip.
///
/// # Examples
///
/// ```
/// use geo::{Geometry, Point};
/// use terrane_core::{AttributeValue, LayerSession, LayerStore, SqliteLayerStore, StoreError};
///
/// let mut store = SqliteLayerStore::open_in_memory()?;
/// store.run_in_transaction(|session| {
///     let layer = session.get_or_create_layer("wells")?;
///     session.merge_extra_property_names(&layer, &["depth".into()])?;
///     session.add(
///         &layer,
///         &Geometry::Point(Point::new(1.0, 2.0)),
///         &["depth".into()],
///         &[AttributeValue::Number(12.5)],
///     )
/// })?;
/// assert_eq!(store.feature_count("wells")?, 1);
/// # Ok::<(), StoreError>(())
/// ```
pub struct SqliteLayerStore {
    connection: Connection,
    location: Option<PathBuf>,
}

impl fmt::Debug for SqliteLayerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteLayerStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteLayerStore {
    /// Open (or create) a store at `path`, initialising the schema.
    pub fn open<P>(path: P) -> Result<Self, StoreError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(connection, Some(path.to_path_buf()))
    }

    /// Open a transient store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::with_connection(connection, None)
    }

    fn with_connection(
        mut connection: Connection,
        location: Option<PathBuf>,
    ) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection,
            location,
        })
    }

    /// Location of the database file, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Names of all layers, sorted.
    pub fn layer_names(&self) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT name FROM layers ORDER BY name")
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare layer listing",
                source,
            })?;
        let names = statement
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
            .map_err(|source| StoreError::Sqlite {
                operation: "list layers",
                source,
            })?;
        Ok(names)
    }

    /// Load the layer named `name`, if present.
    pub fn layer(&self, name: &str) -> Result<Option<Layer>, StoreError> {
        load_layer(&self.connection, name)
    }

    /// Number of features stored in layer `name`.
    pub fn feature_count(&self, name: &str) -> Result<u64, StoreError> {
        let layer = require_layer(&self.connection, name)?;
        let count: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM layer_features WHERE layer_id = ?1",
                [layer.id().0],
                |row| row.get(0),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "count features",
                source,
            })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// All features of layer `name` in insertion order.
    pub fn features(&self, name: &str) -> Result<Vec<Feature>, StoreError> {
        let layer = require_layer(&self.connection, name)?;
        load_features(
            &self.connection,
            &layer,
            "SELECT id, geometry, properties FROM layer_features
                WHERE layer_id = ?1
                ORDER BY id",
            params![layer.id().0],
        )
    }

    /// Features of layer `name` whose envelope intersects `bbox`.
    ///
    /// Envelopes touching the box boundary count as intersecting.
    pub fn features_in_bbox(&self, name: &str, bbox: &Rect<f64>) -> Result<Vec<Feature>, StoreError> {
        let layer = require_layer(&self.connection, name)?;
        let (min, max) = (bbox.min(), bbox.max());
        load_features(
            &self.connection,
            &layer,
            "SELECT id, geometry, properties FROM layer_features
                WHERE layer_id = ?1
                  AND min_x <= ?4 AND max_x >= ?2
                  AND min_y <= ?5 AND max_y >= ?3
                ORDER BY id",
            params![layer.id().0, min.x, min.y, max.x, max.y],
        )
    }
}

impl LayerStore for SqliteLayerStore {
    fn run_in_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LayerSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin transaction",
                source,
            })?;
        // Dropping an uncommitted transaction rolls it back.
        let value = work(&mut SqliteSession {
            connection: &transaction,
        })?;
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit transaction",
            source,
        })?;
        Ok(value)
    }
}

struct SqliteSession<'a> {
    connection: &'a Connection,
}

impl LayerSession for SqliteSession<'_> {
    fn contains_layer(&self, name: &str) -> Result<bool, StoreError> {
        self.connection
            .query_row("SELECT 1 FROM layers WHERE name = ?1", [name], |_| Ok(()))
            .optional()
            .map(|found| found.is_some())
            .map_err(|source| StoreError::Sqlite {
                operation: "look up layer",
                source,
            })
    }

    fn layer(&self, name: &str) -> Result<Layer, StoreError> {
        require_layer(self.connection, name)
    }

    fn create_layer_with_factory(
        &mut self,
        name: &str,
        geometry_factory: GeometryFactory,
    ) -> Result<Layer, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyLayerName);
        }
        if self.contains_layer(name)? {
            return Err(StoreError::LayerExists {
                name: name.to_owned(),
            });
        }
        self.connection
            .execute(
                "INSERT INTO layers (name, precision_scale) VALUES (?1, ?2)",
                params![name, geometry_factory.precision().scale()],
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "create layer",
                source,
            })?;
        let id = LayerId(self.connection.last_insert_rowid());
        Ok(Layer::new(id, name, geometry_factory))
    }

    fn set_coordinate_reference_system(
        &mut self,
        layer: &Layer,
        crs: &CoordinateReferenceSystem,
    ) -> Result<(), StoreError> {
        let updated = self
            .connection
            .execute(
                "UPDATE layers SET crs_wkt = ?1 WHERE id = ?2",
                params![crs.wkt(), layer.id().0],
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "assign coordinate reference system",
                source,
            })?;
        if updated == 0 {
            return Err(StoreError::LayerNotFound {
                name: layer.name().to_owned(),
            });
        }
        Ok(())
    }

    fn merge_extra_property_names(
        &mut self,
        layer: &Layer,
        names: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let current = require_layer(self.connection, layer.name())?;
        let merged = merge_field_names(current.field_names(), names);
        let encoded = serde_json::to_string(&merged).map_err(|source| StoreError::Attributes {
            operation: "encode layer schema",
            layer: layer.name().to_owned(),
            source,
        })?;
        self.connection
            .execute(
                "UPDATE layers SET field_names = ?1 WHERE id = ?2",
                params![encoded, current.id().0],
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "update layer schema",
                source,
            })?;
        Ok(merged)
    }

    fn add(
        &mut self,
        layer: &Layer,
        geometry: &Geometry<f64>,
        field_names: &[String],
        values: &[AttributeValue],
    ) -> Result<(), StoreError> {
        if field_names.len() != values.len() {
            return Err(StoreError::FieldCountMismatch {
                layer: layer.name().to_owned(),
                names: field_names.len(),
                values: values.len(),
            });
        }

        let envelope = geometry.bounding_rect();
        let blob = bincode::serialize(geometry).map_err(|source| StoreError::EncodeGeometry {
            layer: layer.name().to_owned(),
            source,
        })?;
        let pairs: Vec<(&String, &AttributeValue)> = field_names.iter().zip(values).collect();
        let properties =
            serde_json::to_string(&pairs).map_err(|source| StoreError::Attributes {
                operation: "encode feature properties",
                layer: layer.name().to_owned(),
                source,
            })?;

        let mut statement = self
            .connection
            .prepare_cached(
                "INSERT INTO layer_features (
                    layer_id, min_x, min_y, max_x, max_y, geometry, properties
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare feature insert",
                source,
            })?;
        statement
            .execute(params![
                layer.id().0,
                envelope.map(|rect| rect.min().x),
                envelope.map(|rect| rect.min().y),
                envelope.map(|rect| rect.max().x),
                envelope.map(|rect| rect.max().y),
                blob,
                properties,
            ])
            .map_err(|source| StoreError::Sqlite {
                operation: "insert feature",
                source,
            })?;
        Ok(())
    }
}

struct LayerRow {
    id: i64,
    name: String,
    crs_wkt: Option<String>,
    precision_scale: Option<f64>,
    field_names: String,
}

impl LayerRow {
    fn into_layer(self) -> Result<Layer, StoreError> {
        let field_names: Vec<String> =
            serde_json::from_str(&self.field_names).map_err(|source| StoreError::Attributes {
                operation: "parse layer schema",
                layer: self.name.clone(),
                source,
            })?;
        let precision = self
            .precision_scale
            .map_or(PrecisionModel::Floating, |scale| PrecisionModel::Fixed {
                scale,
            });
        let crs = self
            .crs_wkt
            .and_then(CoordinateReferenceSystem::from_wkt);
        Ok(
            Layer::new(LayerId(self.id), self.name, GeometryFactory::new(precision))
                .with_field_names(field_names)
                .with_coordinate_reference_system(crs),
        )
    }
}

fn load_layer(connection: &Connection, name: &str) -> Result<Option<Layer>, StoreError> {
    connection
        .query_row(
            "SELECT id, name, crs_wkt, precision_scale, field_names
                FROM layers WHERE name = ?1",
            [name],
            |row| {
                Ok(LayerRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    crs_wkt: row.get(2)?,
                    precision_scale: row.get(3)?,
                    field_names: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(|source| StoreError::Sqlite {
            operation: "load layer",
            source,
        })?
        .map(LayerRow::into_layer)
        .transpose()
}

fn require_layer(connection: &Connection, name: &str) -> Result<Layer, StoreError> {
    load_layer(connection, name)?.ok_or_else(|| StoreError::LayerNotFound {
        name: name.to_owned(),
    })
}

struct FeatureRow {
    id: i64,
    geometry: Vec<u8>,
    properties: String,
}

impl FeatureRow {
    fn into_feature(self, layer: &Layer) -> Result<Feature, StoreError> {
        let geometry: Geometry<f64> =
            bincode::deserialize(&self.geometry).map_err(|source| StoreError::DecodeGeometry {
                feature_id: self.id,
                source,
            })?;
        let pairs: Vec<(String, AttributeValue)> = serde_json::from_str(&self.properties)
            .map_err(|source| StoreError::Attributes {
                operation: "parse feature properties",
                layer: layer.name().to_owned(),
                source,
            })?;
        let (field_names, values) = pairs.into_iter().unzip();
        Ok(Feature::new(geometry, field_names, values))
    }
}

fn load_features<P>(
    connection: &Connection,
    layer: &Layer,
    sql: &str,
    params: P,
) -> Result<Vec<Feature>, StoreError>
where
    P: Params,
{
    let mut statement = connection
        .prepare_cached(sql)
        .map_err(|source| StoreError::Sqlite {
            operation: "prepare feature query",
            source,
        })?;
    let rows = statement
        .query_map(params, |row| {
            Ok(FeatureRow {
                id: row.get(0)?,
                geometry: row.get(1)?,
                properties: row.get(2)?,
            })
        })
        .map_err(|source| StoreError::Sqlite {
            operation: "query features",
            source,
        })?;

    let mut features = Vec::new();
    for row in rows {
        let row = row.map_err(|source| StoreError::Sqlite {
            operation: "read feature row",
            source,
        })?;
        features.push(row.into_feature(layer)?);
    }
    Ok(features)
}
