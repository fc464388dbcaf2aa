use crate::{CoordinateReferenceSystem, GeometryFactory};

/// Store-assigned identifier of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub i64);

/// Snapshot of a named layer as read inside a store transaction.
///
/// Layers are persistent and keyed by name. Their attribute schema only ever
/// grows; see [`crate::merge_field_names`].
///
/// # Examples
///
/// ```
/// use terrane_core::{GeometryFactory, Layer, LayerId};
///
/// let layer = Layer::new(LayerId(1), "rivers", GeometryFactory::floating())
///     .with_field_names(vec!["name".into()]);
/// assert_eq!(layer.name(), "rivers");
/// assert_eq!(layer.field_names(), ["name"]);
/// assert!(layer.coordinate_reference_system().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    name: String,
    geometry_factory: GeometryFactory,
    field_names: Vec<String>,
    crs: Option<CoordinateReferenceSystem>,
}

impl Layer {
    /// Construct an empty layer snapshot.
    pub fn new(id: LayerId, name: impl Into<String>, geometry_factory: GeometryFactory) -> Self {
        Self {
            id,
            name: name.into(),
            geometry_factory,
            field_names: Vec::new(),
            crs: None,
        }
    }

    /// Replace the attribute schema of the snapshot.
    #[must_use]
    pub fn with_field_names(mut self, field_names: Vec<String>) -> Self {
        self.field_names = field_names;
        self
    }

    /// Replace the coordinate reference system of the snapshot.
    #[must_use]
    pub fn with_coordinate_reference_system(
        mut self,
        crs: Option<CoordinateReferenceSystem>,
    ) -> Self {
        self.crs = crs;
        self
    }

    /// Store identifier.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Unique layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Factory used to adopt incoming geometries.
    #[must_use]
    pub const fn geometry_factory(&self) -> GeometryFactory {
        self.geometry_factory
    }

    /// Attribute schema in insertion order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Coordinate reference system, if one has been assigned.
    #[must_use]
    pub const fn coordinate_reference_system(&self) -> Option<&CoordinateReferenceSystem> {
        self.crs.as_ref()
    }
}
