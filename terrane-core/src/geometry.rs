use geo::{Coord, CoordsIter, Geometry, MapCoords};
use thiserror::Error;

/// Coordinate precision applied to geometries written into a layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PrecisionModel {
    /// Keep full `f64` precision.
    #[default]
    Floating,
    /// Snap coordinates to a grid of `1 / scale` units.
    Fixed {
        /// Grid cells per coordinate unit.
        scale: f64,
    },
}

/// Errors returned by [`PrecisionModel::fixed`].
#[derive(Debug, Error, PartialEq)]
pub enum PrecisionModelError {
    /// The scale was zero, negative, or not finite.
    #[error("precision scale must be finite and positive, got {scale}")]
    InvalidScale {
        /// Rejected scale.
        scale: f64,
    },
}

impl PrecisionModel {
    /// Build a fixed precision model with the given scale.
    ///
    /// # Examples
    ///
    /// ```
    /// use terrane_core::PrecisionModel;
    ///
    /// let model = PrecisionModel::fixed(100.0).expect("valid scale");
    /// assert_eq!(model.make_precise(1.23456), 1.23);
    /// assert!(PrecisionModel::fixed(0.0).is_err());
    /// ```
    pub fn fixed(scale: f64) -> Result<Self, PrecisionModelError> {
        if scale.is_finite() && scale > 0.0 {
            Ok(Self::Fixed { scale })
        } else {
            Err(PrecisionModelError::InvalidScale { scale })
        }
    }

    /// Grid scale, or `None` for floating precision.
    #[must_use]
    pub const fn scale(&self) -> Option<f64> {
        match self {
            Self::Floating => None,
            Self::Fixed { scale } => Some(*scale),
        }
    }

    /// Round a single ordinate according to the model.
    #[must_use]
    pub fn make_precise(&self, value: f64) -> f64 {
        match self {
            Self::Floating => value,
            Self::Fixed { scale } => (value * scale).round() / scale,
        }
    }
}

/// Builds layer geometries under the layer's precision model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryFactory {
    precision: PrecisionModel,
}

impl GeometryFactory {
    /// Factory applying `precision` to every coordinate.
    #[must_use]
    pub const fn new(precision: PrecisionModel) -> Self {
        Self { precision }
    }

    /// Factory that leaves coordinates untouched.
    #[must_use]
    pub const fn floating() -> Self {
        Self::new(PrecisionModel::Floating)
    }

    /// The precision model in use.
    #[must_use]
    pub const fn precision(&self) -> PrecisionModel {
        self.precision
    }

    /// Adopt a decoded geometry, snapping it to the factory's grid.
    #[must_use]
    pub fn create(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match self.precision {
            PrecisionModel::Floating => geometry,
            precision @ PrecisionModel::Fixed { .. } => geometry.map_coords(|coord| Coord {
                x: precision.make_precise(coord.x),
                y: precision.make_precise(coord.y),
            }),
        }
    }
}

/// Report whether a geometry has no coordinates at all.
///
/// # Examples
///
/// ```
/// use geo::{Geometry, GeometryCollection, LineString, Point};
/// use terrane_core::is_empty_geometry;
///
/// assert!(is_empty_geometry(&Geometry::GeometryCollection(GeometryCollection::default())));
/// assert!(is_empty_geometry(&Geometry::LineString(LineString::new(vec![]))));
/// assert!(!is_empty_geometry(&Geometry::Point(Point::new(0.0, 0.0))));
/// ```
#[must_use]
pub fn is_empty_geometry(geometry: &Geometry<f64>) -> bool {
    geometry.coords_count() == 0
}
