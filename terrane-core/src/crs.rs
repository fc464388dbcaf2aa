/// Coordinate reference system attached to a layer.
///
/// The definition is kept as opaque WKT text. Nothing here interprets axes or
/// datums; reprojection is out of scope.
///
/// # Examples
///
/// ```
/// use terrane_core::CoordinateReferenceSystem;
///
/// let crs = CoordinateReferenceSystem::from_wkt(r#"GEOGCS["WGS 84",DATUM["WGS_1984"]]"#)
///     .expect("non-blank WKT");
/// assert_eq!(crs.name(), Some("WGS 84"));
/// assert!(CoordinateReferenceSystem::from_wkt("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateReferenceSystem {
    wkt: String,
}

impl CoordinateReferenceSystem {
    /// Wrap a WKT definition, returning `None` when it is blank.
    pub fn from_wkt(wkt: impl Into<String>) -> Option<Self> {
        let wkt = wkt.into();
        let trimmed = wkt.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            wkt: trimmed.to_owned(),
        })
    }

    /// The WKT definition.
    #[must_use]
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    /// Name of the outermost WKT node, e.g. `WGS 84` for `GEOGCS["WGS 84", ...]`.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let mut parts = self.wkt.splitn(3, '"');
        parts.next()?;
        let name = parts.next()?;
        parts.next()?;
        Some(name)
    }
}
