use std::collections::HashSet;

/// Merge newly observed attribute names into an existing layer schema.
///
/// Existing names keep their order, unseen incoming names are appended in the
/// order they arrive, and repeated names collapse to their first occurrence.
/// Names compare exactly and case-sensitively. Value types are not inspected,
/// so a field reused with a different type is accepted as-is.
///
/// # Examples
///
/// ```
/// use terrane_core::merge_field_names;
///
/// let existing = vec!["a".to_owned(), "b".to_owned()];
/// let merged = merge_field_names(&existing, &["b", "c"]);
/// assert_eq!(merged, ["a", "b", "c"]);
///
/// // Merging the same names again changes nothing.
/// assert_eq!(merge_field_names(&merged, &["b", "c"]), merged);
/// ```
#[must_use]
pub fn merge_field_names<S>(existing: &[String], incoming: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    let mut seen: HashSet<&str> = HashSet::with_capacity(existing.len() + incoming.len());
    existing
        .iter()
        .map(String::as_str)
        .chain(incoming.iter().map(|name| name.as_ref()))
        .filter(|name| seen.insert(*name))
        .map(str::to_owned)
        .collect()
}
