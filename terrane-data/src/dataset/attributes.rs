//! Mapping of dBase rows onto [`AttributeValue`]s.

use shapefile::dbase::{self, FieldValue};
use terrane_core::{AttributeReadError, AttributeRecord, AttributeValue};

/// Convert one dBase row into values aligned with `field_names`.
///
/// Columns absent from the row read as [`AttributeValue::Null`].
pub(super) fn decode_record(
    field_names: &[String],
    record: Result<dbase::Record, dbase::Error>,
) -> AttributeRecord {
    let mut record = record
        .map_err(|source| AttributeReadError::with_source("failed to read attribute row", source))?;
    Ok(field_names
        .iter()
        .map(|name| record.remove(name).map_or(AttributeValue::Null, attribute_value))
        .collect())
}

fn attribute_value(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(text) => text.map(|text| text.trim_end().to_owned()).into(),
        FieldValue::Numeric(number) => number.into(),
        FieldValue::Float(number) => number.map(f64::from).into(),
        FieldValue::Logical(flag) => flag.into(),
        FieldValue::Integer(number) => AttributeValue::Integer(i64::from(number)),
        FieldValue::Double(number) | FieldValue::Currency(number) => AttributeValue::Number(number),
        FieldValue::Memo(text) => AttributeValue::Text(text),
        other => AttributeValue::Text(format!("{other:?}")),
    }
}
