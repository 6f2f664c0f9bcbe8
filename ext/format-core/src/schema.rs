//! Schema descriptions: the format independent list of fields a read or
//! write session is built from, and its pipe-delimited text form.
//!
//! A marshalled description has one record per field, each terminated by
//! `\n`:
//!
//! ```text
//! formatFieldName|canonicalFieldName|canonicalTypeId|defaultValue|allowNull
//! ```
//!
//! Absent strings are written as empty strings, so an absent default and an
//! empty default cannot be told apart after a round trip.

use crate::{CanonicalType, FormatError, Result};
use serde::{Deserialize, Serialize};

const DELIMITER: char = '|';
const RECORD_SEPARATOR: char = '\n';

/// One field of a schema description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub format_field_name: Option<String>,
    pub canonical_field_name: String,
    pub canonical_type: CanonicalType,
    pub default_value: Option<String>,
    pub allow_null: bool,
}

impl FieldDescriptor {
    pub fn new<F: Into<String>, C: Into<String>>(
        format_field_name: F,
        canonical_field_name: C,
        canonical_type: CanonicalType,
    ) -> Self {
        Self {
            format_field_name: Some(format_field_name.into()),
            canonical_field_name: canonical_field_name.into(),
            canonical_type,
            default_value: None,
            allow_null: true,
        }
    }

    pub fn with_default<S: Into<String>>(mut self, default_value: S) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// The column name in the native file
    pub fn native_name(&self) -> &str {
        self.format_field_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.canonical_field_name)
    }

    pub fn marshall(&self) -> Result<String> {
        let type_id = self.canonical_type.id().to_string();
        let allow_null = if self.allow_null { "true" } else { "false" };
        join_components(&[
            self.format_field_name.as_deref().unwrap_or(""),
            &self.canonical_field_name,
            &type_id,
            self.default_value.as_deref().unwrap_or(""),
            allow_null,
        ])
    }

    pub fn unmarshall(record: &str) -> Result<Self> {
        let [format_name, canonical_name, type_id, default_value, allow_null] =
            split_components::<5>(record)?;

        let type_id = type_id.parse::<u32>().map_err(|_| {
            FormatError::malformed_schema(format!("type id '{}' is not a number", type_id))
        })?;
        let canonical_type = CanonicalType::from_id(type_id)
            .map_err(|_| FormatError::malformed_schema(format!("unknown type id {}", type_id)))?;
        let allow_null = match allow_null {
            "true" => true,
            "false" => false,
            other => {
                return Err(FormatError::malformed_schema(format!(
                    "allowNull must be 'true' or 'false', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            format_field_name: non_empty(format_name),
            canonical_field_name: canonical_name.to_string(),
            canonical_type,
            default_value: non_empty(default_value),
            allow_null,
        })
    }
}

/// Ordered collection of fields; iteration order is the column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Append a field. Duplicate names are not detected.
    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.add_field(field);
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_by_format_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.native_name() == name)
    }

    pub fn marshall(&self) -> Result<String> {
        marshall_records(self.fields.iter().map(FieldDescriptor::marshall))
    }

    pub fn unmarshall(text: &str) -> Result<Self> {
        Ok(Self {
            fields: unmarshall_records(text, FieldDescriptor::unmarshall)?,
        })
    }
}

impl<'a> IntoIterator for &'a SchemaDescription {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A column pinned to a specific catalog entry, with precision and scale.
///
/// Used to override a converter's default mapping and reported by native
/// schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatField {
    pub format_field_name: String,
    pub canonical_field_name: String,
    pub format_type_id: usize,
    pub canonical_type: CanonicalType,
    pub precision: Option<u32>,
    pub scale: Option<i32>,
}

impl FormatField {
    pub fn new<S: Into<String>>(name: S, format_type_id: usize, canonical_type: CanonicalType) -> Self {
        let name = name.into();
        Self {
            format_field_name: name.clone(),
            canonical_field_name: name,
            format_type_id,
            canonical_type,
            precision: None,
            scale: None,
        }
    }

    pub fn with_precision_scale(mut self, precision: u32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn marshall(&self) -> Result<String> {
        let format_type_id = self.format_type_id.to_string();
        let canonical_type_id = self.canonical_type.id().to_string();
        let precision = self.precision.map(|p| p.to_string()).unwrap_or_default();
        let scale = self.scale.map(|s| s.to_string()).unwrap_or_default();
        join_components(&[
            &self.format_field_name,
            &self.canonical_field_name,
            &format_type_id,
            &canonical_type_id,
            &precision,
            &scale,
        ])
    }

    pub fn unmarshall(record: &str) -> Result<Self> {
        let [format_name, canonical_name, format_type_id, canonical_type_id, precision, scale] =
            split_components::<6>(record)?;

        let format_type_id = format_type_id.parse::<usize>().map_err(|_| {
            FormatError::malformed_schema(format!("format type id '{}'", format_type_id))
        })?;
        let canonical_type = canonical_type_id
            .parse::<u32>()
            .ok()
            .and_then(|id| CanonicalType::from_id(id).ok())
            .ok_or_else(|| {
                FormatError::malformed_schema(format!("canonical type id '{}'", canonical_type_id))
            })?;

        Ok(Self {
            format_field_name: format_name.to_string(),
            canonical_field_name: canonical_name.to_string(),
            format_type_id,
            canonical_type,
            precision: parse_optional(precision, "precision")?,
            scale: parse_optional(scale, "scale")?,
        })
    }
}

/// Ordered list of [`FormatField`]s with the six-component text form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatFieldList {
    fields: Vec<FormatField>,
}

impl FormatFieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: FormatField) {
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: FormatField) -> Self {
        self.add_field(field);
        self
    }

    pub fn fields(&self) -> &[FormatField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn find(&self, format_field_name: &str) -> Option<&FormatField> {
        self.fields
            .iter()
            .find(|f| f.format_field_name == format_field_name)
    }

    pub fn marshall(&self) -> Result<String> {
        marshall_records(self.fields.iter().map(FormatField::marshall))
    }

    pub fn unmarshall(text: &str) -> Result<Self> {
        Ok(Self {
            fields: unmarshall_records(text, FormatField::unmarshall)?,
        })
    }
}

fn join_components(components: &[&str]) -> Result<String> {
    if let Some(bad) = components
        .iter()
        .find(|c| c.contains(DELIMITER) || c.contains(RECORD_SEPARATOR))
    {
        return Err(FormatError::malformed_field(format!(
            "value '{}' contains a reserved delimiter",
            bad
        )));
    }
    Ok(components.join("|"))
}

/// Split a record on the first `N - 1` delimiters; the remainder must be
/// delimiter free.
fn split_components<const N: usize>(record: &str) -> Result<[&str; N]> {
    let mut parts = record.splitn(N, DELIMITER);
    let mut components = [""; N];
    for (index, slot) in components.iter_mut().enumerate() {
        *slot = parts.next().ok_or_else(|| {
            FormatError::malformed_field(format!(
                "expected {} delimiters, found {} in '{}'",
                N - 1,
                index.saturating_sub(1),
                record
            ))
        })?;
    }
    if components[N - 1].contains(DELIMITER) {
        return Err(FormatError::malformed_field(format!(
            "too many delimiters in '{}'",
            record
        )));
    }
    Ok(components)
}

fn marshall_records<I>(records: I) -> Result<String>
where
    I: Iterator<Item = Result<String>>,
{
    let mut text = String::new();
    for record in records {
        text.push_str(&record?);
        text.push(RECORD_SEPARATOR);
    }
    Ok(text)
}

fn unmarshall_records<T, F>(text: &str, parse: F) -> Result<Vec<T>>
where
    F: Fn(&str) -> Result<T>,
{
    text.split(RECORD_SEPARATOR)
        .filter(|line| !line.is_empty())
        .map(parse)
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_optional<T: std::str::FromStr>(s: &str, what: &str) -> Result<Option<T>> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<T>()
        .map(Some)
        .map_err(|_| FormatError::malformed_schema(format!("{} '{}' is not a number", what, s)))
}
