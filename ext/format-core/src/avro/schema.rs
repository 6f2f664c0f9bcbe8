//! Schema description to Avro record schema, and back.
//!
//! Record schemas are assembled as JSON and parsed by `apache_avro`, so the
//! result is exactly what a schema file with the same text would produce.
//! Nullable fields are `["null", T]` unions defaulting to null.

use super::catalog::{self as ids, AVRO_CATALOG};
use crate::catalog::LogicalTypeEntry;
use crate::decimal::fixed_length;
use crate::traits::SchemaConverter;
use crate::{
    ErrorContext, FieldDescriptor, FormatError, FormatField, FormatFieldList, Result,
    SchemaDescription,
};
use apache_avro::Schema;
use serde_json::{json, Map, Value as JsonValue};

pub const DEFAULT_RECORD_NAME: &str = "Row";

/// A top level record field resolved against the catalog
#[derive(Debug, Clone)]
pub struct AvroColumn {
    pub name: String,
    /// Position in the record
    pub position: usize,
    /// `None` for nested fields
    pub entry: Option<&'static LogicalTypeEntry>,
    /// Union branches when the field is `null` or a value
    pub branches: Option<NullableBranches>,
    pub precision: u32,
    pub scale: i32,
    /// Byte size of fixed fields
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullableBranches {
    pub null: u32,
    pub value: u32,
}

impl AvroColumn {
    pub fn nullable(&self) -> bool {
        self.branches.is_some()
    }

    pub fn format_field(&self) -> Option<FormatField> {
        let entry = self.entry?;
        let field = FormatField::new(&self.name, entry.id, entry.canonical);
        Some(if entry.is_decimal() {
            field.with_precision_scale(self.precision, self.scale)
        } else {
            field
        })
    }
}

/// Builds Avro record schemas from schema descriptions and introspects them
#[derive(Debug, Clone)]
pub struct AvroSchemaConverter {
    record_name: String,
    namespace: Option<String>,
    format_fields: FormatFieldList,
}

impl Default for AvroSchemaConverter {
    fn default() -> Self {
        Self {
            record_name: DEFAULT_RECORD_NAME.to_string(),
            namespace: None,
            format_fields: FormatFieldList::new(),
        }
    }
}

impl AvroSchemaConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record_name<S: Into<String>>(mut self, name: S) -> Self {
        self.record_name = name.into();
        self
    }

    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_format_fields(mut self, format_fields: FormatFieldList) -> Self {
        self.format_fields = format_fields;
        self
    }

    /// The JSON text of the record schema for `schema`
    pub fn schema_json(&self, schema: &SchemaDescription) -> Result<JsonValue> {
        let fields = schema
            .iter()
            .map(|field| self.field_json(field))
            .collect::<Result<Vec<_>>>()?;

        let mut record = Map::new();
        record.insert("type".into(), json!("record"));
        record.insert("name".into(), json!(self.record_name));
        if let Some(namespace) = &self.namespace {
            record.insert("namespace".into(), json!(namespace));
        }
        record.insert("fields".into(), JsonValue::Array(fields));
        Ok(JsonValue::Object(record))
    }

    fn field_json(&self, field: &FieldDescriptor) -> Result<JsonValue> {
        let name = field.native_name();
        let (entry, precision, scale) = AVRO_CATALOG.resolve_field(&self.format_fields, field)?;

        let decimal = |base: JsonValue| -> Result<JsonValue> {
            if precision == 0 || scale < 0 || scale as u32 > precision {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!("decimal({},{}) is not a valid Avro decimal", precision, scale),
                ));
            }
            let mut ty = base;
            ty["logicalType"] = json!("decimal");
            ty["precision"] = json!(precision);
            ty["scale"] = json!(scale);
            Ok(ty)
        };
        let fixed_name = format!("{}_fixed", sanitize(name));

        let ty = match entry.id {
            ids::BOOLEAN => json!("boolean"),
            ids::DATE => json!({"type": "int", "logicalType": "date"}),
            ids::DECIMAL => decimal(json!({"type": "bytes"}))?,
            ids::DOUBLE => json!("double"),
            ids::FLOAT => json!("float"),
            ids::INTEGER => json!("int"),
            ids::LONG => json!("long"),
            ids::STRING => json!("string"),
            ids::TIME_MILLIS => json!({"type": "int", "logicalType": "time-millis"}),
            ids::TIMESTAMP_MILLIS => json!({"type": "long", "logicalType": "timestamp-millis"}),
            ids::TIMESTAMP_MICROS => json!({"type": "long", "logicalType": "timestamp-micros"}),
            ids::BYTES => json!("bytes"),
            ids::FIXED => {
                let size = self
                    .format_fields
                    .find(name)
                    .and_then(|f| f.precision)
                    .or(entry.default_length)
                    .unwrap_or(0);
                json!({"type": "fixed", "name": fixed_name, "size": size})
            }
            ids::DECIMAL_FIXED => decimal(json!({
                "type": "fixed",
                "name": fixed_name,
                "size": fixed_length(precision),
            }))?,
            _ => {
                return Err(FormatError::UnsupportedCanonicalType(format!(
                    "{} for field '{}'",
                    entry.name, name
                )))
            }
        };

        Ok(if field.allow_null {
            json!({"name": name, "type": ["null", ty], "default": null})
        } else {
            json!({"name": name, "type": ty})
        })
    }
}

impl SchemaConverter for AvroSchemaConverter {
    type NativeSchema = Schema;

    fn build_native_schema(&self, schema: &SchemaDescription) -> Result<Schema> {
        let text = serde_json::to_string(&self.schema_json(schema)?)?;
        tracing::debug!(record = %self.record_name, fields = schema.len(), "built avro schema");
        Schema::parse_str(&text).with_context(|| format!("avro record '{}'", self.record_name))
    }

    fn introspect(&self, native: &Schema) -> Result<SchemaDescription> {
        let mut schema = SchemaDescription::new();
        for column in leaf_columns(native)? {
            if let Some(entry) = column.entry {
                let mut field = FieldDescriptor::new(&column.name, &column.name, entry.canonical);
                field.allow_null = column.nullable();
                schema.add_field(field);
            }
        }
        Ok(schema)
    }

    fn introspect_format_fields(&self, native: &Schema) -> Result<FormatFieldList> {
        let mut list = FormatFieldList::new();
        for column in leaf_columns(native)? {
            if let Some(field) = column.format_field() {
                list.add_field(field);
            }
        }
        Ok(list)
    }
}

/// Every top level field of a record schema; nested ones have no entry
pub fn leaf_columns(native: &Schema) -> Result<Vec<AvroColumn>> {
    let record = match native {
        Schema::Record(record) => record,
        other => {
            return Err(FormatError::malformed_schema(format!(
                "expected a record schema, got {:?}",
                other
            )))
        }
    };

    let mut columns = Vec::with_capacity(record.fields.len());
    for (position, field) in record.fields.iter().enumerate() {
        let (branches, inner) = match &field.schema {
            Schema::Union(union) => match union.variants() {
                [Schema::Null, value] => (Some(NullableBranches { null: 0, value: 1 }), value),
                [value, Schema::Null] => (Some(NullableBranches { null: 1, value: 0 }), value),
                _ => (None, &field.schema),
            },
            other => (None, other),
        };

        let mut column = AvroColumn {
            name: field.name.clone(),
            position,
            entry: None,
            branches,
            precision: 0,
            scale: 0,
            size: 0,
        };

        let (physical, annotation) = match inner {
            Schema::Boolean => ("boolean", None),
            Schema::Int => ("int", None),
            Schema::Long => ("long", None),
            Schema::Float => ("float", None),
            Schema::Double => ("double", None),
            Schema::String => ("string", None),
            Schema::Bytes => ("bytes", None),
            Schema::Fixed(fixed) => {
                column.size = fixed.size;
                ("fixed", None)
            }
            Schema::Date => ("int", Some("date")),
            Schema::TimeMillis => ("int", Some("time-millis")),
            Schema::TimestampMillis => ("long", Some("timestamp-millis")),
            Schema::TimestampMicros => ("long", Some("timestamp-micros")),
            Schema::Decimal(decimal) => {
                column.precision = decimal.precision as u32;
                column.scale = decimal.scale as i32;
                match decimal.inner.as_ref() {
                    Schema::Fixed(fixed) => {
                        column.size = fixed.size;
                        ("fixed", Some("decimal"))
                    }
                    _ => ("bytes", Some("decimal")),
                }
            }
            Schema::Record(_) | Schema::Array(_) | Schema::Map(_) | Schema::Union(_) => {
                tracing::debug!(column = %field.name, "skipping nested avro field");
                columns.push(column);
                continue;
            }
            other => {
                return Err(FormatError::unrecognized_native_type(
                    &field.name,
                    format!("{:?}", other),
                ))
            }
        };

        column.entry = Some(AVRO_CATALOG.find_native(physical, annotation).ok_or_else(|| {
            FormatError::unrecognized_native_type(&field.name, physical)
        })?);
        columns.push(column);
    }
    Ok(columns)
}

/// Make a name usable as an Avro type name
fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanonicalType;

    fn description() -> SchemaDescription {
        SchemaDescription::new()
            .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
            .with_field(FieldDescriptor::new("name", "NAME", CanonicalType::String))
            .with_field(FieldDescriptor::new("price", "PRICE", CanonicalType::BigNumber))
            .with_field(FieldDescriptor::new("born", "BORN", CanonicalType::Date))
            .with_field(FieldDescriptor::new("seen", "SEEN", CanonicalType::Timestamp))
            .with_field(FieldDescriptor::new("blob", "BLOB", CanonicalType::Binary))
    }

    #[test]
    fn test_schema_json() {
        let json = AvroSchemaConverter::new()
            .with_namespace("org.example")
            .schema_json(&description())
            .unwrap();
        assert_eq!(json["name"], "Row");
        assert_eq!(json["namespace"], "org.example");
        assert_eq!(json["fields"][0], json!({"name": "id", "type": "long"}));
        assert_eq!(
            json["fields"][2],
            json!({
                "name": "price",
                "type": ["null", {"type": "bytes", "logicalType": "decimal", "precision": 20, "scale": 10}],
                "default": null
            })
        );
    }

    #[test]
    fn test_build_and_introspect() {
        let converter = AvroSchemaConverter::new();
        let native = converter.build_native_schema(&description()).unwrap();
        assert!(matches!(native, Schema::Record(_)));

        let schema = converter.introspect(&native).unwrap();
        let types: Vec<_> = schema.iter().map(|f| f.canonical_type).collect();
        assert_eq!(
            types,
            vec![
                CanonicalType::Integer,
                CanonicalType::String,
                CanonicalType::BigNumber,
                CanonicalType::Date,
                CanonicalType::Timestamp,
                CanonicalType::Binary,
            ]
        );
        assert!(!schema.fields()[0].allow_null);
        assert!(schema.fields()[1].allow_null);

        let formats = converter.introspect_format_fields(&native).unwrap();
        assert_eq!(formats.fields()[2].precision, Some(20));
        assert_eq!(formats.fields()[4].format_type_id, ids::TIMESTAMP_MILLIS);
    }

    #[test]
    fn test_fixed_decimal_override() {
        let overrides = FormatFieldList::new().with_field(
            FormatField::new("price", ids::DECIMAL_FIXED, CanonicalType::BigNumber).with_precision_scale(9, 2),
        );
        let converter = AvroSchemaConverter::new().with_format_fields(overrides);
        let native = converter.build_native_schema(&description()).unwrap();
        let columns = leaf_columns(&native).unwrap();
        assert_eq!(columns[2].entry.unwrap().id, ids::DECIMAL_FIXED);
        assert_eq!((columns[2].precision, columns[2].scale, columns[2].size), (9, 2, 4));
    }

    #[test]
    fn test_introspect_parsed_schema() {
        let native = Schema::parse_str(
            r#"{"type": "record", "name": "Event", "fields": [
                {"name": "id", "type": "int"},
                {"name": "tags", "type": {"type": "array", "items": "string"}},
                {"name": "note", "type": ["string", "null"]},
                {"name": "choice", "type": ["int", "string"]},
                {"name": "at", "type": {"type": "long", "logicalType": "timestamp-micros"}}
            ]}"#,
        )
        .unwrap();
        let columns = leaf_columns(&native).unwrap();
        assert_eq!(columns[2].branches, Some(NullableBranches { null: 1, value: 0 }));

        let schema = AvroSchemaConverter::new().introspect(&native).unwrap();
        let names: Vec<_> = schema.iter().map(|f| f.native_name()).collect();
        assert_eq!(names, vec!["id", "note", "at"]);
    }

    #[test]
    fn test_unrecognized_leaf() {
        let native = Schema::parse_str(
            r#"{"type": "record", "name": "E", "fields": [
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["A", "B"]}}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            AvroSchemaConverter::new().introspect(&native),
            Err(FormatError::UnrecognizedNativeType { .. })
        ));
    }

    #[test]
    fn test_invalid_record_name() {
        let err = AvroSchemaConverter::new()
            .with_record_name("not a name")
            .build_native_schema(&description())
            .unwrap_err();
        assert!(err.to_string().contains("avro record 'not a name'"));
    }
}
