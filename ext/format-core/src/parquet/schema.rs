//! Schema description to Parquet message type, and back

use super::catalog::PARQUET_CATALOG;
use crate::catalog::LogicalTypeEntry;
use crate::decimal::fixed_length;
use crate::traits::SchemaConverter;
use crate::{
    ErrorContext, FieldDescriptor, FormatError, FormatField, FormatFieldList, Result,
    SchemaDescription,
};
use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::schema::types::{Type, TypePtr};
use std::sync::Arc;

pub const DEFAULT_MESSAGE_NAME: &str = "schema";

/// A primitive column resolved against the catalog
#[derive(Debug, Clone)]
pub struct ParquetColumn {
    pub name: String,
    pub entry: &'static LogicalTypeEntry,
    pub physical: PhysicalType,
    pub nullable: bool,
    pub precision: u32,
    pub scale: i32,
    pub length: i32,
}

impl ParquetColumn {
    /// Classify a primitive column.
    ///
    /// Returns `Ok(None)` for groups and repeated fields, which have no
    /// canonical counterpart.
    pub fn resolve(column: &Type) -> Result<Option<Self>> {
        let (physical, type_length, scale, precision) = match column {
            Type::PrimitiveType {
                physical_type,
                type_length,
                scale,
                precision,
                ..
            } => (*physical_type, *type_length, *scale, *precision),
            Type::GroupType { .. } => return Ok(None),
        };
        let info = column.get_basic_info();
        if info.has_repetition() && info.repetition() == Repetition::REPEATED {
            return Ok(None);
        }

        let annotation = annotation_of(column)?;
        let entry = PARQUET_CATALOG
            .find_native(physical_name(physical), annotation)
            .ok_or_else(|| {
                FormatError::unrecognized_native_type(
                    column.name(),
                    describe(physical, annotation),
                )
            })?;

        Ok(Some(Self {
            name: column.name().to_string(),
            entry,
            physical,
            nullable: !info.has_repetition() || info.repetition() == Repetition::OPTIONAL,
            precision: precision.max(0) as u32,
            scale,
            length: type_length,
        }))
    }

    pub fn format_field(&self) -> FormatField {
        let field = FormatField::new(&self.name, self.entry.id, self.entry.canonical);
        if self.entry.is_decimal() {
            field.with_precision_scale(self.precision, self.scale)
        } else {
            field
        }
    }
}

/// Builds message types from schema descriptions and introspects them
#[derive(Debug, Clone)]
pub struct ParquetSchemaConverter {
    message_name: String,
    format_fields: FormatFieldList,
}

impl Default for ParquetSchemaConverter {
    fn default() -> Self {
        Self {
            message_name: DEFAULT_MESSAGE_NAME.to_string(),
            format_fields: FormatFieldList::new(),
        }
    }
}

impl ParquetSchemaConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_name<S: Into<String>>(mut self, name: S) -> Self {
        self.message_name = name.into();
        self
    }

    /// Pin columns to explicit catalog entries by format field name
    pub fn with_format_fields(mut self, format_fields: FormatFieldList) -> Self {
        self.format_fields = format_fields;
        self
    }

    fn build_column(&self, field: &FieldDescriptor) -> Result<TypePtr> {
        let name = field.native_name();
        let (entry, precision, scale) = PARQUET_CATALOG.resolve_field(&self.format_fields, field)?;

        let physical = physical_type(entry.physical)?;
        let repetition = if field.allow_null {
            Repetition::OPTIONAL
        } else {
            Repetition::REQUIRED
        };

        let mut builder = Type::primitive_type_builder(name, physical)
            .with_repetition(repetition)
            .with_converted_type(converted_type(entry.annotation)?);

        if entry.is_decimal() {
            builder = builder
                .with_precision(precision as i32)
                .with_scale(scale);
            if physical == PhysicalType::FIXED_LEN_BYTE_ARRAY {
                builder = builder.with_length(fixed_length(precision) as i32);
            }
        } else if let Some(length) = entry.default_length {
            builder = builder.with_length(length as i32);
        }

        let column = builder
            .build()
            .with_context(|| format!("parquet column '{}'", name))?;
        Ok(Arc::new(column))
    }
}

impl SchemaConverter for ParquetSchemaConverter {
    type NativeSchema = Type;

    fn build_native_schema(&self, schema: &SchemaDescription) -> Result<Type> {
        let fields = schema
            .iter()
            .map(|field| self.build_column(field))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            message = %self.message_name,
            columns = fields.len(),
            "built parquet schema"
        );

        Ok(Type::group_type_builder(&self.message_name)
            .with_fields(fields)
            .build()?)
    }

    fn introspect(&self, native: &Type) -> Result<SchemaDescription> {
        let mut schema = SchemaDescription::new();
        for column in leaf_columns(native)? {
            let mut field = FieldDescriptor::new(&column.name, &column.name, column.entry.canonical);
            field.allow_null = column.nullable;
            schema.add_field(field);
        }
        Ok(schema)
    }

    fn introspect_format_fields(&self, native: &Type) -> Result<FormatFieldList> {
        let mut list = FormatFieldList::new();
        for column in leaf_columns(native)? {
            list.add_field(column.format_field());
        }
        Ok(list)
    }
}

/// Top level primitive columns of a message, skipping nested ones
pub fn leaf_columns(message: &Type) -> Result<Vec<ParquetColumn>> {
    if !message.is_group() {
        return Err(FormatError::malformed_schema(format!(
            "'{}' is not a message type",
            message.name()
        )));
    }

    let mut columns = Vec::new();
    for field in message.get_fields() {
        match ParquetColumn::resolve(field)? {
            Some(column) => columns.push(column),
            None => tracing::debug!(column = field.name(), "skipping nested parquet column"),
        }
    }
    Ok(columns)
}


fn physical_name(physical: PhysicalType) -> &'static str {
    match physical {
        PhysicalType::BOOLEAN => "BOOLEAN",
        PhysicalType::INT32 => "INT32",
        PhysicalType::INT64 => "INT64",
        PhysicalType::INT96 => "INT96",
        PhysicalType::FLOAT => "FLOAT",
        PhysicalType::DOUBLE => "DOUBLE",
        PhysicalType::BYTE_ARRAY => "BYTE_ARRAY",
        PhysicalType::FIXED_LEN_BYTE_ARRAY => "FIXED_LEN_BYTE_ARRAY",
    }
}

fn physical_type(name: &str) -> Result<PhysicalType> {
    Ok(match name {
        "BOOLEAN" => PhysicalType::BOOLEAN,
        "INT32" => PhysicalType::INT32,
        "INT64" => PhysicalType::INT64,
        "INT96" => PhysicalType::INT96,
        "FLOAT" => PhysicalType::FLOAT,
        "DOUBLE" => PhysicalType::DOUBLE,
        "BYTE_ARRAY" => PhysicalType::BYTE_ARRAY,
        "FIXED_LEN_BYTE_ARRAY" => PhysicalType::FIXED_LEN_BYTE_ARRAY,
        other => return Err(FormatError::internal(format!("physical type {}", other))),
    })
}

fn converted_type(annotation: Option<&str>) -> Result<ConvertedType> {
    Ok(match annotation {
        None => ConvertedType::NONE,
        Some("UTF8") => ConvertedType::UTF8,
        Some("ENUM") => ConvertedType::ENUM,
        Some("JSON") => ConvertedType::JSON,
        Some("BSON") => ConvertedType::BSON,
        Some("DECIMAL") => ConvertedType::DECIMAL,
        Some("DATE") => ConvertedType::DATE,
        Some("TIME_MILLIS") => ConvertedType::TIME_MILLIS,
        Some("TIMESTAMP_MILLIS") => ConvertedType::TIMESTAMP_MILLIS,
        Some("TIMESTAMP_MICROS") => ConvertedType::TIMESTAMP_MICROS,
        Some("INT_8") => ConvertedType::INT_8,
        Some("INT_16") => ConvertedType::INT_16,
        Some("UINT_8") => ConvertedType::UINT_8,
        Some("UINT_16") => ConvertedType::UINT_16,
        Some("UINT_32") => ConvertedType::UINT_32,
        Some("INTERVAL") => ConvertedType::INTERVAL,
        Some(other) => return Err(FormatError::internal(format!("annotation {}", other))),
    })
}

/// The catalog annotation of a column, from its converted type.
///
/// Columns carrying only a logical type with no converted type equivalent
/// (nanosecond timestamps, float16, ...) are not recognized.
fn annotation_of(column: &Type) -> Result<Option<&'static str>> {
    let info = column.get_basic_info();
    let annotation = match info.converted_type() {
        ConvertedType::NONE => match info.logical_type() {
            None => None,
            Some(logical) => {
                return Err(FormatError::unrecognized_native_type(
                    column.name(),
                    format!("{:?}", logical),
                ))
            }
        },
        ConvertedType::INT_32 | ConvertedType::INT_64 => None,
        ConvertedType::UTF8 => Some("UTF8"),
        ConvertedType::ENUM => Some("ENUM"),
        ConvertedType::JSON => Some("JSON"),
        ConvertedType::BSON => Some("BSON"),
        ConvertedType::DECIMAL => Some("DECIMAL"),
        ConvertedType::DATE => Some("DATE"),
        ConvertedType::TIME_MILLIS => Some("TIME_MILLIS"),
        ConvertedType::TIMESTAMP_MILLIS => Some("TIMESTAMP_MILLIS"),
        ConvertedType::TIMESTAMP_MICROS => Some("TIMESTAMP_MICROS"),
        ConvertedType::INT_8 => Some("INT_8"),
        ConvertedType::INT_16 => Some("INT_16"),
        ConvertedType::UINT_8 => Some("UINT_8"),
        ConvertedType::UINT_16 => Some("UINT_16"),
        ConvertedType::UINT_32 => Some("UINT_32"),
        ConvertedType::INTERVAL => Some("INTERVAL"),
        other => {
            return Err(FormatError::unrecognized_native_type(
                column.name(),
                format!("{} ({:?})", physical_name(column.get_physical_type()), other),
            ))
        }
    };
    Ok(annotation)
}

fn describe(physical: PhysicalType, annotation: Option<&str>) -> String {
    match annotation {
        Some(annotation) => format!("{} ({})", physical_name(physical), annotation),
        None => physical_name(physical).to_string(),
    }
}
