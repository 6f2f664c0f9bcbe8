//! Schema description to ORC struct type, and back

use super::catalog::{self as ids, ORC_CATALOG};
use super::types::OrcType;
use crate::catalog::LogicalTypeEntry;
use crate::traits::SchemaConverter;
use crate::{FieldDescriptor, FormatError, FormatField, FormatFieldList, Result, SchemaDescription};

/// A primitive top level column resolved against the catalog
#[derive(Debug, Clone)]
pub struct OrcColumn {
    pub name: String,
    pub entry: &'static LogicalTypeEntry,
    pub ty: OrcType,
}

impl OrcColumn {
    pub fn format_field(&self) -> FormatField {
        let field = FormatField::new(&self.name, self.entry.id, self.entry.canonical);
        match self.ty {
            OrcType::Decimal { precision, scale } => field.with_precision_scale(precision, scale),
            OrcType::Char(length) | OrcType::VarChar(length) => {
                let mut field = field;
                field.precision = Some(length);
                field
            }
            _ => field,
        }
    }
}

/// Builds ORC struct types from schema descriptions and introspects them.
///
/// For char and varchar overrides the format field precision is the maximum
/// length in characters.
#[derive(Debug, Clone, Default)]
pub struct OrcSchemaConverter {
    format_fields: FormatFieldList,
}

impl OrcSchemaConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format_fields(mut self, format_fields: FormatFieldList) -> Self {
        self.format_fields = format_fields;
        self
    }

    fn build_column(&self, field: &FieldDescriptor) -> Result<OrcType> {
        let name = field.native_name();
        let (entry, precision, scale) = ORC_CATALOG.resolve_field(&self.format_fields, field)?;
        let length = || {
            self.format_fields
                .find(name)
                .and_then(|f| f.precision)
                .or(entry.default_length)
                .unwrap_or(0)
        };

        Ok(match entry.id {
            ids::BOOLEAN => OrcType::Boolean,
            ids::TINYINT => OrcType::TinyInt,
            ids::SMALLINT => OrcType::SmallInt,
            ids::INTEGER => OrcType::Int,
            ids::BIGINT => OrcType::BigInt,
            ids::FLOAT => OrcType::Float,
            ids::DOUBLE => OrcType::Double,
            ids::DECIMAL => OrcType::decimal(precision, scale).map_err(|_| {
                FormatError::unsupported_field_type(
                    name,
                    format!("decimal({},{}) is not a valid ORC decimal", precision, scale),
                )
            })?,
            ids::CHAR => OrcType::Char(length()),
            ids::VARCHAR => OrcType::VarChar(length()),
            ids::STRING => OrcType::String,
            ids::BINARY => OrcType::Binary,
            ids::DATE => OrcType::Date,
            ids::TIMESTAMP => OrcType::Timestamp,
            _ => {
                return Err(FormatError::UnsupportedCanonicalType(format!(
                    "{} for field '{}'",
                    entry.name, name
                )))
            }
        })
    }
}

impl SchemaConverter for OrcSchemaConverter {
    type NativeSchema = OrcType;

    fn build_native_schema(&self, schema: &SchemaDescription) -> Result<OrcType> {
        let fields = schema
            .iter()
            .map(|field| Ok((field.native_name().to_string(), self.build_column(field)?)))
            .collect::<Result<Vec<_>>>()?;

        let ty = OrcType::Struct(fields);
        tracing::debug!(schema = %ty, "built orc schema");
        Ok(ty)
    }

    fn introspect(&self, native: &OrcType) -> Result<SchemaDescription> {
        let mut schema = SchemaDescription::new();
        for column in leaf_columns(native)? {
            // ORC columns carry no nullability
            schema.add_field(FieldDescriptor::new(&column.name, &column.name, column.entry.canonical));
        }
        Ok(schema)
    }

    fn introspect_format_fields(&self, native: &OrcType) -> Result<FormatFieldList> {
        let mut list = FormatFieldList::new();
        for column in leaf_columns(native)? {
            list.add_field(column.format_field());
        }
        Ok(list)
    }
}

/// Top level primitive columns of a struct type, skipping nested ones
pub fn leaf_columns(native: &OrcType) -> Result<Vec<OrcColumn>> {
    let fields = native.fields().ok_or_else(|| {
        FormatError::malformed_schema(format!("'{}' is not a struct type", native))
    })?;

    let mut columns = Vec::with_capacity(fields.len());
    for (name, ty) in fields {
        if !ty.is_primitive() {
            tracing::debug!(column = %name, kind = ty.kind_name(), "skipping nested orc column");
            continue;
        }
        let entry = ORC_CATALOG
            .find_native(ty.kind_name(), None)
            .ok_or_else(|| FormatError::unrecognized_native_type(name, ty.to_string()))?;
        columns.push(OrcColumn {
            name: name.clone(),
            entry,
            ty: ty.clone(),
        });
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanonicalType;

    fn description() -> SchemaDescription {
        SchemaDescription::new()
            .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
            .with_field(FieldDescriptor::new("name", "NAME", CanonicalType::String))
            .with_field(FieldDescriptor::new("amount", "AMOUNT", CanonicalType::BigNumber))
            .with_field(FieldDescriptor::new("born", "BORN", CanonicalType::Date))
            .with_field(FieldDescriptor::new("seen", "SEEN", CanonicalType::Timestamp))
    }

    #[test]
    fn test_default_mapping() {
        let ty = OrcSchemaConverter::new().build_native_schema(&description()).unwrap();
        assert_eq!(
            ty.to_string(),
            "struct<id:bigint,name:string,amount:decimal(20,10),born:date,seen:timestamp>"
        );
    }

    #[test]
    fn test_overrides() {
        let overrides = FormatFieldList::new()
            .with_field(FormatField::new("id", ids::INTEGER, CanonicalType::Integer))
            .with_field({
                let mut f = FormatField::new("name", ids::VARCHAR, CanonicalType::String);
                f.precision = Some(40);
                f
            })
            .with_field(FormatField::new("amount", ids::DECIMAL, CanonicalType::BigNumber).with_precision_scale(12, 3));
        let ty = OrcSchemaConverter::new()
            .with_format_fields(overrides.clone())
            .build_native_schema(&description())
            .unwrap();
        assert_eq!(
            ty.to_string(),
            "struct<id:int,name:varchar(40),amount:decimal(12,3),born:date,seen:timestamp>"
        );

        let reported = OrcSchemaConverter::new().introspect_format_fields(&ty).unwrap();
        assert_eq!(reported.fields()[..3], overrides.fields()[..]);
    }

    #[test]
    fn test_invalid_decimal() {
        let overrides = FormatFieldList::new()
            .with_field(FormatField::new("amount", ids::DECIMAL, CanonicalType::BigNumber).with_precision_scale(40, 2));
        assert!(matches!(
            OrcSchemaConverter::new()
                .with_format_fields(overrides)
                .build_native_schema(&description()),
            Err(FormatError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_introspect_skips_complex_and_allows_null() {
        let ty: OrcType = "struct<id:int,tags:array<string>,flag:boolean,props:map<string,string>>"
            .parse()
            .unwrap();
        let schema = OrcSchemaConverter::new().introspect(&ty).unwrap();
        let names: Vec<_> = schema.iter().map(|f| f.native_name()).collect();
        assert_eq!(names, vec!["id", "flag"]);
        assert!(schema.iter().all(|f| f.allow_null));
        assert_eq!(schema.fields()[1].canonical_type, CanonicalType::Boolean);
    }

    #[test]
    fn test_serializable_rejected() {
        let schema = SchemaDescription::new()
            .with_field(FieldDescriptor::new("o", "O", CanonicalType::Inet));
        assert!(matches!(
            OrcSchemaConverter::new().build_native_schema(&schema),
            Err(FormatError::UnsupportedCanonicalType(_))
        ));
    }
}
