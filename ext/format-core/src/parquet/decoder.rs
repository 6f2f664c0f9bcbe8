//! Parquet physical values back to canonical rows

use super::catalog as ids;
use super::int96;
use super::schema::{leaf_columns, ParquetColumn};
use super::PhysicalValue;
use crate::defaults::coerce;
use crate::temporal::{date_from_days, timestamp_from_micros, timestamp_from_millis};
use crate::traits::RecordDecoder;
use crate::{
    CanonicalType, CanonicalValue, Decimal, FieldDescriptor, FormatError, Result, Row,
    SchemaDescription,
};
use bytes::Bytes;
use ordered_float::OrderedFloat;
use parquet::schema::types::Type;
use std::sync::Arc;

/// How a leaf column's physical values become canonical values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Integer32,
    Unsigned32,
    Integer64,
    Boolean,
    Float,
    Double,
    Utf8,
    Bytes,
    DecimalInt32 { scale: i32 },
    DecimalInt64 { scale: i32 },
    DecimalBytes { scale: i32 },
    Date,
    Int96,
    TimestampMillis,
    TimestampMicros,
}

impl HandlerKind {
    fn for_column(column: &ParquetColumn) -> Result<Self> {
        let scale = column.scale;
        Ok(match column.entry.id {
            ids::INT32 | ids::INT8 | ids::INT16 | ids::UINT8 | ids::UINT16 | ids::TIME_MILLIS => {
                HandlerKind::Integer32
            }
            ids::UINT32 => HandlerKind::Unsigned32,
            ids::INT64 => HandlerKind::Integer64,
            ids::BOOLEAN => HandlerKind::Boolean,
            ids::FLOAT => HandlerKind::Float,
            ids::DOUBLE => HandlerKind::Double,
            ids::UTF8 | ids::ENUM | ids::JSON => HandlerKind::Utf8,
            ids::BINARY | ids::BSON | ids::FIXED_LEN_BYTE_ARRAY | ids::INTERVAL => HandlerKind::Bytes,
            ids::DECIMAL_INT32 => HandlerKind::DecimalInt32 { scale },
            ids::DECIMAL_INT64 => HandlerKind::DecimalInt64 { scale },
            ids::DECIMAL | ids::DECIMAL_FIXED_LEN_BYTE_ARRAY => HandlerKind::DecimalBytes { scale },
            ids::DATE => HandlerKind::Date,
            ids::INT96 => HandlerKind::Int96,
            ids::TIMESTAMP_MILLIS => HandlerKind::TimestampMillis,
            ids::TIMESTAMP_MICROS => HandlerKind::TimestampMicros,
            _ => {
                return Err(FormatError::unsupported_field_type(
                    &column.name,
                    format!("no decoder for {}", column.entry.name),
                ))
            }
        })
    }
}

/// Leaf handler for one schema field
#[derive(Debug, Clone)]
struct FieldHandler {
    field: FieldDescriptor,
    column: usize,
    kind: HandlerKind,
}

impl FieldHandler {
    fn decode(&self, value: &PhysicalValue) -> Result<CanonicalValue> {
        let decoded = self.decode_physical(value)?;
        if decoded.canonical_type() == self.field.canonical_type {
            Ok(decoded)
        } else {
            coerce(&self.field, &decoded)
        }
    }

    fn decode_physical(&self, value: &PhysicalValue) -> Result<CanonicalValue> {
        Ok(match (self.kind, value) {
            (HandlerKind::Integer32, PhysicalValue::Int32(v)) => CanonicalValue::Integer(*v as i64),
            (HandlerKind::Unsigned32, PhysicalValue::Int32(v)) => {
                CanonicalValue::Integer(*v as u32 as i64)
            }
            (HandlerKind::Integer64, PhysicalValue::Int64(v)) => CanonicalValue::Integer(*v),
            (HandlerKind::Boolean, PhysicalValue::Boolean(v)) => CanonicalValue::Boolean(*v),
            (HandlerKind::Float, PhysicalValue::Float(v)) => {
                CanonicalValue::Number(OrderedFloat(*v as f64))
            }
            (HandlerKind::Double, PhysicalValue::Double(v)) => CanonicalValue::Number(OrderedFloat(*v)),
            (HandlerKind::Utf8, PhysicalValue::ByteArray(v)) => {
                let text = std::str::from_utf8(v.data()).map_err(|e| {
                    FormatError::unsupported_field_type(self.field.native_name(), e.to_string())
                })?;
                CanonicalValue::String(Arc::from(text))
            }
            (HandlerKind::Bytes, PhysicalValue::ByteArray(v)) => {
                CanonicalValue::Binary(Bytes::copy_from_slice(v.data()))
            }
            (HandlerKind::Bytes, PhysicalValue::FixedLenByteArray(v)) => {
                CanonicalValue::Binary(Bytes::copy_from_slice(v.data()))
            }
            (HandlerKind::DecimalInt32 { scale }, PhysicalValue::Int32(v)) => {
                CanonicalValue::BigNumber(Decimal::new(*v, scale))
            }
            (HandlerKind::DecimalInt64 { scale }, PhysicalValue::Int64(v)) => {
                CanonicalValue::BigNumber(Decimal::new(*v, scale))
            }
            (HandlerKind::DecimalBytes { scale }, PhysicalValue::ByteArray(v)) => {
                CanonicalValue::BigNumber(Decimal::from_be_bytes(v.data(), scale))
            }
            (HandlerKind::DecimalBytes { scale }, PhysicalValue::FixedLenByteArray(v)) => {
                CanonicalValue::BigNumber(Decimal::from_be_bytes(v.data(), scale))
            }
            (HandlerKind::Date, PhysicalValue::Int32(days)) => {
                CanonicalValue::Date(date_from_days(*days as i64)?)
            }
            (HandlerKind::Int96, PhysicalValue::Int96(v)) => {
                CanonicalValue::Timestamp(int96::decode(&int96::from_physical(v))?)
            }
            (HandlerKind::TimestampMillis, PhysicalValue::Int64(v)) => {
                CanonicalValue::Timestamp(timestamp_from_millis(*v)?)
            }
            (HandlerKind::TimestampMicros, PhysicalValue::Int64(v)) => {
                CanonicalValue::Timestamp(timestamp_from_micros(*v)?)
            }
            (kind, value) => {
                return Err(FormatError::internal(format!(
                    "{:?} handler received {:?} for '{}'",
                    kind,
                    value,
                    self.field.native_name()
                )))
            }
        })
    }
}

/// Decodes leaf-ordered physical records into rows of a schema description
#[derive(Debug, Clone)]
pub struct ParquetRecordDecoder {
    handlers: Vec<FieldHandler>,
    columns: Vec<ParquetColumn>,
}

impl ParquetRecordDecoder {
    pub fn new(schema: &SchemaDescription, message: &Type) -> Result<Self> {
        let columns = leaf_columns(message)?;
        let handlers = schema
            .iter()
            .map(|field| {
                let name = field.native_name();
                let index = columns
                    .iter()
                    .position(|c| c.name == name)
                    .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
                let column = &columns[index];
                if !readable_as(column.entry.canonical, field.canonical_type) {
                    return Err(FormatError::unsupported_field_type(
                        name,
                        format!(
                            "{} column cannot be read as {}",
                            column.entry.name, field.canonical_type
                        ),
                    ));
                }
                Ok(FieldHandler {
                    field: field.clone(),
                    column: index,
                    kind: HandlerKind::for_column(column)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { handlers, columns })
    }

    /// Leaf columns of the message, in file order
    pub fn columns(&self) -> &[ParquetColumn] {
        &self.columns
    }

    /// Leaf column indices read by this decoder
    pub fn projected_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.handlers.iter().map(|h| h.column)
    }
}

impl RecordDecoder for ParquetRecordDecoder {
    type Record = [Option<PhysicalValue>];

    fn decode(&self, record: &[Option<PhysicalValue>]) -> Result<Row> {
        FormatError::check_row_length(self.columns.len(), record.len())?;
        self.handlers
            .iter()
            .map(|handler| match &record[handler.column] {
                Some(value) => handler.decode(value).map(Some),
                None => Ok(None),
            })
            .collect()
    }
}

/// A column of canonical type `stored` can fill a field of type `wanted`
fn readable_as(stored: CanonicalType, wanted: CanonicalType) -> bool {
    stored == wanted
        || matches!(
            (stored, wanted),
            (CanonicalType::Integer, CanonicalType::Number)
                | (CanonicalType::Integer, CanonicalType::BigNumber)
        )
}
