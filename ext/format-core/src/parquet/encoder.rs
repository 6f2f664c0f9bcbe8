//! Canonical rows to Parquet physical values

use super::catalog as ids;
use super::int96;
use super::schema::{leaf_columns, ParquetColumn};
use super::{ParquetRecord, PhysicalValue};
use crate::defaults::resolve_value;
use crate::temporal::epoch_units;
use crate::traits::RecordEncoder;
use crate::{
    CanonicalValue, Decimal, EncoderOptions, FieldDescriptor, FormatError, Result,
    SchemaDescription,
};
use parquet::data_type::{ByteArray, FixedLenByteArray};
use parquet::schema::types::Type;

/// Encodes rows against a message type, one physical value per leaf column
#[derive(Debug, Clone)]
pub struct ParquetRecordEncoder {
    fields: Vec<FieldDescriptor>,
    columns: Vec<ParquetColumn>,
    /// Position in `columns` of each field
    targets: Vec<usize>,
    options: EncoderOptions,
}

impl ParquetRecordEncoder {
    pub fn new(schema: &SchemaDescription, message: &Type, options: EncoderOptions) -> Result<Self> {
        let columns = leaf_columns(message)?;
        let mut targets = Vec::with_capacity(schema.len());

        for field in schema {
            let name = field.native_name();
            let index = columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            let column = &columns[index];
            if column.entry.canonical != field.canonical_type {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!(
                        "{} field cannot be written to {} column",
                        field.canonical_type, column.entry.name
                    ),
                ));
            }
            targets.push(index);
        }

        if let Some(orphan) = columns
            .iter()
            .enumerate()
            .find(|(i, c)| !c.nullable && !targets.contains(i))
        {
            return Err(FormatError::required_field_missing(&orphan.1.name));
        }

        Ok(Self {
            fields: schema.fields().to_vec(),
            columns,
            targets,
            options,
        })
    }

    pub fn columns(&self) -> &[ParquetColumn] {
        &self.columns
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    fn encode_value(&self, column: &ParquetColumn, value: CanonicalValue) -> Result<PhysicalValue> {
        let name = column.name.as_str();
        let mismatch = |value: &CanonicalValue| {
            FormatError::unsupported_field_type(
                name,
                format!("{} value for {} column", value.type_name(), column.entry.name),
            )
        };

        Ok(match (column.entry.id, value) {
            (ids::INT32, CanonicalValue::Integer(i)) => PhysicalValue::Int32(narrow(name, i, i32::MIN as i64, i32::MAX as i64)? as i32),
            (ids::INT8, CanonicalValue::Integer(i)) => PhysicalValue::Int32(narrow(name, i, i8::MIN as i64, i8::MAX as i64)? as i32),
            (ids::INT16, CanonicalValue::Integer(i)) => PhysicalValue::Int32(narrow(name, i, i16::MIN as i64, i16::MAX as i64)? as i32),
            (ids::UINT8, CanonicalValue::Integer(i)) => PhysicalValue::Int32(narrow(name, i, 0, u8::MAX as i64)? as i32),
            (ids::UINT16, CanonicalValue::Integer(i)) => PhysicalValue::Int32(narrow(name, i, 0, u16::MAX as i64)? as i32),
            // Unsigned 32-bit values keep their bit pattern in the signed slot
            (ids::UINT32, CanonicalValue::Integer(i)) => {
                PhysicalValue::Int32(narrow(name, i, 0, u32::MAX as i64)? as u32 as i32)
            }
            (ids::TIME_MILLIS, CanonicalValue::Integer(i)) => {
                PhysicalValue::Int32(narrow(name, i, 0, 86_399_999)? as i32)
            }
            (ids::INT64, CanonicalValue::Integer(i)) => PhysicalValue::Int64(i),

            (ids::FLOAT, CanonicalValue::Number(n)) => PhysicalValue::Float(n.0 as f32),
            (ids::DOUBLE, CanonicalValue::Number(n)) => PhysicalValue::Double(n.0),
            (ids::BOOLEAN, CanonicalValue::Boolean(b)) => PhysicalValue::Boolean(b),

            (ids::UTF8 | ids::ENUM | ids::JSON, CanonicalValue::String(s)) => {
                PhysicalValue::ByteArray(ByteArray::from(s.as_bytes().to_vec()))
            }
            (ids::BINARY | ids::BSON, CanonicalValue::Binary(b)) => {
                PhysicalValue::ByteArray(ByteArray::from(b.to_vec()))
            }
            (ids::FIXED_LEN_BYTE_ARRAY | ids::INTERVAL, CanonicalValue::Binary(b)) => {
                if b.len() != column.length as usize {
                    return Err(FormatError::out_of_range(
                        name,
                        format!("{} bytes for a {} byte column", b.len(), column.length),
                    ));
                }
                PhysicalValue::FixedLenByteArray(FixedLenByteArray::from(b.to_vec()))
            }

            (
                ids::DECIMAL | ids::DECIMAL_INT32 | ids::DECIMAL_INT64 | ids::DECIMAL_FIXED_LEN_BYTE_ARRAY,
                CanonicalValue::BigNumber(d),
            ) => encode_decimal(column, &d)?,

            (ids::DATE, CanonicalValue::Date(date)) => {
                PhysicalValue::Int32(crate::temporal::days_since_epoch(date)?)
            }
            (ids::INT96, CanonicalValue::Timestamp(ts)) => {
                let tz = self.options.time_zone_for(name);
                PhysicalValue::Int96(int96::to_physical(&int96::encode(name, ts, tz)?))
            }
            (ids::TIMESTAMP_MILLIS, CanonicalValue::Timestamp(ts)) => {
                PhysicalValue::Int64(epoch_units(name, ts, 1_000_000)?)
            }
            (ids::TIMESTAMP_MICROS, CanonicalValue::Timestamp(ts)) => {
                PhysicalValue::Int64(epoch_units(name, ts, 1_000)?)
            }

            (_, value) => return Err(mismatch(&value)),
        })
    }
}

impl RecordEncoder for ParquetRecordEncoder {
    type Record = ParquetRecord;

    fn encode(&self, row: &[Option<CanonicalValue>]) -> Result<ParquetRecord> {
        FormatError::check_row_length(self.fields.len(), row.len())?;

        let mut record: ParquetRecord = vec![None; self.columns.len()];
        for ((field, value), &target) in self.fields.iter().zip(row).zip(&self.targets) {
            let column = &self.columns[target];
            record[target] = match resolve_value(field, value.as_ref(), &self.options)? {
                Some(value) => Some(self.encode_value(column, value)?),
                None if column.nullable => None,
                None => return Err(FormatError::required_field_missing(&column.name)),
            };
        }
        Ok(record)
    }
}

/// Rescale, check precision, and lay out the unscaled value for the column
fn encode_decimal(column: &ParquetColumn, value: &Decimal) -> Result<PhysicalValue> {
    let overflow = || FormatError::DecimalOverflow {
        field: column.name.clone(),
        precision: column.precision,
    };
    let rescaled = value.rescale(column.scale).ok_or_else(overflow)?;
    if !rescaled.fits_precision(column.precision) {
        return Err(overflow());
    }

    Ok(match column.entry.id {
        ids::DECIMAL_INT32 => {
            PhysicalValue::Int32(rescaled.to_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(overflow)?)
        }
        ids::DECIMAL_INT64 => PhysicalValue::Int64(rescaled.to_i64().ok_or_else(overflow)?),
        ids::DECIMAL_FIXED_LEN_BYTE_ARRAY => PhysicalValue::FixedLenByteArray(
            FixedLenByteArray::from(
                rescaled
                    .to_fixed_be_bytes(column.length as usize)
                    .ok_or_else(overflow)?,
            ),
        ),
        _ => PhysicalValue::ByteArray(ByteArray::from(rescaled.to_be_bytes())),
    })
}

fn narrow(field: &str, value: i64, min: i64, max: i64) -> Result<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(FormatError::out_of_range(
            field,
            format!("{} outside [{}, {}]", value, min, max),
        ))
    }
}
