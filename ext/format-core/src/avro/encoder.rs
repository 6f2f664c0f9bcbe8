//! Canonical rows to Avro generic records

use super::catalog as ids;
use super::schema::{leaf_columns, AvroColumn};
use crate::defaults::resolve_value;
use crate::temporal::{days_since_epoch, epoch_units};
use crate::traits::RecordEncoder;
use crate::{
    CanonicalValue, Decimal, EncoderOptions, FieldDescriptor, FormatError, Result,
    SchemaDescription,
};
use apache_avro::types::Value;
use apache_avro::Schema;

/// Encodes rows as `Value::Record`s of a record schema
#[derive(Debug, Clone)]
pub struct AvroRecordEncoder {
    fields: Vec<FieldDescriptor>,
    columns: Vec<AvroColumn>,
    /// Position in `columns` of each field
    targets: Vec<usize>,
    options: EncoderOptions,
}

impl AvroRecordEncoder {
    pub fn new(schema: &SchemaDescription, native: &Schema, options: EncoderOptions) -> Result<Self> {
        let columns = leaf_columns(native)?;
        let mut targets = Vec::with_capacity(schema.len());
        for field in schema {
            let name = field.native_name();
            let index = columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            match columns[index].entry {
                Some(entry) if entry.canonical == field.canonical_type => targets.push(index),
                Some(entry) => {
                    return Err(FormatError::unsupported_field_type(
                        name,
                        format!(
                            "{} field cannot be written to {} column",
                            field.canonical_type, entry.name
                        ),
                    ))
                }
                None => return Err(FormatError::unsupported_field_type(name, "nested column")),
            }
        }

        if let Some((_, orphan)) = columns
            .iter()
            .enumerate()
            .find(|(i, c)| !c.nullable() && !targets.contains(i))
        {
            return Err(FormatError::required_field_missing(&orphan.name));
        }

        Ok(Self {
            fields: schema.fields().to_vec(),
            columns,
            targets,
            options,
        })
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    fn encode_value(&self, column: &AvroColumn, value: CanonicalValue) -> Result<Value> {
        let name = column.name.as_str();
        let entry_id = column.entry.map(|e| e.id);
        Ok(match (entry_id, value) {
            (Some(ids::BOOLEAN), CanonicalValue::Boolean(b)) => Value::Boolean(b),
            (Some(ids::INTEGER), CanonicalValue::Integer(i)) => {
                Value::Int(i32::try_from(i).map_err(|_| {
                    FormatError::out_of_range(name, format!("{} does not fit an Avro int", i))
                })?)
            }
            (Some(ids::LONG), CanonicalValue::Integer(i)) => Value::Long(i),
            (Some(ids::TIME_MILLIS), CanonicalValue::Integer(i)) => {
                if !(0..86_400_000).contains(&i) {
                    return Err(FormatError::out_of_range(
                        name,
                        format!("{} is not a millisecond of the day", i),
                    ));
                }
                Value::TimeMillis(i as i32)
            }
            (Some(ids::FLOAT), CanonicalValue::Number(n)) => Value::Float(n.0 as f32),
            (Some(ids::DOUBLE), CanonicalValue::Number(n)) => Value::Double(n.0),
            (Some(ids::STRING), CanonicalValue::String(s)) => Value::String(s.to_string()),
            (Some(ids::BYTES), CanonicalValue::Binary(b)) => Value::Bytes(b.to_vec()),
            (Some(ids::FIXED), CanonicalValue::Binary(b)) => {
                if b.len() != column.size {
                    return Err(FormatError::out_of_range(
                        name,
                        format!("{} bytes for a {} byte fixed", b.len(), column.size),
                    ));
                }
                Value::Fixed(column.size, b.to_vec())
            }
            (Some(ids::DECIMAL | ids::DECIMAL_FIXED), CanonicalValue::BigNumber(d)) => {
                Value::Decimal(encode_decimal(column, &d)?)
            }
            (Some(ids::DATE), CanonicalValue::Date(date)) => Value::Date(days_since_epoch(date)?),
            (Some(ids::TIMESTAMP_MILLIS), CanonicalValue::Timestamp(ts)) => {
                Value::TimestampMillis(epoch_units(name, ts, 1_000_000)?)
            }
            (Some(ids::TIMESTAMP_MICROS), CanonicalValue::Timestamp(ts)) => {
                Value::TimestampMicros(epoch_units(name, ts, 1_000)?)
            }
            (_, value) => {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!(
                        "{} value for {} column",
                        value.type_name(),
                        column.entry.map_or("nested", |e| e.name)
                    ),
                ))
            }
        })
    }
}

impl RecordEncoder for AvroRecordEncoder {
    type Record = Value;

    fn encode(&self, row: &[Option<CanonicalValue>]) -> Result<Value> {
        FormatError::check_row_length(self.fields.len(), row.len())?;

        let mut values: Vec<Option<Value>> = vec![None; self.columns.len()];
        for ((field, value), &target) in self.fields.iter().zip(row).zip(&self.targets) {
            let column = &self.columns[target];
            if let Some(value) = resolve_value(field, value.as_ref(), &self.options)? {
                values[target] = Some(self.encode_value(column, value)?);
            }
        }

        let fields = self
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| {
                let value = match (column.branches, value) {
                    (Some(branches), Some(v)) => Value::Union(branches.value, Box::new(v)),
                    (Some(branches), None) => Value::Union(branches.null, Box::new(Value::Null)),
                    (None, Some(v)) => v,
                    (None, None) => return Err(FormatError::required_field_missing(&column.name)),
                };
                Ok((column.name.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Record(fields))
    }
}

/// Rescale, check precision, and lay out the two's complement bytes
fn encode_decimal(column: &AvroColumn, value: &Decimal) -> Result<apache_avro::Decimal> {
    let overflow = || FormatError::DecimalOverflow {
        field: column.name.clone(),
        precision: column.precision,
    };
    let rescaled = value.rescale(column.scale).ok_or_else(overflow)?;
    if !rescaled.fits_precision(column.precision) {
        return Err(overflow());
    }
    let bytes = if column.entry.map(|e| e.id) == Some(ids::DECIMAL_FIXED) {
        rescaled.to_fixed_be_bytes(column.size).ok_or_else(overflow)?
    } else {
        rescaled.to_be_bytes()
    };
    Ok(apache_avro::Decimal::from(bytes))
}
