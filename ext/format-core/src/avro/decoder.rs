//! Avro generic records to canonical rows

use super::catalog as ids;
use super::schema::{leaf_columns, AvroColumn};
use crate::defaults::coerce;
use crate::temporal::{date_from_days, timestamp_from_micros, timestamp_from_millis};
use crate::traits::RecordDecoder;
use crate::{
    CanonicalType, CanonicalValue, Decimal, FieldDescriptor, FormatError, Result, Row,
    SchemaDescription,
};
use apache_avro::types::Value;
use apache_avro::Schema;
use bytes::Bytes;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

#[derive(Debug, Clone)]
struct FieldHandler {
    field: FieldDescriptor,
    column: AvroColumn,
}

impl FieldHandler {
    fn decode(&self, value: &Value) -> Result<Option<CanonicalValue>> {
        let value = match value {
            Value::Union(_, inner) => inner.as_ref(),
            other => other,
        };
        let name = self.column.name.as_str();
        let decoded = match value {
            Value::Null => return Ok(None),
            Value::Boolean(b) => CanonicalValue::Boolean(*b),
            Value::Int(i) => CanonicalValue::Integer(*i as i64),
            Value::Long(i) => CanonicalValue::Integer(*i),
            Value::TimeMillis(i) => CanonicalValue::Integer(*i as i64),
            Value::Float(f) => CanonicalValue::Number(OrderedFloat(*f as f64)),
            Value::Double(f) => CanonicalValue::Number(OrderedFloat(*f)),
            Value::String(s) => CanonicalValue::string(s),
            Value::Bytes(b) | Value::Fixed(_, b) => CanonicalValue::Binary(Bytes::copy_from_slice(b)),
            Value::Date(days) => CanonicalValue::Date(date_from_days(*days as i64)?),
            Value::TimestampMillis(ms) => CanonicalValue::Timestamp(timestamp_from_millis(*ms)?),
            Value::TimestampMicros(us) => CanonicalValue::Timestamp(timestamp_from_micros(*us)?),
            Value::Decimal(d) => {
                let bytes = Vec::<u8>::try_from(d)?;
                CanonicalValue::BigNumber(Decimal::from_be_bytes(&bytes, self.column.scale))
            }
            other => {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!("unexpected avro value {:?}", other),
                ))
            }
        };

        if decoded.canonical_type() == self.field.canonical_type {
            Ok(Some(decoded))
        } else {
            coerce(&self.field, &decoded).map(Some)
        }
    }
}

/// Decodes `Value::Record`s of one record schema.
///
/// Fields are looked up by name, so records carrying extra fields decode
/// the same way.
#[derive(Debug, Clone)]
pub struct AvroRecordDecoder {
    handlers: Vec<FieldHandler>,
}

impl AvroRecordDecoder {
    pub fn new(schema: &SchemaDescription, native: &Schema) -> Result<Self> {
        let columns: IndexMap<String, AvroColumn> = leaf_columns(native)?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        let mut handlers = Vec::with_capacity(schema.len());
        for field in schema {
            let name = field.native_name();
            let column = columns
                .get(name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            let native = column.entry.map_or(CanonicalType::None, |e| e.canonical);
            if !readable_as(native, field.canonical_type) {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!(
                        "{} column cannot be read as {}",
                        column.entry.map_or("nested", |e| e.name),
                        field.canonical_type
                    ),
                ));
            }
            handlers.push(FieldHandler {
                field: field.clone(),
                column: column.clone(),
            });
        }
        Ok(Self { handlers })
    }
}

fn readable_as(native: CanonicalType, wanted: CanonicalType) -> bool {
    native != CanonicalType::None
        && (native == wanted
            || (native == CanonicalType::Integer
                && matches!(wanted, CanonicalType::Number | CanonicalType::BigNumber)))
}

impl RecordDecoder for AvroRecordDecoder {
    type Record = Value;

    fn decode(&self, record: &Value) -> Result<Row> {
        let fields = match record {
            Value::Record(fields) => fields,
            other => {
                return Err(FormatError::internal(format!(
                    "expected an avro record, got {:?}",
                    other
                )))
            }
        };

        self.handlers
            .iter()
            .map(|handler| {
                let position = handler.column.position;
                let value = match fields.get(position) {
                    Some((name, value)) if *name == handler.column.name => Some(value),
                    _ => fields
                        .iter()
                        .find(|(name, _)| *name == handler.column.name)
                        .map(|(_, value)| value),
                };
                match value {
                    Some(value) => handler.decode(value),
                    None => Ok(None),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avro::encoder::AvroRecordEncoder;
    use crate::avro::schema::AvroSchemaConverter;
    use crate::traits::{RecordEncoder, SchemaConverter};
    use crate::{EncoderOptions, FormatField, FormatFieldList};
    use jiff::civil::date;

    fn schema() -> SchemaDescription {
        SchemaDescription::new()
            .with_field(FieldDescriptor::new("b", "B", CanonicalType::Boolean))
            .with_field(FieldDescriptor::new("i", "I", CanonicalType::Integer))
            .with_field(FieldDescriptor::new("n", "N", CanonicalType::Number))
            .with_field(FieldDescriptor::new("s", "S", CanonicalType::String))
            .with_field(FieldDescriptor::new("x", "X", CanonicalType::Binary))
            .with_field(FieldDescriptor::new("d", "D", CanonicalType::Date))
            .with_field(FieldDescriptor::new("t", "T", CanonicalType::Timestamp))
            .with_field(FieldDescriptor::new("m", "M", CanonicalType::BigNumber))
    }

    #[test]
    fn test_record_roundtrip() {
        let overrides = FormatFieldList::new()
            .with_field(FormatField::new("t", ids::TIMESTAMP_MICROS, CanonicalType::Timestamp))
            .with_field(FormatField::new("m", ids::DECIMAL_FIXED, CanonicalType::BigNumber).with_precision_scale(30, 4));
        let native = AvroSchemaConverter::new()
            .with_format_fields(overrides)
            .build_native_schema(&schema())
            .unwrap();
        let encoder = AvroRecordEncoder::new(&schema(), &native, EncoderOptions::default()).unwrap();
        let decoder = AvroRecordDecoder::new(&schema(), &native).unwrap();

        let row: Row = vec![
            Some(CanonicalValue::Boolean(false)),
            Some(CanonicalValue::Integer(-5)),
            Some(CanonicalValue::number(0.25)),
            Some(CanonicalValue::string("ünïcode")),
            Some(CanonicalValue::binary(vec![9u8; 3])),
            Some(CanonicalValue::Date(date(1900, 3, 1))),
            Some(CanonicalValue::Timestamp("1960-05-05T01:02:03.000004Z".parse().unwrap())),
            Some(CanonicalValue::BigNumber("-12345678901234567890.1234".parse().unwrap())),
        ];
        let record = encoder.encode(&row).unwrap();
        assert_eq!(decoder.decode(&record).unwrap(), row);

        let empty = encoder.encode(&vec![None; 8]).unwrap();
        assert_eq!(decoder.decode(&empty).unwrap(), vec![None::<CanonicalValue>; 8]);
    }

    #[test]
    fn test_projection_and_widening() {
        let native = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "skip", "type": "string"},
                {"name": "count", "type": "int"},
                {"name": "tags", "type": {"type": "array", "items": "string"}}
            ]}"#,
        )
        .unwrap();
        let wanted = SchemaDescription::new()
            .with_field(FieldDescriptor::new("count", "C", CanonicalType::BigNumber));
        let decoder = AvroRecordDecoder::new(&wanted, &native).unwrap();

        let record = Value::Record(vec![
            ("skip".to_string(), Value::String("x".to_string())),
            ("count".to_string(), Value::Int(12)),
            ("tags".to_string(), Value::Array(vec![])),
        ]);
        assert_eq!(
            decoder.decode(&record).unwrap(),
            vec![Some(CanonicalValue::BigNumber(Decimal::from(12)))]
        );

        let nested = SchemaDescription::new().with_field(FieldDescriptor::new("tags", "T", CanonicalType::String));
        assert!(matches!(
            AvroRecordDecoder::new(&nested, &native),
            Err(FormatError::UnsupportedFieldType { .. })
        ));
        let wrong = SchemaDescription::new().with_field(FieldDescriptor::new("skip", "S", CanonicalType::Date));
        assert!(AvroRecordDecoder::new(&wrong, &native).is_err());
    }
}
