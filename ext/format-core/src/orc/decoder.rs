//! Arrow column vectors to canonical rows

use super::catalog::ORC_CATALOG;
use super::types::OrcType;
use crate::defaults::coerce;
use crate::temporal::{
    date_from_days, timestamp_from_micros, timestamp_from_millis, timestamp_from_nanos,
    MILLIS_PER_DAY,
};
use crate::traits::BatchDecoder;
use crate::{
    CanonicalType, CanonicalValue, Decimal, FieldDescriptor, FormatError, Result, Row,
    SchemaDescription,
};
use arrow_array::{
    Array, BinaryArray, BooleanArray, Date32Array, Date64Array, Decimal128Array, Decimal256Array,
    FixedSizeBinaryArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeBinaryArray, LargeStringArray, RecordBatch, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow_schema::{DataType, Schema, TimeUnit};
use bytes::Bytes;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

#[derive(Debug, Clone)]
struct FieldHandler {
    field: FieldDescriptor,
    column: usize,
    /// Canonical type the column decodes to before widening
    native: CanonicalType,
}

/// Decodes rows of record batches into canonical rows.
///
/// Columns are found by name once; extra columns in the batch are ignored.
#[derive(Debug, Clone)]
pub struct OrcBatchDecoder {
    handlers: Vec<FieldHandler>,
}

impl OrcBatchDecoder {
    pub fn new(schema: &SchemaDescription, batch_schema: &Schema) -> Result<Self> {
        let index: IndexMap<&str, usize> = batch_schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().as_str(), i))
            .collect();

        let mut handlers = Vec::with_capacity(schema.len());
        for field in schema {
            let name = field.native_name();
            let column = *index
                .get(name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            let ty = OrcType::from_arrow_field(batch_schema.field(column))?;
            let native = ORC_CATALOG
                .find_native(ty.kind_name(), None)
                .map(|entry| entry.canonical)
                .unwrap_or(CanonicalType::None);

            if !readable_as(native, field.canonical_type) {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!("{} column cannot be read as {}", ty, field.canonical_type),
                ));
            }
            handlers.push(FieldHandler {
                field: field.clone(),
                column,
                native,
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

impl BatchDecoder for OrcBatchDecoder {
    type Batch = RecordBatch;

    fn decode_row(&self, batch: &RecordBatch, row: usize) -> Result<Row> {
        if row >= batch.num_rows() {
            return Err(FormatError::internal(format!(
                "row {} of a {} row batch",
                row,
                batch.num_rows()
            )));
        }

        self.handlers
            .iter()
            .map(|handler| {
                let array = batch.columns().get(handler.column).ok_or_else(|| {
                    FormatError::internal(format!("batch has no column {}", handler.column))
                })?;
                if array.is_null(row) {
                    return Ok(None);
                }
                let value = scalar_value(handler.field.native_name(), array.as_ref(), row)?;
                if handler.native == handler.field.canonical_type {
                    Ok(Some(value))
                } else {
                    coerce(&handler.field, &value).map(Some)
                }
            })
            .collect()
    }
}

/// Copy one non-null value out of an array
fn scalar_value(name: &str, array: &dyn Array, index: usize) -> Result<CanonicalValue> {
    Ok(match array.data_type() {
        DataType::Boolean => CanonicalValue::Boolean(downcast_array::<BooleanArray>(array)?.value(index)),
        DataType::Int8 => CanonicalValue::Integer(downcast_array::<Int8Array>(array)?.value(index) as i64),
        DataType::Int16 => CanonicalValue::Integer(downcast_array::<Int16Array>(array)?.value(index) as i64),
        DataType::Int32 => CanonicalValue::Integer(downcast_array::<Int32Array>(array)?.value(index) as i64),
        DataType::Int64 => CanonicalValue::Integer(downcast_array::<Int64Array>(array)?.value(index)),
        DataType::Float32 => CanonicalValue::Number(OrderedFloat(
            downcast_array::<Float32Array>(array)?.value(index) as f64,
        )),
        DataType::Float64 => {
            CanonicalValue::Number(OrderedFloat(downcast_array::<Float64Array>(array)?.value(index)))
        }
        DataType::Decimal128(_, scale) => {
            let unscaled = downcast_array::<Decimal128Array>(array)?.value(index);
            CanonicalValue::BigNumber(Decimal::new(unscaled, *scale as i32))
        }
        DataType::Decimal256(_, scale) => {
            let unscaled = downcast_array::<Decimal256Array>(array)?.value(index);
            CanonicalValue::BigNumber(Decimal::from_be_bytes(&unscaled.to_be_bytes(), *scale as i32))
        }
        DataType::Utf8 => CanonicalValue::string(downcast_array::<StringArray>(array)?.value(index)),
        DataType::LargeUtf8 => {
            CanonicalValue::string(downcast_array::<LargeStringArray>(array)?.value(index))
        }
        DataType::Binary => CanonicalValue::Binary(Bytes::copy_from_slice(
            downcast_array::<BinaryArray>(array)?.value(index),
        )),
        DataType::LargeBinary => CanonicalValue::Binary(Bytes::copy_from_slice(
            downcast_array::<LargeBinaryArray>(array)?.value(index),
        )),
        DataType::FixedSizeBinary(_) => CanonicalValue::Binary(Bytes::copy_from_slice(
            downcast_array::<FixedSizeBinaryArray>(array)?.value(index),
        )),
        DataType::Date32 => {
            CanonicalValue::Date(date_from_days(downcast_array::<Date32Array>(array)?.value(index) as i64)?)
        }
        DataType::Date64 => {
            let millis = downcast_array::<Date64Array>(array)?.value(index);
            CanonicalValue::Date(date_from_days(millis.div_euclid(MILLIS_PER_DAY))?)
        }
        DataType::Timestamp(unit, _) => CanonicalValue::Timestamp(match unit {
            TimeUnit::Second => {
                let seconds = downcast_array::<TimestampSecondArray>(array)?.value(index);
                jiff::Timestamp::from_second(seconds)?
            }
            TimeUnit::Millisecond => {
                timestamp_from_millis(downcast_array::<TimestampMillisecondArray>(array)?.value(index))?
            }
            TimeUnit::Microsecond => {
                timestamp_from_micros(downcast_array::<TimestampMicrosecondArray>(array)?.value(index))?
            }
            TimeUnit::Nanosecond => {
                timestamp_from_nanos(downcast_array::<TimestampNanosecondArray>(array)?.value(index))?
            }
        }),
        other => {
            return Err(FormatError::unrecognized_native_type(name, other.to_string()));
        }
    })
}

fn downcast_array<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        FormatError::internal(format!("failed to cast to {}", std::any::type_name::<T>()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orc::encoder::OrcBatchEncoder;
    use crate::traits::BatchEncoder;
    use crate::EncoderOptions;
    use arrow_array::builder::Decimal256Builder;
    use arrow_array::ArrayRef;
    use arrow_buffer::i256;
    use arrow_schema::Field;
    use jiff::civil::date;
    use std::sync::Arc;

    fn full_schema() -> SchemaDescription {
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
    fn test_decode_every_type() {
        let native: OrcType =
            "struct<b:boolean,i:smallint,n:float,s:char(10),x:binary,d:date,t:timestamp,m:decimal(12,4)>"
                .parse()
                .unwrap();
        let row: Row = vec![
            Some(CanonicalValue::Boolean(true)),
            Some(CanonicalValue::Integer(-300)),
            Some(CanonicalValue::number(1.5)),
            Some(CanonicalValue::string("abc")),
            Some(CanonicalValue::binary(vec![0u8, 1, 2])),
            Some(CanonicalValue::Date(date(1969, 7, 20))),
            Some(CanonicalValue::Timestamp("2024-02-29T12:34:56.789123456Z".parse().unwrap())),
            Some(CanonicalValue::BigNumber("-42.5".parse().unwrap())),
        ];

        let mut encoder = OrcBatchEncoder::new(&full_schema(), &native, EncoderOptions::default()).unwrap();
        encoder.append_row(&row).unwrap();
        encoder.append_row(&vec![None; 8]).unwrap();
        let batch = encoder.finish_batch().unwrap();

        let decoder = OrcBatchDecoder::new(&full_schema(), &batch.schema()).unwrap();
        let mut expected = row.clone();
        expected[7] = Some(CanonicalValue::BigNumber("-42.5000".parse().unwrap()));
        assert_eq!(decoder.decode_row(&batch, 0).unwrap(), expected);
        assert_eq!(decoder.decode_row(&batch, 1).unwrap(), vec![None::<CanonicalValue>; 8]);
        assert!(decoder.decode_row(&batch, 2).is_err());
    }

    #[test]
    fn test_projection_and_widening() {
        let batch = RecordBatch::try_from_iter(vec![
            ("extra", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
            ("count", Arc::new(Int32Array::from(vec![Some(5), None])) as ArrayRef),
        ])
        .unwrap();
        let schema = SchemaDescription::new()
            .with_field(FieldDescriptor::new("count", "C1", CanonicalType::Number))
            .with_field(FieldDescriptor::new("count", "C2", CanonicalType::BigNumber));
        let decoder = OrcBatchDecoder::new(&schema, &batch.schema()).unwrap();

        assert_eq!(
            decoder.decode_row(&batch, 0).unwrap(),
            vec![
                Some(CanonicalValue::number(5.0)),
                Some(CanonicalValue::BigNumber(Decimal::from(5))),
            ]
        );
        assert_eq!(decoder.decode_row(&batch, 1).unwrap(), vec![None, None]);
    }

    #[test]
    fn test_unsupported_pairings() {
        let batch = RecordBatch::try_from_iter(vec![(
            "s",
            Arc::new(StringArray::from(vec!["a"])) as ArrayRef,
        )])
        .unwrap();
        let wrong = SchemaDescription::new().with_field(FieldDescriptor::new("s", "S", CanonicalType::Integer));
        assert!(matches!(
            OrcBatchDecoder::new(&wrong, &batch.schema()),
            Err(FormatError::UnsupportedFieldType { .. })
        ));
        let missing = SchemaDescription::new().with_field(FieldDescriptor::new("q", "Q", CanonicalType::String));
        assert!(matches!(
            OrcBatchDecoder::new(&missing, &batch.schema()),
            Err(FormatError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_decimal256_column() {
        let mut builder = Decimal256Builder::new().with_precision_and_scale(50, 3).unwrap();
        builder.append_value(i256::from_i128(-1_234_567));
        let array = builder.finish();
        let schema = Arc::new(Schema::new(vec![Field::new("m", DataType::Decimal256(50, 3), true)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(array)]).unwrap();

        let description = SchemaDescription::new().with_field(FieldDescriptor::new("m", "M", CanonicalType::BigNumber));
        let decoder = OrcBatchDecoder::new(&description, &batch.schema()).unwrap();
        assert_eq!(
            decoder.decode_row(&batch, 0).unwrap(),
            vec![Some(CanonicalValue::BigNumber("-1234.567".parse().unwrap()))]
        );
    }
}
