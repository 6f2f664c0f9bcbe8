//! Canonical rows appended into Arrow column vectors

use super::schema::{leaf_columns, OrcColumn};
use super::types::OrcType;
use crate::defaults::resolve_value;
use crate::temporal::{days_since_epoch, timestamp_to_nanos};
use crate::traits::BatchEncoder;
use crate::{
    CanonicalValue, Decimal, EncoderOptions, FieldDescriptor, FormatError, Result,
    SchemaDescription,
};
use arrow_array::builder::{
    BinaryBuilder, BooleanBuilder, Date32Builder, Decimal128Builder, Float32Builder,
    Float64Builder, Int16Builder, Int32Builder, Int64Builder, Int8Builder, StringBuilder,
    TimestampNanosecondBuilder,
};
use arrow_array::{ArrayRef, RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Schema, SchemaRef};
use bytes::Bytes;
use std::sync::Arc;

/// A value already converted to the representation of its column
#[derive(Debug)]
enum Cell {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(i128),
    Utf8(Arc<str>),
    Binary(Bytes),
    Date(i32),
    Timestamp(i64),
}

enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Decimal(Decimal128Builder),
    Utf8(StringBuilder),
    Binary(BinaryBuilder),
    Date(Date32Builder),
    Timestamp(TimestampNanosecondBuilder),
}

impl ColumnBuilder {
    fn for_type(ty: &OrcType, capacity: usize) -> Result<Self> {
        Ok(match ty {
            OrcType::Boolean => Self::Boolean(BooleanBuilder::with_capacity(capacity)),
            OrcType::TinyInt => Self::Int8(Int8Builder::with_capacity(capacity)),
            OrcType::SmallInt => Self::Int16(Int16Builder::with_capacity(capacity)),
            OrcType::Int => Self::Int32(Int32Builder::with_capacity(capacity)),
            OrcType::BigInt => Self::Int64(Int64Builder::with_capacity(capacity)),
            OrcType::Float => Self::Float32(Float32Builder::with_capacity(capacity)),
            OrcType::Double => Self::Float64(Float64Builder::with_capacity(capacity)),
            OrcType::Decimal { .. } => match ty.to_arrow()? {
                DataType::Decimal128(precision, scale) => Self::Decimal(
                    Decimal128Builder::with_capacity(capacity)
                        .with_precision_and_scale(precision, scale)?,
                ),
                other => return Err(FormatError::internal(format!("decimal column as {}", other))),
            },
            OrcType::Char(_) | OrcType::VarChar(_) | OrcType::String => {
                Self::Utf8(StringBuilder::with_capacity(capacity, capacity * 16))
            }
            OrcType::Binary => Self::Binary(BinaryBuilder::with_capacity(capacity, capacity * 16)),
            OrcType::Date => Self::Date(Date32Builder::with_capacity(capacity)),
            OrcType::Timestamp => {
                Self::Timestamp(TimestampNanosecondBuilder::with_capacity(capacity))
            }
            complex => {
                return Err(FormatError::internal(format!(
                    "no column builder for {}",
                    complex
                )))
            }
        })
    }

    fn append_null(&mut self) {
        match self {
            Self::Boolean(b) => b.append_null(),
            Self::Int8(b) => b.append_null(),
            Self::Int16(b) => b.append_null(),
            Self::Int32(b) => b.append_null(),
            Self::Int64(b) => b.append_null(),
            Self::Float32(b) => b.append_null(),
            Self::Float64(b) => b.append_null(),
            Self::Decimal(b) => b.append_null(),
            Self::Utf8(b) => b.append_null(),
            Self::Binary(b) => b.append_null(),
            Self::Date(b) => b.append_null(),
            Self::Timestamp(b) => b.append_null(),
        }
    }

    fn append(&mut self, cell: Cell) -> Result<()> {
        match (self, cell) {
            (Self::Boolean(b), Cell::Boolean(v)) => b.append_value(v),
            (Self::Int8(b), Cell::Int8(v)) => b.append_value(v),
            (Self::Int16(b), Cell::Int16(v)) => b.append_value(v),
            (Self::Int32(b), Cell::Int32(v)) => b.append_value(v),
            (Self::Int64(b), Cell::Int64(v)) => b.append_value(v),
            (Self::Float32(b), Cell::Float32(v)) => b.append_value(v),
            (Self::Float64(b), Cell::Float64(v)) => b.append_value(v),
            (Self::Decimal(b), Cell::Decimal(v)) => b.append_value(v),
            (Self::Utf8(b), Cell::Utf8(v)) => b.append_value(v),
            (Self::Binary(b), Cell::Binary(v)) => b.append_value(v),
            (Self::Date(b), Cell::Date(v)) => b.append_value(v),
            (Self::Timestamp(b), Cell::Timestamp(v)) => b.append_value(v),
            (_, cell) => {
                return Err(FormatError::internal(format!(
                    "{:?} does not match its column builder",
                    cell
                )))
            }
        }
        Ok(())
    }

    /// Build the array and reset the builder
    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Boolean(b) => Arc::new(b.finish()),
            Self::Int8(b) => Arc::new(b.finish()),
            Self::Int16(b) => Arc::new(b.finish()),
            Self::Int32(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::Float32(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Decimal(b) => Arc::new(b.finish()),
            Self::Utf8(b) => Arc::new(b.finish()),
            Self::Binary(b) => Arc::new(b.finish()),
            Self::Date(b) => Arc::new(b.finish()),
            Self::Timestamp(b) => Arc::new(b.finish()),
        }
    }
}

/// Appends rows into one builder per top level primitive column.
///
/// A row is converted completely before anything is appended, so a failed
/// row leaves the vectors untouched.
pub struct OrcBatchEncoder {
    fields: Vec<FieldDescriptor>,
    columns: Vec<OrcColumn>,
    /// Position in `columns` of each field
    targets: Vec<usize>,
    builders: Vec<ColumnBuilder>,
    schema: SchemaRef,
    options: EncoderOptions,
    rows: usize,
}

impl OrcBatchEncoder {
    pub fn new(schema: &SchemaDescription, native: &OrcType, options: EncoderOptions) -> Result<Self> {
        let columns = leaf_columns(native)?;
        let mut targets = Vec::with_capacity(schema.len());
        for field in schema {
            let name = field.native_name();
            let index = columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            if columns[index].entry.canonical != field.canonical_type {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!(
                        "{} field cannot be written to {} column",
                        field.canonical_type, columns[index].ty
                    ),
                ));
            }
            targets.push(index);
        }

        let capacity = options.batch_max_size();
        let builders = columns
            .iter()
            .map(|c| ColumnBuilder::for_type(&c.ty, capacity))
            .collect::<Result<Vec<_>>>()?;
        let schema_ref = Arc::new(Schema::new(
            columns
                .iter()
                .map(|c| c.ty.to_arrow_field(&c.name))
                .collect::<Result<Vec<_>>>()?,
        ));

        Ok(Self {
            fields: schema.fields().to_vec(),
            columns,
            targets,
            builders,
            schema: schema_ref,
            options,
            rows: 0,
        })
    }

    /// Arrow schema of the batches this encoder produces
    pub fn arrow_schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    fn to_cell(&self, column: &OrcColumn, value: CanonicalValue) -> Result<Cell> {
        let name = column.name.as_str();
        Ok(match (&column.ty, value) {
            (OrcType::Boolean, CanonicalValue::Boolean(b)) => Cell::Boolean(b),
            (OrcType::TinyInt, CanonicalValue::Integer(i)) => Cell::Int8(narrow(name, i)?),
            (OrcType::SmallInt, CanonicalValue::Integer(i)) => Cell::Int16(narrow(name, i)?),
            (OrcType::Int, CanonicalValue::Integer(i)) => Cell::Int32(narrow(name, i)?),
            (OrcType::BigInt, CanonicalValue::Integer(i)) => Cell::Int64(i),
            (OrcType::Float, CanonicalValue::Number(n)) => Cell::Float32(n.0 as f32),
            (OrcType::Double, CanonicalValue::Number(n)) => Cell::Float64(n.0),
            (OrcType::Decimal { precision, scale }, CanonicalValue::BigNumber(d)) => {
                Cell::Decimal(encode_decimal(name, &d, *precision, *scale)?)
            }
            (OrcType::Char(length) | OrcType::VarChar(length), CanonicalValue::String(s)) => {
                Cell::Utf8(truncate_chars(s, *length as usize))
            }
            (OrcType::String, CanonicalValue::String(s)) => Cell::Utf8(s),
            (OrcType::Binary, CanonicalValue::Binary(b)) => Cell::Binary(b),
            (OrcType::Date, CanonicalValue::Date(date)) => Cell::Date(days_since_epoch(date)?),
            (OrcType::Timestamp, CanonicalValue::Timestamp(ts)) => {
                Cell::Timestamp(timestamp_to_nanos(name, ts)?)
            }
            (ty, value) => {
                return Err(FormatError::unsupported_field_type(
                    name,
                    format!("{} value for {} column", value.type_name(), ty),
                ))
            }
        })
    }
}

impl BatchEncoder for OrcBatchEncoder {
    type Batch = RecordBatch;

    fn append_row(&mut self, row: &[Option<CanonicalValue>]) -> Result<()> {
        FormatError::check_row_length(self.fields.len(), row.len())?;

        let mut cells: Vec<Option<Cell>> = Vec::with_capacity(self.columns.len());
        cells.resize_with(self.columns.len(), || None);
        for ((field, value), &target) in self.fields.iter().zip(row).zip(&self.targets) {
            if let Some(value) = resolve_value(field, value.as_ref(), &self.options)? {
                cells[target] = Some(self.to_cell(&self.columns[target], value)?);
            }
        }

        for (builder, cell) in self.builders.iter_mut().zip(cells) {
            match cell {
                Some(cell) => builder.append(cell)?,
                None => builder.append_null(),
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows
    }

    fn finish_batch(&mut self) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = self.builders.iter_mut().map(ColumnBuilder::finish).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.rows));
        self.rows = 0;
        Ok(RecordBatch::try_new_with_options(self.schema.clone(), arrays, &options)?)
    }
}

fn narrow<T: TryFrom<i64>>(field: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| {
        FormatError::out_of_range(
            field,
            format!("{} does not fit {}", value, std::any::type_name::<T>()),
        )
    })
}

fn encode_decimal(field: &str, value: &Decimal, precision: u32, scale: i32) -> Result<i128> {
    let overflow = || FormatError::DecimalOverflow {
        field: field.to_string(),
        precision,
    };
    let rescaled = value.rescale(scale).ok_or_else(overflow)?;
    if !rescaled.fits_precision(precision) {
        return Err(overflow());
    }
    rescaled.to_i128().ok_or_else(overflow)
}

/// Keep at most `max` characters
fn truncate_chars(s: Arc<str>, max: usize) -> Arc<str> {
    match s.char_indices().nth(max) {
        Some((end, _)) => Arc::from(&s[..end]),
        None => s,
    }
}
