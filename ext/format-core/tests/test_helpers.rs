#![allow(dead_code)]

use bytes::Bytes;
use format_core::avro::{AvroRowReader, AvroWriterBuilder};
use format_core::orc::{OrcRowReader, OrcRowWriter, OrcWriterBuilder};
use format_core::parquet::{ParquetRowReader, ParquetWriterBuilder};
use format_core::temporal::date_from_days;
use format_core::*;
use arrow_array::{RecordBatch, RecordBatchIterator};
use jiff::Timestamp;
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

pub type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// One field of every convertible canonical type; `id` is required
pub fn all_types_schema() -> SchemaDescription {
    SchemaDescription::new()
        .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
        .with_field(FieldDescriptor::new("label", "LABEL", CanonicalType::String))
        .with_field(FieldDescriptor::new("score", "SCORE", CanonicalType::Number))
        .with_field(FieldDescriptor::new("active", "ACTIVE", CanonicalType::Boolean))
        .with_field(FieldDescriptor::new("amount", "AMOUNT", CanonicalType::BigNumber))
        .with_field(FieldDescriptor::new("born", "BORN", CanonicalType::Date))
        .with_field(FieldDescriptor::new("seen", "SEEN", CanonicalType::Timestamp))
        .with_field(FieldDescriptor::new("blob", "BLOB", CanonicalType::Binary))
}

/// A row for [`all_types_schema`].
///
/// Values survive every format's default mapping unchanged: decimals carry
/// scale 10 and timestamps are whole milliseconds. Every fifth row has nulls
/// in its optional text columns.
pub fn sample_row(i: usize) -> Row {
    let sparse = i % 5 == 4;
    vec![
        Some(CanonicalValue::Integer(i as i64)),
        (!sparse).then(|| CanonicalValue::string(format!("row {}", i))),
        Some(CanonicalValue::number(i as f64 * 0.5)),
        Some(CanonicalValue::Boolean(i % 2 == 0)),
        Some(CanonicalValue::BigNumber(Decimal::new(i as i64 * 1_000_000_007 - 500, 10))),
        Some(CanonicalValue::Date(
            date_from_days(18_262 + i as i64).expect("date in range"),
        )),
        Some(CanonicalValue::Timestamp(
            Timestamp::from_millisecond(1_700_000_000_000 + i as i64 * 1_001).expect("timestamp in range"),
        )),
        (!sparse).then(|| CanonicalValue::binary(vec![(i % 256) as u8; i % 7])),
    ]
}

pub fn sample_rows(count: usize) -> Vec<Row> {
    (0..count).map(sample_row).collect()
}

/// Columns of [`all_types_schema`] an ORC file can hold
const FILE_COLUMNS: [usize; 5] = [0, 1, 2, 3, 7];

/// [`all_types_schema`] without its decimal, date and timestamp fields
pub fn file_schema() -> SchemaDescription {
    let all = all_types_schema();
    FILE_COLUMNS
        .iter()
        .fold(SchemaDescription::new(), |schema, &i| schema.with_field(all.fields()[i].clone()))
}

pub fn file_row(i: usize) -> Row {
    let row = sample_row(i);
    FILE_COLUMNS.iter().map(|&c| row[c].clone()).collect()
}

pub fn file_rows(count: usize) -> Vec<Row> {
    (0..count).map(file_row).collect()
}

pub fn write_parquet(schema: &SchemaDescription, rows: &[Row], builder: ParquetWriterBuilder) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let mut writer = builder.build(&mut buffer, schema)?;
    writer.write_rows(rows)?;
    writer.close()?;
    Ok(Bytes::from(buffer))
}

pub fn parquet_roundtrip(
    schema: &SchemaDescription,
    rows: &[Row],
    builder: ParquetWriterBuilder,
) -> Result<Vec<Row>> {
    let data = write_parquet(schema, rows, builder)?;
    ParquetRowReader::with_schema(data, schema.clone(), DecoderOptions::default())?.collect()
}

/// Write an ORC file into a temporary file
pub fn write_orc(
    schema: &SchemaDescription,
    rows: &[Row],
    builder: OrcWriterBuilder,
) -> Result<NamedTempFile> {
    let file = NamedTempFile::new()?;
    let mut writer = builder.build_file(file.reopen()?, schema)?;
    writer.write_rows(rows)?;
    writer.close()?;
    Ok(file)
}

pub fn orc_roundtrip(
    schema: &SchemaDescription,
    rows: &[Row],
    builder: OrcWriterBuilder,
) -> Result<Vec<Row>> {
    let file = write_orc(schema, rows, builder)?;
    OrcRowReader::from_file_with_schema(file.reopen()?, schema.clone(), DecoderOptions::default())?.collect()
}

/// ORC column vectors kept in memory, for types an ORC file cannot hold
pub fn orc_batch_roundtrip(schema: &SchemaDescription, rows: &[Row], builder: OrcWriterBuilder) -> Result<Vec<Row>> {
    let mut writer: OrcRowWriter<Vec<RecordBatch>> = builder.build(Vec::new(), schema)?;
    writer.write_rows(rows)?;
    let arrow_schema = writer.arrow_schema();
    let batches = writer.close()?;
    let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), arrow_schema);
    OrcRowReader::with_schema(reader, schema.clone())?.collect()
}

pub fn write_avro(schema: &SchemaDescription, rows: &[Row], builder: AvroWriterBuilder) -> Result<Vec<u8>> {
    let native = builder.native_schema(schema)?;
    let mut writer = builder.build(&native, Vec::new(), schema)?;
    writer.write_rows(rows)?;
    writer.close()
}

pub fn avro_roundtrip(schema: &SchemaDescription, rows: &[Row], builder: AvroWriterBuilder) -> Result<Vec<Row>> {
    let data = write_avro(schema, rows, builder)?;
    AvroRowReader::with_schema(data.as_slice(), schema.clone())?.collect()
}

/// Copy `data` into a temporary file and rewind it
pub fn temp_file_with(data: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(data)?;
    file.flush()?;
    file.as_file_mut().seek(SeekFrom::Start(0))?;
    Ok(file)
}

pub fn read_all(file: &mut std::fs::File) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut data)?;
    Ok(data)
}
