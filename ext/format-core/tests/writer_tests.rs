use arrow_array::RecordBatch;
use format_core::avro::{AvroRowReader, AvroWriterBuilder};
use format_core::orc::{OrcFileSink, OrcRowReader, OrcRowWriter, OrcWriterBuilder};
use format_core::parquet::{ParquetRowReader, ParquetRowWriter, ParquetWriterBuilder};
use format_core::*;
use ::parquet::file::reader::{FileReader, SerializedFileReader};

mod test_helpers;
use test_helpers::*;

const ROWS: usize = 12_000;

#[test]
fn test_orc_batches_flush_at_batch_max_size() -> TestResult {
    let schema = all_types_schema();
    let rows = sample_rows(ROWS);

    let mut writer = OrcRowWriter::new(Vec::<RecordBatch>::new(), &schema)?;
    writer.write_rows(&rows)?;
    assert_eq!(writer.flush_count(), 1);
    assert_eq!(writer.rows_written(), ROWS);

    let batches = writer.close()?;
    let sizes: Vec<usize> = batches.iter().map(RecordBatch::num_rows).collect();
    assert_eq!(sizes, vec![10_000, 2_000]);

    let reader = OrcRowReader::with_schema(
        arrow_array::RecordBatchIterator::new(batches.into_iter().map(Ok), OrcWriterBuilder::new().arrow_schema(&schema)?),
        schema.clone(),
    )?;
    let read = reader.collect::<Result<Vec<_>>>()?;
    assert_eq!(read.len(), ROWS);
    assert_eq!(read[9_999], rows[9_999]);
    assert_eq!(read[10_000], rows[10_000]);
    Ok(())
}

#[test]
fn test_orc_file_batches_follow_batch_max_size() -> TestResult {
    let schema = file_schema();
    let rows = file_rows(ROWS);

    let file = tempfile::NamedTempFile::new()?;
    let mut writer = OrcWriterBuilder::new().build_file(file.reopen()?, &schema)?;
    writer.write_rows(&rows)?;
    assert_eq!(writer.flush_count(), 1);
    writer.close()?;

    let mut magic = [0u8; 3];
    std::io::Read::read_exact(&mut file.reopen()?, &mut magic)?;
    assert_eq!(&magic, b"ORC");

    let reader = OrcRowReader::from_file(file.reopen()?)?;
    assert_eq!(reader.schema().len(), schema.len());
    let read = reader.collect::<Result<Vec<_>>>()?;
    assert_eq!(read, rows);
    Ok(())
}

#[test]
fn test_orc_file_rejects_columns_it_cannot_hold() -> TestResult {
    let schema = all_types_schema();
    let arrow_schema = OrcWriterBuilder::new().arrow_schema(&schema)?;
    match OrcFileSink::try_new(Vec::<u8>::new(), arrow_schema) {
        Err(FormatError::UnsupportedFieldType { field, .. }) => assert_eq!(field, "amount"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("decimal column accepted by the ORC file sink"),
    }
    assert!(OrcWriterBuilder::new().build_file(Vec::<u8>::new(), &schema).is_err());
    Ok(())
}

#[test]
fn test_parquet_row_groups_follow_batch_max_size() -> TestResult {
    let schema = all_types_schema();
    let rows = sample_rows(ROWS);

    let mut buffer = Vec::new();
    let mut writer = ParquetRowWriter::new(&mut buffer, &schema)?;
    writer.write_rows(&rows)?;
    assert_eq!(writer.row_groups_written(), 1);
    writer.close()?;

    let data = bytes::Bytes::from(buffer);
    let file = SerializedFileReader::new(data.clone())?;
    let groups: Vec<i64> = (0..file.num_row_groups())
        .map(|i| file.metadata().row_group(i).num_rows())
        .collect();
    assert_eq!(groups, vec![10_000, 2_000]);

    let reader = ParquetRowReader::with_schema(data, schema, DecoderOptions::default())?;
    assert_eq!(reader.row_group_count(), 2);
    let read = reader.collect::<Result<Vec<_>>>()?;
    assert_eq!(read, rows);
    Ok(())
}

#[test]
fn test_avro_blocks_follow_batch_max_size() -> TestResult {
    let schema = all_types_schema();
    let rows = sample_rows(ROWS);

    let builder = AvroWriterBuilder::new();
    let native = builder.native_schema(&schema)?;
    let mut writer = builder.build(&native, Vec::new(), &schema)?;
    writer.write_rows(&rows)?;
    assert_eq!(writer.flush_count(), 1);
    let data = writer.close()?;

    let read = AvroRowReader::with_schema(data.as_slice(), schema)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(read, rows);
    Ok(())
}

#[test]
fn test_configured_batch_size_is_shared() -> TestResult {
    let schema = all_types_schema();
    let rows = sample_rows(25);
    let options = EncoderOptions::new().with_batch_max_size(10);

    let mut orc = OrcWriterBuilder::new()
        .with_options(options.clone())
        .build(Vec::<RecordBatch>::new(), &schema)?;
    orc.write_rows(&rows)?;
    assert_eq!(orc.flush_count(), 2);
    assert_eq!(orc.close()?.len(), 3);

    let mut buffer = Vec::new();
    let mut parquet = ParquetWriterBuilder::new()
        .with_options(options.clone())
        .build(&mut buffer, &schema)?;
    parquet.write_rows(&rows)?;
    assert_eq!(parquet.row_groups_written(), 2);
    parquet.close()?;

    let builder = AvroWriterBuilder::new().with_options(options);
    let native = builder.native_schema(&schema)?;
    let mut avro = builder.build(&native, Vec::new(), &schema)?;
    avro.write_rows(&rows)?;
    assert_eq!(avro.flush_count(), 2);
    avro.close()?;
    Ok(())
}

#[test]
fn test_failed_row_leaves_batch_intact() -> TestResult {
    let schema = all_types_schema();
    let mut writer = OrcWriterBuilder::new()
        .with_batch_size(4)
        .build(Vec::<RecordBatch>::new(), &schema)?;

    let mut bad = sample_row(1);
    bad[2] = Some(CanonicalValue::string("not a number"));
    writer.write_row(&sample_row(0))?;
    assert!(matches!(writer.write_row(&bad), Err(FormatError::UnsupportedFieldType { .. })));
    writer.write_row(&sample_row(2))?;

    let batches = writer.close()?;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].num_rows(), 2);
    assert!(batches.iter().all(|b| b.columns().iter().all(|c| c.len() == b.num_rows())));
    Ok(())
}

#[test]
fn test_empty_session_writes_a_readable_file() -> TestResult {
    let schema = all_types_schema();

    let parquet = parquet_roundtrip(&schema, &[], ParquetWriterBuilder::new())?;
    assert!(parquet.is_empty());

    let orc = orc_roundtrip(&file_schema(), &[], OrcWriterBuilder::new())?;
    assert!(orc.is_empty());

    let avro = avro_roundtrip(&schema, &[], AvroWriterBuilder::new())?;
    assert!(avro.is_empty());
    Ok(())
}
