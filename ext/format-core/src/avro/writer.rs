//! Row-by-row Avro container file writing

use super::encoder::AvroRecordEncoder;
use super::schema::AvroSchemaConverter;
use crate::traits::{RecordEncoder, SchemaConverter};
use crate::{CanonicalValue, EncoderOptions, FormatError, FormatFieldList, Result, SchemaDescription};
use apache_avro::{Codec, Schema, Writer};
use std::io::Write;

/// Builder for creating a configured [`AvroRowWriter`]
#[derive(Default)]
pub struct AvroWriterBuilder {
    codec: Option<Codec>,
    options: EncoderOptions,
    converter: AvroSchemaConverter,
}

impl AvroWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Rows per flushed block
    pub fn with_block_size(mut self, rows: usize) -> Self {
        self.options = self.options.with_batch_max_size(rows);
        self
    }

    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_format_fields(mut self, format_fields: FormatFieldList) -> Self {
        self.converter = self.converter.with_format_fields(format_fields);
        self
    }

    pub fn with_record_name<S: Into<String>>(mut self, name: S) -> Self {
        self.converter = self.converter.with_record_name(name);
        self
    }

    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.converter = self.converter.with_namespace(namespace);
        self
    }

    /// The record schema `schema` is written as; the writer borrows it
    pub fn native_schema(&self, schema: &SchemaDescription) -> Result<Schema> {
        self.converter.build_native_schema(schema)
    }

    pub fn build<'s, W: Write>(
        self,
        native: &'s Schema,
        sink: W,
        schema: &SchemaDescription,
    ) -> Result<AvroRowWriter<'s, W>> {
        let encoder = AvroRecordEncoder::new(schema, native, self.options)?;
        let writer = match self.codec {
            Some(codec) => Writer::with_codec(native, sink, codec),
            None => Writer::new(native, sink),
        };
        Ok(AvroRowWriter {
            block_size: encoder.options().batch_max_size(),
            writer: Some(writer),
            encoder,
            pending: 0,
            flush_count: 0,
            rows_written: 0,
        })
    }
}

/// Writes canonical rows as Avro records, flushing a block every
/// `block_size` rows
pub struct AvroRowWriter<'s, W: Write> {
    writer: Option<Writer<'s, W>>,
    encoder: AvroRecordEncoder,
    block_size: usize,
    pending: usize,
    flush_count: usize,
    rows_written: usize,
}

impl<'s, W: Write> AvroRowWriter<'s, W> {
    pub fn new(native: &'s Schema, sink: W, schema: &SchemaDescription) -> Result<Self> {
        AvroWriterBuilder::new().build(native, sink, schema)
    }

    pub fn write_row(&mut self, row: &[Option<CanonicalValue>]) -> Result<()> {
        let record = self.encoder.encode(row)?;
        self.writer_mut()?.append(record)?;
        self.pending += 1;
        self.rows_written += 1;
        if self.pending >= self.block_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn write_rows<I, R>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Option<CanonicalValue>]>,
    {
        for row in rows {
            self.write_row(row.as_ref())?;
        }
        Ok(())
    }

    /// Write pending records as a block
    pub fn flush(&mut self) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        let bytes = self.writer_mut()?.flush()?;
        self.flush_count += 1;
        tracing::debug!(rows = self.pending, bytes, flush = self.flush_count, "flushed avro block");
        self.pending = 0;
        Ok(())
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush remaining rows and return the sink
    pub fn close(mut self) -> Result<W> {
        self.flush()?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| FormatError::internal("writer has been closed"))?;
        Ok(writer.into_inner()?)
    }

    fn writer_mut(&mut self) -> Result<&mut Writer<'s, W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| FormatError::internal("writer has been closed"))
    }
}

impl<W: Write> Drop for AvroRowWriter<'_, W> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                tracing::warn!(error = %e, "failed to flush avro writer on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avro::reader::AvroRowReader;
    use crate::{CanonicalType, FieldDescriptor};

    fn schema() -> SchemaDescription {
        SchemaDescription::new()
            .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
            .with_field(FieldDescriptor::new("label", "LABEL", CanonicalType::String))
    }

    fn row(i: i64) -> Vec<Option<CanonicalValue>> {
        vec![
            Some(CanonicalValue::Integer(i)),
            (i % 3 != 0).then(|| CanonicalValue::string(format!("label {}", i))),
        ]
    }

    #[test]
    fn test_blocks_follow_batch_size() {
        let builder = AvroWriterBuilder::new().with_block_size(4).with_codec(Codec::Null);
        let native = builder.native_schema(&schema()).unwrap();
        let mut writer = builder.build(&native, Vec::new(), &schema()).unwrap();
        writer.write_rows((0..10).map(row)).unwrap();
        assert_eq!(writer.flush_count(), 2);
        let bytes = writer.close().unwrap();

        let rows = AvroRowReader::new(bytes.as_slice())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, (0..10).map(row).collect::<Vec<_>>());
    }

    #[test]
    fn test_failed_row_is_not_written() {
        let native = AvroWriterBuilder::new().native_schema(&schema()).unwrap();
        let mut writer = AvroRowWriter::new(&native, Vec::new(), &schema()).unwrap();
        assert!(matches!(
            writer.write_row(&[None, None]),
            Err(FormatError::RequiredFieldMissing { .. })
        ));
        writer.write_row(&row(1)).unwrap();
        assert_eq!(writer.rows_written(), 1);

        let bytes = writer.close().unwrap();
        let rows: Vec<_> = AvroRowReader::new(bytes.as_slice())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows, vec![row(1)]);
    }
}
