//! Batched ORC writing through a [`BatchSink`]
//!
//! [`OrcFileSink`] writes the batches as an ORC file. The file writer covers
//! boolean, integer, floating point, string and binary columns; dates,
//! timestamps and decimals are available through in-memory sinks only.

use super::encoder::OrcBatchEncoder;
use super::schema::OrcSchemaConverter;
use super::types::OrcType;
use crate::traits::{BatchEncoder, BatchSink, SchemaConverter};
use crate::{CanonicalValue, EncoderOptions, FormatError, FormatFieldList, Result, SchemaDescription};
use arrow_array::RecordBatch;
use arrow_schema::{DataType, SchemaRef};
use orc_rust::{ArrowWriter, ArrowWriterBuilder};
use std::io::Write;

impl BatchSink for Vec<RecordBatch> {
    fn write_batch(&mut self, batch: RecordBatch) -> Result<()> {
        self.push(batch);
        Ok(())
    }
}

/// ORC file destination for record batches
pub struct OrcFileSink<W: Write> {
    writer: Option<ArrowWriter<W>>,
}

impl<W: Write> OrcFileSink<W> {
    pub fn try_new(sink: W, schema: SchemaRef) -> Result<Self> {
        for field in schema.fields() {
            if !file_writable(field.data_type()) {
                return Err(FormatError::unsupported_field_type(
                    field.name(),
                    format!("{} columns cannot be written to an ORC file", field.data_type()),
                ));
            }
        }
        let writer = ArrowWriterBuilder::new(sink, schema).try_build()?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl<W: Write> BatchSink for OrcFileSink<W> {
    fn write_batch(&mut self, batch: RecordBatch) -> Result<()> {
        self.writer
            .as_mut()
            .ok_or_else(|| FormatError::internal("ORC file has been closed"))?
            .write(&batch)?;
        Ok(())
    }

    /// Write stripe footers and the file tail
    fn close_sink(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }
}

fn file_writable(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Utf8
            | DataType::Binary
    )
}

/// Builder for creating a configured [`OrcRowWriter`]
#[derive(Default)]
pub struct OrcWriterBuilder {
    options: EncoderOptions,
    converter: OrcSchemaConverter,
}

impl OrcWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows per batch handed to the sink
    pub fn with_batch_size(mut self, rows: usize) -> Self {
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

    /// The ORC type description `schema` is written as
    pub fn native_schema(&self, schema: &SchemaDescription) -> Result<OrcType> {
        self.converter.build_native_schema(schema)
    }

    /// Arrow schema of the batches the writer will produce
    pub fn arrow_schema(&self, schema: &SchemaDescription) -> Result<SchemaRef> {
        Ok(std::sync::Arc::new(self.native_schema(schema)?.to_arrow_schema()?))
    }

    pub fn build<S: BatchSink>(self, sink: S, schema: &SchemaDescription) -> Result<OrcRowWriter<S>> {
        let native = self.native_schema(schema)?;
        let encoder = OrcBatchEncoder::new(schema, &native, self.options)?;
        Ok(OrcRowWriter {
            batch_max_size: encoder.options().batch_max_size(),
            encoder,
            sink: Some(sink),
            flush_count: 0,
            rows_written: 0,
        })
    }

    /// Write an ORC file over `sink`
    pub fn build_file<W: Write>(
        self,
        sink: W,
        schema: &SchemaDescription,
    ) -> Result<OrcRowWriter<OrcFileSink<W>>> {
        let file = OrcFileSink::try_new(sink, self.arrow_schema(schema)?)?;
        self.build(file, schema)
    }
}

/// Appends canonical rows into column vectors and hands full batches to a
/// sink
pub struct OrcRowWriter<S: BatchSink> {
    encoder: OrcBatchEncoder,
    sink: Option<S>,
    batch_max_size: usize,
    flush_count: usize,
    rows_written: usize,
}

impl<S: BatchSink> OrcRowWriter<S> {
    pub fn new(sink: S, schema: &SchemaDescription) -> Result<Self> {
        OrcWriterBuilder::new().build(sink, schema)
    }

    pub fn write_row(&mut self, row: &[Option<CanonicalValue>]) -> Result<()> {
        self.encoder.append_row(row)?;
        if self.encoder.len() >= self.batch_max_size {
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

    /// Hand the appended rows to the sink as one batch
    pub fn flush(&mut self) -> Result<()> {
        if self.encoder.is_empty() {
            return Ok(());
        }
        let batch = self.encoder.finish_batch()?;
        let rows = batch.num_rows();
        self.sink
            .as_mut()
            .ok_or_else(|| FormatError::internal("writer has been closed"))?
            .write_batch(batch)?;

        self.flush_count += 1;
        self.rows_written += rows;
        tracing::debug!(rows, flush = self.flush_count, "flushed orc batch");
        Ok(())
    }

    /// Number of batches handed to the sink
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        self.encoder.arrow_schema()
    }

    /// Flush the final partial batch, close the sink and return it
    pub fn close(mut self) -> Result<S> {
        self.flush()?;
        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| FormatError::internal("writer has been closed"))?;
        sink.close_sink()?;
        Ok(sink)
    }
}

impl<S: BatchSink> Drop for OrcRowWriter<S> {
    fn drop(&mut self) {
        if self.sink.is_none() {
            return;
        }
        let result = self.flush().and_then(|_| match self.sink.as_mut() {
            Some(sink) => sink.close_sink(),
            None => Ok(()),
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to close orc writer on drop");
        }
    }
}
