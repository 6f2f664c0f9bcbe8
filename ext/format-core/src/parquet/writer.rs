//! Row-by-row Parquet writing

use super::encoder::ParquetRecordEncoder;
use super::schema::{ParquetColumn, ParquetSchemaConverter};
use super::{ParquetRecord, PhysicalValue};
use crate::traits::{RecordEncoder, SchemaConverter};
use crate::{CanonicalValue, EncoderOptions, FormatError, FormatFieldList, Result, SchemaDescription};
use parquet::basic::Compression;
use parquet::column::writer::{ColumnWriter, ColumnWriterImpl};
use parquet::data_type::DataType;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use std::io::Write;
use std::sync::Arc;

/// Builder for creating a configured [`ParquetRowWriter`]
pub struct ParquetWriterBuilder {
    compression: Compression,
    options: EncoderOptions,
    converter: ParquetSchemaConverter,
}

impl Default for ParquetWriterBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            options: EncoderOptions::default(),
            converter: ParquetSchemaConverter::default(),
        }
    }
}

impl ParquetWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Rows per row group; uses the encoder batch size
    pub fn with_row_group_size(mut self, rows: usize) -> Self {
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

    pub fn with_message_name<S: Into<String>>(mut self, name: S) -> Self {
        self.converter = self.converter.with_message_name(name);
        self
    }

    /// Build the native schema and open a writer over `sink`
    pub fn build<W: Write + Send>(
        self,
        sink: W,
        schema: &SchemaDescription,
    ) -> Result<ParquetRowWriter<W>> {
        let message = Arc::new(self.converter.build_native_schema(schema)?);
        let encoder = ParquetRecordEncoder::new(schema, &message, self.options)?;

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();
        let writer = SerializedFileWriter::new(sink, message, Arc::new(props))?;

        Ok(ParquetRowWriter {
            writer: Some(writer),
            row_group_size: encoder.options().batch_max_size(),
            encoder,
            buffered: Vec::new(),
            rows_written: 0,
            row_groups_written: 0,
        })
    }
}

/// Writes canonical rows as Parquet, one row group per `row_group_size` rows
pub struct ParquetRowWriter<W: Write + Send> {
    writer: Option<SerializedFileWriter<W>>,
    encoder: ParquetRecordEncoder,
    buffered: Vec<ParquetRecord>,
    row_group_size: usize,
    rows_written: usize,
    row_groups_written: usize,
}

impl<W: Write + Send> ParquetRowWriter<W> {
    /// Open a writer with default settings
    pub fn new(sink: W, schema: &SchemaDescription) -> Result<Self> {
        ParquetWriterBuilder::new().build(sink, schema)
    }

    pub fn write_row(&mut self, row: &[Option<CanonicalValue>]) -> Result<()> {
        let record = self.encoder.encode(row)?;
        self.buffered.push(record);

        if self.buffered.len() >= self.row_group_size {
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

    /// Write buffered rows as a row group
    pub fn flush(&mut self) -> Result<()> {
        if self.buffered.is_empty() {
            return Ok(());
        }
        let records = std::mem::take(&mut self.buffered);
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| FormatError::internal("writer has been closed"))?;

        let mut row_group = writer.next_row_group()?;
        let mut index = 0;
        while let Some(mut column_writer) = row_group.next_column()? {
            let column = self.encoder.columns().get(index).ok_or_else(|| {
                FormatError::internal(format!("no encoder column for leaf {}", index))
            })?;
            write_column(column_writer.untyped(), column, &records, index)?;
            column_writer.close()?;
            index += 1;
        }
        row_group.close()?;

        self.rows_written += records.len();
        self.row_groups_written += 1;
        tracing::debug!(
            rows = records.len(),
            row_group = self.row_groups_written,
            "flushed parquet row group"
        );
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn row_groups_written(&self) -> usize {
        self.row_groups_written
    }

    /// Flush remaining rows and write the footer
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()?;
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Drop for ParquetRowWriter<W> {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.finish() {
                tracing::warn!(error = %e, "failed to close parquet writer on drop");
            }
        }
    }
}

/// Write column `index` of every record with definition levels for nullable
/// columns
fn write_column(
    writer: &mut ColumnWriter<'_>,
    column: &ParquetColumn,
    records: &[ParquetRecord],
    index: usize,
) -> Result<()> {
    let cells = records.iter().map(|record| record[index].as_ref());
    match writer {
        ColumnWriter::BoolColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Boolean(b) => Some(*b),
            _ => None,
        }),
        ColumnWriter::Int32ColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Int32(i) => Some(*i),
            _ => None,
        }),
        ColumnWriter::Int64ColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Int64(i) => Some(*i),
            _ => None,
        }),
        ColumnWriter::Int96ColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Int96(i) => Some(i.clone()),
            _ => None,
        }),
        ColumnWriter::FloatColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Float(f) => Some(*f),
            _ => None,
        }),
        ColumnWriter::DoubleColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::Double(f) => Some(*f),
            _ => None,
        }),
        ColumnWriter::ByteArrayColumnWriter(w) => write_typed(w, column, cells, |v| match v {
            PhysicalValue::ByteArray(b) => Some(b.clone()),
            _ => None,
        }),
        ColumnWriter::FixedLenByteArrayColumnWriter(w) => {
            write_typed(w, column, cells, |v| match v {
                PhysicalValue::FixedLenByteArray(b) => Some(b.clone()),
                _ => None,
            })
        }
    }
}

fn write_typed<'a, T, I, F>(
    writer: &mut ColumnWriterImpl<'_, T>,
    column: &ParquetColumn,
    cells: I,
    extract: F,
) -> Result<()>
where
    T: DataType,
    I: Iterator<Item = Option<&'a PhysicalValue>>,
    F: Fn(&PhysicalValue) -> Option<T::T>,
{
    let mut values = Vec::new();
    let mut def_levels = Vec::new();

    for cell in cells {
        match cell {
            Some(value) => {
                let physical = extract(value).ok_or_else(|| {
                    FormatError::internal(format!(
                        "{:?} does not match column '{}'",
                        value, column.name
                    ))
                })?;
                values.push(physical);
                def_levels.push(1);
            }
            None if column.nullable => def_levels.push(0),
            None => return Err(FormatError::required_field_missing(&column.name)),
        }
    }

    let def_levels = column.nullable.then_some(def_levels.as_slice());
    writer.write_batch(&values, def_levels, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet::reader::ParquetRowReader;
    use crate::{CanonicalType, FieldDescriptor};
    use bytes::Bytes;

    fn schema() -> SchemaDescription {
        SchemaDescription::new()
            .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
            .with_field(FieldDescriptor::new("label", "LABEL", CanonicalType::String))
    }

    #[test]
    fn test_row_groups_follow_batch_size() {
        let mut buffer = Vec::new();
        let mut writer = ParquetWriterBuilder::new()
            .with_row_group_size(4)
            .build(&mut buffer, &schema())
            .unwrap();

        for i in 0..10 {
            let label = (i % 2 == 0).then(|| CanonicalValue::string(format!("row {}", i)));
            writer
                .write_row(&[Some(CanonicalValue::Integer(i)), label])
                .unwrap();
        }
        assert_eq!(writer.row_groups_written(), 2);
        assert_eq!(writer.rows_written(), 8);
        writer.close().unwrap();

        let reader = ParquetRowReader::new(Bytes::from(buffer)).unwrap();
        assert_eq!(reader.row_group_count(), 3);
        let rows = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[3][1], None);
        assert_eq!(rows[4][1], Some(CanonicalValue::string("row 4")));
    }

    #[test]
    fn test_drop_finishes_file() {
        let mut buffer = Vec::new();
        {
            let mut writer = ParquetRowWriter::new(&mut buffer, &schema()).unwrap();
            writer
                .write_row(&[Some(CanonicalValue::Integer(1)), None])
                .unwrap();
        }
        let rows = ParquetRowReader::new(Bytes::from(buffer))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, vec![vec![Some(CanonicalValue::Integer(1)), None]]);
    }

    #[test]
    fn test_failed_row_is_not_buffered() {
        let mut buffer = Vec::new();
        let mut writer = ParquetRowWriter::new(&mut buffer, &schema()).unwrap();
        assert!(writer.write_row(&[None, None]).is_err());
        writer
            .write_row(&[Some(CanonicalValue::Integer(2)), None])
            .unwrap();
        writer.close().unwrap();

        let rows: Vec<_> = ParquetRowReader::new(Bytes::from(buffer))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
