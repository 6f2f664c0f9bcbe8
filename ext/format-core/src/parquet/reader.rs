//! Row-by-row Parquet reading through the column readers of each row group

use super::decoder::ParquetRecordDecoder;
use super::schema::ParquetSchemaConverter;
use super::{ParquetRecord, PhysicalValue};
use crate::options::DecoderOptions;
use crate::traits::{RecordDecoder, SchemaConverter};
use crate::{FormatError, Result, Row, SchemaDescription};
use parquet::column::reader::{ColumnReader, ColumnReaderImpl};
use parquet::data_type::DataType;
use parquet::errors::ParquetError;
use parquet::file::reader::{ChunkReader, FileReader, RowGroupReader, SerializedFileReader};
use std::collections::VecDeque;

/// Column readers of the row group being drained
struct RowGroupCursor {
    /// `(record slot, nullable, reader)` for each projected column
    readers: Vec<(usize, bool, ColumnReader)>,
    remaining: usize,
}

/// Iterator of canonical rows over a Parquet file
pub struct ParquetRowReader<R: ChunkReader + 'static> {
    file: SerializedFileReader<R>,
    schema: SchemaDescription,
    decoder: ParquetRecordDecoder,
    /// File leaf index of each decoder column, `None` when not read
    leaf_indices: Vec<Option<usize>>,
    batch_size: usize,
    next_row_group: usize,
    cursor: Option<RowGroupCursor>,
    pending: VecDeque<ParquetRecord>,
}

impl<R: ChunkReader + 'static> ParquetRowReader<R> {
    /// Read every primitive column, with the schema taken from the file
    pub fn new(source: R) -> Result<Self> {
        let file = SerializedFileReader::new(source).map_err(read_error)?;
        let schema = ParquetSchemaConverter::new().introspect(file.metadata().file_metadata().schema())?;
        Self::open(file, schema, DecoderOptions::default())
    }

    /// Read the fields of `schema`, ignoring other columns in the file
    pub fn with_schema(source: R, schema: SchemaDescription, options: DecoderOptions) -> Result<Self> {
        let file = SerializedFileReader::new(source).map_err(read_error)?;
        Self::open(file, schema, options)
    }

    fn open(file: SerializedFileReader<R>, schema: SchemaDescription, options: DecoderOptions) -> Result<Self> {
        let file_metadata = file.metadata().file_metadata();
        let decoder = ParquetRecordDecoder::new(&schema, file_metadata.schema())?;

        let descriptor = file_metadata.schema_descr();
        let mut leaf_indices = vec![None; decoder.columns().len()];
        for slot in decoder.projected_columns() {
            let name = &decoder.columns()[slot].name;
            let leaf = descriptor
                .columns()
                .iter()
                .position(|c| c.path().parts().len() == 1 && c.name() == name)
                .ok_or_else(|| FormatError::unsupported_field_type(name, "missing column"))?;
            leaf_indices[slot] = Some(leaf);
        }

        tracing::debug!(
            fields = schema.len(),
            row_groups = file.metadata().num_row_groups(),
            rows = file_metadata.num_rows(),
            "opened parquet reader"
        );

        Ok(Self {
            file,
            schema,
            decoder,
            leaf_indices,
            batch_size: options.batch_size(),
            next_row_group: 0,
            cursor: None,
            pending: VecDeque::new(),
        })
    }

    /// The fields rows are decoded into
    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    pub fn row_group_count(&self) -> usize {
        self.file.metadata().num_row_groups()
    }

    /// Decode the next chunk of records into `pending`; false at end of file
    fn fill(&mut self) -> Result<bool> {
        loop {
            if let Some(cursor) = self.cursor.as_mut() {
                if cursor.remaining > 0 {
                    let take = cursor.remaining.min(self.batch_size);
                    let width = self.decoder.columns().len();
                    let mut records: Vec<ParquetRecord> = vec![vec![None; width]; take];

                    for (slot, nullable, reader) in cursor.readers.iter_mut() {
                        let cells = read_column(reader, *nullable, take)?;
                        for (record, cell) in records.iter_mut().zip(cells) {
                            record[*slot] = cell;
                        }
                    }

                    cursor.remaining -= take;
                    self.pending.extend(records);
                    return Ok(true);
                }
            }

            if self.next_row_group >= self.row_group_count() {
                self.cursor = None;
                return Ok(false);
            }
            self.cursor = Some(self.open_row_group(self.next_row_group)?);
            self.next_row_group += 1;
        }
    }

    fn open_row_group(&self, index: usize) -> Result<RowGroupCursor> {
        let row_group = self.file.get_row_group(index).map_err(read_error)?;
        let remaining = row_group.metadata().num_rows() as usize;

        let mut readers = Vec::new();
        for (slot, leaf) in self.leaf_indices.iter().enumerate() {
            if let Some(leaf) = leaf {
                let nullable = self.decoder.columns()[slot].nullable;
                let reader = row_group.get_column_reader(*leaf).map_err(read_error)?;
                readers.push((slot, nullable, reader));
            }
        }
        Ok(RowGroupCursor { readers, remaining })
    }
}

impl<R: ChunkReader + 'static> Iterator for ParquetRowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    // A failed chunk leaves the column readers out of step
                    self.cursor = None;
                    self.next_row_group = usize::MAX;
                    return Some(Err(e));
                }
            }
        }
        let record = self.pending.pop_front()?;
        Some(self.decoder.decode(&record))
    }
}

fn read_column(reader: &mut ColumnReader, nullable: bool, records: usize) -> Result<Vec<Option<PhysicalValue>>> {
    match reader {
        ColumnReader::BoolColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Boolean),
        ColumnReader::Int32ColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Int32),
        ColumnReader::Int64ColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Int64),
        ColumnReader::Int96ColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Int96),
        ColumnReader::FloatColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Float),
        ColumnReader::DoubleColumnReader(r) => read_typed(r, nullable, records, PhysicalValue::Double),
        ColumnReader::ByteArrayColumnReader(r) => {
            read_typed(r, nullable, records, PhysicalValue::ByteArray)
        }
        ColumnReader::FixedLenByteArrayColumnReader(r) => {
            read_typed(r, nullable, records, PhysicalValue::FixedLenByteArray)
        }
    }
}

/// Surface IO failures of the source as read errors
fn read_error(err: ParquetError) -> FormatError {
    match err {
        ParquetError::External(inner) => match inner.downcast::<std::io::Error>() {
            Ok(io) => FormatError::from_read_error(*io),
            Err(inner) => ParquetError::External(inner).into(),
        },
        other => other.into(),
    }
}

/// Read exactly `records` values of a flat column, expanding nulls from the
/// definition levels
fn read_typed<T, F>(
    reader: &mut ColumnReaderImpl<T>,
    nullable: bool,
    records: usize,
    wrap: F,
) -> Result<Vec<Option<PhysicalValue>>>
where
    T: DataType,
    F: Fn(T::T) -> PhysicalValue,
{
    let mut values: Vec<T::T> = Vec::with_capacity(records);
    let mut def_levels: Vec<i16> = Vec::with_capacity(records);
    let mut read = 0;

    while read < records {
        let levels = if nullable { Some(&mut def_levels) } else { None };
        let (batch, _, _) = reader
            .read_records(records - read, levels, None, &mut values)
            .map_err(read_error)?;
        if batch == 0 {
            return Err(FormatError::internal(format!(
                "column ended after {} of {} records",
                read, records
            )));
        }
        read += batch;
    }

    if !nullable {
        return Ok(values.into_iter().map(|v| Some(wrap(v))).collect());
    }

    let mut values = values.into_iter();
    def_levels
        .into_iter()
        .map(|level| {
            if level > 0 {
                values
                    .next()
                    .map(|v| Some(wrap(v)))
                    .ok_or_else(|| FormatError::internal("definition levels exceed values"))
            } else {
                Ok(None)
            }
        })
        .collect()
}
