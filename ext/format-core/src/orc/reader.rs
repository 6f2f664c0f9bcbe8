//! Row iteration over ORC files and any Arrow record batch reader

use super::decoder::OrcBatchDecoder;
use super::schema::OrcSchemaConverter;
use super::types::OrcType;
use crate::traits::{BatchDecoder, SchemaConverter};
use crate::{DecoderOptions, FormatError, Result, Row, SchemaDescription};
use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_schema::ArrowError;
use orc_rust::reader::ChunkReader;
use orc_rust::{ArrowReader, ArrowReaderBuilder};

/// Iterator of canonical rows over the batches of `R`
pub struct OrcRowReader<R: RecordBatchReader> {
    reader: R,
    schema: SchemaDescription,
    decoder: OrcBatchDecoder,
    batch: Option<RecordBatch>,
    row: usize,
    done: bool,
}

impl<R: RecordBatchReader> OrcRowReader<R> {
    /// Read every primitive column, with the schema taken from the reader
    pub fn new(reader: R) -> Result<Self> {
        let native = OrcType::from_arrow_schema(&reader.schema())?;
        let schema = OrcSchemaConverter::new().introspect(&native)?;
        Self::with_schema(reader, schema)
    }

    /// Read the fields of `schema`, ignoring other columns
    pub fn with_schema(reader: R, schema: SchemaDescription) -> Result<Self> {
        let decoder = OrcBatchDecoder::new(&schema, &reader.schema())?;
        tracing::debug!(fields = schema.len(), "opened orc reader");
        Ok(Self {
            reader,
            schema,
            decoder,
            batch: None,
            row: 0,
            done: false,
        })
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }
}

impl<R: ChunkReader> OrcRowReader<ArrowReader<R>> {
    /// Read every primitive column of an ORC file
    pub fn from_file(source: R) -> Result<Self> {
        Self::new(ArrowReaderBuilder::try_new(source)?.build())
    }

    /// Read the fields of `schema` from an ORC file
    pub fn from_file_with_schema(
        source: R,
        schema: SchemaDescription,
        options: DecoderOptions,
    ) -> Result<Self> {
        let reader = ArrowReaderBuilder::try_new(source)?
            .with_batch_size(options.batch_size())
            .build();
        Self::with_schema(reader, schema)
    }
}

impl<R: RecordBatchReader> Iterator for OrcRowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(batch) = &self.batch {
                if self.row < batch.num_rows() {
                    let row = self.decoder.decode_row(batch, self.row);
                    self.row += 1;
                    return Some(row);
                }
            }

            match self.reader.next() {
                Some(Ok(batch)) => {
                    self.batch = Some(batch);
                    self.row = 0;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(read_error(e)));
                }
                None => {
                    self.done = true;
                    self.batch = None;
                }
            }
        }
    }
}

fn read_error(err: ArrowError) -> FormatError {
    match err {
        ArrowError::IoError(_, io) => FormatError::from_read_error(io),
        other => other.into(),
    }
}
