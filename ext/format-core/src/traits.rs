//! Seams shared by the format adapters

use crate::{CanonicalValue, FormatFieldList, Result, Row, SchemaDescription};
use arrow_array::RecordBatch;

/// Maps a schema description to a native schema and back
pub trait SchemaConverter {
    type NativeSchema;

    /// Build the native schema for a description
    fn build_native_schema(&self, schema: &SchemaDescription) -> Result<Self::NativeSchema>;

    /// Describe the primitive columns of a native schema
    fn introspect(&self, native: &Self::NativeSchema) -> Result<SchemaDescription>;

    /// Same walk as [`SchemaConverter::introspect`], reporting catalog ids
    fn introspect_format_fields(&self, native: &Self::NativeSchema) -> Result<FormatFieldList>;
}

/// Turns one canonical row into one native record
pub trait RecordEncoder {
    type Record;

    fn encode(&self, row: &[Option<CanonicalValue>]) -> Result<Self::Record>;
}

/// Appends canonical rows into column vectors
pub trait BatchEncoder {
    type Batch;

    fn append_row(&mut self, row: &[Option<CanonicalValue>]) -> Result<()>;

    /// Rows appended since the last finished batch
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the appended rows as a batch and reset the vectors
    fn finish_batch(&mut self) -> Result<Self::Batch>;
}

/// Turns one native record into a canonical row
pub trait RecordDecoder {
    type Record: ?Sized;

    fn decode(&self, record: &Self::Record) -> Result<Row>;
}

/// Reads one row out of a batch of column vectors
pub trait BatchDecoder {
    type Batch;

    fn decode_row(&self, batch: &Self::Batch, row: usize) -> Result<Row>;
}

/// Destination for finished column batches
pub trait BatchSink {
    fn write_batch(&mut self, batch: RecordBatch) -> Result<()>;

    /// Finalize the destination; no batches follow
    fn close_sink(&mut self) -> Result<()> {
        Ok(())
    }
}
