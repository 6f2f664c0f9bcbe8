//! Row-by-row Avro container file reading

use super::decoder::AvroRecordDecoder;
use super::schema::AvroSchemaConverter;
use crate::traits::{RecordDecoder, SchemaConverter};
use crate::{FormatError, Result, Row, SchemaDescription};
use apache_avro::Reader;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Turns an interrupted read into a hard failure.
///
/// `Read::read_exact` retries on `ErrorKind::Interrupted`; the flag records
/// the interruption and the error is re-raised with a kind that is not
/// retried.
struct InterruptGuard<R> {
    inner: R,
    interrupted: Arc<AtomicBool>,
}

impl<R: Read> Read for InterruptGuard<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                self.interrupted.store(true, Ordering::Relaxed);
                Err(io::Error::other(format!("read interrupted: {}", e)))
            }
            other => other,
        }
    }
}

/// Iterator of canonical rows over an Avro container file
pub struct AvroRowReader<'r, R: Read> {
    reader: Reader<'r, InterruptGuard<R>>,
    interrupted: Arc<AtomicBool>,
    schema: SchemaDescription,
    decoder: AvroRecordDecoder,
    done: bool,
}

impl<'r, R: Read> AvroRowReader<'r, R> {
    /// Read every primitive field, with the schema taken from the file
    pub fn new(source: R) -> Result<Self> {
        Self::open(source, None)
    }

    /// Read the fields of `schema`, ignoring other fields in the file
    pub fn with_schema(source: R, schema: SchemaDescription) -> Result<Self> {
        Self::open(source, Some(schema))
    }

    fn open(source: R, schema: Option<SchemaDescription>) -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let guard = InterruptGuard {
            inner: source,
            interrupted: interrupted.clone(),
        };
        let reader = Reader::new(guard).map_err(|e| read_error(&interrupted, e))?;

        let native = reader.writer_schema();
        let schema = match schema {
            Some(schema) => schema,
            None => AvroSchemaConverter::new().introspect(native)?,
        };
        let decoder = AvroRecordDecoder::new(&schema, native)?;
        tracing::debug!(fields = schema.len(), "opened avro reader");

        Ok(Self {
            reader,
            interrupted,
            schema,
            decoder,
            done: false,
        })
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }
}

impl<R: Read> Iterator for AvroRowReader<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next()? {
            Ok(value) => Some(self.decoder.decode(&value)),
            Err(e) => {
                self.done = true;
                Some(Err(read_error(&self.interrupted, e)))
            }
        }
    }
}

fn read_error(interrupted: &AtomicBool, err: apache_avro::Error) -> FormatError {
    if interrupted.load(Ordering::Relaxed) {
        FormatError::Interrupted(err.to_string())
    } else {
        err.into()
    }
}
