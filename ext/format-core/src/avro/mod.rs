//! Avro adapter: generic records in object container files.
//!
//! Nullability is expressed with `["null", T]` unions. Records are built as
//! `apache_avro::types::Value`s and written through `apache_avro::Writer`;
//! reading unwraps unions and decodes logical values back into canonical
//! ones.

pub mod catalog;
pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod schema;
pub mod writer;

pub use catalog::AVRO_CATALOG;
pub use decoder::AvroRecordDecoder;
pub use encoder::AvroRecordEncoder;
pub use reader::AvroRowReader;
pub use schema::{AvroColumn, AvroSchemaConverter};
pub use writer::{AvroRowWriter, AvroWriterBuilder};
