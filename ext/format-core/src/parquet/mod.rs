//! Parquet adapter: row-by-row encoding onto physical column types.
//!
//! Records are written with the low level column writers so that 96-bit
//! timestamps and every converted-type annotation in the catalog can be
//! produced, and read back through the column readers of each row group.

pub mod catalog;
pub mod decoder;
pub mod encoder;
pub mod int96;
pub mod reader;
pub mod schema;
pub mod writer;

use parquet::data_type::{ByteArray, FixedLenByteArray, Int96};

pub use catalog::PARQUET_CATALOG;
pub use decoder::ParquetRecordDecoder;
pub use encoder::ParquetRecordEncoder;
pub use reader::ParquetRowReader;
pub use schema::{ParquetColumn, ParquetSchemaConverter};
pub use writer::{ParquetRowWriter, ParquetWriterBuilder};

/// One value in its Parquet physical representation
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    ByteArray(ByteArray),
    FixedLenByteArray(FixedLenByteArray),
}

/// Physical values in leaf column order; `None` is a null slot
pub type ParquetRecord = Vec<Option<PhysicalValue>>;
