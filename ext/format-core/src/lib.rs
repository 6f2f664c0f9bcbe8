//! Schema-driven conversion between canonical rows and columnar formats
//!
//! `format-core` maps a format independent row model, named fields with
//! logical types, onto Parquet, ORC and Avro encodings and back.
//!
//! # Key Components
//!
//! - **Schema descriptions**: the ordered field list a session is built from
//!   - Pipe-delimited text form through [`SchemaDescription::marshall`]
//!   - Per-column catalog overrides through [`FormatFieldList`]
//!
//! - **Logical type catalogs**: one immutable table per format
//!   - [`parquet::PARQUET_CATALOG`], [`orc::ORC_CATALOG`], [`avro::AVRO_CATALOG`]
//!
//! - **Converters, encoders and decoders**: per format, behind the seams in
//!   [`traits`]
//!   - Parquet is written and read row by row, including 96-bit timestamps
//!   - ORC rows are appended into Arrow column vectors and flushed as batches
//!     to an ORC file or any other batch sink
//!   - Avro rows become generic records with `["null", T]` unions
//!
//! - **Sessions**: writers and readers over an already open sink or source
//!   - Writers flush every `batch_max_size` rows and finish on close
//!   - Readers are iterators of `Result<Row>`
//!
//! # Example Usage
//!
//! ```no_run
//! use format_core::parquet::{ParquetRowReader, ParquetRowWriter};
//! use format_core::{CanonicalType, CanonicalValue, FieldDescriptor, SchemaDescription};
//!
//! # fn main() -> format_core::Result<()> {
//! let schema = SchemaDescription::new()
//!     .with_field(FieldDescriptor::new("id", "ID", CanonicalType::Integer).with_allow_null(false))
//!     .with_field(FieldDescriptor::new("name", "NAME", CanonicalType::String));
//!
//! let file = std::fs::File::create("rows.parquet")?;
//! let mut writer = ParquetRowWriter::new(file, &schema)?;
//! writer.write_row(&[Some(CanonicalValue::Integer(1)), Some(CanonicalValue::string("one"))])?;
//! writer.close()?;
//!
//! for row in ParquetRowReader::new(std::fs::File::open("rows.parquet")?)? {
//!     println!("{:?}", row?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod avro;
pub mod canonical;
pub mod catalog;
pub mod decimal;
pub mod defaults;
pub mod error;
pub mod options;
pub mod orc;
pub mod parquet;
pub mod schema;
pub mod temporal;
pub mod traits;
pub mod value;

pub use canonical::CanonicalType;
pub use catalog::{LogicalTypeCatalog, LogicalTypeEntry, TypeKind};
pub use decimal::Decimal;
pub use error::{ErrorContext, FormatError, Result};
pub use options::{DecoderOptions, EncoderOptions};
pub use schema::{FieldDescriptor, FormatField, FormatFieldList, SchemaDescription};
pub use value::{CanonicalValue, Row};
