//! ORC adapter.
//!
//! Rows are appended into Arrow column vectors and leave the encoder as
//! [`RecordBatch`](arrow_array::RecordBatch)es, which a
//! [`BatchSink`](crate::traits::BatchSink) persists: [`OrcFileSink`] writes an
//! ORC file, a `Vec<RecordBatch>` keeps them in memory. Reading works over ORC
//! files and any Arrow [`RecordBatchReader`](arrow_array::RecordBatchReader).
//! ORC columns have no nullability of their own, so every introspected field
//! allows null.

pub mod catalog;
pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod schema;
pub mod types;
pub mod writer;

pub use catalog::ORC_CATALOG;
pub use decoder::OrcBatchDecoder;
pub use encoder::OrcBatchEncoder;
pub use reader::OrcRowReader;
pub use schema::{OrcColumn, OrcSchemaConverter};
pub use types::OrcType;
pub use writer::{OrcFileSink, OrcRowWriter, OrcWriterBuilder};
