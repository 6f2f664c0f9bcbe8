//! Parquet logical type table

use crate::catalog::{LogicalTypeCatalog, LogicalTypeEntry as E};
use crate::CanonicalType as C;

pub const INT32: usize = 0;
pub const INT64: usize = 1;
pub const INT96: usize = 2;
pub const FLOAT: usize = 3;
pub const DOUBLE: usize = 4;
pub const BINARY: usize = 5;
pub const FIXED_LEN_BYTE_ARRAY: usize = 6;
pub const BOOLEAN: usize = 7;
pub const UTF8: usize = 8;
pub const ENUM: usize = 9;
pub const JSON: usize = 10;
pub const BSON: usize = 11;
pub const DECIMAL: usize = 12;
pub const DECIMAL_INT32: usize = 13;
pub const DECIMAL_INT64: usize = 14;
pub const DECIMAL_FIXED_LEN_BYTE_ARRAY: usize = 15;
pub const DATE: usize = 16;
pub const TIME_MILLIS: usize = 17;
pub const TIMESTAMP_MILLIS: usize = 18;
pub const TIMESTAMP_MICROS: usize = 19;
pub const INT8: usize = 20;
pub const INT16: usize = 21;
pub const UINT8: usize = 22;
pub const UINT16: usize = 23;
pub const UINT32: usize = 24;
pub const INTERVAL: usize = 25;

static ENTRIES: [E; 26] = [
    E::primitive(INT32, "Int32", "INT32", C::Integer),
    E::primitive(INT64, "Int64", "INT64", C::Integer),
    E::primitive(INT96, "Int96", "INT96", C::Timestamp),
    E::primitive(FLOAT, "Float", "FLOAT", C::Number),
    E::primitive(DOUBLE, "Double", "DOUBLE", C::Number),
    E::primitive(BINARY, "Binary", "BYTE_ARRAY", C::Binary),
    E::primitive(
        FIXED_LEN_BYTE_ARRAY,
        "FixedLengthByteArray",
        "FIXED_LEN_BYTE_ARRAY",
        C::Binary,
    )
    .with_length(16)
    .hidden(),
    E::primitive(BOOLEAN, "Boolean", "BOOLEAN", C::Boolean),
    E::logical(UTF8, "UTF8", "BYTE_ARRAY", "UTF8", C::String),
    E::logical(ENUM, "Enum", "BYTE_ARRAY", "ENUM", C::String).hidden(),
    E::logical(JSON, "JSON", "BYTE_ARRAY", "JSON", C::String).hidden(),
    E::logical(BSON, "BSON", "BYTE_ARRAY", "BSON", C::Binary).hidden(),
    E::logical(DECIMAL, "Decimal", "BYTE_ARRAY", "DECIMAL", C::BigNumber).with_decimal(20, 10),
    E::logical(DECIMAL_INT32, "DecimalInt32", "INT32", "DECIMAL", C::BigNumber).with_decimal(9, 2),
    E::logical(DECIMAL_INT64, "DecimalInt64", "INT64", "DECIMAL", C::BigNumber).with_decimal(18, 2),
    E::logical(
        DECIMAL_FIXED_LEN_BYTE_ARRAY,
        "DecimalFixedLengthByteArray",
        "FIXED_LEN_BYTE_ARRAY",
        "DECIMAL",
        C::BigNumber,
    )
    .with_decimal(20, 10)
    .hidden(),
    E::logical(DATE, "Date", "INT32", "DATE", C::Date),
    E::logical(TIME_MILLIS, "TimeMillis", "INT32", "TIME_MILLIS", C::Integer).hidden(),
    E::logical(TIMESTAMP_MILLIS, "TimestampMillis", "INT64", "TIMESTAMP_MILLIS", C::Timestamp),
    E::logical(TIMESTAMP_MICROS, "TimestampMicros", "INT64", "TIMESTAMP_MICROS", C::Timestamp)
        .hidden(),
    E::logical(INT8, "Int8", "INT32", "INT_8", C::Integer).hidden(),
    E::logical(INT16, "Int16", "INT32", "INT_16", C::Integer).hidden(),
    E::logical(UINT8, "UInt8", "INT32", "UINT_8", C::Integer).hidden(),
    E::logical(UINT16, "UInt16", "INT32", "UINT_16", C::Integer).hidden(),
    E::logical(UINT32, "UInt32", "INT32", "UINT_32", C::Integer).hidden(),
    E::logical(INTERVAL, "Interval", "FIXED_LEN_BYTE_ARRAY", "INTERVAL", C::Binary)
        .with_length(12)
        .hidden(),
];

static DEFAULTS: [(C, usize); 8] = [
    (C::Number, DOUBLE),
    (C::String, UTF8),
    (C::Date, DATE),
    (C::Boolean, BOOLEAN),
    (C::Integer, INT64),
    (C::BigNumber, DECIMAL),
    (C::Binary, BINARY),
    (C::Timestamp, INT96),
];

pub static PARQUET_CATALOG: LogicalTypeCatalog =
    LogicalTypeCatalog::new("parquet", &ENTRIES, &DEFAULTS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::assert_catalog_invariants;

    #[test]
    fn test_catalog_is_complete() {
        assert_catalog_invariants(&PARQUET_CATALOG);
        assert_eq!(PARQUET_CATALOG.len(), 26);
    }

    #[test]
    fn test_native_lookup() {
        let entry = PARQUET_CATALOG.find_native("INT32", Some("DECIMAL")).unwrap();
        assert_eq!(entry.id, DECIMAL_INT32);
        assert_eq!(entry.default_precision, Some(9));
        assert_eq!(
            PARQUET_CATALOG.find_native("BYTE_ARRAY", None).unwrap().id,
            BINARY
        );
    }

    #[test]
    fn test_displayable_names() {
        assert_eq!(
            PARQUET_CATALOG.displayable_names(),
            vec![
                "Binary",
                "Boolean",
                "Date",
                "Decimal",
                "DecimalInt32",
                "DecimalInt64",
                "Double",
                "Float",
                "Int32",
                "Int64",
                "Int96",
                "TimestampMillis",
                "UTF8",
            ]
        );
    }
}
