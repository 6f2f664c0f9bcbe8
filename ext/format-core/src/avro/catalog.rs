//! Avro logical type table

use crate::catalog::{LogicalTypeCatalog, LogicalTypeEntry as E};
use crate::CanonicalType as C;

pub const BOOLEAN: usize = 0;
pub const DATE: usize = 1;
pub const DECIMAL: usize = 2;
pub const DOUBLE: usize = 3;
pub const FLOAT: usize = 4;
pub const INTEGER: usize = 5;
pub const LONG: usize = 6;
pub const STRING: usize = 7;
pub const TIME_MILLIS: usize = 8;
pub const TIMESTAMP_MILLIS: usize = 9;
pub const BYTES: usize = 10;
pub const FIXED: usize = 11;
pub const DECIMAL_FIXED: usize = 12;
pub const TIMESTAMP_MICROS: usize = 13;
pub const RECORD: usize = 14;
pub const ARRAY: usize = 15;
pub const MAP: usize = 16;
pub const UNION: usize = 17;

static ENTRIES: [E; 18] = [
    E::primitive(BOOLEAN, "Boolean", "boolean", C::Boolean),
    E::logical(DATE, "Date", "int", "date", C::Date),
    E::logical(DECIMAL, "Decimal", "bytes", "decimal", C::BigNumber).with_decimal(20, 10),
    E::primitive(DOUBLE, "Double", "double", C::Number),
    E::primitive(FLOAT, "Float", "float", C::Number),
    E::primitive(INTEGER, "Integer", "int", C::Integer),
    E::primitive(LONG, "Long", "long", C::Integer),
    E::primitive(STRING, "String", "string", C::String),
    E::logical(TIME_MILLIS, "TimeMillis", "int", "time-millis", C::Integer).hidden(),
    E::logical(TIMESTAMP_MILLIS, "TimestampMillis", "long", "timestamp-millis", C::Timestamp),
    E::primitive(BYTES, "Bytes", "bytes", C::Binary),
    E::primitive(FIXED, "Fixed", "fixed", C::Binary).with_length(16).hidden(),
    E::logical(DECIMAL_FIXED, "DecimalFixed", "fixed", "decimal", C::BigNumber)
        .with_decimal(20, 10)
        .hidden(),
    E::logical(TIMESTAMP_MICROS, "TimestampMicros", "long", "timestamp-micros", C::Timestamp)
        .hidden(),
    E::complex(RECORD, "Record", "record"),
    E::complex(ARRAY, "Array", "array"),
    E::complex(MAP, "Map", "map"),
    E::complex(UNION, "Union", "union"),
];

static DEFAULTS: [(C, usize); 8] = [
    (C::Number, DOUBLE),
    (C::String, STRING),
    (C::Date, DATE),
    (C::Boolean, BOOLEAN),
    (C::Integer, LONG),
    (C::BigNumber, DECIMAL),
    (C::Binary, BYTES),
    (C::Timestamp, TIMESTAMP_MILLIS),
];

pub static AVRO_CATALOG: LogicalTypeCatalog = LogicalTypeCatalog::new("avro", &ENTRIES, &DEFAULTS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::assert_catalog_invariants;

    #[test]
    fn test_catalog_is_complete() {
        assert_catalog_invariants(&AVRO_CATALOG);
        assert_eq!(AVRO_CATALOG.len(), 18);
        assert_eq!(AVRO_CATALOG.find_native("fixed", Some("decimal")).unwrap().id, DECIMAL_FIXED);
        assert_eq!(AVRO_CATALOG.find_native("int", None).unwrap().id, INTEGER);
        assert_eq!(AVRO_CATALOG.default_for(C::Integer).unwrap().name, "Long");
    }

    #[test]
    fn test_displayable_names() {
        assert_eq!(
            AVRO_CATALOG.displayable_names(),
            vec![
                "Boolean",
                "Bytes",
                "Date",
                "Decimal",
                "Double",
                "Float",
                "Integer",
                "Long",
                "String",
                "TimestampMillis",
            ]
        );
    }
}
