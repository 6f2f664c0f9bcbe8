//! ORC logical type table

use crate::catalog::{LogicalTypeCatalog, LogicalTypeEntry as E};
use crate::CanonicalType as C;

pub const BOOLEAN: usize = 0;
pub const TINYINT: usize = 1;
pub const SMALLINT: usize = 2;
pub const INTEGER: usize = 3;
pub const BIGINT: usize = 4;
pub const FLOAT: usize = 5;
pub const DOUBLE: usize = 6;
pub const DECIMAL: usize = 7;
pub const CHAR: usize = 8;
pub const VARCHAR: usize = 9;
pub const STRING: usize = 10;
pub const BINARY: usize = 11;
pub const DATE: usize = 12;
pub const TIMESTAMP: usize = 13;
pub const STRUCT: usize = 14;
pub const LIST: usize = 15;
pub const MAP: usize = 16;
pub const UNION: usize = 17;

static ENTRIES: [E; 18] = [
    E::primitive(BOOLEAN, "Boolean", "boolean", C::Boolean),
    E::primitive(TINYINT, "TinyInt", "tinyint", C::Integer),
    E::primitive(SMALLINT, "SmallInt", "smallint", C::Integer),
    E::primitive(INTEGER, "Integer", "int", C::Integer),
    E::primitive(BIGINT, "BigInt", "bigint", C::Integer),
    E::primitive(FLOAT, "Float", "float", C::Number),
    E::primitive(DOUBLE, "Double", "double", C::Number),
    E::primitive(DECIMAL, "Decimal", "decimal", C::BigNumber).with_decimal(20, 10),
    E::primitive(CHAR, "Char", "char", C::String).with_length(255).hidden(),
    E::primitive(VARCHAR, "VarChar", "varchar", C::String).with_length(65535).hidden(),
    E::primitive(STRING, "String", "string", C::String),
    E::primitive(BINARY, "Binary", "binary", C::Binary),
    E::primitive(DATE, "Date", "date", C::Date),
    E::primitive(TIMESTAMP, "Timestamp", "timestamp", C::Timestamp),
    E::complex(STRUCT, "Struct", "struct"),
    E::complex(LIST, "List", "array"),
    E::complex(MAP, "Map", "map"),
    E::complex(UNION, "Union", "uniontype"),
];

static DEFAULTS: [(C, usize); 8] = [
    (C::Number, DOUBLE),
    (C::String, STRING),
    (C::Date, DATE),
    (C::Boolean, BOOLEAN),
    (C::Integer, BIGINT),
    (C::BigNumber, DECIMAL),
    (C::Binary, BINARY),
    (C::Timestamp, TIMESTAMP),
];

pub static ORC_CATALOG: LogicalTypeCatalog = LogicalTypeCatalog::new("orc", &ENTRIES, &DEFAULTS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::assert_catalog_invariants;

    #[test]
    fn test_catalog_is_complete() {
        assert_catalog_invariants(&ORC_CATALOG);
        assert_eq!(ORC_CATALOG.len(), 18);
        assert!(ORC_CATALOG.entry_of(MAP).unwrap().is_complex());
        assert_eq!(ORC_CATALOG.id_of("VarChar").unwrap(), VARCHAR);
        assert_eq!(ORC_CATALOG.find_native("int", None).unwrap().id, INTEGER);
    }

    #[test]
    fn test_displayable_names() {
        assert_eq!(
            ORC_CATALOG.displayable_names(),
            vec![
                "BigInt",
                "Binary",
                "Boolean",
                "Date",
                "Decimal",
                "Double",
                "Float",
                "Integer",
                "SmallInt",
                "String",
                "Timestamp",
                "TinyInt",
            ]
        );
    }
}
