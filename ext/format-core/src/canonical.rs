//! Canonical (format independent) value types and their persisted ids.

use crate::{FormatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical value type shared by every format adapter.
///
/// The discriminants are the integers written into marshalled schema
/// descriptions and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum CanonicalType {
    None = 0,
    Number = 1,
    String = 2,
    Date = 3,
    Boolean = 4,
    Integer = 5,
    BigNumber = 6,
    Serializable = 7,
    Binary = 8,
    Timestamp = 9,
    Inet = 10,
}

impl CanonicalType {
    const ALL: [CanonicalType; 11] = [
        CanonicalType::None,
        CanonicalType::Number,
        CanonicalType::String,
        CanonicalType::Date,
        CanonicalType::Boolean,
        CanonicalType::Integer,
        CanonicalType::BigNumber,
        CanonicalType::Serializable,
        CanonicalType::Binary,
        CanonicalType::Timestamp,
        CanonicalType::Inet,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| FormatError::UnsupportedCanonicalType(format!("id {}", id)))
    }

    pub fn name(self) -> &'static str {
        match self {
            CanonicalType::None => "None",
            CanonicalType::Number => "Number",
            CanonicalType::String => "String",
            CanonicalType::Date => "Date",
            CanonicalType::Boolean => "Boolean",
            CanonicalType::Integer => "Integer",
            CanonicalType::BigNumber => "BigNumber",
            CanonicalType::Serializable => "Serializable",
            CanonicalType::Binary => "Binary",
            CanonicalType::Timestamp => "Timestamp",
            CanonicalType::Inet => "Inet",
        }
    }

    /// Whether rows of this type can flow through the converters at all
    pub fn is_convertible(self) -> bool {
        !matches!(
            self,
            CanonicalType::None | CanonicalType::Serializable | CanonicalType::Inet
        )
    }

    /// Date and timestamp defaults are parsed with a date mask
    pub fn is_temporal(self) -> bool {
        matches!(self, CanonicalType::Date | CanonicalType::Timestamp)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for CanonicalType {
    type Error = FormatError;

    fn try_from(id: u32) -> Result<Self> {
        Self::from_id(id)
    }
}

impl From<CanonicalType> for u32 {
    fn from(value: CanonicalType) -> Self {
        value.id()
    }
}
