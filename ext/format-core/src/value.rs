use crate::{CanonicalType, Decimal};
use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// A single canonical value. Absence is modelled as `None` in a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalValue {
    String(Arc<str>),
    Integer(i64),
    Number(OrderedFloat<f64>),
    Boolean(bool),
    BigNumber(Decimal),
    Date(jiff::civil::Date),
    Timestamp(jiff::Timestamp),
    Binary(Bytes),
}

/// One row, positionally aligned with a schema description
pub type Row = Vec<Option<CanonicalValue>>;

impl CanonicalValue {
    pub fn canonical_type(&self) -> CanonicalType {
        match self {
            CanonicalValue::String(_) => CanonicalType::String,
            CanonicalValue::Integer(_) => CanonicalType::Integer,
            CanonicalValue::Number(_) => CanonicalType::Number,
            CanonicalValue::Boolean(_) => CanonicalType::Boolean,
            CanonicalValue::BigNumber(_) => CanonicalType::BigNumber,
            CanonicalValue::Date(_) => CanonicalType::Date,
            CanonicalValue::Timestamp(_) => CanonicalType::Timestamp,
            CanonicalValue::Binary(_) => CanonicalType::Binary,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.canonical_type().name()
    }

    pub fn string<S: AsRef<str>>(s: S) -> Self {
        CanonicalValue::String(Arc::from(s.as_ref()))
    }

    pub fn number(n: f64) -> Self {
        CanonicalValue::Number(OrderedFloat(n))
    }

    pub fn binary<B: Into<Bytes>>(b: B) -> Self {
        CanonicalValue::Binary(b.into())
    }
}
