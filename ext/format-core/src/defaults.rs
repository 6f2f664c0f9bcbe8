//! Absent-value policy and default value parsing.
//!
//! Every encoder runs a field value through [`resolve_value`] before applying
//! its format rules, so null/default handling is identical across formats.

use crate::temporal::EPOCH_DATE;
use crate::{
    CanonicalType, CanonicalValue, Decimal, EncoderOptions, FieldDescriptor, FormatError, Result,
};
use bytes::Bytes;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Apply the null/default policy and canonical type check to one field.
///
/// Returns `Ok(None)` when the field should be written as null.
pub fn resolve_value(
    field: &FieldDescriptor,
    value: Option<&CanonicalValue>,
    options: &EncoderOptions,
) -> Result<Option<CanonicalValue>> {
    match value {
        Some(value) => coerce(field, value).map(Some),
        None if field.allow_null => Ok(None),
        None => match field.default_value.as_deref() {
            Some(text) => parse_default(field, text, options).map(Some),
            None => Err(FormatError::required_field_missing(field.native_name())),
        },
    }
}

/// Check a present value against the field type, applying lossless widenings
pub fn coerce(field: &FieldDescriptor, value: &CanonicalValue) -> Result<CanonicalValue> {
    match (field.canonical_type, value) {
        (expected, value) if value.canonical_type() == expected => Ok(value.clone()),
        (CanonicalType::Number, CanonicalValue::Integer(i)) => {
            Ok(CanonicalValue::Number(OrderedFloat(*i as f64)))
        }
        (CanonicalType::BigNumber, CanonicalValue::Integer(i)) => {
            Ok(CanonicalValue::BigNumber(Decimal::from(*i)))
        }
        (expected, value) => Err(FormatError::unsupported_field_type(
            field.native_name(),
            format!("expected {} value, got {}", expected, value.type_name()),
        )),
    }
}

/// Parse a textual default according to the field's canonical type
pub fn parse_default(
    field: &FieldDescriptor,
    text: &str,
    options: &EncoderOptions,
) -> Result<CanonicalValue> {
    let name = field.native_name();
    let invalid = |reason: String| FormatError::InvalidDefault {
        field: name.to_string(),
        value: text.to_string(),
        reason,
    };

    match field.canonical_type {
        CanonicalType::String => Ok(CanonicalValue::String(Arc::from(text))),
        CanonicalType::Integer => text
            .trim()
            .parse::<i64>()
            .map(CanonicalValue::Integer)
            .map_err(|e| invalid(e.to_string())),
        CanonicalType::Number => text
            .trim()
            .parse::<f64>()
            .map(|n| CanonicalValue::Number(OrderedFloat(n)))
            .map_err(|e| invalid(e.to_string())),
        CanonicalType::BigNumber => text
            .parse::<Decimal>()
            .map(CanonicalValue::BigNumber)
            .map_err(|e| invalid(e.to_string())),
        CanonicalType::Boolean => parse_boolean(text)
            .map(CanonicalValue::Boolean)
            .ok_or_else(|| invalid("not a boolean".to_string())),
        CanonicalType::Binary => Ok(CanonicalValue::Binary(Bytes::copy_from_slice(
            text.as_bytes(),
        ))),
        CanonicalType::Date => Ok(CanonicalValue::Date(
            match parse_date_time(text, options.date_mask()) {
                Some(dt) => dt.date(),
                None => {
                    tracing::warn!(field = %name, value = %text, "unparsable date default, using epoch");
                    EPOCH_DATE
                }
            },
        )),
        CanonicalType::Timestamp => {
            let tz = options.time_zone_for(name);
            Ok(CanonicalValue::Timestamp(
                match parse_timestamp(text, options.date_mask(), tz) {
                    Some(ts) => ts,
                    None => {
                        tracing::warn!(field = %name, value = %text, "unparsable timestamp default, using epoch");
                        Timestamp::UNIX_EPOCH
                    }
                },
            ))
        }
        other => Err(FormatError::UnsupportedCanonicalType(format!(
            "{} for field '{}'",
            other, name
        ))),
    }
}

fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "1" => Some(true),
        "false" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse with the full mask, then with its date part alone
fn parse_date_time(text: &str, mask: &str) -> Option<DateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::strptime(mask, text) {
        return Some(dt);
    }
    let date_mask = mask.split_whitespace().next()?;
    Date::strptime(date_mask, text)
        .ok()
        .map(|date| date.to_datetime(jiff::civil::Time::midnight()))
}

fn parse_timestamp(text: &str, mask: &str, tz: &TimeZone) -> Option<Timestamp> {
    let dt = parse_date_time(text, mask)?;
    dt.to_zoned(tz.clone()).ok().map(|zoned| zoned.timestamp())
}
