//! Day and epoch-unit conversions shared by the format codecs

use crate::{FormatError, Result};
use jiff::civil::{self, Date};
use jiff::{Span, Timestamp};

pub const EPOCH_DATE: Date = civil::date(1970, 1, 1);
pub const MILLIS_PER_DAY: i64 = 86_400_000;
pub const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// Days from 1970-01-01 to `date`
pub fn days_since_epoch(date: Date) -> Result<i32> {
    Ok(date.since(EPOCH_DATE)?.get_days())
}

pub fn date_from_days(days: i64) -> Result<Date> {
    Ok(EPOCH_DATE.checked_add(Span::new().try_days(days)?)?)
}

pub fn timestamp_from_millis(millis: i64) -> Result<Timestamp> {
    Ok(Timestamp::from_millisecond(millis)?)
}

pub fn timestamp_from_micros(micros: i64) -> Result<Timestamp> {
    Ok(Timestamp::from_microsecond(micros)?)
}

pub fn timestamp_from_nanos(nanos: i64) -> Result<Timestamp> {
    Ok(Timestamp::from_nanosecond(nanos as i128)?)
}

/// Epoch nanoseconds as `i64`, failing outside roughly 1677..2262
pub fn timestamp_to_nanos(field: &str, ts: Timestamp) -> Result<i64> {
    i64::try_from(ts.as_nanosecond()).map_err(|_| {
        FormatError::out_of_range(field, format!("{} does not fit nanosecond precision", ts))
    })
}

/// Floor of the epoch nanoseconds divided by `nanos_per_unit`
pub fn epoch_units(field: &str, ts: Timestamp, nanos_per_unit: i128) -> Result<i64> {
    i64::try_from(ts.as_nanosecond().div_euclid(nanos_per_unit))
        .map_err(|_| FormatError::out_of_range(field, ts.to_string()))
}
