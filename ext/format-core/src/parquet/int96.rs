//! 96-bit Julian day timestamps.
//!
//! Layout: bytes `[0..8)` hold nanoseconds as a little-endian `i64`, bytes
//! `[8..12)` the Julian day number as a little-endian `i32`. The day is the
//! instant's local date in the column zone while the nanoseconds are measured
//! from UTC midnight of that day number, so they may fall outside a single day
//! by the zone offset. Decoding sums both parts and is exact to the
//! millisecond whichever zone was used to encode.

use crate::temporal::{days_since_epoch, timestamp_from_millis, MILLIS_PER_DAY, NANOS_PER_DAY};
use crate::{FormatError, Result};
use jiff::tz::TimeZone;
use jiff::Timestamp;
use parquet::data_type::Int96;

/// Julian day number of 1970-01-01
pub const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;

const NANOS_PER_MILLI: i64 = 1_000_000;

pub fn encode(field: &str, ts: Timestamp, tz: &TimeZone) -> Result<[u8; 12]> {
    let local_date = ts.to_zoned(tz.clone()).date();
    let days = days_since_epoch(local_date)? as i64;

    let nanos_of_day = i64::try_from(ts.as_nanosecond() - days as i128 * NANOS_PER_DAY as i128)
        .map_err(|_| FormatError::out_of_range(field, format!("{} as INT96", ts)))?;
    let julian_day = i32::try_from(days + JULIAN_DAY_OF_EPOCH)
        .map_err(|_| FormatError::out_of_range(field, format!("{} as INT96", ts)))?;

    let mut bytes = [0u8; 12];
    bytes[..8].copy_from_slice(&nanos_of_day.to_le_bytes());
    bytes[8..].copy_from_slice(&julian_day.to_le_bytes());
    Ok(bytes)
}

/// Epoch milliseconds of an encoded value.
///
/// The nanoseconds are floored, not truncated toward zero, so an instant
/// before the epoch or a negative nanosecond part decodes to the millisecond
/// at or before it.
pub fn decode_millis(bytes: &[u8; 12]) -> i64 {
    let mut nanos = [0u8; 8];
    nanos.copy_from_slice(&bytes[..8]);
    let mut day = [0u8; 4];
    day.copy_from_slice(&bytes[8..]);

    let nanos_of_day = i64::from_le_bytes(nanos);
    let julian_day = i32::from_le_bytes(day) as i64;
    (julian_day - JULIAN_DAY_OF_EPOCH) * MILLIS_PER_DAY + nanos_of_day.div_euclid(NANOS_PER_MILLI)
}

pub fn decode(bytes: &[u8; 12]) -> Result<Timestamp> {
    timestamp_from_millis(decode_millis(bytes))
}

/// Pack into the parquet physical value; each word is little endian on disk
pub fn to_physical(bytes: &[u8; 12]) -> Int96 {
    let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    let mut value = Int96::new();
    value.set_data(word(0), word(4), word(8));
    value
}

pub fn from_physical(value: &Int96) -> [u8; 12] {
    let mut bytes = [0u8; 12];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(value.data()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}
