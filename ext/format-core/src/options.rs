//! Encoder configuration

use jiff::tz::TimeZone;
use std::collections::HashMap;

/// Mask used to parse date and timestamp default values
pub const DEFAULT_DATE_MASK: &str = "%Y/%m/%d %H:%M:%S%.f";
/// Rows buffered before a batch (or row group) is handed to the native writer
pub const DEFAULT_BATCH_MAX_SIZE: usize = 10_000;

/// Options shared by every record encoder
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    date_mask: String,
    time_zone: TimeZone,
    field_time_zones: HashMap<String, TimeZone>,
    batch_max_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            date_mask: DEFAULT_DATE_MASK.to_string(),
            time_zone: TimeZone::system(),
            field_time_zones: HashMap::new(),
            batch_max_size: DEFAULT_BATCH_MAX_SIZE,
        }
    }
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strftime-style mask for date/timestamp defaults
    pub fn with_date_mask<S: Into<String>>(mut self, mask: S) -> Self {
        self.date_mask = mask.into();
        self
    }

    /// Set the zone used when a field has no zone of its own
    pub fn with_time_zone(mut self, tz: TimeZone) -> Self {
        self.time_zone = tz;
        self
    }

    /// Pin a zone for one field, keyed by its native column name
    pub fn with_field_time_zone<S: Into<String>>(mut self, field: S, tz: TimeZone) -> Self {
        self.field_time_zones.insert(field.into(), tz);
        self
    }

    /// Set the number of rows per flushed batch; zero is treated as one
    pub fn with_batch_max_size(mut self, size: usize) -> Self {
        self.batch_max_size = size.max(1);
        self
    }

    pub fn date_mask(&self) -> &str {
        &self.date_mask
    }

    pub fn batch_max_size(&self) -> usize {
        self.batch_max_size
    }

    pub fn time_zone_for(&self, field: &str) -> &TimeZone {
        self.field_time_zones.get(field).unwrap_or(&self.time_zone)
    }
}

/// Options shared by every reader
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    batch_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_MAX_SIZE,
        }
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records decoded per column read; zero is treated as one
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
