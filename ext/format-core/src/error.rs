use thiserror::Error;

/// Core error type for row/format conversion
#[derive(Error, Debug)]
pub enum FormatError {
    /// A marshalled field record violates the wire format
    #[error("Malformed field: {0}")]
    MalformedField(String),

    /// A marshalled schema is structurally valid but carries bad values
    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    /// A non-nullable field has neither a value nor a default
    #[error("Required field '{field}' has no value and no default")]
    RequiredFieldMissing { field: String },

    /// The canonical type cannot be represented by the target format
    #[error("Unsupported canonical type: {0}")]
    UnsupportedCanonicalType(String),

    /// A native column type has no canonical counterpart
    #[error("Unrecognized native type '{native}' for column '{column}'")]
    UnrecognizedNativeType { column: String, native: String },

    /// A canonical/physical pairing the codec cannot convert
    #[error("Unsupported field type for '{field}': {detail}")]
    UnsupportedFieldType { field: String, detail: String },

    /// Catalog lookup by id outside the dense range
    #[error("Unknown type id {id} in {catalog} catalog")]
    UnknownTypeId { catalog: &'static str, id: usize },

    /// Catalog lookup by an unknown display name
    #[error("Unknown type name '{name}' in {catalog} catalog")]
    UnknownTypeName { catalog: &'static str, name: String },

    /// A configured default value could not be parsed for its type
    #[error("Invalid default '{value}' for field '{field}': {reason}")]
    InvalidDefault {
        field: String,
        value: String,
        reason: String,
    },

    /// A row does not line up with the schema description
    #[error("Row has {actual} values but schema has {expected} fields")]
    RowLength { expected: usize, actual: usize },

    /// A value does not fit the narrower native type
    #[error("Value out of range for '{field}': {detail}")]
    ValueOutOfRange { field: String, detail: String },

    /// A decimal needs more digits than the column precision allows
    #[error("Decimal value for '{field}' exceeds precision {precision}")]
    DecimalOverflow { field: String, precision: u32 },

    /// A blocking read was interrupted; never retried
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// IO errors from the underlying sink or source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow errors from column vector handling
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Parquet library errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Avro library errors
    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("ORC error: {0}")]
    Orc(#[from] orc_rust::error::OrcError),

    /// JSON errors while building Avro schemas
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Date/time arithmetic errors
    #[error("Time error: {0}")]
    Time(#[from] jiff::Error),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, FormatError>;

impl FormatError {
    pub fn malformed_field<S: Into<String>>(msg: S) -> Self {
        FormatError::MalformedField(msg.into())
    }

    pub fn malformed_schema<S: Into<String>>(msg: S) -> Self {
        FormatError::MalformedSchema(msg.into())
    }

    pub fn required_field_missing<S: Into<String>>(field: S) -> Self {
        FormatError::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn unsupported_field_type<F: Into<String>, D: Into<String>>(field: F, detail: D) -> Self {
        FormatError::UnsupportedFieldType {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn unrecognized_native_type<C: Into<String>, N: Into<String>>(column: C, native: N) -> Self {
        FormatError::UnrecognizedNativeType {
            column: column.into(),
            native: native.into(),
        }
    }

    pub fn out_of_range<F: Into<String>, D: Into<String>>(field: F, detail: D) -> Self {
        FormatError::ValueOutOfRange {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn check_row_length(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(FormatError::RowLength { expected, actual })
        }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        FormatError::Internal(msg.into())
    }

    /// Map an IO error raised while blocked on a read.
    ///
    /// Interruption is fatal for a read session and is surfaced as its own
    /// variant so callers do not mistake it for a retryable condition.
    pub fn from_read_error(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::Interrupted {
            FormatError::Interrupted(err.to_string())
        } else {
            FormatError::Io(err)
        }
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<FormatError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            FormatError::Internal(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            FormatError::Internal(format!("{}: {}", f().into(), base_error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FormatError::required_field_missing("amount");
        assert_eq!(
            err.to_string(),
            "Required field 'amount' has no value and no default"
        );

        let err = FormatError::malformed_field("a|b");
        assert_eq!(err.to_string(), "Malformed field: a|b");
    }

    #[test]
    fn test_interrupted_read_is_not_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Interrupted, "signal");
        assert!(matches!(
            FormatError::from_read_error(io_err),
            FormatError::Interrupted(_)
        ));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            FormatError::from_read_error(io_err),
            FormatError::Io(_)
        ));
    }

    #[test]
    fn test_error_with_context() {
        fn failing_operation() -> Result<()> {
            Err(FormatError::malformed_schema("bad allowNull"))
        }

        let path = "rows.parquet";
        let err = failing_operation()
            .with_context(|| format!("Reading schema from {}", path))
            .unwrap_err();
        assert!(err.to_string().contains("Reading schema from rows.parquet"));
    }
}
