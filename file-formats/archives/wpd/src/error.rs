//! Error types for the WPD library

use std::io;
use thiserror::Error;

use crate::value::AttributeType;

/// Result type alias for WPD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for WPD operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing input file or schema
    #[error("Not found: {0}")]
    NotFound(String),

    /// Container header does not start with the format marker
    #[error("Invalid magic value: expected '{expected}', found '{found}'")]
    BadMagic {
        /// The expected magic value
        expected: String,
        /// The magic value found in the file
        found: String,
    },

    /// Codec access beyond the buffer bounds
    #[error("Out of range: {width} byte(s) at offset 0x{offset:X} in a buffer of {size} bytes")]
    OutOfRange {
        /// Requested offset
        offset: usize,
        /// Width of the access in bytes
        width: usize,
        /// Size of the buffer
        size: usize,
    },

    /// A value was accessed as the wrong variant
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Variant the caller asked for
        expected: AttributeType,
        /// Variant actually held
        found: AttributeType,
    },

    /// Attribute name is not declared by a format
    #[error("Attribute \"{attribute}\" is not defined in format \"{format}\"")]
    UnknownAttribute {
        /// The attribute name
        attribute: String,
        /// The format name
        format: String,
    },

    /// Symbolic name is not declared by an enumeration
    #[error("Key \"{symbol}\" is not defined in enumeration {enumeration}")]
    UnknownSymbol {
        /// The symbolic name
        symbol: String,
        /// The enumeration name
        enumeration: String,
    },

    /// No enumeration entry carries the value
    #[error("Value {value} is not defined in enumeration {enumeration}")]
    UnknownValue {
        /// The rendered value
        value: String,
        /// The enumeration name
        enumeration: String,
    },

    /// Archive has no entry with the given name
    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    /// Unparseable patch line
    #[error("Syntax error on line {line}: \"{text}\"")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// The offending line
        text: String,
    },

    /// Patch value matches neither the literal grammar nor an enum symbol
    #[error("Unexpected value for {expected} attribute ({value})")]
    InvalidValue {
        /// The value text
        value: String,
        /// Type of the target attribute
        expected: AttributeType,
    },

    /// Value or string does not fit the target field
    #[error("Value does not fit: {0}")]
    Unfit(String),

    /// Malformed schema descriptor
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error raised by the binary header codec
    #[error("binrw error: {0}")]
    Binrw(String),
}

impl Error {
    /// Create a new `OutOfRange` error
    pub fn out_of_range(offset: usize, width: usize, size: usize) -> Self {
        Error::OutOfRange {
            offset,
            width,
            size,
        }
    }

    /// Create a new `Unfit` error
    pub fn unfit<S: Into<String>>(msg: S) -> Self {
        Error::Unfit(msg.into())
    }

    /// Create a new `Schema` error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        Error::Schema(msg.into())
    }

    /// Create a new `NotFound` error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Check if this error aborts processing of a whole file
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::NotFound(_) | Error::BadMagic { .. } | Error::Binrw(_)
        )
    }

    /// Check if this error comes from a schema lookup
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Error::UnknownAttribute { .. } | Error::UnknownSymbol { .. } | Error::UnknownValue { .. }
        )
    }
}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(io) => Error::Io(io),
            other => Error::Binrw(format!("{other}")),
        }
    }
}

impl From<serde_yaml_ng::Error> for Error {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Error::Schema(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::out_of_range(0x1C, 4, 30);
        assert_eq!(
            err.to_string(),
            "Out of range: 4 byte(s) at offset 0x1C in a buffer of 30 bytes"
        );

        let err = Error::BadMagic {
            expected: "WPD".to_string(),
            found: "ABC".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid magic value: expected 'WPD', found 'ABC'"
        );

        let err = Error::TypeMismatch {
            expected: AttributeType::Float,
            found: AttributeType::String,
        };
        assert_eq!(err.to_string(), "Type mismatch: expected Float, found String");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::not_found("sys/missing.wdb").is_file_level());
        assert!(!Error::not_found("sys/missing.wdb").is_lookup());

        let lookup = Error::UnknownSymbol {
            symbol: "Fire".to_string(),
            enumeration: "Element".to_string(),
        };
        assert!(lookup.is_lookup());
        assert!(!lookup.is_file_level());
        assert!(!Error::unfit("too long").is_file_level());
    }

    #[test]
    fn test_binrw_io_error_keeps_kind() {
        let err: Error = binrw::Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).into();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }
}
