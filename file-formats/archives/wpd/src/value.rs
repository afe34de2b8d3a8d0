//! Scalar attribute types and values

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Scalar type of a record attribute or enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Single bit flag
    Boolean,
    /// Unsigned integer, up to 32 bits
    Unsigned,
    /// Two's complement signed integer, up to 32 bits
    Signed,
    /// 32-bit IEEE 754 float
    Float,
    /// 32-bit offset into the interned string table
    String,
}

impl AttributeType {
    /// Name used for this type in schema descriptors
    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::Boolean => "Boolean",
            AttributeType::Unsigned => "Unsigned",
            AttributeType::Signed => "Signed",
            AttributeType::Float => "Float",
            AttributeType::String => "String",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Boolean" => Ok(AttributeType::Boolean),
            "Unsigned" => Ok(AttributeType::Unsigned),
            "Signed" => Ok(AttributeType::Signed),
            "Float" => Ok(AttributeType::Float),
            "String" => Ok(AttributeType::String),
            _ => Err(Error::schema(format!("Unknown attribute type: {s}"))),
        }
    }
}

/// Display format of a numeric attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeFormat {
    /// Plain decimal
    #[default]
    Decimal,
    /// Decimal followed by `%`
    Percentage,
    /// `0x`-prefixed, zero-padded to the bit length
    Hexadecimal,
}

impl FromStr for AttributeFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "decimal" => Ok(AttributeFormat::Decimal),
            "percent" => Ok(AttributeFormat::Percentage),
            "hexa" => Ok(AttributeFormat::Hexadecimal),
            _ => Err(Error::schema(format!("Unknown attribute format: {s}"))),
        }
    }
}

/// A tagged scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Boolean value
    Boolean(bool),
    /// Unsigned 32-bit value
    Unsigned(u32),
    /// Signed 32-bit value
    Signed(i32),
    /// 32-bit float value
    Float(f32),
    /// String value
    String(String),
}

impl AttributeValue {
    /// Get the type tag of the active variant
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::Unsigned(_) => AttributeType::Unsigned,
            AttributeValue::Signed(_) => AttributeType::Signed,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::String(_) => AttributeType::String,
        }
    }

    fn mismatch(&self, expected: AttributeType) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.attribute_type(),
        }
    }

    /// Get the value as a boolean
    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            AttributeValue::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(AttributeType::Boolean)),
        }
    }

    /// Get the value as an unsigned integer
    pub fn as_unsigned(&self) -> Result<u32> {
        match self {
            AttributeValue::Unsigned(u) => Ok(*u),
            other => Err(other.mismatch(AttributeType::Unsigned)),
        }
    }

    /// Get the value as a signed integer
    pub fn as_signed(&self) -> Result<i32> {
        match self {
            AttributeValue::Signed(i) => Ok(*i),
            other => Err(other.mismatch(AttributeType::Signed)),
        }
    }

    /// Get the value as a float
    pub fn as_float(&self) -> Result<f32> {
        match self {
            AttributeValue::Float(f) => Ok(*f),
            other => Err(other.mismatch(AttributeType::Float)),
        }
    }

    /// Get the value as a string slice
    pub fn as_str(&self) -> Result<&str> {
        match self {
            AttributeValue::String(s) => Ok(s),
            other => Err(other.mismatch(AttributeType::String)),
        }
    }

    /// Check whether two values are identical, comparing floats bit for bit
    pub fn same_as(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Boolean(b) => write!(f, "{b}"),
            AttributeValue::Unsigned(u) => write!(f, "{u}"),
            AttributeValue::Signed(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v:.2}"),
            AttributeValue::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<u32> for AttributeValue {
    fn from(u: u32) -> Self {
        AttributeValue::Unsigned(u)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Signed(i)
    }
}

impl From<f32> for AttributeValue {
    fn from(f: f32) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}
