//! Record layouts describing named bit-fields

use std::fmt;

use crate::chunk::{Chunk, low_bits};
use crate::value::{AttributeFormat, AttributeType, AttributeValue};
use crate::{Error, Result};

/// One named field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name used in patch scripts and dumps
    pub name: String,
    /// Scalar type of the field
    pub attribute_type: AttributeType,
    /// Display format for numeric fields
    pub format: AttributeFormat,
    /// Enumeration bound to the field, if any
    pub enum_name: Option<String>,
    /// Byte offset of the 32-bit word holding the field
    pub offset: u32,
    /// First bit of the field inside its word (0 is the least significant)
    pub bit: u32,
    /// Length of the field in bits
    pub size: u32,
    /// Whether dumps skip the field unless asked otherwise
    pub hidden: bool,
}

impl Attribute {
    /// Create a field covering a whole word (a single bit for Boolean fields)
    pub fn new(name: impl Into<String>, attribute_type: AttributeType, offset: u32) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            format: AttributeFormat::Decimal,
            enum_name: None,
            offset,
            bit: 0,
            size: if attribute_type == AttributeType::Boolean {
                1
            } else {
                32
            },
            hidden: false,
        }
    }

    /// Synthesized name for a field without a declared one
    pub fn auto_name(offset: u32, bit: u32, size: u32) -> String {
        format!("[0x{offset:04X}|{bit:02}|{size:02}]")
    }

    /// Place the field at `bit` with `size` bits.
    ///
    /// A bit offset past 31 is folded into the byte offset.
    pub fn with_bits(mut self, bit: u32, size: u32) -> Self {
        self.offset += bit / 32;
        self.bit = bit % 32;
        self.size = size;
        self
    }

    /// Set the display format
    pub fn with_format(mut self, format: AttributeFormat) -> Self {
        self.format = format;
        self
    }

    /// Bind an enumeration
    pub fn with_enum(mut self, enum_name: impl Into<String>) -> Self {
        self.enum_name = Some(enum_name.into());
        self
    }

    /// Mark the field hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Number of hex digits needed for the field's bit length
    pub fn hex_width(&self) -> usize {
        self.size.div_ceil(4) as usize
    }

    /// Check that the field lies inside one 32-bit word with at least one bit
    pub fn check_bits(&self) -> Result<()> {
        let valid = match self.attribute_type {
            AttributeType::Boolean => self.size == 1 && self.bit < 32,
            _ => self.size >= 1 && self.size <= 32 && self.bit <= 32 - self.size,
        };
        if valid {
            Ok(())
        } else {
            Err(Error::schema(format!(
                "attribute {} has an invalid bit range (bit {}, size {})",
                self.name, self.bit, self.size
            )))
        }
    }

    fn word_offset(&self) -> usize {
        self.offset as usize
    }

    /// Decode the field from a record. String fields are resolved through
    /// the string table `strings`.
    pub fn decode(&self, record: &Chunk, strings: &Chunk) -> Result<AttributeValue> {
        let offset = self.word_offset();
        Ok(match self.attribute_type {
            AttributeType::Boolean => AttributeValue::Boolean(record.get_boolean(offset, self.bit)?),
            AttributeType::Unsigned => {
                AttributeValue::Unsigned(record.get_unsigned_mask(offset, self.bit, self.size)?)
            }
            AttributeType::Signed => {
                AttributeValue::Signed(record.get_signed_mask(offset, self.bit, self.size)?)
            }
            AttributeType::Float => AttributeValue::Float(record.get_float(offset)?),
            AttributeType::String => {
                let reference = record.get_unsigned(offset)?;
                AttributeValue::String(strings.get_string(reference as usize)?)
            }
        })
    }

    /// Encode `value` into a record.
    ///
    /// String fields store a string-table offset, which is passed as an
    /// `Unsigned` value.
    pub fn encode(&self, record: &mut Chunk, value: &AttributeValue) -> Result<()> {
        let offset = self.word_offset();
        match (self.attribute_type, value) {
            (AttributeType::Boolean, AttributeValue::Boolean(b)) => {
                record.set_boolean(offset, self.bit, *b)
            }
            (AttributeType::Unsigned, AttributeValue::Unsigned(u)) => {
                record.set_unsigned_mask(offset, self.bit, self.size, *u)
            }
            (AttributeType::Signed, AttributeValue::Signed(i)) => {
                record.set_signed_mask(offset, self.bit, self.size, *i)
            }
            (AttributeType::Float, AttributeValue::Float(f)) => record.set_float(offset, *f),
            (AttributeType::String, AttributeValue::Unsigned(reference)) => {
                record.set_unsigned(offset, *reference)
            }
            (expected, other) => Err(Error::TypeMismatch {
                expected,
                found: other.attribute_type(),
            }),
        }
    }

    /// Check that a numeric value fits the field's bit length
    pub fn check_fit(&self, value: &AttributeValue) -> Result<()> {
        if self.size == 0 {
            return Err(Error::unfit(format!("attribute {} has no bits", self.name)));
        }
        let fits = match value {
            AttributeValue::Unsigned(u) => self.size >= 32 || *u <= low_bits(self.size),
            AttributeValue::Signed(i) => {
                self.size >= 32 || {
                    let half = 1i64 << (self.size - 1);
                    (-half..half).contains(&i64::from(*i))
                }
            }
            _ => true,
        };
        if fits {
            Ok(())
        } else {
            Err(Error::unfit(format!(
                "{value} does not fit in {} bit(s) of attribute {}",
                self.size, self.name
            )))
        }
    }

    /// Render a decoded value using the field's display format
    pub fn render(&self, value: &AttributeValue) -> String {
        self.render_as(value, self.format)
    }

    /// Render a decoded value using `format` instead of the declared one
    pub fn render_as(&self, value: &AttributeValue, format: AttributeFormat) -> String {
        let width = self.hex_width();
        match (value, format) {
            (AttributeValue::Unsigned(u), AttributeFormat::Hexadecimal) => {
                format!("0x{u:0width$X}")
            }
            (AttributeValue::Unsigned(u), AttributeFormat::Percentage) => format!("{u}%"),
            (AttributeValue::Signed(i), AttributeFormat::Hexadecimal) => {
                format!("0x{:0width$X}", (*i as u32) & low_bits(self.size))
            }
            (AttributeValue::Signed(i), AttributeFormat::Percentage) => format!("{i}%"),
            (AttributeValue::Float(f), AttributeFormat::Hexadecimal) => {
                format!("0x{:08X}", f.to_bits())
            }
            (AttributeValue::Float(f), AttributeFormat::Percentage) => format!("{f:.2}%"),
            (other, _) => other.to_string(),
        }
    }
}

/// The layout of a fixed-size record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    name: String,
    size: u32,
    attributes: Vec<Attribute>,
}

impl Format {
    /// Create a format without attributes
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            attributes: Vec::new(),
        }
    }

    /// Name of the format
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared record size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attributes a dump should emit
    pub fn visible_attributes(&self, show_hidden: bool) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(move |attribute| show_hidden || !attribute.hidden)
    }

    /// Append an attribute; names must be unique and the bit range must
    /// fit in one word
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<&mut Self> {
        attribute.check_bits()?;
        if self.find_attribute(&attribute.name).is_some() {
            return Err(Error::schema(format!(
                "Duplicate attribute name (\"{}\") in format \"{}\"",
                attribute.name, self.name
            )));
        }
        self.attributes.push(attribute);
        Ok(self)
    }

    /// Find an attribute by name
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Get an attribute by name
    pub fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.find_attribute(name)
            .ok_or_else(|| Error::UnknownAttribute {
                attribute: name.to_string(),
                format: self.name.clone(),
            })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Format '{}' ({} bytes, {} attributes)",
            self.name,
            self.size,
            self.attributes.len()
        )
    }
}
