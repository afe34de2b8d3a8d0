//! Schema loading functionality
//!
//! Enum and format descriptors are YAML documents. A [`SchemaSource`]
//! retrieves the raw definitions by name; the conversion methods turn them
//! into [`Enum`] and [`Format`] values, warning about and skipping anything
//! malformed rather than rejecting the whole document.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::enumeration::Enum;
use crate::format::{Attribute, Format};
use crate::value::{AttributeFormat, AttributeType, AttributeValue};
use crate::{Error, Result};

/// A YAML scalar that may be written as a number or as text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
    /// Any other text
    Text(String),
}

impl Scalar {
    /// Textual form of the scalar
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

fn parse_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

fn parse_unsigned(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.starts_with("0x") || text.starts_with("0X") {
        parse_hex(text)
    } else {
        text.parse().ok()
    }
}

/// Enumeration definition for YAML files
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnumDefinition {
    /// Scalar type name of the values
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    /// Whether dumps report values missing from the table
    #[serde(default)]
    pub strict: bool,
    /// `hexa` when unsigned option values are written in hexadecimal
    #[serde(default)]
    pub format: Option<String>,
    /// Parent enumeration whose table is inherited
    #[serde(default)]
    pub extends: Option<String>,
    /// Declared values
    #[serde(default)]
    pub options: Vec<EnumOptionDefinition>,
}

/// One named value of an enumeration definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnumOptionDefinition {
    /// Symbolic name
    #[serde(default)]
    pub name: Option<String>,
    /// Value bound to the name
    #[serde(default)]
    pub value: Option<Scalar>,
}

impl EnumDefinition {
    /// Load an enumeration definition from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml_ng::from_reader(reader)?)
    }

    /// Load an enumeration definition from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Declared scalar type, defaulting to `Unsigned`
    pub fn declared_type(&self, name: &str) -> AttributeType {
        match self.value_type.as_deref() {
            None => {
                log::warn!("Enumeration {name}: missing \"type\" attribute");
                AttributeType::Unsigned
            }
            Some(text) => match text.parse::<AttributeType>() {
                Ok(AttributeType::Boolean) | Err(_) => {
                    log::warn!("Enumeration {name}: unexpected \"type\" attribute value (\"{text}\")");
                    AttributeType::Unsigned
                }
                Ok(ty) => ty,
            },
        }
    }

    /// Convert the definition to an [`Enum`], inheriting from `parent` when
    /// the definition extends one
    pub fn to_enum(&self, name: &str, parent: Option<&Enum>) -> Enum {
        let value_type = self.declared_type(name);
        let mut enumeration = Enum::new(name, value_type).with_strict(self.strict);
        let hexa = self.format.as_deref() == Some("hexa");

        if let Some(parent) = parent {
            if !enumeration.inherit(parent) {
                log::warn!(
                    "Enumerations {name} and {} do not have the same type",
                    parent.name()
                );
            }
        }

        for option in &self.options {
            let Some(option_name) = &option.name else {
                log::warn!("Enumeration {name}: missing option \"name\" attribute");
                continue;
            };
            let Some(raw) = &option.value else {
                log::warn!("Enumeration {name}: missing option \"value\" attribute");
                continue;
            };

            let text = raw.as_text();
            let value = match value_type {
                AttributeType::Unsigned if hexa => parse_hex(&text).map(AttributeValue::Unsigned),
                AttributeType::Unsigned => parse_unsigned(&text).map(AttributeValue::Unsigned),
                AttributeType::Signed => text.trim().parse().ok().map(AttributeValue::Signed),
                AttributeType::Float => text.trim().parse().ok().map(AttributeValue::Float),
                AttributeType::String | AttributeType::Boolean => {
                    Some(AttributeValue::String(text.clone()))
                }
            };

            match value {
                Some(value) => {
                    if let Err(e) = enumeration.insert(option_name.as_str(), value) {
                        log::warn!("Enumeration {name}: {e}");
                    }
                }
                None => log::warn!(
                    "Enumeration {name}: unexpected {} value (\"{text}\")",
                    value_type.name().to_lowercase()
                ),
            }
        }

        enumeration
    }
}

/// Format definition for YAML files
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FormatDefinition {
    /// Record size in bytes
    #[serde(default)]
    pub size: Option<u32>,
    /// Attribute definitions in declaration order
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

/// Attribute definition for YAML files
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AttributeDefinition {
    /// Attribute name; synthesized and hidden when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Scalar type name
    #[serde(rename = "type", default)]
    pub attribute_type: Option<String>,
    /// Byte offset; text is read as hexadecimal
    #[serde(default)]
    pub offset: Option<Scalar>,
    /// First bit inside the word
    #[serde(default)]
    pub bit: Option<u32>,
    /// Bit length
    #[serde(default)]
    pub size: Option<u32>,
    /// Display format name
    #[serde(default)]
    pub format: Option<String>,
    /// Bound enumeration name
    #[serde(rename = "enum", default)]
    pub enum_name: Option<String>,
    /// Hide the attribute from dumps
    #[serde(default)]
    pub hide: bool,
}

impl AttributeDefinition {
    fn offset(&self) -> Option<u32> {
        match self.offset.as_ref()? {
            Scalar::Integer(i) => u32::try_from(*i).ok(),
            other => parse_hex(&other.as_text()),
        }
    }

    /// Build the attribute described by this definition. Returns `None` after
    /// logging a warning when the definition cannot be used.
    fn to_attribute<F>(&self, format_name: &str, resolve_enum: &mut F) -> Option<Attribute>
    where
        F: FnMut(&str) -> Option<Arc<Enum>>,
    {
        let Some(type_name) = self.attribute_type.as_deref() else {
            log::warn!("Format {format_name}: missing data \"type\" attribute");
            return None;
        };
        let attribute_type = match type_name.parse::<AttributeType>() {
            Ok(ty) => ty,
            Err(_) => {
                log::warn!(
                    "Format {format_name}: unexpected \"type\" attribute value (\"{type_name}\")"
                );
                return None;
            }
        };

        let Some(mut offset) = self.offset() else {
            match &self.offset {
                Some(raw) => log::warn!(
                    "Format {format_name}: unexpected \"offset\" attribute value (\"{}\")",
                    raw.as_text()
                ),
                None => log::warn!("Format {format_name}: missing data \"offset\" attribute"),
            }
            return None;
        };

        let (mut bit, mut size) = (0, 32);
        match attribute_type {
            AttributeType::Boolean | AttributeType::Unsigned | AttributeType::Signed => {
                match self.bit {
                    Some(b) => bit = b,
                    None if attribute_type == AttributeType::Boolean => {
                        log::warn!("Format {format_name}: missing data \"bit\" attribute");
                        return None;
                    }
                    None => {}
                }
                offset += bit / 32;
                bit %= 32;
            }
            AttributeType::Float | AttributeType::String => {}
        }

        match attribute_type {
            AttributeType::Unsigned | AttributeType::Signed => {
                if let Some(s) = self.size {
                    if s == 0 {
                        log::warn!("Format {format_name}: unexpected \"size\" attribute value (0)");
                        return None;
                    }
                    size = s;
                }
                if size > 32 - bit {
                    log::warn!(
                        "Format {format_name}: unexpected \"size\" attribute value ({size})"
                    );
                    size = 32 - bit;
                }
            }
            AttributeType::Boolean => size = 1,
            AttributeType::Float | AttributeType::String => {}
        }

        let mut display = AttributeFormat::Decimal;
        if matches!(
            attribute_type,
            AttributeType::Unsigned | AttributeType::Signed | AttributeType::Float
        ) {
            if let Some(text) = self.format.as_deref() {
                match text.parse() {
                    Ok(parsed) => display = parsed,
                    Err(_) => log::warn!(
                        "Format {format_name}: unexpected \"format\" attribute value (\"{text}\")"
                    ),
                }
            }
        }

        let (name, auto_named) = match &self.name {
            Some(name) => (name.clone(), false),
            None => (Attribute::auto_name(offset, bit, size), true),
        };

        let mut attribute = Attribute {
            name,
            attribute_type,
            format: display,
            enum_name: None,
            offset,
            bit,
            size,
            hidden: auto_named || self.hide,
        };

        if attribute_type != AttributeType::Boolean {
            if let Some(enum_name) = &self.enum_name {
                if let Some(enumeration) = resolve_enum(enum_name) {
                    if enumeration.value_type() == attribute_type {
                        attribute.enum_name = Some(enum_name.clone());
                    } else {
                        log::warn!(
                            "Format {format_name}: data type of {} does not match with enumeration {enum_name}",
                            attribute.name
                        );
                    }
                }
            }
        }

        Some(attribute)
    }
}

impl FormatDefinition {
    /// Load a format definition from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml_ng::from_reader(reader)?)
    }

    /// Load a format definition from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Convert the definition to a [`Format`].
    ///
    /// `resolve_enum` is consulted for every enum binding; bindings that do
    /// not resolve or whose type differs from the attribute are dropped.
    pub fn to_format<F>(&self, name: &str, mut resolve_enum: F) -> Format
    where
        F: FnMut(&str) -> Option<Arc<Enum>>,
    {
        let size = self.size.unwrap_or_else(|| {
            log::warn!("Format {name}: missing \"size\" attribute");
            0
        });
        let mut format = Format::new(name, size);

        for definition in &self.attributes {
            let Some(attribute) = definition.to_attribute(name, &mut resolve_enum) else {
                continue;
            };
            if let Err(e) = format.add_attribute(attribute) {
                log::warn!("{e}");
            }
        }

        format
    }
}

/// Where enum and format definitions come from
pub trait SchemaSource: Send + Sync {
    /// Retrieve the enumeration definition called `name`
    fn enum_definition(&self, name: &str) -> Result<EnumDefinition>;

    /// Retrieve the format definition called `name`
    fn format_definition(&self, name: &str) -> Result<FormatDefinition>;
}

/// Reads definitions from `<root>/enum/<name>.yaml` and `<root>/fmt/<name>.yaml`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the schema documents
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, kind: &str, name: &str) -> Result<PathBuf> {
        let path = self.root.join(kind).join(format!("{name}.yaml"));
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::not_found(path.display().to_string()))
        }
    }
}

impl SchemaSource for DirectorySource {
    fn enum_definition(&self, name: &str) -> Result<EnumDefinition> {
        EnumDefinition::from_yaml(self.document_path("enum", name)?)
    }

    fn format_definition(&self, name: &str) -> Result<FormatDefinition> {
        FormatDefinition::from_yaml(self.document_path("fmt", name)?)
    }
}

/// Holds definitions in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    enums: HashMap<String, EnumDefinition>,
    formats: HashMap<String, FormatDefinition>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enumeration definition
    pub fn with_enum(mut self, name: impl Into<String>, definition: EnumDefinition) -> Self {
        self.enums.insert(name.into(), definition);
        self
    }

    /// Add a format definition
    pub fn with_format(mut self, name: impl Into<String>, definition: FormatDefinition) -> Self {
        self.formats.insert(name.into(), definition);
        self
    }

    /// Parse and add an enumeration definition written in YAML
    pub fn with_enum_yaml(self, name: impl Into<String>, yaml: &str) -> Result<Self> {
        Ok(self.with_enum(name, EnumDefinition::from_yaml_str(yaml)?))
    }

    /// Parse and add a format definition written in YAML
    pub fn with_format_yaml(self, name: impl Into<String>, yaml: &str) -> Result<Self> {
        Ok(self.with_format(name, FormatDefinition::from_yaml_str(yaml)?))
    }
}

impl SchemaSource for MemorySource {
    fn enum_definition(&self, name: &str) -> Result<EnumDefinition> {
        self.enums
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("enumeration {name}")))
    }

    fn format_definition(&self, name: &str) -> Result<FormatDefinition> {
        self.formats
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("format {name}")))
    }
}
