//! Text patch scripts
//!
//! A patch script is line oriented:
//!
//! ```text
//! // comment
//! @it_sw01:
//! > price   = 1500
//! > element = Fire
//! > model   = "wea_sw01"
//! ```
//!
//! `@name:` selects (and creates if needed) the entry that following
//! assignments apply to. Each `> attribute = value` line is resolved through
//! the active [`Format`] and only written when the decoded value differs
//! from the stored one, so applying the same script twice is a no-op.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::archive::{STRING_ENTRY, WpdArchive};
use crate::chunk::{Chunk, align_to_word, low_bits};
use crate::enumeration::Enum;
use crate::format::{Attribute, Format};
use crate::registry::SchemaRegistry;
use crate::value::{AttributeFormat, AttributeType, AttributeValue};
use crate::{Error, Result};

/// Longest entry name an `@name:` header accepts
pub const MAX_ENTRY_NAME: usize = 15;

/// One field whose value a patch changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Entry holding the field
    pub entry: String,
    /// Attribute name
    pub attribute: String,
    /// Rendered value before the patch
    pub before: String,
    /// Rendered value after the patch
    pub after: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.before, self.after)
    }
}

/// A problem reported while processing one line or attribute
#[derive(Debug)]
pub struct Diagnostic {
    /// 1-based line number, 0 when not tied to a script line
    pub line: usize,
    /// Active entry, if any
    pub entry: Option<String>,
    /// Attribute involved, if any
    pub attribute: Option<String>,
    /// The underlying error
    pub error: Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}: ", self.line)?;
        }
        match (&self.entry, &self.attribute) {
            (Some(entry), Some(attribute)) => {
                write!(f, "in entry {entry}, attribute {attribute}: ")?;
            }
            (Some(entry), None) => write!(f, "in entry {entry}: ")?,
            _ => {}
        }
        write!(f, "{}", self.error)
    }
}

/// Outcome of applying a patch script
#[derive(Debug, Default)]
pub struct PatchReport {
    /// Fields that changed, in script order
    pub changes: Vec<FieldChange>,
    /// Lines or assignments that were skipped because of an error
    pub diagnostics: Vec<Diagnostic>,
    /// The script was not applied because the archive is newer
    pub skipped: bool,
}

impl PatchReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Whether every line was processed without error
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// A classified script line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment(&'a str),
    Entry(&'a str),
    Assignment { attribute: &'a str, value: &'a str },
    Invalid,
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(comment) = line.strip_prefix("//") {
        return Line::Comment(comment.trim());
    }
    if let Some(header) = line.strip_prefix('@') {
        return match header.strip_suffix(':') {
            Some(name)
                if !name.is_empty() && name.len() <= MAX_ENTRY_NAME && !name.contains(':') =>
            {
                Line::Entry(name)
            }
            _ => Line::Invalid,
        };
    }
    if let Some(assignment) = line.strip_prefix('>') {
        if let Some((attribute, value)) = assignment.split_once('=') {
            let (attribute, value) = (attribute.trim(), value.trim());
            if !attribute.is_empty() && !value.is_empty() {
                return Line::Assignment { attribute, value };
            }
        }
    }
    Line::Invalid
}

/// How a numeric literal was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notation {
    Plain,
    Hex,
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn hex_digits(text: &str) -> Option<&str> {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn decimal_literal(text: &str, signed: bool) -> Option<&str> {
    let number = text.strip_suffix('%').unwrap_or(text);
    let digits = if signed {
        number.strip_prefix('-').unwrap_or(number)
    } else {
        number
    };
    is_digits(digits).then_some(number)
}

fn float_literal(text: &str) -> Option<&str> {
    let number = text.strip_suffix('%').unwrap_or(text);
    let unsigned = number.strip_prefix('-').unwrap_or(number);
    let valid = match unsigned.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => is_digits(unsigned),
    };
    valid.then_some(number)
}

fn string_literal(text: &str) -> Option<&str> {
    text.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.contains('"'))
}

fn overflow(text: &str, attribute: &Attribute) -> Error {
    Error::unfit(format!(
        "{text} does not fit in {} bit(s) of attribute {}",
        attribute.size, attribute.name
    ))
}

fn parse_hex_word(digits: &str, text: &str, attribute: &Attribute) -> Result<u32> {
    u32::from_str_radix(digits, 16).map_err(|_| overflow(text, attribute))
}

/// Parse the text of an assignment into a value of the attribute's type.
///
/// Literals take priority; a bound enumeration is only consulted when the
/// text is not a literal of the attribute's type.
fn parse_value(
    attribute: &Attribute,
    enumeration: Option<&Enum>,
    text: &str,
) -> Result<(AttributeValue, Notation)> {
    attribute.check_bits()?;

    let invalid = || Error::InvalidValue {
        value: text.to_string(),
        expected: attribute.attribute_type,
    };

    let parsed = match attribute.attribute_type {
        AttributeType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                return Ok((AttributeValue::Boolean(true), Notation::Plain));
            } else if text.eq_ignore_ascii_case("false") {
                return Ok((AttributeValue::Boolean(false), Notation::Plain));
            }
            return Err(invalid());
        }
        AttributeType::Unsigned => {
            if let Some(number) = decimal_literal(text, false) {
                let value = number.parse().map_err(|_| overflow(text, attribute))?;
                Some((AttributeValue::Unsigned(value), Notation::Plain))
            } else if let Some(digits) = hex_digits(text) {
                let value = parse_hex_word(digits, text, attribute)?;
                Some((AttributeValue::Unsigned(value), Notation::Hex))
            } else {
                None
            }
        }
        AttributeType::Signed => {
            if let Some(number) = decimal_literal(text, true) {
                let value = number.parse().map_err(|_| overflow(text, attribute))?;
                Some((AttributeValue::Signed(value), Notation::Plain))
            } else if let Some(digits) = hex_digits(text) {
                // raw bit pattern of the field, sign-extended
                let raw = parse_hex_word(digits, text, attribute)?;
                if raw > low_bits(attribute.size) {
                    return Err(overflow(text, attribute));
                }
                let shift = 32 - attribute.size;
                let value = ((raw << shift) as i32) >> shift;
                Some((AttributeValue::Signed(value), Notation::Hex))
            } else {
                None
            }
        }
        AttributeType::Float => {
            if let Some(number) = float_literal(text) {
                let value = number.parse().map_err(|_| invalid())?;
                Some((AttributeValue::Float(value), Notation::Plain))
            } else if let Some(digits) = hex_digits(text) {
                let bits = parse_hex_word(digits, text, attribute)?;
                Some((AttributeValue::Float(f32::from_bits(bits)), Notation::Hex))
            } else {
                None
            }
        }
        AttributeType::String => string_literal(text)
            .map(|inner| (AttributeValue::String(inner.to_string()), Notation::Plain)),
    };

    let (value, notation) = match parsed {
        Some(parsed) => parsed,
        None => match enumeration {
            Some(enumeration) => {
                let value = enumeration.get(text)?.clone();
                if value.attribute_type() != attribute.attribute_type {
                    return Err(Error::TypeMismatch {
                        expected: attribute.attribute_type,
                        found: value.attribute_type(),
                    });
                }
                (value, Notation::Plain)
            }
            None => return Err(invalid()),
        },
    };

    attribute.check_fit(&value)?;
    Ok((value, notation))
}

fn render_change(attribute: &Attribute, value: &AttributeValue, notation: Notation) -> String {
    match notation {
        Notation::Hex => attribute.render_as(value, AttributeFormat::Hexadecimal),
        Notation::Plain => value.to_string(),
    }
}

impl WpdArchive {
    /// Apply the patch script at `path` using the format called `format_name`.
    ///
    /// Nothing happens when the archive was loaded from a file at least as
    /// recent as the script; the report is then marked `skipped`.
    pub fn patch_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        format_name: &str,
        registry: &SchemaRegistry,
    ) -> Result<PatchReport> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::not_found(path.display().to_string()));
        }

        let script_modified = fs::metadata(path)?.modified().ok();
        if let (Some(loaded), Some(script)) = (self.source_modified(), script_modified) {
            if loaded >= script {
                log::debug!("Patch file {} is not newer than the archive", path.display());
                return Ok(PatchReport::skipped());
            }
        }

        let format = registry
            .get_format(format_name)
            .ok_or_else(|| Error::not_found(format!("format {format_name}")))?;
        let text = fs::read_to_string(path)?;

        log::info!("Applying patch file {}", path.display());
        Ok(self.apply_patch(&text, &format, registry))
    }

    /// Apply a patch script held in memory.
    ///
    /// Errors on individual lines are collected in the report and the
    /// remaining lines are still applied.
    pub fn apply_patch(
        &mut self,
        text: &str,
        format: &Format,
        registry: &SchemaRegistry,
    ) -> PatchReport {
        let mut report = PatchReport::default();
        let mut active: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            match classify(raw) {
                Line::Blank => {}
                Line::Comment(comment) => log::debug!("Comment: {comment}"),
                Line::Entry(name) => {
                    log::debug!("Patching entry {name}");
                    self.prepare_entry(name, format);
                    active = Some(name.to_string());
                }
                Line::Assignment { attribute, value } => {
                    let Some(entry) = active.as_deref() else {
                        report.push(Diagnostic {
                            line,
                            entry: None,
                            attribute: Some(attribute.to_string()),
                            error: Error::Syntax {
                                line,
                                text: raw.trim().to_string(),
                            },
                        });
                        continue;
                    };

                    match self.assign(entry, format, registry, attribute, value) {
                        Ok(Some(change)) => {
                            log::info!(
                                "In entry {}, attribute {}: {change}",
                                change.entry,
                                change.attribute
                            );
                            report.changes.push(change);
                        }
                        Ok(None) => {}
                        Err(error) => report.push(Diagnostic {
                            line,
                            entry: Some(entry.to_string()),
                            attribute: Some(attribute.to_string()),
                            error,
                        }),
                    }
                }
                Line::Invalid => report.push(Diagnostic {
                    line,
                    entry: active.clone(),
                    attribute: None,
                    error: Error::Syntax {
                        line,
                        text: raw.trim().to_string(),
                    },
                }),
            }
        }

        report
    }

    /// Create the entry if needed and bring it to the format's record size
    fn prepare_entry(&mut self, name: &str, format: &Format) {
        let size = align_to_word(format.size() as usize);
        let created = !self.contains_entry(name);
        let record = self.entry_mut(name);
        let resized = record.size() != size;
        if resized {
            record.resize(size);
        }
        if created || resized {
            self.mark_modified();
        }
    }

    fn assign(
        &mut self,
        entry: &str,
        format: &Format,
        registry: &SchemaRegistry,
        attribute_name: &str,
        text: &str,
    ) -> Result<Option<FieldChange>> {
        let attribute = format.attribute(attribute_name)?;
        let enumeration = attribute
            .enum_name
            .as_deref()
            .and_then(|name| registry.get_enum(name));
        let (value, notation) = parse_value(attribute, enumeration.as_deref(), text)?;

        let empty = Chunk::new();
        let strings = self.entry(STRING_ENTRY).unwrap_or(&empty);
        let current = match attribute.decode(self.entry(entry)?, strings) {
            Ok(current) => Some(current),
            // a dangling string reference is simply replaced
            Err(Error::OutOfRange { .. }) if attribute.attribute_type == AttributeType::String => {
                None
            }
            Err(e) => return Err(e),
        };

        if current.as_ref().is_some_and(|current| current.same_as(&value)) {
            return Ok(None);
        }

        let stored = match &value {
            AttributeValue::String(s) => AttributeValue::Unsigned(self.string_reference(s)?),
            other => other.clone(),
        };
        attribute.encode(self.entry_mut(entry), &stored)?;
        self.mark_modified();

        Ok(Some(FieldChange {
            entry: entry.to_string(),
            attribute: attribute.name.clone(),
            before: current.map_or_else(
                || "(none)".to_string(),
                |current| render_change(attribute, &current, notation),
            ),
            after: render_change(attribute, &value, notation),
        }))
    }
}
