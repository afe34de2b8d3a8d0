//! Rendering archive entries as patch text
//!
//! The output uses the same notation patch scripts are written in, so a
//! dump can be edited and applied back.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::archive::{STRING_ENTRY, STRING_TYPE_ENTRY, WpdArchive, is_reserved};
use crate::chunk::{Chunk, WORD_SIZE};
use crate::filter::EntryFilter;
use crate::format::{Attribute, Format};
use crate::patch::Diagnostic;
use crate::registry::SchemaRegistry;
use crate::{Error, Result};

/// Type tag of a float word in the string type list
pub const TAG_FLOAT: u32 = 1;

/// Type tag of a string reference in the string type list
pub const TAG_STRING: u32 = 2;

/// Outcome of a dump
#[derive(Debug, Default)]
pub struct ConvertReport {
    /// Number of entries written
    pub entries: usize,
    /// Attributes that could not be rendered as requested
    pub diagnostics: Vec<Diagnostic>,
}

impl ConvertReport {
    fn push(&mut self, entry: &str, attribute: &str, error: Error) {
        let diagnostic = Diagnostic {
            line: 0,
            entry: Some(entry.to_string()),
            attribute: Some(attribute.to_string()),
            error,
        };
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    log::info!("Building patch file {}", path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

impl WpdArchive {
    fn selected<'a>(&'a self, filter: &'a EntryFilter) -> impl Iterator<Item = (&'a str, &'a Chunk)> {
        self.entries()
            .filter(move |(name, _)| !is_reserved(name) && filter.matches(name))
    }

    fn reserved_or_empty(&self, name: &str) -> Chunk {
        self.entry(name).cloned().unwrap_or_default()
    }

    /// Dump entries word by word, without a format.
    ///
    /// Each word is rendered according to its tag in the string type list:
    /// floats, string references, or raw hexadecimal for anything else.
    /// Floats keep two decimals only.
    pub fn convert_generic<W: Write>(
        &self,
        writer: &mut W,
        filter: &EntryFilter,
    ) -> Result<ConvertReport> {
        let types = self.reserved_or_empty(STRING_TYPE_ENTRY);
        let strings = self.reserved_or_empty(STRING_ENTRY);
        let mut report = ConvertReport::default();

        for (name, record) in self.selected(filter) {
            log::debug!("Converting entry {name}");
            report.entries += 1;
            writeln!(writer)?;
            writeln!(writer, "@{name}:")?;

            for offset in (0..record.size()).step_by(WORD_SIZE) {
                let label = Attribute::auto_name(offset as u32, 0, 32);
                let word = record.get_unsigned(offset)?;
                let tag = types.get_unsigned(offset).unwrap_or(0);
                let rendered = match tag {
                    TAG_FLOAT => format!("{:.2}", f32::from_bits(word)),
                    TAG_STRING => match strings.get_string(word as usize) {
                        Ok(s) => format!("\"{s}\""),
                        Err(e) => {
                            report.push(name, &label, e);
                            format!("0x{word:08X}")
                        }
                    },
                    _ => format!("0x{word:08X}"),
                };
                writeln!(writer, "> {label} = {rendered}")?;
            }
        }

        log::info!("{} entries converted", report.entries);
        Ok(report)
    }

    /// Dump entries through `format`.
    ///
    /// Hidden attributes are skipped unless `show_hidden` is set. Values
    /// with a bound enumeration are written by name when the enumeration
    /// declares them; strict enumerations report values they lack.
    ///
    /// Decimal floats are written with two decimals, so patching a dump back
    /// rounds any float that needs more precision. Declare the attribute
    /// `hexa` to dump and restore its exact bits.
    pub fn convert_with_format<W: Write>(
        &self,
        writer: &mut W,
        format: &Format,
        registry: &SchemaRegistry,
        filter: &EntryFilter,
        show_hidden: bool,
    ) -> Result<ConvertReport> {
        let strings = self.reserved_or_empty(STRING_ENTRY);
        let mut report = ConvertReport::default();

        for (name, record) in self.selected(filter) {
            log::debug!("Converting entry {name}");
            report.entries += 1;
            writeln!(writer)?;
            writeln!(writer, "@{name}:")?;

            for attribute in format.visible_attributes(show_hidden) {
                let value = match attribute.decode(record, &strings) {
                    Ok(value) => value,
                    Err(e) => {
                        report.push(name, &attribute.name, e);
                        continue;
                    }
                };

                let enumeration = attribute
                    .enum_name
                    .as_deref()
                    .and_then(|enum_name| registry.get_enum(enum_name));
                let symbol = match &enumeration {
                    Some(enumeration) => match enumeration.get_name(&value) {
                        Ok(symbol) => Some(symbol.to_string()),
                        Err(e) => {
                            if enumeration.is_strict() {
                                report.push(name, &attribute.name, e);
                            }
                            None
                        }
                    },
                    None => None,
                };

                let rendered = symbol.unwrap_or_else(|| attribute.render(&value));
                writeln!(writer, "> {} = {rendered}", attribute.name)?;
            }
        }

        log::info!("{} entries converted", report.entries);
        Ok(report)
    }

    /// Dump entries without a format into a file, creating its directory
    pub fn convert_generic_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        filter: &EntryFilter,
    ) -> Result<ConvertReport> {
        let mut writer = create_output(path.as_ref())?;
        let report = self.convert_generic(&mut writer, filter)?;
        writer.flush()?;
        Ok(report)
    }

    /// Dump entries through `format` into a file, creating its directory
    pub fn convert_with_format_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: &Format,
        registry: &SchemaRegistry,
        filter: &EntryFilter,
        show_hidden: bool,
    ) -> Result<ConvertReport> {
        let mut writer = create_output(path.as_ref())?;
        let report =
            self.convert_with_format(&mut writer, format, registry, filter, show_hidden)?;
        writer.flush()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_loader::MemorySource;
    use crate::value::{AttributeFormat, AttributeType};
    use pretty_assertions::assert_eq;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(
            MemorySource::new()
                .with_enum_yaml(
                    "Element",
                    "type: Unsigned\nstrict: true\noptions:\n  - { name: Fire, value: 1 }\n",
                )
                .unwrap(),
        )
    }

    fn dump_generic(archive: &WpdArchive, filter: &str) -> (String, ConvertReport) {
        let mut out = Vec::new();
        let report = archive
            .convert_generic(&mut out, &EntryFilter::new(filter))
            .unwrap();
        (String::from_utf8(out).unwrap(), report)
    }

    #[test]
    fn test_generic_uses_type_tags() {
        let mut archive = WpdArchive::new();
        let reference = archive.string_reference("Hero").unwrap();

        let mut record = Chunk::with_size(12);
        record.set_float(0, 1.5).unwrap();
        record.set_unsigned(4, reference).unwrap();
        record.set_unsigned(8, 0xDEAD).unwrap();
        archive.insert_entry("it_01", record);

        let mut types = Chunk::with_size(8);
        types.set_unsigned(0, TAG_FLOAT).unwrap();
        types.set_unsigned(4, TAG_STRING).unwrap();
        archive.insert_entry(STRING_TYPE_ENTRY, types);

        let (text, report) = dump_generic(&archive, "*");
        assert_eq!(report.entries, 1);
        assert_eq!(
            text,
            "\n@it_01:\n> [0x0000|00|32] = 1.50\n> [0x0004|00|32] = \"Hero\"\n> [0x0008|00|32] = 0x0000DEAD\n"
        );
    }

    #[test]
    fn test_generic_filter_and_reserved_entries() {
        let mut archive = WpdArchive::new();
        archive.insert_entry("it_01", Chunk::with_size(4));
        archive.insert_entry("ac_01", Chunk::with_size(4));
        archive.string_reference("Hero").unwrap();

        let (text, report) = dump_generic(&archive, "it_*");
        assert_eq!(report.entries, 1);
        assert_eq!(text, "\n@it_01:\n> [0x0000|00|32] = 0x00000000\n");

        let (_, report) = dump_generic(&archive, "*");
        assert_eq!(report.entries, 2);
    }

    #[test]
    fn test_format_rendering() {
        let registry = registry();
        let mut format = Format::new("spell", 8);
        for attribute in [
            Attribute::new("flag", AttributeType::Boolean, 0).with_bits(31, 1),
            Attribute::new("element", AttributeType::Unsigned, 0)
                .with_bits(0, 8)
                .with_enum("Element"),
            Attribute::new("cost", AttributeType::Unsigned, 0)
                .with_bits(8, 12)
                .with_format(AttributeFormat::Hexadecimal),
            Attribute::new("unk", AttributeType::Unsigned, 4).hidden(),
        ] {
            format.add_attribute(attribute).unwrap();
        }

        let mut archive = WpdArchive::new();
        let mut record = Chunk::with_size(8);
        record.set_unsigned(0, 0x8000_AB01).unwrap();
        archive.insert_entry("sp_01", record);
        let mut record = Chunk::with_size(8);
        record.set_unsigned(0, 7).unwrap();
        archive.insert_entry("sp_02", record);

        let mut out = Vec::new();
        let report = archive
            .convert_with_format(&mut out, &format, &registry, &EntryFilter::all(), false)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n@sp_01:\n> flag = true\n> element = Fire\n> cost = 0x0AB\n\
             \n@sp_02:\n> flag = false\n> element = 7\n> cost = 0x000\n"
        );
        // strict enumeration reports the value it does not declare
        assert_eq!(report.diagnostics.len(), 1);
        assert!(matches!(report.diagnostics[0].error, Error::UnknownValue { .. }));

        let mut out = Vec::new();
        archive
            .convert_with_format(&mut out, &format, &registry, &EntryFilter::new("sp_01"), true)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("> unk = 0\n"));
    }

    #[test]
    fn test_lenient_enum_miss_falls_back_to_value() {
        let registry = SchemaRegistry::new(
            MemorySource::new()
                .with_enum_yaml(
                    "Category",
                    "type: Unsigned\noptions:\n  - { name: Weapon, value: 1 }\n",
                )
                .unwrap(),
        );
        let mut format = Format::new("item", 4);
        format
            .add_attribute(
                Attribute::new("category", AttributeType::Unsigned, 0)
                    .with_bits(0, 8)
                    .with_enum("Category"),
            )
            .unwrap();

        let mut archive = WpdArchive::new();
        let mut record = Chunk::with_size(4);
        record.set_unsigned(0, 5).unwrap();
        archive.insert_entry("it_01", record);
        archive.insert_entry("it_02", Chunk::from_bytes(vec![0, 0, 0, 1]));

        let mut out = Vec::new();
        let report = archive
            .convert_with_format(&mut out, &format, &registry, &EntryFilter::all(), false)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n@it_01:\n> category = 5\n\n@it_02:\n> category = Weapon\n"
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_short_record_reports_and_continues() {
        let registry = registry();
        let mut format = Format::new("pair", 8);
        format
            .add_attribute(Attribute::new("first", AttributeType::Unsigned, 0))
            .unwrap();
        format
            .add_attribute(Attribute::new("second", AttributeType::Unsigned, 4))
            .unwrap();

        let mut archive = WpdArchive::new();
        archive.insert_entry("short", Chunk::with_size(4));

        let mut out = Vec::new();
        let report = archive
            .convert_with_format(&mut out, &format, &registry, &EntryFilter::all(), false)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n@short:\n> first = 0\n");
        assert!(matches!(report.diagnostics[0].error, Error::OutOfRange { .. }));
    }

    #[test]
    fn test_to_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dump.txt");

        let mut archive = WpdArchive::new();
        archive.insert_entry("it_01", Chunk::with_size(4));
        let report = archive
            .convert_generic_to_file(&path, &EntryFilter::all())
            .unwrap();
        assert_eq!(report.entries, 1);
        assert!(std::fs::read_to_string(&path).unwrap().contains("@it_01:"));
    }
}
