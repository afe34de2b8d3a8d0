//! WPD archive container
//!
//! An archive is a set of named records plus two reserved entries:
//! [`STRING_ENTRY`] holds the interned, nul-terminated strings that record
//! fields reference by offset, and [`STRING_TYPE_ENTRY`] tags record words
//! for dumps without a format.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

use binrw::{BinReaderExt, BinWriterExt};
use memchr::memmem;

use crate::chunk::Chunk;
use crate::header::{DirectoryRecord, WpdHeader};
use crate::{Error, Result};

/// Entry holding the interned string table
pub const STRING_ENTRY: &str = "!!string";

/// Entry holding per-word type tags used by generic dumps
pub const STRING_TYPE_ENTRY: &str = "!!strtypelist";

/// First character of reserved entry names
pub const RESERVED_PREFIX: char = '!';

/// Check whether `name` is a reserved entry
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// An in-memory WPD archive
#[derive(Debug, Clone, Default)]
pub struct WpdArchive {
    entries: BTreeMap<String, Chunk>,
    modified: bool,
    source_modified: Option<SystemTime>,
}

impl WpdArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an archive from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading WPD file {}", path.display());

        if !path.is_file() {
            return Err(Error::not_found(path.display().to_string()));
        }

        let file = File::open(path)?;
        let modified = file.metadata()?.modified().ok();
        let mut archive = Self::read_from(&mut BufReader::new(file))?;
        archive.source_modified = modified;
        Ok(archive)
    }

    /// Read an archive from any seekable reader
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let header: WpdHeader = reader.read_be()?;
        header.validate()?;
        log::debug!("{} entries found", header.entry_count);

        let mut records = Vec::with_capacity(header.entry_count.min(4096) as usize);
        for _ in 0..header.entry_count {
            let record: DirectoryRecord = reader.read_be()?;
            records.push(record);
        }

        let mut entries = BTreeMap::new();
        for record in &records {
            reader.seek(SeekFrom::Start(u64::from(record.offset)))?;
            let chunk = Chunk::read_from(reader, record.size as usize)?;
            entries.insert(record.name(), chunk);
        }

        Ok(Self {
            entries,
            modified: false,
            source_modified: None,
        })
    }

    /// Write the archive to disk, creating missing parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Building WPD file {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the archive: header, directory in key order, then payloads
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| Error::unfit(format!("{} entries", self.entries.len())))?;
        let header = WpdHeader::new(count);

        let mut directory = Cursor::new(Vec::new());
        directory.write_be(&header)?;

        let mut data_offset = header.data_start();
        for (name, chunk) in &self.entries {
            let size = u32::try_from(chunk.size())
                .map_err(|_| Error::unfit(format!("entry {name} of {} bytes", chunk.size())))?;
            directory.write_be(&DirectoryRecord::new(name, data_offset, size)?)?;
            data_offset = data_offset
                .checked_add(size)
                .ok_or_else(|| Error::unfit("archive larger than 4 GiB"))?;
        }

        writer.write_all(directory.get_ref())?;
        for chunk in self.entries.values() {
            chunk.write_to(writer)?;
        }

        log::debug!("{count} entries saved");
        Ok(())
    }

    /// Get an existing entry
    pub fn entry(&self, name: &str) -> Result<&Chunk> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::UnknownEntry(name.to_string()))
    }

    /// Get an entry for writing, creating an empty one when absent
    pub fn entry_mut(&mut self, name: &str) -> &mut Chunk {
        self.entries.entry(name.to_string()).or_default()
    }

    /// Check whether an entry exists
    pub fn contains_entry(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace an entry, returning the previous payload
    pub fn insert_entry(&mut self, name: impl Into<String>, chunk: Chunk) -> Option<Chunk> {
        self.modified = true;
        self.entries.insert(name.into(), chunk)
    }

    /// Remove an entry
    pub fn remove_entry(&mut self, name: &str) -> Option<Chunk> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Iterate over entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Chunk)> {
        self.entries.iter().map(|(name, chunk)| (name.as_str(), chunk))
    }

    /// Number of entries, reserved ones included
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Offset of `string` in the string table, interning it when absent.
    ///
    /// An existing occurrence is reused when its bytes and terminator
    /// appear anywhere in the table, so a string may share the tail of a
    /// longer one.
    pub fn string_reference(&mut self, string: &str) -> Result<u32> {
        if string.contains('\0') {
            return Err(Error::unfit(format!(
                "string \"{}\" contains a nul byte",
                string.escape_debug()
            )));
        }

        let mut needle = Vec::with_capacity(string.len() + 1);
        needle.extend_from_slice(string.as_bytes());
        needle.push(0);

        let strings = self.entries.entry(STRING_ENTRY.to_string()).or_default();
        if let Some(found) = memmem::find(strings.as_bytes(), &needle) {
            return u32::try_from(found).map_err(|_| Error::unfit("string table too large"));
        }

        let offset = strings.size();
        let reference =
            u32::try_from(offset).map_err(|_| Error::unfit("string table too large"))?;
        strings.resize(offset + needle.len());
        strings.set_string(offset, string)?;
        self.modified = true;
        log::debug!("Interned \"{string}\" at 0x{reference:X}");
        Ok(reference)
    }

    /// Read the interned string at `offset`
    pub fn string_at(&self, offset: u32) -> Result<String> {
        self.entry(STRING_ENTRY)?.get_string(offset as usize)
    }

    /// Whether the archive changed since it was loaded
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Flag the archive as changed
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Last write time of the file the archive was loaded from
    pub fn source_modified(&self) -> Option<SystemTime> {
        self.source_modified
    }
}
