//! On-disk header and directory records of a WPD archive
//!
//! ```text
//! 0x00  magic "WPD\0"
//! 0x04  entry count (u32 BE)
//! 0x08  reserved, zero
//! 0x10  directory: count x 32-byte records
//!         0x00 name, nul-terminated, 16 bytes
//!         0x10 data offset (u32 BE)
//!         0x14 data size (u32 BE)
//!         0x18 reserved, zero
//! ....  entry payloads
//! ```

use binrw::{BinRead, BinWrite};

use crate::{Error, Result};

/// Magic bytes at the start of every archive
pub const WPD_MAGIC: [u8; 4] = *b"WPD\0";

/// Size of the archive header in bytes
pub const HEADER_SIZE: u32 = 16;

/// Size of one directory record in bytes
pub const RECORD_SIZE: u32 = 32;

/// Width of the name field of a directory record
pub const NAME_FIELD_SIZE: usize = 16;

/// Archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct WpdHeader {
    /// Format marker, `"WPD\0"`
    pub magic: [u8; 4],
    /// Number of directory records following the header
    pub entry_count: u32,
    /// Unused
    pub reserved: [u8; 8],
}

impl WpdHeader {
    /// Create a header announcing `entry_count` entries
    pub fn new(entry_count: u32) -> Self {
        Self {
            magic: WPD_MAGIC,
            entry_count,
            reserved: [0; 8],
        }
    }

    /// Check the format marker
    pub fn validate(&self) -> Result<()> {
        if self.magic == WPD_MAGIC {
            Ok(())
        } else {
            Err(Error::BadMagic {
                expected: "WPD".to_string(),
                found: String::from_utf8_lossy(&self.magic)
                    .trim_end_matches('\0')
                    .to_string(),
            })
        }
    }

    /// Offset of the first payload byte
    pub fn data_start(&self) -> u32 {
        HEADER_SIZE + self.entry_count * RECORD_SIZE
    }
}

/// One entry of the archive directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct DirectoryRecord {
    /// Entry name, nul-terminated
    pub name: [u8; NAME_FIELD_SIZE],
    /// Absolute offset of the payload
    pub offset: u32,
    /// Payload size in bytes
    pub size: u32,
    /// Unused
    pub reserved: [u8; 8],
}

impl DirectoryRecord {
    /// Create a record; the name must leave room for its terminator
    pub fn new(name: &str, offset: u32, size: u32) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() >= NAME_FIELD_SIZE {
            return Err(Error::unfit(format!(
                "entry name \"{name}\" is longer than {} bytes",
                NAME_FIELD_SIZE - 1
            )));
        }

        let mut field = [0; NAME_FIELD_SIZE];
        field[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            name: field,
            offset,
            size,
            reserved: [0; 8],
        })
    }

    /// Entry name up to its terminator
    pub fn name(&self) -> String {
        let end = memchr::memchr(0, &self.name).unwrap_or(NAME_FIELD_SIZE);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::{BinReaderExt, BinWriterExt};
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_be(&WpdHeader::new(3)).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(&bytes[..8], b"WPD\0\0\0\0\x03");

        let header: WpdHeader = Cursor::new(bytes).read_be().unwrap();
        assert!(header.validate().is_ok());
        assert_eq!(header.data_start(), 16 + 3 * 32);
    }

    #[test]
    fn test_bad_magic() {
        let header = WpdHeader {
            magic: *b"XYZ\0",
            entry_count: 0,
            reserved: [0; 8],
        };
        assert!(matches!(header.validate(), Err(Error::BadMagic { .. })));
    }

    #[test]
    fn test_directory_record_layout() {
        let record = DirectoryRecord::new("it_sw01", 0x70, 0x20).unwrap();
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_be(&record).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), RECORD_SIZE as usize);
        assert_eq!(&bytes[..8], b"it_sw01\0");
        assert_eq!(&bytes[16..24], &[0, 0, 0, 0x70, 0, 0, 0, 0x20]);

        let parsed: DirectoryRecord = Cursor::new(bytes).read_be().unwrap();
        assert_eq!(parsed.name(), "it_sw01");
    }

    #[test]
    fn test_directory_name_limit() {
        assert!(DirectoryRecord::new("fifteen_bytes__", 0, 0).is_ok());
        assert!(matches!(
            DirectoryRecord::new("sixteen_bytes___", 0, 0),
            Err(Error::Unfit(_))
        ));
    }
}
