//! Word-aligned byte buffer with big-endian field accessors
//!
//! Every record in a WPD archive is stored as a [`Chunk`]. Its length is always
//! a multiple of four bytes, so every field access is a single masked
//! operation on one 32-bit word. Values are stored big-endian on disk and
//! exposed as host values, whatever the host byte order.

use memchr::memchr;
use std::io::{Read, Write};

use crate::{Error, Result};

/// Alignment of every chunk size, in bytes
pub const WORD_SIZE: usize = 4;

/// Round a byte count up to the next word boundary
pub fn align_to_word(size: usize) -> usize {
    size.div_ceil(WORD_SIZE) * WORD_SIZE
}

pub(crate) fn low_bits(length: u32) -> u32 {
    if length >= 32 {
        u32::MAX
    } else {
        (1 << length) - 1
    }
}

fn check_bits(bit_start: u32, bit_length: u32) -> Result<()> {
    if bit_length == 0 || bit_length > 32 || bit_start > 32 - bit_length {
        return Err(Error::unfit(format!(
            "bit range {bit_start}+{bit_length} does not fit in a 32-bit word"
        )));
    }
    Ok(())
}

/// An owned, word-aligned byte buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    /// Create an empty chunk
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a zero-filled chunk, rounding `size` up to a word boundary
    pub fn with_size(size: usize) -> Self {
        Self {
            data: vec![0; align_to_word(size)],
        }
    }

    /// Wrap existing bytes, zero-padding them to a word boundary
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut data = bytes.into();
        data.resize(align_to_word(data.len()), 0);
        Self { data }
    }

    /// Read exactly `size` bytes from a reader into a new chunk
    pub fn read_from<R: Read>(reader: &mut R, size: usize) -> Result<Self> {
        let mut data = vec![0; size];
        reader.read_exact(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    /// Write the whole buffer to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }

    /// Size of the buffer in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the chunk and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Zero every byte without changing the size
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Resize the buffer, rounding up to a word boundary.
    ///
    /// Bytes below `min(old, new)` are kept and growth is zero-filled.
    pub fn resize(&mut self, size: usize) {
        self.data.resize(align_to_word(size), 0);
    }

    fn check(&self, offset: usize, width: usize) -> Result<()> {
        match offset.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::out_of_range(offset, width, self.data.len())),
        }
    }

    fn word(&self, offset: usize) -> Result<[u8; 4]> {
        self.check(offset, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[offset..offset + 4]);
        Ok(word)
    }

    /// Get a single byte
    pub fn byte(&self, offset: usize) -> Result<u8> {
        self.check(offset, 1)?;
        Ok(self.data[offset])
    }

    /// Get the unsigned word at `offset`
    pub fn get_unsigned(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.word(offset)?))
    }

    /// Set the unsigned word at `offset`
    pub fn set_unsigned(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check(offset, 4)?;
        self.data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Get the signed word at `offset`
    pub fn get_signed(&self, offset: usize) -> Result<i32> {
        Ok(i32::from_be_bytes(self.word(offset)?))
    }

    /// Set the signed word at `offset`
    pub fn set_signed(&mut self, offset: usize, value: i32) -> Result<()> {
        self.check(offset, 4)?;
        self.data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Get the float stored at `offset`
    pub fn get_float(&self, offset: usize) -> Result<f32> {
        Ok(f32::from_bits(self.get_unsigned(offset)?))
    }

    /// Set the float stored at `offset`
    pub fn set_float(&mut self, offset: usize, value: f32) -> Result<()> {
        self.set_unsigned(offset, value.to_bits())
    }

    /// Get bits `[bit_start, bit_start + bit_length)` of the word at `offset`
    pub fn get_unsigned_mask(&self, offset: usize, bit_start: u32, bit_length: u32) -> Result<u32> {
        check_bits(bit_start, bit_length)?;
        let word = self.get_unsigned(offset)?;
        Ok((word >> bit_start) & low_bits(bit_length))
    }

    /// Set bits `[bit_start, bit_start + bit_length)` of the word at `offset`.
    ///
    /// Only the low `bit_length` bits of `value` are stored; all other bits of
    /// the word are left untouched.
    pub fn set_unsigned_mask(
        &mut self,
        offset: usize,
        bit_start: u32,
        bit_length: u32,
        value: u32,
    ) -> Result<()> {
        check_bits(bit_start, bit_length)?;
        let mask = low_bits(bit_length) << bit_start;
        let word = self.get_unsigned(offset)?;
        self.set_unsigned(offset, (word & !mask) | ((value << bit_start) & mask))
    }

    /// Get a sign-extended bit-field of the word at `offset`
    pub fn get_signed_mask(&self, offset: usize, bit_start: u32, bit_length: u32) -> Result<i32> {
        check_bits(bit_start, bit_length)?;
        let word = self.get_signed(offset)?;
        Ok((word << (32 - bit_length - bit_start)) >> (32 - bit_length))
    }

    /// Set a signed bit-field of the word at `offset`
    pub fn set_signed_mask(
        &mut self,
        offset: usize,
        bit_start: u32,
        bit_length: u32,
        value: i32,
    ) -> Result<()> {
        self.set_unsigned_mask(offset, bit_start, bit_length, value as u32)
    }

    /// Get a single bit of the word at `offset`
    pub fn get_boolean(&self, offset: usize, bit: u32) -> Result<bool> {
        Ok(self.get_unsigned_mask(offset, bit, 1)? != 0)
    }

    /// Set a single bit of the word at `offset`
    pub fn set_boolean(&mut self, offset: usize, bit: u32, value: bool) -> Result<()> {
        self.set_unsigned_mask(offset, bit, 1, u32::from(value))
    }

    /// Read the nul-terminated string starting at `offset`.
    ///
    /// A string running into the end of the buffer ends there. Bytes that are
    /// not valid UTF-8 are replaced.
    pub fn get_string(&self, offset: usize) -> Result<String> {
        self.check(offset, 1)?;
        let tail = &self.data[offset..];
        let end = memchr(0, tail).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }

    /// Write `string` and its nul terminator at `offset`
    pub fn set_string(&mut self, offset: usize, string: &str) -> Result<()> {
        self.check(offset, 1)?;
        let end = offset + string.len();
        if end >= self.data.len() {
            return Err(Error::unfit(format!(
                "string of {} bytes at offset 0x{offset:X} overruns a buffer of {} bytes",
                string.len(),
                self.data.len()
            )));
        }
        self.data[offset..end].copy_from_slice(string.as_bytes());
        self.data[end] = 0;
        Ok(())
    }

    /// Copy `size` bytes starting at `offset` into a new chunk
    pub fn get_chunk(&self, offset: usize, size: usize) -> Result<Chunk> {
        self.check(offset, size)?;
        Ok(Chunk::from_bytes(&self.data[offset..offset + size]))
    }

    /// Overwrite the bytes at `offset` with the contents of `chunk`
    pub fn set_chunk(&mut self, offset: usize, chunk: &Chunk) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.check(offset, chunk.size())?;
        self.data[offset..offset + chunk.size()].copy_from_slice(&chunk.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_are_word_aligned() {
        assert_eq!(Chunk::with_size(0).size(), 0);
        assert_eq!(Chunk::with_size(1).size(), 4);
        assert_eq!(Chunk::with_size(8).size(), 8);
        assert_eq!(Chunk::from_bytes(vec![1, 2, 3, 4, 5]).as_bytes(), &[1, 2, 3, 4, 5, 0, 0, 0]);

        let mut chunk = Chunk::with_size(8);
        chunk.resize(10);
        assert_eq!(chunk.size(), 12);
        chunk.resize(0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_words_are_big_endian() {
        let mut chunk = Chunk::with_size(8);
        chunk.set_unsigned(4, 0x1234_5678).unwrap();
        assert_eq!(&chunk.as_bytes()[4..], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(chunk.get_unsigned(4).unwrap(), 0x1234_5678);

        chunk.set_signed(0, -2).unwrap();
        assert_eq!(&chunk.as_bytes()[..4], &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(chunk.get_signed(0).unwrap(), -2);

        chunk.set_float(0, 1.0).unwrap();
        assert_eq!(&chunk.as_bytes()[..4], &[0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(chunk.get_float(0).unwrap(), 1.0);
    }

    #[test]
    fn test_word_access_boundary() {
        let chunk = Chunk::with_size(16);
        assert!(chunk.get_unsigned(12).is_ok());
        assert!(matches!(
            chunk.get_unsigned(13),
            Err(Error::OutOfRange {
                offset: 13,
                width: 4,
                size: 16
            })
        ));
        assert!(chunk.get_unsigned(usize::MAX).is_err());
        assert!(chunk.byte(15).is_ok());
        assert!(chunk.byte(16).is_err());
        assert!(Chunk::new().get_unsigned(0).is_err());
    }

    #[test]
    fn test_unsigned_mask_leaves_other_bits() {
        let mut chunk = Chunk::with_size(4);
        chunk.set_unsigned(0, 0xFFFF_FFFF).unwrap();
        chunk.set_unsigned_mask(0, 4, 8, 0).unwrap();
        assert_eq!(chunk.get_unsigned(0).unwrap(), 0xFFFF_F00F);

        chunk.set_unsigned_mask(0, 4, 8, 0x1AB).unwrap();
        assert_eq!(chunk.get_unsigned_mask(0, 4, 8).unwrap(), 0xAB);
        assert_eq!(chunk.get_unsigned(0).unwrap(), 0xFFFF_FABF);

        chunk.set_unsigned_mask(0, 0, 32, 0x0102_0304).unwrap();
        assert_eq!(chunk.get_unsigned_mask(0, 0, 32).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_signed_mask_sign_extends() {
        let mut chunk = Chunk::with_size(4);
        chunk.set_signed_mask(0, 3, 5, -3).unwrap();
        assert_eq!(chunk.get_signed_mask(0, 3, 5).unwrap(), -3);
        assert_eq!(chunk.get_unsigned_mask(0, 3, 5).unwrap(), 0b11101);
        assert_eq!(chunk.get_unsigned(0).unwrap(), 0b11101 << 3);

        chunk.set_signed_mask(0, 3, 5, 15).unwrap();
        assert_eq!(chunk.get_signed_mask(0, 3, 5).unwrap(), 15);

        chunk.set_signed_mask(0, 0, 32, i32::MIN).unwrap();
        assert_eq!(chunk.get_signed_mask(0, 0, 32).unwrap(), i32::MIN);
    }

    #[test]
    fn test_invalid_bit_ranges() {
        let mut chunk = Chunk::with_size(4);
        assert!(chunk.get_unsigned_mask(0, 0, 0).is_err());
        assert!(chunk.get_unsigned_mask(0, 31, 2).is_err());
        assert!(chunk.set_unsigned_mask(0, 32, 1, 1).is_err());
        assert!(chunk.get_boolean(0, 31).is_ok());
        assert!(chunk.get_boolean(0, 32).is_err());
    }

    #[test]
    fn test_boolean_bits() {
        let mut chunk = Chunk::with_size(8);
        chunk.set_boolean(0, 0, true).unwrap();
        assert_eq!(chunk.byte(3).unwrap(), 0x01);
        chunk.set_boolean(0, 31, true).unwrap();
        assert_eq!(chunk.byte(0).unwrap(), 0x80);
        assert!(chunk.get_boolean(0, 0).unwrap());
        chunk.set_boolean(0, 0, false).unwrap();
        assert!(!chunk.get_boolean(0, 0).unwrap());
        assert!(chunk.get_boolean(0, 31).unwrap());
    }

    #[test]
    fn test_strings() {
        let mut chunk = Chunk::with_size(8);
        chunk.set_string(0, "WPD").unwrap();
        assert_eq!(chunk.get_string(0).unwrap(), "WPD");
        assert_eq!(chunk.get_string(1).unwrap(), "PD");

        chunk.set_string(1, "abcdef").unwrap();
        assert_eq!(chunk.get_string(1).unwrap(), "abcdef");
        assert!(matches!(chunk.set_string(1, "abcdefg"), Err(Error::Unfit(_))));
        assert!(matches!(chunk.set_string(8, ""), Err(Error::OutOfRange { .. })));
        assert!(chunk.get_string(8).is_err());
    }

    #[test]
    fn test_unterminated_string_stops_at_end() {
        let chunk = Chunk::from_bytes(b"ABCD".to_vec());
        assert_eq!(chunk.get_string(0).unwrap(), "ABCD");
    }

    #[test]
    fn test_sub_chunks() {
        let mut chunk = Chunk::from_bytes((0u8..16).collect::<Vec<_>>());
        let sub = chunk.get_chunk(4, 6).unwrap();
        assert_eq!(sub.as_bytes(), &[4, 5, 6, 7, 8, 9, 0, 0]);
        assert!(chunk.get_chunk(12, 8).is_err());

        chunk.set_chunk(8, &sub).unwrap();
        assert_eq!(&chunk.as_bytes()[8..16], &[4, 5, 6, 7, 8, 9, 0, 0]);
        assert!(chunk.set_chunk(12, &sub).is_err());
        assert!(chunk.set_chunk(100, &Chunk::new()).is_ok());
    }

    #[test]
    fn test_read_pads_short_payload() {
        let mut cursor = std::io::Cursor::new(vec![9u8, 8, 7, 6, 5, 4]);
        let chunk = Chunk::read_from(&mut cursor, 5).unwrap();
        assert_eq!(chunk.as_bytes(), &[9, 8, 7, 6, 5, 0, 0, 0]);
        assert!(Chunk::read_from(&mut cursor, 4).is_err());
    }
}
