//! A checked reader over in-memory bytes.

use crate::{Error, Result};

/// A reader for the little-endian structures of the Zoner formats.
///
/// The reader borrows the underlying data and keeps a byte offset into it.
/// All reads are bounds-checked and fail with [`Error::EndOfStream`] instead
/// of reading past the end.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a new reader at the start of the data.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the total length of the underlying data.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the current byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` if the reader has reached the end of the data.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Moves the reader to the given absolute offset.
    #[inline]
    pub fn jump(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::SeekFailed);
        }
        self.offset = offset;

        Ok(())
    }

    /// Moves the reader by the given signed amount.
    #[inline]
    pub fn jump_rel(&mut self, delta: i64) -> Result<()> {
        let target = self.offset as i64 + delta;
        if target < 0 {
            return Err(Error::SeekFailed);
        }

        self.jump(target as usize)
    }

    /// Skips over the given number of bytes.
    #[inline]
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Reads the given number of bytes and advances the offset.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let v = self
            .data
            .get(self.offset..self.offset.checked_add(len).ok_or(Error::EndOfStream)?)
            .ok_or(Error::EndOfStream)?;
        self.offset += len;

        Ok(v)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.data.get(self.offset).copied().ok_or(Error::EndOfStream)?;
        self.offset += 1;

        Ok(b)
    }

    /// Reads a u16 integer (little-endian).
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;

        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a u16 integer (big-endian).
    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;

        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Reads a u32 integer (little-endian).
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;

        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a u32 integer (big-endian).
    #[inline]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;

        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a u64 integer (little-endian).
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;

        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a u64 integer (big-endian).
    #[inline]
    pub fn read_u64_be(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;

        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads an i32 integer (little-endian).
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|v| v as i32)
    }

    /// Reads an IEEE-754 f32 as the raw bits of a little-endian u32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// Reads an IEEE-754 f32 as the raw bits of a big-endian u32.
    #[inline]
    pub fn read_f32_be(&mut self) -> Result<f32> {
        self.read_u32_be().map(f32::from_bits)
    }
}
