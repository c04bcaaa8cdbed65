//! Little-endian primitive codec.
//!
//! Fixed-width reads go through zerocopy's byte-order wrappers; writes use
//! `to_le_bytes`. String reads take an explicit length supplied by the
//! caller because the formats served here never null-terminate. A short
//! read is always surfaced as [`RecordError::UnexpectedEndOfStream`],
//! never silently zero-filled: missing bytes mean a corrupt or truncated
//! container.

use crate::error::{RecordError, Result};
use zerocopy::{F64, FromBytes, I16, I32, LE, U16, U32};

#[inline]
fn short_read(offset: usize, needed: usize, len: usize) -> RecordError {
    RecordError::UnexpectedEndOfStream {
        offset,
        needed,
        remaining: len.saturating_sub(offset),
    }
}

/// Read a little-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(short_read(offset, 2, data.len()));
    }
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| short_read(offset, 2, data.len()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    if offset + 2 > data.len() {
        return Err(short_read(offset, 2, data.len()));
    }
    I16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| short_read(offset, 2, data.len()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(short_read(offset, 4, data.len()));
    }
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| short_read(offset, 4, data.len()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    if offset + 4 > data.len() {
        return Err(short_read(offset, 4, data.len()));
    }
    I32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| short_read(offset, 4, data.len()))
}

/// Read a little-endian f64 from a byte slice at the given offset.
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> Result<f64> {
    if offset + 8 > data.len() {
        return Err(short_read(offset, 8, data.len()));
    }
    F64::<LE>::read_from_bytes(&data[offset..offset + 8])
        .map(|v| v.get())
        .map_err(|_| short_read(offset, 8, data.len()))
}

/// Cursor over a byte slice with little-endian reads.
///
/// No state beyond the cursor position; every read either consumes exactly
/// the requested bytes or fails without advancing.
#[derive(Debug, Clone)]
pub struct LeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LeReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes remaining after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True if the cursor has reached the end of the slice.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(short_read(self.pos, 1, self.data.len()));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let v = read_u16_le(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    /// Read a little-endian i16.
    pub fn read_i16(&mut self) -> Result<i16> {
        let v = read_i16_le(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        let v = read_u32_le(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    /// Read a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        let v = read_i32_le(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    /// Read a little-endian f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        let v = read_f64_le(self.data, self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    /// Read exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(short_read(self.pos, n, self.data.len()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read `n` characters of compressed Unicode (one byte per character,
    /// Windows-1252 low page).
    pub fn read_compressed_unicode(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(bytes.iter().map(|&b| windows_1252_to_char(b)).collect())
    }

    /// Read `n` UTF-16LE code units (two bytes each); surrogate pairs
    /// decode to one character.
    pub fn read_unicode_le(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Append-only little-endian sink over a growable buffer.
#[derive(Debug, Default)]
pub struct LeWriter {
    buf: Vec<u8>,
}

impl LeWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Written bytes so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a little-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian i16.
    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian i32.
    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian f64.
    pub fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write a string as compressed Unicode, one byte per character.
    /// Characters outside the Windows-1252 repertoire become `?`.
    pub fn write_compressed_unicode(&mut self, s: &str) {
        for ch in s.chars() {
            self.buf.push(char_to_windows_1252(ch));
        }
    }

    /// Write a string as UTF-16LE, two bytes per code unit.
    pub fn write_unicode_le(&mut self, s: &str) {
        for unit in s.encode_utf16() {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
    }
}

/// Convert a Windows-1252 byte to a Unicode character.
///
/// Windows-1252 is mostly compatible with ISO-8859-1, but has additional
/// printable characters in the 0x80-0x9F range.
#[inline]
pub fn windows_1252_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Inverse of [`windows_1252_to_char`]; characters with no Windows-1252
/// encoding become `b'?'`.
#[inline]
pub fn char_to_windows_1252(ch: char) -> u8 {
    match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        c if (c as u32) < 0x100 && !(0x80..0xA0).contains(&(c as u32)) => c as u8,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_reader_cursor_advance() {
        let data = [0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xAA];
        let mut r = LeReader::new(&data);
        assert_eq!(r.read_u16().ok(), Some(1));
        assert_eq!(r.read_i32().ok(), Some(-1));
        assert_eq!(r.read_u8().ok(), Some(0xAA));
        assert!(r.is_empty());
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let data = [0x01, 0x02];
        let mut r = LeReader::new(&data);
        assert!(r.read_u32().is_err());
        assert_eq!(r.pos(), 0);
        assert_eq!(r.read_u16().ok(), Some(0x0201));
    }

    #[test]
    fn test_unicode_le_roundtrip() {
        let mut w = LeWriter::new();
        w.write_unicode_le("Hello");
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 10);
        let mut r = LeReader::new(&bytes);
        assert_eq!(r.read_unicode_le(5).ok().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_compressed_unicode_roundtrip() {
        let mut w = LeWriter::new();
        w.write_compressed_unicode("caf\u{E9} \u{201C}x\u{201D}");
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 8);
        let mut r = LeReader::new(&bytes);
        let s = r.read_compressed_unicode(8).ok();
        assert_eq!(s.as_deref(), Some("caf\u{E9} \u{201C}x\u{201D}"));
    }

    #[test]
    fn test_windows_1252_table_is_involutive() {
        for b in 0..=0xFFu8 {
            // 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned in Windows-1252
            if matches!(b, 0x81 | 0x8D | 0x8F | 0x90 | 0x9D) {
                continue;
            }
            assert_eq!(char_to_windows_1252(windows_1252_to_char(b)), b);
        }
    }
}
