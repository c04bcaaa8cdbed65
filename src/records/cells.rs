//! Stream control, row, and cell value records.

use super::{DecodedRecords, Record, type_id, write_envelope};
use crate::binary::{LeReader, LeWriter};
use crate::error::{RecordError, Result};
use smallvec::smallvec;

fn expect_len(record_type: u16, expected: usize, data: &[u8], offset: usize) -> Result<()> {
    if data.len() != expected {
        return Err(RecordError::RecordSizeMismatch {
            offset,
            record_type,
            expected,
            found: data.len(),
        });
    }
    Ok(())
}

/// Substream start record: version, substream kind, build identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BofRecord {
    /// Format version word
    pub version: u16,
    /// Substream kind (workbook globals, sheet, ...)
    pub stream_kind: u16,
    /// Build identifier
    pub build: u16,
    /// Build year
    pub build_year: u16,
    /// File history flags
    pub history_flags: u32,
    /// Lowest version that can read this substream
    pub lowest_version: u32,
}

impl BofRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(16);
        body.write_u16(self.version);
        body.write_u16(self.stream_kind);
        body.write_u16(self.build);
        body.write_u16(self.build_year);
        body.write_u32(self.history_flags);
        body.write_u32(self.lowest_version);
        write_envelope(type_id::BOF, body.as_slice())
    }
}

pub(super) fn decode_bof(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::BOF, 16, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::Bof(BofRecord {
        version: reader.read_u16()?,
        stream_kind: reader.read_u16()?,
        build: reader.read_u16()?,
        build_year: reader.read_u16()?,
        history_flags: reader.read_u32()?,
        lowest_version: reader.read_u32()?,
    })])
}

/// Substream end record. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EofRecord;

impl EofRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        write_envelope(type_id::EOF, &[])
    }
}

pub(super) fn decode_eof(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::EOF, 0, data, offset)?;
    Ok(smallvec![Record::Eof(EofRecord)])
}

/// Row description record (fixed 16 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// Row index
    pub row: u16,
    /// First defined column
    pub first_col: u16,
    /// One past the last defined column
    pub last_col: u16,
    /// Row height in twips
    pub height: u16,
    /// Reserved word, preserved verbatim
    pub reserved1: u16,
    /// Reserved word, preserved verbatim
    pub reserved2: u16,
    /// Option flags
    pub option_flags: u16,
    /// Index of the row's extended format
    pub xf_index: u16,
}

impl RowRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(16);
        body.write_u16(self.row);
        body.write_u16(self.first_col);
        body.write_u16(self.last_col);
        body.write_u16(self.height);
        body.write_u16(self.reserved1);
        body.write_u16(self.reserved2);
        body.write_u16(self.option_flags);
        body.write_u16(self.xf_index);
        write_envelope(type_id::ROW, body.as_slice())
    }
}

pub(super) fn decode_row(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::ROW, 16, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::Row(RowRecord {
        row: reader.read_u16()?,
        first_col: reader.read_u16()?,
        last_col: reader.read_u16()?,
        height: reader.read_u16()?,
        reserved1: reader.read_u16()?,
        reserved2: reader.read_u16()?,
        option_flags: reader.read_u16()?,
        xf_index: reader.read_u16()?,
    })])
}

/// Empty styled cell (fixed 6 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankRecord {
    /// Row index
    pub row: u16,
    /// Column index
    pub col: u16,
    /// Extended format index
    pub xf_index: u16,
}

impl BlankRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(6);
        body.write_u16(self.row);
        body.write_u16(self.col);
        body.write_u16(self.xf_index);
        write_envelope(type_id::BLANK, body.as_slice())
    }
}

pub(super) fn decode_blank(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::BLANK, 6, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::Blank(BlankRecord {
        row: reader.read_u16()?,
        col: reader.read_u16()?,
        xf_index: reader.read_u16()?,
    })])
}

/// IEEE 754 numeric cell (fixed 14 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRecord {
    /// Row index
    pub row: u16,
    /// Column index
    pub col: u16,
    /// Extended format index
    pub xf_index: u16,
    /// Cell value
    pub value: f64,
}

impl NumberRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(14);
        body.write_u16(self.row);
        body.write_u16(self.col);
        body.write_u16(self.xf_index);
        body.write_f64(self.value);
        write_envelope(type_id::NUMBER, body.as_slice())
    }
}

pub(super) fn decode_number(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::NUMBER, 14, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::Number(NumberRecord {
        row: reader.read_u16()?,
        col: reader.read_u16()?,
        xf_index: reader.read_u16()?,
        value: reader.read_f64()?,
    })])
}

/// Packed 30-bit numeric cell (fixed 10 bytes). The raw RK word is kept
/// so re-serialization is bit-exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RkRecord {
    /// Row index
    pub row: u16,
    /// Column index
    pub col: u16,
    /// Extended format index
    pub xf_index: u16,
    /// Raw RK-encoded value
    pub rk: u32,
}

impl RkRecord {
    /// Decode the RK word into its numeric value.
    ///
    /// Bit 0 divides by 100, bit 1 selects a 30-bit integer over the top
    /// 30 bits of an IEEE 754 double.
    pub fn value(&self) -> f64 {
        let base = if self.rk & 0x02 != 0 {
            ((self.rk as i32) >> 2) as f64
        } else {
            f64::from_bits(((self.rk & 0xFFFF_FFFC) as u64) << 32)
        };
        if self.rk & 0x01 != 0 { base / 100.0 } else { base }
    }

    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(10);
        body.write_u16(self.row);
        body.write_u16(self.col);
        body.write_u16(self.xf_index);
        body.write_u32(self.rk);
        write_envelope(type_id::RK, body.as_slice())
    }
}

pub(super) fn decode_rk(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::RK, 10, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::Rk(RkRecord {
        row: reader.read_u16()?,
        col: reader.read_u16()?,
        xf_index: reader.read_u16()?,
        rk: reader.read_u32()?,
    })])
}

/// String cell referencing the shared string table (fixed 10 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSstRecord {
    /// Row index
    pub row: u16,
    /// Column index
    pub col: u16,
    /// Extended format index
    pub xf_index: u16,
    /// Index into the shared string table
    pub sst_index: u32,
}

impl LabelSstRecord {
    /// Serialize with envelope.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = LeWriter::with_capacity(10);
        body.write_u16(self.row);
        body.write_u16(self.col);
        body.write_u16(self.xf_index);
        body.write_u32(self.sst_index);
        write_envelope(type_id::LABEL_SST, body.as_slice())
    }
}

pub(super) fn decode_label_sst(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    expect_len(type_id::LABEL_SST, 10, data, offset)?;
    let mut reader = LeReader::new(data);
    Ok(smallvec![Record::LabelSst(LabelSstRecord {
        row: reader.read_u16()?,
        col: reader.read_u16()?,
        xf_index: reader.read_u16()?,
        sst_index: reader.read_u32()?,
    })])
}

/// Decode a compact RK run into one `Rk` logical record per cell.
///
/// Layout: row, first column, then (xf index, rk word) per cell, then the
/// last column. The expansion is the stream's "bonus record" case: one
/// envelope yields several logical records.
pub(super) fn decode_mul_rk(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    if data.len() < 12 || (data.len() - 6) % 6 != 0 {
        return Err(RecordError::RecordSizeMismatch {
            offset,
            record_type: type_id::MUL_RK,
            expected: 12,
            found: data.len(),
        });
    }
    let count = (data.len() - 6) / 6;
    let mut reader = LeReader::new(data);
    let row = reader.read_u16()?;
    let first_col = reader.read_u16()?;

    let mut records = DecodedRecords::new();
    for i in 0..count {
        records.push(Record::Rk(RkRecord {
            row,
            col: first_col.wrapping_add(i as u16),
            xf_index: reader.read_u16()?,
            rk: reader.read_u32()?,
        }));
    }

    let last_col = reader.read_u16()?;
    let expected_last = first_col.wrapping_add(count as u16 - 1);
    if last_col != expected_last {
        return Err(RecordError::RecordSizeMismatch {
            offset,
            record_type: type_id::MUL_RK,
            expected: 6 + (last_col.wrapping_sub(first_col) as usize + 1) * 6,
            found: data.len(),
        });
    }
    Ok(records)
}

/// Decode a compact blank run into one `Blank` logical record per cell.
pub(super) fn decode_mul_blank(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    if data.len() < 8 || (data.len() - 6) % 2 != 0 {
        return Err(RecordError::RecordSizeMismatch {
            offset,
            record_type: type_id::MUL_BLANK,
            expected: 8,
            found: data.len(),
        });
    }
    let count = (data.len() - 6) / 2;
    let mut reader = LeReader::new(data);
    let row = reader.read_u16()?;
    let first_col = reader.read_u16()?;

    let mut records = DecodedRecords::new();
    for i in 0..count {
        records.push(Record::Blank(BlankRecord {
            row,
            col: first_col.wrapping_add(i as u16),
            xf_index: reader.read_u16()?,
        }));
    }

    let last_col = reader.read_u16()?;
    let expected_last = first_col.wrapping_add(count as u16 - 1);
    if last_col != expected_last {
        return Err(RecordError::RecordSizeMismatch {
            offset,
            record_type: type_id::MUL_BLANK,
            expected: 6 + (last_col.wrapping_sub(first_col) as usize + 1) * 2,
            found: data.len(),
        });
    }
    Ok(records)
}
