//! Shared string table record.
//!
//! The table is generically continuable: the reassembler concatenates any
//! continuation payload onto the logical payload before this decoder runs,
//! so the decoder sees one contiguous buffer.

use super::{DecodedRecords, type_id, write_envelope};
use crate::binary::{LeReader, LeWriter};
use crate::error::Result;
use bytes::Bytes;
use smallvec::smallvec;

const FLAG_WIDE: u8 = 0x01;
const FLAG_EXTENDED: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

/// One shared string. The original encoding width and any rich-text or
/// extended payload are retained so serialization is lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstString {
    /// Decoded text
    pub text: String,
    /// True if the string was stored as UTF-16LE
    pub wide: bool,
    /// Raw rich-text formatting runs, 4 bytes per run
    pub rich_runs: Option<Bytes>,
    /// Raw extended string payload
    pub extended: Option<Bytes>,
}

impl SstString {
    /// A plain string with no formatting payload.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let wide = !text.chars().all(|c| (c as u32) < 0x100);
        Self {
            text,
            wide,
            rich_runs: None,
            extended: None,
        }
    }

    fn decode(reader: &mut LeReader<'_>) -> Result<Self> {
        let cch = reader.read_u16()? as usize;
        let flags = reader.read_u8()?;
        let rich_count = if flags & FLAG_RICH != 0 {
            reader.read_u16()? as usize
        } else {
            0
        };
        let ext_size = if flags & FLAG_EXTENDED != 0 {
            reader.read_u32()? as usize
        } else {
            0
        };
        let wide = flags & FLAG_WIDE != 0;
        let text = if wide {
            reader.read_unicode_le(cch)?
        } else {
            reader.read_compressed_unicode(cch)?
        };
        let rich_runs = if flags & FLAG_RICH != 0 {
            Some(Bytes::copy_from_slice(reader.read_bytes(rich_count * 4)?))
        } else {
            None
        };
        let extended = if flags & FLAG_EXTENDED != 0 {
            Some(Bytes::copy_from_slice(reader.read_bytes(ext_size)?))
        } else {
            None
        };
        Ok(Self {
            text,
            wide,
            rich_runs,
            extended,
        })
    }

    fn write_into(&self, writer: &mut LeWriter) {
        // cch counts storage units: UTF-16 code units for wide strings
        // (supplementary-plane characters take two), bytes otherwise.
        let cch = if self.wide {
            self.text.encode_utf16().count()
        } else {
            self.text.chars().count()
        };
        writer.write_u16(cch as u16);
        let mut flags = 0u8;
        if self.wide {
            flags |= FLAG_WIDE;
        }
        if self.rich_runs.is_some() {
            flags |= FLAG_RICH;
        }
        if self.extended.is_some() {
            flags |= FLAG_EXTENDED;
        }
        writer.write_u8(flags);
        if let Some(runs) = &self.rich_runs {
            writer.write_u16((runs.len() / 4) as u16);
        }
        if let Some(ext) = &self.extended {
            writer.write_u32(ext.len() as u32);
        }
        if self.wide {
            writer.write_unicode_le(&self.text);
        } else {
            writer.write_compressed_unicode(&self.text);
        }
        if let Some(runs) = &self.rich_runs {
            writer.write_bytes(runs);
        }
        if let Some(ext) = &self.extended {
            writer.write_bytes(ext);
        }
    }
}

/// Shared string table: a reference count over the whole stream and the
/// table of unique strings that string cells index into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstRecord {
    /// Total number of string cell references in the stream
    pub total_references: u32,
    /// Unique strings, in table order
    pub strings: Vec<SstString>,
}

impl SstRecord {
    /// Resolve a string cell's table index.
    pub fn get(&self, index: u32) -> Option<&SstString> {
        self.strings.get(index as usize)
    }

    /// Serialize the table with its envelope header.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = LeWriter::new();
        writer.write_u32(self.total_references);
        writer.write_u32(self.strings.len() as u32);
        for string in &self.strings {
            string.write_into(&mut writer);
        }
        write_envelope(type_id::SST, writer.as_slice())
    }
}

pub(super) fn decode_sst(data: &[u8], _offset: usize) -> Result<DecodedRecords> {
    let mut reader = LeReader::new(data);
    let total_references = reader.read_u32()?;
    let unique = reader.read_u32()? as usize;
    let mut strings = Vec::with_capacity(unique.min(data.len() / 3));
    for _ in 0..unique {
        strings.push(SstString::decode(&mut reader)?);
    }
    Ok(smallvec![super::Record::Sst(SstRecord {
        total_references,
        strings,
    })])
}
