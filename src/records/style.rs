//! Text style run stream record.

use super::{DecodedRecords, type_id, write_envelope};
use crate::binary::{LeWriter, read_u32_le};
use crate::error::Result;
use crate::props::{StyleRuns, parse_style_runs, write_style_runs};
use smallvec::smallvec;

/// Text style run stream: the styled text's length in characters followed
/// by paragraph-family runs and then character-family runs, each run a
/// mask-driven property collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyleRecord {
    /// Length of the styled text in characters
    pub text_len: u32,
    /// Decoded property runs
    pub runs: StyleRuns,
    /// Bytes after the last run, preserved verbatim
    pub trailing: Vec<u8>,
}

impl TextStyleRecord {
    pub(super) fn decode(data: &[u8], _offset: usize) -> Result<Self> {
        let text_len = read_u32_le(data, 0)?;
        let (runs, used) = parse_style_runs(&data[4..], text_len)?;
        Ok(Self {
            text_len,
            runs,
            trailing: data[4 + used..].to_vec(),
        })
    }

    /// Serialize the record with its envelope header.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = LeWriter::new();
        writer.write_u32(self.text_len);
        write_style_runs(&mut writer, &self.runs);
        writer.write_bytes(&self.trailing);
        write_envelope(type_id::TEXT_STYLE, writer.as_slice())
    }
}

pub(super) fn decode_text_style(data: &[u8], offset: usize) -> Result<DecodedRecords> {
    Ok(smallvec![super::Record::TextStyle(TextStyleRecord::decode(
        data, offset
    )?)])
}
