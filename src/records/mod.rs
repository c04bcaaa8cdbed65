//! Typed records and the record factory.
//!
//! A logical record's type identifier is dispatched through a lookup table
//! to a concrete decoder. Unknown identifiers never fail: they become
//! opaque passthrough records that re-emit their payload byte-identically,
//! so the library cannot corrupt records it does not understand. Known
//! fixed-size records validate their declared length strictly, because a
//! wrong length on a fixed-size record means the stream is desynchronized.

mod cells;
mod drawing;
mod strings;
mod style;
mod subrecords;

pub use cells::{BlankRecord, BofRecord, EofRecord, LabelSstRecord, NumberRecord, RkRecord, RowRecord};
pub use drawing::{
    ContinuationAbsorber, DrawingGroupRecord, DrawingRecord, ObjRecord, TxoFlags, TxoRecord,
};
pub use strings::{SstRecord, SstString};
pub use style::TextStyleRecord;
pub use subrecords::{
    CmoFlags, CommonObjectDataSubRecord, GroupMarkerSubRecord, LbsDataSubRecord, ObjectKind,
    SubRecord, UnknownSubRecord, sub_id,
};

use crate::binary::LeWriter;
use crate::error::Result;
use bytes::Bytes;
use once_cell::sync::Lazy;
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

/// Record type identifiers.
pub mod type_id {
    /// Continuation of the preceding logical record
    pub const CONTINUE: u16 = 0x003C;
    /// End of a record substream
    pub const EOF: u16 = 0x000A;
    /// Beginning of a record substream
    pub const BOF: u16 = 0x0809;
    /// Row description
    pub const ROW: u16 = 0x0208;
    /// Empty styled cell
    pub const BLANK: u16 = 0x0201;
    /// IEEE 754 numeric cell
    pub const NUMBER: u16 = 0x0203;
    /// Packed 30-bit numeric cell
    pub const RK: u16 = 0x027E;
    /// Compact run of RK cells
    pub const MUL_RK: u16 = 0x00BD;
    /// Compact run of blank cells
    pub const MUL_BLANK: u16 = 0x00BE;
    /// String cell referencing the shared string table
    pub const LABEL_SST: u16 = 0x00FD;
    /// Shared string table
    pub const SST: u16 = 0x00FC;
    /// Drawing object descriptor (subrecord chain)
    pub const OBJ: u16 = 0x005D;
    /// Text object
    pub const TXO: u16 = 0x01B6;
    /// Drawing data
    pub const DRAWING: u16 = 0x00EC;
    /// Drawing group data
    pub const DRAWING_GROUP: u16 = 0x00EB;
    /// Text style run stream
    pub const TEXT_STYLE: u16 = 0x0FC0;
}

/// Record and subrecord names for diagnostics.
static RECORD_NAMES: phf::Map<u16, &'static str> = phf::phf_map! {
    0x003Cu16 => "CONTINUE",
    0x000Au16 => "EOF",
    0x0809u16 => "BOF",
    0x0208u16 => "ROW",
    0x0201u16 => "BLANK",
    0x0203u16 => "NUMBER",
    0x027Eu16 => "RK",
    0x00BDu16 => "MULRK",
    0x00BEu16 => "MULBLANK",
    0x00FDu16 => "LABELSST",
    0x00FCu16 => "SST",
    0x005Du16 => "OBJ",
    0x01B6u16 => "TXO",
    0x00ECu16 => "DRAWING",
    0x00EBu16 => "DRAWINGGROUP",
    0x0FC0u16 => "TEXTSTYLE",
    // subrecord identifiers inside OBJ
    0x0000u16 => "ftEnd",
    0x0006u16 => "ftGmo",
    0x0013u16 => "ftLbsData",
    0x0015u16 => "ftCmo",
};

/// Human-readable name for a record type identifier.
pub fn record_name(type_id: u16) -> &'static str {
    RECORD_NAMES.get(&type_id).copied().unwrap_or("UNKNOWN")
}

/// A decoded logical record.
///
/// Tagged variants with structural copy semantics; every variant
/// re-serializes to the exact bytes it was decoded from when unmodified.
#[derive(Debug, Clone)]
pub enum Record {
    /// Substream start
    Bof(BofRecord),
    /// Substream end
    Eof(EofRecord),
    /// Row description
    Row(RowRecord),
    /// Empty styled cell
    Blank(BlankRecord),
    /// Numeric cell
    Number(NumberRecord),
    /// Packed numeric cell
    Rk(RkRecord),
    /// Shared-string cell
    LabelSst(LabelSstRecord),
    /// Shared string table
    Sst(SstRecord),
    /// Drawing object descriptor
    Obj(ObjRecord),
    /// Text object
    Txo(TxoRecord),
    /// Drawing data
    Drawing(DrawingRecord),
    /// Drawing group data
    DrawingGroup(DrawingGroupRecord),
    /// Text style run stream
    TextStyle(TextStyleRecord),
    /// Opaque passthrough for unrecognized types
    Unknown(UnknownRecord),
}

impl Record {
    /// The record's type identifier.
    pub fn type_id(&self) -> u16 {
        match self {
            Record::Bof(_) => type_id::BOF,
            Record::Eof(_) => type_id::EOF,
            Record::Row(_) => type_id::ROW,
            Record::Blank(_) => type_id::BLANK,
            Record::Number(_) => type_id::NUMBER,
            Record::Rk(_) => type_id::RK,
            Record::LabelSst(_) => type_id::LABEL_SST,
            Record::Sst(_) => type_id::SST,
            Record::Obj(_) => type_id::OBJ,
            Record::Txo(_) => type_id::TXO,
            Record::Drawing(_) => type_id::DRAWING,
            Record::DrawingGroup(_) => type_id::DRAWING_GROUP,
            Record::TextStyle(_) => type_id::TEXT_STYLE,
            Record::Unknown(r) => r.type_id,
        }
    }

    /// Serialize the record with its envelope header.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Record::Bof(r) => r.serialize(),
            Record::Eof(r) => r.serialize(),
            Record::Row(r) => r.serialize(),
            Record::Blank(r) => r.serialize(),
            Record::Number(r) => r.serialize(),
            Record::Rk(r) => r.serialize(),
            Record::LabelSst(r) => r.serialize(),
            Record::Sst(r) => r.serialize(),
            Record::Obj(r) => r.serialize(),
            Record::Txo(r) => r.serialize(),
            Record::Drawing(r) => r.serialize(),
            Record::DrawingGroup(r) => r.serialize(),
            Record::TextStyle(r) => r.serialize(),
            Record::Unknown(r) => r.serialize(),
        }
    }

    /// Row and column of a cell-valued record, if it has one.
    pub fn cell_coords(&self) -> Option<(u16, u16)> {
        match self {
            Record::Blank(r) => Some((r.row, r.col)),
            Record::Number(r) => Some((r.row, r.col)),
            Record::Rk(r) => Some((r.row, r.col)),
            Record::LabelSst(r) => Some((r.row, r.col)),
            _ => None,
        }
    }

    /// The record's continuation-append capability, for record kinds that
    /// consume continuation payload internally.
    pub fn as_absorber_mut(&mut self) -> Option<&mut dyn ContinuationAbsorber> {
        match self {
            Record::Obj(r) => Some(r),
            Record::Txo(r) => Some(r),
            Record::Drawing(r) => Some(r),
            Record::DrawingGroup(r) => Some(r),
            _ => None,
        }
    }
}

/// Opaque record for type identifiers the factory does not recognize.
/// Stores the payload untouched and re-emits it byte-identically.
#[derive(Debug, Clone)]
pub struct UnknownRecord {
    /// Original type identifier
    pub type_id: u16,
    /// Raw payload
    pub data: Bytes,
}

impl UnknownRecord {
    /// Serialize envelope and payload exactly as read.
    pub fn serialize(&self) -> Vec<u8> {
        write_envelope(self.type_id, &self.data)
    }
}

/// One decode step usually yields one record, but compact multi-cell
/// encodings expand into several.
pub type DecodedRecords = SmallVec<[Record; 2]>;

type DecodeFn = fn(&[u8], usize) -> Result<DecodedRecords>;

static DISPATCH: Lazy<HashMap<u16, DecodeFn>> = Lazy::new(|| {
    let mut table: HashMap<u16, DecodeFn> = HashMap::new();
    table.insert(type_id::BOF, cells::decode_bof);
    table.insert(type_id::EOF, cells::decode_eof);
    table.insert(type_id::ROW, cells::decode_row);
    table.insert(type_id::BLANK, cells::decode_blank);
    table.insert(type_id::NUMBER, cells::decode_number);
    table.insert(type_id::RK, cells::decode_rk);
    table.insert(type_id::MUL_RK, cells::decode_mul_rk);
    table.insert(type_id::MUL_BLANK, cells::decode_mul_blank);
    table.insert(type_id::LABEL_SST, cells::decode_label_sst);
    table.insert(type_id::SST, strings::decode_sst);
    table.insert(type_id::OBJ, drawing::decode_obj);
    table.insert(type_id::TXO, drawing::decode_txo);
    table.insert(type_id::DRAWING, drawing::decode_drawing);
    table.insert(type_id::DRAWING_GROUP, drawing::decode_drawing_group);
    table.insert(type_id::TEXT_STYLE, style::decode_text_style);
    table
});

/// True if the factory has a decoder for this type identifier.
pub fn is_known(type_id: u16) -> bool {
    DISPATCH.contains_key(&type_id)
}

/// True for record types whose continuation payload is appended to the
/// logical payload before decoding.
pub fn is_continuable(record_type: u16) -> bool {
    record_type == type_id::SST
}

/// True for drawing-bearing record types that consume continuation
/// payload internally after decoding.
pub fn is_drawing_bearing(record_type: u16) -> bool {
    matches!(
        record_type,
        type_id::OBJ | type_id::TXO | type_id::DRAWING | type_id::DRAWING_GROUP
    )
}

/// Decode a logical record's payload into one or more typed records.
/// `offset` is the stream position of the record, used in diagnostics.
pub fn decode(record_type: u16, data: &[u8], offset: usize) -> Result<DecodedRecords> {
    match DISPATCH.get(&record_type) {
        Some(decoder) => decoder(data, offset),
        None => Ok(smallvec![Record::Unknown(UnknownRecord {
            type_id: record_type,
            data: Bytes::copy_from_slice(data),
        })]),
    }
}

/// Frame a record body with its 4-byte envelope header.
pub(crate) fn write_envelope(type_id: u16, body: &[u8]) -> Vec<u8> {
    debug_assert!(body.len() <= u16::MAX as usize);
    let mut writer = LeWriter::with_capacity(4 + body.len());
    writer.write_u16(type_id);
    writer.write_u16(body.len() as u16);
    writer.write_bytes(body);
    writer.into_inner()
}
