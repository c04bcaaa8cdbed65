//! Subrecords carried inside an object record's payload.
//!
//! Subrecords have their own 2+2 little-endian envelope. One of them,
//! the list-box data subrecord, has a layout that depends on the kind of
//! the enclosing object as declared by the common-object-data subrecord
//! earlier in the chain; the object record decoder threads that kind
//! through as context.

use crate::binary::{LeReader, LeWriter};
use crate::error::{RecordError, Result};
use bitflags::bitflags;

/// Subrecord identifiers.
pub mod sub_id {
    /// Chain terminator
    pub const END: u16 = 0x0000;
    /// Group marker (reserved bytes only)
    pub const GROUP_MARKER: u16 = 0x0006;
    /// List/combo box data
    pub const LBS_DATA: u16 = 0x0013;
    /// Common object data
    pub const COMMON_OBJECT_DATA: u16 = 0x0015;
}

/// Declared kind of a drawing object, from the common-object-data
/// subrecord. Unrecognized kinds are preserved verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectKind(pub u16);

impl ObjectKind {
    /// Shape group
    pub const GROUP: Self = Self(0x0000);
    /// Picture frame
    pub const PICTURE: Self = Self(0x0008);
    /// List box control
    pub const LIST_BOX: Self = Self(0x0012);
    /// Combo box control
    pub const COMBO_BOX: Self = Self(0x0014);
    /// Comment anchor
    pub const COMMENT: Self = Self(0x0019);

    /// True for combo box objects, whose list-box data carries extra
    /// dropdown fields.
    pub fn is_combo_box(self) -> bool {
        self == Self::COMBO_BOX
    }
}

bitflags! {
    /// Option flags of the common-object-data subrecord. Unknown bits are
    /// retained so serialization is lossless.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CmoFlags: u16 {
        /// Object is locked
        const LOCKED = 0x0001;
        /// Object prints
        const PRINTABLE = 0x0010;
        /// Control is disabled
        const DISABLED = 0x1000;
        /// Fill is automatic
        const AUTO_FILL = 0x2000;
        /// Line style is automatic
        const AUTO_LINE = 0x4000;

        const _ = !0;
    }
}

/// Common object data (fixed 18 bytes): declares the object's kind, id,
/// and option flags ahead of the kind-dependent subrecords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonObjectDataSubRecord {
    /// Declared object kind
    pub kind: ObjectKind,
    /// Object identifier, unique within the sheet
    pub object_id: u16,
    /// Option flags
    pub flags: CmoFlags,
    /// Three reserved words, preserved verbatim
    pub reserved: [u32; 3],
}

impl CommonObjectDataSubRecord {
    /// Payload size in bytes.
    pub fn data_size(&self) -> usize {
        18
    }

    fn decode(data: &[u8], offset: usize) -> Result<Self> {
        if data.len() != 18 {
            return Err(RecordError::RecordSizeMismatch {
                offset,
                record_type: sub_id::COMMON_OBJECT_DATA,
                expected: 18,
                found: data.len(),
            });
        }
        let mut reader = LeReader::new(data);
        Ok(Self {
            kind: ObjectKind(reader.read_u16()?),
            object_id: reader.read_u16()?,
            flags: CmoFlags::from_bits_retain(reader.read_u16()?),
            reserved: [reader.read_u32()?, reader.read_u32()?, reader.read_u32()?],
        })
    }

    fn write_body(&self, writer: &mut LeWriter) {
        writer.write_u16(self.kind.0);
        writer.write_u16(self.object_id);
        writer.write_u16(self.flags.bits());
        for word in self.reserved {
            writer.write_u32(word);
        }
    }
}

/// Group marker: nothing but reserved bytes, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMarkerSubRecord {
    /// Reserved payload
    pub reserved: Vec<u8>,
}

impl GroupMarkerSubRecord {
    /// Payload size in bytes.
    pub fn data_size(&self) -> usize {
        self.reserved.len()
    }
}

/// List/combo box data. The base fields are always present; the dropdown
/// fields exist only when the enclosing object is a combo box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LbsDataSubRecord {
    /// Number of list entries
    pub entry_count: u16,
    /// Index of the selected entry
    pub selected: u16,
    /// List box style word
    pub style: u16,
    /// Dropdown fields: (flags, visible line count, minimum width).
    /// Present only for combo box objects.
    pub dropdown: Option<(u16, u16, u16)>,
}

impl LbsDataSubRecord {
    /// Payload size in bytes: 6, or 12 with dropdown fields.
    pub fn data_size(&self) -> usize {
        if self.dropdown.is_some() { 12 } else { 6 }
    }

    fn decode(data: &[u8], kind: Option<ObjectKind>, offset: usize) -> Result<Self> {
        let combo = kind.is_some_and(ObjectKind::is_combo_box);
        let expected = if combo { 12 } else { 6 };
        if data.len() != expected {
            return Err(RecordError::RecordSizeMismatch {
                offset,
                record_type: sub_id::LBS_DATA,
                expected,
                found: data.len(),
            });
        }
        let mut reader = LeReader::new(data);
        let entry_count = reader.read_u16()?;
        let selected = reader.read_u16()?;
        let style = reader.read_u16()?;
        let dropdown = if combo {
            Some((reader.read_u16()?, reader.read_u16()?, reader.read_u16()?))
        } else {
            None
        };
        Ok(Self {
            entry_count,
            selected,
            style,
            dropdown,
        })
    }

    fn write_body(&self, writer: &mut LeWriter) {
        writer.write_u16(self.entry_count);
        writer.write_u16(self.selected);
        writer.write_u16(self.style);
        if let Some((flags, lines, width)) = self.dropdown {
            writer.write_u16(flags);
            writer.write_u16(lines);
            writer.write_u16(width);
        }
    }
}

/// Opaque subrecord for identifiers without a dedicated decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubRecord {
    /// Original subrecord identifier
    pub sid: u16,
    /// Raw payload
    pub data: Vec<u8>,
}

/// A decoded subrecord of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SubRecord {
    /// Chain terminator
    End,
    /// Group marker
    GroupMarker(GroupMarkerSubRecord),
    /// Common object data
    CommonObjectData(CommonObjectDataSubRecord),
    /// List/combo box data
    LbsData(LbsDataSubRecord),
    /// Opaque passthrough
    Unknown(UnknownSubRecord),
}

impl SubRecord {
    /// Decode one subrecord body. `kind` is the enclosing object's
    /// declared kind, if a common-object-data subrecord has been seen.
    pub fn decode(
        sid: u16,
        data: &[u8],
        kind: Option<ObjectKind>,
        offset: usize,
    ) -> Result<SubRecord> {
        match sid {
            sub_id::END => {
                if !data.is_empty() {
                    return Err(RecordError::RecordSizeMismatch {
                        offset,
                        record_type: sub_id::END,
                        expected: 0,
                        found: data.len(),
                    });
                }
                Ok(SubRecord::End)
            }
            sub_id::GROUP_MARKER => Ok(SubRecord::GroupMarker(GroupMarkerSubRecord {
                reserved: data.to_vec(),
            })),
            sub_id::COMMON_OBJECT_DATA => Ok(SubRecord::CommonObjectData(
                CommonObjectDataSubRecord::decode(data, offset)?,
            )),
            sub_id::LBS_DATA => Ok(SubRecord::LbsData(LbsDataSubRecord::decode(
                data, kind, offset,
            )?)),
            _ => Ok(SubRecord::Unknown(UnknownSubRecord {
                sid,
                data: data.to_vec(),
            })),
        }
    }

    /// The subrecord's identifier.
    pub fn sid(&self) -> u16 {
        match self {
            SubRecord::End => sub_id::END,
            SubRecord::GroupMarker(_) => sub_id::GROUP_MARKER,
            SubRecord::CommonObjectData(_) => sub_id::COMMON_OBJECT_DATA,
            SubRecord::LbsData(_) => sub_id::LBS_DATA,
            SubRecord::Unknown(u) => u.sid,
        }
    }

    /// Payload size in bytes, excluding the 4-byte subrecord envelope.
    pub fn data_size(&self) -> usize {
        match self {
            SubRecord::End => 0,
            SubRecord::GroupMarker(g) => g.data_size(),
            SubRecord::CommonObjectData(c) => c.data_size(),
            SubRecord::LbsData(l) => l.data_size(),
            SubRecord::Unknown(u) => u.data.len(),
        }
    }

    /// Serialize envelope and body.
    pub fn serialize_into(&self, writer: &mut LeWriter) {
        writer.write_u16(self.sid());
        writer.write_u16(self.data_size() as u16);
        match self {
            SubRecord::End => {}
            SubRecord::GroupMarker(g) => writer.write_bytes(&g.reserved),
            SubRecord::CommonObjectData(c) => c.write_body(writer),
            SubRecord::LbsData(l) => l.write_body(writer),
            SubRecord::Unknown(u) => writer.write_bytes(&u.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_marker_scenario() {
        // envelope 06 00 04 00 followed by four reserved bytes
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        let sub = SubRecord::decode(0x0006, &payload, None, 0).unwrap();
        assert_eq!(sub.data_size(), 4);

        let mut writer = LeWriter::new();
        sub.serialize_into(&mut writer);
        assert_eq!(
            writer.into_inner(),
            vec![0x06, 0x00, 0x04, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn test_cmo_roundtrip_keeps_unknown_flag_bits() {
        let mut writer = LeWriter::new();
        writer.write_u16(0x0014); // combo box
        writer.write_u16(3);
        writer.write_u16(0x8011); // includes an undocumented bit
        writer.write_u32(0);
        writer.write_u32(0);
        writer.write_u32(0);
        let body = writer.into_inner();

        let sub = SubRecord::decode(sub_id::COMMON_OBJECT_DATA, &body, None, 0).unwrap();
        let SubRecord::CommonObjectData(cmo) = &sub else {
            panic!("expected cmo");
        };
        assert!(cmo.kind.is_combo_box());
        assert!(cmo.flags.contains(CmoFlags::LOCKED | CmoFlags::PRINTABLE));

        let mut out = LeWriter::new();
        sub.serialize_into(&mut out);
        assert_eq!(&out.into_inner()[4..], &body[..]);
    }

    #[test]
    fn test_lbs_data_layout_depends_on_object_kind() {
        let base = [5u8, 0, 2, 0, 1, 0];
        let sub = SubRecord::decode(sub_id::LBS_DATA, &base, Some(ObjectKind::LIST_BOX), 0).unwrap();
        assert_eq!(sub.data_size(), 6);

        let mut combo = base.to_vec();
        combo.extend_from_slice(&[1, 0, 8, 0, 0x40, 0]);
        let sub =
            SubRecord::decode(sub_id::LBS_DATA, &combo, Some(ObjectKind::COMBO_BOX), 0).unwrap();
        let SubRecord::LbsData(lbs) = &sub else {
            panic!("expected lbs data");
        };
        assert_eq!(lbs.dropdown, Some((1, 8, 0x40)));

        // combo payload against a list box kind is a size mismatch
        assert!(
            SubRecord::decode(sub_id::LBS_DATA, &combo, Some(ObjectKind::LIST_BOX), 0).is_err()
        );
    }

    #[test]
    fn test_unknown_subrecord_passthrough() {
        let sub = SubRecord::decode(0x0BAD, &[1, 2, 3], None, 0).unwrap();
        let mut writer = LeWriter::new();
        sub.serialize_into(&mut writer);
        assert_eq!(writer.into_inner(), vec![0xAD, 0x0B, 0x03, 0x00, 1, 2, 3]);
    }
}
