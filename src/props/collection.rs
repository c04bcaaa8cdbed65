//! Property collections: registry-ordered decode and mask-recomputing
//! serialization of text style runs.

use super::registry::{DescriptorKind, PropFamily, registry, registry_index};
use super::slot::{BitMaskProp, PlainProp, PropValue, TabStop, TabStopProps};
use crate::binary::{LeReader, LeWriter, read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use crate::error::Result;

/// An ordered collection of decoded property slots for one style run.
///
/// Slot order follows the family registry, not insertion order. The
/// special mask records contains-mask bits that carry no decoded value:
/// zero-width capability flags, and bits whose declared data was truncated.
/// Re-encoding ORs the special mask back into the header so corrupt but
/// parseable input round-trips without losing unrelated valid data.
#[derive(Debug, Clone, PartialEq)]
pub struct PropCollection {
    family: PropFamily,
    master: bool,
    /// Number of characters this run covers
    pub characters_covered: u32,
    /// Paragraph indent level; negative means unset and is omitted on write
    pub indent_level: i16,
    props: Vec<PropValue>,
    special_mask: u32,
}

impl PropCollection {
    /// Create an empty run-scoped collection.
    pub fn new(family: PropFamily, characters_covered: u32) -> Self {
        Self {
            family,
            master: false,
            characters_covered,
            indent_level: -1,
            props: Vec::new(),
            special_mask: 0,
        }
    }

    /// Create an empty master-style collection. Master collections omit
    /// the characters-covered field when serialized.
    pub fn new_master(family: PropFamily) -> Self {
        Self {
            family,
            master: true,
            characters_covered: 0,
            indent_level: -1,
            props: Vec::new(),
            special_mask: 0,
        }
    }

    /// The property family this collection belongs to.
    pub fn family(&self) -> PropFamily {
        self.family
    }

    /// True for master-style collections.
    pub fn is_master(&self) -> bool {
        self.master
    }

    /// Contains-mask bits preserved without a decoded value.
    pub fn special_mask(&self) -> u32 {
        self.special_mask
    }

    /// Decoded slots in registry order.
    pub fn props(&self) -> &[PropValue] {
        &self.props
    }

    /// Decode a collection body from `data` guided by the header
    /// contains-mask. Walks the family registry in canonical order,
    /// consuming bytes only for slots whose mask bit is set.
    ///
    /// Truncation is soft: a declared-present slot with insufficient bytes
    /// lands in the special mask, further slot decoding stops, and the
    /// returned byte count excludes the undecoded slot. Never fails.
    pub fn build_from_mask(
        family: PropFamily,
        master: bool,
        contains_mask: u32,
        data: &[u8],
    ) -> (Self, usize) {
        let mut collection = if master {
            Self::new_master(family)
        } else {
            Self::new(family, 0)
        };
        let mut offset = 0;

        for descriptor in registry(family) {
            if contains_mask & descriptor.mask == 0 {
                continue;
            }
            match descriptor.kind {
                DescriptorKind::Plain => {
                    if descriptor.size == 0 {
                        // Flag-only slot: the mask bit is the whole payload.
                        collection.special_mask |= contains_mask & descriptor.mask;
                        continue;
                    }
                    if offset + descriptor.size > data.len() {
                        collection.special_mask |= contains_mask & descriptor.mask;
                        break;
                    }
                    let mut prop = PlainProp::from_descriptor(descriptor);
                    prop.value = match descriptor.size {
                        2 => read_i16_le(data, offset).unwrap_or(0) as i32,
                        _ => read_i32_le(data, offset).unwrap_or(0),
                    };
                    offset += descriptor.size;
                    collection.props.push(PropValue::Plain(prop));
                }
                DescriptorKind::BitMask(_) => {
                    if offset + descriptor.size > data.len() {
                        collection.special_mask |= contains_mask & descriptor.mask;
                        break;
                    }
                    let raw = read_u16_le(data, offset).unwrap_or(0) as u32;
                    offset += descriptor.size;
                    let mut prop = BitMaskProp::from_descriptor(descriptor);
                    prop.set_value_with_mask(raw, contains_mask & descriptor.mask);
                    collection.props.push(PropValue::BitMask(prop));
                }
                DescriptorKind::TabStops => {
                    let Ok(count) = read_u16_le(data, offset) else {
                        collection.special_mask |= contains_mask & descriptor.mask;
                        break;
                    };
                    let body = 2 + count as usize * 4;
                    if offset + body > data.len() {
                        collection.special_mask |= contains_mask & descriptor.mask;
                        break;
                    }
                    let mut prop = TabStopProps::from_descriptor(descriptor);
                    for i in 0..count as usize {
                        let base = offset + 2 + i * 4;
                        prop.stops.push(TabStop {
                            position: read_u16_le(data, base).unwrap_or(0),
                            kind: read_u16_le(data, base + 2).unwrap_or(0),
                        });
                    }
                    offset += body;
                    collection.props.push(PropValue::TabStops(prop));
                }
            }
        }

        (collection, offset)
    }

    /// Decode a master-style collection: a bare contains-mask followed by
    /// slot values, with no characters-covered or indent field.
    pub fn parse_master(family: PropFamily, data: &[u8]) -> Result<(Self, usize)> {
        let mut reader = LeReader::new(data);
        let contains_mask = reader.read_u32()?;
        let (collection, used) =
            Self::build_from_mask(family, true, contains_mask, &data[reader.pos()..]);
        Ok((collection, reader.pos() + used))
    }

    /// Find a slot by name.
    pub fn find_by_name(&self, name: &str) -> Option<&PropValue> {
        self.props.iter().find(|p| p.name() == name)
    }

    /// Integer value of a plain slot, or the raw value of a bit-mask slot.
    pub fn value(&self, name: &str) -> Option<i32> {
        match self.find_by_name(name)? {
            PropValue::Plain(p) => Some(p.value),
            PropValue::BitMask(p) => Some(p.value() as i32),
            PropValue::TabStops(_) => None,
        }
    }

    /// Set a plain slot's value, instantiating the slot from the registry
    /// when absent. Names not in the family registry are ignored, as are
    /// flag-only slots (see [`Self::set_flag`]).
    pub fn set_value(&mut self, name: &str, value: i32) {
        if let Some(PropValue::Plain(p)) = self.prop_mut(name) {
            p.value = value;
            return;
        }
        let Some(index) = registry_index(self.family, name) else {
            return;
        };
        let descriptor = &registry(self.family)[index];
        if !matches!(descriptor.kind, DescriptorKind::Plain) || descriptor.size == 0 {
            return;
        }
        let mut prop = PlainProp::from_descriptor(descriptor);
        prop.value = value;
        self.insert_ordered(PropValue::Plain(prop));
    }

    /// Raise a flag-only (zero-width) slot's capability bit.
    pub fn set_flag(&mut self, name: &str) {
        if let Some(index) = registry_index(self.family, name) {
            let descriptor = &registry(self.family)[index];
            if descriptor.size == 0 && matches!(descriptor.kind, DescriptorKind::Plain) {
                self.special_mask |= descriptor.mask;
            }
        }
    }

    /// Mutable access to a bit-mask slot, instantiating it from the
    /// registry when absent.
    pub fn bit_mask_mut(&mut self, name: &str) -> Option<&mut BitMaskProp> {
        if self.find_by_name(name).is_none() {
            let index = registry_index(self.family, name)?;
            let descriptor = &registry(self.family)[index];
            if !matches!(descriptor.kind, DescriptorKind::BitMask(_)) {
                return None;
            }
            self.insert_ordered(PropValue::BitMask(BitMaskProp::from_descriptor(descriptor)));
        }
        match self.prop_mut(name) {
            Some(PropValue::BitMask(p)) => Some(p),
            _ => None,
        }
    }

    /// Mutable access to the tab stop slot, instantiating it when absent.
    pub fn tab_stops_mut(&mut self, name: &str) -> Option<&mut TabStopProps> {
        if self.find_by_name(name).is_none() {
            let index = registry_index(self.family, name)?;
            let descriptor = &registry(self.family)[index];
            if !matches!(descriptor.kind, DescriptorKind::TabStops) {
                return None;
            }
            self.insert_ordered(PropValue::TabStops(TabStopProps::from_descriptor(descriptor)));
        }
        match self.prop_mut(name) {
            Some(PropValue::TabStops(p)) => Some(p),
            _ => None,
        }
    }

    fn prop_mut(&mut self, name: &str) -> Option<&mut PropValue> {
        self.props.iter_mut().find(|p| p.name() == name)
    }

    /// Insert keeping registry order.
    fn insert_ordered(&mut self, prop: PropValue) {
        let family = self.family;
        let key = registry_index(family, prop.name()).unwrap_or(usize::MAX);
        let at = self
            .props
            .iter()
            .position(|p| registry_index(family, p.name()).unwrap_or(usize::MAX) > key)
            .unwrap_or(self.props.len());
        self.props.insert(at, prop);
    }

    /// The header mask this collection will serialize: the special mask
    /// ORed with every slot's write-mask.
    pub fn header_mask(&self) -> u32 {
        self.props
            .iter()
            .fold(self.special_mask, |mask, p| mask | p.write_mask())
    }

    /// Serialize the collection. Emits characters-covered (unless master),
    /// the indent level for non-negative paragraph indents, the recomputed
    /// header mask, then slot values in registry order. Bit-mask slots
    /// whose write-mask is empty are dropped entirely: the format cannot
    /// represent a present-but-all-undefined slot.
    pub fn serialize(&self, writer: &mut LeWriter) {
        if !self.master {
            writer.write_u32(self.characters_covered);
        }
        if self.family == PropFamily::Paragraph && !self.master && self.indent_level >= 0 {
            writer.write_i16(self.indent_level);
        }
        writer.write_u32(self.header_mask());

        for prop in &self.props {
            match prop {
                PropValue::Plain(p) => match p.size {
                    2 => writer.write_i16(p.value as i16),
                    4 => writer.write_i32(p.value),
                    _ => {}
                },
                PropValue::BitMask(p) => {
                    let write_mask = p.write_mask();
                    if write_mask != 0 {
                        writer.write_u16((p.value() & write_mask) as u16);
                    }
                }
                PropValue::TabStops(p) => {
                    writer.write_u16(p.stops.len() as u16);
                    for stop in &p.stops {
                        writer.write_u16(stop.position);
                        writer.write_u16(stop.kind);
                    }
                }
            }
        }
    }
}

/// The decoded content of a style run stream: paragraph runs first, then
/// character runs, each covering a span of the styled text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleRuns {
    /// Paragraph-family runs in stream order
    pub paragraph: Vec<PropCollection>,
    /// Character-family runs in stream order
    pub character: Vec<PropCollection>,
}

/// Parse a style run stream covering `text_len` characters: paragraph
/// runs until the text is covered, then character runs likewise.
/// Returns the runs and the bytes consumed.
pub fn parse_style_runs(data: &[u8], text_len: u32) -> Result<(StyleRuns, usize)> {
    let mut reader = LeReader::new(data);
    let mut runs = StyleRuns::default();

    let mut covered = 0u64;
    while covered < text_len as u64 {
        // peek: a zero run header is not part of the run stream and must
        // stay unconsumed for the caller to preserve
        let chars = read_u32_le(data, reader.pos())?;
        if chars == 0 {
            break;
        }
        reader.read_u32()?;
        let indent = reader.read_i16()?;
        let mask = reader.read_u32()?;
        let (mut collection, used) =
            PropCollection::build_from_mask(PropFamily::Paragraph, false, mask, &data[reader.pos()..]);
        reader.read_bytes(used)?;
        collection.characters_covered = chars;
        collection.indent_level = indent;
        runs.paragraph.push(collection);
        covered += chars as u64;
    }

    covered = 0;
    while covered < text_len as u64 {
        let chars = read_u32_le(data, reader.pos())?;
        if chars == 0 {
            break;
        }
        reader.read_u32()?;
        let mask = reader.read_u32()?;
        let (mut collection, used) =
            PropCollection::build_from_mask(PropFamily::Character, false, mask, &data[reader.pos()..]);
        reader.read_bytes(used)?;
        collection.characters_covered = chars;
        runs.character.push(collection);
        covered += chars as u64;
    }

    Ok((runs, reader.pos()))
}

/// Serialize a style run stream, paragraph runs then character runs.
pub fn write_style_runs(writer: &mut LeWriter, runs: &StyleRuns) {
    for run in &runs.paragraph {
        run.serialize(writer);
    }
    for run in &runs.character {
        run.serialize(writer);
    }
}
