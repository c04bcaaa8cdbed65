//! Slot value types instantiated from registry descriptors.
//!
//! A decoded slot is a copy of its registry template with the value state
//! populated; descriptors themselves stay immutable. The three shapes are
//! a tagged variant type with structural copy semantics, so cloning and
//! re-serializing never need runtime type tests.

use super::registry::{DescriptorKind, PropDescriptor};

/// A plain integer property slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainProp {
    /// Property name
    pub name: &'static str,
    /// Declared byte width (0, 2, or 4)
    pub size: usize,
    /// Bit in the contains-mask
    pub mask: u32,
    /// Current value
    pub value: i32,
}

impl PlainProp {
    /// Instantiate from a registry descriptor with a zero value.
    pub fn from_descriptor(d: &PropDescriptor) -> Self {
        Self {
            name: d.name,
            size: d.size,
            mask: d.mask,
            value: 0,
        }
    }
}

/// A slot whose 16-bit value encodes independent named boolean sub-flags.
///
/// Each sub-flag has its own write-mask bit, derived by left-shifting the
/// lowest set bit of the slot mask by the sub-flag index. A parallel
/// `defined` array tracks which sub-flags are authoritative: a defined
/// sub-flag with a cleared value bit means "declared present, explicitly
/// false", which the format distinguishes from "not declared".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMaskProp {
    /// Property name
    pub name: &'static str,
    /// Bits of the contains-mask covered by this slot
    pub mask: u32,
    /// Raw integer value as stored on disk
    value: u32,
    /// Sub-flag names, low bit first
    sub_names: &'static [&'static str],
    /// Which sub-flags are authoritative
    defined: Vec<bool>,
}

impl BitMaskProp {
    /// Instantiate from a registry descriptor with nothing defined.
    /// Descriptors of other shapes yield a slot with no sub-flags.
    pub fn from_descriptor(d: &PropDescriptor) -> Self {
        let sub_names: &'static [&'static str] = match d.kind {
            DescriptorKind::BitMask(names) => names,
            _ => &[],
        };
        Self {
            name: d.name,
            mask: d.mask,
            value: 0,
            sub_names,
            defined: vec![false; sub_names.len()],
        }
    }

    /// Number of sub-flags.
    pub fn sub_count(&self) -> usize {
        self.sub_names.len()
    }

    /// Sub-flag names, low bit first.
    pub fn sub_names(&self) -> &'static [&'static str] {
        self.sub_names
    }

    /// Write-mask bit of sub-flag `index`: lowest set bit of the slot mask
    /// shifted left by the index.
    #[inline]
    pub fn sub_mask(&self, index: usize) -> u32 {
        (self.mask & self.mask.wrapping_neg()) << index
    }

    /// Raw integer value.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Store a decoded raw value and recompute every sub-flag's defined
    /// state from the run's contains-mask.
    ///
    /// A sub-flag counts as defined when either its contains-mask bit or
    /// its raw value bit is set; raw bits outside the defined set never
    /// read back as true. Canonical data written by this crate keeps raw
    /// bits inside the contains bits, making the two sets identical.
    pub fn set_value_with_mask(&mut self, raw: u32, contains_mask: u32) {
        self.value = raw;
        let declared = contains_mask | raw;
        for i in 0..self.defined.len() {
            self.defined[i] = declared & self.sub_mask(i) != 0;
        }
    }

    /// Whether sub-flag `index` is authoritative.
    pub fn is_defined(&self, index: usize) -> bool {
        self.defined.get(index).copied().unwrap_or(false)
    }

    /// Boolean value of sub-flag `index`. True only when the flag is both
    /// defined and its raw bit is set.
    pub fn sub_value(&self, index: usize) -> bool {
        self.is_defined(index) && self.value & self.sub_mask(index) != 0
    }

    /// Set sub-flag `index`, marking it defined. Setting a flag false keeps
    /// it defined: that is the explicitly-false state.
    pub fn set_sub_value(&mut self, index: usize, set: bool) {
        if index >= self.defined.len() {
            return;
        }
        self.defined[index] = true;
        if set {
            self.value |= self.sub_mask(index);
        } else {
            self.value &= !self.sub_mask(index);
        }
    }

    /// Look up a sub-flag index by name.
    pub fn sub_index(&self, name: &str) -> Option<usize> {
        self.sub_names.iter().position(|&n| n == name)
    }

    /// OR of the write-mask bits of all defined sub-flags. An empty write
    /// mask means the slot is dropped on serialization.
    pub fn write_mask(&self) -> u32 {
        let mut mask = 0;
        for (i, &defined) in self.defined.iter().enumerate() {
            if defined {
                mask |= self.sub_mask(i);
            }
        }
        mask
    }
}

/// One tab stop entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabStop {
    /// Position in master units
    pub position: u16,
    /// Stop kind (left/center/right/decimal as defined by the format)
    pub kind: u16,
}

/// The variable-width tab stop collection slot: a count-prefixed array of
/// (position, kind) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStopProps {
    /// Property name
    pub name: &'static str,
    /// Bit in the contains-mask
    pub mask: u32,
    /// Decoded entries in stream order
    pub stops: Vec<TabStop>,
}

impl TabStopProps {
    /// Instantiate from a registry descriptor with no stops.
    pub fn from_descriptor(d: &PropDescriptor) -> Self {
        Self {
            name: d.name,
            mask: d.mask,
            stops: Vec::new(),
        }
    }

    /// Serialized width in bytes: count word plus four bytes per entry.
    pub fn byte_len(&self) -> usize {
        2 + self.stops.len() * 4
    }
}

/// A decoded property slot of any shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Plain integer slot
    Plain(PlainProp),
    /// Bit-mask slot with boolean sub-flags
    BitMask(BitMaskProp),
    /// Tab stop collection slot
    TabStops(TabStopProps),
}

impl PropValue {
    /// Property name.
    pub fn name(&self) -> &'static str {
        match self {
            PropValue::Plain(p) => p.name,
            PropValue::BitMask(p) => p.name,
            PropValue::TabStops(p) => p.name,
        }
    }

    /// Contains-mask bits covered by this slot.
    pub fn mask(&self) -> u32 {
        match self {
            PropValue::Plain(p) => p.mask,
            PropValue::BitMask(p) => p.mask,
            PropValue::TabStops(p) => p.mask,
        }
    }

    /// Bits this slot contributes to the header mask on serialization.
    /// A plain or tab-stop slot always writes its registry bit; a bit-mask
    /// slot writes the union of its defined sub-flag bits.
    pub fn write_mask(&self) -> u32 {
        match self {
            PropValue::Plain(p) => p.mask,
            PropValue::BitMask(p) => p.write_mask(),
            PropValue::TabStops(p) => p.mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::registry::{PropFamily, registry};

    fn char_flags() -> BitMaskProp {
        BitMaskProp::from_descriptor(&registry(PropFamily::Character)[0])
    }

    #[test]
    fn test_sub_mask_derivation() {
        let prop = char_flags();
        assert_eq!(prop.sub_mask(0), 0x0001);
        assert_eq!(prop.sub_mask(1), 0x0002);
        assert_eq!(prop.sub_mask(15), 0x8000);
    }

    #[test]
    fn test_set_value_with_mask_defines_from_contains_and_raw() {
        let mut prop = char_flags();
        prop.set_value_with_mask(0x0003, 0x0001);
        assert!(prop.sub_value(0));
        assert!(prop.sub_value(1));
        for i in 2..16 {
            assert!(!prop.sub_value(i));
        }
        assert_eq!(prop.write_mask(), 0x0003);
    }

    #[test]
    fn test_explicitly_false_stays_defined() {
        let mut prop = char_flags();
        prop.set_value_with_mask(0x0001, 0x0003);
        // bit 1 declared by the contains-mask but cleared in the raw value
        assert!(prop.is_defined(1));
        assert!(!prop.sub_value(1));
        assert_eq!(prop.write_mask(), 0x0003);
        assert_eq!(prop.value() & prop.write_mask(), 0x0001);
    }

    #[test]
    fn test_set_sub_value_extends_write_mask() {
        let mut prop = char_flags();
        prop.set_value_with_mask(0x0003, 0x0001);
        prop.set_sub_value(2, true);
        assert_eq!(prop.write_mask(), 0x0007);
        assert!(prop.sub_value(2));

        prop.set_sub_value(2, false);
        assert_eq!(prop.write_mask(), 0x0007);
        assert!(!prop.sub_value(2));
    }

    #[test]
    fn test_sub_index_by_name() {
        let prop = char_flags();
        assert_eq!(prop.sub_index("bold"), Some(0));
        assert_eq!(prop.sub_index("italic"), Some(1));
        assert_eq!(prop.sub_index("emboss"), Some(9));
        assert_eq!(prop.sub_index("nope"), None);
    }
}
