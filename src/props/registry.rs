//! Static slot registries for the paragraph and character property families.
//!
//! Registry order is fixed by the format and is NOT mask-bit order: the
//! decoder and encoder both walk these tables front to back, so reordering
//! an entry changes the on-disk layout. Entries are immutable descriptors;
//! a decode instantiates fresh slot values from them, never mutates them.

/// Which property family a collection belongs to. Paragraph collections
/// carry an indent level in their serialized header; character collections
/// do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropFamily {
    /// Paragraph-level properties
    Paragraph,
    /// Character-run-level properties
    Character,
}

/// Slot shape: how the value bytes after the mask are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// A single integer of the declared byte width
    Plain,
    /// A 16-bit integer exploded into named boolean sub-flags
    BitMask(&'static [&'static str]),
    /// A count-prefixed array of tab stop entries (variable width)
    TabStops,
}

/// One registry entry: a named property slot with a declared byte width
/// and its bit in the contains-mask.
#[derive(Debug, Clone, Copy)]
pub struct PropDescriptor {
    /// Property name
    pub name: &'static str,
    /// Declared width in bytes: 0 (flag only), 2, or 4
    pub size: usize,
    /// Bit(s) of the 32-bit contains-mask that declare this slot present
    pub mask: u32,
    /// Slot shape
    pub kind: DescriptorKind,
}

impl PropDescriptor {
    const fn plain(name: &'static str, size: usize, mask: u32) -> Self {
        Self {
            name,
            size,
            mask,
            kind: DescriptorKind::Plain,
        }
    }
}

/// Sub-flag names of the paragraph flags slot, low bit first.
const PARAGRAPH_FLAG_NAMES: &[&str] = &[
    "bullet",
    "bullet.hardfont",
    "bullet.hardcolor",
    "bullet.hardsize",
    "charWrap",
    "wordWrap",
    "overflow",
    "para.flag8",
    "para.flag9",
    "para.flag10",
    "para.flag11",
    "para.flag12",
    "para.flag13",
    "para.flag14",
    "para.flag15",
    "para.flag16",
];

/// Sub-flag names of the character flags slot, low bit first.
const CHARACTER_FLAG_NAMES: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "char.flag4",
    "shadow",
    "fehint",
    "char.flag7",
    "kumi",
    "char.flag9",
    "emboss",
    "pp9rt1",
    "pp9rt2",
    "pp9rt3",
    "pp9rt4",
    "char.flag15",
    "char.flag16",
];

/// Paragraph family registry, canonical order.
///
/// Note defaultTabSize: its mask bit is numerically below text.offset's
/// but it serializes after it.
pub const PARAGRAPH_PROPS: &[PropDescriptor] = &[
    PropDescriptor {
        name: "paragraph.flags",
        size: 2,
        mask: 0x0000_FFFF,
        kind: DescriptorKind::BitMask(PARAGRAPH_FLAG_NAMES),
    },
    PropDescriptor::plain("alignment", 2, 0x0001_0000),
    PropDescriptor::plain("linespacing", 2, 0x0002_0000),
    PropDescriptor::plain("spacebefore", 2, 0x0004_0000),
    PropDescriptor::plain("spaceafter", 2, 0x0008_0000),
    PropDescriptor::plain("text.offset", 2, 0x0020_0000),
    PropDescriptor::plain("bullet.offset", 2, 0x0040_0000),
    PropDescriptor::plain("defaultTabSize", 2, 0x0010_0000),
    PropDescriptor {
        name: "tabStops",
        size: 0,
        mask: 0x0080_0000,
        kind: DescriptorKind::TabStops,
    },
    PropDescriptor::plain("fontAlign", 2, 0x0100_0000),
    PropDescriptor::plain("textDirection", 2, 0x0200_0000),
    PropDescriptor::plain("bullet.blip", 0, 0x0400_0000),
    PropDescriptor::plain("bullet.scheme", 0, 0x0800_0000),
    PropDescriptor::plain("hasBulletScheme", 0, 0x1000_0000),
];

/// Character family registry, canonical order.
///
/// font.size and font.color sit below the asian/ansi/symbol font indexes
/// in bit order but after them in the registry.
pub const CHARACTER_PROPS: &[PropDescriptor] = &[
    PropDescriptor {
        name: "char.flags",
        size: 2,
        mask: 0x0000_FFFF,
        kind: DescriptorKind::BitMask(CHARACTER_FLAG_NAMES),
    },
    PropDescriptor::plain("font.index", 2, 0x0001_0000),
    PropDescriptor::plain("pp10ext", 0, 0x0010_0000),
    PropDescriptor::plain("asian.font.index", 2, 0x0020_0000),
    PropDescriptor::plain("ansi.font.index", 2, 0x0040_0000),
    PropDescriptor::plain("symbol.font.index", 2, 0x0080_0000),
    PropDescriptor::plain("font.size", 2, 0x0002_0000),
    PropDescriptor::plain("font.color", 4, 0x0004_0000),
    PropDescriptor::plain("superscript", 2, 0x0008_0000),
];

/// The registry for a property family.
pub fn registry(family: PropFamily) -> &'static [PropDescriptor] {
    match family {
        PropFamily::Paragraph => PARAGRAPH_PROPS,
        PropFamily::Character => CHARACTER_PROPS,
    }
}

/// Position of the named slot in its family registry.
pub fn registry_index(family: PropFamily, name: &str) -> Option<usize> {
    registry(family).iter().position(|d| d.name == name)
}
