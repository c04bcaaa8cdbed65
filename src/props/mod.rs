//! Bit-mask driven text property engine.
//!
//! A text style run is not a fixed schema: a 32-bit contains-mask in the
//! run header declares which optional property slots follow, and the slots
//! are emitted in a canonical registry order that is independent of mask
//! bit order. This module owns the two slot registries (paragraph and
//! character families), the slot value types, and the collection type that
//! decodes from and re-encodes to that layout with bit-exact fidelity.

mod collection;
mod registry;
mod slot;

pub use collection::{PropCollection, StyleRuns, parse_style_runs, write_style_runs};
pub use registry::{DescriptorKind, PropDescriptor, PropFamily, registry, registry_index};
pub use slot::{BitMaskProp, PlainProp, PropValue, TabStop, TabStopProps};
