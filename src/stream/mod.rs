//! Record stream plumbing: envelope decoding and logical record reassembly.

mod envelope;
mod reassembler;

pub use envelope::{EnvelopeReader, RawRecord};
pub use reassembler::RecordStream;
