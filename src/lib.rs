//! Loquat - A Rust library for legacy binary office record streams
//!
//! This library parses the record streams found inside legacy compound
//! binary office documents: length-prefixed little-endian record
//! envelopes, continuation reassembly, typed record decoding, and the
//! bit-mask-driven text property collections that style embedded text.
//!
//! # Features
//!
//! - **Envelope reader**: Walk raw record envelopes from any `Read` source
//! - **Continuation reassembly**: Hide continuation records behind fully
//!   reassembled logical records
//! - **Record factory**: Typed decoding with byte-identical passthrough
//!   for unrecognized record types
//! - **Property engine**: Mask-driven paragraph and character property
//!   collections with registry-ordered serialization
//! - **Event model**: Push-style listeners with early abort and
//!   missing-row/missing-cell gap filling
//!
//! # Example - Walking a record stream
//!
//! ```no_run
//! use loquat::stream::RecordStream;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("workbook.bin")?;
//! let mut stream = RecordStream::new(file);
//! while let Some(record) = stream.next_record()? {
//!     if let Some((row, col)) = record.cell_coords() {
//!         println!("cell at row {row}, column {col}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Event-driven processing
//!
//! ```no_run
//! use loquat::events::{ListenerRegistry, process_records};
//! use loquat::records::{Record, type_id};
//! use loquat::stream::RecordStream;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut count = 0u32;
//! let mut registry = ListenerRegistry::new();
//! registry.register_for(type_id::NUMBER, |_: &Record| count += 1);
//!
//! let mut stream = RecordStream::new(File::open("workbook.bin")?);
//! process_records(&mut stream, &mut registry)?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod error;
pub mod events;
pub mod props;
pub mod records;
pub mod stream;

pub use error::{RecordError, Result};
