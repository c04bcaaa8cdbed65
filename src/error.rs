//! Error types for record stream decoding.

use thiserror::Error;

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors raised while decoding or re-encoding a record stream.
///
/// Only unrecoverable conditions appear here. Truncated property data
/// degrades into the collection's special mask, and unknown record types
/// become opaque passthrough records; neither interrupts decoding.
#[derive(Error, Debug)]
pub enum RecordError {
    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes remained than a fixed-width read demanded
    #[error("unexpected end of stream at offset {offset}: needed {needed} bytes, {remaining} remain")]
    UnexpectedEndOfStream {
        /// Byte offset where the short read was detected
        offset: usize,
        /// Bytes the read demanded
        needed: usize,
        /// Bytes actually available
        remaining: usize,
    },

    /// A record with a format-fixed size carried a different declared length.
    /// Signals stream desynchronization and is never tolerated silently.
    #[error("record {} (0x{record_type:04X}) at offset {offset} size mismatch: expected {expected} bytes, found {found}",
            crate::records::record_name(*record_type))]
    RecordSizeMismatch {
        /// Stream offset of the record
        offset: usize,
        /// Record type identifier
        record_type: u16,
        /// Size the format prescribes
        expected: usize,
        /// Declared payload length actually seen
        found: usize,
    },

    /// A continuation envelope appeared with no eligible absorber. The byte
    /// offset of subsequent records is ambiguous, so this is fatal.
    #[error("continuation at offset {offset} has no absorber (preceding record type 0x{last_type:04X})")]
    MalformedContinuation {
        /// Stream offset of the offending continuation envelope
        offset: usize,
        /// Type of the record the continuation tried to extend (0 if none)
        last_type: u16,
    },
}
