//! Record envelope decoding.
//!
//! Every record in the stream is framed by a 4-byte envelope: a 16-bit
//! little-endian type identifier followed by a 16-bit payload length.
//! A type identifier of zero is not a record: containers pad trailing
//! space to a minimum block size with zero bytes, so a zero envelope means
//! the stream is over.

use crate::error::{RecordError, Result};
use bytes::Bytes;
use std::io::Read;

/// One undifferentiated record as it appears on disk: type, length, payload.
///
/// Transient and stream-scoped; the reassembler consumes it immediately.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Record type identifier
    pub type_id: u16,
    /// Payload bytes, exactly as declared by the envelope length
    pub data: Bytes,
    /// Stream offset of the envelope header, for diagnostics
    pub offset: usize,
}

impl RawRecord {
    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Pull-based envelope decoder over a byte source.
///
/// Envelopes are returned strictly in stream order with no buffering
/// across calls.
pub struct EnvelopeReader<R> {
    reader: R,
    offset: usize,
    done: bool,
}

impl<R: Read> EnvelopeReader<R> {
    /// Wrap a byte source positioned at the first envelope.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Stream offset of the next envelope header.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read the next envelope, or `None` at end of stream.
    ///
    /// Reads exactly 4 header bytes then exactly as many payload bytes as
    /// the header declares. A zero type identifier is the padding sentinel:
    /// the stream ends there and any trailing bytes are discarded. A clean
    /// EOF at an envelope boundary also ends the stream; EOF inside a
    /// header or payload is [`RecordError::UnexpectedEndOfStream`].
    pub fn next_envelope(&mut self) -> Result<Option<RawRecord>> {
        if self.done {
            return Ok(None);
        }

        let mut header = [0u8; 4];
        let got = read_up_to(&mut self.reader, &mut header)?;
        if got == 0 {
            self.done = true;
            return Ok(None);
        }
        if got < 4 {
            return Err(RecordError::UnexpectedEndOfStream {
                offset: self.offset,
                needed: 4,
                remaining: got,
            });
        }

        let type_id = u16::from_le_bytes([header[0], header[1]]);
        let length = u16::from_le_bytes([header[2], header[3]]) as usize;

        if type_id == 0 {
            // Padding, not a record. Deliberate policy: report end of
            // stream and discard everything after it.
            self.done = true;
            return Ok(None);
        }

        let mut payload = vec![0u8; length];
        let got = read_up_to(&mut self.reader, &mut payload)?;
        if got < length {
            return Err(RecordError::UnexpectedEndOfStream {
                offset: self.offset + 4,
                needed: length,
                remaining: got,
            });
        }

        let record = RawRecord {
            type_id,
            data: Bytes::from(payload),
            offset: self.offset,
        };
        self.offset += 4 + length;
        Ok(Some(record))
    }
}

/// Fill `buf` from `reader`, stopping early only at EOF. Returns the number
/// of bytes actually read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
