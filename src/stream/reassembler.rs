//! Logical record reassembly.
//!
//! Continuation records never reach the caller. A record is held pending
//! until the next non-continuation envelope (or end of stream) closes its
//! continuation window, at which point it is decoded and emitted:
//!
//! - drawing-bearing types are decoded eagerly so each continuation can be
//!   handed to the record through [`ContinuationAbsorber`];
//! - generically continuable types get the continuation payload appended
//!   to their logical payload before decoding;
//! - continuations of unrecognized types are dropped, because their
//!   payload cannot be attached to anything meaningful;
//! - a continuation following any other known type, or following nothing
//!   at all, means the stream is malformed.

use super::envelope::EnvelopeReader;
use crate::error::{RecordError, Result};
use crate::records::{self, Record, type_id};
use std::collections::VecDeque;
use std::io::Read;

enum Pending {
    /// Payload not yet decoded; continuations may still extend it.
    Raw {
        type_id: u16,
        offset: usize,
        payload: Vec<u8>,
    },
    /// Decoded eagerly; continuations are absorbed by the record.
    Decoded(Record),
}

/// Iterator-style reader producing fully reassembled logical records.
pub struct RecordStream<R: Read> {
    envelopes: EnvelopeReader<R>,
    pending: Option<Pending>,
    ready: VecDeque<Record>,
    done: bool,
}

impl<R: Read> RecordStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            envelopes: EnvelopeReader::new(reader),
            pending: None,
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// The next logical record, or `None` at end of stream. Compact
    /// multi-cell records are expanded here, so one envelope may yield
    /// several calls' worth of records.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Ok(Some(record));
            }
            if self.done {
                return Ok(None);
            }

            let Some(raw) = self.envelopes.next_envelope()? else {
                self.done = true;
                self.flush_pending()?;
                continue;
            };

            if raw.type_id == type_id::CONTINUE {
                self.route_continuation(&raw.data, raw.offset)?;
                continue;
            }

            self.flush_pending()?;
            if records::is_drawing_bearing(raw.type_id) {
                let mut decoded = records::decode(raw.type_id, &raw.data, raw.offset)?;
                debug_assert_eq!(decoded.len(), 1);
                if let Some(record) = decoded.pop() {
                    self.pending = Some(Pending::Decoded(record));
                }
            } else {
                self.pending = Some(Pending::Raw {
                    type_id: raw.type_id,
                    offset: raw.offset,
                    payload: raw.data.to_vec(),
                });
            }
        }
    }

    /// Drain the remaining records into a vector.
    pub fn collect_records(&mut self) -> Result<Vec<Record>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }

    fn route_continuation(&mut self, data: &[u8], offset: usize) -> Result<()> {
        match &mut self.pending {
            Some(Pending::Decoded(record)) => match record.as_absorber_mut() {
                Some(absorber) => {
                    absorber.append_continuation(data);
                    Ok(())
                }
                None => Err(RecordError::MalformedContinuation {
                    offset,
                    last_type: record.type_id(),
                }),
            },
            Some(Pending::Raw {
                type_id, payload, ..
            }) => {
                if records::is_continuable(*type_id) {
                    payload.extend_from_slice(data);
                    Ok(())
                } else if !records::is_known(*type_id) {
                    // nothing meaningful to attach it to
                    Ok(())
                } else {
                    Err(RecordError::MalformedContinuation {
                        offset,
                        last_type: *type_id,
                    })
                }
            }
            None => Err(RecordError::MalformedContinuation {
                offset,
                last_type: 0,
            }),
        }
    }

    fn flush_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            None => Ok(()),
            Some(Pending::Decoded(record)) => {
                self.ready.push_back(record);
                Ok(())
            }
            Some(Pending::Raw {
                type_id,
                offset,
                payload,
            }) => {
                self.ready
                    .extend(records::decode(type_id, &payload, offset)?);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::LeWriter;

    fn envelope(type_id: u16, body: &[u8]) -> Vec<u8> {
        let mut writer = LeWriter::new();
        writer.write_u16(type_id);
        writer.write_u16(body.len() as u16);
        writer.write_bytes(body);
        writer.into_inner()
    }

    fn number_body(row: u16, col: u16, value: f64) -> Vec<u8> {
        let mut writer = LeWriter::new();
        writer.write_u16(row);
        writer.write_u16(col);
        writer.write_u16(0);
        writer.write_f64(value);
        writer.into_inner()
    }

    #[test]
    fn test_stream_order_preserved() {
        let mut stream = Vec::new();
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 0, 1.5)));
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 1, 2.5)));
        stream.extend(envelope(type_id::EOF, &[]));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].cell_coords(), Some((0, 0)));
        assert_eq!(records[1].cell_coords(), Some((0, 1)));
        assert!(matches!(records[2], Record::Eof(_)));
    }

    #[test]
    fn test_string_table_reassembled_across_continuations() {
        // table header and first string in the head record, second string
        // split over a continuation
        let mut head = LeWriter::new();
        head.write_u32(2);
        head.write_u32(2);
        head.write_u16(1);
        head.write_u8(0);
        head.write_bytes(b"a");
        head.write_u16(5);
        head.write_u8(0);
        head.write_bytes(b"wo");

        let mut stream = Vec::new();
        stream.extend(envelope(type_id::SST, head.as_slice()));
        stream.extend(envelope(type_id::CONTINUE, b"rld"));
        stream.extend(envelope(type_id::EOF, &[]));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        let Record::Sst(sst) = &records[0] else {
            panic!("expected string table");
        };
        assert_eq!(sst.strings[0].text, "a");
        assert_eq!(sst.strings[1].text, "world");
    }

    #[test]
    fn test_text_object_absorbs_continuations() {
        let mut head = LeWriter::new();
        head.write_u16(0);
        head.write_u16(0);
        head.write_bytes(&[0u8; 8]);
        head.write_u16(2);
        head.write_u16(8);
        head.write_u16(0); // empty-text font index

        let mut stream = Vec::new();
        stream.extend(envelope(type_id::TXO, head.as_slice()));
        stream.extend(envelope(type_id::CONTINUE, &[0x00, b'h', b'i']));
        stream.extend(envelope(type_id::CONTINUE, &[0u8; 8]));
        stream.extend(envelope(type_id::EOF, &[]));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        let Record::Txo(txo) = &records[0] else {
            panic!("expected text object");
        };
        assert_eq!(txo.continuation().len(), 2);
        assert_eq!(txo.text().unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn test_compact_cell_runs_expand() {
        // three RK cells packed into one envelope
        let mut body = LeWriter::new();
        body.write_u16(4); // row
        body.write_u16(1); // first column
        for xf in [10u16, 11, 12] {
            body.write_u16(xf);
            body.write_u32(0x0000_0002 | (100 << 2)); // integer 100
        }
        body.write_u16(3); // last column

        let mut stream = envelope(0x00BD, body.as_slice());
        stream.extend(envelope(type_id::EOF, &[]));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].cell_coords(), Some((4, 1)));
        assert_eq!(records[2].cell_coords(), Some((4, 3)));
    }

    #[test]
    fn test_continuation_with_no_pending_record_is_fatal() {
        let stream = envelope(type_id::CONTINUE, &[1, 2, 3]);
        let err = RecordStream::new(&stream[..]).collect_records().unwrap_err();
        assert!(matches!(
            err,
            RecordError::MalformedContinuation { offset: 0, last_type: 0 }
        ));
    }

    #[test]
    fn test_continuation_after_fixed_record_is_fatal() {
        let mut stream = Vec::new();
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 0, 1.0)));
        stream.extend(envelope(type_id::CONTINUE, &[1, 2]));
        let err = RecordStream::new(&stream[..]).collect_records().unwrap_err();
        assert!(matches!(
            err,
            RecordError::MalformedContinuation { offset: 18, last_type: type_id::NUMBER }
        ));
    }

    #[test]
    fn test_continuation_after_unknown_type_is_dropped() {
        let mut stream = Vec::new();
        stream.extend(envelope(0x0777, &[0xAB]));
        stream.extend(envelope(type_id::CONTINUE, &[0xCD, 0xEF]));
        stream.extend(envelope(type_id::EOF, &[]));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        assert_eq!(records.len(), 2);
        let Record::Unknown(unknown) = &records[0] else {
            panic!("expected passthrough record");
        };
        assert_eq!(&unknown.data[..], &[0xAB]);
    }

    #[test]
    fn test_zero_type_sentinel_ends_stream() {
        let mut stream = Vec::new();
        stream.extend(envelope(type_id::EOF, &[]));
        stream.extend(envelope(0x0000, &[]));
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 0, 1.0)));

        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Record::Eof(_)));
    }

    #[test]
    fn test_pending_record_flushed_at_end_of_stream() {
        let stream = envelope(type_id::NUMBER, &number_body(2, 3, 9.0));
        let records = RecordStream::new(&stream[..]).collect_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cell_coords(), Some((2, 3)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn cell_strategy() -> impl Strategy<Value = (u16, u16, f64)> {
            (any::<u16>(), any::<u16>(), prop::num::f64::NORMAL)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_numeric_cells_survive_reassembly(cells in prop::collection::vec(cell_strategy(), 0..32)) {
                let mut bytes = Vec::new();
                for (row, col, value) in &cells {
                    bytes.extend(envelope(type_id::NUMBER, &number_body(*row, *col, *value)));
                }
                bytes.extend(envelope(type_id::EOF, &[]));

                let records = RecordStream::new(&bytes[..]).collect_records().unwrap();
                prop_assert_eq!(records.len(), cells.len() + 1);
                for (record, (row, col, value)) in records.iter().zip(&cells) {
                    prop_assert_eq!(record.cell_coords(), Some((*row, *col)));
                    let Record::Number(number) = record else {
                        return Err(TestCaseError::fail("expected numeric cell"));
                    };
                    prop_assert_eq!(number.value.to_bits(), value.to_bits());
                }
            }

            #[test]
            fn prop_serialization_reproduces_the_stream(cells in prop::collection::vec(cell_strategy(), 1..16)) {
                let mut bytes = Vec::new();
                for (row, col, value) in &cells {
                    bytes.extend(envelope(type_id::NUMBER, &number_body(*row, *col, *value)));
                }

                let records = RecordStream::new(&bytes[..]).collect_records().unwrap();
                let rewritten: Vec<u8> = records.iter().flat_map(|r| r.serialize()).collect();
                prop_assert_eq!(rewritten, bytes);
            }
        }
    }
}
