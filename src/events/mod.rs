//! Push-style record processing.
//!
//! Consumers register listeners for the record types they care about and
//! drive the whole stream through [`process_records`] without holding it
//! in memory. A listener can abort the run early with a nonzero code, and
//! [`MissingRecordAwareListener`] upgrades the raw record stream to a
//! gap-filled cell event stream.

mod listener;
mod missing;

pub use listener::{AbortableRecordListener, ListenerRegistry, RecordListener};
pub use missing::{CellEvent, CellEventListener, MissingRecordAwareListener};

use crate::error::Result;
use crate::stream::RecordStream;
use std::io::Read;

/// Drive the stream to completion, dispatching every logical record to
/// the registry. Returns the first nonzero abort code a listener
/// produced, or zero if the stream ran to its end.
pub fn process_records<R: Read>(
    stream: &mut RecordStream<R>,
    registry: &mut ListenerRegistry<'_>,
) -> Result<i16> {
    while let Some(record) = stream.next_record()? {
        let code = registry.dispatch(&record);
        if code != 0 {
            return Ok(code);
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::LeWriter;
    use crate::records::{Record, type_id};
    use std::cell::RefCell;

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

    /// A worksheet fragment: rows 0 and 2, with a gap in row 0 and a
    /// compact multi-cell run in row 2.
    fn sample_stream() -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend(envelope(type_id::BOF, &[0u8; 16]));
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 0, 1.0)));
        stream.extend(envelope(type_id::NUMBER, &number_body(0, 2, 3.0)));
        let mut mulblank = LeWriter::new();
        mulblank.write_u16(2); // row
        mulblank.write_u16(0); // first column
        mulblank.write_u16(20);
        mulblank.write_u16(21);
        mulblank.write_u16(1); // last column
        stream.extend(envelope(type_id::MUL_BLANK, mulblank.as_slice()));
        stream.extend(envelope(type_id::EOF, &[]));
        stream
    }

    #[test]
    fn test_pipeline_with_gap_filling() {
        let bytes = sample_stream();
        let log = RefCell::new(Vec::new());
        {
            let mut registry = ListenerRegistry::new();
            registry.register_for_all(MissingRecordAwareListener::new(
                |event: CellEvent<'_>| {
                    log.borrow_mut().push(match event {
                        CellEvent::Record(r) => format!("rec:{}", crate::records::record_name(r.type_id())),
                        CellEvent::MissingRow { row } => format!("missrow:{row}"),
                        CellEvent::MissingCell { row, col } => format!("misscell:{row},{col}"),
                        CellEvent::LastCellOfRow { row } => format!("endrow:{row}"),
                    });
                },
            ));
            let mut stream = RecordStream::new(&bytes[..]);
            assert_eq!(process_records(&mut stream, &mut registry).unwrap(), 0);
        }
        assert_eq!(
            log.into_inner(),
            vec![
                "rec:BOF",
                "rec:NUMBER",
                "misscell:0,1",
                "rec:NUMBER",
                "endrow:0",
                // the compact blank run expands into two blank cells
                "rec:BLANK",
                "rec:BLANK",
                "endrow:2",
                "rec:EOF",
            ]
        );
    }

    #[test]
    fn test_pipeline_aborts_on_listener_code() {
        struct CountThenStop {
            seen: u32,
        }
        impl AbortableRecordListener for CountThenStop {
            fn abortable_process_record(&mut self, _record: &Record) -> i16 {
                self.seen += 1;
                if self.seen == 2 { 7 } else { 0 }
            }
        }

        let bytes = sample_stream();
        let mut registry = ListenerRegistry::new();
        registry.register_for_all(CountThenStop { seen: 0 });
        let mut stream = RecordStream::new(&bytes[..]);
        assert_eq!(process_records(&mut stream, &mut registry).unwrap(), 7);
        // the stream is left positioned after the aborting record
        assert!(stream.next_record().unwrap().is_some());
    }
}
