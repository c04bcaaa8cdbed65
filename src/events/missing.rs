//! Gap-filling cell event stream.
//!
//! Cell records only exist for rows and cells that hold data, which makes
//! streaming consumers track coordinates themselves. The wrapper here
//! watches row and cell records go by and synthesizes events for the rows
//! and cells the stream skipped, plus an end-of-row marker, so a consumer
//! can render a rectangular grid from a single forward pass.

use super::listener::RecordListener;
use crate::records::Record;

/// One event in the gap-filled cell stream.
#[derive(Debug)]
pub enum CellEvent<'a> {
    /// A real record from the stream
    Record(&'a Record),
    /// A row with no row record
    MissingRow {
        row: u16,
    },
    /// A skipped cell within a populated row
    MissingCell {
        row: u16,
        col: u16,
    },
    /// No more cells will arrive for this row
    LastCellOfRow {
        row: u16,
    },
}

/// Receives the gap-filled event stream.
pub trait CellEventListener {
    fn process_cell_event(&mut self, event: CellEvent<'_>);
}

impl<F: FnMut(CellEvent<'_>)> CellEventListener for F {
    fn process_cell_event(&mut self, event: CellEvent<'_>) {
        self(event)
    }
}

/// Wraps a [`CellEventListener`] as a [`RecordListener`], synthesizing
/// the missing-row, missing-cell, and end-of-row events. Register it for
/// all records; it forwards every record it sees.
pub struct MissingRecordAwareListener<L: CellEventListener> {
    inner: L,
    last_row_seen: i32,
    last_cell_row: i32,
    last_cell_col: i32,
}

impl<L: CellEventListener> MissingRecordAwareListener<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            last_row_seen: -1,
            last_cell_row: -1,
            last_cell_col: -1,
        }
    }

    /// Recover the wrapped listener.
    pub fn into_inner(self) -> L {
        self.inner
    }

    fn on_row(&mut self, row: u16) {
        let row = row as i32;
        for missing in (self.last_row_seen + 1)..row {
            self.inner.process_cell_event(CellEvent::MissingRow {
                row: missing as u16,
            });
        }
        if row > self.last_row_seen {
            self.last_row_seen = row;
        }
    }

    fn on_cell(&mut self, row: u16, col: u16) {
        let row = row as i32;
        let col = col as i32;
        if row != self.last_cell_row && self.last_cell_row >= 0 {
            self.inner.process_cell_event(CellEvent::LastCellOfRow {
                row: self.last_cell_row as u16,
            });
            self.last_cell_col = -1;
        }
        if row != self.last_cell_row {
            self.last_cell_row = row;
            self.last_cell_col = -1;
        }
        for missing in (self.last_cell_col + 1)..col {
            self.inner.process_cell_event(CellEvent::MissingCell {
                row: row as u16,
                col: missing as u16,
            });
        }
        self.last_cell_col = col;
    }

    fn on_end_of_stream(&mut self) {
        if self.last_cell_row >= 0 {
            self.inner.process_cell_event(CellEvent::LastCellOfRow {
                row: self.last_cell_row as u16,
            });
        }
        self.last_row_seen = -1;
        self.last_cell_row = -1;
        self.last_cell_col = -1;
    }
}

impl<L: CellEventListener> RecordListener for MissingRecordAwareListener<L> {
    fn process_record(&mut self, record: &Record) {
        match record {
            Record::Row(row) => self.on_row(row.row),
            Record::Eof(_) => self.on_end_of_stream(),
            _ => {
                if let Some((row, col)) = record.cell_coords() {
                    self.on_cell(row, col);
                }
            }
        }
        self.inner.process_cell_event(CellEvent::Record(record));
    }
}
