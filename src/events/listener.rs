//! Listener traits and the dispatch registry.

use crate::records::Record;

/// Receives each logical record as it is reassembled.
pub trait RecordListener {
    fn process_record(&mut self, record: &Record);
}

impl<F: FnMut(&Record)> RecordListener for F {
    fn process_record(&mut self, record: &Record) {
        self(record)
    }
}

/// A listener that can stop processing early: any nonzero return value
/// aborts the run and is handed back to the caller.
pub trait AbortableRecordListener {
    fn abortable_process_record(&mut self, record: &Record) -> i16;
}

impl<L: RecordListener> AbortableRecordListener for L {
    fn abortable_process_record(&mut self, record: &Record) -> i16 {
        self.process_record(record);
        0
    }
}

enum Interest {
    All,
    Types(Vec<u16>),
}

impl Interest {
    fn matches(&self, type_id: u16) -> bool {
        match self {
            Interest::All => true,
            Interest::Types(types) => types.contains(&type_id),
        }
    }
}

/// Routes records to listeners registered for specific record types or
/// for every record. Listeners fire in registration order.
#[derive(Default)]
pub struct ListenerRegistry<'a> {
    entries: Vec<(Interest, Box<dyn AbortableRecordListener + 'a>)>,
}

impl<'a> ListenerRegistry<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a listener for one record type.
    pub fn register_for(&mut self, type_id: u16, listener: impl AbortableRecordListener + 'a) {
        self.entries
            .push((Interest::Types(vec![type_id]), Box::new(listener)));
    }

    /// Register a listener for a set of record types.
    pub fn register_for_types(
        &mut self,
        type_ids: &[u16],
        listener: impl AbortableRecordListener + 'a,
    ) {
        self.entries
            .push((Interest::Types(type_ids.to_vec()), Box::new(listener)));
    }

    /// Register a listener for every record.
    pub fn register_for_all(&mut self, listener: impl AbortableRecordListener + 'a) {
        self.entries.push((Interest::All, Box::new(listener)));
    }

    /// Deliver one record to every interested listener. Returns the first
    /// nonzero abort code, or zero.
    pub fn dispatch(&mut self, record: &Record) -> i16 {
        let type_id = record.type_id();
        for (interest, listener) in &mut self.entries {
            if interest.matches(type_id) {
                let code = listener.abortable_process_record(record);
                if code != 0 {
                    return code;
                }
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EofRecord, NumberRecord, type_id};

    fn number(row: u16, col: u16) -> Record {
        Record::Number(NumberRecord {
            row,
            col,
            xf_index: 0,
            value: 0.0,
        })
    }

    #[test]
    fn test_type_filtered_dispatch() {
        let mut seen = Vec::new();
        {
            let mut registry = ListenerRegistry::new();
            registry.register_for(type_id::NUMBER, |record: &Record| {
                seen.push(record.type_id());
            });
            assert_eq!(registry.dispatch(&number(0, 0)), 0);
            assert_eq!(registry.dispatch(&Record::Eof(EofRecord)), 0);
        }
        assert_eq!(seen, vec![type_id::NUMBER]);
    }

    #[test]
    fn test_abort_code_propagates() {
        struct StopAtEof;
        impl AbortableRecordListener for StopAtEof {
            fn abortable_process_record(&mut self, record: &Record) -> i16 {
                if matches!(record, Record::Eof(_)) { 42 } else { 0 }
            }
        }

        let mut registry = ListenerRegistry::new();
        registry.register_for_all(StopAtEof);
        assert_eq!(registry.dispatch(&number(0, 0)), 0);
        assert_eq!(registry.dispatch(&Record::Eof(EofRecord)), 42);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let calls = std::cell::RefCell::new(Vec::new());
        {
            let mut registry = ListenerRegistry::new();
            registry.register_for_all(|_: &Record| calls.borrow_mut().push("first"));
            registry.register_for_types(&[type_id::NUMBER, type_id::RK], |_: &Record| {
                calls.borrow_mut().push("second")
            });
            registry.dispatch(&number(0, 0));
        }
        assert_eq!(calls.into_inner(), vec!["first", "second"]);
    }
}
