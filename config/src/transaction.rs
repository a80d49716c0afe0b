//! # Transactions
//!
//! Batch any number of saves into one deferred write.
//!
//! While a [`Transaction`] is open it is the active persistence target of its
//! configuration: loads read through to the original target once and are then
//! served from a private buffer, saves only replace the buffer. Closing the
//! transaction restores the original target and flushes the buffer to it in a
//! single write. Readers of the original target never observe intermediate
//! states.
//!
//! Closing always commits. Dropping an open transaction commits too; a failed
//! flush on drop is logged. Transactions nest: an inner one flushes into the
//! outer buffer. Closing an outer transaction first closes every transaction
//! still open inside it.

use crate::document::Document;
use crate::source::Persistable;
use errors::ConfigError;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, warn};

struct SlotState {
    base: Rc<dyn Persistable>,
    open: Vec<Rc<Buffered>>,
}

/// The active persistence target, shared by a configuration and its bindings.
#[derive(Clone)]
pub struct TargetSlot(Rc<RefCell<SlotState>>);

impl TargetSlot {
    pub fn new(target: Rc<dyn Persistable>) -> Self {
        Self(Rc::new(RefCell::new(SlotState {
            base: target,
            open: Vec::new(),
        })))
    }

    /// The innermost open transaction buffer, or the base target.
    pub fn current(&self) -> Rc<dyn Persistable> {
        let state = self.0.borrow();
        if let Some(buffer) = state.open.last() {
            return buffer.clone();
        }
        Rc::clone(&state.base)
    }

    fn push(&self, buffer: Rc<Buffered>) {
        self.0.borrow_mut().open.push(buffer);
    }

    /// Remove `buffer` from the open stack, returning the buffers opened
    /// after it, innermost first.
    fn detach(&self, buffer: &Rc<Buffered>) -> Vec<Rc<Buffered>> {
        let mut state = self.0.borrow_mut();
        let Some(position) = state.open.iter().position(|b| Rc::ptr_eq(b, buffer)) else {
            return Vec::new();
        };

        let mut nested = state.open.split_off(position + 1);
        state.open.truncate(position);
        nested.reverse();
        nested
    }
}

impl fmt::Debug for TargetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSlot")
            .field("open", &self.0.borrow().open.len())
            .finish_non_exhaustive()
    }
}

struct Buffered {
    inner: Rc<dyn Persistable>,
    buffer: RefCell<Option<Document>>,
    dirty: Cell<bool>,
    closed: Cell<bool>,
}

impl Buffered {
    fn new(inner: Rc<dyn Persistable>) -> Self {
        Self {
            inner,
            buffer: RefCell::new(None),
            dirty: Cell::new(false),
            closed: Cell::new(false),
        }
    }

    /// Close the buffer and write it to the target it wraps, if dirty.
    fn flush(&self) -> Result<(), ConfigError> {
        self.closed.set(true);
        if !self.dirty.replace(false) {
            debug!("Transaction closed without changes");
            return Ok(());
        }

        let document = self.buffer.borrow_mut().take();
        match document {
            Some(document) => {
                debug!("Transaction flushing buffered document");
                self.inner.save(&document)
            }
            None => Ok(()),
        }
    }
}

impl Persistable for Buffered {
    fn exists(&self) -> Result<bool, ConfigError> {
        if self.buffer.borrow().is_some() {
            return Ok(true);
        }
        self.inner.exists()
    }

    fn load(&self) -> Result<Document, ConfigError> {
        if let Some(document) = self.buffer.borrow().as_ref() {
            return Ok(document.clone());
        }

        let document = self.inner.load()?;
        *self.buffer.borrow_mut() = Some(document.clone());
        Ok(document)
    }

    fn save(&self, document: &Document) -> Result<(), ConfigError> {
        *self.buffer.borrow_mut() = Some(document.clone());
        self.dirty.set(true);
        Ok(())
    }
}

/// Scoped batch of saves, flushed once when closed.
#[must_use = "a transaction commits as soon as it is dropped"]
pub struct Transaction {
    slot: TargetSlot,
    buffer: Rc<Buffered>,
}

impl Transaction {
    /// Install a new transaction as the active target of `slot`.
    pub fn start(slot: &TargetSlot) -> Self {
        let buffer = Rc::new(Buffered::new(slot.current()));
        slot.push(Rc::clone(&buffer));
        debug!("Transaction started");

        Self {
            slot: slot.clone(),
            buffer,
        }
    }

    /// Whether a save has been buffered since the transaction started.
    pub fn is_dirty(&self) -> bool {
        self.buffer.dirty.get()
    }

    /// Whether the transaction is still collecting saves.
    pub fn is_open(&self) -> bool {
        !self.buffer.closed.get()
    }

    /// Close the transaction, reporting a failed flush.
    pub fn commit(mut self) -> Result<(), ConfigError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), ConfigError> {
        if self.buffer.closed.get() {
            return Ok(());
        }

        let nested = self.slot.detach(&self.buffer);
        if !nested.is_empty() {
            warn!(
                "Transaction closed with {} nested transaction(s) still open, closing them first",
                nested.len()
            );
        }
        for buffer in nested {
            buffer.flush()?;
        }

        self.buffer.flush()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to flush transaction: {}", e);
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("open", &self.is_open())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSet;
    use crate::store::{MemoryStore, Store};

    fn doc(text: &str) -> Document {
        toml::from_str(text).unwrap()
    }

    fn slot_over(store: &MemoryStore) -> TargetSlot {
        TargetSlot::new(Rc::new(SourceSet::single(store.clone())))
    }

    #[test]
    fn test_saves_are_batched_into_one_write() {
        let store = MemoryStore::new("mem");
        store.write_text("n = 0\n");
        let slot = slot_over(&store);

        let tx = Transaction::start(&slot);
        for n in 1..=5 {
            slot.current().save(&doc(&format!("n = {n}"))).unwrap();
        }
        assert_eq!(store.writes(), 0);
        assert_eq!(store.load_document().unwrap(), doc("n = 0"));

        tx.commit().unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load_document().unwrap(), doc("n = 5"));
    }

    #[test]
    fn test_reads_inside_transaction_see_buffer() {
        let store = MemoryStore::new("mem");
        store.write_text("n = 0\n");
        let slot = slot_over(&store);

        let _tx = Transaction::start(&slot);
        assert_eq!(slot.current().load().unwrap(), doc("n = 0"));

        slot.current().save(&doc("n = 1")).unwrap();
        store.write_text("n = 99\n");
        assert_eq!(slot.current().load().unwrap(), doc("n = 1"));
    }

    #[test]
    fn test_drop_restores_target_and_flushes() {
        let store = MemoryStore::new("mem");
        let slot = slot_over(&store);
        let original = slot.current();

        {
            let _tx = Transaction::start(&slot);
            assert!(!Rc::ptr_eq(&slot.current(), &original));
            slot.current().save(&doc("a = 1")).unwrap();
        }

        assert!(Rc::ptr_eq(&slot.current(), &original));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load_document().unwrap(), doc("a = 1"));
    }

    #[test]
    fn test_clean_transaction_writes_nothing() {
        let store = MemoryStore::new("mem");
        store.write_text("a = 1\n");
        let slot = slot_over(&store);

        let tx = Transaction::start(&slot);
        slot.current().load().unwrap();
        assert!(!tx.is_dirty());
        tx.commit().unwrap();

        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_nested_transactions_flush_into_outer_buffer() {
        let store = MemoryStore::new("mem");
        let slot = slot_over(&store);

        let outer = Transaction::start(&slot);
        let inner = Transaction::start(&slot);
        slot.current().save(&doc("a = 1")).unwrap();
        inner.commit().unwrap();

        assert_eq!(store.writes(), 0);
        assert!(outer.is_dirty());
        assert_eq!(slot.current().load().unwrap(), doc("a = 1"));

        outer.commit().unwrap();
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_closing_outer_first_closes_nested_transactions() {
        let store = MemoryStore::new("mem");
        let slot = slot_over(&store);
        let original = slot.current();

        let outer = Transaction::start(&slot);
        let inner = Transaction::start(&slot);
        slot.current().save(&doc("a = 1")).unwrap();

        outer.commit().unwrap();
        assert!(!inner.is_open());
        assert!(Rc::ptr_eq(&slot.current(), &original));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load_document().unwrap(), doc("a = 1"));

        inner.commit().unwrap();
        assert!(Rc::ptr_eq(&slot.current(), &original));

        slot.current().save(&doc("a = 2")).unwrap();
        assert_eq!(store.writes(), 2);
        assert_eq!(store.load_document().unwrap(), doc("a = 2"));
    }

    #[test]
    fn test_exists_through_buffer() {
        let store = MemoryStore::new("mem");
        let slot = slot_over(&store);

        let _tx = Transaction::start(&slot);
        assert!(!slot.current().exists().unwrap());
        slot.current().save(&doc("a = 1")).unwrap();
        assert!(slot.current().exists().unwrap());
        assert!(!store.exists().unwrap());
    }
}
