use crate::heap::{Gc, Obj};

/// Maximum depth of the root stack; sized for any realistic shell-script
/// call stack.
pub const MAX_ROOTS: usize = 4 * 1024;

/// One entry in the root stack.
pub(crate) enum Root {
    /// Address of a local variable holding a managed pointer. The collector
    /// dereferences it and rewrites it when the pointee moves.
    Slot(*mut Gc<Obj>),
    /// A managed pointer held by the root set itself, on behalf of an owner
    /// that may move (an iterator, a reader). The collector rewrites the
    /// entry in place; the owner reads it back by index.
    Value(Gc<Obj>),
}

/// The set of locations the collector starts from. A stack, pushed and
/// popped in lockstep with scope entry and exit; see
/// [`StackRoots`](crate::heap::StackRoots).
pub(crate) struct RootSet {
    entries: Vec<Root>,
}

impl RootSet {
    pub(crate) fn new() -> RootSet {
        RootSet { entries: Vec::with_capacity(64) }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push_slot(&mut self, slot: *mut Gc<Obj>) {
        assert!(self.entries.len() < MAX_ROOTS, "root stack overflow");
        self.entries.push(Root::Slot(slot));
    }

    /// Pushes a value-root and returns its index for later reads.
    pub(crate) fn push_value(&mut self, value: Gc<Obj>) -> usize {
        assert!(self.entries.len() < MAX_ROOTS, "root stack overflow");
        self.entries.push(Root::Value(value));
        self.entries.len() - 1
    }

    pub(crate) fn pop(&mut self) {
        debug_assert!(!self.entries.is_empty());
        self.entries.pop();
    }

    /// Reads back a value-root, as the collector last left it.
    pub(crate) fn value_at(&self, index: usize) -> Gc<Obj> {
        match self.entries[index] {
            Root::Value(v) => v,
            Root::Slot(_) => panic!("root {} is not a value root", index),
        }
    }

    /// Returns the slot the collector must trace and rewrite for entry `i`.
    /// For a `Slot` root that is the registered address; for a `Value` root
    /// it is the entry itself. The returned pointer is valid until the next
    /// push (the backing store does not move during a collection, because
    /// collections never push roots).
    #[inline]
    pub(crate) fn slot_at(&mut self, i: usize) -> *mut Gc<Obj> {
        match &mut self.entries[i] {
            Root::Slot(p) => *p,
            Root::Value(v) => v as *mut Gc<Obj>,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
