//! The managed heap: object header, allocator/collector back-ends, and the
//! root set.
//!
//! The heap is a thread-local singleton, initialized once at program start
//! with [`init`] and torn down with [`process_exit`]. Two back-ends satisfy
//! the same contract: the semi-space Cheney copier (default) and the
//! mark-sweep collector (`marksweep` feature).
//!
//! Every function that holds managed pointers in locals must root them for
//! the duration of any allocation point:
//!
//! ```ignore
//! let mut s = str_from("x");
//! let mut parts = Gc::<List<Gc<Str>>>::null();
//! roots!(s, parts);
//! parts = s.split(sep); // may collect; s and parts survive and are rewritten
//! ```

mod header;
mod roots;

#[cfg(not(feature = "marksweep"))]
mod cheney;
#[cfg(feature = "marksweep")]
mod marksweep;

use core::cell::UnsafeCell;

pub use self::header::{cast, is_a, maskbit};
pub use self::header::{Gc, HeapTag, Obj, ObjHeader, TypeTagged};
pub use self::header::{HEADER_SIZE, MAX_FIELDS, MIN_OBJ_SIZE, NO_OBJ_LEN, ZERO_MASK};
pub use self::roots::MAX_ROOTS;

#[cfg(not(feature = "marksweep"))]
use self::cheney::CheneyHeap as HeapImpl;
#[cfg(feature = "marksweep")]
use self::marksweep::MarkSweepHeap as HeapImpl;

/// Initial space size when the heap is used before an explicit `init`.
pub(crate) const DEFAULT_SPACE_SIZE: usize = 1 << 20;

/// Cumulative and current heap counters, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapStats {
    /// Allocations performed since startup.
    pub num_allocated: u64,
    /// Bytes handed out since startup, after alignment rounding.
    pub bytes_allocated: u64,
    /// Collections performed since startup.
    pub num_collections: u64,
    /// Times a space grew.
    pub num_growths: u64,
    /// Objects that survived the most recent collection.
    pub num_live_objs: usize,
}

thread_local! {
    static HEAP: UnsafeCell<HeapImpl> = UnsafeCell::new(HeapImpl::new());
}

/// Runs `f` with exclusive access to the thread's heap.
///
/// The runtime is single-threaded by design; this is the one place that
/// assumption is cashed in. Callees must not re-enter (heap methods never
/// call back into this module).
#[inline]
fn with<R>(f: impl FnOnce(&mut HeapImpl) -> R) -> R {
    HEAP.with(|heap| f(unsafe { &mut *heap.get() }))
}

/// Prepares the heap with at least `space_size` bytes available for the
/// first cycle. The heap grows with allocations; under the mark-sweep
/// back-end the size hint is not needed and is ignored.
pub fn init(space_size: usize) {
    with(|heap| heap.init(space_size));
}

/// Returns an aligned, zeroed region of `num_bytes` bytes whose lifetime is
/// tied to reachability. Infallible from the caller's view: the heap
/// collects and grows rather than fail, and aborts the process if the
/// system allocator is exhausted.
///
/// Any call may trigger a collection, so every managed pointer held in a
/// local across this call must be rooted.
pub fn allocate(num_bytes: usize) -> *mut u8 {
    with(|heap| heap.allocate(num_bytes))
}

/// Explicitly reclaims unreachable objects.
pub fn collect() {
    with(|heap| heap.collect());
}

/// Registers a location holding a managed pointer as a collector root.
/// Prefer [`StackRoots`] or the [`roots!`](crate::roots) macro, which pair
/// the pop with scope exit.
pub fn push_root(slot: *mut Gc<Obj>) {
    with(|heap| heap.roots_mut().push_slot(slot));
}

/// Deregisters the most recently pushed root.
pub fn pop_root() {
    with(|heap| heap.roots_mut().pop());
}

/// Roots a managed pointer by value inside the root set itself, returning
/// the index the owner reads it back through. Used by iterators and
/// readers, whose own addresses are not stable enough to register.
pub(crate) fn push_root_value(value: Gc<Obj>) -> usize {
    with(|heap| heap.roots_mut().push_value(value))
}

/// Reads back a value-root, as the collector last left it.
pub(crate) fn root_value(index: usize) -> Gc<Obj> {
    with(|heap| heap.roots_mut().value_at(index))
}

/// Returns the heap counters.
pub fn stats() -> HeapStats {
    with(|heap| heap.stats())
}

/// Tears the heap down at the end of the program. `fast` leaves memory for
/// the OS; otherwise everything is freed for leak-checker cleanliness.
pub fn process_exit(fast: bool) {
    with(|heap| heap.process_exit(fast));
}

/// RAII registration of the local variables that hold managed pointers in
/// one stack frame. Pushes every slot on construction; pops the same count
/// when dropped, on every exit path.
pub struct StackRoots {
    n: usize,
}

impl StackRoots {
    /// Registers `slots`, each the address of a local `Gc` variable.
    pub fn new(slots: &[*mut Gc<Obj>]) -> StackRoots {
        with(|heap| {
            for &slot in slots {
                heap.roots_mut().push_slot(slot);
            }
        });
        StackRoots { n: slots.len() }
    }
}

impl Drop for StackRoots {
    fn drop(&mut self) {
        with(|heap| {
            for _ in 0..self.n {
                heap.roots_mut().pop();
            }
        });
    }
}

/// Roots one possibly-managed item by its slot address. A no-op for
/// primitive item types; container operations and generated node
/// constructors use this to keep a pending element alive while they
/// allocate space for it.
pub struct ItemRoot {
    pushed: bool,
}

impl ItemRoot {
    pub fn new<T: crate::value::SlabItem>(slot: *mut T) -> ItemRoot {
        match T::as_root(slot) {
            Some(slot) => {
                push_root(slot);
                ItemRoot { pushed: true }
            }
            None => ItemRoot { pushed: false },
        }
    }
}

impl Drop for ItemRoot {
    fn drop(&mut self) {
        if self.pushed {
            pop_root();
        }
    }
}

/// Registers the named local variables as collector roots for the rest of
/// the enclosing scope:
///
/// ```ignore
/// let mut this = s;
/// let mut result = Gc::<Str>::null();
/// roots!(this, result);
/// ```
///
/// Each variable must be a `mut` local of type `Gc<_>`.
#[macro_export]
macro_rules! roots {
    ($($var:ident),+ $(,)?) => {
        let _stack_roots = $crate::heap::StackRoots::new(&[
            $( (&mut $var as *mut $crate::Gc<_>) as *mut $crate::Gc<$crate::Obj> ),+
        ]);
    };
}
