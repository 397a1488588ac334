use core::cmp;
use core::mem;
use core::ptr;

use log::debug;

use crate::block::{aligned, Block};
use crate::heap::header::{visit_children, HeapTag, LayoutForwarded, MIN_OBJ_SIZE};
use crate::heap::roots::RootSet;
use crate::heap::{Gc, HeapStats, Obj, DEFAULT_SPACE_SIZE};

/// Semi-space copying collector. Allocation bumps a pointer through the
/// from-space; a collection copies the reachable graph into the to-space
/// with the Cheney two-finger scan, rewrites every root, then swaps the
/// spaces.
pub(crate) struct CheneyHeap {
    /// Space allocation bumps through.
    from: Block,
    /// Space the collector copies into.
    to: Block,
    /// Next allocation address; `from <= free < limit`.
    free: *mut u8,
    /// End of the space being allocated from.
    limit: *mut u8,
    /// Logical size of the current from-space.
    space_size: usize,
    roots: RootSet,
    initialized: bool,
    stats: HeapStats,
}

impl CheneyHeap {
    /// A heap that has not yet acquired its spaces; `init` or the first
    /// allocation completes construction.
    pub(crate) fn new() -> CheneyHeap {
        CheneyHeap {
            from: Block::empty(),
            to: Block::empty(),
            free: ptr::null_mut(),
            limit: ptr::null_mut(),
            space_size: 0,
            roots: RootSet::new(),
            initialized: false,
            stats: HeapStats::default(),
        }
    }

    pub(crate) fn init(&mut self, space_size: usize) {
        assert!(!self.initialized, "heap already initialized");
        let space_size = cmp::max(aligned(space_size), MIN_OBJ_SIZE * 4);
        self.from = Block::alloc_zeroed(space_size);
        self.to = Block::alloc_zeroed(space_size);
        self.free = self.from.as_ptr();
        self.limit = unsafe { self.from.as_ptr().add(space_size) };
        self.space_size = space_size;
        self.initialized = true;
    }

    #[inline]
    fn bump(&mut self, n: usize) -> *mut u8 {
        let p = self.free;
        self.free = unsafe { self.free.add(n) };
        p
    }

    #[inline]
    fn fits(&self, n: usize) -> bool {
        (self.limit as usize - self.free as usize) >= n
    }

    /// Returns an aligned, zeroed region of at least `num_bytes` whose
    /// lifetime is tied to reachability. Collects, then grows, rather than
    /// fail.
    pub(crate) fn allocate(&mut self, num_bytes: usize) -> *mut u8 {
        if !self.initialized {
            self.init(DEFAULT_SPACE_SIZE);
        }
        let n = cmp::max(aligned(num_bytes), MIN_OBJ_SIZE);
        self.stats.num_allocated += 1;
        self.stats.bytes_allocated += n as u64;

        if self.fits(n) {
            return self.bump(n);
        }
        self.collect_into(self.space_size);
        if self.fits(n) {
            return self.bump(n);
        }
        // Still too small: settle the next cycle in a doubled space that
        // accounts for the oversized request.
        self.collect_into((self.space_size + n) * 2);
        assert!(self.fits(n), "heap exhausted");
        self.bump(n)
    }

    pub(crate) fn collect(&mut self) {
        if self.initialized {
            self.collect_into(self.space_size);
        }
    }

    /// Moves `obj` into the to-space, or resolves where it already went.
    fn relocate(&mut self, obj: Gc<Obj>) -> Gc<Obj> {
        match obj.header.heap_tag() {
            HeapTag::Forwarded => {
                let f = obj.as_ptr() as *mut LayoutForwarded;
                unsafe { (*f).new_location }
            }
            HeapTag::Global => obj,
            _ => {
                let n = obj.header.obj_len as usize;
                let new_location = self.free;
                unsafe {
                    ptr::copy_nonoverlapping(obj.as_ptr() as *const u8, new_location, n);
                    self.free = self.free.add(n);
                    let f = obj.as_ptr() as *mut LayoutForwarded;
                    (*f).header.heap_tag = HeapTag::Forwarded as u8;
                    (*f).new_location = Gc::from_raw(new_location as *mut Obj);
                }
                self.stats.num_live_objs += 1;
                Gc::from_raw(new_location as *mut Obj)
            }
        }
    }

    /// One full collection cycle. Before copying, the to-space is grown to
    /// at least `required` bytes, so callers can demand that the next
    /// from-space accommodate an oversized allocation.
    fn collect_into(&mut self, required: usize) {
        let needed = cmp::max(self.space_size, aligned(required));
        if self.to.size() < needed {
            self.to.grow(needed);
            self.stats.num_growths += 1;
        }

        // Copy roots, then trail the free pointer with the scan pointer:
        // everything between them still has children to relocate.
        self.free = self.to.as_ptr();
        let mut scan = self.free;
        self.stats.num_live_objs = 0;

        for i in 0..self.roots.len() {
            let slot = self.roots.slot_at(i);
            unsafe {
                if !(*slot).is_null() {
                    *slot = self.relocate(*slot);
                }
            }
        }

        while scan < self.free {
            let obj = scan as *mut Obj;
            unsafe {
                visit_children(obj, |slot| *slot = self.relocate(*slot));
                scan = scan.add((*obj).header.obj_len as usize);
            }
        }

        // Swap spaces for the next cycle.
        mem::swap(&mut self.from, &mut self.to);
        self.space_size = self.from.size();
        self.limit = unsafe { self.from.as_ptr().add(self.from.size()) };

        // Zero the free region so allocation hands out zeroed memory.
        unsafe {
            ptr::write_bytes(self.free, 0, self.limit as usize - self.free as usize);
        }

        self.stats.num_collections += 1;
        debug!(
            "collect #{}: {} live objects, {} of {} bytes free",
            self.stats.num_collections,
            self.stats.num_live_objs,
            self.limit as usize - self.free as usize,
            self.space_size,
        );

        // Less than 20% free after a collection: grow the idle space now so
        // the next collection settles in the doubled space.
        if (self.limit as usize - self.free as usize) < self.space_size / 5 {
            self.to.grow(self.space_size * 2);
            self.stats.num_growths += 1;
            debug!("grow: idle space -> {} bytes", self.to.size());
        }
    }

    pub(crate) fn roots_mut(&mut self) -> &mut RootSet {
        &mut self.roots
    }

    pub(crate) fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Tears the heap down. The fast path leaves everything for the OS to
    /// reclaim at exit; the slow path frees both spaces so leak checkers
    /// see a clean process.
    pub(crate) fn process_exit(&mut self, fast: bool) {
        if fast {
            return;
        }
        self.from.free();
        self.to.free();
        self.free = ptr::null_mut();
        self.limit = ptr::null_mut();
        self.space_size = 0;
        self.roots.clear();
        self.initialized = false;
    }
}
