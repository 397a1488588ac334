use core::alloc::Layout;
use core::cmp;
use std::alloc;
use std::collections::HashSet;

use log::debug;

use crate::block::{aligned, ALIGN};
use crate::heap::header::{visit_children, HeapTag, MIN_OBJ_SIZE};
use crate::heap::roots::RootSet;
use crate::heap::{Gc, HeapStats, Obj};

/// Collect after this many live allocations, until the adaptive policy
/// raises it.
const DEFAULT_GC_THRESHOLD: usize = 1000;

/// Mark-sweep collector. Every object is a separate system allocation;
/// objects never move. A collection marks the graph reachable from the
/// roots, then frees every live-set member the mark pass did not reach.
pub(crate) struct MarkSweepHeap {
    /// Collection trigger, in number of live allocations.
    gc_threshold: usize,
    /// Every allocation currently live, with its size for deallocation.
    live: Vec<(*mut Obj, usize)>,
    /// Addresses reached by the current mark pass.
    marked: HashSet<usize>,
    roots: RootSet,
    stats: HeapStats,
}

impl MarkSweepHeap {
    pub(crate) fn new() -> MarkSweepHeap {
        MarkSweepHeap {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            live: Vec::new(),
            marked: HashSet::new(),
            roots: RootSet::new(),
            stats: HeapStats::default(),
        }
    }

    /// Mark-sweep needs no space reservation: every allocation is its own
    /// system allocation, so any byte budget is trivially available.
    pub(crate) fn init(&mut self, _space_size: usize) {
    }

    pub(crate) fn allocate(&mut self, num_bytes: usize) -> *mut u8 {
        if self.live.len() >= self.gc_threshold {
            self.collect();
            // Most objects survived: raise the threshold so future cycles
            // amortize over more allocation work.
            if self.live.len() > self.gc_threshold / 2 {
                self.gc_threshold = self.live.len() * 2;
                debug!("gc threshold -> {}", self.gc_threshold);
            }
        }

        let n = cmp::max(aligned(num_bytes), MIN_OBJ_SIZE);
        self.stats.num_allocated += 1;
        self.stats.bytes_allocated += n as u64;

        let layout = Layout::from_size_align(n, ALIGN).unwrap();
        let p = unsafe { alloc::alloc_zeroed(layout) };
        if p.is_null() {
            alloc::handle_alloc_error(layout);
        }
        self.live.push((p as *mut Obj, n));
        p
    }

    /// Marks `obj` and everything reachable from it.
    fn mark(&mut self, obj: Gc<Obj>) {
        if obj.header.heap_tag() == HeapTag::Global {
            return;
        }
        if !self.marked.insert(obj.as_ptr() as usize) {
            return;
        }
        unsafe {
            visit_children(obj.as_ptr(), |slot| self.mark(*slot));
        }
    }

    pub(crate) fn collect(&mut self) {
        self.marked.clear();

        for i in 0..self.roots.len() {
            let slot = self.roots.slot_at(i);
            unsafe {
                if !(*slot).is_null() {
                    self.mark(*slot);
                }
            }
        }

        let before = self.live.len();
        let marked = &self.marked;
        self.live.retain(|&(p, n)| {
            if marked.contains(&(p as usize)) {
                true
            } else {
                unsafe {
                    alloc::dealloc(p as *mut u8, Layout::from_size_align_unchecked(n, ALIGN));
                }
                false
            }
        });

        self.stats.num_collections += 1;
        self.stats.num_live_objs = self.live.len();
        debug!(
            "collect #{}: {} freed, {} live",
            self.stats.num_collections,
            before - self.live.len(),
            self.live.len(),
        );
    }

    pub(crate) fn roots_mut(&mut self) -> &mut RootSet {
        &mut self.roots
    }

    pub(crate) fn stats(&self) -> HeapStats {
        let mut stats = self.stats;
        stats.num_live_objs = self.live.len();
        stats
    }

    /// Tears the heap down. The fast path leaves everything for the OS to
    /// reclaim at exit; the slow path frees every live allocation so leak
    /// checkers see a clean process.
    pub(crate) fn process_exit(&mut self, fast: bool) {
        if fast {
            return;
        }
        for &(p, n) in &self.live {
            unsafe {
                alloc::dealloc(p as *mut u8, Layout::from_size_align_unchecked(n, ALIGN));
            }
        }
        self.live.clear();
        self.marked.clear();
        self.roots.clear();
    }
}
