use core::marker::PhantomData;
use core::mem;
use core::ptr;

use memoffset::offset_of;

use crate::error::Error;
use crate::heap;
use crate::heap::{maskbit, Gc, ItemRoot, ObjHeader};
use crate::roots;
use crate::value::{ItemEq, Len, List, Slab, SlabItem};

/// Index-slab state: the slot has never held an entry; terminates probing.
pub const EMPTY_ENTRY: i32 = -1;

/// Index-slab state: the slot held an entry that was removed; probing skips
/// it.
pub const DELETED_ENTRY: i32 = -2;

/// Capacity rounding leaves room for this many header words in the slab's
/// power-of-two footprint.
const CAPACITY_ADJUST: i32 = 2;

#[inline]
fn round_capacity(n: i32) -> i32 {
    ((n + CAPACITY_ADJUST) as u32).next_power_of_two() as i32 - CAPACITY_ADJUST
}

/// An insertion-ordered map over three parallel slabs sharing one capacity:
/// an index slab of per-slot states, a dense keys slab, and a dense values
/// slab. Lookup is a linear probe over the index slab; a hash probe is a
/// drop-in replacement satisfying the same slot-state invariants.
#[repr(C)]
pub struct Dict<K: SlabItem, V: SlabItem> {
    header: ObjHeader,
    len: i32,
    capacity: i32,
    index: Gc<Slab<i32>>,
    keys: Gc<Slab<K>>,
    values: Gc<Slab<V>>,
}

impl<K: SlabItem, V: SlabItem> Dict<K, V> {
    fn field_mask() -> u16 {
        maskbit(offset_of!(Dict<K, V>, index))
            | maskbit(offset_of!(Dict<K, V>, keys))
            | maskbit(offset_of!(Dict<K, V>, values))
    }

    /// New empty dict; the first insertion allocates the slabs.
    pub fn new() -> Gc<Dict<K, V>> {
        let p = heap::allocate(mem::size_of::<Dict<K, V>>()) as *mut Dict<K, V>;
        unsafe {
            // len, capacity, and the slab pointers are already zero
            (*p).header = ObjHeader::fixed(Self::field_mask(), mem::size_of::<Dict<K, V>>());
            (*p).index = Gc::null();
            (*p).keys = Gc::null();
            (*p).values = Gc::null();
        }
        Gc::from_raw(p)
    }

    #[inline]
    pub fn len(&self) -> i32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K: SlabItem, V: SlabItem> Len for Dict<K, V> {
    #[inline]
    fn len_of(&self) -> i32 {
        self.len
    }
}

impl<K: SlabItem + ItemEq, V: SlabItem> Gc<Dict<K, V>> {
    #[inline]
    pub fn len(self) -> i32 {
        (*self).len
    }

    #[inline]
    fn index_at(self, pos: i32) -> i32 {
        unsafe { *self.index.items_ptr().add(pos as usize) }
    }

    #[inline]
    fn key_at(self, pos: i32) -> K {
        unsafe { *self.keys.items_ptr().add(pos as usize) }
    }

    #[inline]
    fn value_at(self, pos: i32) -> V {
        unsafe { *self.values.items_ptr().add(pos as usize) }
    }

    /// Linear probe. Returns `(found, free)`: `found` is the position of
    /// `key` or -1; `free` is the first reusable slot (a tombstone, or the
    /// empty slot that terminated the scan) or -1 when the table has none.
    fn probe(self, key: K) -> (i32, i32) {
        let mut first_free = -1;
        for pos in 0..(*self).capacity {
            let special = self.index_at(pos);
            if special == DELETED_ENTRY {
                if first_free < 0 {
                    first_free = pos;
                }
                continue;
            }
            if special == EMPTY_ENTRY {
                return (-1, if first_free >= 0 { first_free } else { pos });
            }
            if K::item_eq(self.key_at(pos), key) {
                return (pos, pos);
            }
        }
        (-1, first_free)
    }

    /// Position of `key`, or -1.
    pub(crate) fn position_of_key(self, key: K) -> i32 {
        self.probe(key).0
    }

    /// `d[k]`, or KeyError.
    pub fn index(self, key: K) -> Result<V, Error> {
        let pos = self.position_of_key(key);
        if pos < 0 {
            return Err(Error::Key);
        }
        Ok(self.value_at(pos))
    }

    /// `d.get(k)`: the value, or the null sentinel of `V`.
    pub fn get(self, key: K) -> V {
        let pos = self.position_of_key(key);
        if pos < 0 {
            return V::null();
        }
        self.value_at(pos)
    }

    /// `d.get(k, default)`.
    pub fn get_default(self, key: K, default: V) -> V {
        let pos = self.position_of_key(key);
        if pos < 0 {
            return default;
        }
        self.value_at(pos)
    }

    pub fn contains(self, key: K) -> bool {
        self.position_of_key(key) >= 0
    }

    /// Rebuilds the three slabs in lockstep with capacity for at least `n`
    /// entries, compacting live entries in iteration order.
    pub fn reserve(self, n: i32) {
        let mut this = self;
        let mut new_index = Gc::<Slab<i32>>::null();
        let mut new_keys = Gc::<Slab<K>>::null();
        let mut new_values = Gc::<Slab<V>>::null();
        roots!(this, new_index, new_keys, new_values);

        if this.capacity >= n {
            return;
        }
        let new_cap = round_capacity(n);

        new_index = Slab::alloc(new_cap);
        unsafe {
            // the linear probe needs every unused slot to terminate a scan
            for i in 0..new_cap {
                *new_index.items_ptr().add(i as usize) = EMPTY_ENTRY;
            }
        }
        new_keys = Slab::alloc(new_cap);
        new_values = Slab::alloc(new_cap);

        unsafe {
            let mut j = 0usize;
            for pos in 0..this.capacity {
                if this.index_at(pos) == 0 {
                    *new_index.items_ptr().add(j) = 0;
                    *new_keys.items_ptr().add(j) = this.key_at(pos);
                    *new_values.items_ptr().add(j) = this.value_at(pos);
                    j += 1;
                }
            }
            this.as_mut().index = new_index;
            this.as_mut().keys = new_keys;
            this.as_mut().values = new_values;
            this.as_mut().capacity = new_cap;
        }
    }

    /// Inserts or overwrites; may reserve.
    pub fn set(self, key: K, value: V) {
        let mut this = self;
        let mut key = key;
        let mut value = value;
        roots!(this);
        let _key_root = ItemRoot::new(&mut key);
        let _value_root = ItemRoot::new(&mut value);

        let (found, mut free) = this.probe(key);
        if found >= 0 {
            // existing key: overwrite in place, order preserved
            unsafe {
                *this.values.items_ptr().add(found as usize) = value;
            }
            return;
        }
        if free < 0 {
            this.reserve(this.len + 1);
            let (_, free2) = this.probe(key);
            free = free2;
        }
        debug_assert!(free >= 0);
        unsafe {
            *this.index.items_ptr().add(free as usize) = 0;
            *this.keys.items_ptr().add(free as usize) = key;
            *this.values.items_ptr().add(free as usize) = value;
            this.as_mut().len += 1;
        }
    }

    /// Removes `key`, writing a tombstone and zeroing the key and value
    /// slots so the collector sees no stale pointers. No-op if missing.
    pub fn remove(self, key: K) {
        let pos = self.position_of_key(key);
        if pos < 0 {
            return;
        }
        unsafe {
            *self.index.items_ptr().add(pos as usize) = DELETED_ENTRY;
            *self.keys.items_ptr().add(pos as usize) = K::null();
            *self.values.items_ptr().add(pos as usize) = V::null();
            self.as_mut().len -= 1;
        }
    }

    /// New list of the live keys, in iteration order.
    pub fn keys(self) -> Gc<List<K>> {
        let mut this = self;
        let mut result = Gc::<List<K>>::null();
        roots!(this, result);
        result = List::new();
        for pos in 0..this.capacity {
            if this.index_at(pos) == 0 {
                result.append(this.key_at(pos));
            }
        }
        result
    }

    /// New list of the live values, in iteration order.
    pub fn values(self) -> Gc<List<V>> {
        let mut this = self;
        let mut result = Gc::<List<V>>::null();
        roots!(this, result);
        result = List::new();
        for pos in 0..this.capacity {
            if this.index_at(pos) == 0 {
                result.append(this.value_at(pos));
            }
        }
        result
    }

    /// Resets every index entry to empty, zeroes the key and value slabs,
    /// and sets the length to 0. Capacity is retained.
    pub fn clear(self) {
        let this = self;
        unsafe {
            for pos in 0..this.capacity {
                *this.index.items_ptr().add(pos as usize) = EMPTY_ENTRY;
            }
            if !this.keys.is_null() {
                ptr::write_bytes(this.keys.items_ptr(), 0, this.capacity as usize);
                ptr::write_bytes(this.values.items_ptr(), 0, this.capacity as usize);
            }
            this.as_mut().len = 0;
        }
    }

    /// Iterates `(key, value)` pairs in slab order, skipping empty and
    /// deleted slots; the iterator roots the dict for its lifetime.
    pub fn iter(self) -> DictIter<K, V> {
        DictIter {
            root: heap::push_root_value(self.as_obj()),
            pos: 0,
            _marker: PhantomData,
        }
    }
}

/// Iterator over a dict's live entries. Registers its target as a collector
/// root so allocation inside the loop body cannot invalidate traversal.
pub struct DictIter<K: SlabItem, V: SlabItem> {
    root: usize,
    pos: i32,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: SlabItem + ItemEq, V: SlabItem> Iterator for DictIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let dict: Gc<Dict<K, V>> = heap::root_value(self.root).retag();
        loop {
            if self.pos >= dict.capacity {
                return None;
            }
            match dict.index_at(self.pos) {
                DELETED_ENTRY => {
                    self.pos += 1;
                }
                EMPTY_ENTRY => return None,
                _ => break,
            }
        }
        let pair = (dict.key_at(self.pos), dict.value_at(self.pos));
        self.pos += 1;
        Some(pair)
    }
}

impl<K: SlabItem, V: SlabItem> Drop for DictIter<K, V> {
    fn drop(&mut self) {
        heap::pop_root();
    }
}
