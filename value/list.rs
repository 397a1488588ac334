use core::cmp;
use core::marker::PhantomData;
use core::mem;
use core::ptr;
use core::slice;

use memoffset::offset_of;

use crate::error::Error;
use crate::heap;
use crate::heap::{maskbit, Gc, ItemRoot, ObjHeader, HEADER_SIZE};
use crate::roots;
use crate::value::{ItemEq, ItemOrd, Len, SlabItem};

/// Element count a first slab starts with.
const INITIAL_CAPACITY: i32 = 4;

/// A separately allocated homogeneous storage array. `Opaque` when `T` is a
/// primitive, `Scanned` when `T` is a managed pointer; either way the
/// collector derives the slot count from `obj_len`.
#[repr(C)]
pub struct Slab<T: SlabItem> {
    header: ObjHeader,
    items: [T; 0],
}

impl<T: SlabItem> Slab<T> {
    /// Zero-initialized slab with room for `capacity` elements.
    pub(crate) fn alloc(capacity: i32) -> Gc<Slab<T>> {
        let obj_len = HEADER_SIZE + capacity as usize * mem::size_of::<T>();
        let p = heap::allocate(obj_len) as *mut Slab<T>;
        unsafe {
            (*p).header = if T::MANAGED {
                ObjHeader::scanned(obj_len)
            } else {
                ObjHeader::opaque(obj_len)
            };
        }
        Gc::from_raw(p)
    }
}

impl<T: SlabItem> Gc<Slab<T>> {
    /// Base of the element array. Derived from the raw object pointer, not
    /// a shared borrow, because slab slots are mutated in place.
    #[inline]
    pub(crate) fn items_ptr(self) -> *mut T {
        unsafe { ptr::addr_of_mut!((*self.as_ptr()).items) as *mut T }
    }
}

/// A growable array: fixed-size header pointing at a storage slab that is
/// reallocated on growth. The slab pointer changes across any call that can
/// allocate; callers must not cache raw element pointers across allocation
/// points.
#[repr(C)]
pub struct List<T: SlabItem> {
    header: ObjHeader,
    len: i32,
    capacity: i32,
    slab: Gc<Slab<T>>,
}

impl<T: SlabItem> List<T> {
    fn field_mask() -> u16 {
        maskbit(offset_of!(List<T>, slab))
    }

    /// New empty list; the first append allocates the slab.
    pub fn new() -> Gc<List<T>> {
        let p = heap::allocate(mem::size_of::<List<T>>()) as *mut List<T>;
        unsafe {
            // len, capacity, and slab are already zero
            (*p).header = ObjHeader::fixed(Self::field_mask(), mem::size_of::<List<T>>());
            (*p).slab = Gc::null();
        }
        Gc::from_raw(p)
    }

    /// New list holding a copy of `items`. The items are staged in a
    /// rooted scratch buffer, so managed values stay current across the
    /// allocations construction performs.
    pub fn of(items: &[T]) -> Gc<List<T>> {
        let mut staged = items.to_vec();
        let _staged_roots: Vec<ItemRoot> =
            staged.iter_mut().map(|slot| ItemRoot::new(slot)).collect();
        let mut result = Gc::<List<T>>::null();
        roots!(result);
        result = List::new();
        if staged.is_empty() {
            return result;
        }
        result.reserve_for(staged.len() as i32);
        unsafe {
            ptr::copy_nonoverlapping(staged.as_ptr(), result.slab.items_ptr(), staged.len());
            result.as_mut().len = staged.len() as i32;
        }
        result
    }

    /// `[item] * times`; non-positive counts yield an empty list.
    pub fn repeat(item: T, times: i32) -> Gc<List<T>> {
        let mut item = item;
        let _item_root = ItemRoot::new(&mut item);
        let mut result = Gc::<List<T>>::null();
        roots!(result);
        result = List::new();
        if times <= 0 {
            return result;
        }
        result.reserve_for(times);
        unsafe {
            for i in 0..times {
                *result.slab.items_ptr().add(i as usize) = item;
            }
            result.as_mut().len = times;
        }
        result
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

impl<T: SlabItem> Len for List<T> {
    #[inline]
    fn len_of(&self) -> i32 {
        self.len
    }
}

impl<T: SlabItem> Gc<List<T>> {
    #[inline]
    pub fn len(self) -> i32 {
        (*self).len
    }

    /// Element at `i` without bounds or wrap handling; `i` must be in
    /// range.
    #[inline]
    pub(crate) fn get_at(self, i: i32) -> T {
        debug_assert!(0 <= i && i < self.len);
        unsafe { *self.slab.items_ptr().add(i as usize) }
    }

    fn wrap_index(self, i: i32) -> Result<i32, Error> {
        let n = (*self).len;
        let i = if i < 0 { i + n } else { i };
        if i < 0 || i >= n {
            return Err(Error::Index);
        }
        Ok(i)
    }

    /// `l[i]` with negative wrap, or IndexError.
    pub fn index(self, i: i32) -> Result<T, Error> {
        let i = self.wrap_index(i)?;
        Ok(self.get_at(i))
    }

    /// `l[i] = v` with negative wrap, or IndexError.
    pub fn set(self, i: i32, value: T) -> Result<(), Error> {
        let i = self.wrap_index(i)?;
        unsafe {
            *self.slab.items_ptr().add(i as usize) = value;
        }
        Ok(())
    }

    /// Grows the slab to hold at least `n` elements, copying the contents
    /// and swapping the slab pointer.
    pub(crate) fn reserve_for(self, n: i32) {
        let mut this = self;
        roots!(this);
        if this.capacity >= n {
            return;
        }
        let new_cap = cmp::max(cmp::max(INITIAL_CAPACITY, this.capacity * 2), n);
        let new_slab = Slab::<T>::alloc(new_cap);
        unsafe {
            let old_slab = this.slab;
            if !old_slab.is_null() {
                ptr::copy_nonoverlapping(old_slab.items_ptr(), new_slab.items_ptr(),
                                         this.len as usize);
            }
            this.as_mut().slab = new_slab;
            this.as_mut().capacity = new_cap;
        }
    }

    /// Appends one element; amortized O(1) via slab doubling.
    pub fn append(self, item: T) {
        let mut this = self;
        let mut item = item;
        roots!(this);
        let _item_root = ItemRoot::new(&mut item);
        if this.len == this.capacity {
            this.reserve_for(this.len + 1);
        }
        unsafe {
            *this.slab.items_ptr().add(this.len as usize) = item;
            this.as_mut().len += 1;
        }
    }

    /// Appends every element of `other`.
    pub fn extend(self, other: Gc<List<T>>) {
        let mut this = self;
        let mut other = other;
        roots!(this, other);
        let n = other.len;
        if n == 0 {
            return;
        }
        this.reserve_for(this.len + n);
        unsafe {
            ptr::copy_nonoverlapping(
                other.slab.items_ptr(),
                this.slab.items_ptr().add(this.len as usize),
                n as usize,
            );
            this.as_mut().len += n;
        }
    }

    /// Removes and returns the last element, or IndexError when empty.
    pub fn pop(self) -> Result<T, Error> {
        self.pop_at(-1)
    }

    /// Removes and returns the element at `i`, shifting the tail down.
    pub fn pop_at(self, i: i32) -> Result<T, Error> {
        let i = self.wrap_index(i)?;
        let n = (*self).len;
        unsafe {
            let items = self.slab.items_ptr();
            let result = *items.add(i as usize);
            ptr::copy(items.add(i as usize + 1), items.add(i as usize), (n - i - 1) as usize);
            // zero the vacated slot so the collector sees no stale pointer
            *items.add(n as usize - 1) = T::null();
            self.as_mut().len = n - 1;
            Ok(result)
        }
    }

    /// Reverses in place.
    pub fn reverse(self) {
        if (*self).len == 0 {
            return;
        }
        unsafe {
            slice::from_raw_parts_mut(self.slab.items_ptr(), (*self).len as usize).reverse();
        }
    }

    /// Sorts in place; stability is not guaranteed.
    pub fn sort(self)
    where
        T: ItemOrd,
    {
        if (*self).len == 0 {
            return;
        }
        unsafe {
            slice::from_raw_parts_mut(self.slab.items_ptr(), (*self).len as usize)
                .sort_unstable_by(|a, b| T::item_cmp(*a, *b));
        }
    }

    /// Membership test with type-appropriate equality.
    pub fn contains(self, needle: T) -> bool
    where
        T: ItemEq,
    {
        let n = (*self).len;
        for i in 0..n {
            if T::item_eq(self.get_at(i), needle) {
                return true;
            }
        }
        false
    }

    /// Iterates in insertion order; the iterator roots the list for its
    /// lifetime, so the loop body may allocate.
    pub fn iter(self) -> ListIter<T> {
        ListIter {
            root: heap::push_root_value(self.as_obj()),
            i: 0,
            _marker: PhantomData,
        }
    }

    /// Iterates in reverse order.
    pub fn iter_rev(self) -> ReverseListIter<T> {
        ReverseListIter {
            root: heap::push_root_value(self.as_obj()),
            i: (*self).len - 1,
            _marker: PhantomData,
        }
    }
}

/// Forward iterator over a list. Registers the list as a collector root so
/// the slab pointer stays current if a collection moves it mid-loop.
/// Iterators pop their root on drop and must be dropped in reverse creation
/// order, which every loop does naturally.
pub struct ListIter<T: SlabItem> {
    root: usize,
    i: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SlabItem> Iterator for ListIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let list: Gc<List<T>> = heap::root_value(self.root).retag();
        if self.i >= list.len() {
            return None;
        }
        let value = list.get_at(self.i);
        self.i += 1;
        Some(value)
    }
}

impl<T: SlabItem> Drop for ListIter<T> {
    fn drop(&mut self) {
        heap::pop_root();
    }
}

/// Reverse iterator over a list; roots its target like [`ListIter`].
pub struct ReverseListIter<T: SlabItem> {
    root: usize,
    i: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SlabItem> Iterator for ReverseListIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.i < 0 {
            return None;
        }
        let list: Gc<List<T>> = heap::root_value(self.root).retag();
        let value = list.get_at(self.i);
        self.i -= 1;
        Some(value)
    }
}

impl<T: SlabItem> Drop for ReverseListIter<T> {
    fn drop(&mut self) {
        heap::pop_root();
    }
}
