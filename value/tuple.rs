use core::mem;
use core::ptr;

use memoffset::offset_of;

use crate::heap;
use crate::heap::{maskbit, Gc, ItemRoot, ObjHeader};
use crate::value::SlabItem;

/// Mask contribution of one field: its bit when the type is managed,
/// nothing otherwise.
#[inline]
fn mask_for<T: SlabItem>(offset: usize) -> u16 {
    if T::MANAGED {
        maskbit(offset)
    } else {
        0
    }
}

/// A pair: header plus two value slots, with the field mask computed from
/// whichever slot types are managed pointers.
#[repr(C)]
pub struct Tuple2<A: SlabItem, B: SlabItem> {
    header: ObjHeader,
    a: A,
    b: B,
}

impl<A: SlabItem, B: SlabItem> Tuple2<A, B> {
    fn field_mask() -> u16 {
        mask_for::<A>(offset_of!(Tuple2<A, B>, a)) | mask_for::<B>(offset_of!(Tuple2<A, B>, b))
    }

    pub fn alloc(a: A, b: B) -> Gc<Tuple2<A, B>> {
        let mut a = a;
        let mut b = b;
        let _root_a = ItemRoot::new(&mut a);
        let _root_b = ItemRoot::new(&mut b);
        let obj_len = mem::size_of::<Tuple2<A, B>>();
        let p = heap::allocate(obj_len) as *mut Tuple2<A, B>;
        unsafe {
            (*p).header = ObjHeader::fixed(Self::field_mask(), obj_len);
            ptr::addr_of_mut!((*p).a).write(a);
            ptr::addr_of_mut!((*p).b).write(b);
        }
        Gc::from_raw(p)
    }
}

impl<A: SlabItem, B: SlabItem> Gc<Tuple2<A, B>> {
    #[inline]
    pub fn at0(self) -> A {
        (*self).a
    }

    #[inline]
    pub fn at1(self) -> B {
        (*self).b
    }
}

/// A triple; see [`Tuple2`].
#[repr(C)]
pub struct Tuple3<A: SlabItem, B: SlabItem, C: SlabItem> {
    header: ObjHeader,
    a: A,
    b: B,
    c: C,
}

impl<A: SlabItem, B: SlabItem, C: SlabItem> Tuple3<A, B, C> {
    fn field_mask() -> u16 {
        mask_for::<A>(offset_of!(Tuple3<A, B, C>, a))
            | mask_for::<B>(offset_of!(Tuple3<A, B, C>, b))
            | mask_for::<C>(offset_of!(Tuple3<A, B, C>, c))
    }

    pub fn alloc(a: A, b: B, c: C) -> Gc<Tuple3<A, B, C>> {
        let mut a = a;
        let mut b = b;
        let mut c = c;
        let _root_a = ItemRoot::new(&mut a);
        let _root_b = ItemRoot::new(&mut b);
        let _root_c = ItemRoot::new(&mut c);
        let obj_len = mem::size_of::<Tuple3<A, B, C>>();
        let p = heap::allocate(obj_len) as *mut Tuple3<A, B, C>;
        unsafe {
            (*p).header = ObjHeader::fixed(Self::field_mask(), obj_len);
            ptr::addr_of_mut!((*p).a).write(a);
            ptr::addr_of_mut!((*p).b).write(b);
            ptr::addr_of_mut!((*p).c).write(c);
        }
        Gc::from_raw(p)
    }
}

impl<A: SlabItem, B: SlabItem, C: SlabItem> Gc<Tuple3<A, B, C>> {
    #[inline]
    pub fn at0(self) -> A {
        (*self).a
    }

    #[inline]
    pub fn at1(self) -> B {
        (*self).b
    }

    #[inline]
    pub fn at2(self) -> C {
        (*self).c
    }
}

/// A quadruple; see [`Tuple2`].
#[repr(C)]
pub struct Tuple4<A: SlabItem, B: SlabItem, C: SlabItem, D: SlabItem> {
    header: ObjHeader,
    a: A,
    b: B,
    c: C,
    d: D,
}

impl<A: SlabItem, B: SlabItem, C: SlabItem, D: SlabItem> Tuple4<A, B, C, D> {
    fn field_mask() -> u16 {
        mask_for::<A>(offset_of!(Tuple4<A, B, C, D>, a))
            | mask_for::<B>(offset_of!(Tuple4<A, B, C, D>, b))
            | mask_for::<C>(offset_of!(Tuple4<A, B, C, D>, c))
            | mask_for::<D>(offset_of!(Tuple4<A, B, C, D>, d))
    }

    pub fn alloc(a: A, b: B, c: C, d: D) -> Gc<Tuple4<A, B, C, D>> {
        let mut a = a;
        let mut b = b;
        let mut c = c;
        let mut d = d;
        let _root_a = ItemRoot::new(&mut a);
        let _root_b = ItemRoot::new(&mut b);
        let _root_c = ItemRoot::new(&mut c);
        let _root_d = ItemRoot::new(&mut d);
        let obj_len = mem::size_of::<Tuple4<A, B, C, D>>();
        let p = heap::allocate(obj_len) as *mut Tuple4<A, B, C, D>;
        unsafe {
            (*p).header = ObjHeader::fixed(Self::field_mask(), obj_len);
            ptr::addr_of_mut!((*p).a).write(a);
            ptr::addr_of_mut!((*p).b).write(b);
            ptr::addr_of_mut!((*p).c).write(c);
            ptr::addr_of_mut!((*p).d).write(d);
        }
        Gc::from_raw(p)
    }
}

impl<A: SlabItem, B: SlabItem, C: SlabItem, D: SlabItem> Gc<Tuple4<A, B, C, D>> {
    #[inline]
    pub fn at0(self) -> A {
        (*self).a
    }

    #[inline]
    pub fn at1(self) -> B {
        (*self).b
    }

    #[inline]
    pub fn at2(self) -> C {
        (*self).c
    }

    #[inline]
    pub fn at3(self) -> D {
        (*self).d
    }
}
