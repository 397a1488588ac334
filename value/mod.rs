//! The object model: strings, lists, dicts, tuples, sum-type nodes, and the
//! free-function surface transpiled code calls into.

mod dict;
mod funcs;
mod list;
mod node;
mod str;
mod tuple;

use core::cmp::Ordering;

use crate::heap::{Gc, Obj};

pub use self::dict::{Dict, DictIter, DELETED_ENTRY, EMPTY_ENTRY};
pub use self::list::{List, ListIter, ReverseListIter, Slab};
pub use self::str::{empty_str, str_from, str_from_bytes, Str, StrIter, STR_HEADER_SIZE};
pub use self::tuple::{Tuple2, Tuple3, Tuple4};

pub use self::funcs::{chr, dict_contains, int_cmp, len, list_contains, ord, repr, sorted};
pub use self::funcs::{str_cmp, str_concat, str_concat3, str_contains, str_equals, str_equals0,
                      str_of_float, str_of_int, str_repeat, to_float, to_int};

/// A value that can occupy a storage-slab slot: a primitive or a managed
/// pointer. The collector treats a slab of managed items as `Scanned` and a
/// slab of primitives as `Opaque`.
///
/// # Safety
///
/// `MANAGED` must be truthful: claiming it for a non-pointer type makes the
/// collector chase integers.
pub unsafe trait SlabItem: Copy {
    /// Whether slab slots of this type hold managed pointers.
    const MANAGED: bool;

    /// The zero value written into cleared slots, so the collector sees no
    /// stale pointers.
    fn null() -> Self;

    /// The root-set view of a slot holding this item: `Some` for managed
    /// items, `None` for primitives.
    fn as_root(slot: *mut Self) -> Option<*mut Gc<Obj>>;
}

macro_rules! primitive_slab_item {
    ($($ty:ty => $zero:expr),+ $(,)?) => {
        $(
            unsafe impl SlabItem for $ty {
                const MANAGED: bool = false;

                #[inline]
                fn null() -> $ty {
                    $zero
                }

                #[inline]
                fn as_root(_slot: *mut $ty) -> Option<*mut Gc<Obj>> {
                    None
                }
            }
        )+
    };
}

primitive_slab_item! {
    bool => false,
    u8 => 0,
    u16 => 0,
    i32 => 0,
    i64 => 0,
    f64 => 0.0,
}

unsafe impl<T> SlabItem for Gc<T> {
    const MANAGED: bool = true;

    #[inline]
    fn null() -> Gc<T> {
        Gc::null()
    }

    #[inline]
    fn as_root(slot: *mut Gc<T>) -> Option<*mut Gc<Obj>> {
        Some(slot as *mut Gc<Obj>)
    }
}

/// Type-appropriate equality for container membership and dict keys:
/// bytewise for strings, value equality for primitives.
pub trait ItemEq: SlabItem {
    fn item_eq(a: Self, b: Self) -> bool;
}

macro_rules! primitive_item_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ItemEq for $ty {
                #[inline]
                fn item_eq(a: $ty, b: $ty) -> bool {
                    a == b
                }
            }
        )+
    };
}

primitive_item_eq!(bool, u8, u16, i32, i64);

impl ItemEq for Gc<Str> {
    #[inline]
    fn item_eq(a: Gc<Str>, b: Gc<Str>) -> bool {
        str_equals(a, b)
    }
}

/// Ordering for `sort()`: integers and floats numerically, strings
/// lexicographically by byte with length as tiebreaker.
pub trait ItemOrd: SlabItem {
    fn item_cmp(a: Self, b: Self) -> Ordering;
}

macro_rules! primitive_item_ord {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ItemOrd for $ty {
                #[inline]
                fn item_cmp(a: $ty, b: $ty) -> Ordering {
                    a.cmp(&b)
                }
            }
        )+
    };
}

primitive_item_ord!(u8, u16, i32, i64);

impl ItemOrd for f64 {
    #[inline]
    fn item_cmp(a: f64, b: f64) -> Ordering {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}

impl ItemOrd for Gc<Str> {
    #[inline]
    fn item_cmp(a: Gc<Str>, b: Gc<Str>) -> Ordering {
        str_cmp(a, b)
    }
}

/// Length in elements (list, dict) or bytes (string); implemented by every
/// container so `len()` is polymorphic.
pub trait Len {
    fn len_of(&self) -> i32;
}
