use core::cmp;
use core::fmt;
use core::ops::Deref;
use core::ptr;

use crate::block::ALIGN;

/// Number of bytes in the object header; the first field of every object
/// starts at this offset.
pub const HEADER_SIZE: usize = 8;

/// Minimum size of a heap allocation. The moving collector repurposes the
/// first pointer-sized slot after the header for the forwarding address, so
/// no object may be smaller than header + one word.
pub const MIN_OBJ_SIZE: usize = HEADER_SIZE + ALIGN;

/// Maximum number of fields a fixed-size object may describe; one bit per
/// field in the 16-bit mask.
pub const MAX_FIELDS: usize = 16;

/// Sentinel `obj_len` for `Global` objects, which are never copied and so
/// never need a real length.
pub const NO_OBJ_LEN: u32 = 0x0ead_beef;

/// Field mask for types with no pointer fields.
pub const ZERO_MASK: u16 = 0;

/// How the collector treats an object. The values are odd so the tag byte
/// can never be confused with the low byte of an aligned pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HeapTag {
    /// Relocated; the first slot after the header holds the new address.
    Forwarded = 1,
    /// Process-lifetime object: neither copied nor scanned nor freed.
    Global = 3,
    /// Copied byte-for-byte, no children to trace.
    Opaque = 5,
    /// Heterogeneous layout; consult `field_mask` for pointer slots.
    FixedSize = 7,
    /// Homogeneous array of managed pointers; slot count derived from
    /// `obj_len`.
    Scanned = 9,
}

/// The 8-byte header that begins every heap-managed object.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct ObjHeader {
    /// One of the `HeapTag` values.
    pub heap_tag: u8,
    /// Sum-type discriminator for schema-generated variants; 0 for the
    /// built-in containers.
    pub type_tag: u8,
    /// Bit i set means the word at `HEADER_SIZE + i * 8` holds a managed
    /// pointer.
    pub field_mask: u16,
    /// Total size of the object in bytes, including header and inline
    /// payload, rounded to pointer alignment.
    pub obj_len: u32,
}

/// Every header records at least the forwarding minimum, matching what the
/// allocator hands out, so relocation can never clobber a neighbor.
#[inline]
fn header_len(obj_len: usize) -> u32 {
    cmp::max(crate::block::aligned(obj_len), MIN_OBJ_SIZE) as u32
}

impl ObjHeader {
    /// Header for an object copied whole with no child tracing.
    #[inline]
    pub fn opaque(obj_len: usize) -> ObjHeader {
        ObjHeader {
            heap_tag: HeapTag::Opaque as u8,
            type_tag: 0,
            field_mask: ZERO_MASK,
            obj_len: header_len(obj_len),
        }
    }

    /// Header for a homogeneous array of managed pointers.
    #[inline]
    pub fn scanned(obj_len: usize) -> ObjHeader {
        ObjHeader {
            heap_tag: HeapTag::Scanned as u8,
            type_tag: 0,
            field_mask: ZERO_MASK,
            obj_len: header_len(obj_len),
        }
    }

    /// Header for a fixed-size object whose pointer slots are named by
    /// `field_mask`.
    #[inline]
    pub fn fixed(field_mask: u16, obj_len: usize) -> ObjHeader {
        ObjHeader {
            heap_tag: HeapTag::FixedSize as u8,
            type_tag: 0,
            field_mask,
            obj_len: header_len(obj_len),
        }
    }

    /// Header for a sum-type variant: fixed-size with a discriminator.
    #[inline]
    pub fn fixed_tagged(type_tag: u8, field_mask: u16, obj_len: usize) -> ObjHeader {
        ObjHeader {
            heap_tag: HeapTag::FixedSize as u8,
            type_tag,
            field_mask,
            obj_len: header_len(obj_len),
        }
    }

    /// Header for a statically allocated, process-lifetime object.
    #[inline]
    pub const fn global() -> ObjHeader {
        ObjHeader {
            heap_tag: HeapTag::Global as u8,
            type_tag: 0,
            field_mask: ZERO_MASK,
            obj_len: NO_OBJ_LEN,
        }
    }

    /// Decodes the heap tag byte.
    #[inline]
    pub fn heap_tag(&self) -> HeapTag {
        match self.heap_tag {
            1 => HeapTag::Forwarded,
            3 => HeapTag::Global,
            5 => HeapTag::Opaque,
            7 => HeapTag::FixedSize,
            9 => HeapTag::Scanned,
            t => panic!("corrupt heap tag {}", t),
        }
    }
}

/// The untyped unit of garbage collection: any heap object viewed through
/// its header.
#[repr(C)]
pub struct Obj {
    pub header: ObjHeader,
}

/// A managed pointer: a copyable handle to a heap object. Shared and
/// non-owning; the object lives as long as some root transitively reaches
/// it. A `Gc` held in a local across an allocation point must be registered
/// with the root set (see [`StackRoots`](crate::heap::StackRoots)), because
/// the moving back-end rewrites rooted slots when it relocates objects.
#[repr(transparent)]
pub struct Gc<T> {
    ptr: *mut T,
}

impl<T> Clone for Gc<T> {
    #[inline]
    fn clone(&self) -> Gc<T> {
        *self
    }
}

impl<T> Copy for Gc<T> {
}

impl<T> Gc<T> {
    /// The null handle; the runtime's `None`-like sentinel.
    #[inline]
    pub const fn null() -> Gc<T> {
        Gc { ptr: ptr::null_mut() }
    }

    /// Constructs a handle from a raw object pointer.
    #[inline]
    pub const fn from_raw(ptr: *mut T) -> Gc<T> {
        Gc { ptr }
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.ptr.is_null()
    }

    /// Returns the current address of the object. Not stable across a
    /// collection under the moving back-end; never hash or store it.
    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.ptr
    }

    /// Views this handle as a handle to the untyped header.
    #[inline]
    pub fn as_obj(self) -> Gc<Obj> {
        Gc { ptr: self.ptr as *mut Obj }
    }

    /// Reinterprets the pointee type without a tag check.
    #[inline]
    pub(crate) fn retag<U>(self) -> Gc<U> {
        Gc { ptr: self.ptr as *mut U }
    }

    /// Returns a mutable reference to the object.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other reference to the object is live, and
    /// must not hold the reference across an allocation point: a collection
    /// may relocate the object.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn as_mut<'a>(self) -> &'a mut T {
        debug_assert!(!self.ptr.is_null());
        &mut *self.ptr
    }
}

impl<T> Deref for Gc<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        debug_assert!(!self.ptr.is_null());
        unsafe { &*self.ptr }
    }
}

impl<T> PartialEq for Gc<T> {
    /// Identity comparison by current address. Valid only between
    /// collection points.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Gc<T> {
}

impl<T> fmt::Debug for Gc<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

impl<T> fmt::Pointer for Gc<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

/// A sum-type variant with a compile-time discriminator stored in the
/// header's `type_tag`.
pub trait TypeTagged {
    const TYPE_TAG: u8;
}

/// Returns whether `obj` is the variant `T`. Null is no variant.
#[inline]
pub fn is_a<T: TypeTagged>(obj: Gc<Obj>) -> bool {
    !obj.is_null() && obj.header.type_tag == T::TYPE_TAG
}

/// Tag-checked downcast: returns the typed handle when the discriminator
/// matches, `None` otherwise.
#[inline]
pub fn cast<T: TypeTagged>(obj: Gc<Obj>) -> Option<Gc<T>> {
    if is_a::<T>(obj) {
        Some(obj.retag())
    } else {
        None
    }
}

/// Returns the field-mask bit for a pointer field at byte `offset` from the
/// start of the object.
#[inline]
pub const fn maskbit(offset: usize) -> u16 {
    1 << ((offset - HEADER_SIZE) / ALIGN)
}

/// Ghost layout for `FixedSize` objects: up to 16 word slots after the
/// header, of which only the slots named by the field mask are pointers.
#[repr(C)]
pub(crate) struct LayoutFixed {
    pub header: ObjHeader,
    pub children: [Gc<Obj>; MAX_FIELDS],
}

/// Ghost layout for `Forwarded` objects: the slot after the header holds
/// the post-move address.
#[repr(C)]
pub(crate) struct LayoutForwarded {
    pub header: ObjHeader,
    pub new_location: Gc<Obj>,
}

/// Calls `visit` with each non-null managed-pointer slot of `obj`, per its
/// heap tag: `FixedSize` consults the field mask, `Scanned` iterates every
/// word slot. Other tags have no children.
///
/// # Safety
///
/// `obj` must point to a valid object whose header and payload are
/// initialized.
pub(crate) unsafe fn visit_children(obj: *mut Obj, mut visit: impl FnMut(*mut Gc<Obj>)) {
    match (*obj).header.heap_tag() {
        HeapTag::FixedSize => {
            let fixed = obj as *mut LayoutFixed;
            let mask = (*fixed).header.field_mask;
            let children = ptr::addr_of_mut!((*fixed).children) as *mut Gc<Obj>;
            for i in 0..MAX_FIELDS {
                if mask & (1 << i) != 0 {
                    let slot = children.add(i);
                    if !(*slot).is_null() {
                        visit(slot);
                    }
                }
            }
        }
        HeapTag::Scanned => {
            let n = ((*obj).header.obj_len as usize - HEADER_SIZE) / ALIGN;
            let items = (obj as *mut u8).add(HEADER_SIZE) as *mut Gc<Obj>;
            for i in 0..n {
                let slot = items.add(i);
                // a List slab may hold nulls; a Dict slab is sparse
                if !(*slot).is_null() {
                    visit(slot);
                }
            }
        }
        // Opaque, Global, and Forwarded objects have no children to trace.
        _ => {}
    }
}
