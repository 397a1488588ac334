//! # Limpet Runtime
//!
//! The managed heap and object model that the Limpet shell's transpiled code
//! runs on: statically typed code over a dynamically collected heap.
//!
//! ## Design goals
//!
//! The runtime was designed to meet a strict set of requirements:
//!
//! __Uniform__
//! Every heap value begins with the same 8-byte header, so the collector can
//! walk any object graph without per-type code.
//!
//! __Precise__
//! Fixed-size objects carry a 16-bit field mask naming exactly which slots
//! hold managed pointers; homogeneous slabs are either opaque (no pointers)
//! or scanned (all pointers). There is no conservative scanning.
//!
//! __Rooted__
//! Local variables holding managed pointers are registered in a stack-scoped
//! root set, so a collection triggered at any allocation point preserves and
//! (under the moving back-end) rewrites them.
//!
//! __Interchangeable__
//! Two collector back-ends satisfy one contract: a semi-space Cheney copier
//! (default) and a mark-sweep collector (`marksweep` feature). Code written
//! against the rooting discipline runs unchanged on either.
//!
//! __Single-threaded__
//! The heap and root set are thread-local singletons. There is no locking,
//! no atomics, and no collection outside an allocation point.
//!
//! ## Terminology
//!
//! - _Managed pointer_: a [`Gc<T>`] handle to a heap object; shared,
//!   non-owning, valid as long as some root transitively reaches it.
//! - _Root_: a memory location the collector uses as an entry point for
//!   reachability.
//! - _Slab_: a separately allocated homogeneous array backing a `List` or
//!   `Dict`; opaque when its element type is primitive, scanned when it is
//!   a managed pointer.
//! - _Forwarding pointer_: the new address of a relocated object, written
//!   into its first slot and flagged by the `Forwarded` heap tag.
//!
//! ## Components
//!
//! __Physical memory model__
//! - [`block::Block`]: the address and size of a raw heap region.
//!
//! __Collector__
//! - [`heap`]: the object header, the allocator/collector back-ends, and
//!   the root set.
//!
//! __Object model__
//! - [`value::Str`]: byte string with a trailing NUL and an interned empty
//!   singleton.
//! - [`value::List`]: growable array over a storage slab.
//! - [`value::Dict`]: insertion-ordered map over three parallel slabs.
//! - [`value::Tuple2`] / [`value::Tuple3`] / [`value::Tuple4`]: small
//!   fixed-arity records.
//! - [`declare_node!`]: sum-type variant declaration with a computed field
//!   mask and a tag-checked cast.
//!
//! __Collaborator surface__
//! - [`io::BufWriter`] / [`io::FdWriter`]: buffered and fd-backed writers.
//! - [`io::BufLineReader`] / [`io::FdLineReader`]: line readers over a
//!   managed string or a file descriptor.

pub mod block;
pub mod heap;
pub mod value;
pub mod io;

mod error;

pub use crate::error::Error;
pub use crate::heap::{Gc, HeapTag, Obj, ObjHeader, StackRoots, TypeTagged};
pub use crate::heap::{cast, is_a, maskbit};
pub use crate::value::{Dict, List, Slab, SlabItem, Str, Tuple2, Tuple3, Tuple4};
pub use crate::value::{empty_str, str_from, str_from_bytes};
pub use crate::value::{chr, dict_contains, len, list_contains, ord, repr, sorted, str_cmp,
                       str_concat, str_concat3, str_contains, str_equals, str_equals0,
                       str_of_float, str_of_int, str_repeat, to_float, to_int};

// Re-exported for the `declare_node!` macro, which computes field masks from
// pointer field offsets.
pub use memoffset;
