//! Sum-type node support for schema-generated variants.
//!
//! Each schema product becomes a fixed-size struct beginning with the
//! object header, declared through [`declare_node!`]. Variants of one sum
//! share no base type; they are layout-compatible through the header alone
//! and are discriminated by its `type_tag`. Dispatch is a `match` on the
//! tag or a [`cast`](crate::cast) that checks it and returns `None` on
//! mismatch.
//!
//! The field mask is computed from the offsets of the managed-pointer
//! fields, so the collector traces any node with no per-type code:
//!
//! ```ignore
//! declare_sum!(pub expr { CONST = 1, BINARY = 2 });
//!
//! declare_node! {
//!     /// expr.Const
//!     pub struct ExprConst {
//!         pub value: i64,
//!     }
//!     tag = expr::CONST;
//! }
//!
//! declare_node! {
//!     /// expr.Binary
//!     pub struct ExprBinary {
//!         pub op: Gc<Str>,
//!         pub left: Gc<Obj>,
//!         pub right: Gc<Obj>,
//!     }
//!     tag = expr::BINARY;
//! }
//!
//! let node = ExprConst::alloc(42);
//! assert!(is_a::<ExprConst>(node.as_obj()));
//! assert!(cast::<ExprBinary>(node.as_obj()).is_none());
//! ```

/// Declares the tag constants for one sum's variants.
#[macro_export]
macro_rules! declare_sum {
    ($vis:vis $name:ident { $( $variant:ident = $tag:expr ),+ $(,)? }) => {
        $vis mod $name {
            $( pub const $variant: u8 = $tag; )+
        }
    };
}

/// Declares one sum-type product: a `#[repr(C)]` struct beginning with the
/// object header, a [`TypeTagged`](crate::TypeTagged) impl for the `tag`
/// clause, a field mask computed from the managed-pointer field offsets,
/// and an `alloc` constructor that roots its arguments across the
/// allocation.
///
/// Every field type must implement [`SlabItem`](crate::SlabItem); at most
/// 16 fields.
#[macro_export]
macro_rules! declare_node {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $( $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
        tag = $tag:expr;
    ) => {
        $(#[$attr])*
        #[repr(C)]
        $vis struct $name {
            header: $crate::ObjHeader,
            $( $fvis $field : $fty, )*
        }

        impl $crate::TypeTagged for $name {
            const TYPE_TAG: u8 = $tag;
        }

        impl $name {
            /// Field mask naming the managed-pointer slots of this layout.
            pub fn field_mask() -> u16 {
                0 $( | (if <$fty as $crate::SlabItem>::MANAGED {
                    $crate::maskbit($crate::memoffset::offset_of!($name, $field))
                } else {
                    0
                }) )*
            }

            /// Allocates and initializes a node of this variant.
            pub fn alloc( $( $field : $fty ),* ) -> $crate::Gc<$name> {
                $( let mut $field = $field; )*
                let _arg_roots: ::std::vec::Vec<$crate::heap::ItemRoot> = ::std::vec![
                    $( $crate::heap::ItemRoot::new(&mut $field) ),*
                ];
                let obj_len = ::core::mem::size_of::<$name>();
                let p = $crate::heap::allocate(obj_len) as *mut $name;
                unsafe {
                    ::core::ptr::addr_of_mut!((*p).header).write(
                        $crate::ObjHeader::fixed_tagged(
                            <$name as $crate::TypeTagged>::TYPE_TAG,
                            $name::field_mask(),
                            obj_len,
                        ),
                    );
                    $( ::core::ptr::addr_of_mut!((*p).$field).write($field); )*
                }
                $crate::Gc::from_raw(p)
            }
        }
    };
}
