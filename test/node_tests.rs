extern crate limpet_rt;

use limpet_rt::heap;
use limpet_rt::{cast, is_a, maskbit, roots, TypeTagged};
use limpet_rt::{declare_node, declare_sum};
use limpet_rt::{str_equals0, str_from, Gc, Obj, Str};

declare_sum!(pub word_part {
    LITERAL = 1,
    VAR_SUB = 2,
});

declare_node! {
    /// word_part.Literal
    pub struct LiteralPart {
        pub token_id: i32,
        pub value: Gc<Str>,
    }
    tag = word_part::LITERAL;
}

declare_node! {
    /// word_part.VarSub
    pub struct VarSubPart {
        pub name: Gc<Str>,
        pub quoted: bool,
    }
    tag = word_part::VAR_SUB;
}

declare_node! {
    /// A node with no pointer fields at all.
    pub struct Span {
        pub start: i32,
        pub length: i32,
    }
    tag = 7;
}

declare_node! {
    /// A cons cell for building graphs, including cyclic ones.
    pub struct Pair {
        pub label: Gc<Str>,
        pub next: Gc<Obj>,
    }
    tag = 8;
}

#[test]
fn test_type_tag_stability() {
    heap::init(1 << 16);
    let mut node = LiteralPart::alloc(42, str_from("hi"));
    roots!(node);

    assert_eq!(LiteralPart::TYPE_TAG, word_part::LITERAL);
    assert!(is_a::<LiteralPart>(node.as_obj()));
    assert!(!is_a::<VarSubPart>(node.as_obj()));

    heap::collect();
    assert!(is_a::<LiteralPart>(node.as_obj()));
}

#[test]
fn test_guarded_cast() {
    heap::init(1 << 16);
    let mut node = VarSubPart::alloc(str_from("HOME"), true);
    roots!(node);

    let as_var = cast::<VarSubPart>(node.as_obj());
    assert!(as_var.is_some());
    assert!(str_equals0("HOME", as_var.unwrap().name));

    assert!(cast::<LiteralPart>(node.as_obj()).is_none());
    assert!(cast::<LiteralPart>(Gc::null()).is_none());
    assert!(!is_a::<VarSubPart>(Gc::null()));
}

#[test]
fn test_field_masks_name_pointer_slots() {
    // LiteralPart: token_id at offset 8 (no bit), value at offset 16
    assert_eq!(LiteralPart::field_mask(), maskbit(16));
    // VarSubPart: name at offset 8, quoted is not a pointer
    assert_eq!(VarSubPart::field_mask(), maskbit(8));
    // no pointers, no bits
    assert_eq!(Span::field_mask(), 0);
    // both fields of Pair are pointers
    assert_eq!(Pair::field_mask(), maskbit(8) | maskbit(16));
}

#[test]
fn test_node_fields_survive_collection() {
    heap::init(4096);
    let mut node = LiteralPart::alloc(7, str_from("payload"));
    roots!(node);

    // churn so the node and its string both relocate
    for i in 0..200 {
        let _ = str_from(&format!("garbage {}", i));
    }
    heap::collect();

    assert_eq!(node.token_id, 7);
    assert!(str_equals0("payload", node.value));
}

#[test]
fn test_node_graph_traced_through_masks() {
    heap::init(4096);
    let mut head = Gc::<Pair>::null();
    roots!(head);

    // head -> middle -> tail
    let mut tail = Pair::alloc(str_from("tail"), Gc::null());
    roots!(tail);
    let mut middle = Pair::alloc(str_from("middle"), tail.as_obj());
    roots!(middle);
    head = Pair::alloc(str_from("head"), middle.as_obj());

    heap::collect();

    assert!(str_equals0("head", head.label));
    let mid = cast::<Pair>(head.next).unwrap();
    assert!(str_equals0("middle", mid.label));
    let end = cast::<Pair>(mid.next).unwrap();
    assert!(str_equals0("tail", end.label));
    assert!(end.next.is_null());
}

#[test]
fn test_cyclic_graph_does_not_hang_collector() {
    heap::init(4096);
    let mut a = Pair::alloc(str_from("a"), Gc::null());
    roots!(a);
    let mut b = Pair::alloc(str_from("b"), a.as_obj());
    roots!(b);
    unsafe {
        a.as_mut().next = b.as_obj();
    }

    heap::collect();
    heap::collect();

    assert!(str_equals0("a", a.label));
    assert!(str_equals0("b", b.label));
    // the cycle is intact and both links were rewritten consistently
    let b_via_a = cast::<Pair>(a.next).unwrap();
    assert!(str_equals0("b", b_via_a.label));
    assert_eq!(b_via_a, b);
    let a_via_b = cast::<Pair>(b.next).unwrap();
    assert_eq!(a_via_b, a);
}

#[test]
fn test_unreachable_nodes_are_reclaimed() {
    heap::init(1 << 16);
    let mut keep = Span::alloc(1, 2);
    roots!(keep);

    heap::collect();
    let baseline = heap::stats().num_live_objs;

    for i in 0..1000 {
        let _ = LiteralPart::alloc(i, str_from("dead"));
    }
    heap::collect();

    assert_eq!(heap::stats().num_live_objs, baseline);
    assert_eq!(keep.start, 1);
    assert_eq!(keep.length, 2);
}
