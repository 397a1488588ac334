extern crate limpet_rt;

use limpet_rt::heap;
use limpet_rt::roots;
use limpet_rt::value::len;
use limpet_rt::{chr, ord, repr, str_concat, str_concat3, str_contains, str_equals, str_equals0,
                str_of_int, str_repeat, to_float, to_int};
use limpet_rt::{empty_str, str_from, str_from_bytes, Error, Gc, Str};

#[test]
fn test_slice_scenario() {
    heap::init(1 << 16);
    let mut s = str_from("abcdef");
    roots!(s);

    let t = s.slice(1, 5);
    assert_eq!(t.len(), 4);
    assert!(str_equals0("bcde", t));
}

#[test]
fn test_slice_negative_and_clamped() {
    heap::init(1 << 16);
    let mut s = str_from("abcdef");
    roots!(s);

    assert!(str_equals0("abcde", s.slice(0, -1)));
    assert!(str_equals0("f", s.slice(-1, 6)));
    assert!(str_equals0("abcdef", s.slice(-100, 100)));
    assert!(str_equals0("", s.slice(4, 2)));
    assert_eq!(s.slice(3, 3), empty_str());
    assert!(str_equals0("def", s.slice_from(3)));
    assert_eq!(s.slice_from(0), s);
}

#[test]
fn test_slice_composition() {
    heap::init(1 << 16);
    let mut s = str_from("hello world");
    roots!(s);

    let mut outer = s.slice(2, 9);
    roots!(outer);
    let mut composed = outer.slice(1, 4);
    roots!(composed);
    let direct = s.slice(3, 6);
    assert!(str_equals(composed, direct));
}

#[test]
fn test_string_round_trip() {
    heap::init(1 << 16);
    let mut s = str_from("round trip \x01 bytes");
    roots!(s);
    let copy = str_from_bytes(s.as_bytes());
    assert!(str_equals(s, copy));
}

#[test]
fn test_index_with_negative_wrap() {
    heap::init(1 << 16);
    let mut s = str_from("abc");
    roots!(s);

    assert!(str_equals0("a", s.index(0).unwrap()));
    assert!(str_equals0("c", s.index(2).unwrap()));
    assert!(str_equals0("c", s.index(-1).unwrap()));
    assert!(str_equals0("a", s.index(-3).unwrap()));
    assert!(matches!(s.index(3), Err(Error::Index)));
    assert!(matches!(s.index(-4), Err(Error::Index)));
}

#[test]
fn test_split() {
    heap::init(1 << 16);
    let mut s = str_from("a:bc::d");
    let mut colon = str_from(":");
    roots!(s, colon);

    let mut parts = s.split(colon);
    roots!(parts);
    assert_eq!(parts.len(), 4);
    assert!(str_equals0("a", parts.index(0).unwrap()));
    assert!(str_equals0("bc", parts.index(1).unwrap()));
    assert!(str_equals0("", parts.index(2).unwrap()));
    assert!(str_equals0("d", parts.index(3).unwrap()));
}

#[test]
fn test_split_edge_cases() {
    heap::init(1 << 16);
    let mut colon = str_from(":");
    roots!(colon);

    // the empty string splits to one empty piece
    let mut empty = empty_str();
    roots!(empty);
    let parts = empty.split(colon);
    assert_eq!(parts.len(), 1);
    assert!(str_equals0("", parts.index(0).unwrap()));

    // a trailing separator yields a trailing empty piece
    let mut s = str_from("a:");
    roots!(s);
    let parts = s.split(colon);
    assert_eq!(parts.len(), 2);
    assert!(str_equals0("a", parts.index(0).unwrap()));
    assert!(str_equals0("", parts.index(1).unwrap()));

    // a lone separator yields two empty pieces
    let mut sep_only = str_from(":");
    roots!(sep_only);
    let parts = sep_only.split(colon);
    assert_eq!(parts.len(), 2);
    assert!(str_equals0("", parts.index(0).unwrap()));
    assert!(str_equals0("", parts.index(1).unwrap()));
}

#[test]
fn test_split_join_inverse() {
    heap::init(1 << 16);
    let mut s = str_from("usr/local/bin");
    let mut slash = str_from("/");
    roots!(s, slash);

    let mut parts = s.split(slash);
    roots!(parts);
    let joined = slash.join(parts);
    assert!(str_equals(s, joined));

    // when the separator does not occur, split is a singleton and join
    // returns the same content
    let mut t = str_from("nodelims");
    roots!(t);
    let mut parts = t.split(slash);
    roots!(parts);
    assert_eq!(parts.len(), 1);
    let joined = slash.join(parts);
    assert!(str_equals(t, joined));
}

#[test]
fn test_join() {
    heap::init(1 << 16);
    let mut comma = str_from(",");
    let mut items = Gc::<limpet_rt::List<Gc<Str>>>::null();
    roots!(comma, items);
    items = limpet_rt::List::new();

    assert_eq!(comma.join(items), empty_str());

    items.append(str_from("a"));
    items.append(str_from("b"));
    items.append(str_from("c"));
    assert!(str_equals0("a,b,c", comma.join(items)));

    let mut empty_sep = empty_str();
    roots!(empty_sep);
    assert!(str_equals0("abc", empty_sep.join(items)));
}

#[test]
fn test_split_once_scenario() {
    heap::init(1 << 16);
    let mut s = str_from("foo=bar");
    let mut eq = str_from("=");
    roots!(s, eq);

    let mut pair = s.split_once(eq);
    roots!(pair);
    assert!(str_equals0("foo", pair.at0()));
    assert!(str_equals0("bar", pair.at1()));

    let mut t = str_from("foo=");
    let mut z = str_from("Z");
    roots!(t, z);
    let pair = t.split_once(z);
    assert!(str_equals0("foo=", pair.at0()));
    assert!(pair.at1().is_null());
}

#[test]
fn test_replace() {
    heap::init(1 << 16);
    let mut s = str_from("aXbXc");
    let mut x = str_from("X");
    let mut dash = str_from("--");
    roots!(s, x, dash);

    assert!(str_equals0("a--b--c", s.replace(x, dash)));

    // multi-byte pattern, non-overlapping left to right
    let mut t = str_from("aaaa");
    let mut aa = str_from("aa");
    let mut b = str_from("b");
    roots!(t, aa, b);
    assert!(str_equals0("bb", t.replace(aa, b)));
}

#[test]
fn test_replace_zero_occurrences_is_identity() {
    heap::init(1 << 16);
    let mut s = str_from("no matches here");
    let mut z = str_from("z");
    let mut w = str_from("w");
    roots!(s, z, w);

    let t = s.replace(z, w);
    assert_eq!(t, s);
}

#[test]
fn test_strip_family() {
    heap::init(1 << 16);
    let mut s = str_from(" \t hello \n");
    roots!(s);

    assert!(str_equals0("hello", s.strip()));
    assert!(str_equals0("hello \n", s.lstrip()));
    assert!(str_equals0(" \t hello", s.rstrip()));

    // nothing to strip returns the receiver
    let mut t = str_from("tight");
    roots!(t);
    assert_eq!(t.strip(), t);

    let mut u = str_from("xxhixx");
    let mut x = str_from("x");
    roots!(u, x);
    assert!(str_equals0("hi", u.strip_chars(x)));
    assert!(str_equals0("hixx", u.lstrip_chars(x)));
    assert!(str_equals0("xxhi", u.rstrip_chars(x)));

    let mut all_space = str_from("   ");
    roots!(all_space);
    assert_eq!(all_space.strip(), empty_str());
}

#[test]
fn test_ljust_rjust() {
    heap::init(1 << 16);
    let mut s = str_from("ab");
    let mut dot = str_from(".");
    roots!(s, dot);

    assert!(str_equals0("ab...", s.ljust(5, dot)));
    assert!(str_equals0("...ab", s.rjust(5, dot)));
    // already long enough: returned verbatim
    assert_eq!(s.ljust(1, dot), s);
    assert_eq!(s.rjust(1, dot), s);
}

#[test]
fn test_startswith_endswith() {
    heap::init(1 << 16);
    let mut s = str_from("prefix-body-suffix");
    roots!(s);

    let mut prefix = str_from("prefix");
    let mut suffix = str_from("suffix");
    let mut longer = str_from("prefix-body-suffix-and-more");
    roots!(prefix, suffix, longer);

    assert!(s.startswith(prefix));
    assert!(s.endswith(suffix));
    assert!(!s.startswith(suffix));
    assert!(!s.startswith(longer));
    assert!(s.startswith(empty_str()));
    assert!(s.endswith(empty_str()));
}

#[test]
fn test_case_mapping_and_predicates() {
    heap::init(1 << 16);
    let mut s = str_from("MiXeD 123");
    roots!(s);

    assert!(str_equals0("MIXED 123", s.upper()));
    assert!(str_equals0("mixed 123", s.lower()));

    assert!(str_from("123").isdigit());
    assert!(!str_from("12a").isdigit());
    assert!(!empty_str().isdigit());

    assert!(str_from("abc").isalpha());
    assert!(!str_from("ab1").isalpha());
    assert!(!empty_str().isalpha());

    assert!(str_from("ABC").isupper());
    assert!(!str_from("AbC").isupper());
    assert!(!empty_str().isupper());
}

#[test]
fn test_concat_and_repeat() {
    heap::init(1 << 16);
    let mut a = str_from("foo");
    roots!(a);
    let mut b = str_from("bar");
    roots!(b);
    let mut c = str_from("baz");
    roots!(c);

    assert!(str_equals0("foobar", str_concat(a, b)));
    assert!(str_equals0("foobarbaz", str_concat3(a, b, c)));
    assert_eq!(str_concat(empty_str(), empty_str()), empty_str());

    assert!(str_equals0("fofofo", str_repeat(str_from("fo"), 3)));
    assert_eq!(str_repeat(a, 0), empty_str());
    assert_eq!(str_repeat(a, -2), empty_str());
}

#[test]
fn test_str_contains_substring() {
    heap::init(1 << 16);
    let mut hay = str_from("the quick brown fox");
    roots!(hay);

    assert!(str_contains(hay, str_from("quick")));
    assert!(str_contains(hay, str_from("x")));
    assert!(str_contains(hay, empty_str()));
    assert!(!str_contains(hay, str_from("slow")));
    assert!(!str_contains(str_from("ab"), str_from("abc")));
}

#[test]
fn test_to_int_scenario() {
    heap::init(1 << 16);
    assert_eq!(to_int(str_from(" -123 "), 10).unwrap(), -123);
    assert!(matches!(to_int(str_from("zzz"), 10), Err(Error::Value(_))));
    assert_eq!(to_int(str_from("ff"), 16).unwrap(), 255);
}

#[test]
fn test_to_int_bases_and_edges() {
    heap::init(1 << 16);
    assert_eq!(to_int(str_from("0"), 10).unwrap(), 0);
    assert_eq!(to_int(str_from("+42"), 10).unwrap(), 42);
    assert_eq!(to_int(str_from("101"), 2).unwrap(), 5);
    assert_eq!(to_int(str_from("0x1f"), 0).unwrap(), 31);
    assert_eq!(to_int(str_from("0x1F"), 16).unwrap(), 31);
    assert_eq!(to_int(str_from("017"), 0).unwrap(), 15);
    assert_eq!(to_int(str_from("z"), 36).unwrap(), 35);
    assert_eq!(
        to_int(str_from("-9223372036854775808"), 10).unwrap(),
        i64::MIN
    );

    assert!(to_int(empty_str(), 10).is_err());
    assert!(to_int(str_from("   "), 10).is_err());
    assert!(to_int(str_from("12 34"), 10).is_err());
    assert!(to_int(str_from("99999999999999999999999"), 10).is_err());
    assert!(to_int(str_from("9223372036854775808"), 10).is_err());
    assert!(to_int(str_from("10"), 1).is_err());
    assert!(to_int(str_from("10"), 37).is_err());
}

#[test]
fn test_to_float() {
    heap::init(1 << 16);
    assert_eq!(to_float(str_from("3.5")).unwrap(), 3.5);
    assert_eq!(to_float(str_from(" -0.25 ")).unwrap(), -0.25);
    assert!(to_float(str_from("pi")).is_err());
    assert!(to_float(empty_str()).is_err());
}

#[test]
fn test_chr_ord() {
    heap::init(1 << 16);
    assert!(str_equals0("A", chr(65).unwrap()));
    assert_eq!(ord(chr(0xff).unwrap()), 0xff);
    assert!(chr(256).is_err());
    assert!(chr(-1).is_err());
    assert_eq!(ord(str_from("a")), 97);
}

#[test]
fn test_str_of_int() {
    heap::init(1 << 16);
    assert!(str_equals0("42", str_of_int(42)));
    assert!(str_equals0("-7", str_of_int(-7)));
    assert!(str_equals0("0", str_of_int(0)));
}

#[test]
fn test_repr() {
    heap::init(1 << 16);
    assert!(str_equals0("'foo'", repr(str_from("foo"))));
    assert!(str_equals0("\"it's\"", repr(str_from("it's"))));
    assert!(str_equals0("'mixed \\'\"'", repr(str_from("mixed '\""))));
    assert!(str_equals0("'a\\tb\\nc\\rd'", repr(str_from("a\tb\nc\rd"))));
    assert!(str_equals0("'\\x01\\x7f'", repr(str_from_bytes(&[0x01, 0x7f]))));
    assert!(str_equals0("'back\\\\slash'", repr(str_from("back\\slash"))));
    assert!(str_equals0("''", repr(empty_str())));
}

#[test]
fn test_len_free_function() {
    heap::init(1 << 16);
    let mut s = str_from("abcd");
    roots!(s);
    assert_eq!(len(s), 4);
    assert_eq!(len(empty_str()), 0);
}

#[test]
fn test_str_iter_yields_bytes() {
    heap::init(1 << 16);
    let mut s = str_from("abc");
    roots!(s);

    let collected: Vec<i32> = s.iter().map(ord).collect();
    assert_eq!(collected, vec![97, 98, 99]);
}

#[test]
fn test_str_iter_with_allocation_in_body() {
    // small heap so collections happen mid-loop
    heap::init(4096);
    let mut s = str_from("abcdefghij");
    roots!(s);

    let mut count = 0;
    for byte_str in s.iter() {
        assert_eq!(byte_str.len(), 1);
        let _churn = str_from(&format!("allocation churn {}", count));
        count += 1;
    }
    assert_eq!(count, 10);
}

#[test]
fn test_nul_terminator_for_c_interop() {
    heap::init(1 << 16);
    let mut s = str_from("abc");
    roots!(s);
    unsafe {
        assert_eq!(*s.data().add(3), 0);
    }
}
