use core::cmp::Ordering;
use core::ptr;

use crate::error::Error;
use crate::heap::Gc;
use crate::io::BufWriter;
use crate::roots;
use crate::value::{empty_str, str_from, Dict, ItemEq, ItemOrd, Len, List, SlabItem, Str};

/// Length of a string (bytes), list, or dict (live entries).
#[inline]
pub fn len<T: Len>(x: Gc<T>) -> i32 {
    x.len_of()
}

/// Bytewise equality.
pub fn str_equals(a: Gc<Str>, b: Gc<Str>) -> bool {
    if a.is_null() || b.is_null() {
        return a == b;
    }
    a.len() == b.len() && a.as_bytes() == b.as_bytes()
}

/// Equality against a Rust literal, mostly for tests.
pub fn str_equals0(expected: &str, s: Gc<Str>) -> bool {
    s.as_bytes() == expected.as_bytes()
}

/// Lexicographic byte comparison with length as tiebreaker.
#[inline]
pub fn str_cmp(a: Gc<Str>, b: Gc<Str>) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

#[inline]
pub fn int_cmp(a: i64, b: i64) -> Ordering {
    a.cmp(&b)
}

/// `a + b`.
pub fn str_concat(a: Gc<Str>, b: Gc<Str>) -> Gc<Str> {
    let mut a = a;
    let mut b = b;
    roots!(a, b);
    let len_a = a.len();
    let len_b = b.len();
    if len_a + len_b == 0 {
        return empty_str();
    }
    let result = Str::alloc(len_a + len_b);
    unsafe {
        let p = result.data_mut_ptr();
        ptr::copy_nonoverlapping(a.data(), p, len_a as usize);
        ptr::copy_nonoverlapping(b.data(), p.add(len_a as usize), len_b as usize);
    }
    result
}

/// `a + b + c`, in one allocation.
pub fn str_concat3(a: Gc<Str>, b: Gc<Str>, c: Gc<Str>) -> Gc<Str> {
    let mut a = a;
    let mut b = b;
    let mut c = c;
    roots!(a, b, c);
    let (la, lb, lc) = (a.len(), b.len(), c.len());
    if la + lb + lc == 0 {
        return empty_str();
    }
    let result = Str::alloc(la + lb + lc);
    unsafe {
        let p = result.data_mut_ptr();
        ptr::copy_nonoverlapping(a.data(), p, la as usize);
        ptr::copy_nonoverlapping(b.data(), p.add(la as usize), lb as usize);
        ptr::copy_nonoverlapping(c.data(), p.add((la + lb) as usize), lc as usize);
    }
    result
}

/// `s * times`; non-positive counts yield the empty string.
pub fn str_repeat(s: Gc<Str>, times: i32) -> Gc<Str> {
    if times <= 0 {
        return empty_str();
    }
    let mut s = s;
    roots!(s);
    let part_len = s.len();
    if part_len == 0 {
        return empty_str();
    }
    let result = Str::alloc(part_len * times);
    unsafe {
        let mut p = result.data_mut_ptr();
        for _ in 0..times {
            ptr::copy_nonoverlapping(s.data(), p, part_len as usize);
            p = p.add(part_len as usize);
        }
    }
    result
}

/// Substring membership; the empty needle occurs everywhere.
pub fn str_contains(haystack: Gc<Str>, needle: Gc<Str>) -> bool {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() {
        return true;
    }
    if pat.len() > hay.len() {
        return false;
    }
    hay.windows(pat.len()).any(|w| w == pat)
}

/// `x in list`, with type-appropriate equality.
#[inline]
pub fn list_contains<T: SlabItem + ItemEq>(haystack: Gc<List<T>>, needle: T) -> bool {
    haystack.contains(needle)
}

/// `k in dict`.
#[inline]
pub fn dict_contains<K: SlabItem + ItemEq, V: SlabItem>(haystack: Gc<Dict<K, V>>, needle: K) -> bool {
    haystack.contains(needle)
}

/// Sorted list of a dict's keys.
pub fn sorted<K, V>(d: Gc<Dict<K, V>>) -> Gc<List<K>>
where
    K: SlabItem + ItemEq + ItemOrd,
    V: SlabItem,
{
    let keys = d.keys();
    keys.sort();
    keys
}

/// Decimal rendering of an integer.
pub fn str_of_int(i: i64) -> Gc<Str> {
    str_from(&i.to_string())
}

/// Shortest `{}` rendering of a float.
pub fn str_of_float(f: f64) -> Gc<Str> {
    str_from(&f.to_string())
}

/// One-byte string for a byte value; ValueError outside `0..256`.
pub fn chr(i: i32) -> Result<Gc<Str>, Error> {
    if !(0..256).contains(&i) {
        return Err(Error::value("chr() arg not in range(256)"));
    }
    let result = Str::alloc(1);
    unsafe {
        *result.data_mut_ptr() = i as u8;
    }
    Ok(result)
}

/// Byte value of a one-byte string.
pub fn ord(s: Gc<Str>) -> i32 {
    assert_eq!(s.len(), 1, "ord() expects a one-byte string");
    s.as_bytes()[0] as i32
}

/// Parses a signed integer in the given base, or 0 for prefix
/// auto-detection. Surrounding ASCII whitespace is permitted; anything
/// else, an empty digit sequence, or overflow is a ValueError.
pub fn to_int(s: Gc<Str>, base: i32) -> Result<i64, Error> {
    if base != 0 && !(2..=36).contains(&base) {
        return Err(Error::value("to_int: base must be 0 or in 2..=36"));
    }
    let bytes = s.as_bytes();
    let n = bytes.len();
    let mut i = 0;

    while i < n && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut negative = false;
    if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
        negative = bytes[i] == b'-';
        i += 1;
    }

    let has_hex_prefix = i + 2 < n
        && bytes[i] == b'0'
        && (bytes[i + 1] | 0x20) == b'x'
        && bytes[i + 2].is_ascii_hexdigit();
    let base = if base == 0 {
        if has_hex_prefix {
            i += 2;
            16
        } else if i < n && bytes[i] == b'0' {
            8
        } else {
            10
        }
    } else {
        if base == 16 && has_hex_prefix {
            i += 2;
        }
        base as u32
    };

    let mut value: i64 = 0;
    let mut num_digits = 0;
    while i < n {
        let digit = match (bytes[i] as char).to_digit(base) {
            Some(d) => d as i64,
            None => break,
        };
        // accumulate negatively so i64::MIN parses without overflow
        value = value
            .checked_mul(base as i64)
            .and_then(|v| v.checked_sub(digit))
            .ok_or_else(|| to_int_error(bytes, base))?;
        num_digits += 1;
        i += 1;
    }
    if num_digits == 0 {
        return Err(to_int_error(bytes, base));
    }

    // trailing whitespace is OK; anything else is not
    while i < n {
        if !bytes[i].is_ascii_whitespace() {
            return Err(to_int_error(bytes, base));
        }
        i += 1;
    }

    if negative {
        Ok(value)
    } else {
        value.checked_neg().ok_or_else(|| to_int_error(bytes, base))
    }
}

fn to_int_error(bytes: &[u8], base: u32) -> Error {
    Error::value(format!(
        "invalid literal for int() with base {}: {:?}",
        base,
        String::from_utf8_lossy(bytes),
    ))
}

/// Parses a float, permitting surrounding whitespace.
pub fn to_float(s: Gc<Str>) -> Result<f64, Error> {
    let text = core::str::from_utf8(s.as_bytes())
        .map_err(|_| Error::value("to_float: invalid utf-8"))?
        .trim();
    text.parse::<f64>()
        .map_err(|_| Error::value(format!("could not convert string to float: {:?}", text)))
}

/// Python-style quoted representation: control characters as `\xNN`,
/// double quotes when the payload contains a single quote but no double
/// quote.
pub fn repr(s: Gc<Str>) -> Gc<Str> {
    let mut f = BufWriter::new();
    f.format_r(s);
    f.getvalue()
}
