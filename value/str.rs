use core::mem;
use core::ptr;
use core::slice;

use crate::error::Error;
use crate::heap;
use crate::heap::{Gc, ObjHeader, HEADER_SIZE};
use crate::roots;
use crate::value::{Len, List, Tuple2};

/// Offset of the byte payload: header plus the length field.
pub const STR_HEADER_SIZE: usize = HEADER_SIZE + mem::size_of::<i32>();

/// A byte string: opaque header, length, then `len + 1` bytes of payload
/// with a trailing NUL. The NUL is a convenience for C interoperability and
/// is not part of the string.
///
/// Strings are immutable once constructed; every operation that yields an
/// empty result returns the interned [`empty_str`] singleton.
#[repr(C)]
pub struct Str {
    header: ObjHeader,
    len: i32,
    data: [u8; 0],
}

/// Layout-compatible image of `Str` for statically allocated strings.
#[repr(C)]
struct GlobalStr<const N: usize> {
    header: ObjHeader,
    len: i32,
    data: [u8; N],
}

static EMPTY_STR: GlobalStr<1> = GlobalStr {
    header: ObjHeader::global(),
    len: 0,
    data: [0],
};

/// The interned empty string: a process-lifetime `Global` object, never
/// copied and never freed.
#[inline]
pub fn empty_str() -> Gc<Str> {
    Gc::from_raw(&EMPTY_STR as *const GlobalStr<1> as *mut Str)
}

/// New string holding a copy of `data`.
pub fn str_from_bytes(data: &[u8]) -> Gc<Str> {
    if data.is_empty() {
        return empty_str();
    }
    let result = Str::alloc(data.len() as i32);
    unsafe {
        ptr::copy_nonoverlapping(data.as_ptr(), result.data_mut_ptr(), data.len());
    }
    result
}

/// New string holding a copy of `s`.
#[inline]
pub fn str_from(s: &str) -> Gc<Str> {
    str_from_bytes(s.as_bytes())
}

impl Str {
    /// Zero-initialized string sized for `len` bytes plus the NUL.
    pub fn alloc(len: i32) -> Gc<Str> {
        debug_assert!(len >= 0);
        let obj_len = STR_HEADER_SIZE + len as usize + 1;
        let p = heap::allocate(obj_len) as *mut Str;
        unsafe {
            (*p).header = ObjHeader::opaque(obj_len);
            (*p).len = len;
        }
        Gc::from_raw(p)
    }

    /// Byte length, excluding the trailing NUL.
    #[inline]
    pub fn len(&self) -> i32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pointer to the payload; NUL-terminated for syscall interop.
    #[inline]
    pub fn data(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// The payload as a byte slice. The borrow must not be held across an
    /// allocation point: a collection may move the string.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.data(), self.len as usize) }
    }

    #[inline]
    pub(crate) fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

impl Len for Str {
    #[inline]
    fn len_of(&self) -> i32 {
        self.len
    }
}

/// Copies bytes `[begin, end)` of a rooted string handle into a new string.
/// Reads the source only after the allocation, so a move during the
/// allocation is harmless.
fn copy_range(this: *mut Gc<Str>, begin: usize, end: usize) -> Gc<Str> {
    let n = end - begin;
    if n == 0 {
        return empty_str();
    }
    let result = Str::alloc(n as i32);
    unsafe {
        ptr::copy_nonoverlapping((*this).data_ptr().add(begin), result.data_mut_ptr(), n);
    }
    result
}

/// Bytes the no-argument strip family removes.
#[inline]
fn is_strip_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl Gc<Str> {
    #[inline]
    pub(crate) fn data_mut_ptr(self) -> *mut u8 {
        unsafe { (self.as_ptr() as *mut u8).add(STR_HEADER_SIZE) }
    }

    /// `s[i]` with negative wrap: a one-byte string, or IndexError.
    pub fn index(self, i: i32) -> Result<Gc<Str>, Error> {
        let mut this = self;
        roots!(this);
        let n = this.len;
        let i = if i < 0 { i + n } else { i };
        if i < 0 || i >= n {
            return Err(Error::Index);
        }
        let result = Str::alloc(1);
        unsafe {
            *result.data_mut_ptr() = *this.data_ptr().add(i as usize);
        }
        Ok(result)
    }

    /// `s[begin:end]`. Negative indices count from the end; both bounds are
    /// clamped to `[0, len]`. An empty result is the interned singleton.
    pub fn slice(self, begin: i32, end: i32) -> Gc<Str> {
        let mut this = self;
        roots!(this);
        let n = this.len;
        let begin = (if begin < 0 { begin + n } else { begin }).clamp(0, n);
        let end = (if end < 0 { end + n } else { end }).clamp(0, n);
        if end <= begin {
            return empty_str();
        }
        copy_range(&mut this, begin as usize, end as usize)
    }

    /// `s[begin:]`.
    pub fn slice_from(self, begin: i32) -> Gc<Str> {
        if begin == 0 {
            // s[0:] is common in here-docs
            return self;
        }
        self.slice(begin, self.len)
    }

    /// Splits on a one-byte separator. The empty string splits to one empty
    /// piece; a trailing separator yields a trailing empty piece.
    pub fn split(self, sep: Gc<Str>) -> Gc<List<Gc<Str>>> {
        assert_eq!(sep.len, 1, "split separator must be one byte");
        let sep_byte = unsafe { *sep.data_ptr() };

        let mut this = self;
        let mut result = Gc::<List<Gc<Str>>>::null();
        roots!(this, result);
        result = List::new();

        if this.len == 0 {
            // ''.split(':') == ['']
            result.append(empty_str());
            return result;
        }

        let n = this.len as usize;
        let mut pos = 0usize;
        loop {
            let found = this.as_bytes()[pos..].iter().position(|&b| b == sep_byte);
            match found {
                None => {
                    // rest of the string
                    let piece = copy_range(&mut this, pos, n);
                    result.append(piece);
                    break;
                }
                Some(off) => {
                    let sep_at = pos + off;
                    let piece = copy_range(&mut this, pos, sep_at);
                    result.append(piece);
                    pos = sep_at + 1;
                    if pos >= n {
                        // separator was at end of string
                        result.append(empty_str());
                        break;
                    }
                }
            }
        }
        result
    }

    /// Splits at the first occurrence of a one-byte delimiter: `(before,
    /// after)`, or `(self, null)` when the delimiter does not occur.
    pub fn split_once(self, delim: Gc<Str>) -> Gc<Tuple2<Gc<Str>, Gc<Str>>> {
        assert_eq!(delim.len, 1, "split_once delimiter must be one byte");
        let delim_byte = unsafe { *delim.data_ptr() };

        let mut this = self;
        roots!(this);
        let found = this.as_bytes().iter().position(|&b| b == delim_byte);
        match found {
            Some(i) => {
                let mut s1 = Gc::<Str>::null();
                let mut s2 = Gc::<Str>::null();
                roots!(s1, s2);
                let n = this.len as usize;
                s1 = copy_range(&mut this, 0, i);
                s2 = copy_range(&mut this, i + 1, n);
                Tuple2::alloc(s1, s2)
            }
            None => Tuple2::alloc(this, Gc::null()),
        }
    }

    /// Concatenates `items` with this string between consecutive parts;
    /// zero parts yield the empty string.
    pub fn join(self, items: Gc<List<Gc<Str>>>) -> Gc<Str> {
        let mut this = self;
        let mut items = items;
        roots!(this, items);

        let num_parts = items.len();
        if num_parts == 0 {
            // " ".join([]) == ""
            return empty_str();
        }
        let mut result_len = 0;
        for i in 0..num_parts {
            result_len += items.get_at(i).len;
        }
        let sep_len = this.len;
        result_len += sep_len * (num_parts - 1);
        if result_len == 0 {
            return empty_str();
        }

        let result = Str::alloc(result_len);
        // One allocation; every source is read through a rooted handle
        // after it.
        unsafe {
            let mut p = result.data_mut_ptr();
            for i in 0..num_parts {
                if i != 0 && sep_len != 0 {
                    ptr::copy_nonoverlapping(this.data_ptr(), p, sep_len as usize);
                    p = p.add(sep_len as usize);
                }
                let part = items.get_at(i);
                ptr::copy_nonoverlapping(part.data_ptr(), p, part.len as usize);
                p = p.add(part.len as usize);
            }
        }
        result
    }

    /// Copy with every non-overlapping left-to-right occurrence of `old`
    /// replaced by `new`. Zero occurrences return the receiver unchanged,
    /// preserving object identity.
    pub fn replace(self, old: Gc<Str>, new: Gc<Str>) -> Gc<Str> {
        assert!(old.len >= 1, "replace pattern must be non-empty");
        let mut this = self;
        let mut old = old;
        let mut new = new;
        roots!(this, old, new);

        let mut occurrences: Vec<usize> = Vec::new();
        {
            let hay = this.as_bytes();
            let pat = old.as_bytes();
            let mut i = 0;
            while i + pat.len() <= hay.len() {
                if &hay[i..i + pat.len()] == pat {
                    occurrences.push(i);
                    i += pat.len();
                } else {
                    i += 1;
                }
            }
        }
        if occurrences.is_empty() {
            return this;
        }

        let result_len = this.len + occurrences.len() as i32 * (new.len - old.len);
        if result_len == 0 {
            return empty_str();
        }
        let result = Str::alloc(result_len);
        unsafe {
            let old_len = old.len as usize;
            let new_len = new.len as usize;
            let mut p = result.data_mut_ptr();
            let mut prev = 0usize;
            for &at in &occurrences {
                let keep = at - prev;
                ptr::copy_nonoverlapping(this.data_ptr().add(prev), p, keep);
                p = p.add(keep);
                ptr::copy_nonoverlapping(new.data_ptr(), p, new_len);
                p = p.add(new_len);
                prev = at + old_len;
            }
            ptr::copy_nonoverlapping(this.data_ptr().add(prev), p, this.len as usize - prev);
        }
        result
    }

    /// Strips whitespace from both ends; returns the receiver when nothing
    /// is stripped.
    pub fn strip(self) -> Gc<Str> {
        self.strip_with(None, true, true)
    }

    pub fn lstrip(self) -> Gc<Str> {
        self.strip_with(None, true, false)
    }

    pub fn rstrip(self) -> Gc<Str> {
        self.strip_with(None, false, true)
    }

    /// Strips the bytes of `chars` from both ends.
    pub fn strip_chars(self, chars: Gc<Str>) -> Gc<Str> {
        self.strip_with(Some(chars), true, true)
    }

    pub fn lstrip_chars(self, chars: Gc<Str>) -> Gc<Str> {
        self.strip_with(Some(chars), true, false)
    }

    pub fn rstrip_chars(self, chars: Gc<Str>) -> Gc<Str> {
        self.strip_with(Some(chars), false, true)
    }

    fn strip_with(self, chars: Option<Gc<Str>>, left: bool, right: bool) -> Gc<Str> {
        let mut this = self;
        roots!(this);
        let n = this.len as usize;
        if n == 0 {
            return this;
        }

        let (mut begin, mut end) = (0usize, n);
        {
            let bytes = this.as_bytes();
            let in_set = |b: u8| match chars {
                Some(set) => set.as_bytes().contains(&b),
                None => is_strip_space(b),
            };
            if left {
                while begin < end && in_set(bytes[begin]) {
                    begin += 1;
                }
            }
            if right {
                while end > begin && in_set(bytes[end - 1]) {
                    end -= 1;
                }
            }
        }
        if begin == 0 && end == n {
            return this;
        }
        copy_range(&mut this, begin, end)
    }

    /// Pads on the right to at least `width` bytes with the one-byte
    /// `fill`; returns the receiver if already long enough.
    pub fn ljust(self, width: i32, fill: Gc<Str>) -> Gc<Str> {
        assert_eq!(fill.len, 1, "fill must be one byte");
        let c = unsafe { *fill.data_ptr() };
        let mut this = self;
        roots!(this);
        let n = this.len;
        if width - n < 0 {
            return this;
        }
        let result = Str::alloc(width);
        unsafe {
            ptr::copy_nonoverlapping(this.data_ptr(), result.data_mut_ptr(), n as usize);
            for i in n..width {
                *result.data_mut_ptr().add(i as usize) = c;
            }
        }
        result
    }

    /// Pads on the left to at least `width` bytes with the one-byte `fill`.
    pub fn rjust(self, width: i32, fill: Gc<Str>) -> Gc<Str> {
        assert_eq!(fill.len, 1, "fill must be one byte");
        let c = unsafe { *fill.data_ptr() };
        let mut this = self;
        roots!(this);
        let n = this.len;
        let num_fill = width - n;
        if num_fill < 0 {
            return this;
        }
        let result = Str::alloc(width);
        unsafe {
            for i in 0..num_fill {
                *result.data_mut_ptr().add(i as usize) = c;
            }
            ptr::copy_nonoverlapping(
                this.data_ptr(),
                result.data_mut_ptr().add(num_fill as usize),
                n as usize,
            );
        }
        result
    }

    pub fn startswith(self, prefix: Gc<Str>) -> bool {
        self.as_bytes().starts_with(prefix.as_bytes())
    }

    pub fn endswith(self, suffix: Gc<Str>) -> bool {
        self.as_bytes().ends_with(suffix.as_bytes())
    }

    /// ASCII uppercase copy.
    pub fn upper(self) -> Gc<Str> {
        self.map_ascii(|b| b.to_ascii_uppercase())
    }

    /// ASCII lowercase copy.
    pub fn lower(self) -> Gc<Str> {
        self.map_ascii(|b| b.to_ascii_lowercase())
    }

    fn map_ascii(self, f: impl Fn(u8) -> u8) -> Gc<Str> {
        let mut this = self;
        roots!(this);
        let n = this.len;
        if n == 0 {
            return this;
        }
        let result = Str::alloc(n);
        unsafe {
            let src = this.data_ptr();
            let dst = result.data_mut_ptr();
            for i in 0..n as usize {
                *dst.add(i) = f(*src.add(i));
            }
        }
        result
    }

    /// Non-empty and every byte is an ASCII digit.
    pub fn isdigit(self) -> bool {
        let bytes = self.as_bytes();
        !bytes.is_empty() && bytes.iter().all(|b| b.is_ascii_digit())
    }

    /// Non-empty and every byte is an ASCII letter.
    pub fn isalpha(self) -> bool {
        let bytes = self.as_bytes();
        !bytes.is_empty() && bytes.iter().all(|b| b.is_ascii_alphabetic())
    }

    /// Non-empty and every byte is an ASCII uppercase letter.
    pub fn isupper(self) -> bool {
        let bytes = self.as_bytes();
        !bytes.is_empty() && bytes.iter().all(|b| b.is_ascii_uppercase())
    }

    /// Iterates over the bytes as one-byte strings; the iterator roots the
    /// string for its lifetime.
    pub fn iter(self) -> StrIter {
        StrIter {
            root: heap::push_root_value(self.as_obj()),
            i: 0,
            len: self.len,
        }
    }
}

/// Byte iterator over a string, yielding one-byte strings. Registers its
/// target as a collector root so allocation inside the loop body cannot
/// invalidate the traversal. Iterators are popped from the root stack on
/// drop and must therefore be dropped in reverse creation order, which
/// every loop does naturally.
pub struct StrIter {
    root: usize,
    i: i32,
    len: i32,
}

impl Iterator for StrIter {
    type Item = Gc<Str>;

    fn next(&mut self) -> Option<Gc<Str>> {
        if self.i >= self.len {
            return None;
        }
        let result = Str::alloc(1);
        // re-read the target after the allocation; the root kept it current
        let s: Gc<Str> = heap::root_value(self.root).retag();
        unsafe {
            *result.data_mut_ptr() = *s.data_ptr().add(self.i as usize);
        }
        self.i += 1;
        Some(result)
    }
}

impl Drop for StrIter {
    fn drop(&mut self) {
        heap::pop_root();
    }
}
