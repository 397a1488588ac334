use core::ptr;
use std::io::{self, BufRead};

use crate::error::Error;
use crate::heap;
use crate::heap::Gc;
use crate::value::{empty_str, str_from_bytes, Str};

/// Something lines can be read from. `readline` returns the line including
/// its newline, or the empty string at end of stream.
pub trait LineReader {
    fn readline(&mut self) -> Result<Gc<Str>, Error>;
}

/// Line reader over a file descriptor.
pub struct FdLineReader<R: BufRead> {
    inner: R,
}

impl<R: BufRead> FdLineReader<R> {
    pub fn new(inner: R) -> FdLineReader<R> {
        FdLineReader { inner }
    }
}

impl<R: BufRead> LineReader for FdLineReader<R> {
    fn readline(&mut self) -> Result<Gc<Str>, Error> {
        let mut line = Vec::new();
        let n = self.inner.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Ok(empty_str());
        }
        Ok(str_from_bytes(&line))
    }
}

/// Line reader over stdin.
pub fn stdin() -> FdLineReader<io::BufReader<io::Stdin>> {
    FdLineReader::new(io::BufReader::new(io::stdin()))
}

/// Line reader over an in-memory managed string. Roots the string for its
/// own lifetime, so the source stays current across allocations of the
/// returned lines.
pub struct BufLineReader {
    root: usize,
    pos: usize,
}

impl BufLineReader {
    pub fn new(s: Gc<Str>) -> BufLineReader {
        BufLineReader {
            root: heap::push_root_value(s.as_obj()),
            pos: 0,
        }
    }

    #[inline]
    fn source(&self) -> Gc<Str> {
        heap::root_value(self.root).retag()
    }
}

impl LineReader for BufLineReader {
    fn readline(&mut self) -> Result<Gc<Str>, Error> {
        let s = self.source();
        let n = s.len() as usize;
        if self.pos >= n {
            return Ok(empty_str());
        }
        let end = match s.as_bytes()[self.pos..].iter().position(|&b| b == b'\n') {
            // past the newline char
            Some(off) => self.pos + off + 1,
            // leftover line
            None => n,
        };

        let line = Str::alloc((end - self.pos) as i32);
        // re-read the source after the allocation; the root kept it current
        let s = self.source();
        unsafe {
            ptr::copy_nonoverlapping(s.data().add(self.pos), line.data_mut_ptr(), end - self.pos);
        }
        self.pos = end;
        Ok(line)
    }
}

impl Drop for BufLineReader {
    fn drop(&mut self) {
        heap::pop_root();
    }
}
