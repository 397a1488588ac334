use std::io::{self, Write as _};
use std::os::unix::io::AsRawFd;

use crate::error::Error;
use crate::heap::Gc;
use crate::value::{str_from_bytes, Str};

/// Something managed strings can be written to.
pub trait Writer {
    fn write(&mut self, s: Gc<Str>) -> Result<(), Error>;

    fn flush(&mut self) -> Result<(), Error>;
}

/// A writer that accumulates into a growable byte buffer, with the
/// formatting operations the transpiled `%` operator lowers to. `getvalue`
/// copies the accumulated bytes into a managed string.
#[derive(Default)]
pub struct BufWriter {
    data: Vec<u8>,
}

impl BufWriter {
    pub fn new() -> BufWriter {
        BufWriter { data: Vec::new() }
    }

    /// Appends the bytes of `s`.
    pub fn write(&mut self, s: Gc<Str>) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Appends a Rust literal.
    pub fn write_const(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// `%s`.
    pub fn format_s(&mut self, s: Gc<Str>) {
        self.write(s);
    }

    /// `%d`.
    pub fn format_d(&mut self, i: i64) {
        let _ = write!(self.data, "{}", i);
    }

    /// `%r`: Python-style quoted representation. Quotes and backslashes
    /// are escaped, common control characters get their mnemonic escapes,
    /// everything else non-printable becomes `\xNN`. Double quotes are
    /// used when the payload has a single quote but no double quote.
    pub fn format_r(&mut self, s: Gc<Str>) {
        let bytes = s.as_bytes();
        let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
            b'"'
        } else {
            b'\''
        };
        self.data.push(quote);
        for &c in bytes {
            if c == quote || c == b'\\' {
                self.data.push(b'\\');
                self.data.push(c);
            } else if c == b'\t' {
                self.data.extend_from_slice(b"\\t");
            } else if c == b'\n' {
                self.data.extend_from_slice(b"\\n");
            } else if c == b'\r' {
                self.data.extend_from_slice(b"\\r");
            } else if c < 0x20 || c >= 0x7f {
                let _ = write!(self.data, "\\x{:02x}", c);
            } else {
                self.data.push(c);
            }
        }
        self.data.push(quote);
    }

    /// The accumulated bytes as a managed string.
    pub fn getvalue(&self) -> Gc<Str> {
        str_from_bytes(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Writer for BufWriter {
    fn write(&mut self, s: Gc<Str>) -> Result<(), Error> {
        BufWriter::write(self, s);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A writer over a file descriptor.
pub struct FdWriter<W: io::Write + AsRawFd> {
    inner: W,
}

impl<W: io::Write + AsRawFd> FdWriter<W> {
    pub fn new(inner: W) -> FdWriter<W> {
        FdWriter { inner }
    }

    pub fn write(&mut self, s: Gc<Str>) -> Result<(), Error> {
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()?;
        Ok(())
    }

    /// Whether the descriptor refers to a terminal.
    pub fn isatty(&self) -> bool {
        unsafe { libc::isatty(self.inner.as_raw_fd()) != 0 }
    }
}

impl<W: io::Write + AsRawFd> Writer for FdWriter<W> {
    fn write(&mut self, s: Gc<Str>) -> Result<(), Error> {
        FdWriter::write(self, s)
    }

    fn flush(&mut self) -> Result<(), Error> {
        FdWriter::flush(self)
    }
}

/// Writer over stdout.
pub fn stdout() -> FdWriter<io::Stdout> {
    FdWriter::new(io::stdout())
}

/// Writer over stderr.
pub fn stderr() -> FdWriter<io::Stderr> {
    FdWriter::new(io::stderr())
}
