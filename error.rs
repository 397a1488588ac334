use std::io;

use thiserror::Error;

/// Error categories surfaced by the runtime. Callers catch by matching on
/// the variant; the script-level evaluator propagates most of them.
#[derive(Debug, Error)]
pub enum Error {
    /// List or string index out of range after negative-wrap.
    #[error("index out of range")]
    Index,

    /// Dict lookup miss under `index` (as opposed to `get`).
    #[error("key not found")]
    Key,

    /// Numeric conversion or validation failure.
    #[error("{0}")]
    Value(String),

    /// Underlying syscall failure surfaced through a writer or reader.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// End of stream where a complete record was required.
    #[error("unexpected end of stream")]
    Eof,

    /// Operation intentionally unimplemented in this layer.
    #[error("not implemented")]
    NotImplemented,

    /// Internal invariant violation.
    #[error("assertion failed: {0}")]
    Assertion(&'static str),
}

impl Error {
    /// ValueError with a formatted message.
    pub fn value(msg: impl Into<String>) -> Error {
        Error::Value(msg.into())
    }
}
