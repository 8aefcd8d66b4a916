//! Error types for OPACK operations.

use thiserror::Error;

use crate::types::ItemType;

/// Result type for OPACK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The two failure categories of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes being decoded are not a valid OPACK item of the requested shape.
    InvalidData,
    /// An encoded item does not fit into the writer's buffer.
    OutOfResources,
}

/// Error type for OPACK operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Item is truncated.
    #[error("found incomplete item ({what})")]
    Incomplete { what: &'static str },

    /// Tag byte is not part of the format.
    #[error("unknown item tag: 0x{0:02X}")]
    UnknownTag(u8),

    /// Terminator found where an item was expected.
    #[error("unexpected terminator item")]
    UnexpectedTerminator,

    /// No item left to read.
    #[error("end of data has been reached")]
    EndOfData,

    /// Item has a different type than the one requested.
    #[error("item with tag 0x{tag:02X} is not a {expected} value")]
    UnexpectedType { expected: ItemType, tag: u8 },

    /// String is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// String contains a NUL character.
    #[error("strings with NUL characters are not supported")]
    EmbeddedNul,

    /// Declared length does not fit into memory.
    #[error("item is too long")]
    TooLong,

    /// Containers are nested too deeply.
    #[error("item contains too many levels of recursion")]
    RecursionLimit,

    /// Number cannot be converted without loss.
    #[error("number is not representable as {0} without loss")]
    InexactNumber(&'static str),

    /// Dictionary contains the same requested key more than once.
    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    /// Additional items follow a value that must be the only one.
    #[error("additional items present after value")]
    TrailingData,

    /// Writer buffer is too small.
    #[error("out of resources: needed {needed} bytes, only {available} available")]
    OutOfResources { needed: usize, available: usize },
}

impl Error {
    /// Creates an incomplete item error.
    pub fn incomplete(what: &'static str) -> Self {
        Self::Incomplete { what }
    }

    /// Creates a type mismatch error.
    pub fn unexpected_type(expected: ItemType, tag: u8) -> Self {
        Self::UnexpectedType { expected, tag }
    }

    /// Creates an out of resources error.
    pub fn out_of_resources(needed: usize, available: usize) -> Self {
        Self::OutOfResources { needed, available }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfResources { .. } => ErrorKind::OutOfResources,
            _ => ErrorKind::InvalidData,
        }
    }

    /// Returns true if the error was caused by malformed input.
    pub fn is_invalid_data(&self) -> bool {
        self.kind() == ErrorKind::InvalidData
    }

    /// Returns true if the error was caused by a full writer buffer.
    pub fn is_out_of_resources(&self) -> bool {
        self.kind() == ErrorKind::OutOfResources
    }
}
