use std::{fmt, io, num::TryFromIntError};

use crate::jvm::class::constant_pool;

/// An error raised while reading a class file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The underlying reader failed, or the input ended early.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The class file violates its format.
    #[error("Malformed class file: {0}")]
    Malformed(String),
    /// A field or method descriptor cannot be decoded.
    #[error("Malformed descriptor: {0}")]
    Descriptor(String),
}

impl ParseError {
    pub(crate) fn malform(message: impl fmt::Display) -> Self {
        Self::Malformed(message.to_string())
    }

    pub(crate) fn descriptor(message: impl fmt::Display) -> Self {
        Self::Descriptor(message.to_string())
    }
}

/// An error raised while writing a class file.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The underlying writer failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A value does not fit the field storing it, e.g., a method body longer than 65535 bytes.
    #[error("Out of range: {0}")]
    OutOfRange(String),
    /// The constant pool is full.
    #[error(transparent)]
    ConstantPool(#[from] constant_pool::Overflow),
    /// The class or a method body is inconsistent, e.g., a jump to a label never placed.
    #[error("Invalid class: {0}")]
    Invalid(String),
}

impl GenerationError {
    pub(crate) fn other(message: impl fmt::Display) -> Self {
        Self::Invalid(message.to_string())
    }

    pub(crate) fn out_of_range(message: impl fmt::Display) -> Self {
        Self::OutOfRange(message.to_string())
    }
}

impl From<TryFromIntError> for GenerationError {
    fn from(cause: TryFromIntError) -> Self {
        Self::out_of_range(cause)
    }
}
