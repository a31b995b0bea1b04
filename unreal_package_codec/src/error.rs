//! All errors thrown by the codec

use std::io;
use std::string::{FromUtf16Error, FromUtf8Error};

use num_enum::{TryFromPrimitive, TryFromPrimitiveError};
use thiserror::Error;
use unreal_helpers::error::FStringError;

/// Error type
///
/// The taxonomy mirrors the degrade-vs-fail split in the conversion design:
/// [`Error::UnresolvedReference`] is recoverable (the converter substitutes a
/// placeholder and keeps going), everything else is fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally invalid bytes, a truncated section, or an out-of-range index
    /// in the input. Carries the byte offset and section name for diagnostics.
    #[error("input malformed at offset {offset} in {section}: {message}")]
    InputMalformed {
        /// Byte offset the problem was detected at
        offset: u64,
        /// Section being parsed
        section: Box<str>,
        /// Description of the problem
        message: Box<str>,
    },

    /// An import could not be resolved against the script-objects database or
    /// the foreign-package context. The converter has already substituted a
    /// fallback and recorded the degradation on the package; this variant only
    /// exists so callers can choose to treat degradation as fatal.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(Box<str>),

    /// An index width was exceeded (e.g. more than 2^31 entries in a table).
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(Box<str>),

    /// An internal invariant was violated after remapping. Indicates a bug in
    /// the converter, not a problem with the input.
    #[error("invariant violated: {0}")]
    InvariantViolated(Box<str>),

    /// An `std::io::Error` occurred
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An `FStringError` occurred
    #[error(transparent)]
    FString(#[from] FStringError),
    /// A `FromUtf8Error` occurred
    #[error(transparent)]
    Utf8(#[from] FromUtf8Error),
    /// A `FromUtf16Error` occurred
    #[error(transparent)]
    Utf16(#[from] FromUtf16Error),

    /// Expected data was not found
    #[error("{0}")]
    NoData(Box<str>),
    /// A package index (legacy or zen) pointed at something invalid
    #[error("{0}")]
    InvalidPackageIndex(Box<str>),
    /// An enum value read from an archive had no matching variant
    #[error("{0}")]
    InvalidEnumValue(Box<str>),
    /// Part of the codec is not implemented
    #[error("{0}")]
    Unimplemented(Box<str>),
}

impl Error {
    /// Create an [`Error::InputMalformed`]
    pub fn malformed(section: impl Into<String>, offset: u64, message: impl Into<String>) -> Self {
        Error::InputMalformed {
            offset,
            section: section.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
        }
    }

    /// Create an [`Error::UnresolvedReference`]
    pub fn unresolved(message: impl Into<String>) -> Self {
        Error::UnresolvedReference(message.into().into_boxed_str())
    }

    /// Create an [`Error::CapacityExceeded`]
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Error::CapacityExceeded(message.into().into_boxed_str())
    }

    /// Create an [`Error::InvariantViolated`]
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolated(message.into().into_boxed_str())
    }

    /// Create an [`Error::NoData`]
    pub fn no_data(message: impl Into<String>) -> Self {
        Error::NoData(message.into().into_boxed_str())
    }

    /// Create an [`Error::InvalidPackageIndex`]
    pub fn invalid_package_index(message: impl Into<String>) -> Self {
        Error::InvalidPackageIndex(message.into().into_boxed_str())
    }

    /// Create an [`Error::Unimplemented`]
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Error::Unimplemented(message.into().into_boxed_str())
    }
}

impl<T: TryFromPrimitive> From<TryFromPrimitiveError<T>> for Error {
    fn from(e: TryFromPrimitiveError<T>) -> Self {
        Error::InvalidEnumValue(e.to_string().into_boxed_str())
    }
}
