//! Error types for MessagePack encoding and decoding.
//!
//! This module provides a single [`Error`] enum covering every failure the codec can
//! report, with enough context (byte values, sizes, limits, positions) to diagnose the
//! offending input without retrying.
//!
//! ## Error Categories
//!
//! - **Format Errors**: unrecognized head bytes, bad timestamp payloads, invalid map keys
//! - **Limit Errors**: a length field exceeded a configured maximum, nesting too deep,
//!   integers outside the requested range
//! - **Stream Errors**: [`Error::InsufficientData`] is the only recoverable condition and
//!   is consumed by the chunked decoders; callers see [`Error::UnexpectedEof`] or
//!   [`Error::ExtraBytes`] instead
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{decode, Error};
//!
//! let result = decode(&[0xc1]);
//! assert!(matches!(result, Err(Error::UnrecognizedTypeByte { byte: 0xc1 })));
//!
//! if let Err(err) = result {
//!     assert_eq!(err.to_string(), "Unrecognized type byte: 0xc1");
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur during MessagePack encoding/decoding.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// The head byte does not start any MessagePack type (only `0xc1` in practice)
    #[error("Unrecognized type byte: {}", pretty_byte(*.byte))]
    UnrecognizedTypeByte { byte: u8 },

    /// An array stream did not start with an array header
    #[error("Unrecognized array type byte: {}", pretty_byte(*.byte))]
    UnrecognizedArrayTypeByte { byte: u8 },

    /// A decoded length field is larger than the configured maximum
    #[error("Max length exceeded: {kind} length ({length}) > {limit_name} ({limit})")]
    MaxLengthExceeded {
        kind: &'static str,
        length: usize,
        limit_name: &'static str,
        limit: usize,
    },

    /// A map key decoded to a type the current map mode cannot hold
    #[error("The type of key must be {expected} but got {found}")]
    InvalidKeyType {
        expected: &'static str,
        found: &'static str,
    },

    /// `__proto__` used as a key of a plain-object map
    #[error("The key __proto__ is not allowed")]
    ProtoKey,

    /// Timestamp extension payload with an unsupported length
    #[error("Unrecognized data size for timestamp (expected 4, 8, or 12): {0}")]
    InvalidTimestampSize(usize),

    /// Timestamp that cannot be represented as a calendar date
    #[error("Timestamp out of range: {sec} seconds, {nsec} nanoseconds")]
    TimestampOutOfRange { sec: i64, nsec: u32 },

    /// 64-bit integer outside the safe range while decoding with `IntMode::SafeNumber`
    #[error("Mode is IntMode::SafeNumber and value is not a safe integer: {0}")]
    UnsafeInteger(String),

    /// The decoder stack was released out of order
    #[error("Invalid stack state. Released state is not on top of the stack.")]
    InvalidStackState,

    /// The current buffer ended in the middle of a value; more bytes are needed
    #[error("Insufficient data")]
    InsufficientData,

    /// The input ended before a complete value was decoded
    #[error(
        "Insufficient data in parsing {} at {total_pos} ({pos} in the current buffer)",
        describe_head_byte(.head_byte)
    )]
    UnexpectedEof {
        head_byte: Option<u8>,
        total_pos: usize,
        pos: usize,
    },

    /// Bytes remain after a complete value was decoded
    #[error("Extra {extra} of {total} byte(s) found at buffer[{pos}]")]
    ExtraBytes {
        extra: usize,
        total: usize,
        pos: usize,
    },

    /// Nesting exceeded the encoder's `max_depth`
    #[error("Too deep objects in depth {0}")]
    TooDeep(usize),

    /// A string, binary, array, map or extension is too large for a 32-bit header
    #[error("Too large {kind}: {size}")]
    TooLarge { kind: &'static str, size: usize },

    /// A big integer does not fit the 64-bit wire forms
    #[error("Bigint is too {direction} for {target}: {value}")]
    BigIntOutOfRange {
        direction: &'static str,
        target: &'static str,
        value: String,
    },

    /// NaN used as a map key while sorting keys
    #[error("Cannot sort map keys with NaN value")]
    NanKey,

    /// Invalid combination of options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Unsupported type for encoding or for conversion to a value
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a limit error for a length field that exceeds its configured maximum.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::Error;
    ///
    /// let err = Error::max_length_exceeded("array", 10, "maxArrayLength", 4);
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Max length exceeded: array length (10) > maxArrayLength (4)"
    /// );
    /// ```
    pub fn max_length_exceeded(
        kind: &'static str,
        length: usize,
        limit_name: &'static str,
        limit: usize,
    ) -> Self {
        Error::MaxLengthExceeded {
            kind,
            length,
            limit_name,
            limit,
        }
    }

    /// Creates an error for a value too large to be framed by a 32-bit header.
    pub fn too_large(kind: &'static str, size: usize) -> Self {
        Error::TooLarge { kind, size }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reader/writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for the recoverable "need more bytes" condition.
    ///
    /// Only the chunked decoders act on this; every other error is fatal.
    #[inline]
    #[must_use]
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData)
    }
}

fn describe_head_byte(head_byte: &Option<u8>) -> String {
    match head_byte {
        Some(byte) => pretty_byte(*byte),
        None => "head byte".to_string(),
    }
}

/// Formats a byte as `0x` followed by two lowercase hex digits.
pub(crate) fn pretty_byte(byte: u8) -> String {
    format!("0x{:02x}", byte)
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
