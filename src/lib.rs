//! # msgpack_codec
//!
//! A MessagePack encoder and decoder with a dynamic [`Value`] model, an extension
//! registry and resumable, chunk-at-a-time decoding.
//!
//! ## What is MessagePack?
//!
//! MessagePack is a compact binary serialization format. Every value starts with a
//! head byte that encodes its type and, for small values, the value or length itself;
//! larger values carry a big-endian length or payload after the head byte.
//!
//! ## Key Features
//!
//! - **Smallest encoding**: every integer, string, binary, array, map and extension
//!   uses the shortest wire form that holds it
//! - **Host-number semantics**: integers beyond 2^53 are handled by an explicit
//!   [`IntMode`] instead of silently losing precision
//! - **Extensions**: pluggable [`ExtensionCodec`] with the timestamp type built in
//! - **Streaming**: decode from any `futures::Stream` of byte chunks, one value, many
//!   values or the elements of a single array
//! - **Hardened decoding**: configurable length limits checked before allocation
//! - **Serde compatible**: [`to_vec`] and [`from_slice`] for `#[derive]`d types
//!
//! ## Quick Start
//!
//! ```rust
//! use msgpack_codec::{decode, encode, msgpack};
//!
//! let value = msgpack!({ "compact": true, "schema": 0 });
//! let bytes = encode(&value).unwrap();
//! assert_eq!(bytes[0], 0x82);
//! assert_eq!(decode(&bytes).unwrap(), value);
//! ```
//!
//! ### Typed data
//!
//! ```rust
//! use msgpack_codec::{from_slice, to_vec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//! let bytes = to_vec(&user).unwrap();
//! let back: User = from_slice(&bytes).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ### Options
//!
//! ```rust
//! use msgpack_codec::{decode_with_options, encode_with_options, DecoderOptions, EncoderOptions, msgpack};
//!
//! let value = msgpack!({ "b": 1, "a": 2 });
//! let bytes = encode_with_options(&value, EncoderOptions::new().with_sort_keys(true)).unwrap();
//! assert_eq!(&bytes[..3], &[0x82, 0xa1, b'a']);
//!
//! let options = DecoderOptions::new().with_max_map_length(1);
//! assert!(decode_with_options(&bytes, options).is_err());
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Length fields are checked against limits before any buffer is sized from them
//! - Decoding never panics on malformed input; every failure is an [`Error`]

pub mod de;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod int;
pub mod key_decoder;
mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod timestamp;
pub mod utf8;
pub mod value;

pub use de::{from_value, ValueDeserializer};
pub use decoder::{DecodeMulti, Decoder};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use extension::{Extension, ExtensionCodec};
pub use int::IntMode;
pub use map::Map;
pub use options::{DecoderOptions, EncoderOptions};
pub use ser::{to_value, ValueSerializer};
pub use value::{ExtData, MapKey, Value};

use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encodes a value with default options.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{encode, Value};
///
/// assert_eq!(encode(&Value::from(300)).unwrap(), vec![0xcd, 0x01, 0x2c]);
/// ```
///
/// # Errors
///
/// Returns an error for nesting deeper than the default limit, for big integers that
/// do not fit 64 bits, or for values no extension claims.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    encode_with_options(value, EncoderOptions::default())
}

/// Encodes a value with custom options.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_with_options(value: &Value, options: EncoderOptions) -> Result<Vec<u8>> {
    Encoder::new(options).encode(value)
}

/// Decodes exactly one value from a complete buffer with default options.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{decode, Value};
///
/// assert_eq!(decode(&[0x93, 0x01, 0x02, 0x03]).unwrap().as_array().map(Vec::len), Some(3));
/// ```
///
/// # Errors
///
/// Returns an error for malformed, truncated or trailing input.
pub fn decode(buffer: &[u8]) -> Result<Value> {
    decode_with_options(buffer, DecoderOptions::default())
}

/// Decodes exactly one value from a complete buffer with custom options.
///
/// # Errors
///
/// See [`decode`]; also fails on an invalid option combination.
pub fn decode_with_options(buffer: &[u8], options: DecoderOptions) -> Result<Value> {
    Decoder::new(options)?.decode(buffer)
}

/// Iterates over the consecutive values in a complete buffer.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{decode_multi, DecoderOptions, Value};
///
/// let values: Vec<Value> = decode_multi(&[0x01, 0x02], DecoderOptions::new())
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
/// ```
///
/// # Errors
///
/// Fails on an invalid option combination; decoding errors come out of the iterator.
pub fn decode_multi(buffer: &[u8], options: DecoderOptions) -> Result<DecodeMulti<Decoder>> {
    Ok(Decoder::new(options)?.into_multi(buffer))
}

/// Decodes exactly one value from a stream of byte chunks.
///
/// # Errors
///
/// See [`Decoder::decode_async`].
pub async fn decode_async<S>(stream: S, options: DecoderOptions) -> Result<Value>
where
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    Decoder::new(options)?.decode_async(stream).await
}

/// Decodes consecutive values from a stream of byte chunks.
///
/// # Errors
///
/// Fails on an invalid option combination; decoding errors come out of the stream.
pub fn decode_stream<S>(
    stream: S,
    options: DecoderOptions,
) -> Result<impl Stream<Item = Result<Value>>>
where
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    Ok(Decoder::new(options)?.into_stream(stream))
}

/// Decodes the elements of a single top-level array from a stream of byte chunks.
///
/// # Errors
///
/// Fails on an invalid option combination; decoding errors come out of the stream.
pub fn decode_array_stream<S>(
    stream: S,
    options: DecoderOptions,
) -> Result<impl Stream<Item = Result<Value>>>
where
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    Ok(Decoder::new(options)?.into_array_stream(stream))
}

/// Serializes any `T: Serialize` to MessagePack bytes.
///
/// # Errors
///
/// Returns an error if `T` cannot be represented as a [`Value`] or encoded.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_vec_with_options(value, EncoderOptions::default())
}

/// Serializes any `T: Serialize` to MessagePack bytes with custom options.
///
/// # Errors
///
/// See [`to_vec`].
pub fn to_vec_with_options<T>(value: &T, options: EncoderOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    encode_with_options(&to_value(value)?, options)
}

/// Serializes any `T: Serialize` to a writer.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &[1u8, 2, 3]).unwrap();
/// assert_eq!(buffer, vec![0x93, 0x01, 0x02, 0x03]);
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let bytes = to_vec(value)?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(&e.to_string()))
}

/// Deserializes a `T` from a complete MessagePack buffer.
///
/// # Errors
///
/// Returns an error if the bytes are not a single valid value or do not match `T`.
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(bytes, DecoderOptions::default())
}

/// Deserializes a `T` from a complete MessagePack buffer with custom options.
///
/// # Errors
///
/// See [`from_slice`].
pub fn from_slice_with_options<T>(bytes: &[u8], options: DecoderOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(decode_with_options(bytes, options)?)
}

/// Deserializes a `T` from everything a reader yields.
///
/// # Errors
///
/// Returns an error if reading fails or the bytes do not decode to a `T`.
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::{stream, StreamExt};
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
        score: Option<f64>,
    }

    fn alice() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
            score: None,
        }
    }

    #[test]
    fn test_typed_roundtrip() {
        let bytes = to_vec(&alice()).unwrap();
        let back: User = from_slice(&bytes).unwrap();
        assert_eq!(back, alice());
    }

    #[test]
    fn test_writer_and_reader() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &alice()).unwrap();
        let back: User = from_reader(io::Cursor::new(buffer)).unwrap();
        assert_eq!(back, alice());
    }

    #[test]
    fn test_sorted_typed_map() {
        let mut source = BTreeMap::new();
        source.insert("z".to_string(), 1);
        source.insert("a".to_string(), 2);
        let bytes = to_vec_with_options(&source, EncoderOptions::new().with_sort_keys(true)).unwrap();
        assert_eq!(&bytes[..3], &[0x82, 0xa1, b'a']);
    }

    #[test]
    fn test_decode_multi_free_fn() {
        let values: Vec<_> = decode_multi(&[0xc0, 0xc3], DecoderOptions::new())
            .unwrap()
            .collect();
        assert_eq!(values.len(), 2);
        assert!(decode_multi(&[], DecoderOptions::new().with_raw_binary_string_keys(true)).is_err());
    }

    #[test]
    fn test_stream_free_fns() {
        let bytes = encode(&crate::msgpack!([1, 2])).unwrap();
        let value = block_on(decode_async(
            stream::iter(vec![bytes.clone()]),
            DecoderOptions::new(),
        ))
        .unwrap();
        assert_eq!(value, crate::msgpack!([1, 2]));

        let items: Vec<_> = block_on(
            decode_array_stream(stream::iter(vec![bytes]), DecoderOptions::new())
                .unwrap()
                .collect::<Vec<_>>(),
        );
        assert_eq!(items.len(), 2);

        let items: Vec<_> = block_on(
            decode_stream(stream::iter(vec![vec![0x01, 0x02]]), DecoderOptions::new())
                .unwrap()
                .collect::<Vec<_>>(),
        );
        assert_eq!(items.len(), 2);
    }
}
