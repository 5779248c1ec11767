//! Registry of extension types.
//!
//! An [`ExtensionCodec`] maps extension type tags to an encoder and a decoder. Types
//! `-1..=-128` are reserved for built-ins (only the timestamp, `-1`, is defined);
//! types `0..=127` are free for applications.
//!
//! When encoding, built-in encoders are consulted first and then custom ones, each in
//! registration order; the first that returns `Some(bytes)` wins. A [`Value::Ext`]
//! nobody claims is written through as-is. When decoding, a type with no decoder comes
//! back as [`Value::Ext`].
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{
//!     decode_with_options, encode_with_options, DecoderOptions, EncoderOptions, Extension,
//!     ExtensionCodec, Value,
//! };
//! use std::sync::Arc;
//!
//! // Encode every binary blob of exactly 3 bytes as extension 7.
//! let mut codec = ExtensionCodec::new();
//! codec.register(Extension::new(
//!     7,
//!     |value: &Value| match value {
//!         Value::Bin(bytes) if bytes.len() == 3 => Ok(Some(bytes.clone())),
//!         _ => Ok(None),
//!     },
//!     |data: &[u8], _| Ok(Value::Array(data.iter().map(|b| Value::from(*b)).collect())),
//! ));
//! let codec = Arc::new(codec);
//!
//! let bytes = encode_with_options(
//!     &Value::Bin(vec![1, 2, 3]),
//!     EncoderOptions::new().with_extension_codec(codec.clone()),
//! )
//! .unwrap();
//! assert_eq!(bytes[..2], [0xc7, 0x03]);
//!
//! let decoded = decode_with_options(
//!     &bytes,
//!     DecoderOptions::new().with_extension_codec(codec),
//! )
//! .unwrap();
//! assert_eq!(decoded, Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)]));
//! ```

use crate::timestamp::timestamp_extension;
use crate::{ExtData, Result, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Encoder half of an extension: `Ok(None)` declines the value.
pub type ExtensionEncodeFn = Arc<dyn Fn(&Value) -> Result<Option<Vec<u8>>> + Send + Sync>;

/// Decoder half of an extension: receives the payload and the type tag.
pub type ExtensionDecodeFn = Arc<dyn Fn(&[u8], i8) -> Result<Value> + Send + Sync>;

/// An extension type with its encoder and decoder.
#[derive(Clone)]
pub struct Extension {
    pub ext_type: i8,
    pub encode: ExtensionEncodeFn,
    pub decode: ExtensionDecodeFn,
}

impl Extension {
    pub fn new<E, D>(ext_type: i8, encode: E, decode: D) -> Self
    where
        E: Fn(&Value) -> Result<Option<Vec<u8>>> + Send + Sync + 'static,
        D: Fn(&[u8], i8) -> Result<Value> + Send + Sync + 'static,
    {
        Extension {
            ext_type,
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("ext_type", &self.ext_type)
            .finish_non_exhaustive()
    }
}

// One half of the registry: a slot per type plus the order slots were first filled in.
#[derive(Clone, Default)]
struct Slots {
    extensions: Vec<Option<Extension>>,
    order: Vec<usize>,
}

impl Slots {
    fn insert(&mut self, index: usize, extension: Extension) {
        if self.extensions.len() <= index {
            self.extensions.resize(index + 1, None);
        }
        if self.extensions[index].is_none() {
            self.order.push(index);
        }
        self.extensions[index] = Some(extension);
    }

    fn get(&self, index: usize) -> Option<&Extension> {
        self.extensions.get(index).and_then(Option::as_ref)
    }

    fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.order.iter().filter_map(|index| self.get(*index))
    }
}

/// Registry of extension encoders and decoders.
#[derive(Clone, Default)]
pub struct ExtensionCodec {
    builtin: Slots,
    custom: Slots,
}

impl ExtensionCodec {
    /// Creates a codec with the timestamp extension registered.
    #[must_use]
    pub fn new() -> Self {
        let mut codec = Self::empty();
        codec.register(timestamp_extension());
        codec
    }

    /// Creates a codec with no extensions at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide default codec, shared by the default options.
    #[must_use]
    pub fn shared() -> Arc<ExtensionCodec> {
        static DEFAULT: OnceLock<Arc<ExtensionCodec>> = OnceLock::new();
        Arc::clone(DEFAULT.get_or_init(|| Arc::new(ExtensionCodec::new())))
    }

    /// Registers an extension. Registering a type again replaces its handlers in place.
    pub fn register(&mut self, extension: Extension) {
        debug!(ext_type = extension.ext_type, "registering extension");
        match usize::try_from(extension.ext_type) {
            Ok(index) => self.custom.insert(index, extension),
            Err(_) => {
                let index = (-1 - i16::from(extension.ext_type)) as usize;
                self.builtin.insert(index, extension);
            }
        }
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.register(extension);
        self
    }

    fn lookup(&self, ext_type: i8) -> Option<&Extension> {
        match usize::try_from(ext_type) {
            Ok(index) => self.custom.get(index),
            Err(_) => self.builtin.get((-1 - i16::from(ext_type)) as usize),
        }
    }

    /// Finds the extension that claims `value`.
    ///
    /// Returns `Ok(None)` when nothing claims it and it is not already a [`Value::Ext`].
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by an extension encoder.
    pub fn try_to_encode<'a>(&self, value: &'a Value) -> Result<Option<Cow<'a, ExtData>>> {
        for extension in self.builtin.iter().chain(self.custom.iter()) {
            if let Some(data) = (extension.encode)(value)? {
                return Ok(Some(Cow::Owned(ExtData::new(extension.ext_type, data))));
            }
        }
        match value {
            Value::Ext(ext) => Ok(Some(Cow::Borrowed(ext))),
            _ => Ok(None),
        }
    }

    /// Decodes an extension payload, falling back to [`Value::Ext`].
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the registered decoder.
    pub fn decode(&self, data: &[u8], ext_type: i8) -> Result<Value> {
        match self.lookup(ext_type) {
            Some(extension) => (extension.decode)(data, ext_type),
            None => Ok(Value::Ext(ExtData::new(ext_type, data.to_vec()))),
        }
    }

    /// Types with a registered extension, built-ins first.
    pub fn registered_types(&self) -> impl Iterator<Item = i8> + '_ {
        self.builtin
            .iter()
            .chain(self.custom.iter())
            .map(|extension| extension.ext_type)
    }
}

impl fmt::Debug for ExtensionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionCodec")
            .field("types", &self.registered_types().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::EXT_TIMESTAMP;
    use crate::Error;

    fn tagging(ext_type: i8, tag: &'static str) -> Extension {
        Extension::new(
            ext_type,
            move |value: &Value| match value {
                Value::Str(s) if s == tag => Ok(Some(vec![ext_type as u8])),
                _ => Ok(None),
            },
            |data: &[u8], _| Ok(Value::Bin(data.to_vec())),
        )
    }

    #[test]
    fn test_new_has_timestamp() {
        let codec = ExtensionCodec::new();
        assert_eq!(codec.registered_types().collect::<Vec<_>>(), vec![EXT_TIMESTAMP]);
        assert_eq!(ExtensionCodec::empty().registered_types().count(), 0);
    }

    #[test]
    fn test_registration_order_and_replacement() {
        let mut codec = ExtensionCodec::empty();
        codec.register(tagging(9, "x"));
        codec.register(tagging(2, "x"));
        codec.register(tagging(-5, "y"));
        assert_eq!(codec.registered_types().collect::<Vec<_>>(), vec![-5, 9, 2]);

        // first registered custom encoder wins
        let v = Value::from("x");
        let ext = codec.try_to_encode(&v).unwrap().unwrap();
        assert_eq!(ext.ext_type, 9);

        codec.register(tagging(9, "z"));
        assert_eq!(codec.registered_types().collect::<Vec<_>>(), vec![-5, 9, 2]);
        let v = Value::from("x");
        let ext = codec.try_to_encode(&v).unwrap().unwrap();
        assert_eq!(ext.ext_type, 2);
    }

    #[test]
    fn test_ext_passthrough() {
        let codec = ExtensionCodec::empty();
        let value = Value::Ext(ExtData::new(3, vec![1]));
        match codec.try_to_encode(&value).unwrap() {
            Some(Cow::Borrowed(ext)) => assert_eq!(ext.data, vec![1]),
            other => panic!("expected borrowed passthrough, got {:?}", other),
        }
        assert!(codec.try_to_encode(&Value::Nil).unwrap().is_none());
    }

    #[test]
    fn test_decode_fallback() {
        let codec = ExtensionCodec::new();
        assert_eq!(
            codec.decode(&[1, 2], 42).unwrap(),
            Value::Ext(ExtData::new(42, vec![1, 2]))
        );
        assert!(matches!(
            codec.decode(&[0; 3], EXT_TIMESTAMP),
            Err(Error::InvalidTimestampSize(3))
        ));
    }

    #[test]
    fn test_encoder_errors_propagate() {
        let codec = ExtensionCodec::empty().with_extension(Extension::new(
            1,
            |_: &Value| Err(Error::custom("boom")),
            |_: &[u8], _| Ok(Value::Nil),
        ));
        assert!(codec.try_to_encode(&Value::Array(vec![])).is_err());
    }
}
