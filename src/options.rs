//! Configuration options for encoding and decoding.
//!
//! This module provides the two option structs consumed by [`Encoder`](crate::Encoder)
//! and [`Decoder`](crate::Decoder):
//!
//! - [`EncoderOptions`]: extension codec, depth limit, buffer sizing and the number,
//!   key-order and undefined-handling switches
//! - [`DecoderOptions`]: extension codec, integer mode, raw-string handling, map mode,
//!   length limits and the key decoder
//!
//! Both follow the builder style: start from `new()` and chain `with_*` calls.
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{encode_with_options, EncoderOptions, Map, MapKey, Value};
//!
//! let mut map = Map::new();
//! map.insert(MapKey::from("b"), Value::from(1));
//! map.insert(MapKey::from("a"), Value::from(2));
//!
//! let options = EncoderOptions::new().with_sort_keys(true);
//! let bytes = encode_with_options(&Value::Map(map), options).unwrap();
//! assert_eq!(bytes, vec![0x82, 0xa1, b'a', 0x02, 0xa1, b'b', 0x01]);
//! ```

use crate::int::UINT32_MAX;
use crate::key_decoder::{CachedKeyDecoder, KeyDecoder};
use crate::{ExtensionCodec, IntMode};
use std::sync::Arc;

/// Default nesting limit of the encoder.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default size of the encoder's output buffer.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 2048;

/// Configuration options for [`Encoder`](crate::Encoder).
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::EncoderOptions;
///
/// let options = EncoderOptions::new()
///     .with_max_depth(16)
///     .with_force_float32(true)
///     .with_ignore_undefined(true);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Clone, Debug)]
pub struct EncoderOptions {
    pub extension_codec: Arc<ExtensionCodec>,
    /// Values nested deeper than this fail with `Error::TooDeep`.
    pub max_depth: usize,
    pub initial_buffer_size: usize,
    /// Write map keys in canonical order instead of insertion order.
    pub sort_keys: bool,
    /// Write non-integer numbers as float32.
    pub force_float32: bool,
    /// Write every host number as a float, even integral ones.
    pub force_integer_to_float: bool,
    /// Drop map entries whose value is `Value::Undefined`.
    pub ignore_undefined: bool,
    /// Write every big integer as int64/uint64 regardless of magnitude.
    pub force_big_int_to_int64: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            extension_codec: ExtensionCodec::shared(),
            max_depth: DEFAULT_MAX_DEPTH,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            sort_keys: false,
            force_float32: false,
            force_integer_to_float: false,
            ignore_undefined: false,
            force_big_int_to_int64: false,
        }
    }
}

impl EncoderOptions {
    /// Creates default options: timestamp extension only, depth 100, 2 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_extension_codec(mut self, codec: Arc<ExtensionCodec>) -> Self {
        self.extension_codec = codec;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    #[must_use]
    pub fn with_force_float32(mut self, force_float32: bool) -> Self {
        self.force_float32 = force_float32;
        self
    }

    #[must_use]
    pub fn with_force_integer_to_float(mut self, force: bool) -> Self {
        self.force_integer_to_float = force;
        self
    }

    #[must_use]
    pub fn with_ignore_undefined(mut self, ignore_undefined: bool) -> Self {
        self.ignore_undefined = ignore_undefined;
        self
    }

    #[must_use]
    pub fn with_force_big_int_to_int64(mut self, force: bool) -> Self {
        self.force_big_int_to_int64 = force;
        self
    }
}

/// Configuration options for [`Decoder`](crate::Decoder).
///
/// The length limits bound the size fields read from the wire before anything is
/// allocated; each defaults to the largest 32-bit length.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{DecoderOptions, IntMode};
///
/// let options = DecoderOptions::new()
///     .with_use_map(true)
///     .with_int_mode(IntMode::Mixed)
///     .with_max_str_length(1024);
/// assert_eq!(options.effective_int_mode(), IntMode::Mixed);
/// ```
#[derive(Clone, Debug)]
pub struct DecoderOptions {
    pub extension_codec: Arc<ExtensionCodec>,
    /// Explicit integer mode; overrides `use_big_int64` when set.
    pub int_mode: Option<IntMode>,
    /// Shorthand for `IntMode::AsEncoded`.
    pub use_big_int64: bool,
    /// Return string payloads in value position as bytes instead of UTF-8 text.
    pub raw_binary_string_values: bool,
    /// Return string payloads in key position as bytes. Requires `use_map`.
    pub raw_binary_string_keys: bool,
    /// Wrap raw string payloads in `Value::RawString` instead of `Value::Bin`.
    pub use_raw_binary_string_class: bool,
    /// Keep native key types instead of the plain-object string key model.
    pub use_map: bool,
    /// In plain-object mode, accept numeric keys and turn them into strings.
    pub support_object_number_keys: bool,
    pub max_str_length: usize,
    pub max_bin_length: usize,
    pub max_array_length: usize,
    pub max_map_length: usize,
    pub max_ext_length: usize,
    /// String key decoder; `None` decodes every key directly.
    pub key_decoder: Option<Arc<dyn KeyDecoder>>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            extension_codec: ExtensionCodec::shared(),
            int_mode: None,
            use_big_int64: false,
            raw_binary_string_values: false,
            raw_binary_string_keys: false,
            use_raw_binary_string_class: false,
            use_map: false,
            support_object_number_keys: false,
            max_str_length: UINT32_MAX,
            max_bin_length: UINT32_MAX,
            max_array_length: UINT32_MAX,
            max_map_length: UINT32_MAX,
            max_ext_length: UINT32_MAX,
            key_decoder: Some(CachedKeyDecoder::shared()),
        }
    }
}

impl DecoderOptions {
    /// Creates default options: plain-object maps, unsafe numbers, cached keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The integer mode the decoder runs with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::{DecoderOptions, IntMode};
    ///
    /// assert_eq!(DecoderOptions::new().effective_int_mode(), IntMode::UnsafeNumber);
    ///
    /// let options = DecoderOptions::new().with_use_big_int64(true);
    /// assert_eq!(options.effective_int_mode(), IntMode::AsEncoded);
    ///
    /// let options = options.with_int_mode(IntMode::SafeNumber);
    /// assert_eq!(options.effective_int_mode(), IntMode::SafeNumber);
    /// ```
    #[must_use]
    pub fn effective_int_mode(&self) -> IntMode {
        match self.int_mode {
            Some(mode) => mode,
            None if self.use_big_int64 => IntMode::AsEncoded,
            None => IntMode::UnsafeNumber,
        }
    }

    #[must_use]
    pub fn with_extension_codec(mut self, codec: Arc<ExtensionCodec>) -> Self {
        self.extension_codec = codec;
        self
    }

    #[must_use]
    pub fn with_int_mode(mut self, mode: IntMode) -> Self {
        self.int_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_use_big_int64(mut self, use_big_int64: bool) -> Self {
        self.use_big_int64 = use_big_int64;
        self
    }

    #[must_use]
    pub fn with_raw_binary_string_values(mut self, raw: bool) -> Self {
        self.raw_binary_string_values = raw;
        self
    }

    #[must_use]
    pub fn with_raw_binary_string_keys(mut self, raw: bool) -> Self {
        self.raw_binary_string_keys = raw;
        self
    }

    #[must_use]
    pub fn with_use_raw_binary_string_class(mut self, wrap: bool) -> Self {
        self.use_raw_binary_string_class = wrap;
        self
    }

    #[must_use]
    pub fn with_use_map(mut self, use_map: bool) -> Self {
        self.use_map = use_map;
        self
    }

    #[must_use]
    pub fn with_support_object_number_keys(mut self, support: bool) -> Self {
        self.support_object_number_keys = support;
        self
    }

    #[must_use]
    pub fn with_max_str_length(mut self, limit: usize) -> Self {
        self.max_str_length = limit;
        self
    }

    #[must_use]
    pub fn with_max_bin_length(mut self, limit: usize) -> Self {
        self.max_bin_length = limit;
        self
    }

    #[must_use]
    pub fn with_max_array_length(mut self, limit: usize) -> Self {
        self.max_array_length = limit;
        self
    }

    #[must_use]
    pub fn with_max_map_length(mut self, limit: usize) -> Self {
        self.max_map_length = limit;
        self
    }

    #[must_use]
    pub fn with_max_ext_length(mut self, limit: usize) -> Self {
        self.max_ext_length = limit;
        self
    }

    /// Replaces the key decoder; pass `None` to disable key caching.
    #[must_use]
    pub fn with_key_decoder(mut self, key_decoder: Option<Arc<dyn KeyDecoder>>) -> Self {
        self.key_decoder = key_decoder;
        self
    }
}
