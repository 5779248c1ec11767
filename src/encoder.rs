//! MessagePack encoder.
//!
//! [`Encoder`] walks a [`Value`] tree and writes the most compact wire form for every
//! node into a reusable, growable buffer:
//!
//! - nil, booleans and host numbers are written directly, picking the narrowest integer
//!   width or float64 (float32 with `force_float32`)
//! - every other value is first offered to the extension codec
//! - strings, binaries, arrays, maps and extensions use the smallest header that fits
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{msgpack, Encoder, EncoderOptions};
//!
//! let mut encoder = Encoder::new(EncoderOptions::new());
//! let bytes = encoder.encode(&msgpack!({"a": 1, "b": [1, 2, 3]})).unwrap();
//! assert_eq!(
//!     bytes,
//!     vec![0x82, 0xa1, 0x61, 0x01, 0xa1, 0x62, 0x93, 0x01, 0x02, 0x03]
//! );
//! ```

use crate::int::{is_safe_i64, is_safe_integer};
use crate::utf8::{utf8_count, utf8_encode};
use crate::{EncoderOptions, Error, ExtData, Map, MapKey, Result, Value};
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive};
use std::cmp::Ordering;
use tracing::trace;

const U32_LIMIT: usize = 0x1_0000_0000;

/// A reusable MessagePack encoder.
///
/// The output buffer is kept between calls; [`encode_shared_ref`](Self::encode_shared_ref)
/// returns a view into it that is valid until the next encode.
pub struct Encoder {
    options: EncoderOptions,
    pos: usize,
    bytes: Vec<u8>,
}

impl Encoder {
    /// Creates an encoder with a buffer of `options.initial_buffer_size` bytes.
    #[must_use]
    pub fn new(options: EncoderOptions) -> Self {
        let bytes = vec![0; options.initial_buffer_size];
        Encoder {
            options,
            pos: 0,
            bytes,
        }
    }

    /// The options this encoder was built with.
    #[must_use]
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    fn reinitialize_state(&mut self) {
        self.pos = 0;
    }

    /// Encodes `value` and returns a copy of the bytes.
    ///
    /// # Errors
    ///
    /// Fails when nesting exceeds `max_depth`, a length does not fit a 32-bit header,
    /// a big integer is out of the 64-bit range, a sorted map has a NaN key, a value
    /// has no wire form, or an extension encoder fails.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>> {
        self.encode_shared_ref(value).map(<[u8]>::to_vec)
    }

    /// Encodes `value` and returns a view into the internal buffer.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode).
    pub fn encode_shared_ref(&mut self, value: &Value) -> Result<&[u8]> {
        self.reinitialize_state();
        self.do_encode(value, 1)?;
        Ok(&self.bytes[..self.pos])
    }

    fn do_encode(&mut self, value: &Value, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::TooDeep(depth));
        }
        match value {
            Value::Nil | Value::Undefined => {
                self.write_u8(0xc0);
                Ok(())
            }
            Value::Bool(b) => {
                self.write_u8(if *b { 0xc3 } else { 0xc2 });
                Ok(())
            }
            Value::Int(i) => {
                self.encode_int(*i);
                Ok(())
            }
            Value::Float(f) => {
                self.encode_number(*f);
                Ok(())
            }
            Value::Str(s) => self.encode_string(s),
            _ => self.encode_object(value, depth),
        }
    }

    fn encode_int(&mut self, value: i64) {
        if !self.options.force_integer_to_float && is_safe_i64(value) {
            self.encode_safe_integer(value);
        } else {
            self.encode_number_as_float(value as f64);
        }
    }

    fn encode_number(&mut self, value: f64) {
        if !self.options.force_integer_to_float && is_safe_integer(value) {
            self.encode_safe_integer(value as i64);
        } else {
            self.encode_number_as_float(value);
        }
    }

    fn encode_safe_integer(&mut self, value: i64) {
        if value >= 0 {
            if value < 0x80 {
                // positive fixint
                self.write_u8(value as u8);
            } else if value < 0x100 {
                self.write_u8(0xcc);
                self.write_u8(value as u8);
            } else if value < 0x1_0000 {
                self.write_u8(0xcd);
                self.write_u16(value as u16);
            } else if value < 0x1_0000_0000 {
                self.write_u8(0xce);
                self.write_u32(value as u32);
            } else {
                self.write_u8(0xcf);
                self.write_u64(value as u64);
            }
        } else if value >= -0x20 {
            // negative fixint
            self.write_u8((0xe0 | (value + 0x20)) as u8);
        } else if value >= -0x80 {
            self.write_u8(0xd0);
            self.write_i8(value as i8);
        } else if value >= -0x8000 {
            self.write_u8(0xd1);
            self.write_i16(value as i16);
        } else if value >= -0x8000_0000 {
            self.write_u8(0xd2);
            self.write_i32(value as i32);
        } else {
            self.write_u8(0xd3);
            self.write_i64(value);
        }
    }

    fn encode_number_as_float(&mut self, value: f64) {
        if self.options.force_float32 {
            self.write_u8(0xca);
            self.write_f32(value as f32);
        } else {
            self.write_u8(0xcb);
            self.write_f64(value);
        }
    }

    fn encode_big_int(&mut self, value: &BigInt) -> Result<()> {
        if self.options.force_big_int_to_int64 {
            return self.encode_big_int_as_int64(value);
        }
        if value.sign() != Sign::Minus {
            if let Some(small) = value.to_u32() {
                self.encode_int(i64::from(small));
            } else if self.options.force_integer_to_float {
                self.encode_number_as_float(value.to_f64().unwrap_or(f64::INFINITY));
            } else if let Some(wide) = value.to_u64() {
                self.write_u8(0xcf);
                self.write_u64(wide);
            } else {
                return Err(big_int_out_of_range(value, "large", "uint64"));
            }
        } else if let Some(small) = value.to_i32() {
            self.encode_int(i64::from(small));
        } else if self.options.force_integer_to_float {
            self.encode_number_as_float(value.to_f64().unwrap_or(f64::NEG_INFINITY));
        } else if let Some(wide) = value.to_i64() {
            self.write_u8(0xd3);
            self.write_i64(wide);
        } else {
            return Err(big_int_out_of_range(value, "small", "int64"));
        }
        Ok(())
    }

    fn encode_big_int_as_int64(&mut self, value: &BigInt) -> Result<()> {
        if value.sign() == Sign::Minus {
            let wide = value
                .to_i64()
                .ok_or_else(|| big_int_out_of_range(value, "small", "int64"))?;
            self.write_u8(0xd3);
            self.write_i64(wide);
        } else {
            let wide = value
                .to_u64()
                .ok_or_else(|| big_int_out_of_range(value, "large", "uint64"))?;
            self.write_u8(0xcf);
            self.write_u64(wide);
        }
        Ok(())
    }

    fn write_string_header(&mut self, byte_length: usize) -> Result<()> {
        if byte_length < 32 {
            // fixstr
            self.write_u8(0xa0 + byte_length as u8);
        } else if byte_length < 0x100 {
            self.write_u8(0xd9);
            self.write_u8(byte_length as u8);
        } else if byte_length < 0x1_0000 {
            self.write_u8(0xda);
            self.write_u16(byte_length as u16);
        } else if byte_length < U32_LIMIT {
            self.write_u8(0xdb);
            self.write_u32(byte_length as u32);
        } else {
            return Err(Error::too_large("string", byte_length));
        }
        Ok(())
    }

    fn encode_string(&mut self, value: &str) -> Result<()> {
        let byte_length = utf8_count(value);
        self.ensure_buffer_size_to_write(5 + byte_length);
        self.write_string_header(byte_length)?;
        utf8_encode(value, &mut self.bytes[self.pos..]);
        self.pos += byte_length;
        Ok(())
    }

    fn encode_object(&mut self, value: &Value, depth: usize) -> Result<()> {
        let claimed = self.options.extension_codec.try_to_encode(value)?;
        if let Some(ext) = claimed {
            return self.encode_extension(&ext);
        }
        match value {
            Value::Array(array) => self.encode_array(array, depth),
            Value::Bin(bytes) => self.encode_binary(bytes),
            Value::RawString(bytes) => self.encode_raw_string(bytes),
            Value::BigInt(bi) => self.encode_big_int(bi),
            Value::Map(map) => self.encode_map(map, depth),
            Value::Ext(ext) => self.encode_extension(ext),
            Value::Timestamp(_) => Err(Error::unsupported_type(
                "timestamp without a registered timestamp extension",
            )),
            Value::Nil
            | Value::Undefined
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_) => self.do_encode(value, depth),
        }
    }

    fn encode_binary(&mut self, bytes: &[u8]) -> Result<()> {
        let size = bytes.len();
        if size < 0x100 {
            self.write_u8(0xc4);
            self.write_u8(size as u8);
        } else if size < 0x1_0000 {
            self.write_u8(0xc5);
            self.write_u16(size as u16);
        } else if size < U32_LIMIT {
            self.write_u8(0xc6);
            self.write_u32(size as u32);
        } else {
            return Err(Error::too_large("binary", size));
        }
        self.write_u8a(bytes);
        Ok(())
    }

    fn encode_raw_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_buffer_size_to_write(5 + bytes.len());
        self.write_string_header(bytes.len())?;
        self.write_u8a(bytes);
        Ok(())
    }

    fn encode_array(&mut self, array: &[Value], depth: usize) -> Result<()> {
        let size = array.len();
        if size < 16 {
            // fixarray
            self.write_u8(0x90 + size as u8);
        } else if size < 0x1_0000 {
            self.write_u8(0xdc);
            self.write_u16(size as u16);
        } else if size < U32_LIMIT {
            self.write_u8(0xdd);
            self.write_u32(size as u32);
        } else {
            return Err(Error::too_large("array", size));
        }
        for item in array {
            self.do_encode(item, depth + 1)?;
        }
        Ok(())
    }

    fn write_map_header(&mut self, size: usize) -> Result<()> {
        if size < 16 {
            // fixmap
            self.write_u8(0x80 + size as u8);
        } else if size < 0x1_0000 {
            self.write_u8(0xde);
            self.write_u16(size as u16);
        } else if size < U32_LIMIT {
            self.write_u8(0xdf);
            self.write_u32(size as u32);
        } else {
            return Err(Error::too_large("map", size));
        }
        Ok(())
    }

    fn encode_map(&mut self, map: &Map, depth: usize) -> Result<()> {
        let mut entries: Vec<(&MapKey, &Value)> = map.iter().collect();
        if self.options.sort_keys {
            entries = sort_map_entries(entries)?;
        }
        if self.options.ignore_undefined {
            entries.retain(|(_, value)| !value.is_undefined());
        }
        self.write_map_header(entries.len())?;
        for (key, value) in entries {
            self.encode_map_key(key)?;
            self.do_encode(value, depth + 1)?;
        }
        Ok(())
    }

    fn encode_map_key(&mut self, key: &MapKey) -> Result<()> {
        match key {
            MapKey::Str(s) => self.encode_string(s),
            MapKey::Int(i) => {
                self.encode_int(*i);
                Ok(())
            }
            MapKey::Float(f) => {
                self.encode_number(*f);
                Ok(())
            }
            MapKey::BigInt(bi) => self.encode_big_int(bi),
            MapKey::Bin(bytes) => self.encode_binary(bytes),
            MapKey::RawString(bytes) => self.encode_raw_string(bytes),
        }
    }

    fn encode_extension(&mut self, ext: &ExtData) -> Result<()> {
        let size = ext.data.len();
        match size {
            1 => self.write_u8(0xd4),
            2 => self.write_u8(0xd5),
            4 => self.write_u8(0xd6),
            8 => self.write_u8(0xd7),
            16 => self.write_u8(0xd8),
            _ if size < 0x100 => {
                self.write_u8(0xc7);
                self.write_u8(size as u8);
            }
            _ if size < 0x1_0000 => {
                self.write_u8(0xc8);
                self.write_u16(size as u16);
            }
            _ if size < U32_LIMIT => {
                self.write_u8(0xc9);
                self.write_u32(size as u32);
            }
            _ => return Err(Error::too_large("extension", size)),
        }
        self.write_i8(ext.ext_type);
        self.write_u8a(&ext.data);
        Ok(())
    }

    fn ensure_buffer_size_to_write(&mut self, size_to_write: usize) {
        let required_size = self.pos + size_to_write;
        if self.bytes.len() < required_size {
            self.resize_buffer(required_size * 2);
        }
    }

    fn resize_buffer(&mut self, new_size: usize) {
        trace!(from = self.bytes.len(), to = new_size, "growing encode buffer");
        self.bytes.resize(new_size, 0);
    }

    fn write_bytes<const N: usize>(&mut self, bytes: [u8; N]) {
        self.ensure_buffer_size_to_write(N);
        self.bytes[self.pos..self.pos + N].copy_from_slice(&bytes);
        self.pos += N;
    }

    fn write_u8a(&mut self, values: &[u8]) {
        let size = values.len();
        self.ensure_buffer_size_to_write(size);
        self.bytes[self.pos..self.pos + size].copy_from_slice(values);
        self.pos += size;
    }

    fn write_u8(&mut self, value: u8) {
        self.write_bytes([value]);
    }

    fn write_i8(&mut self, value: i8) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_u16(&mut self, value: u16) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_i16(&mut self, value: i16) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_i32(&mut self, value: i32) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_f32(&mut self, value: f32) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_f64(&mut self, value: f64) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write_bytes(value.to_be_bytes());
    }

    fn write_i64(&mut self, value: i64) {
        self.write_bytes(value.to_be_bytes());
    }
}

fn big_int_out_of_range(value: &BigInt, direction: &'static str, target: &'static str) -> Error {
    Error::BigIntOutOfRange {
        direction,
        target,
        value: value.to_string(),
    }
}

/// Canonical key order: numeric keys ascending, then strings by UTF-16 code units,
/// then raw strings, then binaries, both bytewise. Ties keep insertion order.
fn sort_map_entries<'a>(entries: Vec<(&'a MapKey, &'a Value)>) -> Result<Vec<(&'a MapKey, &'a Value)>> {
    let mut numeric = Vec::new();
    let mut strings = Vec::new();
    let mut raw_strings = Vec::new();
    let mut binaries = Vec::new();
    for entry in entries {
        match entry.0 {
            MapKey::Float(f) if f.is_nan() => return Err(Error::NanKey),
            MapKey::Int(_) | MapKey::Float(_) | MapKey::BigInt(_) => numeric.push(entry),
            MapKey::Str(_) => strings.push(entry),
            MapKey::RawString(_) => raw_strings.push(entry),
            MapKey::Bin(_) => binaries.push(entry),
        }
    }
    numeric.sort_by(|a, b| compare_numeric_keys(a.0, b.0));
    strings.sort_by(|a, b| match (a.0, b.0) {
        (MapKey::Str(x), MapKey::Str(y)) => x.encode_utf16().cmp(y.encode_utf16()),
        _ => Ordering::Equal,
    });
    raw_strings.sort_by(|a, b| compare_byte_keys(a.0, b.0));
    binaries.sort_by(|a, b| compare_byte_keys(a.0, b.0));

    numeric.extend(strings);
    numeric.extend(raw_strings);
    numeric.extend(binaries);
    Ok(numeric)
}

fn compare_byte_keys(a: &MapKey, b: &MapKey) -> Ordering {
    match (a, b) {
        (MapKey::Bin(x), MapKey::Bin(y)) | (MapKey::RawString(x), MapKey::RawString(y)) => {
            x.as_slice().cmp(y.as_slice())
        }
        _ => Ordering::Equal,
    }
}

fn compare_numeric_keys(a: &MapKey, b: &MapKey) -> Ordering {
    match (a, b) {
        (MapKey::Int(x), MapKey::Int(y)) => x.cmp(y),
        (MapKey::BigInt(x), MapKey::BigInt(y)) => x.cmp(y),
        (MapKey::Int(x), MapKey::BigInt(y)) => BigInt::from(*x).cmp(y),
        (MapKey::BigInt(x), MapKey::Int(y)) => x.cmp(&BigInt::from(*y)),
        (MapKey::Float(x), MapKey::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (MapKey::Float(x), MapKey::Int(y)) => compare_float_to_big_int(*x, &BigInt::from(*y)),
        (MapKey::Int(x), MapKey::Float(y)) => {
            compare_float_to_big_int(*y, &BigInt::from(*x)).reverse()
        }
        (MapKey::Float(x), MapKey::BigInt(y)) => compare_float_to_big_int(*x, y),
        (MapKey::BigInt(x), MapKey::Float(y)) => compare_float_to_big_int(*y, x).reverse(),
        _ => Ordering::Equal,
    }
}

// Exact comparison without rounding the integer through f64.
fn compare_float_to_big_int(value: f64, other: &BigInt) -> Ordering {
    if value.is_infinite() {
        return if value > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    let floor = value.floor();
    match BigInt::from_f64(floor) {
        Some(whole) => match whole.cmp(other) {
            Ordering::Equal if value > floor => Ordering::Greater,
            ordering => ordering,
        },
        None => Ordering::Equal,
    }
}
