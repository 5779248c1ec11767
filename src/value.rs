//! Dynamic value representation for MessagePack data.
//!
//! This module provides the [`Value`] enum, the tree every encode consumes and every
//! decode produces, together with [`MapKey`] (the key type of [`Map`]) and [`ExtData`]
//! (an extension payload no registered codec claimed).
//!
//! ## Core Types
//!
//! - [`Value`]: nil, undefined, booleans, numbers, big integers, strings, binary, raw
//!   strings, arrays, maps, extensions and timestamps
//! - [`MapKey`]: the subset of values allowed as map keys
//! - [`ExtData`]: an opaque `(type, bytes)` extension
//!
//! ## Numbers
//!
//! Integers live in [`Value::Int`] and floats in [`Value::Float`], but the codec follows
//! host-number semantics: a float holding a safe integer is written in integer form, and
//! an `Int` outside `±(2^53 - 1)` is written as a float64. Use [`Value::BigInt`] for
//! exact 64-bit wire integers.
//!
//! ```rust
//! use msgpack_codec::{encode, Value};
//!
//! assert_eq!(encode(&Value::Float(3.0)).unwrap(), vec![0x03]);
//! assert_eq!(encode(&Value::Float(0.5)).unwrap()[0], 0xcb);
//! ```
//!
//! ## Building Values
//!
//! ```rust
//! use msgpack_codec::{msgpack, Value};
//!
//! let value = msgpack!({
//!     "a": 1,
//!     "b": [1, 2, 3]
//! });
//! assert!(value.is_map());
//! assert_eq!(value.get("a"), Some(&Value::Int(1)));
//! ```

use crate::int::{is_safe_i64, is_safe_integer};
use crate::Map;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::ser::{SerializeMap, SerializeSeq, SerializeTuple};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An extension payload: a signed type tag and its raw bytes.
///
/// Produced by the decoder when no registered extension claims the type, and written
/// through verbatim by the encoder.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{decode, encode, ExtData, Value};
///
/// let ext = Value::Ext(ExtData::new(5, vec![0xaa]));
/// let bytes = encode(&ext).unwrap();
/// assert_eq!(bytes, vec![0xd4, 0x05, 0xaa]);
/// assert_eq!(decode(&bytes).unwrap(), ext);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtData {
    pub ext_type: i8,
    pub data: Vec<u8>,
}

impl ExtData {
    #[must_use]
    pub fn new(ext_type: i8, data: Vec<u8>) -> Self {
        ExtData { ext_type, data }
    }
}

/// A dynamically-typed MessagePack value.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::Value;
///
/// let nil = Value::Nil;
/// let num = Value::from(42);
/// let text = Value::from("hello");
///
/// assert!(nil.is_nil());
/// assert!(num.is_number());
/// assert!(text.is_str());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    /// Encodes as nil, or is skipped as a map value with `ignore_undefined`.
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    Str(String),
    Bin(Vec<u8>),
    /// Bytes framed with a string header, never UTF-8 decoded.
    RawString(Vec<u8>),
    Array(Vec<Value>),
    Map(Map),
    Ext(ExtData),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns `true` if the value is nil.
    #[inline]
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` for host numbers, `Int` and `Float`.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bigint(&self) -> bool {
        matches!(self, Value::BigInt(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bin(&self) -> bool {
        matches!(self, Value::Bin(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_raw_string(&self) -> bool {
        matches!(self, Value::RawString(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_ext(&self) -> bool {
        matches!(self, Value::Ext(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::Value;
    ///
    /// assert_eq!(Value::Bool(true).as_bool(), Some(true));
    /// assert_eq!(Value::from(42).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value holds an integer that fits an `i64`, returns it.
    ///
    /// Whole-number floats and big integers in range are accepted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::Value;
    ///
    /// assert_eq!(Value::Int(42).as_i64(), Some(42));
    /// assert_eq!(Value::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Value::Float(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if is_safe_integer(*f) => Some(*f as i64),
            Value::BigInt(bi) => bi.to_i64(),
            _ => None,
        }
    }

    /// If the value holds an integer that fits a `u64`, returns it.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Float(f) if is_safe_integer(*f) && *f >= 0.0 => Some(*f as u64),
            Value::BigInt(bi) => bi.to_u64(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` for any numeric variant.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::BigInt(bi) => bi.to_f64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes of a `Bin` or `RawString`.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bin(bytes) | Value::RawString(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_ext(&self) -> Option<&ExtData> {
        match self {
            Value::Ext(ext) => Some(ext),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(dt) => Some(dt),
            _ => None,
        }
    }

    /// Looks up a string key when the value is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Str(_) => "string",
            Value::Bin(_) => "binary",
            Value::RawString(_) => "raw string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Ext(_) => "extension",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

/// A map key.
///
/// Numeric keys compare by numeric identity: `Int(3)` and `Float(3.0)` are the same
/// key, as are `0.0` and `-0.0`, and every NaN equals every other NaN. Big integers are
/// distinct from host numbers.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::MapKey;
///
/// assert_eq!(MapKey::Int(3), MapKey::Float(3.0));
/// assert_ne!(MapKey::Int(3), MapKey::from("3"));
/// ```
#[derive(Clone, Debug)]
pub enum MapKey {
    Str(String),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    Bin(Vec<u8>),
    RawString(Vec<u8>),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NumberIdentity {
    Int(i64),
    Float(u64),
}

/// Borrowed identity of a key; `Hash` and `Eq` of [`MapKey`] are defined through it.
#[derive(PartialEq, Eq, Hash)]
pub(crate) enum KeyIdentity<'a> {
    Str(&'a str),
    Number(NumberIdentity),
    BigInt(&'a BigInt),
    Bin(&'a [u8]),
    RawString(&'a [u8]),
}

impl MapKey {
    pub(crate) fn identity(&self) -> KeyIdentity<'_> {
        match self {
            MapKey::Str(s) => KeyIdentity::Str(s),
            MapKey::Int(i) => KeyIdentity::Number(NumberIdentity::Int(*i)),
            MapKey::Float(f) => KeyIdentity::Number(float_identity(*f)),
            MapKey::BigInt(bi) => KeyIdentity::BigInt(bi),
            MapKey::Bin(bytes) => KeyIdentity::Bin(bytes),
            MapKey::RawString(bytes) => KeyIdentity::RawString(bytes),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MapKey::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for `Int`, `Float` and `BigInt` keys.
    #[inline]
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, MapKey::Int(_) | MapKey::Float(_) | MapKey::BigInt(_))
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            MapKey::Str(_) => "string",
            MapKey::Int(_) | MapKey::Float(_) => "number",
            MapKey::BigInt(_) => "bigint",
            MapKey::Bin(_) => "binary",
            MapKey::RawString(_) => "raw string",
        }
    }
}

fn float_identity(value: f64) -> NumberIdentity {
    if is_safe_integer(value) {
        NumberIdentity::Int(value as i64)
    } else if value.is_nan() {
        NumberIdentity::Float(f64::NAN.to_bits())
    } else {
        NumberIdentity::Float(value.to_bits())
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl indexmap::Equivalent<MapKey> for KeyIdentity<'_> {
    fn equivalent(&self, key: &MapKey) -> bool {
        *self == key.identity()
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Str(s) => write!(f, "{:?}", s),
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::Float(fl) => write!(f, "{}", fl),
            MapKey::BigInt(bi) => write!(f, "{}n", bi),
            MapKey::Bin(bytes) => write!(f, "<bin {}>", hex(bytes)),
            MapKey::RawString(bytes) => write!(f, "<raw {}>", hex(bytes)),
        }
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::Str(value.to_string())
    }
}

impl From<String> for MapKey {
    fn from(value: String) -> Self {
        MapKey::Str(value)
    }
}

impl From<i32> for MapKey {
    fn from(value: i32) -> Self {
        MapKey::Int(i64::from(value))
    }
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Int(value)
    }
}

impl From<f64> for MapKey {
    fn from(value: f64) -> Self {
        MapKey::Float(value)
    }
}

impl From<BigInt> for MapKey {
    fn from(value: BigInt) -> Self {
        MapKey::BigInt(value)
    }
}

impl From<Vec<u8>> for MapKey {
    fn from(value: Vec<u8>) -> Self {
        MapKey::Bin(value)
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Str(s) => Value::Str(s),
            MapKey::Int(i) => Value::Int(i),
            MapKey::Float(f) => Value::Float(f),
            MapKey::BigInt(bi) => Value::BigInt(bi),
            MapKey::Bin(bytes) => Value::Bin(bytes),
            MapKey::RawString(bytes) => Value::RawString(bytes),
        }
    }
}

impl TryFrom<Value> for MapKey {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Str(s) => Ok(MapKey::Str(s)),
            Value::Int(i) => Ok(MapKey::Int(i)),
            Value::Float(f) => Ok(MapKey::Float(f)),
            Value::BigInt(bi) => Ok(MapKey::BigInt(bi)),
            Value::Bin(bytes) => Ok(MapKey::Bin(bytes)),
            Value::RawString(bytes) => Ok(MapKey::RawString(bytes)),
            other => Err(crate::Error::InvalidKeyType {
                expected: "string, number, bigint, or binary",
                found: other.type_name(),
            }),
        }
    }
}

impl Serialize for MapKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MapKey::Str(s) => serializer.serialize_str(s),
            MapKey::Int(i) => serializer.serialize_i64(*i),
            MapKey::Float(f) => serializer.serialize_f64(*f),
            MapKey::BigInt(bi) => serialize_bigint(bi, serializer),
            MapKey::Bin(bytes) | MapKey::RawString(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn serialize_bigint<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    if let Some(i) = value.to_i64() {
        serializer.serialize_i64(i)
    } else if let Some(u) = value.to_u64() {
        serializer.serialize_u64(u)
    } else if let Some(i) = value.to_i128() {
        serializer.serialize_i128(i)
    } else if let Some(u) = value.to_u128() {
        serializer.serialize_u128(u)
    } else {
        serializer.serialize_str(&value.to_string())
    }
}

struct Bytes<'a>(&'a [u8]);

impl Serialize for Bytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::BigInt(bi) => write!(f, "{}n", bi),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bin(bytes) => write!(f, "<bin {}>", hex(bytes)),
            Value::RawString(bytes) => write!(f, "<raw {}>", hex(bytes)),
            Value::Array(arr) => {
                write!(
                    f,
                    "[{}]",
                    arr.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Map(map) => {
                write!(
                    f,
                    "{{{}}}",
                    map.iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Ext(ext) => write!(f, "<ext {} {}>", ext.ext_type, hex(&ext.data)),
            Value::Timestamp(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil | Value::Undefined => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::BigInt(bi) => serialize_bigint(bi, serializer),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bin(bytes) | Value::RawString(bytes) => serializer.serialize_bytes(bytes),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Ext(ext) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&ext.ext_type)?;
                tuple.serialize_element(&Bytes(&ext.data))?;
                tuple.end()
            }
            Value::Timestamp(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any MessagePack value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::Str(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::Str(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Bin(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Bin(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = Map::new();
                while let Some((key, value)) = access.next_entry::<Value, Value>()? {
                    let key = MapKey::try_from(key).map_err(de::Error::custom)?;
                    values.insert(key, value);
                }
                Ok(Value::Map(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| {
            crate::Error::custom(format!("expected integer, found {}", value.type_name()))
        })
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| {
            crate::Error::custom(format!("expected number, found {}", value.type_name()))
        })
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bin(bytes) | Value::RawString(bytes) => Ok(bytes),
            _ => Err(crate::Error::custom(format!(
                "expected binary, found {}",
                value.type_name()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

from_narrow_int!(i8, i16, i32, u8, u16, u32);

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        if is_safe_i64(value) {
            Value::Int(value)
        } else {
            Value::BigInt(BigInt::from(value))
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::from(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::from(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::from(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bin(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bin(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<ExtData> for Value {
    fn from(value: ExtData) -> Self {
        Value::Ext(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &MapKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numeric_key_identity() {
        assert_eq!(MapKey::Int(3), MapKey::Float(3.0));
        assert_eq!(hash_of(&MapKey::Int(3)), hash_of(&MapKey::Float(3.0)));
        assert_eq!(MapKey::Float(0.0), MapKey::Float(-0.0));
        assert_eq!(MapKey::Float(f64::NAN), MapKey::Float(f64::NAN));
        assert_ne!(MapKey::Int(3), MapKey::BigInt(BigInt::from(3)));
        assert_ne!(MapKey::Float(0.5), MapKey::Int(0));
        assert_ne!(MapKey::Bin(vec![1]), MapKey::RawString(vec![1]));
    }

    #[test]
    fn test_from_integers_picks_bigint_outside_safe_range() {
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(
            Value::from(u64::MAX),
            Value::BigInt(BigInt::from(u64::MAX))
        );
        assert_eq!(
            Value::from(i64::MIN),
            Value::BigInt(BigInt::from(i64::MIN))
        );
        assert_eq!(Value::from(7u128), Value::Int(7));
    }

    #[test]
    fn test_tryfrom_i64() {
        assert_eq!(i64::try_from(Value::Int(42)).unwrap(), 42);
        assert_eq!(i64::try_from(Value::Float(42.0)).unwrap(), 42);
        assert_eq!(i64::try_from(Value::BigInt(BigInt::from(-9))).unwrap(), -9);
        assert!(i64::try_from(Value::from("test")).is_err());
    }

    #[test]
    fn test_tryfrom_others() {
        assert!(bool::try_from(Value::Bool(true)).unwrap());
        assert!(bool::try_from(Value::Int(1)).is_err());
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");
        assert_eq!(Vec::<u8>::try_from(Value::Bin(vec![1, 2])).unwrap(), vec![1, 2]);
        assert_eq!(f64::try_from(Value::Int(2)).unwrap(), 2.0);
    }

    #[test]
    fn test_map_key_try_from_value() {
        assert_eq!(MapKey::try_from(Value::from("k")).unwrap(), MapKey::from("k"));
        let err = MapKey::try_from(Value::Array(vec![])).unwrap_err();
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn test_display() {
        let mut map = Map::new();
        map.insert(MapKey::from("a"), Value::Bin(vec![0xde, 0xad]));
        let value = Value::Array(vec![Value::Nil, Value::Map(map), Value::from(1.5)]);
        assert_eq!(value.to_string(), r#"[nil, {"a": <bin dead>}, 1.5]"#);
    }

    #[test]
    fn test_const_is_methods() {
        const fn check_nil(v: &Value) -> bool {
            v.is_nil()
        }

        assert!(check_nil(&Value::Nil));
        assert!(Value::Int(1).is_number());
        assert!(Value::Float(1.0).is_number());
        assert!(!Value::BigInt(BigInt::from(1)).is_number());
    }
}
