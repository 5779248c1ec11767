//! Serde bridge from [`Value`] to Rust types.
//!
//! [`ValueDeserializer`] drives any `Deserialize` impl from a decoded [`Value`] tree.
//! It is the mirror of [`ValueSerializer`](crate::ser::ValueSerializer):
//!
//! - [`Value::Nil`] and [`Value::Undefined`] deserialize as unit and as `None`
//! - [`Value::Bin`] and [`Value::RawString`] are handed over as byte buffers
//! - big integers are visited as the narrowest of `i64`, `u64`, `i128`, `u128` that
//!   holds them, falling back to their decimal string
//! - an extension is a `(type, bytes)` pair and a timestamp its RFC 3339 string
//! - enums accept a bare variant name or a single-entry `{"Variant": payload}` map
//!
//! ```rust
//! use msgpack_codec::{decode, from_value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let value = decode(&[0x82, 0xa1, b'x', 0x01, 0xa1, b'y', 0x02]).unwrap();
//! let point: Point = from_value(value).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```

use crate::{Error, Map, MapKey, Result, Value};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{de, forward_to_deserialize_any};

/// Deserializer that reads from an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

fn visit_bigint<'de, V>(value: BigInt, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    if let Some(i) = value.to_i64() {
        visitor.visit_i64(i)
    } else if let Some(u) = value.to_u64() {
        visitor.visit_u64(u)
    } else if let Some(i) = value.to_i128() {
        visitor.visit_i128(i)
    } else if let Some(u) = value.to_u128() {
        visitor.visit_u128(u)
    } else {
        visitor.visit_string(value.to_string())
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Nil | Value::Undefined => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::BigInt(bi) => visit_bigint(bi, visitor),
            Value::Str(s) => visitor.visit_string(s),
            Value::Bin(bytes) | Value::RawString(bytes) => visitor.visit_byte_buf(bytes),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Ext(ext) => visitor.visit_seq(SeqDeserializer::new(vec![
                Value::Int(i64::from(ext.ext_type)),
                Value::Bin(ext.data),
            ])),
            Value::Timestamp(dt) => visitor.visit_string(dt.to_rfc3339()),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Nil | Value::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Str(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) if map.len() == 1 => {
                let Some((key, value)) = map.into_iter().next() else {
                    return Err(Error::custom("expected a single-entry map for an enum"));
                };
                match key {
                    MapKey::Str(variant) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    other => Err(Error::InvalidKeyType {
                        expected: "string",
                        found: other.type_name(),
                    }),
                }
            }
            other => Err(Error::custom(format!(
                "expected a variant name or a single-entry map, got {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: <Map as IntoIterator>::IntoIter,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::from(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::Str(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None | Some(Value::Nil) => Ok(()),
            Some(other) => Err(Error::custom(format!(
                "expected unit variant, got {}",
                other.type_name()
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Builds a `T` from a decoded [`Value`].
///
/// # Errors
///
/// Returns an error when the value's shape does not match what `T` expects.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: de::DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}
