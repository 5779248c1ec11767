use chrono::{TimeZone, Utc};
use msgpack_codec::{
    decode, decode_with_options, encode, encode_with_options, from_slice, msgpack, to_vec,
    DecoderOptions, EncoderOptions, Error, ExtData, Extension, ExtensionCodec, IntMode, Map,
    MapKey, Value,
};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Status {
    Pending,
    Shipped { carrier: String },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u64,
    customer: User,
    items: Vec<Product>,
    total: f64,
    status: Status,
    note: Option<String>,
}

fn sample_order() -> Order {
    Order {
        order_id: 9_000_000_000,
        customer: User {
            id: 7,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string()],
        },
        items: vec![
            Product {
                sku: "A-1".to_string(),
                price: 9.99,
                quantity: 2,
            },
            Product {
                sku: "B-2".to_string(),
                price: 0.5,
                quantity: 40,
            },
        ],
        total: 39.98,
        status: Status::Shipped {
            carrier: "post".to_string(),
        },
        note: None,
    }
}

#[test]
fn test_nested_struct_roundtrip() {
    let order = sample_order();
    let bytes = to_vec(&order).unwrap();
    let back: Order = from_slice(&bytes).unwrap();
    assert_eq!(back, order);
}

#[test]
fn test_unit_variant_is_a_string() {
    let bytes = to_vec(&Status::Pending).unwrap();
    assert_eq!(bytes, vec![0xa7, b'P', b'e', b'n', b'd', b'i', b'n', b'g']);
    assert_eq!(from_slice::<Status>(&bytes).unwrap(), Status::Pending);
}

#[test]
fn test_integer_wire_forms() {
    let cases: Vec<(i64, Vec<u8>)> = vec![
        (0, vec![0x00]),
        (127, vec![0x7f]),
        (128, vec![0xcc, 0x80]),
        (255, vec![0xcc, 0xff]),
        (256, vec![0xcd, 0x01, 0x00]),
        (65_536, vec![0xce, 0x00, 0x01, 0x00, 0x00]),
        (4_294_967_296, vec![0xcf, 0, 0, 0, 0x01, 0, 0, 0, 0]),
        (-1, vec![0xff]),
        (-32, vec![0xe0]),
        (-33, vec![0xd0, 0xdf]),
        (-129, vec![0xd1, 0xff, 0x7f]),
        (-32_769, vec![0xd2, 0xff, 0xff, 0x7f, 0xff]),
        (-2_147_483_649, vec![0xd3, 0xff, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff, 0xff]),
    ];
    for (number, expected) in cases {
        let bytes = encode(&Value::Int(number)).unwrap();
        assert_eq!(bytes, expected, "encoding {}", number);
        assert_eq!(decode(&bytes).unwrap(), Value::Int(number));
    }
}

#[test]
fn test_floats() {
    assert_eq!(encode(&Value::Float(3.0)).unwrap(), vec![0x03]);
    assert_eq!(encode(&Value::Float(-0.0)).unwrap(), vec![0x00]);

    let bytes = encode(&Value::Float(1.5)).unwrap();
    assert_eq!(bytes[0], 0xcb);
    assert_eq!(&bytes[1..], &1.5f64.to_be_bytes());

    let options = EncoderOptions::new().with_force_float32(true);
    let bytes = encode_with_options(&Value::Float(1.5), options).unwrap();
    assert_eq!(bytes, vec![0xca, 0x3f, 0xc0, 0x00, 0x00]);

    let options = EncoderOptions::new().with_force_integer_to_float(true);
    let bytes = encode_with_options(&Value::Int(1), options).unwrap();
    assert_eq!(bytes[0], 0xcb);
    assert_eq!(decode(&bytes).unwrap(), Value::Float(1.0));

    let bytes = encode(&Value::Float(f64::NAN)).unwrap();
    assert!(decode(&bytes).unwrap().as_f64().unwrap().is_nan());
}

#[test]
fn test_unsafe_integer_becomes_float() {
    let value = Value::Int(1 << 53);
    let bytes = encode(&value).unwrap();
    assert_eq!(bytes[0], 0xcb);
    assert_eq!(decode(&bytes).unwrap(), Value::Float(9_007_199_254_740_992.0));
}

#[test]
fn test_big_int_encoding() {
    let bytes = encode(&Value::BigInt(BigInt::from(5))).unwrap();
    assert_eq!(bytes, vec![0x05]);

    let big = BigInt::from(1u64 << 63);
    let bytes = encode(&Value::BigInt(big.clone())).unwrap();
    assert_eq!(bytes, vec![0xcf, 0x80, 0, 0, 0, 0, 0, 0, 0]);
    let options = DecoderOptions::new().with_int_mode(IntMode::BigInt);
    assert_eq!(decode_with_options(&bytes, options).unwrap(), Value::BigInt(big));

    let too_large = BigInt::from(u64::MAX) + 1;
    let err = encode(&Value::BigInt(too_large)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bigint is too large for uint64: 18446744073709551616"
    );

    let too_small = BigInt::from(i64::MIN) - 1;
    assert!(matches!(
        encode(&Value::BigInt(too_small)),
        Err(Error::BigIntOutOfRange { .. })
    ));

    let options = EncoderOptions::new().with_force_big_int_to_int64(true);
    let bytes = encode_with_options(&Value::BigInt(BigInt::from(1)), options).unwrap();
    assert_eq!(bytes, vec![0xcf, 0, 0, 0, 0, 0, 0, 0, 1]);
}

#[test]
fn test_int_modes() {
    let max = [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];

    let lossy = decode(&max).unwrap();
    assert_eq!(lossy, Value::Float(u64::MAX as f64));

    let options = DecoderOptions::new().with_int_mode(IntMode::SafeNumber);
    assert!(matches!(
        decode_with_options(&max, options),
        Err(Error::UnsafeInteger(_))
    ));

    let options = DecoderOptions::new().with_int_mode(IntMode::Mixed);
    assert_eq!(
        decode_with_options(&max, options.clone()).unwrap(),
        Value::BigInt(BigInt::from(u64::MAX))
    );
    assert_eq!(
        decode_with_options(&[0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], options)
            .unwrap(),
        Value::Int(-1)
    );

    let options = DecoderOptions::new().with_int_mode(IntMode::AsEncoded);
    assert_eq!(
        decode_with_options(&[0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], options.clone())
            .unwrap(),
        Value::BigInt(BigInt::from(-1))
    );
    assert_eq!(decode_with_options(&[0x05], options).unwrap(), Value::Int(5));
}

#[test]
fn test_string_headers() {
    let short = "a".repeat(31);
    assert_eq!(encode(&Value::from(short.as_str())).unwrap()[0], 0xbf);

    let medium = "a".repeat(32);
    let bytes = encode(&Value::from(medium.as_str())).unwrap();
    assert_eq!(&bytes[..2], &[0xd9, 0x20]);
    assert_eq!(decode(&bytes).unwrap(), Value::from(medium));

    let long = "é".repeat(200);
    let bytes = encode(&Value::from(long.as_str())).unwrap();
    assert_eq!(&bytes[..3], &[0xda, 0x01, 0x90]);
    assert_eq!(decode(&bytes).unwrap(), Value::from(long));
}

#[test]
fn test_invalid_utf8_is_replaced() {
    assert_eq!(decode(&[0xa1, 0xff]).unwrap(), Value::from("\u{fffd}"));
}

#[test]
fn test_container_headers() {
    let array = Value::Array((0..16).map(Value::from).collect());
    let bytes = encode(&array).unwrap();
    assert_eq!(&bytes[..3], &[0xdc, 0x00, 0x10]);
    assert_eq!(decode(&bytes).unwrap(), array);

    let map: Map = (0..16)
        .map(|i| (MapKey::from(format!("k{}", i)), Value::from(i)))
        .collect();
    let bytes = encode(&Value::Map(map.clone())).unwrap();
    assert_eq!(&bytes[..3], &[0xde, 0x00, 0x10]);
    assert_eq!(decode(&bytes).unwrap(), Value::Map(map));

    let bin = Value::Bin(vec![7; 300]);
    let bytes = encode(&bin).unwrap();
    assert_eq!(&bytes[..3], &[0xc5, 0x01, 0x2c]);
    assert_eq!(decode(&bytes).unwrap(), bin);
}

#[test]
fn test_sort_keys() {
    let mut map = Map::new();
    map.insert(MapKey::from("b"), Value::from(1));
    map.insert(MapKey::from(2), Value::from(2));
    map.insert(MapKey::from("a"), Value::from(3));
    map.insert(MapKey::Float(-0.5), Value::from(4));

    let options = EncoderOptions::new().with_sort_keys(true);
    let bytes = encode_with_options(&Value::Map(map), options).unwrap();
    let mut expected = vec![0x84, 0xcb];
    expected.extend_from_slice(&(-0.5f64).to_be_bytes());
    expected.extend_from_slice(&[0x04, 0x02, 0x02, 0xa1, b'a', 0x03, 0xa1, b'b', 0x01]);
    assert_eq!(bytes, expected);
}

#[test]
fn test_sort_keys_rejects_nan() {
    let mut map = Map::new();
    map.insert(MapKey::Float(f64::NAN), Value::Nil);
    map.insert(MapKey::from(1), Value::Nil);
    let options = EncoderOptions::new().with_sort_keys(true);
    assert!(matches!(
        encode_with_options(&Value::Map(map), options),
        Err(Error::NanKey)
    ));
}

#[test]
fn test_ignore_undefined() {
    let mut map = Map::new();
    map.insert(MapKey::from("gone"), Value::Undefined);
    map.insert(MapKey::from("b"), Value::from(1));

    let bytes = encode(&Value::Map(map.clone())).unwrap();
    assert_eq!(bytes[0], 0x82);

    let options = EncoderOptions::new().with_ignore_undefined(true);
    let bytes = encode_with_options(&Value::Map(map), options).unwrap();
    assert_eq!(bytes, vec![0x81, 0xa1, b'b', 0x01]);
}

#[test]
fn test_max_depth() {
    let nested = msgpack!([[[1]]]);
    let options = EncoderOptions::new().with_max_depth(2);
    let err = encode_with_options(&nested, options).unwrap_err();
    assert_eq!(err.to_string(), "Too deep objects in depth 3");
    assert!(encode_with_options(&nested, EncoderOptions::new().with_max_depth(4)).is_ok());
}

#[test]
fn test_timestamps() {
    let seconds_only = Value::Timestamp(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    let bytes = encode(&seconds_only).unwrap();
    assert_eq!(&bytes[..2], &[0xd6, 0xff]);
    assert_eq!(decode(&bytes).unwrap(), seconds_only);

    let with_nanos = Value::Timestamp(Utc.timestamp_opt(1_700_000_000, 5).unwrap());
    let bytes = encode(&with_nanos).unwrap();
    assert_eq!(&bytes[..2], &[0xd7, 0xff]);
    assert_eq!(decode(&bytes).unwrap(), with_nanos);

    let before_epoch = Value::Timestamp(Utc.timestamp_opt(-1, 0).unwrap());
    let bytes = encode(&before_epoch).unwrap();
    assert_eq!(&bytes[..3], &[0xc7, 0x0c, 0xff]);
    assert_eq!(decode(&bytes).unwrap(), before_epoch);

    let err = decode(&[0xd4, 0xff, 0x00]).unwrap_err();
    assert!(matches!(err, Error::InvalidTimestampSize(1)));
}

#[test]
fn test_timestamp_without_extension() {
    let options = EncoderOptions::new().with_extension_codec(Arc::new(ExtensionCodec::empty()));
    let value = Value::Timestamp(Utc.timestamp_opt(0, 0).unwrap());
    assert!(matches!(
        encode_with_options(&value, options),
        Err(Error::UnsupportedType(_))
    ));

    let options = DecoderOptions::new().with_extension_codec(Arc::new(ExtensionCodec::empty()));
    assert_eq!(
        decode_with_options(&[0xd6, 0xff, 0, 0, 0, 0], options).unwrap(),
        Value::Ext(ExtData::new(-1, vec![0, 0, 0, 0]))
    );
}

#[test]
fn test_custom_extension_roundtrip() {
    // a set of strings travels as extension 0 holding an encoded array
    let codec = Arc::new(ExtensionCodec::new().with_extension(Extension::new(
        0,
        |value: &Value| match value {
            Value::Array(items) if items.iter().all(Value::is_str) && !items.is_empty() => {
                let mut inner = EncoderOptions::new();
                inner.extension_codec = Arc::new(ExtensionCodec::empty());
                encode_with_options(value, inner).map(Some)
            }
            _ => Ok(None),
        },
        |data: &[u8], _| decode(data),
    )));

    let value = msgpack!(["x", "y"]);
    let bytes = encode_with_options(&value, EncoderOptions::new().with_extension_codec(codec.clone()))
        .unwrap();
    assert_eq!(&bytes[..4], &[0xc7, 0x05, 0x00, 0x92]);

    let decoded =
        decode_with_options(&bytes, DecoderOptions::new().with_extension_codec(codec)).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_ext_headers() {
    for (size, head) in [(1usize, 0xd4u8), (2, 0xd5), (4, 0xd6), (8, 0xd7), (16, 0xd8)] {
        let value = Value::Ext(ExtData::new(9, vec![0xab; size]));
        let bytes = encode(&value).unwrap();
        assert_eq!(&bytes[..2], &[head, 0x09]);
        assert_eq!(decode(&bytes).unwrap(), value);
    }
    let value = Value::Ext(ExtData::new(9, vec![0xab; 3]));
    let bytes = encode(&value).unwrap();
    assert_eq!(&bytes[..3], &[0xc7, 0x03, 0x09]);

    let value = Value::Ext(ExtData::new(-9, vec![0; 256]));
    let bytes = encode(&value).unwrap();
    assert_eq!(&bytes[..4], &[0xc8, 0x01, 0x00, 0xf7]);
    assert_eq!(decode(&bytes).unwrap(), value);
}

#[test]
fn test_raw_strings() {
    let bytes = encode(&Value::RawString(vec![0xff, b'a'])).unwrap();
    assert_eq!(bytes, vec![0xa2, 0xff, b'a']);

    let options = DecoderOptions::new()
        .with_raw_binary_string_values(true)
        .with_use_raw_binary_string_class(true);
    assert_eq!(
        decode_with_options(&bytes, options).unwrap(),
        Value::RawString(vec![0xff, b'a'])
    );
}

#[test]
fn test_map_mode_preserves_key_types() {
    let mut map = Map::new();
    map.insert(MapKey::from(1), Value::from("int"));
    map.insert(MapKey::Float(1.5), Value::from("float"));
    map.insert(MapKey::Bin(vec![0]), Value::from("bin"));
    map.insert(MapKey::BigInt(BigInt::from(u64::MAX)), Value::from("big"));
    let bytes = encode(&Value::Map(map)).unwrap();

    let options = DecoderOptions::new()
        .with_use_map(true)
        .with_int_mode(IntMode::Mixed);
    let decoded = decode_with_options(&bytes, options).unwrap();
    let decoded = decoded.as_map().unwrap();
    assert_eq!(decoded.get_key(&MapKey::Int(1)), Some(&Value::from("int")));
    assert_eq!(decoded.get_key(&MapKey::Float(1.5)), Some(&Value::from("float")));
    assert_eq!(decoded.get_key(&MapKey::Bin(vec![0])), Some(&Value::from("bin")));
    assert_eq!(
        decoded.get_key(&MapKey::BigInt(BigInt::from(u64::MAX))),
        Some(&Value::from("big"))
    );

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidKeyType { found: "number", .. }));
}

#[test]
fn test_object_mode_number_keys() {
    let bytes = encode(&msgpack!({ 1: "a", 2.5: "b" })).unwrap();
    let options = DecoderOptions::new().with_support_object_number_keys(true);
    let decoded = decode_with_options(&bytes, options).unwrap();
    assert_eq!(decoded.get("1"), Some(&Value::from("a")));
    assert_eq!(decoded.get("2.5"), Some(&Value::from("b")));
}

#[test]
fn test_key_decoder_can_be_disabled() {
    let bytes = encode(&msgpack!({ "key": 1 })).unwrap();
    let options = DecoderOptions::new().with_key_decoder(None);
    assert_eq!(decode_with_options(&bytes, options).unwrap(), msgpack!({ "key": 1 }));
}

#[test]
fn test_length_limits_reject_before_reading() {
    // header promises 2^32 - 1 elements but the body is absent
    let bytes = [0xdd, 0xff, 0xff, 0xff, 0xff];
    let options = DecoderOptions::new().with_max_array_length(1_000);
    let err = decode_with_options(&bytes, options).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Max length exceeded: array length (4294967295) > maxArrayLength (1000)"
    );

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }));
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
    let decoded = decode(&bytes).unwrap();
    let map = decoded.as_map().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("a"), Some(&Value::Int(2)));
}

#[test]
fn test_encoder_reuse_does_not_leak_bytes() {
    let mut encoder = msgpack_codec::Encoder::new(EncoderOptions::new());
    let first = encoder.encode(&Value::from("a longer string value")).unwrap();
    let second = encoder.encode(&Value::Int(1)).unwrap();
    assert_eq!(second, vec![0x01]);
    assert_eq!(decode(&first).unwrap(), Value::from("a longer string value"));
}
