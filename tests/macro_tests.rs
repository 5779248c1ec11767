use msgpack_codec::{decode, encode, msgpack, Map, MapKey, Value};

#[test]
fn test_msgpack_macro_nil() {
    let value = msgpack!(nil);
    assert_eq!(value, Value::Nil);
    assert_eq!(encode(&value).unwrap(), vec![0xc0]);
}

#[test]
fn test_msgpack_macro_booleans() {
    assert_eq!(msgpack!(true), Value::Bool(true));
    assert_eq!(msgpack!(false), Value::Bool(false));
}

#[test]
fn test_msgpack_macro_numbers() {
    assert_eq!(msgpack!(42), Value::Int(42));
    assert_eq!(msgpack!(3.5), Value::Float(3.5));
    assert_eq!(msgpack!(-123), Value::Int(-123));
    assert_eq!(msgpack!(u64::MAX), Value::from(u64::MAX));
}

#[test]
fn test_msgpack_macro_strings() {
    assert_eq!(msgpack!("hello world"), Value::from("hello world"));
    assert_eq!(msgpack!(""), Value::Str(String::new()));
}

#[test]
fn test_msgpack_macro_arrays() {
    assert_eq!(msgpack!([]), Value::Array(vec![]));
    assert_eq!(
        msgpack!([1, "hello", true, nil]),
        Value::Array(vec![
            Value::Int(1),
            Value::from("hello"),
            Value::Bool(true),
            Value::Nil,
        ])
    );
}

#[test]
fn test_msgpack_macro_maps() {
    assert_eq!(msgpack!({}), Value::Map(Map::new()));

    let value = msgpack!({
        "name": "Alice",
        "age": 30
    });
    let map = value.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("name"), Some(&Value::from("Alice")));
    assert_eq!(map.get("age"), Some(&Value::Int(30)));
}

#[test]
fn test_msgpack_macro_nested() {
    let nested = msgpack!({
        "user": {
            "id": 123,
            "name": "Bob",
            "active": true
        },
        "tags": ["admin", "developer"],
        "count": 42
    });

    let user = nested.get("user").and_then(Value::as_map).unwrap();
    assert_eq!(user.get("id"), Some(&Value::Int(123)));
    assert_eq!(user.get("active"), Some(&Value::Bool(true)));

    let tags = nested.get("tags").and_then(Value::as_array).unwrap();
    assert_eq!(tags, &vec![Value::from("admin"), Value::from("developer")]);

    assert_eq!(decode(&encode(&nested).unwrap()).unwrap(), nested);
}

#[test]
fn test_msgpack_macro_mixed_keys() {
    let value = msgpack!({ "a": 1, 2: "b" });
    let map = value.as_map().unwrap();
    let keys: Vec<&MapKey> = map.keys().collect();
    assert_eq!(keys, vec![&MapKey::from("a"), &MapKey::Int(2)]);
}

#[test]
fn test_value_predicates() {
    let nil = msgpack!(nil);
    assert!(nil.is_nil());
    assert!(!nil.is_bool());
    assert!(!nil.is_number());
    assert!(!nil.is_str());
    assert!(!nil.is_array());
    assert!(!nil.is_map());

    let string = msgpack!("hello");
    assert!(string.is_str());
    assert_eq!(string.as_str(), Some("hello"));

    let array = msgpack!([1, 2, 3]);
    assert_eq!(array.as_array().map(Vec::len), Some(3));

    let map = msgpack!({"key": "value"});
    assert_eq!(map.as_map().map(Map::len), Some(1));
}
