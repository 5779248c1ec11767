/// Builds a [`Value`](crate::Value) from a literal-like syntax.
///
/// Map keys may be any literal with a [`MapKey`](crate::MapKey) conversion, so both
/// `"name"` and `1` work. Anything else is converted through
/// [`to_value`](crate::to_value).
///
/// ```rust
/// use msgpack_codec::{msgpack, MapKey, Value};
///
/// let value = msgpack!({
///     "name": "Alice",
///     "tags": ["a", nil, true],
///     1: 2.5
/// });
/// assert_eq!(value.get("name"), Some(&Value::from("Alice")));
/// assert_eq!(
///     value.as_map().and_then(|m| m.get_key(&MapKey::Int(1))),
///     Some(&Value::Float(2.5))
/// );
/// ```
#[macro_export]
macro_rules! msgpack {
    (nil) => {
        $crate::Value::Nil
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::msgpack!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::Map::new();
        $(
            map.insert($crate::MapKey::from($key), $crate::msgpack!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::to_value(&$other).unwrap_or($crate::Value::Nil)
    };
}
