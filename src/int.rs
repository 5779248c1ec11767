//! 64-bit integer helpers and decode precision modes.
//!
//! MessagePack carries integers up to 64 bits wide, while the host-number model used by
//! [`Value`] treats only integers within `±(2^53 - 1)` as exact ("safe"). The
//! [`IntMode`] chosen on the decoder decides what happens to wider wire values.

use crate::{Error, Result, Value};
use num_bigint::BigInt;

/// Largest value of a 32-bit unsigned header field, also the default decode limit.
pub const UINT32_MAX: usize = 4_294_967_295;

/// Largest integer exactly representable by an `f64`.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Smallest integer exactly representable by an `f64`.
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// How integers are materialized when decoding.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::{decode_with_options, DecoderOptions, IntMode, Value};
///
/// // uint64 holding 1
/// let bytes = [0xcf, 0, 0, 0, 0, 0, 0, 0, 1];
///
/// let plain = decode_with_options(&bytes, DecoderOptions::new()).unwrap();
/// assert_eq!(plain, Value::Int(1));
///
/// let options = DecoderOptions::new().with_int_mode(IntMode::AsEncoded);
/// let wide = decode_with_options(&bytes, options).unwrap();
/// assert!(wide.is_bigint());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum IntMode {
    /// Always a host number; 64-bit values outside the safe range lose precision.
    #[default]
    UnsafeNumber,
    /// Always a host number; 64-bit values outside the safe range are an error.
    SafeNumber,
    /// int64/uint64 wire values become big integers, narrower widths host numbers.
    AsEncoded,
    /// Host numbers inside the safe range, big integers outside it.
    Mixed,
    /// Every integer becomes a big integer.
    BigInt,
}

/// Returns `true` when `value` is an integer exactly representable by an `f64`.
#[inline]
#[must_use]
pub fn is_safe_integer(value: f64) -> bool {
    value.is_finite() && value.trunc() == value && value.abs() <= MAX_SAFE_INTEGER as f64
}

#[inline]
pub(crate) const fn is_safe_i64(value: i64) -> bool {
    value >= MIN_SAFE_INTEGER && value <= MAX_SAFE_INTEGER
}

/// Writes `value` as a big-endian uint64 field.
///
/// # Panics
///
/// Panics if `output` is shorter than 8 bytes.
pub fn set_uint64(output: &mut [u8], value: u64) {
    output[..8].copy_from_slice(&value.to_be_bytes());
}

/// Writes `value` as a big-endian two's complement int64 field.
///
/// # Panics
///
/// Panics if `output` is shorter than 8 bytes.
pub fn set_int64(output: &mut [u8], value: i64) {
    output[..8].copy_from_slice(&value.to_be_bytes());
}

/// Reads a big-endian int64 field and materializes it under `mode`.
///
/// # Errors
///
/// Returns [`Error::UnsafeInteger`] in [`IntMode::SafeNumber`] when the value lies
/// outside the safe range; the message carries the value in hex.
pub fn get_int64(bytes: [u8; 8], mode: IntMode) -> Result<Value> {
    let value = i64::from_be_bytes(bytes);
    match mode {
        IntMode::UnsafeNumber => Ok(lossy_number(value)),
        IntMode::SafeNumber => {
            if is_safe_i64(value) {
                Ok(Value::Int(value))
            } else {
                let high = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let low = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                let sign = if high < 0 { "-" } else { "" };
                Err(Error::UnsafeInteger(format!(
                    "{}0x{:x}{:08x}",
                    sign,
                    high.unsigned_abs(),
                    low
                )))
            }
        }
        IntMode::Mixed if is_safe_i64(value) => Ok(Value::Int(value)),
        IntMode::AsEncoded | IntMode::Mixed | IntMode::BigInt => {
            Ok(Value::BigInt(BigInt::from(value)))
        }
    }
}

/// Reads a big-endian uint64 field and materializes it under `mode`.
///
/// # Errors
///
/// Returns [`Error::UnsafeInteger`] in [`IntMode::SafeNumber`] when the value exceeds
/// [`MAX_SAFE_INTEGER`].
pub fn get_uint64(bytes: [u8; 8], mode: IntMode) -> Result<Value> {
    let value = u64::from_be_bytes(bytes);
    let safe = value <= MAX_SAFE_INTEGER as u64;
    match mode {
        IntMode::UnsafeNumber if safe => Ok(Value::Int(value as i64)),
        IntMode::UnsafeNumber => Ok(Value::Float(value as f64)),
        IntMode::SafeNumber if safe => Ok(Value::Int(value as i64)),
        IntMode::SafeNumber => {
            let high = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let low = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            Err(Error::UnsafeInteger(format!("0x{:x}{:08x}", high, low)))
        }
        IntMode::Mixed if safe => Ok(Value::Int(value as i64)),
        IntMode::AsEncoded | IntMode::Mixed | IntMode::BigInt => {
            Ok(Value::BigInt(BigInt::from(value)))
        }
    }
}

/// Converts an integer read from a wire width narrower than 64 bits.
///
/// Only [`IntMode::BigInt`] promotes these to big integers.
#[inline]
#[must_use]
pub fn convert_safe_integer_to_mode(value: i64, mode: IntMode) -> Value {
    match mode {
        IntMode::BigInt => Value::BigInt(BigInt::from(value)),
        _ => Value::Int(value),
    }
}

// Host-number semantics: exact inside the safe range, nearest double outside it.
fn lossy_number(value: i64) -> Value {
    if is_safe_i64(value) {
        Value::Int(value)
    } else {
        Value::Float(value as f64)
    }
}
