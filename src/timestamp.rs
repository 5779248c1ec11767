//! The timestamp extension (type `-1`).
//!
//! A timestamp is written in the smallest of three layouts:
//!
//! | Payload | Layout | Range |
//! |---------|--------|-------|
//! | 4 bytes | `u32` seconds | no nanoseconds, `0..2^32` seconds |
//! | 8 bytes | 30-bit nanoseconds, 34-bit seconds | `0..2^34` seconds |
//! | 12 bytes | `u32` nanoseconds, `i64` seconds | everything else |
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use msgpack_codec::{decode, encode, Value};
//!
//! let epoch = Value::Timestamp(Utc.timestamp_opt(0, 0).unwrap());
//! let bytes = encode(&epoch).unwrap();
//! assert_eq!(bytes, vec![0xd6, 0xff, 0, 0, 0, 0]);
//! assert_eq!(decode(&bytes).unwrap(), epoch);
//! ```

use crate::extension::Extension;
use crate::{Error, Result, Value};
use chrono::{DateTime, Utc};

/// Extension type reserved for timestamps.
pub const EXT_TIMESTAMP: i8 = -1;

const TIMESTAMP32_MAX_SEC: i64 = 0x1_0000_0000 - 1;
const TIMESTAMP64_MAX_SEC: i64 = 0x4_0000_0000 - 1;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Seconds since the Unix epoch with a non-negative nanosecond part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSpec {
    pub sec: i64,
    pub nsec: u32,
}

impl TimeSpec {
    /// Builds a time spec, borrowing from the seconds so that `nsec` ends up in
    /// `0..1_000_000_000`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::timestamp::TimeSpec;
    ///
    /// let spec = TimeSpec::normalized(0, -1);
    /// assert_eq!(spec, TimeSpec { sec: -1, nsec: 999_999_999 });
    /// ```
    #[must_use]
    pub fn normalized(sec: i64, nsec: i64) -> Self {
        TimeSpec {
            sec: sec + nsec.div_euclid(NANOS_PER_SECOND),
            nsec: nsec.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }
}

/// Lays out a time spec in the smallest timestamp payload.
#[must_use]
pub fn encode_time_spec_to_timestamp(spec: TimeSpec) -> Vec<u8> {
    let TimeSpec { sec, nsec } = spec;
    if (0..=TIMESTAMP64_MAX_SEC).contains(&sec) {
        if nsec == 0 && sec <= TIMESTAMP32_MAX_SEC {
            (sec as u32).to_be_bytes().to_vec()
        } else {
            let sec_high = (sec >> 32) as u32;
            let sec_low = sec as u32;
            let mut out = Vec::with_capacity(8);
            out.extend_from_slice(&((nsec << 2) | (sec_high & 0x3)).to_be_bytes());
            out.extend_from_slice(&sec_low.to_be_bytes());
            out
        }
    } else {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&nsec.to_be_bytes());
        out.extend_from_slice(&sec.to_be_bytes());
        out
    }
}

/// Splits a date into whole seconds and nanoseconds.
#[must_use]
pub fn encode_date_to_time_spec(date: &DateTime<Utc>) -> TimeSpec {
    // chrono reports leap seconds as nanos >= 10^9
    TimeSpec::normalized(date.timestamp(), i64::from(date.timestamp_subsec_nanos()))
}

/// Extension encoder: claims [`Value::Timestamp`] and nothing else.
pub fn encode_timestamp_extension(value: &Value) -> Result<Option<Vec<u8>>> {
    match value {
        Value::Timestamp(date) => Ok(Some(encode_time_spec_to_timestamp(
            encode_date_to_time_spec(date),
        ))),
        _ => Ok(None),
    }
}

/// Parses a 4, 8 or 12-byte timestamp payload.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestampSize`] for any other payload length.
pub fn decode_timestamp_to_time_spec(data: &[u8]) -> Result<TimeSpec> {
    match *data {
        [a, b, c, d] => Ok(TimeSpec {
            sec: i64::from(u32::from_be_bytes([a, b, c, d])),
            nsec: 0,
        }),
        [a, b, c, d, e, f, g, h] => {
            let nsec30_sec_high2 = u32::from_be_bytes([a, b, c, d]);
            let sec_low32 = u32::from_be_bytes([e, f, g, h]);
            Ok(TimeSpec {
                sec: (i64::from(nsec30_sec_high2 & 0x3) << 32) | i64::from(sec_low32),
                nsec: nsec30_sec_high2 >> 2,
            })
        }
        [a, b, c, d, ref rest @ ..] if rest.len() == 8 => {
            let mut sec = [0u8; 8];
            sec.copy_from_slice(rest);
            Ok(TimeSpec {
                sec: i64::from_be_bytes(sec),
                nsec: u32::from_be_bytes([a, b, c, d]),
            })
        }
        _ => Err(Error::InvalidTimestampSize(data.len())),
    }
}

/// Extension decoder: turns a timestamp payload into [`Value::Timestamp`].
///
/// # Errors
///
/// Fails on a bad payload length or a time outside chrono's supported range.
pub fn decode_timestamp_extension(data: &[u8], _ext_type: i8) -> Result<Value> {
    let TimeSpec { sec, nsec } = decode_timestamp_to_time_spec(data)?;
    DateTime::from_timestamp(sec, nsec)
        .map(Value::Timestamp)
        .ok_or(Error::TimestampOutOfRange { sec, nsec })
}

/// The built-in timestamp extension, registered by [`ExtensionCodec::new`](crate::ExtensionCodec::new).
#[must_use]
pub fn timestamp_extension() -> Extension {
    Extension::new(
        EXT_TIMESTAMP,
        encode_timestamp_extension,
        decode_timestamp_extension,
    )
}
