//! Resumable MessagePack decoder.
//!
//! [`Decoder`] parses one value at a time with an explicit stack of partially-built
//! arrays and maps instead of recursion. A read that runs past the end of the buffer
//! fails with [`Error::InsufficientData`] without consuming anything, and the
//! in-progress containers stay on the stack, so the chunked drivers can append the next
//! chunk and resume exactly where parsing stopped.
//!
//! Entry points:
//!
//! - [`Decoder::decode`]: exactly one value from a complete buffer
//! - [`Decoder::decode_multi`]: consecutive values from a complete buffer
//! - [`Decoder::decode_async`]: exactly one value from a stream of chunks
//! - [`Decoder::decode_stream`]: consecutive values from a stream of chunks
//! - [`Decoder::decode_array_stream`]: the elements of one top-level array, as they
//!   arrive
//!
//! ## Examples
//!
//! ```rust
//! use msgpack_codec::{Decoder, DecoderOptions, Value};
//!
//! let mut decoder = Decoder::new(DecoderOptions::new()).unwrap();
//! let values: Vec<Value> = decoder
//!     .decode_multi(&[0x01, 0xa1, b'x', 0xc0])
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(values, vec![Value::Int(1), Value::from("x"), Value::Nil]);
//! ```
//!
//! Streaming, with a value split across chunks:
//!
//! ```rust
//! use futures::executor::block_on;
//! use futures::stream;
//! use msgpack_codec::{Decoder, DecoderOptions, Value};
//!
//! let chunks = vec![vec![0x92, 0x01], vec![0x02]];
//! let mut decoder = Decoder::new(DecoderOptions::new()).unwrap();
//! let value = block_on(decoder.decode_async(stream::iter(chunks))).unwrap();
//! assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
//! ```

use crate::int::{convert_safe_integer_to_mode, get_int64, get_uint64};
use crate::utf8::utf8_decode;
use crate::{DecoderOptions, Error, IntMode, Map, MapKey, Result, Value};
use futures::stream::{self, Stream, StreamExt};
use std::borrow::BorrowMut;
use std::iter::FusedIterator;
use std::mem;
use std::pin::Pin;
use tracing::{debug, trace};

// Length fields are untrusted; containers grow past this on demand.
const MAX_PREALLOCATED_ITEMS: usize = 1024;

enum StackState {
    Array {
        array: Vec<Value>,
        size: usize,
    },
    MapKey {
        map: Map,
        size: usize,
        read_count: usize,
    },
    MapValue {
        map: Map,
        key: MapKey,
        size: usize,
        read_count: usize,
    },
    Vacant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StateKind {
    Array,
    MapKey,
    MapValue,
}

/// Stack of in-progress containers. Slots are kept across decodes and reused.
struct StackPool {
    states: Vec<StackState>,
    len: usize,
}

impl StackPool {
    fn new() -> Self {
        StackPool {
            states: Vec::new(),
            len: 0,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn top_kind(&self) -> Option<StateKind> {
        let top = self.len.checked_sub(1)?;
        match self.states[top] {
            StackState::Array { .. } => Some(StateKind::Array),
            StackState::MapKey { .. } => Some(StateKind::MapKey),
            StackState::MapValue { .. } => Some(StateKind::MapValue),
            StackState::Vacant => None,
        }
    }

    fn top_mut(&mut self) -> Result<&mut StackState> {
        let top = self.len.checked_sub(1).ok_or(Error::InvalidStackState)?;
        Ok(&mut self.states[top])
    }

    fn push(&mut self, state: StackState) {
        if self.len < self.states.len() {
            self.states[self.len] = state;
        } else {
            self.states.push(state);
        }
        self.len += 1;
    }

    fn push_array_state(&mut self, size: usize) {
        self.push(StackState::Array {
            array: Vec::with_capacity(size.min(MAX_PREALLOCATED_ITEMS)),
            size,
        });
    }

    fn push_map_state(&mut self, size: usize) {
        self.push(StackState::MapKey {
            map: Map::with_capacity(size.min(MAX_PREALLOCATED_ITEMS)),
            size,
            read_count: 0,
        });
    }

    /// Appends an element to the top array; `true` once the array is full.
    fn push_array_item(&mut self, value: Value) -> Result<bool> {
        match self.top_mut()? {
            StackState::Array { array, size } => {
                array.push(value);
                Ok(array.len() == *size)
            }
            _ => Err(Error::InvalidStackState),
        }
    }

    fn set_map_key(&mut self, key: MapKey) -> Result<()> {
        let state = self.top_mut()?;
        match mem::replace(state, StackState::Vacant) {
            StackState::MapKey {
                map,
                size,
                read_count,
            } => {
                *state = StackState::MapValue {
                    map,
                    key,
                    size,
                    read_count,
                };
                Ok(())
            }
            other => {
                *state = other;
                Err(Error::InvalidStackState)
            }
        }
    }

    /// Stores a value under the pending key; `true` once every entry has been read.
    fn set_map_value(&mut self, value: Value) -> Result<bool> {
        let state = self.top_mut()?;
        match mem::replace(state, StackState::Vacant) {
            StackState::MapValue {
                mut map,
                key,
                size,
                read_count,
            } => {
                map.insert(key, value);
                let read_count = read_count + 1;
                *state = StackState::MapKey {
                    map,
                    size,
                    read_count,
                };
                Ok(read_count == size)
            }
            other => {
                *state = other;
                Err(Error::InvalidStackState)
            }
        }
    }

    fn release(&mut self, index: usize) -> Result<StackState> {
        if index + 1 != self.len {
            return Err(Error::InvalidStackState);
        }
        self.len -= 1;
        Ok(mem::replace(&mut self.states[index], StackState::Vacant))
    }

    fn release_array(&mut self, index: usize) -> Result<Vec<Value>> {
        match self.release(index)? {
            StackState::Array { array, .. } => Ok(array),
            _ => Err(Error::InvalidStackState),
        }
    }

    fn release_map(&mut self, index: usize) -> Result<Map> {
        match self.release(index)? {
            StackState::MapKey { map, .. } => Ok(map),
            _ => Err(Error::InvalidStackState),
        }
    }

    fn reset(&mut self) {
        for state in &mut self.states[..self.len] {
            *state = StackState::Vacant;
        }
        self.len = 0;
    }
}

/// A reusable, resumable MessagePack decoder.
pub struct Decoder {
    options: DecoderOptions,
    int_mode: IntMode,
    total_pos: usize,
    pos: usize,
    bytes: Vec<u8>,
    head_byte: Option<u8>,
    stack: StackPool,
}

impl Decoder {
    /// Creates a decoder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when `raw_binary_string_keys` is set without
    /// `use_map`.
    pub fn new(options: DecoderOptions) -> Result<Self> {
        if options.raw_binary_string_keys && !options.use_map {
            return Err(Error::InvalidOptions(
                "raw_binary_string_keys is only supported when use_map is true".to_string(),
            ));
        }
        Ok(Decoder {
            int_mode: options.effective_int_mode(),
            options,
            total_pos: 0,
            pos: 0,
            bytes: Vec::new(),
            head_byte: None,
            stack: StackPool::new(),
        })
    }

    /// The options this decoder was built with.
    #[must_use]
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    fn reinitialize_state(&mut self) {
        self.total_pos = 0;
        self.head_byte = None;
        self.stack.reset();
    }

    // Every read goes through the owned buffer, so one-shot input is copied in.
    // The allocation is kept across calls and only grows.
    fn set_buffer(&mut self, buffer: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(buffer);
        self.pos = 0;
    }

    fn append_buffer(&mut self, buffer: &[u8]) {
        trace!(
            consumed = self.pos,
            pending = self.bytes.len() - self.pos,
            appended = buffer.len(),
            "appending chunk"
        );
        self.total_pos += self.pos;
        self.bytes.drain(..self.pos);
        self.bytes.extend_from_slice(buffer);
        self.pos = 0;
    }

    fn has_remaining(&self, width: usize) -> bool {
        self.bytes.len() - self.pos >= width
    }

    fn current_total_pos(&self) -> usize {
        self.total_pos + self.pos
    }

    fn create_extra_byte_error(&self, pos_to_show: usize) -> Error {
        Error::ExtraBytes {
            extra: self.bytes.len() - self.pos,
            total: self.bytes.len(),
            pos: pos_to_show,
        }
    }

    fn exhaustion_error(&self) -> Error {
        Error::UnexpectedEof {
            head_byte: self.head_byte,
            total_pos: self.current_total_pos(),
            pos: self.pos,
        }
    }

    fn fatal(&self, err: Error) -> Error {
        if err.is_insufficient_data() {
            self.exhaustion_error()
        } else {
            err
        }
    }

    /// Decodes exactly one value from a complete buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtraBytes`] if bytes follow the value,
    /// [`Error::UnexpectedEof`] if the buffer ends inside it, or any format or limit
    /// error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgpack_codec::{Decoder, DecoderOptions, Error, Value};
    ///
    /// let mut decoder = Decoder::new(DecoderOptions::new()).unwrap();
    /// assert_eq!(decoder.decode(&[0xc3]).unwrap(), Value::Bool(true));
    /// assert!(matches!(decoder.decode(&[0xc3, 0xc3]), Err(Error::ExtraBytes { .. })));
    /// ```
    pub fn decode(&mut self, buffer: &[u8]) -> Result<Value> {
        self.reinitialize_state();
        self.set_buffer(buffer);
        let object = self.do_decode_sync().map_err(|err| self.fatal(err))?;
        if self.has_remaining(1) {
            return Err(self.create_extra_byte_error(self.pos));
        }
        Ok(object)
    }

    /// Iterates over consecutive values in a complete buffer.
    ///
    /// The iterator yields at most one error and then stops.
    pub fn decode_multi(&mut self, buffer: &[u8]) -> DecodeMulti<&mut Decoder> {
        self.reinitialize_state();
        self.set_buffer(buffer);
        DecodeMulti {
            decoder: self,
            finished: false,
        }
    }

    /// Owning form of [`decode_multi`](Self::decode_multi).
    #[must_use]
    pub fn into_multi(mut self, buffer: &[u8]) -> DecodeMulti<Decoder> {
        self.reinitialize_state();
        self.set_buffer(buffer);
        DecodeMulti {
            decoder: self,
            finished: false,
        }
    }

    /// Decodes exactly one value from a stream of chunks.
    ///
    /// Empty chunks are ignored. Any non-empty chunk after the value is complete is an
    /// error.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode), with positions counted across chunks.
    pub async fn decode_async<S>(&mut self, stream: S) -> Result<Value>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        self.reinitialize_state();
        self.set_buffer(&[]);
        futures::pin_mut!(stream);

        let mut decoded = None;
        while let Some(item) = stream.next().await {
            let chunk = item.as_ref();
            if decoded.is_some() {
                if chunk.is_empty() {
                    continue;
                }
                self.append_buffer(chunk);
                return Err(self.create_extra_byte_error(self.current_total_pos()));
            }
            self.append_buffer(chunk);
            match self.do_decode_sync() {
                Ok(object) => decoded = Some(object),
                Err(err) if err.is_insufficient_data() => {
                    trace!(total_pos = self.current_total_pos(), "waiting for more data");
                }
                Err(err) => return Err(err),
            }
        }

        match decoded {
            Some(_) if self.has_remaining(1) => {
                Err(self.create_extra_byte_error(self.current_total_pos()))
            }
            Some(object) => Ok(object),
            None => Err(self.exhaustion_error()),
        }
    }

    /// Yields consecutive values from a stream of chunks as soon as each completes.
    ///
    /// A stream that ends in the middle of a value yields a final
    /// [`Error::UnexpectedEof`]. The stream stops after its first error.
    pub fn decode_stream<'a, S>(&'a mut self, stream: S) -> impl Stream<Item = Result<Value>> + 'a
    where
        S: Stream + 'a,
        S::Item: AsRef<[u8]>,
    {
        decode_multi_stream(self, stream, false)
    }

    /// Yields the elements of a single top-level array from a stream of chunks.
    ///
    /// The array header may itself be split across chunks. Bytes after the last element,
    /// whether in the same chunk or a later one, are an [`Error::ExtraBytes`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use futures::executor::block_on;
    /// use futures::{stream, StreamExt};
    /// use msgpack_codec::{Decoder, DecoderOptions, Value};
    ///
    /// let chunks = vec![vec![0x93, 0x01], vec![0x02, 0x03]];
    /// let mut decoder = Decoder::new(DecoderOptions::new()).unwrap();
    /// let items: Vec<_> = block_on(
    ///     decoder
    ///         .decode_array_stream(stream::iter(chunks))
    ///         .collect::<Vec<_>>(),
    /// );
    /// let items: Vec<Value> = items.into_iter().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(items, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    /// ```
    pub fn decode_array_stream<'a, S>(
        &'a mut self,
        stream: S,
    ) -> impl Stream<Item = Result<Value>> + 'a
    where
        S: Stream + 'a,
        S::Item: AsRef<[u8]>,
    {
        decode_multi_stream(self, stream, true)
    }

    /// Owning form of [`decode_stream`](Self::decode_stream).
    pub fn into_stream<S>(self, stream: S) -> impl Stream<Item = Result<Value>>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        decode_multi_stream(self, stream, false)
    }

    /// Owning form of [`decode_array_stream`](Self::decode_array_stream).
    pub fn into_array_stream<S>(self, stream: S) -> impl Stream<Item = Result<Value>>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        decode_multi_stream(self, stream, true)
    }

    fn do_decode_sync(&mut self) -> Result<Value> {
        'decode: loop {
            let head_byte = self.read_head_byte()?;
            let mut object = match head_byte {
                // positive fixint
                0x00..=0x7f => self.convert_number(i64::from(head_byte)),
                // fixmap
                0x80..=0x8f => {
                    let size = usize::from(head_byte - 0x80);
                    if size != 0 {
                        self.push_map_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Map(Map::new())
                }
                // fixarray
                0x90..=0x9f => {
                    let size = usize::from(head_byte - 0x90);
                    if size != 0 {
                        self.push_array_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Array(Vec::new())
                }
                // fixstr
                0xa0..=0xbf => self.decode_string(usize::from(head_byte - 0xa0), 0)?,
                0xc0 => Value::Nil,
                0xc2 => Value::Bool(false),
                0xc3 => Value::Bool(true),
                0xc4 => {
                    let size = usize::from(self.look_u8()?);
                    Value::Bin(self.decode_binary(size, 1)?)
                }
                0xc5 => {
                    let size = usize::from(self.look_u16()?);
                    Value::Bin(self.decode_binary(size, 2)?)
                }
                0xc6 => {
                    let size = self.look_u32()? as usize;
                    Value::Bin(self.decode_binary(size, 4)?)
                }
                0xc7 => {
                    let size = usize::from(self.look_u8()?);
                    self.decode_extension(size, 1)?
                }
                0xc8 => {
                    let size = usize::from(self.look_u16()?);
                    self.decode_extension(size, 2)?
                }
                0xc9 => {
                    let size = self.look_u32()? as usize;
                    self.decode_extension(size, 4)?
                }
                0xca => Value::Float(f64::from(f32::from_be_bytes(self.read_bytes()?))),
                0xcb => Value::Float(f64::from_be_bytes(self.read_bytes()?)),
                0xcc => {
                    let value = self.read_u8()?;
                    self.convert_number(i64::from(value))
                }
                0xcd => {
                    let value = u16::from_be_bytes(self.read_bytes()?);
                    self.convert_number(i64::from(value))
                }
                0xce => {
                    let value = u32::from_be_bytes(self.read_bytes()?);
                    self.convert_number(i64::from(value))
                }
                0xcf => {
                    let value = get_uint64(self.look_bytes(0)?, self.int_mode)?;
                    self.pos += 8;
                    value
                }
                0xd0 => {
                    let value = i8::from_be_bytes(self.read_bytes()?);
                    self.convert_number(i64::from(value))
                }
                0xd1 => {
                    let value = i16::from_be_bytes(self.read_bytes()?);
                    self.convert_number(i64::from(value))
                }
                0xd2 => {
                    let value = i32::from_be_bytes(self.read_bytes()?);
                    self.convert_number(i64::from(value))
                }
                0xd3 => {
                    let value = get_int64(self.look_bytes(0)?, self.int_mode)?;
                    self.pos += 8;
                    value
                }
                0xd4 => self.decode_extension(1, 0)?,
                0xd5 => self.decode_extension(2, 0)?,
                0xd6 => self.decode_extension(4, 0)?,
                0xd7 => self.decode_extension(8, 0)?,
                0xd8 => self.decode_extension(16, 0)?,
                0xd9 => {
                    let size = usize::from(self.look_u8()?);
                    self.decode_string(size, 1)?
                }
                0xda => {
                    let size = usize::from(self.look_u16()?);
                    self.decode_string(size, 2)?
                }
                0xdb => {
                    let size = self.look_u32()? as usize;
                    self.decode_string(size, 4)?
                }
                0xdc => {
                    let size = usize::from(u16::from_be_bytes(self.read_bytes()?));
                    if size != 0 {
                        self.push_array_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Array(Vec::new())
                }
                0xdd => {
                    let size = u32::from_be_bytes(self.read_bytes()?) as usize;
                    if size != 0 {
                        self.push_array_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Array(Vec::new())
                }
                0xde => {
                    let size = usize::from(u16::from_be_bytes(self.read_bytes()?));
                    if size != 0 {
                        self.push_map_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Map(Map::new())
                }
                0xdf => {
                    let size = u32::from_be_bytes(self.read_bytes()?) as usize;
                    if size != 0 {
                        self.push_map_state(size)?;
                        self.complete();
                        continue 'decode;
                    }
                    Value::Map(Map::new())
                }
                // negative fixint
                0xe0..=0xff => self.convert_number(i64::from(head_byte) - 0x100),
                0xc1 => return Err(Error::UnrecognizedTypeByte { byte: head_byte }),
            };

            self.complete();

            loop {
                let Some(kind) = self.stack.top_kind() else {
                    return Ok(object);
                };
                let top = self.stack.len() - 1;
                match kind {
                    StateKind::Array => {
                        if !self.stack.push_array_item(object)? {
                            continue 'decode;
                        }
                        object = Value::Array(self.stack.release_array(top)?);
                    }
                    StateKind::MapKey => {
                        let key = self.map_key_from(object)?;
                        self.stack.set_map_key(key)?;
                        continue 'decode;
                    }
                    StateKind::MapValue => {
                        if !self.stack.set_map_value(object)? {
                            continue 'decode;
                        }
                        object = Value::Map(self.stack.release_map(top)?);
                    }
                }
            }
        }
    }

    fn read_head_byte(&mut self) -> Result<u8> {
        if let Some(head_byte) = self.head_byte {
            return Ok(head_byte);
        }
        let head_byte = self.read_u8()?;
        self.head_byte = Some(head_byte);
        Ok(head_byte)
    }

    fn complete(&mut self) {
        self.head_byte = None;
    }

    fn read_array_size(&mut self) -> Result<usize> {
        let head_byte = self.read_head_byte()?;
        match head_byte {
            0xdc => Ok(usize::from(u16::from_be_bytes(self.read_bytes()?))),
            0xdd => Ok(u32::from_be_bytes(self.read_bytes()?) as usize),
            0x90..=0x9f => Ok(usize::from(head_byte - 0x90)),
            _ => Err(Error::UnrecognizedArrayTypeByte { byte: head_byte }),
        }
    }

    fn push_map_state(&mut self, size: usize) -> Result<()> {
        if size > self.options.max_map_length {
            return Err(Error::max_length_exceeded(
                "map",
                size,
                "maxMapLength",
                self.options.max_map_length,
            ));
        }
        self.stack.push_map_state(size);
        Ok(())
    }

    fn push_array_state(&mut self, size: usize) -> Result<()> {
        if size > self.options.max_array_length {
            return Err(Error::max_length_exceeded(
                "array",
                size,
                "maxArrayLength",
                self.options.max_array_length,
            ));
        }
        self.stack.push_array_state(size);
        Ok(())
    }

    fn state_is_map_key(&self) -> bool {
        self.stack.top_kind() == Some(StateKind::MapKey)
    }

    fn map_key_from(&self, object: Value) -> Result<MapKey> {
        if self.options.use_map {
            return MapKey::try_from(object);
        }
        let support_numbers = self.options.support_object_number_keys;
        match object {
            Value::Str(key) if key == "__proto__" => Err(Error::ProtoKey),
            Value::Str(key) => Ok(MapKey::Str(key)),
            Value::Int(i) if support_numbers => Ok(MapKey::Str(i.to_string())),
            Value::Float(f) if support_numbers => Ok(MapKey::Str(number_key_string(f))),
            other => Err(Error::InvalidKeyType {
                expected: if support_numbers {
                    "string or number"
                } else {
                    "string"
                },
                found: other.type_name(),
            }),
        }
    }

    fn decode_string(&mut self, byte_length: usize, header_offset: usize) -> Result<Value> {
        let raw = if self.state_is_map_key() {
            self.options.raw_binary_string_keys
        } else {
            self.options.raw_binary_string_values
        };
        if raw {
            let bytes = self.decode_binary(byte_length, header_offset)?;
            return Ok(if self.options.use_raw_binary_string_class {
                Value::RawString(bytes)
            } else {
                Value::Bin(bytes)
            });
        }
        self.decode_utf8_string(byte_length, header_offset)
    }

    fn decode_utf8_string(&mut self, byte_length: usize, header_offset: usize) -> Result<Value> {
        if byte_length > self.options.max_str_length {
            return Err(Error::max_length_exceeded(
                "UTF-8 byte",
                byte_length,
                "maxStrLength",
                self.options.max_str_length,
            ));
        }
        let in_key = self.state_is_map_key();
        let start = self.pos + header_offset;
        let bytes = self
            .bytes
            .get(start..start + byte_length)
            .ok_or(Error::InsufficientData)?;
        let value = match &self.options.key_decoder {
            Some(key_decoder) if in_key && key_decoder.can_be_cached(byte_length) => {
                key_decoder.decode(bytes)
            }
            _ => utf8_decode(bytes),
        };
        self.pos += header_offset + byte_length;
        Ok(Value::Str(value))
    }

    fn decode_binary(&mut self, byte_length: usize, header_offset: usize) -> Result<Vec<u8>> {
        if byte_length > self.options.max_bin_length {
            return Err(Error::max_length_exceeded(
                "bin",
                byte_length,
                "maxBinLength",
                self.options.max_bin_length,
            ));
        }
        let start = self.pos + header_offset;
        let data = self
            .bytes
            .get(start..start + byte_length)
            .ok_or(Error::InsufficientData)?
            .to_vec();
        self.pos += header_offset + byte_length;
        Ok(data)
    }

    fn decode_extension(&mut self, size: usize, header_offset: usize) -> Result<Value> {
        if size > self.options.max_ext_length {
            return Err(Error::max_length_exceeded(
                "ext",
                size,
                "maxExtLength",
                self.options.max_ext_length,
            ));
        }
        let ext_type = i8::from_be_bytes(self.look_bytes(header_offset)?);
        let data = self.decode_binary(size, header_offset + 1)?;
        self.options.extension_codec.decode(&data, ext_type)
    }

    fn convert_number(&self, value: i64) -> Value {
        convert_safe_integer_to_mode(value, self.int_mode)
    }

    fn look_bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let start = self.pos + offset;
        self.bytes
            .get(start..start + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(Error::InsufficientData)
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.look_bytes(0)?;
        self.pos += N;
        Ok(bytes)
    }

    fn look_u8(&self) -> Result<u8> {
        self.look_bytes::<1>(0).map(|[byte]| byte)
    }

    fn look_u16(&self) -> Result<u16> {
        self.look_bytes(0).map(u16::from_be_bytes)
    }

    fn look_u32(&self) -> Result<u32> {
        self.look_bytes(0).map(u32::from_be_bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes::<1>().map(|[byte]| byte)
    }
}

// Host-number spelling of a numeric key in plain-object maps.
fn number_key_string(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Iterator returned by [`Decoder::decode_multi`] and [`Decoder::into_multi`].
pub struct DecodeMulti<D> {
    decoder: D,
    finished: bool,
}

impl<D: BorrowMut<Decoder>> Iterator for DecodeMulti<D> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder: &mut Decoder = self.decoder.borrow_mut();
        if self.finished || !decoder.has_remaining(1) {
            return None;
        }
        let result = decoder.do_decode_sync();
        if result.is_err() {
            self.finished = true;
        }
        Some(result.map_err(|err| decoder.fatal(err)))
    }
}

impl<D: BorrowMut<Decoder>> FusedIterator for DecodeMulti<D> {}

struct StreamState<D, S> {
    decoder: D,
    stream: Pin<Box<S>>,
    header_pending: bool,
    items_left: Option<usize>,
    buffered: bool,
    finished: bool,
}

impl<D, S> StreamState<D, S>
where
    D: BorrowMut<Decoder>,
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    async fn next_item(&mut self) -> Option<Result<Value>> {
        loop {
            if self.finished {
                return None;
            }
            if self.items_left == Some(0) {
                let decoder: &mut Decoder = self.decoder.borrow_mut();
                if decoder.has_remaining(1) {
                    self.finished = true;
                    return Some(Err(
                        decoder.create_extra_byte_error(decoder.current_total_pos())
                    ));
                }
            }
            if self.buffered && self.items_left != Some(0) {
                let decoder: &mut Decoder = self.decoder.borrow_mut();
                match decoder.do_decode_sync() {
                    Ok(value) => {
                        if let Some(left) = self.items_left.as_mut() {
                            *left -= 1;
                        }
                        return Some(Ok(value));
                    }
                    Err(err) if err.is_insufficient_data() => self.buffered = false,
                    Err(err) => {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
            }

            let Some(item) = self.stream.next().await else {
                self.finished = true;
                return self.exhausted().map(Err);
            };
            let chunk = item.as_ref();
            let decoder: &mut Decoder = self.decoder.borrow_mut();
            if self.items_left == Some(0) {
                if chunk.is_empty() {
                    continue;
                }
                self.finished = true;
                decoder.append_buffer(chunk);
                return Some(Err(
                    decoder.create_extra_byte_error(decoder.current_total_pos())
                ));
            }
            decoder.append_buffer(chunk);
            self.buffered = true;

            if self.header_pending {
                match decoder.read_array_size() {
                    Ok(size) => {
                        decoder.complete();
                        self.header_pending = false;
                        self.items_left = Some(size);
                    }
                    Err(err) if err.is_insufficient_data() => self.buffered = false,
                    Err(err) => {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
            }
        }
    }

    fn exhausted(&mut self) -> Option<Error> {
        let decoder: &mut Decoder = self.decoder.borrow_mut();
        let incomplete = decoder.head_byte.is_some()
            || decoder.stack.len() > 0
            || decoder.has_remaining(1)
            || matches!(self.items_left, Some(left) if left > 0);
        if incomplete {
            debug!(
                total_pos = decoder.current_total_pos(),
                "stream ended inside a value"
            );
            Some(decoder.exhaustion_error())
        } else {
            None
        }
    }
}

fn decode_multi_stream<D, S>(
    mut decoder: D,
    stream: S,
    is_array: bool,
) -> impl Stream<Item = Result<Value>>
where
    D: BorrowMut<Decoder>,
    S: Stream,
    S::Item: AsRef<[u8]>,
{
    {
        let inner: &mut Decoder = decoder.borrow_mut();
        inner.reinitialize_state();
        inner.set_buffer(&[]);
    }
    let state = StreamState {
        decoder,
        stream: Box::pin(stream),
        header_pending: is_array,
        items_left: None,
        buffered: false,
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        let item = state.next_item().await?;
        Some((item, state))
    })
}
