//! Bit-granular stream used by the replication wire format.
//!
//! Value encoding is `naia-serde`'s: bits are packed LSB-first, numbers are
//! written as little-endian bytes and strings carry a variable-length byte
//! count. This module adds what the entity framing needs on top of it: a
//! growable writer (naia's own `BitWriter` is MTU sized), a reader bounded
//! to an exact bit length, and length-prefixed sub-payloads that keep the
//! outer stream aligned whatever the inner decoder does.

use naia_serde::{BitWrite, Serde, SerdeErr};

/// Errors raised while decoding a bit stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The reader ran past the end of its (sub-)stream.
    #[error("unexpected end of stream: needed {needed} bits, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// `naia-serde` rejected the bits it was handed.
    #[error("malformed value in bit stream")]
    Malformed,

    /// The decoded layout did not match what the sender encoded.
    #[error("framing error: {0}")]
    Framing(String),
}

impl From<SerdeErr> for StreamError {
    fn from(_: SerdeErr) -> Self {
        StreamError::Malformed
    }
}

// ── Writer ──────────────────────────────────────────────────

/// A growable bit sink for `naia-serde` values.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bits_written: usize,
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        self.push_bit(bit);
    }

    fn write_byte(&mut self, byte: u8) {
        let mut temp = byte;
        for _ in 0..8 {
            self.push_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn count_bits(&mut self, _bits: u32) {}

    fn is_counter(&self) -> bool {
        false
    }
}

impl BitWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_bit(&mut self, bit: bool) {
        let offset = self.bits_written % 8;
        if offset == 0 {
            self.buffer.push(0);
        }
        if bit {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 1 << offset;
            }
        }
        self.bits_written += 1;
    }

    /// Serialise any `naia-serde` value.
    pub fn write<T: Serde>(&mut self, value: &T) {
        value.ser(self);
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        self.push_bit(bit);
    }

    /// Write a presence flag and return it, so the call can guard the
    /// payload that follows:
    ///
    /// ```
    /// # use engine_component::BitWriter;
    /// let mut w = BitWriter::new();
    /// if w.write_flag(true) {
    ///     w.write_u8(7);
    /// }
    /// assert_eq!(w.bits_written(), 9);
    /// ```
    pub fn write_flag(&mut self, flag: bool) -> bool {
        self.push_bit(flag);
        flag
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write(&value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write(&value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write(&value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write(&value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write(&value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write(&value);
    }

    /// Append every bit written to `other`.
    pub fn append(&mut self, other: &BitWriter) {
        if self.bits_written % 8 == 0 {
            // Byte aligned: copy whole bytes, the trailing partial byte keeps
            // its zero padding.
            self.buffer.extend_from_slice(&other.buffer);
            self.bits_written += other.bits_written;
            return;
        }
        for i in 0..other.bits_written {
            self.push_bit((other.buffer[i / 8] >> (i % 8)) & 1 == 1);
        }
    }

    /// Number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bits_written
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits_written == 0
    }

    /// Borrow the written bytes. The final byte is zero padded.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return its bytes.
    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Consume the writer into a payload that remembers its exact length.
    #[must_use]
    pub fn into_payload(self) -> BitPayload {
        BitPayload {
            bits: self.bits_written,
            bytes: self.buffer,
        }
    }
}

// ── Reader ──────────────────────────────────────────────────

/// A `naia-serde` reader that refuses to read past a fixed bit length.
pub struct BitReader<'a> {
    inner: naia_serde::BitReader<'a>,
    remaining: usize,
}

impl<'a> BitReader<'a> {
    /// Read every bit of `buffer`, including padding in the final byte.
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_bit_len(buffer, buffer.len() * 8)
    }

    /// Read the first `bits` bits of `buffer`.
    #[must_use]
    pub fn with_bit_len(buffer: &'a [u8], bits: usize) -> Self {
        Self {
            inner: naia_serde::BitReader::new(buffer),
            remaining: bits.min(buffer.len() * 8),
        }
    }

    /// Bits left before the end of this reader.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.remaining
    }

    fn ensure(&self, needed: usize) -> Result<(), StreamError> {
        if needed > self.remaining {
            return Err(StreamError::UnexpectedEnd {
                needed,
                remaining: self.remaining,
            });
        }
        Ok(())
    }

    /// Deserialise any `naia-serde` value. A value that decodes but runs
    /// past the bound is reported as [`StreamError::UnexpectedEnd`].
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] on truncated or malformed input.
    pub fn read<T: Serde>(&mut self) -> Result<T, StreamError> {
        let value = T::de(&mut self.inner)?;
        let used = value.bit_length() as usize;
        self.ensure(used)?;
        self.remaining -= used;
        Ok(value)
    }

    fn read_sized<T: Serde>(&mut self, bits: usize) -> Result<T, StreamError> {
        self.ensure(bits)?;
        self.read()
    }

    /// Move the next `bits` bits into an owned payload and skip past them.
    /// Whatever the payload's decoder does, this reader stays aligned.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnexpectedEnd`] if fewer than `bits` remain.
    pub fn take_payload(&mut self, bits: usize) -> Result<BitPayload, StreamError> {
        self.ensure(bits)?;
        let mut payload = BitWriter::new();
        for _ in 0..bits {
            payload.push_bit(self.read_bit()?);
        }
        Ok(payload.into_payload())
    }

    pub fn read_bit(&mut self) -> Result<bool, StreamError> {
        self.read_sized(1)
    }

    /// Read a presence flag. Identical to [`read_bit`](Self::read_bit), named
    /// to mirror [`BitWriter::write_flag`].
    pub fn read_flag(&mut self) -> Result<bool, StreamError> {
        self.read_bit()
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        self.read_sized(8)
    }

    pub fn read_u16(&mut self) -> Result<u16, StreamError> {
        self.read_sized(16)
    }

    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        self.read_sized(32)
    }

    pub fn read_u64(&mut self) -> Result<u64, StreamError> {
        self.read_sized(64)
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        self.read_sized(32)
    }

    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        self.read_sized(32)
    }

    pub fn read_string(&mut self) -> Result<String, StreamError> {
        self.read()
    }
}

/// An exact-length run of bits lifted out of a larger stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitPayload {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitPayload {
    #[must_use]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// A reader bounded to exactly this payload.
    #[must_use]
    pub fn reader(&self) -> BitReader<'_> {
        BitReader::with_bit_len(&self.bytes, self.bits)
    }
}
