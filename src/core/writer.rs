//! Packet body writer, the mirror image of [`PacketReader`](super::reader::PacketReader).

use std::collections::BTreeMap;

use bytes::{BufMut, BytesMut};
use glam::Vec3;

use crate::config::MAX_FIELD_SIZE;
use crate::core::types::{Rgb, TimeStamp};
use crate::core::varint::write_varint;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::PacketType;

/// Appends one packet to any [`BufMut`].
///
/// Fields longer than [`MAX_FIELD_SIZE`] are still written, but the first one
/// is remembered and [`finish`](Self::finish) reports it.
pub struct PacketWriter<B: BufMut = BytesMut> {
    buf: B,
    oversized: Option<usize>,
}

impl PacketWriter<BytesMut> {
    /// Start a packet in a fresh buffer.
    pub fn new(packet_type: PacketType) -> Self {
        Self::over(BytesMut::with_capacity(64), packet_type)
    }
}

impl<B: BufMut> PacketWriter<B> {
    /// Start a packet at the end of `buf`, writing its type byte first.
    pub fn over(mut buf: B, packet_type: PacketType) -> Self {
        buf.put_u8(packet_type.as_u8());
        Self {
            buf,
            oversized: None,
        }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Hand the buffer back, failing if any field exceeded [`MAX_FIELD_SIZE`].
    ///
    /// # Errors
    ///
    /// [`ProtocolError::OversizedField`] with the length of the first such field.
    pub fn finish(self) -> Result<B> {
        match self.oversized {
            Some(len) => Err(ProtocolError::OversizedField {
                len: len as u64,
                max: MAX_FIELD_SIZE,
            }),
            None => Ok(self.buf),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.buf.put_f32_le(value.x);
        self.buf.put_f32_le(value.y);
        self.buf.put_f32_le(value.z);
    }

    pub fn write_rgb(&mut self, color: Rgb) {
        self.buf.put_u8(color.r);
        self.buf.put_u8(color.g);
        self.buf.put_u8(color.b);
    }

    pub fn write_varint(&mut self, value: u64) {
        write_varint(&mut self.buf, value);
    }

    pub fn write_timestamp(&mut self, value: TimeStamp) {
        self.write_varint(u64::from(value));
    }

    /// Length-prefixed blob.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if bytes.len() > MAX_FIELD_SIZE && self.oversized.is_none() {
            self.oversized = Some(bytes.len());
        }
        self.write_varint(bytes.len() as u64);
        self.buf.put_slice(bytes);
    }

    pub fn write_string(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
    }

    /// String map followed by the zero-length terminator key.
    ///
    /// Entries whose key is empty, or starts with NUL, are skipped: the reader
    /// cuts keys at the first NUL and stops at the first empty one.
    pub fn write_map(&mut self, map: &BTreeMap<String, String>) {
        for (key, value) in map {
            if key.is_empty() || key.starts_with('\0') {
                continue;
            }
            self.write_string(key);
            self.write_string(value);
        }
        self.write_string("");
    }
}
