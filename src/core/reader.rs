//! Bounds-checked reader for packet bodies.
//!
//! Every accessor checks the remaining length before touching the buffer, so
//! hostile input can only ever produce an error.

use std::collections::BTreeMap;

use bytes::{Buf, Bytes};
use glam::Vec3;

use crate::config::MAX_FIELD_SIZE;
use crate::core::types::{Rgb, TimeStamp};
use crate::core::varint::read_varint;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::PacketType;

/// Cursor over one packet's bytes.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    /// Reader over raw body bytes (no leading type byte).
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Reader over a full packet, after checking its leading type byte.
    pub fn for_packet(data: &'a [u8], expected: PacketType) -> Result<Self> {
        let (&actual, body) = data.split_first().ok_or(ProtocolError::Truncated {
            needed: 1,
            remaining: 0,
        })?;

        if actual != expected.as_u8() {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: expected.as_u8(),
                actual,
            });
        }

        Ok(Self { buf: body })
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_end_of_packet(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(ProtocolError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        self.ensure(12)?;
        let x = self.buf.get_f32_le();
        let y = self.buf.get_f32_le();
        let z = self.buf.get_f32_le();
        Ok(Vec3::new(x, y, z))
    }

    pub fn read_rgb(&mut self) -> Result<Rgb> {
        self.ensure(3)?;
        let r = self.buf.get_u8();
        let g = self.buf.get_u8();
        let b = self.buf.get_u8();
        Ok(Rgb { r, g, b })
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        read_varint(&mut self.buf)
    }

    /// Variable-length integer narrowed to 32 bits.
    pub fn read_varint_u32(&mut self) -> Result<u32> {
        u32::try_from(self.read_varint()?).map_err(|_| ProtocolError::MalformedVarInt)
    }

    pub fn read_timestamp(&mut self) -> Result<TimeStamp> {
        self.read_varint_u32()
    }

    /// Length-prefixed field, borrowed from the packet buffer.
    ///
    /// The declared length is checked against [`MAX_FIELD_SIZE`] before
    /// anything else is consumed.
    fn read_field(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        if len > MAX_FIELD_SIZE as u64 {
            return Err(ProtocolError::OversizedField {
                len,
                max: MAX_FIELD_SIZE,
            });
        }

        // Bounded by MAX_FIELD_SIZE above.
        let len = len as usize;
        self.ensure(len)?;
        let (field, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(field)
    }

    /// Binary blob; every byte is preserved, including zeros.
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        self.read_field().map(Bytes::copy_from_slice)
    }

    /// Text field; cut at the first NUL and decoded lossily as UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_field().map(text_from_field)
    }

    /// String map terminated by a zero-length key.
    ///
    /// Later duplicates replace earlier ones. Keys are read as text, so a key
    /// that is empty once cut at its first NUL also ends the map; its value
    /// and anything after it are left unread.
    pub fn read_map(&mut self) -> Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        loop {
            let key = self.read_string()?;
            if key.is_empty() {
                break;
            }
            let value = self.read_string()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

fn text_from_field(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
