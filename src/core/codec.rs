//! Stream framing for byte-stream transports.
//!
//! Packets are self-delimiting only when the transport delimits them, so on a
//! stream each packet travels as `[len: u32 LE][packet bytes]`.
//!
//! ```rust
//! use bytes::BytesMut;
//! use spades_protocol::core::codec::PacketCodec;
//! use spades_protocol::protocol::message::ReloadWeapon;
//! use spades_protocol::Packet;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut codec = PacketCodec::default();
//! let mut buf = BytesMut::new();
//! codec.encode(Packet::from(ReloadWeapon { timestamp: 3 }), &mut buf).unwrap();
//! assert_eq!(&buf[..], &[3, 0, 0, 0, 11, 3]);
//!
//! let decoded = codec.decode(&mut buf).unwrap();
//! assert_eq!(decoded, Some(Packet::from(ReloadWeapon { timestamp: 3 })));
//! ```

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::config::{CodecConfig, DEFAULT_MAX_FRAME_SIZE};
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::Packet;
use crate::utils::metrics::global_metrics;

/// Size of the frame length prefix
pub const FRAME_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_frame_size: usize,
}

impl PacketCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.max_frame_size)
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let mut header = [0u8; FRAME_HEADER_LEN];
        header.copy_from_slice(&src[..FRAME_HEADER_LEN]);
        let len = u32::from_le_bytes(header) as usize;

        if len > self.max_frame_size {
            let err = ProtocolError::OversizedPacket(len);
            global_metrics().record_decode_error(&err);
            warn!(len, max = self.max_frame_size, "Rejecting oversized frame");
            return Err(err);
        }

        if src.len() < FRAME_HEADER_LEN + len {
            src.reserve(FRAME_HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        // Frame is consumed before decoding so a bad packet cannot wedge the stream
        let frame = src.split_to(len).freeze();

        match Packet::decode(&frame) {
            Ok(packet) => {
                global_metrics().record_decoded(len);
                Ok(Some(packet))
            }
            Err(e) => {
                global_metrics().record_decode_error(&e);
                debug!(error = %e, len, "Failed to decode frame");
                Err(e)
            }
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let header_at = dst.len();
        dst.put_u32_le(0);
        let body_at = dst.len();

        if let Some(e) = item.try_encode_into(&mut *dst).err() {
            dst.truncate(header_at);
            warn!(error = %e, kind = item.packet_type().name(), "Refusing to encode packet");
            return Err(e);
        }
        let len = dst.len() - body_at;

        if len > self.max_frame_size {
            dst.truncate(header_at);
            return Err(ProtocolError::OversizedPacket(len));
        }

        dst[header_at..body_at].copy_from_slice(&(len as u32).to_le_bytes());
        global_metrics().record_encoded(len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{JumpAction, Kick, MapData};
    use bytes::Bytes;

    #[test]
    fn test_partial_frame_waits() {
        let mut codec = PacketCodec::default();
        let mut full = BytesMut::new();
        codec
            .encode(Packet::from(JumpAction { timestamp: 300 }), &mut full)
            .unwrap();

        let mut partial = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), full.len() - 1);

        let mut header_only = BytesMut::from(&full[..2]);
        assert!(codec.decode(&mut header_only).unwrap().is_none());
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::new();
        let first = Packet::from(Kick {
            reason: "afk".to_string(),
        });
        let second = Packet::from(JumpAction { timestamp: 1 });
        codec.encode(first.clone(), &mut buf).unwrap();
        codec.encode(second.clone(), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_frame_header() {
        let mut codec = PacketCodec::new(16);
        let mut buf = BytesMut::new();
        buf.put_u32_le(17);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::OversizedPacket(17))
        ));
    }

    #[test]
    fn test_oversized_encode_leaves_buffer_untouched() {
        let mut codec = PacketCodec::new(8);
        let mut buf = BytesMut::from(&b"xy"[..]);
        let packet = Packet::from(MapData {
            fragment: Bytes::from(vec![0u8; 32]),
        });
        assert!(matches!(
            codec.encode(packet, &mut buf),
            Err(ProtocolError::OversizedPacket(_))
        ));
        assert_eq!(&buf[..], b"xy");
    }

    #[test]
    fn test_oversized_field_is_not_encoded() {
        let mut codec = PacketCodec::new(4 * crate::config::MAX_FIELD_SIZE);
        let mut buf = BytesMut::from(&b"xy"[..]);
        let packet = Packet::from(MapData {
            fragment: Bytes::from(vec![0u8; crate::config::MAX_FIELD_SIZE + 1]),
        });
        assert!(matches!(
            codec.encode(packet, &mut buf),
            Err(ProtocolError::OversizedField { .. })
        ));
        assert_eq!(&buf[..], b"xy");
    }

    #[test]
    fn test_bad_packet_consumes_its_frame() {
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::new();
        buf.put_u32_le(1);
        buf.put_u8(127);
        codec
            .encode(Packet::from(JumpAction { timestamp: 9 }), &mut buf)
            .unwrap();

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::UnrecognizedPacketType(127))
        ));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Packet::from(JumpAction { timestamp: 9 }))
        );
    }

    #[test]
    fn test_from_config() {
        let config = CodecConfig {
            max_frame_size: 2 * 1024 * 1024,
            ..CodecConfig::default()
        };
        assert_eq!(
            PacketCodec::from_config(&config).max_frame_size(),
            2 * 1024 * 1024
        );
    }
}
