//! Packet kinds and the [`Packet`] sum type.
//!
//! The closed set of packet kinds is declared once in [`packet_set!`]; the
//! type ids, the sum type, the conversions and the decoder table all derive
//! from that single list.

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::reader::PacketReader;
use crate::core::writer::PacketWriter;
use crate::error::{ProtocolError, Result};
use crate::protocol::entity::{ClientSideEntityUpdate, EntityUpdate};
use crate::protocol::handshake::{
    ClientCertificate, Greeting, InitiateConnection, ServerCertificate,
};
use crate::protocol::message::{
    GameStateFinal, GameStateHeader, JumpAction, Kick, MapData, ReloadWeapon,
};
use crate::protocol::registry::{self, decode_as, DecodeFn};
use crate::utils::buffer_pool::{BufferPool, PooledBuffer};

/// One concrete packet shape with its own encode/decode logic.
pub trait PacketBody: Sized {
    /// Type id written as the first byte of the packet.
    const TYPE: PacketType;

    /// Read the payload that follows the type byte.
    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self>;

    /// Write the payload that follows the type byte.
    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>);

    /// Decode a full packet, including its leading type byte.
    fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = PacketReader::for_packet(data, Self::TYPE)?;
        let body = Self::read_body(&mut reader)?;
        if !reader.is_end_of_packet() {
            trace!(
                kind = Self::TYPE.name(),
                trailing = reader.remaining(),
                "Ignoring trailing bytes"
            );
        }
        Ok(body)
    }

    /// Append the full packet to `buf` and hand the buffer back.
    fn encode_into<B: BufMut>(&self, buf: B) -> B {
        let mut writer = PacketWriter::over(buf, Self::TYPE);
        self.write_body(&mut writer);
        writer.into_inner()
    }

    fn generate(&self) -> Vec<u8> {
        self.encode_into(Vec::new())
    }

    /// Like [`encode_into`](Self::encode_into), but fails instead of emitting
    /// a field the decoder would reject.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::OversizedField`] if any field exceeds the 1 MiB cap.
    fn try_encode_into<B: BufMut>(&self, buf: B) -> Result<B> {
        let mut writer = PacketWriter::over(buf, Self::TYPE);
        self.write_body(&mut writer);
        writer.finish()
    }

    fn try_generate(&self) -> Result<Vec<u8>> {
        self.try_encode_into(Vec::new())
    }
}

macro_rules! packet_set {
    ($( $(#[$meta:meta])* $name:ident = $id:literal => $body:ty ),* $(,)?) => {
        /// Wire id of each packet kind, stored in the first byte of a packet.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum PacketType {
            $( $(#[$meta])* $name = $id, )*
        }

        impl PacketType {
            /// Every registered kind, in id order.
            pub const ALL: &'static [PacketType] = &[ $( PacketType::$name, )* ];

            pub const fn name(self) -> &'static str {
                match self {
                    $( PacketType::$name => stringify!($name), )*
                }
            }
        }

        impl TryFrom<u8> for PacketType {
            type Error = ProtocolError;

            fn try_from(value: u8) -> Result<Self> {
                match value {
                    $( $id => Ok(PacketType::$name), )*
                    other => Err(ProtocolError::UnrecognizedPacketType(other)),
                }
            }
        }

        /// A decoded packet of any kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Packet {
            $( $name($body), )*
        }

        impl Packet {
            pub fn packet_type(&self) -> PacketType {
                match self {
                    $( Packet::$name(_) => PacketType::$name, )*
                }
            }

            /// Append the full packet to `buf` and hand the buffer back.
            pub fn encode_into<B: BufMut>(&self, buf: B) -> B {
                match self {
                    $( Packet::$name(body) => body.encode_into(buf), )*
                }
            }

            /// Append the full packet to `buf`, failing on a field over the cap.
            pub fn try_encode_into<B: BufMut>(&self, buf: B) -> Result<B> {
                match self {
                    $( Packet::$name(body) => body.try_encode_into(buf), )*
                }
            }
        }

        $(
            impl From<$body> for Packet {
                fn from(body: $body) -> Self {
                    Packet::$name(body)
                }
            }

            const _: () = assert!(
                <$body as PacketBody>::TYPE as u8 == $id,
                "packet body declares a different type id"
            );
        )*

        /// Decoder registered for `packet_type`.
        pub(crate) const fn decoder_for(packet_type: PacketType) -> DecodeFn {
            match packet_type {
                $( PacketType::$name => decode_as::<$body>, )*
            }
        }
    };
}

packet_set! {
    /// Server hello carrying a nonce.
    Greeting = 0 => Greeting,
    /// Client identity and version metadata.
    InitiateConnection = 1 => InitiateConnection,
    ServerCertificate = 2 => ServerCertificate,
    ClientCertificate = 3 => ClientCertificate,
    Kick = 4 => Kick,
    GameStateHeader = 5 => GameStateHeader,
    /// One fragment of the compressed map.
    MapData = 6 => MapData,
    GameStateFinal = 7 => GameStateFinal,
    /// Server-authoritative entity deltas.
    EntityUpdate = 8 => EntityUpdate,
    /// Client-predicted entity deltas with the client's timestamp.
    ClientSideEntityUpdate = 9 => ClientSideEntityUpdate,
    JumpAction = 10 => JumpAction,
    ReloadWeapon = 11 => ReloadWeapon,
}

impl PacketType {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Packet {
    /// Decode one packet from a buffer delimited by the transport.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] for an empty buffer
    /// - [`ProtocolError::UnrecognizedPacketType`] when no decoder is registered
    ///   for the first byte
    /// - whatever the matched decoder reports
    pub fn decode(data: &[u8]) -> Result<Packet> {
        let (&type_id, _) = data.split_first().ok_or(ProtocolError::Truncated {
            needed: 1,
            remaining: 0,
        })?;

        let decode = registry::lookup(usize::from(type_id))
            .ok_or(ProtocolError::UnrecognizedPacketType(type_id))?;

        let packet = decode(data)?;
        trace!(kind = packet.packet_type().name(), len = data.len(), "Decoded packet");
        Ok(packet)
    }

    /// Encode into a freshly allocated buffer.
    pub fn generate(&self) -> Vec<u8> {
        self.encode_into(Vec::new())
    }

    /// Encode into a fresh buffer, refusing output the decoder would reject.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::OversizedField`] if any field exceeds the 1 MiB cap.
    pub fn try_generate(&self) -> Result<Vec<u8>> {
        self.try_encode_into(Vec::new())
    }

    /// Encode into a buffer borrowed from `pool`.
    pub fn encode_pooled(&self, pool: &BufferPool) -> PooledBuffer {
        let mut buffer = pool.acquire();
        self.encode_into(&mut *buffer);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ids_are_stable() {
        assert_eq!(PacketType::Greeting.as_u8(), 0);
        assert_eq!(PacketType::EntityUpdate.as_u8(), 8);
        assert_eq!(PacketType::ReloadWeapon.as_u8(), 11);
        assert_eq!(PacketType::ALL.len(), 12);
    }

    #[test]
    fn test_try_from_u8() {
        for &packet_type in PacketType::ALL {
            assert_eq!(PacketType::try_from(packet_type.as_u8()).unwrap(), packet_type);
        }
        assert!(matches!(
            PacketType::try_from(127),
            Err(ProtocolError::UnrecognizedPacketType(127))
        ));
    }

    #[test]
    fn test_names() {
        assert_eq!(PacketType::MapData.name(), "MapData");
        assert_eq!(
            PacketType::ClientSideEntityUpdate.name(),
            "ClientSideEntityUpdate"
        );
    }

    #[test]
    fn test_packet_type_follows_variant() {
        let packet = Packet::from(JumpAction { timestamp: 5 });
        assert_eq!(packet.packet_type(), PacketType::JumpAction);
        assert_eq!(packet.generate()[0], PacketType::JumpAction.as_u8());
    }

    #[test]
    fn test_try_generate_rejects_oversized_fragment() {
        let packet = Packet::from(MapData {
            fragment: vec![1; crate::config::MAX_FIELD_SIZE + 1].into(),
        });
        assert!(matches!(
            packet.try_generate(),
            Err(ProtocolError::OversizedField { len, .. })
                if len == (crate::config::MAX_FIELD_SIZE + 1) as u64
        ));
    }

    #[test]
    fn test_try_generate_matches_generate() {
        let packet = Packet::from(Kick {
            reason: "bye".to_string(),
        });
        assert_eq!(packet.try_generate().unwrap(), packet.generate());
    }

    #[test]
    fn test_encode_pooled_matches_generate() {
        let pool = BufferPool::new(2);
        let packet = Packet::from(Kick {
            reason: "bye".to_string(),
        });
        let pooled = packet.encode_pooled(&pool);
        assert_eq!(pooled.as_ref(), packet.generate().as_slice());
        assert_eq!(pool.available(), 1);
        drop(pooled);
        assert_eq!(pool.available(), 2);
    }
}
