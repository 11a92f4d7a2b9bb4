//! Type id to decoder table.
//!
//! Built at compile time from [`PacketType::ALL`]; never mutated, so any
//! number of threads may read it without synchronization.

use crate::error::Result;
use crate::protocol::packet::{decoder_for, Packet, PacketBody, PacketType};

/// Number of slots; type ids are a single byte in `0..128`.
pub const TABLE_SIZE: usize = 128;

/// Decodes a full packet buffer, type byte included.
pub type DecodeFn = fn(&[u8]) -> Result<Packet>;

pub(crate) fn decode_as<T>(data: &[u8]) -> Result<Packet>
where
    T: PacketBody + Into<Packet>,
{
    T::decode(data).map(Into::into)
}

const fn build_table() -> [Option<DecodeFn>; TABLE_SIZE] {
    let mut table: [Option<DecodeFn>; TABLE_SIZE] = [None; TABLE_SIZE];
    let mut i = 0;
    while i < PacketType::ALL.len() {
        let packet_type = PacketType::ALL[i];
        let slot = packet_type.as_u8() as usize;
        assert!(slot < TABLE_SIZE, "packet type id out of range");
        assert!(table[slot].is_none(), "duplicate packet type id");
        table[slot] = Some(decoder_for(packet_type));
        i += 1;
    }
    table
}

static DECODE_TABLE: [Option<DecodeFn>; TABLE_SIZE] = build_table();

/// Decoder registered at `index`, or `None` for an empty or out-of-range slot.
pub fn lookup(index: usize) -> Option<DecodeFn> {
    DECODE_TABLE.get(index).copied().flatten()
}

/// Whether a decoder is registered for `type_id`.
pub fn is_registered(type_id: u8) -> bool {
    lookup(usize::from(type_id)).is_some()
}
