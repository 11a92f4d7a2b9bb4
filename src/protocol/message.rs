//! Session and action packets with small fixed layouts.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes};

use crate::core::reader::PacketReader;
use crate::core::types::TimeStamp;
use crate::core::writer::PacketWriter;
use crate::error::Result;
use crate::protocol::packet::{PacketBody, PacketType};

/// Map and game properties keyed by name.
pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Kick {
    pub reason: String,
}

impl PacketBody for Kick {
    const TYPE: PacketType = PacketType::Kick;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            reason: reader.read_string()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_string(&self.reason);
    }
}

/// Opens the game state transfer; map fragments follow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameStateHeader {
    pub properties: Properties,
}

impl PacketBody for GameStateHeader {
    const TYPE: PacketType = PacketType::GameStateHeader;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            properties: reader.read_map()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_map(&self.properties);
    }
}

/// One map fragment. Fragments arrive in order; reassembly is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapData {
    pub fragment: Bytes,
}

impl PacketBody for MapData {
    const TYPE: PacketType = PacketType::MapData;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            fragment: reader.read_bytes()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_bytes(&self.fragment);
    }
}

/// Closes the game state transfer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameStateFinal {
    pub properties: Properties,
}

impl PacketBody for GameStateFinal {
    const TYPE: PacketType = PacketType::GameStateFinal;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            properties: reader.read_map()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_map(&self.properties);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JumpAction {
    pub timestamp: TimeStamp,
}

impl PacketBody for JumpAction {
    const TYPE: PacketType = PacketType::JumpAction;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            timestamp: reader.read_timestamp()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_timestamp(self.timestamp);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadWeapon {
    pub timestamp: TimeStamp,
}

impl PacketBody for ReloadWeapon {
    const TYPE: PacketType = PacketType::ReloadWeapon;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            timestamp: reader.read_timestamp()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_timestamp(self.timestamp);
    }
}
