//! Entity delta records and the two batch packets that carry them.
//!
//! Each record is an entity id followed by a presence byte and the groups it
//! announces, always in this order:
//!
//! ```text
//! [entity id(varint)] [presence(1)]
//!   bit0 create      [entity type(1)]
//!   bit1 flags       [entity flags(1)]
//!   bit2 trajectory  [trajectory]
//!   bit3 input       [player input(3)]
//!   bit4 tool        [tool(1)]
//!   bit5 color       [r g b]
//!   bit6 health      [health(1)]
//!   bit7 skins       [body][weapon 1][weapon 2][weapon 3]   (length-prefixed blobs)
//! ```
//!
//! A batch carries no item count: records run until the end of the packet.

use bitflags::bitflags;
use bytes::{BufMut, Bytes};

use crate::core::reader::PacketReader;
use crate::core::types::{Rgb, TimeStamp};
use crate::core::writer::PacketWriter;
use crate::error::Result;
use crate::protocol::input::PlayerInput;
use crate::protocol::packet::{PacketBody, PacketType};
use crate::protocol::trajectory::Trajectory;

bitflags! {
    /// Presence byte preceding each entity record.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EntityUpdateFlags: u8 {
        const CREATE = 1 << 0;
        const FLAGS = 1 << 1;
        const TRAJECTORY = 1 << 2;
        const PLAYER_INPUT = 1 << 3;
        const TOOL = 1 << 4;
        const BLOCK_COLOR = 1 << 5;
        const HEALTH = 1 << 6;
        const SKINS = 1 << 7;
    }
}

bitflags! {
    /// Entity behavior flags as packed on the wire.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EntityFlagsValue: u8 {
        const PLAYER_CLIP = 1 << 0;
        const WEAPON_CLIP = 1 << 1;
        const FLY = 1 << 2;
    }
}

/// Entity behavior flags in the form the simulation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityFlags {
    pub player_clip: bool,
    pub weapon_clip: bool,
    pub fly: bool,
}

impl From<EntityFlags> for EntityFlagsValue {
    fn from(flags: EntityFlags) -> Self {
        let mut value = EntityFlagsValue::empty();
        value.set(EntityFlagsValue::PLAYER_CLIP, flags.player_clip);
        value.set(EntityFlagsValue::WEAPON_CLIP, flags.weapon_clip);
        value.set(EntityFlagsValue::FLY, flags.fly);
        value
    }
}

impl From<EntityFlagsValue> for EntityFlags {
    fn from(value: EntityFlagsValue) -> Self {
        Self {
            player_clip: value.contains(EntityFlagsValue::PLAYER_CLIP),
            weapon_clip: value.contains(EntityFlagsValue::WEAPON_CLIP),
            fly: value.contains(EntityFlagsValue::FLY),
        }
    }
}

/// Kind of entity, sent once when a client first sees an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityType(pub u8);

/// Character and weapon skins; each is an opaque blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkinSet {
    pub body: Bytes,
    pub weapons: [Bytes; 3],
}

/// Changed state of one entity. `None` groups are absent from the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityUpdateItem {
    pub entity_id: u32,
    pub create: Option<EntityType>,
    pub flags: Option<EntityFlags>,
    pub trajectory: Option<Trajectory>,
    pub player_input: Option<PlayerInput>,
    pub tool: Option<u8>,
    pub block_color: Option<Rgb>,
    pub health: Option<u8>,
    pub skins: Option<SkinSet>,
}

impl EntityUpdateItem {
    pub fn new(entity_id: u32) -> Self {
        Self {
            entity_id,
            ..Default::default()
        }
    }

    /// Presence byte for the groups currently populated.
    pub fn presence(&self) -> EntityUpdateFlags {
        let mut presence = EntityUpdateFlags::empty();
        presence.set(EntityUpdateFlags::CREATE, self.create.is_some());
        presence.set(EntityUpdateFlags::FLAGS, self.flags.is_some());
        presence.set(EntityUpdateFlags::TRAJECTORY, self.trajectory.is_some());
        presence.set(EntityUpdateFlags::PLAYER_INPUT, self.player_input.is_some());
        presence.set(EntityUpdateFlags::TOOL, self.tool.is_some());
        presence.set(EntityUpdateFlags::BLOCK_COLOR, self.block_color.is_some());
        presence.set(EntityUpdateFlags::HEALTH, self.health.is_some());
        presence.set(EntityUpdateFlags::SKINS, self.skins.is_some());
        presence
    }

    pub(crate) fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        let entity_id = reader.read_varint_u32()?;
        let presence = EntityUpdateFlags::from_bits_retain(reader.read_u8()?);
        let mut item = Self::new(entity_id);

        if presence.contains(EntityUpdateFlags::CREATE) {
            item.create = Some(EntityType(reader.read_u8()?));
        }
        if presence.contains(EntityUpdateFlags::FLAGS) {
            let value = EntityFlagsValue::from_bits_truncate(reader.read_u8()?);
            item.flags = Some(value.into());
        }
        if presence.contains(EntityUpdateFlags::TRAJECTORY) {
            item.trajectory = Some(Trajectory::read(reader)?);
        }
        if presence.contains(EntityUpdateFlags::PLAYER_INPUT) {
            item.player_input = Some(PlayerInput::read(reader)?);
        }
        if presence.contains(EntityUpdateFlags::TOOL) {
            item.tool = Some(reader.read_u8()?);
        }
        if presence.contains(EntityUpdateFlags::BLOCK_COLOR) {
            item.block_color = Some(reader.read_rgb()?);
        }
        if presence.contains(EntityUpdateFlags::HEALTH) {
            item.health = Some(reader.read_u8()?);
        }
        if presence.contains(EntityUpdateFlags::SKINS) {
            item.skins = Some(SkinSet {
                body: reader.read_bytes()?,
                weapons: [reader.read_bytes()?, reader.read_bytes()?, reader.read_bytes()?],
            });
        }

        Ok(item)
    }

    pub(crate) fn write<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_varint(u64::from(self.entity_id));
        writer.write_u8(self.presence().bits());

        if let Some(EntityType(kind)) = self.create {
            writer.write_u8(kind);
        }
        if let Some(flags) = self.flags {
            writer.write_u8(EntityFlagsValue::from(flags).bits());
        }
        if let Some(trajectory) = &self.trajectory {
            trajectory.write(writer);
        }
        if let Some(input) = &self.player_input {
            input.write(writer);
        }
        if let Some(tool) = self.tool {
            writer.write_u8(tool);
        }
        if let Some(color) = self.block_color {
            writer.write_rgb(color);
        }
        if let Some(health) = self.health {
            writer.write_u8(health);
        }
        if let Some(skins) = &self.skins {
            writer.write_bytes(&skins.body);
            for weapon in &skins.weapons {
                writer.write_bytes(weapon);
            }
        }
    }
}

fn read_items(reader: &mut PacketReader<'_>) -> Result<Vec<EntityUpdateItem>> {
    let mut items = Vec::new();
    while !reader.is_end_of_packet() {
        items.push(EntityUpdateItem::read(reader)?);
    }
    Ok(items)
}

/// Server-authoritative entity deltas, applied in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityUpdate {
    pub items: Vec<EntityUpdateItem>,
}

impl PacketBody for EntityUpdate {
    const TYPE: PacketType = PacketType::EntityUpdate;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            items: read_items(reader)?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        for item in &self.items {
            item.write(writer);
        }
    }
}

/// Entity deltas predicted by a client, stamped with its local time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientSideEntityUpdate {
    pub timestamp: TimeStamp,
    pub items: Vec<EntityUpdateItem>,
}

impl PacketBody for ClientSideEntityUpdate {
    const TYPE: PacketType = PacketType::ClientSideEntityUpdate;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        let timestamp = reader.read_timestamp()?;
        Ok(Self {
            timestamp,
            items: read_items(reader)?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_timestamp(self.timestamp);
        for item in &self.items {
            item.write(writer);
        }
    }
}
