//! Player input record: button flags, stance and movement axes.
//!
//! ```text
//! [flags(1)] [xmove(i8)] [ymove(i8)]
//! flags: bit0 tool primary, bit1 tool secondary, bit2 chat, bit3 sprint,
//!        bits 6-7 stance
//! ```

use bitflags::bitflags;

use crate::core::reader::PacketReader;
use crate::core::writer::PacketWriter;
use crate::error::{ProtocolError, Result, VariantKind};
use bytes::BufMut;

bitflags! {
    /// Input flags byte as it appears on the wire.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PlayerInputFlags: u8 {
        const TOOL_PRIMARY = 1 << 0;
        const TOOL_SECONDARY = 1 << 1;
        const CHAT = 1 << 2;
        const SPRINT = 1 << 3;
        const STANCE_MASK = 0b11 << STANCE_SHIFT;
    }
}

const STANCE_SHIFT: u8 = 6;

impl PlayerInputFlags {
    /// Raw 2-bit stance sub-field.
    pub fn stance_bits(self) -> u8 {
        (self & Self::STANCE_MASK).bits() >> STANCE_SHIFT
    }

    pub fn with_stance(self, stance: PlayerStance) -> Self {
        (self - Self::STANCE_MASK) | Self::from_bits_retain((stance as u8) << STANCE_SHIFT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PlayerStance {
    #[default]
    Standing = 0,
    Crouching = 1,
    Prone = 2,
}

impl TryFrom<u8> for PlayerStance {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Standing),
            1 => Ok(Self::Crouching),
            2 => Ok(Self::Prone),
            tag => Err(ProtocolError::UnknownVariantTag {
                kind: VariantKind::PlayerStance,
                tag,
            }),
        }
    }
}

/// Input state of one player for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    pub tool_primary: bool,
    pub tool_secondary: bool,
    pub chat: bool,
    pub sprint: bool,
    pub stance: PlayerStance,
    /// Strafe axis; consumers map it onto `[-1, 1]`.
    pub xmove: i8,
    /// Forward axis; consumers map it onto `[-1, 1]`.
    pub ymove: i8,
}

impl PlayerInput {
    pub fn flags(&self) -> PlayerInputFlags {
        let mut flags = PlayerInputFlags::empty();
        flags.set(PlayerInputFlags::TOOL_PRIMARY, self.tool_primary);
        flags.set(PlayerInputFlags::TOOL_SECONDARY, self.tool_secondary);
        flags.set(PlayerInputFlags::CHAT, self.chat);
        flags.set(PlayerInputFlags::SPRINT, self.sprint);
        flags.with_stance(self.stance)
    }

    /// Movement axes normalized and clamped to `[-1, 1]`.
    pub fn movement(&self) -> (f32, f32) {
        let normalize = |axis: i8| (f32::from(axis) / 127.0).clamp(-1.0, 1.0);
        (normalize(self.xmove), normalize(self.ymove))
    }

    pub(crate) fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        let flags = PlayerInputFlags::from_bits_retain(reader.read_u8()?);
        let stance = PlayerStance::try_from(flags.stance_bits())?;
        let xmove = reader.read_i8()?;
        let ymove = reader.read_i8()?;

        Ok(Self {
            tool_primary: flags.contains(PlayerInputFlags::TOOL_PRIMARY),
            tool_secondary: flags.contains(PlayerInputFlags::TOOL_SECONDARY),
            chat: flags.contains(PlayerInputFlags::CHAT),
            sprint: flags.contains(PlayerInputFlags::SPRINT),
            stance,
            xmove,
            ymove,
        })
    }

    pub(crate) fn write<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_u8(self.flags().bits());
        writer.write_i8(self.xmove);
        writer.write_i8(self.ymove);
    }
}
