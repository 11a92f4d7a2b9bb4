//! Motion models carried in entity updates.
//!
//! ```text
//! [type(1)] [origin(vec3)] [velocity(vec3)] [shape-specific]
//!   Linear | Gravity | Constant | RigidBody: [rotation(vec3)] [angular velocity(vec3)]
//!   Player:                                  [euler angles(vec3)]
//! ```

use bytes::BufMut;
use glam::{Quat, Vec3};

use crate::core::reader::PacketReader;
use crate::core::writer::PacketWriter;
use crate::error::{ProtocolError, Result, VariantKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrajectoryType {
    Linear = 0,
    Gravity = 1,
    Constant = 2,
    RigidBody = 3,
    Player = 4,
}

impl TryFrom<u8> for TrajectoryType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Gravity),
            2 => Ok(Self::Constant),
            3 => Ok(Self::RigidBody),
            4 => Ok(Self::Player),
            tag => Err(ProtocolError::UnknownVariantTag {
                kind: VariantKind::Trajectory,
                tag,
            }),
        }
    }
}

/// Orientation and angular velocity of a spinning body.
///
/// The orientation is kept in its wire form, a rotation vector (axis scaled by
/// angle), so a decoded value compares equal to the one that was sent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spin {
    pub rotation: Vec3,
    pub angular_velocity: Vec3,
}

impl Spin {
    pub fn new(orientation: Quat, angular_velocity: Vec3) -> Self {
        Self {
            rotation: orientation.to_scaled_axis(),
            angular_velocity,
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_scaled_axis(self.rotation)
    }
}

/// Shape-specific part of a trajectory, keyed by [`TrajectoryType`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Linear(Spin),
    Gravity(Spin),
    Constant(Spin),
    RigidBody(Spin),
    Player { euler_angles: Vec3 },
}

impl Motion {
    pub fn trajectory_type(&self) -> TrajectoryType {
        match self {
            Motion::Linear(_) => TrajectoryType::Linear,
            Motion::Gravity(_) => TrajectoryType::Gravity,
            Motion::Constant(_) => TrajectoryType::Constant,
            Motion::RigidBody(_) => TrajectoryType::RigidBody,
            Motion::Player { .. } => TrajectoryType::Player,
        }
    }

    /// Spin of a body-style trajectory; `None` for players.
    pub fn spin(&self) -> Option<&Spin> {
        match self {
            Motion::Linear(spin)
            | Motion::Gravity(spin)
            | Motion::Constant(spin)
            | Motion::RigidBody(spin) => Some(spin),
            Motion::Player { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub origin: Vec3,
    pub velocity: Vec3,
    pub motion: Motion,
}

impl Trajectory {
    pub fn player(origin: Vec3, velocity: Vec3, euler_angles: Vec3) -> Self {
        Self {
            origin,
            velocity,
            motion: Motion::Player { euler_angles },
        }
    }

    pub fn trajectory_type(&self) -> TrajectoryType {
        self.motion.trajectory_type()
    }

    pub(crate) fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        let kind = TrajectoryType::try_from(reader.read_u8()?)?;
        let origin = reader.read_vec3()?;
        let velocity = reader.read_vec3()?;

        let motion = match kind {
            TrajectoryType::Player => Motion::Player {
                euler_angles: reader.read_vec3()?,
            },
            body => {
                let spin = Spin {
                    rotation: reader.read_vec3()?,
                    angular_velocity: reader.read_vec3()?,
                };
                match body {
                    TrajectoryType::Linear => Motion::Linear(spin),
                    TrajectoryType::Gravity => Motion::Gravity(spin),
                    TrajectoryType::Constant => Motion::Constant(spin),
                    _ => Motion::RigidBody(spin),
                }
            }
        };

        Ok(Self {
            origin,
            velocity,
            motion,
        })
    }

    pub(crate) fn write<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_u8(self.trajectory_type() as u8);
        writer.write_vec3(self.origin);
        writer.write_vec3(self.velocity);

        match &self.motion {
            Motion::Player { euler_angles } => writer.write_vec3(*euler_angles),
            Motion::Linear(spin)
            | Motion::Gravity(spin)
            | Motion::Constant(spin)
            | Motion::RigidBody(spin) => {
                writer.write_vec3(spin.rotation);
                writer.write_vec3(spin.angular_velocity);
            }
        }
    }
}
