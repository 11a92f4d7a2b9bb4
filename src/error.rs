//! # Error Types
//!
//! Error handling for the packet codec.
//!
//! Every decode failure is local to the single buffer being decoded: the
//! registry, the buffer pool and any other packet in flight are unaffected.
//!
//! ## Error Categories
//! - **Malformed input**: truncated buffers, oversized fields, bad varints
//! - **Dispatch errors**: unknown packet type ids, unknown tagged-union tags
//! - **Handshake errors**: magic literal mismatch
//! - **Stream/config errors**: framing limits, configuration, I/O
//!
//! ## Example Usage
//! ```rust
//! use spades_protocol::error::ProtocolError;
//! use spades_protocol::Packet;
//! use tracing::{debug, warn};
//!
//! fn on_datagram(bytes: &[u8]) {
//!     match Packet::decode(bytes) {
//!         Ok(packet) => debug!(kind = packet.packet_type().name(), "Packet received"),
//!         Err(e) if e.is_unrecognized() => debug!(error = %e, "Ignoring unknown packet"),
//!         Err(e) => warn!(error = %e, "Dropping malformed packet"),
//!     }
//! }
//!
//! on_datagram(&[]);
//! ```

use crate::protocol::packet::PacketType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_CONFIG_WRITE: &str = "Failed to write config file";
    pub const ERR_CONFIG_INVALID: &str = "Configuration validation failed";

    /// Logging errors
    pub const ERR_LOGGING_INIT: &str = "Failed to install tracing subscriber";
}

/// Discriminator families whose tag values are validated on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantKind {
    Trajectory,
    PlayerStance,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Trajectory => f.write_str("trajectory type"),
            VariantKind::PlayerStance => f.write_str("player stance"),
        }
    }
}

// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Packet truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Field too long: {len} bytes (max {max})")]
    OversizedField { len: u64, max: usize },

    #[error("Malformed variable-length integer")]
    MalformedVarInt,

    #[error("Invalid magic")]
    InvalidMagic,

    #[error("Unknown {kind}: {tag}")]
    UnknownVariantTag { kind: VariantKind, tag: u8 },

    #[error("Unrecognized packet type: {0}")]
    UnrecognizedPacketType(u8),

    #[error("Packet type mismatch: expected {expected}, got {actual}")]
    UnexpectedPacketType { expected: u8, actual: u8 },

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("No handler registered for {0:?}")]
    UnhandledPacket(PacketType),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error only means the packet kind is unknown to this build.
    ///
    /// Callers may ignore these for forward compatibility with newer peers.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ProtocolError::UnrecognizedPacketType(_))
    }

    /// Whether the error was caused by the bytes of a single packet.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ProtocolError::Truncated { .. }
                | ProtocolError::OversizedField { .. }
                | ProtocolError::MalformedVarInt
                | ProtocolError::InvalidMagic
                | ProtocolError::UnknownVariantTag { .. }
                | ProtocolError::UnexpectedPacketType { .. }
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
