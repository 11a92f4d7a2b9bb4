//! # spades-protocol
//!
//! Binary packet codec for the OpenSpades multiplayer protocol.
//!
//! A packet is one type byte followed by its payload. The transport delimits
//! packets; on byte streams [`core::codec::PacketCodec`] adds a length prefix.
//!
//! ## Quick Start
//! ```rust
//! use spades_protocol::protocol::handshake::Greeting;
//! use spades_protocol::{Packet, PacketType};
//!
//! let greeting = Greeting::with_random_nonce();
//! let bytes = Packet::from(greeting.clone()).generate();
//! assert_eq!(bytes[0], PacketType::Greeting.as_u8());
//!
//! match Packet::decode(&bytes)? {
//!     Packet::Greeting(decoded) => assert_eq!(decoded, greeting),
//!     other => panic!("unexpected packet {:?}", other.packet_type()),
//! }
//! # Ok::<(), spades_protocol::ProtocolError>(())
//! ```
//!
//! ## Modules
//! - [`core`]: varints, field readers/writers, stream framing
//! - [`protocol`]: packet shapes, registry, dispatcher
//! - [`config`]: identity, codec limits and logging settings
//! - [`utils`]: buffer pool, metrics, logging setup

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use error::{ProtocolError, Result};
pub use protocol::packet::{Packet, PacketBody, PacketType};
