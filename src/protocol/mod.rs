//! # Protocol Layer
//!
//! Packet shapes, the type registry and packet dispatch.
//!
//! ## Components
//! - **Packet**: the closed set of packet kinds and the [`Packet`] sum type
//! - **Registry**: type-byte to decoder table, built at compile time
//! - **Handshake**: greeting, connection request and certificates
//! - **Messages**: kick, game state transfer and player actions
//! - **Entity**: entity delta batches with their trajectory and input records
//! - **Dispatcher**: routes decoded packets to per-type handlers
//!
//! Decoding is a pure function of the input bytes. Every decode either
//! returns a fully built packet or an error; nothing partial escapes.

pub mod dispatcher;
pub mod entity;
pub mod handshake;
pub mod input;
pub mod message;
pub mod packet;
pub mod registry;
pub mod trajectory;

pub use dispatcher::Dispatcher;
pub use packet::{Packet, PacketBody, PacketType};
