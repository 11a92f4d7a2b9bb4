//! # Core Codec Components
//!
//! Byte-level primitives shared by every packet, plus stream framing.
//!
//! ## Components
//! - **Varint**: base-128 variable-length integers, bounded to 5 bytes
//! - **Reader/Writer**: length-prefixed blobs and strings, string maps,
//!   little-endian fixed-size numbers, vectors and colors
//! - **Codec**: Tokio codec for framing packets over byte streams
//!
//! ## Wire Format
//! ```text
//! [PacketType(1)] [Payload(N)]
//! ```
//! Stream transports add a `[Length(4, LE)]` prefix through [`codec::PacketCodec`].
//!
//! ## Security
//! - Maximum field size: 1 MiB (prevents memory exhaustion)
//! - Length validation before allocation
//! - Varints longer than 5 bytes are rejected

pub mod codec;
pub mod reader;
pub mod types;
pub mod varint;
pub mod writer;
