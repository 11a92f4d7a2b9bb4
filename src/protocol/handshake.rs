//! Connection handshake packets.
//!
//! The server opens with a [`Greeting`] carrying a nonce, the client answers
//! with [`InitiateConnection`], and both sides may then exchange certificates.
//! Certificate and signature contents are opaque here; validating them is the
//! caller's job.

use bytes::{BufMut, Bytes};
use tracing::warn;

use crate::config::IdentityConfig;
use crate::core::reader::PacketReader;
use crate::core::writer::PacketWriter;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::{PacketBody, PacketType};

/// Literal that opens every greeting. It is read as text, so anything after
/// a NUL inside the field is not compared.
pub const GREETING_MAGIC: &str = "Hello";

/// Length of nonces generated by this crate.
pub const NONCE_LEN: usize = 16;

/// Outbound caps applied by [`InitiateConnection::from_identity`].
pub const MAX_PROTOCOL_NAME_LEN: usize = 256;
pub const MAX_PACKAGE_STRING_LEN: usize = 256;
pub const MAX_ENVIRONMENT_STRING_LEN: usize = 1024;
pub const MAX_LOCALE_LEN: usize = 256;

/// Fresh random nonce.
pub fn generate_nonce() -> Bytes {
    let nonce: [u8; NONCE_LEN] = rand::random();
    Bytes::copy_from_slice(&nonce)
}

/// Cut `text` to at most `max` bytes without splitting a character.
fn capped(mut text: String, max: usize, field: &'static str) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        warn!(field, len = text.len(), max, "Truncating outbound identity string");
        text.truncate(end);
    }
    text
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Greeting {
    pub nonce: Bytes,
}

impl Greeting {
    pub fn with_random_nonce() -> Self {
        Self {
            nonce: generate_nonce(),
        }
    }
}

impl PacketBody for Greeting {
    const TYPE: PacketType = PacketType::Greeting;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        if reader.read_string()? != GREETING_MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        Ok(Self {
            nonce: reader.read_bytes()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_string(GREETING_MAGIC);
        writer.write_bytes(&self.nonce);
    }
}

/// Client identity and version metadata, sent once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitiateConnection {
    pub protocol_name: String,
    pub major_version: u16,
    pub minor_version: u16,
    pub revision: u16,
    pub package_string: String,
    pub environment_string: String,
    pub locale: String,
    pub player_name: String,
    pub nonce: Bytes,
}

impl InitiateConnection {
    /// Build the outbound packet from configured identity strings.
    ///
    /// Protocol name, package string and locale are capped at 256 bytes and the
    /// environment string at 1024 bytes.
    pub fn from_identity(
        identity: &IdentityConfig,
        player_name: impl Into<String>,
        nonce: Bytes,
    ) -> Self {
        Self {
            protocol_name: capped(
                identity.protocol_name.clone(),
                MAX_PROTOCOL_NAME_LEN,
                "protocol_name",
            ),
            major_version: identity.major_version,
            minor_version: identity.minor_version,
            revision: identity.revision,
            package_string: capped(
                identity.package_string.clone(),
                MAX_PACKAGE_STRING_LEN,
                "package_string",
            ),
            environment_string: capped(
                identity.environment_string.clone(),
                MAX_ENVIRONMENT_STRING_LEN,
                "environment_string",
            ),
            locale: capped(identity.locale.clone(), MAX_LOCALE_LEN, "locale"),
            player_name: player_name.into(),
            nonce,
        }
    }
}

impl PacketBody for InitiateConnection {
    const TYPE: PacketType = PacketType::InitiateConnection;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            protocol_name: reader.read_string()?,
            major_version: reader.read_u16()?,
            minor_version: reader.read_u16()?,
            revision: reader.read_u16()?,
            package_string: reader.read_string()?,
            environment_string: reader.read_string()?,
            locale: reader.read_string()?,
            player_name: reader.read_string()?,
            nonce: reader.read_bytes()?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        writer.write_string(&self.protocol_name);
        writer.write_u16(self.major_version);
        writer.write_u16(self.minor_version);
        writer.write_u16(self.revision);
        writer.write_string(&self.package_string);
        writer.write_string(&self.environment_string);
        writer.write_string(&self.locale);
        writer.write_string(&self.player_name);
        writer.write_bytes(&self.nonce);
    }
}

/// Certificate blob and the signature over the peer's nonce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedCertificate {
    pub certificate: Bytes,
    pub signature: Bytes,
}

// [valid(1)] then, only when valid, [certificate][signature]
fn read_certificate(reader: &mut PacketReader<'_>) -> Result<Option<SignedCertificate>> {
    if reader.read_u8()? == 0 {
        return Ok(None);
    }
    Ok(Some(SignedCertificate {
        certificate: reader.read_bytes()?,
        signature: reader.read_bytes()?,
    }))
}

fn write_certificate<B: BufMut>(
    writer: &mut PacketWriter<B>,
    certificate: Option<&SignedCertificate>,
) {
    match certificate {
        Some(signed) => {
            writer.write_u8(1);
            writer.write_bytes(&signed.certificate);
            writer.write_bytes(&signed.signature);
        }
        None => writer.write_u8(0),
    }
}

/// Server certificate; `None` means the server has no valid certificate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerCertificate {
    pub certificate: Option<SignedCertificate>,
}

impl ServerCertificate {
    pub fn is_valid(&self) -> bool {
        self.certificate.is_some()
    }
}

impl PacketBody for ServerCertificate {
    const TYPE: PacketType = PacketType::ServerCertificate;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            certificate: read_certificate(reader)?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        write_certificate(writer, self.certificate.as_ref());
    }
}

/// Client certificate; `None` means the client has no valid certificate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientCertificate {
    pub certificate: Option<SignedCertificate>,
}

impl ClientCertificate {
    pub fn is_valid(&self) -> bool {
        self.certificate.is_some()
    }
}

impl PacketBody for ClientCertificate {
    const TYPE: PacketType = PacketType::ClientCertificate;

    fn read_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            certificate: read_certificate(reader)?,
        })
    }

    fn write_body<B: BufMut>(&self, writer: &mut PacketWriter<B>) {
        write_certificate(writer, self.certificate.as_ref());
    }
}
