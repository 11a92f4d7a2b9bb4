#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge-case tests for malformed and boundary inputs
//! Tests varint limits, field caps, text handling, maps and error reporting

use bytes::Bytes;
use spades_protocol::config::MAX_FIELD_SIZE;
use spades_protocol::core::reader::PacketReader;
use spades_protocol::error::{ProtocolError, VariantKind};
use spades_protocol::protocol::entity::{EntityUpdate, EntityUpdateFlags};
use spades_protocol::protocol::handshake::{Greeting, InitiateConnection, ServerCertificate};
use spades_protocol::protocol::message::{GameStateFinal, GameStateHeader, JumpAction, Kick, MapData};
use spades_protocol::protocol::registry;
use spades_protocol::{Packet, PacketBody, PacketType};

// ============================================================================
// VARINT EDGE CASES
// ============================================================================

#[test]
fn test_varint_continuation_run_rejected() {
    // JumpAction whose timestamp never terminates
    let mut data = vec![PacketType::JumpAction.as_u8()];
    data.extend_from_slice(&[0x80; 64]);
    assert!(matches!(
        Packet::decode(&data),
        Err(ProtocolError::MalformedVarInt)
    ));
}

#[test]
fn test_varint_fifth_byte_overflow() {
    // 0x10 in the fifth byte would set bit 32
    let data = [PacketType::JumpAction.as_u8(), 0xFF, 0xFF, 0xFF, 0xFF, 0x10];
    assert!(matches!(
        Packet::decode(&data),
        Err(ProtocolError::MalformedVarInt)
    ));

    let data = [PacketType::JumpAction.as_u8(), 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
    assert_eq!(
        JumpAction::decode(&data).unwrap(),
        JumpAction {
            timestamp: u32::MAX
        }
    );
}

#[test]
fn test_varint_non_minimal_accepted() {
    // 0x80 0x00 is a redundant encoding of zero
    let data = [PacketType::ReloadWeapon.as_u8(), 0x80, 0x00];
    match Packet::decode(&data).unwrap() {
        Packet::ReloadWeapon(reload) => assert_eq!(reload.timestamp, 0),
        other => panic!("Expected ReloadWeapon, got {other:?}"),
    }
}

#[test]
fn test_varint_truncated() {
    let data = [PacketType::JumpAction.as_u8(), 0x80];
    assert!(matches!(
        Packet::decode(&data),
        Err(ProtocolError::Truncated { .. })
    ));
}

// ============================================================================
// FIELD LIMITS
// ============================================================================

#[test]
fn test_field_at_cap_decodes() {
    let packet = MapData {
        fragment: Bytes::from(vec![0u8; MAX_FIELD_SIZE]),
    };
    let decoded = MapData::decode(&packet.generate()).unwrap();
    assert_eq!(decoded.fragment.len(), MAX_FIELD_SIZE);
}

#[test]
fn test_huge_declared_length_fails_fast() {
    // Declares ~4 GiB; must fail on the cap, not on the missing bytes
    let data = [PacketType::Kick.as_u8(), 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
    match Packet::decode(&data) {
        Err(ProtocolError::OversizedField { len, max }) => {
            assert_eq!(len, u64::from(u32::MAX));
            assert_eq!(max, MAX_FIELD_SIZE);
        }
        other => panic!("Expected OversizedField, got {other:?}"),
    }
}

#[test]
fn test_declared_length_past_end() {
    let data = [PacketType::MapData.as_u8(), 10, 1, 2, 3];
    assert!(matches!(
        Packet::decode(&data),
        Err(ProtocolError::Truncated {
            needed: 10,
            remaining: 3
        })
    ));
}

// ============================================================================
// TEXT AND MAP HANDLING
// ============================================================================

#[test]
fn test_invalid_utf8_is_replaced() {
    let data = [PacketType::Kick.as_u8(), 3, b'o', 0xFF, b'k'];
    let kick = Kick::decode(&data).unwrap();
    assert_eq!(kick.reason, "o\u{FFFD}k");
}

#[test]
fn test_reader_text_and_blob_differ_on_nul() {
    let data = [4, b'a', 0, b'b', 0, 4, b'a', 0, b'b', 0];
    let mut reader = PacketReader::new(&data);
    assert_eq!(reader.read_string().unwrap(), "a");
    assert_eq!(reader.read_bytes().unwrap().as_ref(), &[b'a', 0, b'b', 0]);
    assert!(reader.is_end_of_packet());
}

#[test]
fn test_map_key_empty_after_nul_ends_map() {
    // key "\0z" reads as "" and terminates; the pairs behind it are never read
    let data = [
        PacketType::GameStateFinal.as_u8(),
        2,
        0,
        b'z',
        1,
        b'v',
        1,
        b'k',
        1,
        b'w',
        0,
    ];
    let decoded = GameStateFinal::decode(&data).unwrap();
    assert!(decoded.properties.is_empty());

    let header = [
        PacketType::GameStateHeader.as_u8(),
        2,
        0,
        b'x',
        1,
        b'v',
        1,
        b'k',
        1,
        b'v',
        0,
    ];
    assert!(GameStateHeader::decode(&header).unwrap().properties.is_empty());
}

#[test]
fn test_map_duplicate_key_last_wins() {
    let data = [
        PacketType::GameStateFinal.as_u8(),
        1,
        b'k',
        1,
        b'1',
        1,
        b'k',
        1,
        b'2',
        0,
    ];
    let decoded = GameStateFinal::decode(&data).unwrap();
    assert_eq!(decoded.properties["k"], "2");
}

#[test]
fn test_map_missing_terminator() {
    let data = [PacketType::GameStateFinal.as_u8(), 1, b'k', 1, b'v'];
    assert!(matches!(
        GameStateFinal::decode(&data),
        Err(ProtocolError::Truncated { .. })
    ));
}

// ============================================================================
// HANDSHAKE EDGE CASES
// ============================================================================

#[test]
fn test_greeting_empty_nonce() {
    let greeting = Greeting { nonce: Bytes::new() };
    assert_eq!(Greeting::decode(&greeting.generate()).unwrap(), greeting);
}

#[test]
fn test_greeting_magic_is_case_sensitive() {
    let data = [PacketType::Greeting.as_u8(), 5, b'h', b'e', b'l', b'l', b'o', 0];
    assert!(matches!(
        Greeting::decode(&data),
        Err(ProtocolError::InvalidMagic)
    ));
}

#[test]
fn test_initiate_connection_truncated_mid_version() {
    let full = InitiateConnection::default().generate();
    // Type byte, empty protocol name, then one byte of the major version
    assert!(matches!(
        InitiateConnection::decode(&full[..3]),
        Err(ProtocolError::Truncated { .. })
    ));
}

#[test]
fn test_invalid_certificate_ignores_body() {
    // validity 0 followed by bytes that would be a certificate
    let data = [PacketType::ServerCertificate.as_u8(), 0, 3, b'a', b'b', b'c'];
    let packet = ServerCertificate::decode(&data).unwrap();
    assert!(!packet.is_valid());
}

// ============================================================================
// ENTITY EDGE CASES
// ============================================================================

#[test]
fn test_empty_entity_batch() {
    let packet = EntityUpdate::default();
    let bytes = packet.generate();
    assert_eq!(bytes, vec![PacketType::EntityUpdate.as_u8()]);
    assert!(EntityUpdate::decode(&bytes).unwrap().items.is_empty());
}

#[test]
fn test_entity_presence_without_payload() {
    // Health announced but missing
    let data = [
        PacketType::EntityUpdate.as_u8(),
        9,
        EntityUpdateFlags::HEALTH.bits(),
    ];
    assert!(matches!(
        EntityUpdate::decode(&data),
        Err(ProtocolError::Truncated { .. })
    ));
}

#[test]
fn test_entity_unknown_trajectory_tag() {
    let mut data = vec![
        PacketType::EntityUpdate.as_u8(),
        1,
        EntityUpdateFlags::TRAJECTORY.bits(),
        5,
    ];
    data.extend_from_slice(&[0u8; 48]);
    match EntityUpdate::decode(&data) {
        Err(ProtocolError::UnknownVariantTag { kind, tag }) => {
            assert_eq!(kind, VariantKind::Trajectory);
            assert_eq!(tag, 5);
        }
        other => panic!("Expected UnknownVariantTag, got {other:?}"),
    }
}

// ============================================================================
// REGISTRY AND ERROR REPORTING
// ============================================================================

#[test]
fn test_every_unused_id_is_unrecognized() {
    for type_id in 0..=u8::MAX {
        let registered = PacketType::try_from(type_id).is_ok();
        assert_eq!(registry::is_registered(type_id), registered);
        if !registered {
            let err = Packet::decode(&[type_id]).unwrap_err();
            assert!(err.is_unrecognized());
            assert!(!err.is_malformed_input());
        }
    }
}

#[test]
fn test_error_predicates() {
    assert!(ProtocolError::MalformedVarInt.is_malformed_input());
    assert!(ProtocolError::InvalidMagic.is_malformed_input());
    assert!(!ProtocolError::UnhandledPacket(PacketType::Kick).is_malformed_input());
}

#[test]
fn test_error_messages() {
    let err = ProtocolError::UnknownVariantTag {
        kind: VariantKind::PlayerStance,
        tag: 3,
    };
    assert!(err.to_string().contains("player stance"));
    assert!(err.to_string().contains('3'));

    let err = ProtocolError::UnrecognizedPacketType(127);
    assert!(err.to_string().contains("127"));
}
