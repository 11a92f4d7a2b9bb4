//! Integration tests for stream framing
//!
//! These tests drive [`PacketCodec`] through `Framed` over in-memory duplex
//! streams, including frames split across many small reads.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use glam::Vec3;
use spades_protocol::core::codec::PacketCodec;
use spades_protocol::error::ProtocolError;
use spades_protocol::protocol::entity::{EntityUpdate, EntityUpdateItem};
use spades_protocol::protocol::handshake::Greeting;
use spades_protocol::protocol::message::{JumpAction, Kick, MapData};
use spades_protocol::protocol::trajectory::Trajectory;
use spades_protocol::Packet;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{Decoder, Encoder, Framed, FramedRead};

fn sample_packets() -> Vec<Packet> {
    vec![
        Packet::from(Greeting::with_random_nonce()),
        Packet::from(Kick {
            reason: "server restarting".to_string(),
        }),
        Packet::from(MapData {
            fragment: Bytes::from(vec![0x5A; 8192]),
        }),
        Packet::from(EntityUpdate {
            items: vec![EntityUpdateItem {
                trajectory: Some(Trajectory::player(Vec3::ONE, Vec3::Y, Vec3::Z)),
                health: Some(50),
                ..EntityUpdateItem::new(12)
            }],
        }),
        Packet::from(JumpAction { timestamp: 99 }),
    ]
}

#[tokio::test]
async fn test_framed_roundtrip_over_duplex() {
    // Small pipe capacity forces partial reads and writes
    let (client, server) = tokio::io::duplex(64);
    let mut client = Framed::new(client, PacketCodec::default());
    let mut server = Framed::new(server, PacketCodec::default());

    let packets = sample_packets();
    let expected = packets.clone();

    let writer = tokio::spawn(async move {
        for packet in packets {
            client.send(packet).await.expect("send should succeed");
        }
        client
    });

    for want in expected {
        let got = server
            .next()
            .await
            .expect("stream ended early")
            .expect("frame should decode");
        assert_eq!(got, want);
    }

    let _client = writer.await.unwrap();
}

#[tokio::test]
async fn test_byte_at_a_time_delivery() {
    let mut codec = PacketCodec::default();
    let mut wire = BytesMut::new();
    for packet in sample_packets() {
        codec.encode(packet, &mut wire).unwrap();
    }

    let (mut tx, rx) = tokio::io::duplex(1);
    let wire = wire.freeze();
    let feeder = tokio::spawn(async move {
        for byte in wire.iter() {
            tx.write_all(&[*byte]).await.unwrap();
        }
    });

    let mut reader = FramedRead::new(rx, PacketCodec::default());
    let mut received = Vec::new();
    while let Some(frame) = reader.next().await {
        received.push(frame.unwrap());
    }
    feeder.await.unwrap();

    // Greeting nonces are random, so only the kind is compared there
    let expected = sample_packets();
    assert_eq!(received.len(), expected.len());
    assert!(matches!(received[0], Packet::Greeting(_)));
    assert_eq!(received[1..], expected[1..]);
}

#[tokio::test]
async fn test_oversized_frame_ends_stream() {
    let (mut tx, rx) = tokio::io::duplex(256);
    let mut header = BytesMut::new();
    header.put_u32_le(u32::MAX);
    tx.write_all(&header).await.unwrap();

    let mut reader = FramedRead::new(rx, PacketCodec::default());
    match reader.next().await {
        Some(Err(ProtocolError::OversizedPacket(len))) => assert_eq!(len, u32::MAX as usize),
        other => panic!("Expected OversizedPacket, got {other:?}"),
    }
}

#[test]
fn test_direct_decode_recovers_after_bad_frame() {
    let mut codec = PacketCodec::default();
    let mut buf = BytesMut::new();

    // A JumpAction frame whose varint never terminates
    buf.put_u32_le(7);
    buf.put_slice(&[10, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);
    codec
        .encode(Packet::from(JumpAction { timestamp: 4 }), &mut buf)
        .unwrap();

    assert!(matches!(
        codec.decode(&mut buf),
        Err(ProtocolError::MalformedVarInt)
    ));
    assert_eq!(
        codec.decode(&mut buf).unwrap(),
        Some(Packet::from(JumpAction { timestamp: 4 }))
    );
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn test_encode_appends_after_existing_bytes() {
    let mut codec = PacketCodec::default();
    let mut buf = BytesMut::from(&[0xEE][..]);
    codec
        .encode(Packet::from(JumpAction { timestamp: 1 }), &mut buf)
        .unwrap();
    assert_eq!(&buf[..], &[0xEE, 2, 0, 0, 0, 10, 1]);
}
