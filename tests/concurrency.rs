#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::{Bytes, BytesMut};
use glam::Vec3;
use spades_protocol::core::codec::PacketCodec;
use spades_protocol::protocol::entity::{EntityUpdate, EntityUpdateItem};
use spades_protocol::protocol::message::{JumpAction, MapData};
use spades_protocol::protocol::trajectory::Trajectory;
use spades_protocol::protocol::Dispatcher;
use spades_protocol::utils::buffer_pool::BufferPool;
use spades_protocol::{Packet, PacketType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::codec::{Decoder, Encoder};

fn entity_batch(seed: u32, len: usize) -> Packet {
    let items = (0..len as u32)
        .map(|i| EntityUpdateItem {
            trajectory: Some(Trajectory::player(
                Vec3::splat((seed + i) as f32),
                Vec3::ZERO,
                Vec3::X,
            )),
            health: Some((i & 0xFF) as u8),
            ..EntityUpdateItem::new(seed.wrapping_mul(1000) + i)
        })
        .collect();
    Packet::from(EntityUpdate { items })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_encode_decode_heavy() {
    let iterations = 2_000u32;
    let batch_sizes = [0usize, 1, 8, 64];

    let mut tasks = JoinSet::new();
    for (task, &size) in batch_sizes.iter().enumerate() {
        tasks.spawn(async move {
            let mut codec = PacketCodec::default();
            let mut buf = BytesMut::new();
            for i in 0..iterations {
                let packet = entity_batch(task as u32 * iterations + i, size);
                codec.encode(packet.clone(), &mut buf).unwrap();
                let decoded = codec.decode(&mut buf).unwrap();
                assert_eq!(decoded, Some(packet));
                assert!(buf.is_empty());
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_shares_handlers() {
    let dispatcher = Dispatcher::new();
    let jumps = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&jumps);
    dispatcher
        .register(PacketType::JumpAction, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();

    let bytes = Bytes::from(Packet::from(JumpAction { timestamp: 7 }).generate());
    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let dispatcher = dispatcher.clone();
        let bytes = bytes.clone();
        tasks.spawn(async move {
            for _ in 0..500 {
                let handled = dispatcher.handle_bytes(&bytes).unwrap();
                assert_eq!(handled, Some(PacketType::JumpAction));
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
    assert_eq!(jumps.load(Ordering::Relaxed), 8 * 500);
}

#[test]
fn concurrent_registration_and_dispatch() {
    let dispatcher = Dispatcher::new();
    let handles: Vec<_> = PacketType::ALL
        .iter()
        .copied()
        .map(|packet_type| {
            let dispatcher = dispatcher.clone();
            std::thread::spawn(move || dispatcher.register(packet_type, |_| Ok(())).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for &packet_type in PacketType::ALL {
        assert!(dispatcher.is_registered(packet_type));
    }
}

#[test]
fn concurrent_buffer_pool_use() {
    let pool = BufferPool::new(4);
    let packet = Packet::from(MapData {
        fragment: Bytes::from(vec![1u8; 512]),
    });
    let expected = packet.generate();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..1_000 {
                    let encoded = packet.encode_pooled(&pool);
                    assert_eq!(encoded.as_ref(), expected.as_slice());
                }
            });
        }
    });

    // Every buffer ends up back in the pool, plus any allocated under contention
    assert!(pool.available() >= 4);
}
