//! Codec Metrics
//!
//! Counters for packets flowing through the stream codec and the dispatcher.
//! Pure decode functions never record anything; only the layers that own a
//! connection do.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::error::ProtocolError;

/// Metrics collector for packet encode/decode traffic
#[derive(Debug)]
pub struct CodecMetrics {
    /// Packets decoded successfully
    pub packets_decoded: AtomicU64,
    /// Packets encoded
    pub packets_encoded: AtomicU64,
    /// Bytes of successfully decoded packets
    pub bytes_decoded: AtomicU64,
    /// Bytes of encoded packets
    pub bytes_encoded: AtomicU64,
    /// All decode failures
    pub decode_errors: AtomicU64,
    pub truncated: AtomicU64,
    pub oversized: AtomicU64,
    pub malformed_varint: AtomicU64,
    pub invalid_magic: AtomicU64,
    pub unknown_tag: AtomicU64,
    /// Packets whose type byte has no decoder
    pub unrecognized: AtomicU64,
    /// Decoded packets with no registered handler
    pub unhandled: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_decoded: AtomicU64::new(0),
            packets_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            truncated: AtomicU64::new(0),
            oversized: AtomicU64::new(0),
            malformed_varint: AtomicU64::new(0),
            invalid_magic: AtomicU64::new(0),
            unknown_tag: AtomicU64::new(0),
            unrecognized: AtomicU64::new(0),
            unhandled: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully decoded packet
    pub fn record_decoded(&self, byte_count: usize) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    /// Record an encoded packet
    pub fn record_encoded(&self, byte_count: usize) {
        self.packets_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    /// Record a failed decode, bucketed by error kind
    pub fn record_decode_error(&self, error: &ProtocolError) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        let bucket = match error {
            ProtocolError::Truncated { .. } => &self.truncated,
            ProtocolError::OversizedField { .. } | ProtocolError::OversizedPacket(_) => {
                &self.oversized
            }
            ProtocolError::MalformedVarInt => &self.malformed_varint,
            ProtocolError::InvalidMagic => &self.invalid_magic,
            ProtocolError::UnknownVariantTag { .. } => &self.unknown_tag,
            ProtocolError::UnrecognizedPacketType(_) => &self.unrecognized,
            _ => return,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet that reached the dispatcher without a handler
    pub fn record_unhandled(&self) {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            packets_encoded: self.packets_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            oversized: self.oversized.load(Ordering::Relaxed),
            malformed_varint: self.malformed_varint.load(Ordering::Relaxed),
            invalid_magic: self.invalid_magic.load(Ordering::Relaxed),
            unknown_tag: self.unknown_tag.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_decoded = snapshot.packets_decoded,
            packets_encoded = snapshot.packets_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            bytes_encoded = snapshot.bytes_encoded,
            decode_errors = snapshot.decode_errors,
            truncated = snapshot.truncated,
            oversized = snapshot.oversized,
            malformed_varint = snapshot.malformed_varint,
            invalid_magic = snapshot.invalid_magic,
            unknown_tag = snapshot.unknown_tag,
            unrecognized = snapshot.unrecognized,
            unhandled = snapshot.unhandled,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_decoded: u64,
    pub packets_encoded: u64,
    pub bytes_decoded: u64,
    pub bytes_encoded: u64,
    pub decode_errors: u64,
    pub truncated: u64,
    pub oversized: u64,
    pub malformed_varint: u64,
    pub invalid_magic: u64,
    pub unknown_tag: u64,
    pub unrecognized: u64,
    pub unhandled: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> =
    once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the process-wide metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}
