//! # Buffer Pool
//!
//! Reusable buffers for encoding outbound packets, so a connection's send
//! path does not allocate per packet.
//!
//! Buffers that grew past [`MAX_POOLED_BUFFER_SIZE`] (large map fragments,
//! skin bundles) are released instead of being kept around.
//!
//! ## Usage
//! ```rust
//! use spades_protocol::protocol::message::JumpAction;
//! use spades_protocol::utils::buffer_pool::BufferPool;
//! use spades_protocol::Packet;
//!
//! let pool = BufferPool::new(8);
//! let packet = Packet::from(JumpAction { timestamp: 42 });
//! let encoded = packet.encode_pooled(&pool);
//! assert_eq!(encoded.as_ref(), packet.generate().as_slice());
//! // Buffer goes back to the pool on drop
//! ```

use std::sync::{Arc, Mutex};

use crate::config::CodecConfig;

/// Largest buffer capacity kept for reuse (16KB)
pub const MAX_POOLED_BUFFER_SIZE: usize = 16 * 1024;

/// Capacity of freshly allocated buffers; fits a typical entity batch
const DEFAULT_BUFFER_CAPACITY: usize = 1024;

type SharedBuffers = Arc<Mutex<Vec<Vec<u8>>>>;

/// An encode buffer that returns itself to the pool when dropped
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: SharedBuffers,
}

impl PooledBuffer {
    /// Get an immutable reference to the encoded bytes
    #[allow(clippy::should_implement_trait)]
    pub fn as_ref(&self) -> &[u8] {
        &self.buffer
    }

    /// Take the bytes out; the pool gets nothing back
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let capacity = self.buffer.capacity();
        if capacity == 0 || capacity > MAX_POOLED_BUFFER_SIZE {
            return;
        }
        self.buffer.clear();
        if let Ok(mut pool) = self.pool.lock() {
            pool.push(std::mem::take(&mut self.buffer));
        }
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Thread-safe pool of encode buffers
#[derive(Clone)]
pub struct BufferPool {
    pool: SharedBuffers,
}

impl BufferPool {
    /// Create a pool pre-filled with `pool_size` buffers
    pub fn new(pool_size: usize) -> Self {
        let pool = (0..pool_size)
            .map(|_| Vec::with_capacity(DEFAULT_BUFFER_CAPACITY))
            .collect();

        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.buffer_pool_size)
    }

    /// Take a cleared buffer from the pool, allocating when it is empty
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = self
            .pool
            .lock()
            .ok()
            .and_then(|mut pool| pool.pop())
            .unwrap_or_else(|| Vec::with_capacity(DEFAULT_BUFFER_CAPACITY));

        PooledBuffer {
            buffer,
            pool: Arc::clone(&self.pool),
        }
    }

    /// Number of buffers currently waiting in the pool
    pub fn available(&self) -> usize {
        self.pool.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::from_config(&CodecConfig::default())
    }
}
