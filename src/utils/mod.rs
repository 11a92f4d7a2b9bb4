//! # Utility Modules
//!
//! Supporting utilities shared by the codec and its callers.
//!
//! ## Components
//! - **Buffer Pool**: reusable encode buffers for hot send paths
//! - **Logging**: structured logging setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: thread-safe counters for decoded/encoded packets and failures

pub mod buffer_pool;
pub mod logging;
pub mod metrics;

// Re-export public types for advanced users
pub use buffer_pool::{BufferPool, PooledBuffer};
pub use logging::init_logging;
pub use metrics::{global_metrics, CodecMetrics, MetricsSnapshot};
