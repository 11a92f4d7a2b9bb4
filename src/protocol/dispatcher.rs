use crate::config::CodecConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::packet::{Packet, PacketType};
use crate::utils::metrics::global_metrics;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

type HandlerFn = dyn Fn(Packet) -> Result<()> + Send + Sync + 'static;

/// Routes decoded packets to handlers keyed by [`PacketType`].
///
/// Clones share the same handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<PacketType, Box<HandlerFn>>>>,
    ignore_unrecognized: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            ignore_unrecognized: config.ignore_unrecognized,
        }
    }

    /// Register `handler` for `packet_type`, replacing any previous one.
    pub fn register<F>(&self, packet_type: PacketType, handler: F) -> Result<()>
    where
        F: Fn(Packet) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        handlers.insert(packet_type, Box::new(handler));
        Ok(())
    }

    pub fn is_registered(&self, packet_type: PacketType) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(&packet_type))
            .unwrap_or(false)
    }

    /// Hand `packet` to the handler registered for its type.
    pub fn dispatch(&self, packet: Packet) -> Result<()> {
        let packet_type = packet.packet_type();

        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        match handlers.get(&packet_type) {
            Some(handler) => {
                trace!(kind = packet_type.name(), "Dispatching packet");
                handler(packet)
            }
            None => {
                global_metrics().record_unhandled();
                Err(ProtocolError::UnhandledPacket(packet_type))
            }
        }
    }

    /// Decode one transport-delimited packet and dispatch it.
    ///
    /// Returns the type that was handled, or `None` when the type byte was
    /// unrecognized and the dispatcher is configured to skip those.
    pub fn handle_bytes(&self, data: &[u8]) -> Result<Option<PacketType>> {
        let packet = match Packet::decode(data) {
            Ok(packet) => packet,
            Err(e) => {
                global_metrics().record_decode_error(&e);
                if self.ignore_unrecognized && e.is_unrecognized() {
                    debug!(error = %e, "Skipping unrecognized packet");
                    return Ok(None);
                }
                return Err(e);
            }
        };

        global_metrics().record_decoded(data.len());
        let packet_type = packet.packet_type();
        self.dispatch(packet)?;
        Ok(Some(packet_type))
    }
}
