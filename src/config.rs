//! # Configuration Management
//!
//! Centralized configuration for the packet codec.
//!
//! This module provides the identity strings a client announces in its
//! `InitiateConnection` packet, limits for stream framing and dispatch, and
//! logging options.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - The per-field cap ([`MAX_FIELD_SIZE`]) is part of the wire format and
//!   cannot be raised by configuration
//! - Stream frames are capped by `codec.max_frame_size`

use crate::error::{constants, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Name announced in `InitiateConnection`
pub const PROTOCOL_NAME: &str = "OpenSpades 0.1";

/// Max length of any length-prefixed field (1 MiB)
pub const MAX_FIELD_SIZE: usize = 1024 * 1024;

/// Default cap for one length-delimited stream frame (4 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Smallest frame cap that still fits one maximal field plus its headers
pub const MIN_MAX_FRAME_SIZE: usize = MAX_FIELD_SIZE + 64;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Client identity announced during the handshake
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Framing and dispatch configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        if let Ok(locale) = std::env::var("SPADES_PROTOCOL_LOCALE") {
            config.identity.locale = locale;
        }

        if let Ok(size) = std::env::var("SPADES_PROTOCOL_MAX_FRAME_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.codec.max_frame_size = val;
            }
        }

        if let Ok(flag) = std::env::var("SPADES_PROTOCOL_IGNORE_UNRECOGNIZED") {
            if let Ok(val) = flag.parse::<bool>() {
                config.codec.ignore_unrecognized = val;
            }
        }

        if let Ok(level) = std::env::var("SPADES_PROTOCOL_LOG_LEVEL") {
            if let Ok(val) = level.parse::<Level>() {
                config.logging.log_level = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_WRITE))
        })?;

        std::fs::write(path, content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_WRITE))
        })?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.identity.validate());
        errors.extend(self.codec.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "{}:\n  - {}",
                constants::ERR_CONFIG_INVALID,
                errors.join("\n  - ")
            )))
        }
    }
}

/// Identity strings and version announced by a client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Protocol name (capped at 256 bytes on send)
    pub protocol_name: String,

    pub major_version: u16,
    pub minor_version: u16,
    pub revision: u16,

    /// Build/package string (capped at 256 bytes on send)
    pub package_string: String,

    /// Operating environment description (capped at 1024 bytes on send)
    pub environment_string: String,

    /// Locale such as "en_US" (capped at 256 bytes on send)
    pub locale: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            protocol_name: String::from(PROTOCOL_NAME),
            major_version: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor_version: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            revision: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
            package_string: format!(
                "{} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            environment_string: format!(
                "{} {}",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            locale: String::new(),
        }
    }
}

impl IdentityConfig {
    /// Validate identity configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.protocol_name.is_empty() {
            errors.push("Protocol name cannot be empty".to_string());
        }

        for (name, value) in [
            ("Protocol name", &self.protocol_name),
            ("Package string", &self.package_string),
            ("Environment string", &self.environment_string),
            ("Locale", &self.locale),
        ] {
            if value.contains('\0') {
                errors.push(format!("{name} cannot contain NUL characters"));
            }
        }

        errors
    }
}

/// Framing and dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Maximum size of one length-delimited frame on stream transports
    pub max_frame_size: usize,

    /// Number of encode buffers kept in the pool
    pub buffer_pool_size: usize,

    /// Whether the dispatcher silently skips packet types it does not know
    pub ignore_unrecognized: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            buffer_pool_size: 50,
            ignore_unrecognized: true,
        }
    }
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_size < MIN_MAX_FRAME_SIZE {
            errors.push(format!(
                "Max frame size too small: {} bytes (minimum: {MIN_MAX_FRAME_SIZE})",
                self.max_frame_size
            ));
        } else if self.max_frame_size > u32::MAX as usize {
            errors.push(format!(
                "Max frame size too large: {} bytes (length prefix is 32-bit)",
                self.max_frame_size
            ));
        }

        if self.buffer_pool_size > 100_000 {
            errors.push(format!(
                "Buffer pool size very high: {} (ensure memory can support this)",
                self.buffer_pool_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("spades-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
