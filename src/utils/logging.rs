//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{constants, ProtocolError, Result};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the global fmt subscriber described by `config`.
///
/// Calling this again after a successful install is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INSTALLED
        .get_or_try_init(|| install(config))
        .map(|_| ())
}

fn install(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(config.log_level).into())
    });

    let installed = if config.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    installed.map_err(|e| ProtocolError::Custom(format!("{}: {e}", constants::ERR_LOGGING_INIT)))?;

    info!(
        app_name = %config.app_name,
        level = %config.log_level,
        json = config.json_format,
        "Logging initialized"
    );
    Ok(())
}
