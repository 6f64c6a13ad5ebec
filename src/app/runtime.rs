//! Startup sequence shared by every subcommand

use anyhow::Result;
use tracing::{debug, info};

use crate::app::{config::AppConfig, logging::init_logging};
use crate::config::{load_config, RelayConfig};
use crate::error::RelayError;

/// Initialize logging and load the layered relay configuration.
pub async fn initialize_app(config: &AppConfig) -> Result<RelayConfig> {
    init_logging(config);

    let relay_config = load_config(config.config_path.as_deref())
        .await
        .map_err(RelayError::from)?;
    debug!("Loaded configuration: {:?}", relay_config);
    info!(
        "Workspace root {}, go binary '{}'",
        relay_config.workspace.root.display(),
        relay_config.toolchain.go_binary
    );

    Ok(relay_config)
}
