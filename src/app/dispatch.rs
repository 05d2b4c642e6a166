use crate::cli::commands::Commands;
use anyhow::{Context, Result};
use chatrelay::Config;
use std::sync::Arc;
use tracing::info;

pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting chat relay on {host} (random port)");
            } else {
                info!("Starting chat relay on {host}:{port}");
            }
            chatrelay::transport::gateway::run_gateway(&host, port, Arc::new(config)).await?;
            Ok(())
        }

        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            if !config.config_path.as_os_str().is_empty() {
                println!("# {}", config.config_path.display());
            }
            print!("{rendered}");
            Ok(())
        }
    }
}
