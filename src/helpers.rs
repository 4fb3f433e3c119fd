use crate::config::Config;
use anyhow::{Context, Result};
use log::info;
use std::fs;

/// Length of the NUL-terminated string at the front of `buf`, capped at the
/// buffer length when no terminator is present.
pub fn strnlen(buf: &[u8]) -> usize {
    buf.iter().position(|&b| b == 0).unwrap_or(buf.len())
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!("  Listen Address: {}", config.server.listen_addr);
    info!("  Root Directory: {}", config.server.root_dir);
    info!("  System Id: {}", config.server.system_id);
    info!("  Component Id: {}", config.server.component_id);
}
