use serde::Deserialize;

/// Server-side settings loaded from the TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// UDP address the daemon listens on for FILE_TRANSFER_PROTOCOL frames.
    pub listen_addr: String,
    /// All request paths are resolved under this directory.
    pub root_dir: String,
    #[serde(default = "default_system_id")]
    pub system_id: u8,
    #[serde(default = "default_component_id")]
    pub component_id: u8,
    /// One-line identification banner sent after a parameter-pack open.
    #[serde(default)]
    pub banner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
}

fn default_system_id() -> u8 {
    1
}

fn default_component_id() -> u8 {
    1
}
