mod config;
mod constants;
mod core_filesystem;
mod core_ftpcommand;
mod core_protocol;
mod core_transport;
mod helpers;
mod server;
mod session;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "mavftpd", about = "A MAVLink file-transfer server written in Rust.")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    config: String,

    /// Override the listen address from the configuration
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file
    let config_path = if args.config.is_empty() {
        "/etc/mavftpd.toml"
    } else {
        args.config.as_str()
    };
    let mut config = helpers::load_config(config_path)?;

    // Override the listen address from the CLI if provided
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    helpers::log_config(&config);

    // Run the FTP server
    server::run(config).await?;

    Ok(())
}
