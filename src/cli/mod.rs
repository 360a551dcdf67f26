use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "pace-api")]
#[command(about = "PACE API - CRUD backend for construction project tracking")]
#[command(version)]
pub struct Args {
    #[arg(
        long,
        short,
        default_value = ".",
        help = "Config file, or a directory containing config.yaml"
    )]
    pub config: PathBuf,

    #[arg(long, short, help = "Port to listen on (overrides config)")]
    pub port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides config)")]
    pub host: Option<String>,
}

impl Args {
    /// Flags win over file and environment values.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        config
    }
}
