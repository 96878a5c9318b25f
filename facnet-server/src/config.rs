use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use facnet_core::NetworkSourceConfig;
use serde::Deserialize;

use crate::error::StartupError;

/// HTTP front-end for facility network analysis
#[derive(Debug, Parser)]
#[command(name = "facnet-server", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides `bind` from the file
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Facility CSV to load at start, overrides `facilities` from the file
    #[arg(long)]
    pub facilities: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Place used when a request names none
    pub default_place: String,
    pub facilities: Option<PathBuf>,
    /// Covers a cold network fetch, which can take minutes
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub network: NetworkSourceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            default_place: "Nairobi, Kenya".to_string(),
            facilities: None,
            request_timeout_secs: 600,
            max_concurrent_requests: 16,
            network: NetworkSourceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// File values (or defaults) with command-line overrides applied
    pub fn load(cli: &Cli) -> Result<Self, StartupError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        if let Some(facilities) = &cli.facilities {
            config.facilities = Some(facilities.clone());
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(path).map_err(|source| StartupError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, StartupError> {
        Ok(toml::from_str(text)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
