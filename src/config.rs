use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::fs::read_to_string;

use crate::client::parse_commitment;

/// Well-known public clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Testnet,
}

impl Cluster {
    pub fn url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub rpc_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,            // Per-request timeout for the HTTP transport
    #[serde(default)]
    pub commitment: Option<String>,   // processed | confirmed | finalized (default: finalized)
}

fn default_timeout_secs() -> u64 {
    5
}

impl ClientConfig {
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            rpc_url: cluster.url().to_string(),
            timeout_secs: default_timeout_secs(),
            commitment: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            anyhow::bail!("rpc_url must not be empty");
        }

        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            anyhow::bail!("rpc_url must be an http(s) URL: {}", self.rpc_url);
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }

        if let Some(commitment) = &self.commitment {
            if parse_commitment(commitment).is_none() {
                anyhow::bail!(
                    "commitment must be one of processed, confirmed, finalized (got {})",
                    commitment
                );
            }
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::MainnetBeta)
    }
}

pub fn load_config(path: &str) -> Result<ClientConfig> {
    let config_str = read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    let config: ClientConfig = serde_json::from_str(&config_str)
        .context("Failed to parse config JSON")?;

    config.validate()?;

    log::info!("Loaded config from: {}", path);
    log::info!("  RPC URL: {}", config.rpc_url);
    log::info!("  Timeout: {}s", config.timeout_secs);
    log::info!("  Commitment: {}", config.commitment.as_deref().unwrap_or("finalized"));

    Ok(config)
}
