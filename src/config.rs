use super::address::{DEFAULT_END, DEFAULT_START};
use super::network::contract::{parse_abi, BUNDLED_ABI, DEFAULT_CONTRACT_ADDRESS};
use super::view::{Renderer, DEFAULT_AVATAR_BASE};
use anyhow::{Context, Result};
use ethers::{abi::Abi, types::Address};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "chirp.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortAddress {
    pub start: usize,
    pub end: usize,
}

impl Default for ShortAddress {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint of the wallet. Without one every call fails with
    /// "no provider".
    pub rpc_url: Option<String>,
    pub contract_address: String,
    /// Contract interface descriptor; the bundled one is used when unset
    pub abi_path: Option<PathBuf>,
    pub avatar_base_url: String,
    /// How often pending transactions are polled
    pub poll_interval_ms: Option<u64>,
    pub confirmations: usize,
    /// Send pre-1559 transactions, for nodes without fee history
    pub legacy_transactions: bool,
    pub short_address: ShortAddress,
    /// Rewritten with the HTML projection after every change
    pub html_out: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_owned(),
            abi_path: None,
            avatar_base_url: DEFAULT_AVATAR_BASE.to_owned(),
            poll_interval_ms: None,
            confirmations: 1,
            legacy_transactions: false,
            short_address: ShortAddress::default(),
            html_out: None,
        }
    }
}

impl Config {
    /// Load config from `path`, falling back to defaults when it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn contract_address(&self) -> Result<Address> {
        self.contract_address
            .parse()
            .with_context(|| format!("invalid contract address {:?}", self.contract_address))
    }

    pub fn abi(&self) -> Result<Abi> {
        let json = match &self.abi_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading contract interface {}", path.display()))?,
            None => BUNDLED_ABI.to_owned(),
        };
        Ok(parse_abi(&json)?)
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(
            self.avatar_base_url.clone(),
            self.short_address.start,
            self.short_address.end,
        )
    }
}
