use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::felt::Felt;
use crate::provider::ProviderConfig;

/// Env var that overrides the report file name.
pub const REPORT_NAME_ENV: &str = "REPORT_NAME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub network: NetworkConfig,
	pub account: AccountConfig,
	pub provider: ProviderSettings,
	pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	pub default: String,
	pub testnet_gateway: String,
	pub mainnet_gateway: String,
	pub devnet_gateway: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
	pub address: Option<String>,
	pub signer_url: Option<String>,
	pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
	pub poll_interval_secs: u64,
	pub max_fee: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
	pub name: String,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			default: "testnet".into(),
			testnet_gateway: "https://alpha4.starknet.io".into(),
			mainnet_gateway: "https://alpha-mainnet.starknet.io".into(),
			devnet_gateway: "http://127.0.0.1:5050".into(),
		}
	}
}

impl Default for ProviderSettings {
	fn default() -> Self {
		Self {
			poll_interval_secs: 5,
			max_fee: "0".into(),
		}
	}
}

impl Default for ReportConfig {
	fn default() -> Self {
		Self {
			name: "report".into(),
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.starknet-ops/).
	pub fn dir() -> Result<PathBuf> {
		dirs::home_dir()
			.map(|home| home.join(".starknet-ops"))
			.ok_or_else(|| anyhow!("could not determine home directory"))
	}

	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		Ok(Self::dir()?.join("config.toml"))
	}

	/// Load config from disk, falling back to defaults if no file exists.
	pub fn load() -> Result<Self> {
		let path = Self::path()?;
		if path.exists() {
			let content = std::fs::read_to_string(&path)?;
			Ok(toml::from_str(&content)?)
		} else {
			Ok(Self::default())
		}
	}

	/// Persist the current config to disk, creating the directory if needed.
	pub fn save(&self) -> Result<()> {
		let path = Self::path()?;
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, toml::to_string_pretty(self)?)?;
		Ok(())
	}

	/// Return the gateway URL for the given network name.
	pub fn gateway_url(&self, network: &str) -> &str {
		match network {
			"mainnet" => &self.network.mainnet_gateway,
			"devnet" => &self.network.devnet_gateway,
			_ => &self.network.testnet_gateway,
		}
	}

	/// Provider settings for `endpoint`.  A zero poll interval is rejected;
	/// it would hammer the feeder gateway.
	pub fn provider_config(&self, endpoint: &str) -> Result<ProviderConfig> {
		if self.provider.poll_interval_secs == 0 {
			bail!("provider.poll_interval_secs must be at least 1");
		}
		let max_fee: Felt = self
			.provider
			.max_fee
			.parse()
			.map_err(|e| anyhow!("invalid provider.max_fee in config: {e}"))?;
		Ok(ProviderConfig {
			endpoint: endpoint.to_owned(),
			poll_interval: Duration::from_secs(self.provider.poll_interval_secs),
			max_fee,
		})
	}

	/// Report file name, with `REPORT_NAME` taking precedence.
	pub fn report_name(&self) -> String {
		std::env::var(REPORT_NAME_ENV).unwrap_or_else(|_| self.report.name.clone())
	}
}
