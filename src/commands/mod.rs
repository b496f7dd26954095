pub mod run;
pub mod signer;
pub mod tx;

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::felt::Felt;
use crate::provider::Provider;
use crate::signer::{self as wallet, Wallet};

/// Resolve the gateway URL from CLI flag or config.
pub fn resolve_gateway(cli: &Cli, config: &Config) -> String {
	cli.gateway_url
		.clone()
		.unwrap_or_else(|| config.gateway_url(cli.network.as_str()).to_owned())
}

pub fn resolve_provider(cli: &Cli, config: &Config) -> Result<Provider> {
	let endpoint = resolve_gateway(cli, config);
	Ok(Provider::new(config.provider_config(&endpoint)?))
}

/// Account address from CLI flag or config, if any.
pub fn resolve_account(cli: &Cli, config: &Config) -> Result<Option<Felt>> {
	cli.account
		.as_deref()
		.or(config.account.address.as_deref())
		.map(|a| a.parse::<Felt>().map_err(|e| anyhow!("invalid account address: {e}")))
		.transpose()
}

/// Build the remote signer from CLI flags + config.  `None` when no signer
/// URL is configured; an error when the URL is set but the key is not.
pub fn resolve_wallet(cli: &Cli, config: &Config) -> Result<Option<Arc<dyn Wallet>>> {
	let Some(url) = cli
		.signer_url
		.as_deref()
		.or(config.account.signer_url.as_deref())
	else {
		return Ok(None);
	};

	let public_key: Felt = config
		.account
		.public_key
		.as_deref()
		.ok_or_else(|| {
			anyhow!("No signer public key configured. Run: starknet-ops signer set --url <URL> --public-key <KEY>")
		})?
		.parse()
		.map_err(|e| anyhow!("invalid signer public key: {e}"))?;

	Ok(Some(wallet::from_url(url, public_key)))
}
