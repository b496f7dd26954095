use anyhow::{anyhow, Result};

use crate::cli::SignerCommand;
use crate::config::Config;
use crate::felt::Felt;

pub async fn run(cmd: &SignerCommand) -> Result<()> {
	match cmd {
		SignerCommand::Set {
			url,
			public_key,
			address,
		} => set_signer(url, public_key, address.as_deref()),
		SignerCommand::Status => show_status(),
	}
}

fn set_signer(url: &str, public_key: &str, address: Option<&str>) -> Result<()> {
	let key: Felt = public_key
		.parse()
		.map_err(|e| anyhow!("invalid public key: {e}"))?;
	let address = address
		.map(|a| a.parse::<Felt>().map_err(|e| anyhow!("invalid account address: {e}")))
		.transpose()?;

	let mut config = Config::load()?;
	config.account.signer_url = Some(url.to_owned());
	config.account.public_key = Some(key.to_string());
	if let Some(address) = address {
		config.account.address = Some(address.to_string());
	}
	config.save()?;

	println!("Signer set to: {url}");
	Ok(())
}

fn show_status() -> Result<()> {
	let config = Config::load()?;

	let url = config.account.signer_url.as_deref().unwrap_or("not set");
	let key = config.account.public_key.as_deref().unwrap_or("not set");
	let address = config.account.address.as_deref().unwrap_or("not set");

	println!("Signer");
	println!("  URL:        {url}");
	println!("  Public key: {key}");
	println!("  Account:    {address}");
	println!("  Network:    {}", config.network.default);
	println!("  Gateway:    {}", config.gateway_url(&config.network.default));
	Ok(())
}
