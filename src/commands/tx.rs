use std::time::Duration;

use anyhow::Result;

use crate::cli::{Cli, TxCommand};
use crate::commands::resolve_provider;
use crate::config::Config;
use crate::transaction::TransactionHandle;

pub async fn run(cli: &Cli, cmd: &TxCommand) -> Result<()> {
	let config = Config::load()?;
	let provider = resolve_provider(cli, &config)?;
	let client = provider.client();

	match cmd {
		TxCommand::Status { tx_hash } => {
			let status = client.get_status(tx_hash).await?;
			println!("Transaction: {tx_hash}");
			println!("Status:      {}", status.tx_status);
			if let Some(bh) = status.block_hash {
				println!("Block:       {bh}");
			}
			if let Some(reason) = status.tx_failure_reason.and_then(|r| r.error_message) {
				println!("Failure:     {reason}");
			}
			Ok(())
		}
		TxCommand::Wait { tx_hash, timeout } => {
			let mut handle = TransactionHandle::from_hash(client, tx_hash);
			println!("Waiting for {tx_hash}...");

			let confirmation = match timeout {
				Some(secs) => handle.wait_timeout(Duration::from_secs(*secs)).await,
				None => Some(handle.wait().await),
			};

			match confirmation {
				Some(_) => {
					println!("Status:      {}", handle.status());
					if let Some(raw) = handle.raw_status() {
						println!("Network:     {raw}");
					}
					if let Some(err) = handle.error_message() {
						println!("Error:       {err}");
					}
				}
				None => println!("Still {} after timeout; outcome unknown.", handle.status()),
			}
			Ok(())
		}
	}
}
