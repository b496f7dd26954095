use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::cli::Cli;
use crate::command::{CommandResult, ExecutionContext, RawInput};
use crate::commands::{resolve_account, resolve_provider, resolve_wallet};
use crate::config::Config;
use crate::felt::Felt;
use crate::registry::CommandRegistry;
use crate::transaction::TxStatus;

pub struct RunArgs<'a> {
	pub command: &'a str,
	pub input: Option<&'a str>,
	pub address: Option<&'a str>,
	pub wait: Option<bool>,
	pub rest: &'a [String],
}

/// Execute a registered command and write its result to the report file.
pub async fn run(cli: &Cli, args: RunArgs<'_>) -> Result<()> {
	let registry = CommandRegistry::builtin()?;
	let command = registry.get(args.command).ok_or_else(|| {
		anyhow!("Unknown command '{}'. Run: starknet-ops list", args.command)
	})?;

	let config = Config::load()?;
	let provider = resolve_provider(cli, &config)?;
	println!("Gateway: {}", provider.endpoint());

	let mut ctx = ExecutionContext::new(provider);
	ctx.account = resolve_account(cli, &config)?;
	ctx.wallet = resolve_wallet(cli, &config)?;
	ctx.contract_address = args
		.address
		.map(|a| a.parse::<Felt>().map_err(|e| anyhow!("invalid --address: {e}")))
		.transpose()?;
	ctx.wait = args.wait;

	let mut raw = RawInput::parse(args.rest);
	if let Some(json) = args.input {
		raw = raw.with_input(serde_json::from_str(json).context("--input is not valid JSON")?);
	}

	let result = command.run(&ctx, raw).await?;
	print_result(&result);

	let path = write_report(&result, Path::new("."), &config.report_name())?;
	println!("Report:  {}", path.display());
	Ok(())
}

/// Print every registered command, grouped by category.
pub fn list() -> Result<()> {
	let registry = CommandRegistry::builtin()?;
	for (category, commands) in registry.by_category() {
		println!("{category}");
		for command in commands {
			println!("  {}", command.id());
			for example in command.ux().examples {
				println!("      e.g. {example}");
			}
		}
	}
	Ok(())
}

fn print_result(result: &CommandResult) {
	for response in &result.responses {
		println!("TX:      {}", response.hash);
		if let Some(address) = &response.address {
			println!("Address: {address}");
		}
		println!("Status:  {}", response.status);
		if response.status == TxStatus::Pending {
			println!("         (not awaited; check with: starknet-ops tx wait {})", response.hash);
		}
		if let Some(err) = &response.error_message {
			println!("Error:   {err}");
		}
	}
}

/// Write `<dir>/<name>.json`.
pub fn write_report(result: &CommandResult, dir: &Path, name: &str) -> Result<PathBuf> {
	let path = dir.join(format!("{name}.json"));
	std::fs::write(&path, serde_json::to_string_pretty(result)?)
		.with_context(|| format!("failed to write report {}", path.display()))?;
	Ok(path)
}
