use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use starknet_ops::cli::{Cli, Command};
use starknet_ops::commands;
use starknet_ops::commands::run::RunArgs;

fn init_logging(verbose: bool) {
	let default = if verbose { "starknet_ops=debug" } else { "starknet_ops=warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match &cli.command {
		Command::Run {
			command,
			input,
			address,
			wait,
			no_wait,
			rest,
		} => {
			let args = RunArgs {
				command,
				input: input.as_deref(),
				address: address.as_deref(),
				wait: Command::wait_override(*wait, *no_wait),
				rest,
			};
			commands::run::run(&cli, args).await
		}
		Command::List => commands::run::list(),
		Command::Tx { command } => commands::tx::run(&cli, command).await,
		Command::Signer { command } => commands::signer::run(command).await,
	}
}
