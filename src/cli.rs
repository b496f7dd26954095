use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
	name = "starknet-ops",
	about = "Deploy and invoke StarkNet contracts and track their confirmation.",
	version
)]
pub struct Cli {
	/// Network to connect to.
	#[arg(long, default_value = "testnet", global = true)]
	pub network: Network,

	/// Override the gateway base URL.
	#[arg(long, global = true)]
	pub gateway_url: Option<String>,

	/// Override the account contract address.
	#[arg(long, global = true)]
	pub account: Option<String>,

	/// Override the remote signer URL.
	#[arg(long, global = true)]
	pub signer_url: Option<String>,

	/// Log at debug level (RUST_LOG takes precedence).
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Clone, ValueEnum)]
pub enum Network {
	Testnet,
	Mainnet,
	Devnet,
}

impl Network {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Testnet => "testnet",
			Self::Mainnet => "mainnet",
			Self::Devnet => "devnet",
		}
	}
}

#[derive(Subcommand)]
pub enum Command {
	/// Run a registered on-chain command.
	Run {
		/// Command id, e.g. example:increase_balance.
		command: String,

		/// Prebuilt input as JSON; replaces the command's flags.
		#[arg(long)]
		input: Option<String>,

		/// Address of the deployed contract to invoke.
		#[arg(long)]
		address: Option<String>,

		/// Wait for confirmation before returning.
		#[arg(long, conflicts_with = "no_wait")]
		wait: bool,

		/// Return as soon as the transaction is submitted.
		#[arg(long)]
		no_wait: bool,

		/// Command flags (--key=value) and arguments.
		#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
		rest: Vec<String>,
	},

	/// List registered commands.
	List,

	/// Inspect submitted transactions.
	Tx {
		#[command(subcommand)]
		command: TxCommand,
	},

	/// Manage the remote signer configuration.
	Signer {
		#[command(subcommand)]
		command: SignerCommand,
	},
}

impl Command {
	/// `Some` only when the user forced the behaviour either way.
	pub fn wait_override(wait: bool, no_wait: bool) -> Option<bool> {
		match (wait, no_wait) {
			(true, _) => Some(true),
			(_, true) => Some(false),
			_ => None,
		}
	}
}

// -- Tx subcommands --

#[derive(Subcommand)]
pub enum TxCommand {
	/// Show the raw network status of a transaction.
	Status {
		/// Transaction hash (0x-prefixed).
		tx_hash: String,
	},

	/// Wait for a transaction to reach finality.
	Wait {
		/// Transaction hash (0x-prefixed).
		tx_hash: String,

		/// Give up after this many seconds, leaving the outcome unresolved.
		#[arg(long)]
		timeout: Option<u64>,
	},
}

// -- Signer subcommands --

#[derive(Subcommand)]
pub enum SignerCommand {
	/// Store the remote signer endpoint and account.
	Set {
		/// Signer service base URL.
		#[arg(long)]
		url: String,

		/// Public key the signer signs with.
		#[arg(long)]
		public_key: String,

		/// Account contract address to sign for.
		#[arg(long)]
		address: Option<String>,
	},

	/// Show current signer configuration.
	Status,
}
