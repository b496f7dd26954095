//! Generic execution pipeline shared by every on-chain command.
//!
//! ```text
//! flags/args or prebuilt input
//!     → make_user_input → validations → make_contract_input
//!     → load_contract → Provider (deploy_contract | sign_and_send)
//!     → TransactionHandle
//! ```
//!
//! Nothing is retried.  Any failure before submission aborts the command
//! with a `CommandError`; validation runs before the network is touched.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::contracts::{ContractError, ContractLoader};
use crate::felt::Felt;
use crate::provider::{Provider, SubmissionError, DEPLOY_WAITS_BY_DEFAULT, INVOKE_WAITS_BY_DEFAULT};
use crate::signer::Wallet;
use crate::transaction::{TransactionHandle, TransactionReport};

// -- Command description --

/// What a command targets on its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
	/// Deploy a new instance; the contract input is the constructor calldata.
	Constructor,
	/// Invoke a state-mutating function through the operator's account.
	Function(&'static str),
}

#[derive(Debug, Clone)]
pub struct Ux {
	pub category: &'static str,
	pub function: Target,
	pub examples: &'static [&'static str],
}

/// A named predicate over the user input.
pub struct Validation<U> {
	pub name: &'static str,
	pub check: fn(&U) -> bool,
}

pub struct CommandConfig<U, C> {
	pub ux: Ux,
	pub make_user_input: fn(&RawInput) -> anyhow::Result<U>,
	/// Must be pure: no network, no filesystem.
	pub make_contract_input: fn(&U) -> anyhow::Result<C>,
	pub validations: Vec<Validation<U>>,
	pub load_contract: Arc<dyn ContractLoader>,
}

// -- Inputs --

/// Unparsed command-line material: `--key=value` flags, positional args,
/// and an optional prebuilt input object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
	pub flags: BTreeMap<String, String>,
	pub args: Vec<String>,
	pub input: Option<Value>,
}

impl RawInput {
	/// Split tokens into flags and positionals.  A bare `--switch` is
	/// recorded as `"true"`.
	pub fn parse<I, S>(tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut raw = Self::default();
		for token in tokens {
			let token = token.as_ref();
			match token.strip_prefix("--") {
				Some(flag) if !flag.is_empty() => {
					let (key, value) = flag.split_once('=').unwrap_or((flag, "true"));
					raw.flags.insert(key.to_owned(), value.to_owned());
				}
				_ => raw.args.push(token.to_owned()),
			}
		}
		raw
	}

	pub fn with_input(mut self, input: Value) -> Self {
		self.input = Some(input);
		self
	}

	pub fn flag(&self, name: &str) -> Option<&str> {
		self.flags.get(name).map(String::as_str)
	}

	pub fn require(&self, name: &str) -> anyhow::Result<&str> {
		self.flag(name)
			.ok_or_else(|| anyhow::anyhow!("missing required flag --{name}"))
	}
}

/// Where the user input comes from.
pub enum InputSource<U> {
	/// A complete input object, used as-is (tests, other commands).
	Prebuilt(U),
	/// Assemble the input from flags and arguments.
	Raw(RawInput),
}

/// Everything a command needs from its caller besides the input.
#[derive(Clone)]
pub struct ExecutionContext {
	pub provider: Provider,
	pub account: Option<Felt>,
	pub wallet: Option<Arc<dyn Wallet>>,
	/// Address of the already-deployed contract to invoke.
	pub contract_address: Option<Felt>,
	/// `None` keeps the provider default for the target kind.
	pub wait: Option<bool>,
}

impl ExecutionContext {
	pub fn new(provider: Provider) -> Self {
		Self {
			provider,
			account: None,
			wallet: None,
			contract_address: None,
			wait: None,
		}
	}
}

// -- Results and errors --

#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
	pub command: String,
	pub responses: Vec<TransactionReport>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	pub executed_at: DateTime<Utc>,
}

impl CommandResult {
	pub fn from_handle(command: &str, handle: &TransactionHandle) -> Self {
		Self {
			command: command.to_owned(),
			responses: vec![handle.report()],
			data: handle.address().map(|a| json!({ "contract": a })),
			executed_at: Utc::now(),
		}
	}
}

#[derive(Debug, Error)]
pub enum CommandError {
	#[error("{command}: validation '{validation}' failed")]
	Validation {
		command: &'static str,
		validation: &'static str,
	},

	#[error(transparent)]
	Transform(anyhow::Error),

	#[error(transparent)]
	ContractLoad(#[from] ContractError),

	#[error("no account address configured (use --account)")]
	MissingAccount,

	#[error("no signer configured (run: starknet-ops signer set --url <URL> --public-key <KEY>)")]
	MissingWallet,

	#[error(transparent)]
	Submission(#[from] SubmissionError),
}

// -- Pipeline --

pub struct ExecuteCommand<U, C> {
	id: &'static str,
	config: CommandConfig<U, C>,
}

impl<U, C> ExecuteCommand<U, C>
where
	U: Send + Sync + 'static,
	C: Into<Vec<Felt>> + Send + 'static,
{
	pub fn new(id: &'static str, config: CommandConfig<U, C>) -> Self {
		Self { id, config }
	}

	pub fn id(&self) -> &'static str {
		self.id
	}

	pub fn user_input(&self, source: InputSource<U>) -> Result<U, CommandError> {
		match source {
			InputSource::Prebuilt(input) => Ok(input),
			InputSource::Raw(raw) => (self.config.make_user_input)(&raw).map_err(CommandError::Transform),
		}
	}

	/// Run every validation in order; the first failure wins.
	pub fn validate(&self, input: &U) -> Result<(), CommandError> {
		match self.config.validations.iter().find(|v| !(v.check)(input)) {
			Some(failed) => Err(CommandError::Validation {
				command: self.id,
				validation: failed.name,
			}),
			None => Ok(()),
		}
	}

	pub fn contract_input(&self, input: &U) -> Result<Vec<Felt>, CommandError> {
		(self.config.make_contract_input)(input)
			.map(Into::into)
			.map_err(CommandError::Transform)
	}

	pub async fn execute(
		&self,
		ctx: &ExecutionContext,
		source: InputSource<U>,
	) -> Result<TransactionHandle, CommandError> {
		let input = self.user_input(source)?;
		self.validate(&input)?;
		let calldata = self.contract_input(&input)?;
		drop(input);

		let loaded = self
			.config
			.load_contract
			.load(ctx.contract_address.as_ref())
			.await?;

		tracing::info!(command = self.id, target = ?self.config.ux.function, args = calldata.len(), "submitting");

		let handle = match self.config.ux.function {
			Target::Constructor => {
				let wait = ctx.wait.unwrap_or(DEPLOY_WAITS_BY_DEFAULT);
				ctx.provider
					.deploy_contract(&loaded.contract, &calldata, wait)
					.await?
			}
			Target::Function(function) => {
				let account = ctx.account.as_ref().ok_or(CommandError::MissingAccount)?;
				let wallet = ctx.wallet.clone().ok_or(CommandError::MissingWallet)?;
				let call = loaded.call(function, calldata)?;
				let wait = ctx.wait.unwrap_or(INVOKE_WAITS_BY_DEFAULT);
				ctx.provider
					.sign_and_send(account, wallet, vec![call], wait)
					.await?
			}
		};

		Ok(handle)
	}
}

/// Type-erased view of a command, as stored in the registry.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
	fn id(&self) -> &'static str;

	fn ux(&self) -> &Ux;

	/// Execute from raw input.  A prebuilt `raw.input` object takes
	/// precedence over flags and arguments.
	async fn run(&self, ctx: &ExecutionContext, raw: RawInput) -> Result<CommandResult, CommandError>;
}

#[async_trait::async_trait]
impl<U, C> Command for ExecuteCommand<U, C>
where
	U: DeserializeOwned + Send + Sync + 'static,
	C: Into<Vec<Felt>> + Send + 'static,
{
	fn id(&self) -> &'static str {
		self.id
	}

	fn ux(&self) -> &Ux {
		&self.config.ux
	}

	async fn run(&self, ctx: &ExecutionContext, mut raw: RawInput) -> Result<CommandResult, CommandError> {
		let source = match raw.input.take() {
			Some(prebuilt) => InputSource::Prebuilt(
				serde_json::from_value(prebuilt).map_err(|e| CommandError::Transform(e.into()))?,
			),
			None => InputSource::Raw(raw),
		};
		let handle = self.execute(ctx, source).await?;
		Ok(CommandResult::from_handle(self.id, &handle))
	}
}
