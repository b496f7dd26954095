use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::account::{Account, Call};
use crate::contracts::CompiledContract;
use crate::felt::Felt;
use crate::rpc::{DeployRequest, GatewayClient, NetworkClient, NetworkError};
use crate::signer::{SignerError, Wallet};
use crate::transaction::TransactionHandle;

/// Deployments are awaited unless the caller opts out: later steps usually
/// need the new address.
pub const DEPLOY_WAITS_BY_DEFAULT: bool = true;

/// Multicall executions are fire-and-forget unless the caller opts in.
pub const INVOKE_WAITS_BY_DEFAULT: bool = false;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
	/// Gateway base URL.
	pub endpoint: String,
	pub poll_interval: Duration,
	pub max_fee: Felt,
}

impl ProviderConfig {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			poll_interval: Duration::from_secs(5),
			max_fee: Felt::zero(),
		}
	}
}

/// Errors raised before a transaction hash exists.  Anything that goes
/// wrong after submission is recorded on the `TransactionHandle` instead.
#[derive(Debug, Error)]
pub enum SubmissionError {
	#[error("a multicall needs at least one call")]
	EmptyMulticall,

	#[error(transparent)]
	Network(#[from] NetworkError),

	#[error(transparent)]
	Signing(#[from] SignerError),
}

/// The only gateway between commands and the network.  Cheap to clone and
/// safe to share across concurrently running commands.
#[derive(Clone)]
pub struct Provider {
	client: Arc<dyn NetworkClient>,
	config: ProviderConfig,
}

impl Provider {
	/// Connect to the gateway at `config.endpoint`.
	pub fn new(config: ProviderConfig) -> Self {
		let client = GatewayClient::new(&config.endpoint, config.poll_interval);
		Self::with_client(Arc::new(client), config)
	}

	pub fn with_client(client: Arc<dyn NetworkClient>, config: ProviderConfig) -> Self {
		Self { client, config }
	}

	pub fn client(&self) -> Arc<dyn NetworkClient> {
		Arc::clone(&self.client)
	}

	pub fn endpoint(&self) -> &str {
		&self.config.endpoint
	}

	/// Deploy `contract`.  Non-empty `constructor_args` are forwarded as-is
	/// as constructor calldata.  With `wait` the handle is settled before
	/// returning.
	pub async fn deploy_contract(
		&self,
		contract: &CompiledContract,
		constructor_args: &[Felt],
		wait: bool,
	) -> Result<TransactionHandle, SubmissionError> {
		let request = DeployRequest {
			contract: contract.clone(),
			constructor_calldata: (!constructor_args.is_empty()).then(|| constructor_args.to_vec()),
			salt: Felt::from(rand::random::<u64>()),
		};

		let raw = self.client.submit_deployment(&request).await?;
		tracing::info!(
			hash = %raw.transaction_hash,
			address = raw.address.as_deref().unwrap_or("unknown"),
			"deployment submitted"
		);

		let mut handle = TransactionHandle::new(self.client(), raw, None);
		if wait {
			handle.wait().await;
		}
		Ok(handle)
	}

	/// Sign `calls` with `wallet` on behalf of `account_address` and submit
	/// them as one atomic transaction.
	pub async fn sign_and_send(
		&self,
		account_address: &Felt,
		wallet: Arc<dyn Wallet>,
		calls: Vec<Call>,
		wait: bool,
	) -> Result<TransactionHandle, SubmissionError> {
		if calls.is_empty() {
			return Err(SubmissionError::EmptyMulticall);
		}

		let account = Account::new(self.client(), account_address.clone(), wallet)
			.with_max_fee(self.config.max_fee.clone());
		let raw = account.execute(&calls).await?;
		tracing::info!(hash = %raw.transaction_hash, account = %account_address, calls = calls.len(), "multicall submitted");

		let target = match calls.as_slice() {
			[single] => Some(single.contract_address.to_string()),
			_ => None,
		};
		let mut handle = TransactionHandle::new(self.client(), raw, target);
		if wait {
			handle.wait().await;
		}
		Ok(handle)
	}

	/// Submit a pre-built transaction body unchanged.
	pub async fn send(&self, transaction: &Value) -> Result<TransactionHandle, SubmissionError> {
		let raw = self.client.submit_raw(transaction).await?;
		tracing::info!(hash = %raw.transaction_hash, "raw transaction submitted");
		Ok(TransactionHandle::new(self.client(), raw, None))
	}
}
