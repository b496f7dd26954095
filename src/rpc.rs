use std::io::Write;
use std::time::Duration;

use base64::Engine;
use flate2::{write::GzEncoder, Compression};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::contracts::CompiledContract;
use crate::felt::{selector, Felt};

/// Unmodified gateway reply to an `add_transaction` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	pub transaction_hash: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

/// A contract deployment, before compression of the program.
#[derive(Debug, Clone)]
pub struct DeployRequest {
	pub contract: CompiledContract,
	/// `None` when the constructor takes no arguments.
	pub constructor_calldata: Option<Vec<Felt>>,
	pub salt: Felt,
}

/// An `INVOKE_FUNCTION` transaction.  `signature` is empty until the
/// account's wallet has signed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
	pub contract_address: Felt,
	pub entry_point_selector: Felt,
	pub calldata: Vec<Felt>,
	pub max_fee: Felt,
	pub signature: Vec<Felt>,
}

/// A read-only call against the latest state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRequest {
	pub contract_address: Felt,
	pub entry_point_selector: Felt,
	pub calldata: Vec<Felt>,
	pub signature: Vec<Felt>,
}

impl CallRequest {
	pub fn new(contract_address: Felt, entrypoint: &str, calldata: Vec<Felt>) -> Self {
		Self {
			contract_address,
			entry_point_selector: selector(entrypoint),
			calldata,
			signature: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionStatus {
	pub tx_status: String,
	#[serde(default)]
	pub block_hash: Option<String>,
	#[serde(default)]
	pub tx_failure_reason: Option<FailureReason>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailureReason {
	#[serde(default)]
	pub code: Option<String>,
	#[serde(default)]
	pub error_message: Option<String>,
}

impl TransactionStatus {
	/// Whether the network will report nothing further for this hash.
	pub fn finality(&self) -> Finality {
		match self.tx_status.as_str() {
			"ACCEPTED_ON_L2" | "ACCEPTED_ON_L1" | "PENDING" => Finality::Accepted,
			"REJECTED" | "NOT_RECEIVED" => Finality::Rejected,
			_ => Finality::InFlight,
		}
	}

	pub fn failure_message(&self) -> String {
		self.tx_failure_reason
			.as_ref()
			.and_then(|r| r.error_message.clone())
			.unwrap_or_else(|| format!("transaction {}", self.tx_status))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
	Accepted,
	Rejected,
	InFlight,
}

#[derive(Debug, Error)]
pub enum NetworkError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("{code}: {message}")]
	Gateway { code: String, message: String },

	#[error("{0}")]
	Rejected(String),

	#[error("{0}")]
	Timeout(String),

	#[error("unexpected gateway response: {0}")]
	Decode(String),
}

/// Everything the core needs from the chain.  Each method is one
/// independent round-trip, so a single client can be shared by any
/// number of in-flight commands.
#[async_trait::async_trait]
pub trait NetworkClient: Send + Sync {
	async fn submit_deployment(&self, request: &DeployRequest) -> Result<SubmissionResult, NetworkError>;

	/// Submit an already-signed account `__execute__` invocation.
	async fn submit_multicall(&self, request: &InvokeRequest) -> Result<SubmissionResult, NetworkError>;

	/// Submit a pre-built transaction body as-is.
	async fn submit_raw(&self, transaction: &Value) -> Result<SubmissionResult, NetworkError>;

	/// Resolve once the transaction reaches finality; fail if it is rejected.
	async fn poll_finality(&self, hash: &str) -> Result<(), NetworkError>;

	async fn get_status(&self, hash: &str) -> Result<TransactionStatus, NetworkError>;

	async fn call(&self, request: &CallRequest) -> Result<Vec<Felt>, NetworkError>;
}

/// Client for the sequencer's `gateway` / `feeder_gateway` HTTP API.
pub struct GatewayClient {
	base: String,
	http: reqwest::Client,
	poll_interval: Duration,
}

impl GatewayClient {
	pub fn new(base_url: &str, poll_interval: Duration) -> Self {
		Self {
			base: base_url.trim_end_matches('/').to_owned(),
			http: reqwest::Client::new(),
			poll_interval,
		}
	}

	async fn add_transaction(&self, body: &Value) -> Result<SubmissionResult, NetworkError> {
		let url = format!("{}/gateway/add_transaction", self.base);
		tracing::debug!(%url, kind = ?body.get("type"), "submitting transaction");
		let resp = self.http.post(&url).json(body).send().await?;
		read_json(resp).await
	}
}

#[async_trait::async_trait]
impl NetworkClient for GatewayClient {
	async fn submit_deployment(&self, request: &DeployRequest) -> Result<SubmissionResult, NetworkError> {
		let body = deploy_body(request)?;
		self.add_transaction(&body).await
	}

	async fn submit_multicall(&self, request: &InvokeRequest) -> Result<SubmissionResult, NetworkError> {
		let mut body = serde_json::to_value(request).map_err(|e| NetworkError::Decode(e.to_string()))?;
		body["type"] = json!("INVOKE_FUNCTION");
		self.add_transaction(&body).await
	}

	async fn submit_raw(&self, transaction: &Value) -> Result<SubmissionResult, NetworkError> {
		self.add_transaction(transaction).await
	}

	async fn poll_finality(&self, hash: &str) -> Result<(), NetworkError> {
		loop {
			let status = self.get_status(hash).await?;
			match status.finality() {
				Finality::Accepted => return Ok(()),
				Finality::Rejected => return Err(NetworkError::Rejected(status.failure_message())),
				Finality::InFlight => {
					tracing::debug!(hash, status = %status.tx_status, "transaction not final yet");
				}
			}
			tokio::time::sleep(self.poll_interval).await;
		}
	}

	async fn get_status(&self, hash: &str) -> Result<TransactionStatus, NetworkError> {
		let url = format!("{}/feeder_gateway/get_transaction_status", self.base);
		let resp = self
			.http
			.get(&url)
			.query(&[("transactionHash", hash)])
			.send()
			.await?;
		read_json(resp).await
	}

	async fn call(&self, request: &CallRequest) -> Result<Vec<Felt>, NetworkError> {
		#[derive(Deserialize)]
		struct CallResult {
			result: Vec<Felt>,
		}

		let url = format!("{}/feeder_gateway/call_contract", self.base);
		let resp = self.http.post(&url).json(request).send().await?;
		let parsed: CallResult = read_json(resp).await?;
		Ok(parsed.result)
	}
}

// -- Private helpers --

/// Decode a success body, or turn the gateway's `{code, message}` error
/// payload into a `NetworkError::Gateway`.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, NetworkError> {
	let status = resp.status();
	let text = resp.text().await?;

	if !status.is_success() {
		#[derive(Deserialize)]
		struct GatewayErrorBody {
			code: String,
			message: String,
		}

		return Err(match serde_json::from_str::<GatewayErrorBody>(&text) {
			Ok(err) => NetworkError::Gateway {
				code: err.code,
				message: err.message,
			},
			Err(_) => NetworkError::Gateway {
				code: status.as_u16().to_string(),
				message: text,
			},
		});
	}

	serde_json::from_str(&text).map_err(|e| NetworkError::Decode(format!("{e}: {text}")))
}

fn deploy_body(request: &DeployRequest) -> Result<Value, NetworkError> {
	let program = compress_program(&request.contract.program)?;
	Ok(json!({
		"type": "DEPLOY",
		"contract_address_salt": request.salt,
		"constructor_calldata": request.constructor_calldata.clone().unwrap_or_default(),
		"contract_definition": {
			"abi": request.contract.abi,
			"entry_points_by_type": request.contract.entry_points_by_type,
			"program": program,
		},
	}))
}

/// The gateway expects the program as base64 of its gzipped JSON.
pub fn compress_program(program: &Value) -> Result<String, NetworkError> {
	let raw = serde_json::to_vec(program).map_err(|e| NetworkError::Decode(e.to_string()))?;
	let compress_err = |e: std::io::Error| NetworkError::Decode(format!("failed to compress program: {e}"));

	let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(&raw).map_err(compress_err)?;
	let gz = encoder.finish().map_err(compress_err)?;
	Ok(base64::engine::general_purpose::STANDARD.encode(gz))
}
