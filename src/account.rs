use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::felt::{selector, Felt};
use crate::provider::SubmissionError;
use crate::rpc::{CallRequest, InvokeRequest, NetworkClient, NetworkError, SubmissionResult};
use crate::signer::Wallet;

/// One contract invocation inside a multicall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
	pub contract_address: Felt,
	pub entrypoint: String,
	pub calldata: Vec<Felt>,
}

/// An on-chain account contract bound to a client and to the wallet that
/// signs for it.  Lives for a single `sign_and_send`; nothing here is
/// persisted.
pub struct Account {
	client: Arc<dyn NetworkClient>,
	address: Felt,
	wallet: Arc<dyn Wallet>,
	max_fee: Felt,
}

impl Account {
	pub fn new(client: Arc<dyn NetworkClient>, address: Felt, wallet: Arc<dyn Wallet>) -> Self {
		Self {
			client,
			address,
			wallet,
			max_fee: Felt::zero(),
		}
	}

	pub fn with_max_fee(mut self, max_fee: Felt) -> Self {
		self.max_fee = max_fee;
		self
	}

	/// Current nonce, read from the account contract.
	pub async fn nonce(&self) -> Result<Felt, NetworkError> {
		let request = CallRequest::new(self.address.clone(), "get_nonce", Vec::new());
		let result = self.client.call(&request).await?;
		result
			.into_iter()
			.next()
			.ok_or_else(|| NetworkError::Decode("get_nonce returned no value".into()))
	}

	/// Sign and submit `calls` as one atomic `__execute__` transaction.
	/// The caller guarantees `calls` is non-empty.
	pub async fn execute(&self, calls: &[Call]) -> Result<SubmissionResult, SubmissionError> {
		let nonce = self.nonce().await?;
		let mut request = InvokeRequest {
			contract_address: self.address.clone(),
			entry_point_selector: selector("__execute__"),
			calldata: execute_calldata(calls, &nonce),
			max_fee: self.max_fee.clone(),
			signature: Vec::new(),
		};
		request.signature = self.wallet.sign(&request).await?;

		tracing::debug!(account = %self.address, calls = calls.len(), %nonce, "executing multicall");
		Ok(self.client.submit_multicall(&request).await?)
	}
}

/// Flatten calls into the account's `__execute__` arguments:
/// `call_array_len, (to, selector, data_offset, data_len)*, calldata_len,
/// calldata*, nonce`.
pub fn execute_calldata(calls: &[Call], nonce: &Felt) -> Vec<Felt> {
	let mut call_array = Vec::with_capacity(calls.len() * 4);
	let mut data = Vec::new();

	for call in calls {
		call_array.push(call.contract_address.clone());
		call_array.push(selector(&call.entrypoint));
		call_array.push(Felt::from(data.len()));
		call_array.push(Felt::from(call.calldata.len()));
		data.extend(call.calldata.iter().cloned());
	}

	let mut out = Vec::with_capacity(call_array.len() + data.len() + 3);
	out.push(Felt::from(calls.len()));
	out.extend(call_array);
	out.push(Felt::from(data.len()));
	out.extend(data);
	out.push(nonce.clone());
	out
}
