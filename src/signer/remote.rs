use serde::{Deserialize, Serialize};

use super::SignerError;
use crate::felt::Felt;
use crate::rpc::InvokeRequest;

/// Signs by POSTing the unsigned transaction to an external signer service
/// (a keystore daemon or hardware-wallet bridge) that holds the key.
///
/// Request:  `POST <url>/sign  {"public_key": "0x..", "transaction": {..}}`
/// Response: `{"signature": ["0x..", "0x.."]}` or `{"error": ".."}`
pub struct RemoteSigner {
	url: String,
	public_key: Felt,
	http: reqwest::Client,
}

#[derive(Serialize)]
struct SignRequest<'a> {
	public_key: &'a Felt,
	transaction: &'a InvokeRequest,
}

#[derive(Deserialize)]
struct SignResponse {
	#[serde(default)]
	signature: Vec<Felt>,
	#[serde(default)]
	error: Option<String>,
}

impl RemoteSigner {
	pub fn new(url: &str, public_key: Felt) -> Self {
		Self {
			url: url.trim_end_matches('/').to_owned(),
			public_key,
			http: reqwest::Client::new(),
		}
	}
}

#[async_trait::async_trait]
impl super::Wallet for RemoteSigner {
	fn public_key(&self) -> &Felt {
		&self.public_key
	}

	async fn sign(&self, request: &InvokeRequest) -> Result<Vec<Felt>, SignerError> {
		let body = SignRequest {
			public_key: &self.public_key,
			transaction: request,
		};
		tracing::debug!(signer = %self.url, account = %request.contract_address, "requesting signature");

		let resp: SignResponse = self
			.http
			.post(format!("{}/sign", self.url))
			.json(&body)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;

		if let Some(reason) = resp.error {
			return Err(SignerError::Refused(reason));
		}
		if resp.signature.is_empty() {
			return Err(SignerError::EmptySignature);
		}
		Ok(resp.signature)
	}
}
