pub mod remote;

use std::sync::Arc;

use thiserror::Error;

use crate::felt::Felt;
use crate::rpc::InvokeRequest;

/// A wallet that produces StarkNet signatures without exposing key material
/// to this process.  The core only ever hands it an unsigned transaction
/// and gets back the signature felts.
#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
	/// Public key of the account's signing key.
	fn public_key(&self) -> &Felt;

	/// Sign an invoke transaction and return its signature (`[r, s]` for
	/// the standard account).
	async fn sign(&self, request: &InvokeRequest) -> Result<Vec<Felt>, SignerError>;
}

#[derive(Debug, Error)]
pub enum SignerError {
	#[error("signer unreachable: {0}")]
	Unavailable(#[from] reqwest::Error),

	#[error("signer refused the transaction: {0}")]
	Refused(String),

	#[error("signer returned an empty signature")]
	EmptySignature,
}

/// Build the wallet configured on the CLI or in config.
pub fn from_url(url: &str, public_key: Felt) -> Arc<dyn Wallet> {
	Arc::new(remote::RemoteSigner::new(url, public_key))
}
