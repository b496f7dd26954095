//! Normalized result of a submission and its confirmation state machine.
//!
//! A handle starts `Pending` and moves to `Accepted` or `Rejected` exactly
//! once, the first time `wait()` completes.  Later calls return the cached
//! confirmation without touching the network.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rpc::{NetworkClient, SubmissionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
	Pending,
	Accepted,
	Rejected,
}

impl fmt::Display for TxStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Pending => "PENDING",
			Self::Accepted => "ACCEPTED",
			Self::Rejected => "REJECTED",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
	pub success: bool,
}

/// Serializable snapshot of a handle, as written to reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReport {
	pub hash: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	pub status: TxStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw_status: Option<String>,
}

pub struct TransactionHandle {
	client: Arc<dyn NetworkClient>,
	hash: String,
	address: Option<String>,
	status: TxStatus,
	error_message: Option<String>,
	raw: SubmissionResult,
	raw_status: Option<String>,
	confirmation: Option<Confirmation>,
}

impl TransactionHandle {
	/// Wrap a submission.  An explicit `address` wins over the one the
	/// network returned.
	pub fn new(client: Arc<dyn NetworkClient>, raw: SubmissionResult, address: Option<String>) -> Self {
		Self {
			client,
			hash: raw.transaction_hash.clone(),
			address: address.or_else(|| raw.address.clone()),
			status: TxStatus::Pending,
			error_message: None,
			raw,
			raw_status: None,
			confirmation: None,
		}
	}

	/// Re-attach to a transaction submitted earlier, knowing only its hash.
	pub fn from_hash(client: Arc<dyn NetworkClient>, hash: &str) -> Self {
		let raw = SubmissionResult {
			code: None,
			transaction_hash: hash.to_owned(),
			address: None,
		};
		Self::new(client, raw, None)
	}

	pub fn hash(&self) -> &str {
		&self.hash
	}

	pub fn address(&self) -> Option<&str> {
		self.address.as_deref()
	}

	pub fn status(&self) -> TxStatus {
		self.status
	}

	pub fn error_message(&self) -> Option<&str> {
		self.error_message.as_deref()
	}

	/// The unmodified submission response.
	pub fn raw(&self) -> &SubmissionResult {
		&self.raw
	}

	/// Network status code fetched during `wait()`, if it could be read.
	pub fn raw_status(&self) -> Option<&str> {
		self.raw_status.as_deref()
	}

	/// Block until the network reports finality, then settle the status.
	///
	/// A poll that completes is taken as acceptance; a poll that fails marks
	/// the handle `Rejected` with the failure message.  The raw status code
	/// is read afterwards either way and kept for diagnostics only.
	pub async fn wait(&mut self) -> Confirmation {
		if let Some(confirmation) = self.confirmation {
			return confirmation;
		}

		let outcome = self
			.client
			.poll_finality(&self.hash)
			.await
			.map_err(|e| e.to_string());

		let raw_status = match self.client.get_status(&self.hash).await {
			Ok(status) => Some(status.tx_status),
			Err(e) => {
				tracing::warn!(hash = %self.hash, error = %e, "could not fetch raw transaction status");
				None
			}
		};

		self.resolve(outcome, raw_status)
	}

	/// `wait()` bounded by `limit`.  On expiry returns `None` and the handle
	/// stays `Pending`.
	pub async fn wait_timeout(&mut self, limit: Duration) -> Option<Confirmation> {
		tokio::time::timeout(limit, self.wait()).await.ok()
	}

	/// The single state transition.  A second call is a no-op that returns
	/// the first outcome.
	fn resolve(&mut self, outcome: Result<(), String>, raw_status: Option<String>) -> Confirmation {
		if let Some(confirmation) = self.confirmation {
			return confirmation;
		}

		let success = match outcome {
			Ok(()) => {
				self.status = TxStatus::Accepted;
				true
			}
			Err(message) => {
				self.status = TxStatus::Rejected;
				self.error_message = Some(message);
				false
			}
		};
		self.raw_status = raw_status;

		tracing::info!(
			hash = %self.hash,
			status = %self.status,
			raw_status = self.raw_status.as_deref().unwrap_or("unknown"),
			"transaction settled"
		);

		let confirmation = Confirmation { success };
		self.confirmation = Some(confirmation);
		confirmation
	}

	pub fn report(&self) -> TransactionReport {
		TransactionReport {
			hash: self.hash.clone(),
			address: self.address.clone(),
			status: self.status,
			error_message: self.error_message.clone(),
			raw_status: self.raw_status.clone(),
		}
	}
}

impl fmt::Debug for TransactionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TransactionHandle")
			.field("hash", &self.hash)
			.field("address", &self.address)
			.field("status", &self.status)
			.field("error_message", &self.error_message)
			.field("raw_status", &self.raw_status)
			.finish_non_exhaustive()
	}
}
