use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::account::Call;
use crate::felt::Felt;

/// Env var that overrides where compiled artifacts are looked up.
pub const ARTIFACTS_ENV: &str = "STARKNET_OPS_ARTIFACTS";

/// Default artifact directory, relative to the working directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "contracts/artifacts";

/// Compiled contract artifact as produced by `starknet-compile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledContract {
	pub abi: Vec<Value>,
	pub entry_points_by_type: Value,
	pub program: Value,
}

impl CompiledContract {
	/// Whether the ABI declares an external function or view of this name.
	pub fn has_function(&self, name: &str) -> bool {
		self.abi.iter().any(|entry| {
			entry.get("type").and_then(Value::as_str) == Some("function")
				&& entry.get("name").and_then(Value::as_str) == Some(name)
		})
	}

	/// Names of every function in the ABI, in declaration order.
	pub fn functions(&self) -> Vec<&str> {
		self.abi
			.iter()
			.filter(|e| e.get("type").and_then(Value::as_str) == Some("function"))
			.filter_map(|e| e.get("name").and_then(Value::as_str))
			.collect()
	}
}

/// A contract resolved for one command execution: its callable interface
/// plus the deployed address, when there is one.
#[derive(Debug, Clone)]
pub struct LoadedContract {
	pub address: Option<Felt>,
	pub contract: CompiledContract,
}

impl LoadedContract {
	/// Build a call to `function` on the deployed instance.
	pub fn call(&self, function: &str, calldata: Vec<Felt>) -> Result<Call, ContractError> {
		let address = self.address.clone().ok_or(ContractError::MissingAddress)?;
		if !self.contract.has_function(function) {
			return Err(ContractError::UnknownFunction {
				function: function.to_owned(),
				available: self.contract.functions().join(", "),
			});
		}
		Ok(Call {
			contract_address: address,
			entrypoint: function.to_owned(),
			calldata,
		})
	}
}

#[derive(Debug, Error)]
pub enum ContractError {
	#[error("could not read contract artifact {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed contract artifact {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("no contract address given (use --address)")]
	MissingAddress,

	#[error("contract has no function named '{function}' (available: {available})")]
	UnknownFunction { function: String, available: String },
}

/// Resolves the contract a command targets.  Invoked once per execution.
#[async_trait::async_trait]
pub trait ContractLoader: Send + Sync {
	async fn load(&self, address: Option<&Felt>) -> Result<LoadedContract, ContractError>;
}

/// Loads `<artifacts>/<name>.json` from disk.
pub struct ArtifactLoader {
	name: &'static str,
	dir: Option<PathBuf>,
}

impl ArtifactLoader {
	/// Look the artifact up in the directory named by `STARKNET_OPS_ARTIFACTS`,
	/// or `contracts/artifacts` when unset.
	pub fn named(name: &'static str) -> Self {
		Self { name, dir: None }
	}

	pub fn in_dir(name: &'static str, dir: impl Into<PathBuf>) -> Self {
		Self {
			name,
			dir: Some(dir.into()),
		}
	}

	pub fn path(&self) -> PathBuf {
		let dir = self.dir.clone().unwrap_or_else(artifacts_dir);
		dir.join(format!("{}.json", self.name))
	}
}

#[async_trait::async_trait]
impl ContractLoader for ArtifactLoader {
	async fn load(&self, address: Option<&Felt>) -> Result<LoadedContract, ContractError> {
		let path = self.path();
		let contract = read_artifact(&path).await?;
		tracing::debug!(artifact = %path.display(), "loaded contract artifact");
		Ok(LoadedContract {
			address: address.cloned(),
			contract,
		})
	}
}

pub fn artifacts_dir() -> PathBuf {
	std::env::var_os(ARTIFACTS_ENV)
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR))
}

async fn read_artifact(path: &Path) -> Result<CompiledContract, ContractError> {
	let content = tokio::fs::read_to_string(path)
		.await
		.map_err(|source| ContractError::Io {
			path: path.to_owned(),
			source,
		})?;
	serde_json::from_str(&content).map_err(|source| ContractError::Parse {
		path: path.to_owned(),
		source,
	})
}
