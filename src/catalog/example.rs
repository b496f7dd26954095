use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::CATEGORY_EXAMPLE;
use crate::command::{Command, CommandConfig, ExecuteCommand, RawInput, Target, Ux, Validation};
use crate::contracts::ArtifactLoader;
use crate::felt::Felt;

/// Compiled artifact name of the example balance contract.
pub const BALANCE_ARTIFACT: &str = "balance";

pub fn commands() -> Vec<Box<dyn Command>> {
	vec![Box::new(deploy()), Box::new(increase_balance())]
}

// -- example:deploy --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployInput {}

pub fn deploy() -> ExecuteCommand<DeployInput, Vec<Felt>> {
	ExecuteCommand::new(
		"example:deploy",
		CommandConfig {
			ux: Ux {
				category: CATEGORY_EXAMPLE,
				function: Target::Constructor,
				examples: &["starknet-ops --network=devnet run example:deploy"],
			},
			make_user_input: |_raw| Ok(DeployInput {}),
			make_contract_input: |_input| Ok(Vec::new()),
			validations: Vec::new(),
			load_contract: Arc::new(ArtifactLoader::named(BALANCE_ARTIFACT)),
		},
	)
}

// -- example:increase_balance --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncreaseBalanceInput {
	pub balance: u128,
}

pub type IncreaseBalanceArgs = [Felt; 1];

fn increase_balance_input(raw: &RawInput) -> Result<IncreaseBalanceInput> {
	let balance = raw
		.require("balance")?
		.parse()
		.map_err(|e| anyhow!("invalid --balance: {e}"))?;
	Ok(IncreaseBalanceInput { balance })
}

fn increase_balance_args(input: &IncreaseBalanceInput) -> Result<IncreaseBalanceArgs> {
	Ok([Felt::from(input.balance)])
}

pub fn increase_balance() -> ExecuteCommand<IncreaseBalanceInput, IncreaseBalanceArgs> {
	ExecuteCommand::new(
		"example:increase_balance",
		CommandConfig {
			ux: Ux {
				category: CATEGORY_EXAMPLE,
				function: Target::Function("increase_balance"),
				examples: &[
					"starknet-ops run example:increase_balance --address=<CONTRACT> -- --balance=100",
				],
			},
			make_user_input: increase_balance_input,
			make_contract_input: increase_balance_args,
			validations: vec![Validation {
				name: "balance_is_positive",
				check: |input: &IncreaseBalanceInput| input.balance > 0,
			}],
			load_contract: Arc::new(ArtifactLoader::named(BALANCE_ARTIFACT)),
		},
	)
}
