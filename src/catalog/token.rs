use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::CATEGORY_TOKEN;
use crate::command::{Command, CommandConfig, ExecuteCommand, RawInput, Target, Ux, Validation};
use crate::contracts::ArtifactLoader;
use crate::felt::{Felt, Uint256};

pub const TOKEN_ARTIFACT: &str = "token";

pub fn commands() -> Vec<Box<dyn Command>> {
	vec![Box::new(deploy()), Box::new(transfer())]
}

fn felt_flag(raw: &RawInput, name: &str) -> Result<Felt> {
	raw.require(name)?
		.parse()
		.with_context(|| format!("invalid --{name}"))
}

/// Decimal or `0x` hex, up to 2^256 - 1.
fn amount_flag(raw: &RawInput, name: &str) -> Result<Uint256> {
	raw.require(name)?
		.parse()
		.map_err(|e| anyhow!("invalid --{name}: {e}"))
}

// -- token:deploy --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployTokenInput {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	pub initial_supply: Uint256,
	pub recipient: Felt,
	pub owner: Felt,
}

fn deploy_input(raw: &RawInput) -> Result<DeployTokenInput> {
	let recipient = felt_flag(raw, "recipient")?;
	Ok(DeployTokenInput {
		name: raw.require("name")?.to_owned(),
		symbol: raw.require("symbol")?.to_owned(),
		decimals: match raw.flag("decimals") {
			Some(d) => d.parse().map_err(|e| anyhow!("invalid --decimals: {e}"))?,
			None => 18,
		},
		initial_supply: amount_flag(raw, "supply")?,
		owner: match raw.flag("owner") {
			Some(_) => felt_flag(raw, "owner")?,
			None => recipient.clone(),
		},
		recipient,
	})
}

/// `constructor(name, symbol, decimals, initial_supply: Uint256, recipient, owner)`
fn deploy_args(input: &DeployTokenInput) -> Result<Vec<Felt>> {
	let [supply_low, supply_high] = input.initial_supply.to_felts();
	Ok(vec![
		Felt::from_short_string(&input.name)?,
		Felt::from_short_string(&input.symbol)?,
		Felt::from(input.decimals),
		supply_low,
		supply_high,
		input.recipient.clone(),
		input.owner.clone(),
	])
}

fn fits_short_string(s: &str) -> bool {
	!s.is_empty() && s.is_ascii() && s.len() <= 31
}

pub fn deploy() -> ExecuteCommand<DeployTokenInput, Vec<Felt>> {
	ExecuteCommand::new(
		"token:deploy",
		CommandConfig {
			ux: Ux {
				category: CATEGORY_TOKEN,
				function: Target::Constructor,
				examples: &[
					"starknet-ops run token:deploy -- --name=\"LINK Token\" --symbol=LINK --supply=1000 --recipient=<ACCOUNT>",
				],
			},
			make_user_input: deploy_input,
			make_contract_input: deploy_args,
			validations: vec![
				Validation {
					name: "name_is_short_string",
					check: |i: &DeployTokenInput| fits_short_string(&i.name),
				},
				Validation {
					name: "symbol_is_short_string",
					check: |i: &DeployTokenInput| fits_short_string(&i.symbol),
				},
				Validation {
					name: "recipient_is_set",
					check: |i: &DeployTokenInput| !i.recipient.is_zero(),
				},
			],
			load_contract: Arc::new(ArtifactLoader::named(TOKEN_ARTIFACT)),
		},
	)
}

// -- token:transfer --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferInput {
	pub recipient: Felt,
	pub amount: Uint256,
}

fn transfer_input(raw: &RawInput) -> Result<TransferInput> {
	Ok(TransferInput {
		recipient: felt_flag(raw, "recipient")?,
		amount: amount_flag(raw, "amount")?,
	})
}

/// `transfer(recipient, amount: Uint256)`
fn transfer_args(input: &TransferInput) -> Result<[Felt; 3]> {
	let [low, high] = input.amount.to_felts();
	Ok([input.recipient.clone(), low, high])
}

pub fn transfer() -> ExecuteCommand<TransferInput, [Felt; 3]> {
	ExecuteCommand::new(
		"token:transfer",
		CommandConfig {
			ux: Ux {
				category: CATEGORY_TOKEN,
				function: Target::Function("transfer"),
				examples: &[
					"starknet-ops run token:transfer --address=<TOKEN> -- --recipient=<ACCOUNT> --amount=10",
				],
			},
			make_user_input: transfer_input,
			make_contract_input: transfer_args,
			validations: vec![
				Validation {
					name: "recipient_is_set",
					check: |i: &TransferInput| !i.recipient.is_zero(),
				},
				Validation {
					name: "amount_is_positive",
					check: |i: &TransferInput| !i.amount.is_zero(),
				},
			],
			load_contract: Arc::new(ArtifactLoader::named(TOKEN_ARTIFACT)),
		},
	)
}
