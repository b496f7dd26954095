pub mod account;
pub mod catalog;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod felt;
pub mod provider;
pub mod registry;
pub mod rpc;
pub mod signer;
pub mod transaction;
