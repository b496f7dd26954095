//! Concrete on-chain commands, one module per group.

pub mod example;
pub mod token;

use crate::command::Command;

pub const CATEGORY_EXAMPLE: &str = "example";
pub const CATEGORY_TOKEN: &str = "token";

/// Every built-in command group, in registration order.
pub fn all() -> Vec<Vec<Box<dyn Command>>> {
	vec![example::commands(), token::commands()]
}
