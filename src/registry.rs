use std::collections::BTreeMap;

use thiserror::Error;

use crate::catalog;
use crate::command::Command;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	#[error("command '{0}' is registered twice")]
	Duplicate(&'static str),
}

/// All known commands keyed by id (`group:name`).  Built once at startup.
#[derive(Default)]
pub struct CommandRegistry {
	commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding every built-in command group.
	pub fn builtin() -> Result<Self, RegistryError> {
		let mut registry = Self::new();
		for group in catalog::all() {
			registry.extend(group)?;
		}
		Ok(registry)
	}

	pub fn register(&mut self, command: Box<dyn Command>) -> Result<(), RegistryError> {
		let id = command.id();
		if self.commands.contains_key(id) {
			return Err(RegistryError::Duplicate(id));
		}
		self.commands.insert(id, command);
		Ok(())
	}

	/// Merge a whole command group.
	pub fn extend(&mut self, group: Vec<Box<dyn Command>>) -> Result<(), RegistryError> {
		group.into_iter().try_for_each(|c| self.register(c))
	}

	pub fn get(&self, id: &str) -> Option<&dyn Command> {
		self.commands.get(id).map(|c| &**c)
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}

	/// Commands grouped by UX category, each group sorted by id.
	pub fn by_category(&self) -> BTreeMap<&'static str, Vec<&dyn Command>> {
		let mut groups: BTreeMap<&'static str, Vec<&dyn Command>> = BTreeMap::new();
		for command in self.commands.values() {
			groups
				.entry(command.ux().category)
				.or_default()
				.push(&**command);
		}
		groups
	}
}
