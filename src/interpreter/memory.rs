use std::collections::HashMap;

use super::value::{Step, Value};
use crate::intermediate::symtab::EntryId;

/// Storage of every variable of one run, keyed by symbol table entry.
/// Arrays and records grow as their parts are assigned, so only what a
/// program stores takes memory.
#[derive(Default, Debug)]
pub struct Memory {
	cells: HashMap<EntryId, Value>,
}

impl Memory {
	pub fn new() -> Self { Self { cells: HashMap::new() } }

	/// Current value of a variable, `None` if it was never touched.
	pub fn get(&self, id: EntryId) -> Option<&Value> { self.cells.get(&id) }

	/// The part of a variable `steps` lead to.
	pub fn load(&self, id: EntryId, steps: &[Step]) -> Option<Value> {
		self.cells.get(&id).map_or(Some(Value::Uninitialized), |cell| cell.at(steps))
	}

	/// Assign to the part of a variable `steps` lead to. Returns whether the
	/// steps fit what the variable holds.
	pub fn store(&mut self, id: EntryId, steps: &[Step], value: Value) -> bool {
		self.cells.entry(id).or_insert(Value::Uninitialized).store(steps, value)
	}
}
