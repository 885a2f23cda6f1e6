//! Nested scopes of identifiers.
//!
//! Every entry lives in one arena owned by the [`SymTabStack`] and is named by
//! an [`EntryId`]; scopes only map names to ids. Popping a scope therefore
//! never drops its entries, which lets a record type keep its field scope and
//! lets tree nodes keep pointing at the entries they use.
//!
//! Names are matched case-insensitively.

use std::{collections::BTreeMap, fmt, ops::{Index, IndexMut}};

use tracing::debug;

use super::types::TypeId;

/// Handle of a [`SymTabEntry`] in its [`SymTabStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// How an identifier was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Definition {
	Constant,
	EnumerationConstant,
	Type,
	Variable,
	Field,
	ValueParameter,
	VarParameter,
	Program,
	Undefined,
}

impl fmt::Display for Definition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Definition::*;
		let text = match self {
			Constant => "constant",
			EnumerationConstant => "enumeration constant",
			Type => "type",
			Variable => "variable",
			Field => "record field",
			ValueParameter => "value parameter",
			VarParameter => "VAR parameter",
			Program => "program",
			Undefined => "undefined",
		};
		write!(f, "{text}")
	}
}

/// Value of a constant or enumeration constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
	Integer(i32),
	Real(f64),
	String(String),
}

impl fmt::Display for ConstantValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConstantValue::Integer(value) => write!(f, "{value}"),
			ConstantValue::Real(value) => write!(f, "{value:?}"),
			ConstantValue::String(value) => write!(f, "'{value}'"),
		}
	}
}

/// Everything known about one identifier in one scope.
#[derive(Debug, Clone)]
pub struct SymTabEntry {
	/// Lowercase name
	pub name:           String,
	/// Nesting level of the owning scope
	pub nesting_level:  usize,
	pub definition:     Definition,
	pub type_spec:      Option<TypeId>,
	pub value:          Option<ConstantValue>,
	/// Scope of a program entry, attached once its block is parsed
	pub routine_symtab: Option<SymTab>,
	/// Every source line the identifier appears on
	pub line_numbers:   Vec<usize>,
}

impl SymTabEntry {
	fn new(name: String, nesting_level: usize) -> Self {
		Self {
			name,
			nesting_level,
			definition: Definition::Undefined,
			type_spec: None,
			value: None,
			routine_symtab: None,
			line_numbers: Vec::new(),
		}
	}

	pub fn append_line_number(&mut self, line: usize) { self.line_numbers.push(line); }
}

/// One scope: names ordered alphabetically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymTab {
	nesting_level: usize,
	entries:       BTreeMap<String, EntryId>,
}

impl SymTab {
	pub fn new(nesting_level: usize) -> Self { Self { nesting_level, entries: BTreeMap::new() } }

	pub fn nesting_level(&self) -> usize { self.nesting_level }

	pub fn lookup(&self, name: &str) -> Option<EntryId> { self.entries.get(&name.to_lowercase()).copied() }

	/// Entries sorted by name.
	pub fn sorted_entries(&self) -> impl Iterator<Item = EntryId> + '_ { self.entries.values().copied() }

	pub fn len(&self) -> usize { self.entries.len() }

	pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Stack of scopes; the top is the local scope and the bottom, level 0, holds
/// the predefined identifiers.
#[derive(Debug, Clone)]
pub struct SymTabStack {
	entries:    Vec<SymTabEntry>,
	scopes:     Vec<SymTab>,
	program_id: Option<EntryId>,
}

impl Default for SymTabStack {
	fn default() -> Self { Self::new() }
}

impl SymTabStack {
	pub fn new() -> Self { Self { entries: Vec::new(), scopes: vec![SymTab::new(0)], program_id: None } }

	pub fn current_nesting_level(&self) -> usize { self.scopes.len() - 1 }

	pub fn local_symtab(&self) -> &SymTab { &self.scopes[self.scopes.len() - 1] }

	/// Open a new, empty scope.
	pub fn push(&mut self) -> usize {
		self.scopes.push(SymTab::new(self.scopes.len()));
		debug!(level = self.current_nesting_level(), "push scope");
		self.current_nesting_level()
	}

	/// Close the local scope and hand it back. The outermost scope cannot be
	/// popped.
	pub fn pop(&mut self) -> Option<SymTab> {
		if self.scopes.len() == 1 {
			return None;
		}
		let symtab = self.scopes.pop()?;
		debug!(level = symtab.nesting_level(), "pop scope");
		Some(symtab)
	}

	/// Create an entry in the local scope. Shadows an existing local entry of
	/// the same name; callers check [`Self::lookup_local`] first.
	pub fn enter_local(&mut self, name: &str) -> EntryId {
		let name = name.to_lowercase();
		let id = EntryId(self.entries.len());
		let level = self.current_nesting_level();
		self.entries.push(SymTabEntry::new(name.clone(), level));
		let local = self.scopes.len() - 1;
		self.scopes[local].entries.insert(name, id);
		id
	}

	pub fn lookup_local(&self, name: &str) -> Option<EntryId> { self.local_symtab().lookup(name) }

	/// Search from the local scope outward; the nearest definition wins.
	pub fn lookup(&self, name: &str) -> Option<EntryId> {
		self.scopes.iter().rev().find_map(|symtab| symtab.lookup(name))
	}

	pub fn program_id(&self) -> Option<EntryId> { self.program_id }

	pub fn set_program_id(&mut self, id: EntryId) { self.program_id = Some(id); }

	/// Scope of the program's block.
	pub fn program_symtab(&self) -> Option<&SymTab> { self[self.program_id?].routine_symtab.as_ref() }
}

impl Index<EntryId> for SymTabStack {
	type Output = SymTabEntry;

	fn index(&self, id: EntryId) -> &Self::Output { &self.entries[id.0] }
}

impl IndexMut<EntryId> for SymTabStack {
	fn index_mut(&mut self, id: EntryId) -> &mut Self::Output { &mut self.entries[id.0] }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pushed_names_vanish_after_pop() {
		let mut stack = SymTabStack::new();
		assert_eq!(stack.push(), 1);
		let id = stack.enter_local("x");
		assert_eq!(stack.lookup_local("x"), Some(id));
		assert_eq!(stack[id].nesting_level, 1);

		let popped = stack.pop().unwrap();
		assert_eq!(popped.lookup("x"), Some(id));
		assert_eq!(stack.lookup("x"), None);
		assert_eq!(stack.lookup_local("x"), None);
		assert_eq!(stack.current_nesting_level(), 0);
	}

	#[test]
	fn nearest_scope_wins() {
		let mut stack = SymTabStack::new();
		let outer = stack.enter_local("n");
		stack.push();
		assert_eq!(stack.lookup("n"), Some(outer));
		assert_eq!(stack.lookup_local("n"), None);
		let inner = stack.enter_local("n");
		assert_eq!(stack.lookup("n"), Some(inner));
		stack.pop();
		assert_eq!(stack.lookup("n"), Some(outer));
	}

	#[test]
	fn names_ignore_case() {
		let mut stack = SymTabStack::new();
		let id = stack.enter_local("Total");
		assert_eq!(stack[id].name, "total");
		assert_eq!(stack.lookup("TOTAL"), Some(id));
	}

	#[test]
	fn outermost_scope_stays() {
		let mut stack = SymTabStack::new();
		assert!(stack.pop().is_none());
		assert_eq!(stack.current_nesting_level(), 0);
	}

	#[test]
	fn entries_iterate_in_name_order() {
		let mut stack = SymTabStack::new();
		let b = stack.enter_local("b");
		let a = stack.enter_local("a");
		let c = stack.enter_local("c");
		assert_eq!(stack.local_symtab().sorted_entries().collect::<Vec<_>>(), vec![a, b, c]);
		assert_eq!(stack.local_symtab().len(), 3);
	}
}
