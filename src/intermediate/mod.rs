//! What the parser hands to a back end: the tree, the scopes and the types.

pub mod icode;
pub mod symtab;
pub mod types;

use icode::ICode;
use symtab::{ConstantValue, Definition, EntryId, SymTab, SymTabStack};
use types::{TypeForm, TypeId, TypeTable};

/// A translated program.
#[derive(Debug, Clone)]
pub struct Program {
	pub icode:        ICode,
	pub symtab_stack: SymTabStack,
	pub types:        TypeTable,
	/// Syntax errors flagged while parsing
	pub error_count:  usize,
	/// Source lines read
	pub line_count:   usize,
}

impl Program {
	pub fn program_id(&self) -> Option<EntryId> { self.symtab_stack.program_id() }

	/// Scope of the program block.
	pub fn symtab(&self) -> Option<&SymTab> { self.symtab_stack.program_symtab() }

	/// A variable declared in the program block.
	pub fn variable(&self, name: &str) -> Option<EntryId> {
		self.symtab()?.lookup(name).filter(|&id| self.symtab_stack[id].definition == Definition::Variable)
	}

	/// The intermediate tree as an S-expression.
	pub fn icode_listing(&self) -> String {
		self.icode.root().map(|root| self.icode.display(root, &self.symtab_stack).to_string()).unwrap_or_default()
	}
}

/// Enter the predefined types and constants into the outermost scope.
pub fn seed_predefined(symtab_stack: &mut SymTabStack, types: &mut TypeTable) {
	for (name, type_id) in [
		("integer", TypeTable::INTEGER),
		("real", TypeTable::REAL),
		("boolean", TypeTable::BOOLEAN),
		("char", TypeTable::CHAR),
	] {
		let id = symtab_stack.enter_local(name);
		symtab_stack[id].definition = Definition::Type;
		symtab_stack[id].type_spec = Some(type_id);
		types[type_id].identifier = Some(id);
	}

	let constants = ["false", "true"]
		.into_iter()
		.zip(0..)
		.map(|(name, value)| {
			let id = symtab_stack.enter_local(name);
			symtab_stack[id].definition = Definition::EnumerationConstant;
			symtab_stack[id].type_spec = Some(TypeTable::BOOLEAN);
			symtab_stack[id].value = Some(ConstantValue::Integer(value));
			id
		})
		.collect();
	types[TypeTable::BOOLEAN].form = TypeForm::Enumeration { constants };
}

/// Type of a constant value: `char` for one-character strings, otherwise an
/// anonymous string type.
pub fn constant_type(value: &ConstantValue, types: &mut TypeTable) -> TypeId {
	match value {
		ConstantValue::Integer(_) => TypeTable::INTEGER,
		ConstantValue::Real(_) => TypeTable::REAL,
		ConstantValue::String(text) if text.chars().count() == 1 => TypeTable::CHAR,
		ConstantValue::String(text) => types.create_string_type(text.chars().count()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn predefined_identifiers() {
		let mut stack = SymTabStack::new();
		let mut types = TypeTable::new();
		seed_predefined(&mut stack, &mut types);

		let integer = stack.lookup("INTEGER").unwrap();
		assert_eq!(stack[integer].definition, Definition::Type);
		assert_eq!(types[TypeTable::INTEGER].identifier, Some(integer));

		let truth = stack.lookup("true").unwrap();
		assert_eq!(stack[truth].value, Some(ConstantValue::Integer(1)));
		assert_eq!(stack[truth].type_spec, Some(TypeTable::BOOLEAN));
		let falsity = stack.lookup("false").unwrap();
		assert_eq!(types[TypeTable::BOOLEAN].form, TypeForm::Enumeration { constants: vec![falsity, truth] });
		assert_eq!(stack.local_symtab().len(), 6);
	}

	#[test]
	fn constant_types() {
		let mut types = TypeTable::new();
		assert_eq!(constant_type(&ConstantValue::Integer(3), &mut types), TypeTable::INTEGER);
		assert_eq!(constant_type(&ConstantValue::String("x".into()), &mut types), TypeTable::CHAR);
		let string = constant_type(&ConstantValue::String("xyz".into()), &mut types);
		assert!(types.is_pascal_string(string));
	}
}
