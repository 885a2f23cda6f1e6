//! Pascal type specifications and the rules for mixing them.
//!
//! Types live in a [`TypeTable`] arena and are compared by [`TypeId`], never
//! by structure: two `array [1..3] of integer` declarations are two different
//! types. The one exception is the Pascal string, any `array` of `char`
//! indexed by integers, which [`TypeTable::is_pascal_string`] recognizes by
//! shape.
//!
//! The predefined types sit at fixed ids so every stage can name them without
//! a lookup.

use std::ops::{Index, IndexMut};

use super::symtab::{EntryId, SymTab};

/// Handle of a [`TypeSpec`] in its [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// The shape of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeForm {
	Scalar,
	Enumeration { constants: Vec<EntryId> },
	/// Bounds are ordinals; a `char` subrange stores character codes.
	Subrange { base_type: TypeId, min: i32, max: i32 },
	Array { index_type: TypeId, element_type: TypeId, element_count: usize },
	Record { fields: SymTab },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
	pub form:       TypeForm,
	/// Type identifier that defined this type, `None` when anonymous
	pub identifier: Option<EntryId>,
}

#[derive(Debug, Clone)]
pub struct TypeTable {
	specs: Vec<TypeSpec>,
}

impl Default for TypeTable {
	fn default() -> Self { Self::new() }
}

impl TypeTable {
	pub const BOOLEAN: TypeId = TypeId(3);
	pub const CHAR: TypeId = TypeId(2);
	pub const INTEGER: TypeId = TypeId(0);
	pub const REAL: TypeId = TypeId(1);
	/// Substituted wherever a type could not be determined.
	pub const UNDEFINED: TypeId = TypeId(4);

	/// A table holding only the predefined types. Their identifiers and the
	/// boolean constants are attached when the predefined scope is seeded.
	pub fn new() -> Self {
		let scalar = || TypeSpec { form: TypeForm::Scalar, identifier: None };
		let boolean = TypeSpec { form: TypeForm::Enumeration { constants: Vec::new() }, identifier: None };
		Self { specs: vec![scalar(), scalar(), scalar(), boolean, scalar()] }
	}

	pub fn create(&mut self, form: TypeForm) -> TypeId {
		self.specs.push(TypeSpec { form, identifier: None });
		TypeId(self.specs.len() - 1)
	}

	/// The type a subrange is defined over; any other type is its own base.
	pub fn base_type(&self, id: TypeId) -> TypeId {
		match self[id].form {
			TypeForm::Subrange { base_type, .. } => base_type,
			_ => id,
		}
	}

	/// Anonymous type of a string literal of `length` characters.
	pub fn create_string_type(&mut self, length: usize) -> TypeId {
		let max = i32::try_from(length).unwrap_or(i32::MAX);
		let index_type = self.create(TypeForm::Subrange { base_type: Self::INTEGER, min: 1, max });
		self.create(TypeForm::Array { index_type, element_type: Self::CHAR, element_count: length })
	}

	pub fn is_pascal_string(&self, id: TypeId) -> bool {
		match self[id].form {
			TypeForm::Array { index_type, element_type, .. } => {
				self.base_type(element_type) == Self::CHAR && self.base_type(index_type) == Self::INTEGER
			}
			_ => false,
		}
	}

	pub fn is_integer(&self, id: TypeId) -> bool { self.base_type(id) == Self::INTEGER }

	pub fn is_real(&self, id: TypeId) -> bool { self.base_type(id) == Self::REAL }

	pub fn is_boolean(&self, id: TypeId) -> bool { self.base_type(id) == Self::BOOLEAN }

	pub fn is_char(&self, id: TypeId) -> bool { self.base_type(id) == Self::CHAR }

	pub fn is_enumeration(&self, id: TypeId) -> bool {
		matches!(self[self.base_type(id)].form, TypeForm::Enumeration { .. })
	}

	pub fn is_integer_or_real(&self, id: TypeId) -> bool { self.is_integer(id) || self.is_real(id) }

	pub fn are_both_integer(&self, a: TypeId, b: TypeId) -> bool { self.is_integer(a) && self.is_integer(b) }

	pub fn are_both_boolean(&self, a: TypeId, b: TypeId) -> bool { self.is_boolean(a) && self.is_boolean(b) }

	/// One operand is real and the other is real or integer.
	pub fn is_at_least_one_real(&self, a: TypeId, b: TypeId) -> bool {
		(self.is_real(a) && self.is_integer_or_real(b)) || (self.is_integer(a) && self.is_real(b))
	}

	/// Can a `value` be assigned to a `target`?
	pub fn are_assignment_compatible(&self, target: TypeId, value: TypeId) -> bool {
		let (target, value) = (self.base_type(target), self.base_type(value));
		target == value
			|| (target == Self::REAL && value == Self::INTEGER)
			|| (self.is_pascal_string(target) && self.is_pascal_string(value))
	}

	/// Can `a` and `b` be compared with a relational operator?
	pub fn are_comparison_compatible(&self, a: TypeId, b: TypeId) -> bool {
		let (a, b) = (self.base_type(a), self.base_type(b));
		let ordinal = matches!(self[a].form, TypeForm::Scalar | TypeForm::Enumeration { .. });
		(a == b && ordinal)
			|| self.is_at_least_one_real(a, b)
			|| (self.is_pascal_string(a) && self.is_pascal_string(b))
	}

	/// Smallest ordinal of an index type.
	pub fn min_ordinal(&self, id: TypeId) -> i32 {
		match self[id].form {
			TypeForm::Subrange { min, .. } => min,
			_ => 0,
		}
	}
}

impl Index<TypeId> for TypeTable {
	type Output = TypeSpec;

	fn index(&self, id: TypeId) -> &Self::Output { &self.specs[id.0] }
}

impl IndexMut<TypeId> for TypeTable {
	fn index_mut(&mut self, id: TypeId) -> &mut Self::Output { &mut self.specs[id.0] }
}

#[cfg(test)]
mod tests {
	use super::*;

	const INTEGER: TypeId = TypeTable::INTEGER;
	const REAL: TypeId = TypeTable::REAL;

	fn subrange(types: &mut TypeTable, base_type: TypeId, min: i32, max: i32) -> TypeId {
		types.create(TypeForm::Subrange { base_type, min, max })
	}

	#[test]
	fn assignment_is_asymmetric() {
		let types = TypeTable::new();
		assert!(types.are_assignment_compatible(REAL, INTEGER));
		assert!(!types.are_assignment_compatible(INTEGER, REAL));
		assert!(types.are_assignment_compatible(INTEGER, INTEGER));
		assert!(!types.are_assignment_compatible(TypeTable::CHAR, INTEGER));
	}

	#[test]
	fn comparison_is_symmetric() {
		let types = TypeTable::new();
		assert!(types.are_comparison_compatible(REAL, INTEGER));
		assert!(types.are_comparison_compatible(INTEGER, REAL));
		assert!(types.are_comparison_compatible(TypeTable::BOOLEAN, TypeTable::BOOLEAN));
		assert!(!types.are_comparison_compatible(TypeTable::BOOLEAN, INTEGER));
	}

	#[test]
	fn subranges_are_transparent() {
		let mut types = TypeTable::new();
		let digits = subrange(&mut types, INTEGER, 0, 9);
		assert_eq!(types.base_type(digits), INTEGER);
		assert!(types.is_integer(digits));
		assert!(types.are_assignment_compatible(digits, INTEGER));
		assert!(types.are_assignment_compatible(REAL, digits));
		assert!(types.are_comparison_compatible(digits, INTEGER));
	}

	#[test]
	fn types_compare_by_identity() {
		let mut types = TypeTable::new();
		let form = TypeForm::Enumeration { constants: Vec::new() };
		let first = types.create(form.clone());
		let second = types.create(form);
		assert!(types.are_comparison_compatible(first, first));
		assert!(!types.are_comparison_compatible(first, second));
		assert!(!types.are_assignment_compatible(first, second));
		assert!(types.is_enumeration(second));
	}

	#[test]
	fn pascal_strings_match_by_shape() {
		let mut types = TypeTable::new();
		let hello = types.create_string_type(5);
		let hi = types.create_string_type(2);
		assert!(types.is_pascal_string(hello));
		assert!(types.are_assignment_compatible(hello, hi));
		assert!(types.are_comparison_compatible(hi, hello));
		let index_type = subrange(&mut types, INTEGER, 1, 3);
		let numbers = types.create(TypeForm::Array { index_type, element_type: INTEGER, element_count: 3 });
		assert!(!types.is_pascal_string(numbers));
		assert!(types.are_assignment_compatible(numbers, numbers));
		if let TypeForm::Array { element_count, index_type, .. } = types[hello].form {
			assert_eq!(element_count, 5);
			assert_eq!(types.min_ordinal(index_type), 1);
		}
	}
}
