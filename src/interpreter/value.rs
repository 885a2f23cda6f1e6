use std::{cmp::Ordering, collections::BTreeMap, fmt::Display};

use Value::*;

use crate::intermediate::icode::ICodeNodeType;

/// Runtime value of a variable or expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Storage that has never been assigned
	Uninitialized,
	/// Integers and enumeration ordinals
	Integer(i32),
	Real(f64),
	Boolean(bool),
	Char(char),
	/// A string constant
	Str(String),
	/// Elements by zero-based offset; a missing element is uninitialized
	Array(BTreeMap<usize, Value>),
	/// Fields by name; a missing field is uninitialized
	Record(BTreeMap<String, Value>),
}

/// One step from a variable's storage to a part of it.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Zero-based element offset
	Index(usize),
	Field(String),
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Uninitialized => write!(f, "?"),
			Integer(n) => write!(f, "{n}"),
			Real(n) => write!(f, "{n:?}"),
			Boolean(b) => write!(f, "{b}"),
			Char(c) => write!(f, "'{c}'"),
			Str(s) => write!(f, "'{s}'"),
			Array(elements) => {
				write!(f, "[")?;
				for (i, (offset, element)) in elements.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{offset}: {element}")?;
				}
				write!(f, "]")
			}
			Record(fields) => {
				write!(f, "{{")?;
				for (i, (name, value)) in fields.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{name}: {value}")?;
				}
				write!(f, "}}")
			}
		}
	}
}

impl Value {
	/// A string as the character array a string variable holds.
	pub fn chars(text: &str) -> Self { Array(text.chars().map(Char).enumerate().collect()) }

	/// Position of an ordinal value in its type.
	pub fn ordinal(&self) -> Option<i32> {
		match self {
			Integer(n) => Some(*n),
			Char(c) => i32::try_from(u32::from(*c)).ok(),
			Boolean(b) => Some(i32::from(*b)),
			_ => None,
		}
	}

	pub fn as_real(&self) -> Option<f64> {
		match self {
			Integer(n) => Some(f64::from(*n)),
			Real(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Boolean(b) => Some(*b),
			_ => None,
		}
	}

	/// Contents of a string constant or of a character array whose elements
	/// are all assigned from offset 0 on.
	pub fn text(&self) -> Option<String> {
		match self {
			Str(s) => Some(s.clone()),
			Array(elements) => elements
				.iter()
				.enumerate()
				.map(|(i, (offset, element))| match element {
					Char(c) if i == *offset => Some(*c),
					_ => None,
				})
				.collect(),
			_ => None,
		}
	}

	pub fn is_zero(&self) -> bool {
		match self {
			Integer(n) => *n == 0,
			Real(n) => *n == 0.0,
			_ => false,
		}
	}

	/// Apply an arithmetic `operator`. Two integers give an integer with
	/// wrapping overflow, except for `/`; any real operand makes the result
	/// real. Adding to or subtracting from a boolean or char moves its
	/// ordinal. `None` for operands the operator does not take, or a zero
	/// divisor.
	pub fn arithmetic(&self, operator: &ICodeNodeType, right: &Self) -> Option<Value> {
		use ICodeNodeType::*;

		match (self, right) {
			(Integer(l), Integer(r)) => {
				let value = match operator {
					Add => Integer(l.wrapping_add(*r)),
					Subtract => Integer(l.wrapping_sub(*r)),
					Multiply => Integer(l.wrapping_mul(*r)),
					FloatDivide if *r != 0 => Real(f64::from(*l) / f64::from(*r)),
					IntegerDivide if *r != 0 => Integer(l.wrapping_div(*r)),
					Mod if *r != 0 => Integer(l.wrapping_rem(*r)),
					_ => return None,
				};
				Some(value)
			}
			(Boolean(_) | Char(_), Integer(r)) if matches!(operator, Add | Subtract) => {
				let ordinal = self.ordinal()?;
				let ordinal = if *operator == Add { ordinal.wrapping_add(*r) } else { ordinal.wrapping_sub(*r) };
				Some(self.with_ordinal(ordinal))
			}
			_ => {
				let (l, r) = (self.as_real()?, right.as_real()?);
				let value = match operator {
					Add => l + r,
					Subtract => l - r,
					Multiply => l * r,
					FloatDivide if r != 0.0 => l / r,
					_ => return None,
				};
				Some(Real(value))
			}
		}
	}

	/// A value of this one's kind at `ordinal`, or a bare integer when the
	/// kind has no value there.
	fn with_ordinal(&self, ordinal: i32) -> Value {
		let value = match self {
			Boolean(_) => match ordinal {
				0 => Some(Boolean(false)),
				1 => Some(Boolean(true)),
				_ => None,
			},
			Char(_) => u32::try_from(ordinal).ok().and_then(char::from_u32).map(Char),
			_ => None,
		};
		value.unwrap_or(Integer(ordinal))
	}

	/// Order two values of comparable types. Integers and reals compare as
	/// numbers, other scalars by ordinal.
	pub fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Integer(l), Integer(r)) => Some(l.cmp(r)),
			(Boolean(l), Boolean(r)) => Some(l.cmp(r)),
			(Char(l), Char(r)) => Some(l.cmp(r)),
			(Str(_) | Array(_), Str(_) | Array(_)) => Some(self.text()?.cmp(&other.text()?)),
			(Real(_), _) | (_, Real(_)) => self.as_real()?.partial_cmp(&other.as_real()?),
			_ => Some(self.ordinal()?.cmp(&other.ordinal()?)),
		}
	}

	/// The part of this value `steps` lead to. Parts never assigned are
	/// [`Uninitialized`]; `None` when a step does not fit the value.
	pub fn at(&self, steps: &[Step]) -> Option<Value> {
		let Some((step, rest)) = steps.split_first() else {
			return Some(self.clone());
		};
		match (self, step) {
			(Uninitialized, _) => Some(Uninitialized),
			(Array(elements), Step::Index(i)) => elements.get(i).map_or(Some(Uninitialized), |element| element.at(rest)),
			(Record(fields), Step::Field(name)) => fields.get(name).map_or(Some(Uninitialized), |field| field.at(rest)),
			_ => None,
		}
	}

	/// Replace the part of this value `steps` lead to, creating the arrays
	/// and records on the way. Returns whether the steps fit the value.
	pub fn store(&mut self, steps: &[Step], value: Value) -> bool {
		let Some((step, rest)) = steps.split_first() else {
			*self = value;
			return true;
		};
		if *self == Uninitialized {
			*self = match step {
				Step::Index(_) => Array(BTreeMap::new()),
				Step::Field(_) => Record(BTreeMap::new()),
			};
		}
		match (self, step) {
			(Array(elements), Step::Index(i)) => elements.entry(*i).or_insert(Uninitialized).store(rest, value),
			(Record(fields), Step::Field(name)) => fields.entry(name.clone()).or_insert(Uninitialized).store(rest, value),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn integer_arithmetic_wraps() {
		let max = Integer(i32::MAX);
		assert_eq!(max.arithmetic(&ICodeNodeType::Add, &Integer(1)), Some(Integer(i32::MIN)));
		assert_eq!(Integer(7).arithmetic(&ICodeNodeType::IntegerDivide, &Integer(2)), Some(Integer(3)));
		assert_eq!(Integer(-7).arithmetic(&ICodeNodeType::Mod, &Integer(2)), Some(Integer(-1)));
		assert_eq!(Integer(7).arithmetic(&ICodeNodeType::FloatDivide, &Integer(2)), Some(Real(3.5)));
	}

	#[test]
	fn mixed_operands_are_real() {
		assert_eq!(Integer(1).arithmetic(&ICodeNodeType::Add, &Real(0.5)), Some(Real(1.5)));
		assert_eq!(Real(1.0).arithmetic(&ICodeNodeType::IntegerDivide, &Integer(1)), None);
	}

	#[test]
	fn zero_divisor_has_no_result() {
		assert_eq!(Integer(5).arithmetic(&ICodeNodeType::IntegerDivide, &Integer(0)), None);
		assert_eq!(Real(5.0).arithmetic(&ICodeNodeType::FloatDivide, &Integer(0)), None);
		assert!(Real(0.0).is_zero());
	}

	#[test]
	fn comparisons() {
		assert_eq!(Integer(2).compare(&Real(2.5)), Some(Ordering::Less));
		assert_eq!(Char('b').compare(&Char('a')), Some(Ordering::Greater));
		assert_eq!(Str("hi".into()).compare(&Value::chars("hi")), Some(Ordering::Equal));
		assert_eq!(Boolean(true).compare(&Integer(2)), Some(Ordering::Less));
		assert_eq!(Boolean(true).compare(&Str("hi".into())), None);
	}

	#[test]
	fn stepping_booleans_and_chars_moves_the_ordinal() {
		assert_eq!(Boolean(false).arithmetic(&ICodeNodeType::Add, &Integer(1)), Some(Boolean(true)));
		assert_eq!(Boolean(true).arithmetic(&ICodeNodeType::Add, &Integer(1)), Some(Integer(2)));
		assert_eq!(Boolean(false).arithmetic(&ICodeNodeType::Subtract, &Integer(1)), Some(Integer(-1)));
		assert_eq!(Char('a').arithmetic(&ICodeNodeType::Add, &Integer(2)), Some(Char('c')));
		assert_eq!(Char('a').arithmetic(&ICodeNodeType::Multiply, &Integer(2)), None);
	}

	#[test]
	fn storage_is_built_on_first_store() {
		let mut value = Uninitialized;
		let steps = [Step::Index(1), Step::Field("x".into())];

		assert!(value.store(&steps, Integer(3)));
		assert_eq!(value.at(&steps), Some(Integer(3)));
		assert_eq!(value.at(&[Step::Index(0), Step::Field("x".into())]), Some(Uninitialized));
		assert_eq!(value.at(&[Step::Index(1), Step::Field("y".into())]), Some(Uninitialized));
		assert_eq!(value.to_string(), "[1: {x: 3}]");
		assert!(!value.store(&[Step::Field("x".into())], Integer(0)));
	}

	#[test]
	fn sparse_arrays_hold_far_offsets() {
		let mut value = Uninitialized;
		assert!(value.store(&[Step::Index(1_999_999_999)], Integer(7)));
		assert_eq!(value.at(&[Step::Index(1_999_999_999)]), Some(Integer(7)));
		assert_eq!(value.at(&[Step::Index(0)]), Some(Uninitialized));
	}

	#[test]
	fn character_arrays_read_as_text() {
		let mut name = Value::chars("hi");
		assert_eq!(name.text(), Some("hi".to_string()));
		assert!(name.store(&[Step::Index(2)], Char('!')));
		assert_eq!(name.text(), Some("hi!".to_string()));

		let mut gap = Value::chars("a");
		assert!(gap.store(&[Step::Index(2)], Char('c')));
		assert_eq!(gap.text(), None);
	}
}
