use std::cmp::Ordering;

use anyhow::anyhow;

use super::{Executor, value::{Step, Value}};
use crate::{
	error::interpreter::{InterpreterError, RuntimeErrorCode},
	intermediate::{
		icode::{ICodeNodeType::{self, *}, NodeId},
		symtab::EntryId,
		types::{TypeForm, TypeId, TypeTable},
	},
};

impl Executor<'_> {
	/// Evaluate an expression node. Arithmetic follows the runtime kind of the
	/// operands, not their static types.
	pub(super) fn evaluate(&mut self, node: NodeId) -> Result<Value, InterpreterError> {
		let program = self.program;
		let value = match &program.icode[node].r#type {
			Variable(_) => self.read_variable(node)?,
			IntegerConstant(value) if program.types.is_boolean(self.type_of(node)) => Value::Boolean(*value != 0),
			IntegerConstant(value) => Value::Integer(*value),
			RealConstant(value) => Value::Real(*value),
			StringConstant(text) if program.types.is_char(self.type_of(node)) => {
				text.chars().next().map_or(Value::Char(' '), Value::Char)
			}
			StringConstant(text) => Value::Str(text.clone()),
			Negate => match self.operand(node, 0)? {
				Value::Integer(n) => Value::Integer(n.wrapping_neg()),
				Value::Real(n) => Value::Real(-n),
				_ => self.invalid(node)?,
			},
			Not => match self.operand(node, 0)?.as_bool() {
				Some(b) => Value::Boolean(!b),
				None => self.invalid(node)?,
			},
			And | Or => {
				let (left, right) = (self.operand(node, 0)?.as_bool(), self.operand(node, 1)?.as_bool());
				match (left, right) {
					(Some(l), Some(r)) if program.icode[node].r#type == And => Value::Boolean(l && r),
					(Some(l), Some(r)) => Value::Boolean(l || r),
					_ => self.invalid(node)?,
				}
			}
			Eq | Ne | Lt | Le | Gt | Ge => {
				let (left, right) = (self.operand(node, 0)?, self.operand(node, 1)?);
				let ordering = left.compare(&right);
				let result = match &program.icode[node].r#type {
					Eq => ordering == Some(Ordering::Equal),
					Ne => ordering.is_some_and(Ordering::is_ne),
					Lt => ordering == Some(Ordering::Less),
					Le => ordering.is_some_and(Ordering::is_le),
					Gt => ordering == Some(Ordering::Greater),
					_ => ordering.is_some_and(Ordering::is_ge),
				};
				Value::Boolean(result)
			}
			operator @ (Add | Subtract | Multiply | FloatDivide | IntegerDivide | Mod) => {
				let (left, right) = (self.operand(node, 0)?, self.operand(node, 1)?);
				match left.arithmetic(operator, &right) {
					Some(value) => value,
					None if right.is_zero() => self.divide_by_zero(node, operator, &left)?,
					None => self.invalid(node)?,
				}
			}
			_ => self.invalid(node)?,
		};
		Ok(value)
	}

	/// Resolved type of a node.
	pub(super) fn type_of(&self, node: NodeId) -> TypeId {
		self.program.icode[node].type_spec.unwrap_or(TypeTable::UNDEFINED)
	}

	/// The variable a variable node names and the steps to the part of it the
	/// subscripts and fields select. `None` when a subscript is out of range.
	pub(super) fn locate(&mut self, node: NodeId) -> Result<Option<(EntryId, Vec<Step>)>, InterpreterError> {
		let program = self.program;
		let Variable(id) = program.icode[node].r#type else {
			return Err(anyhow!("Node {node:?} is not a variable").into());
		};

		let mut type_spec = program.symtab_stack[id].type_spec.unwrap_or(TypeTable::UNDEFINED);
		let mut steps = Vec::new();
		let mut in_range = true;
		for &suffix in program.icode.children(node) {
			match program.icode[suffix].r#type {
				Subscripts => {
					for &index in program.icode.children(suffix) {
						let TypeForm::Array { index_type, element_type, element_count } = program.types[type_spec].form
						else {
							return Err(anyhow!("Subscripted variable {id:?} is not an array").into());
						};
						let ordinal = self.evaluate(index)?.ordinal().unwrap_or_default();
						let offset = i64::from(ordinal) - i64::from(program.types.min_ordinal(index_type));
						match usize::try_from(offset) {
							Ok(offset) if offset < element_count => steps.push(Step::Index(offset)),
							_ => {
								self.flag(index, RuntimeErrorCode::ValueRange)?;
								in_range = false;
							}
						}
						type_spec = element_type;
					}
				}
				Field(Some(field)) => {
					let entry = &program.symtab_stack[field];
					steps.push(Step::Field(entry.name.clone()));
					type_spec = entry.type_spec.unwrap_or(TypeTable::UNDEFINED);
				}
				_ => return Err(anyhow!("Invalid suffix {suffix:?} on variable {id:?}").into()),
			}
		}
		Ok(in_range.then_some((id, steps)))
	}

	/// Value of a variable node. Reading storage that was never assigned is
	/// an error and gives the neutral value of the node's type.
	fn read_variable(&mut self, node: NodeId) -> Result<Value, InterpreterError> {
		let type_spec = self.type_of(node);
		let Some((id, steps)) = self.locate(node)? else {
			return Ok(self.neutral(type_spec));
		};
		match self.memory.load(id, &steps) {
			Some(Value::Uninitialized) | None => {
				self.flag(node, RuntimeErrorCode::UninitializedValue)?;
				Ok(self.neutral(type_spec))
			}
			Some(value) => Ok(value),
		}
	}

	/// Result of a division by zero: flagged, then zero of the operands' kind.
	fn divide_by_zero(
		&mut self,
		node: NodeId,
		operator: &ICodeNodeType,
		left: &Value,
	) -> Result<Value, InterpreterError> {
		self.flag(node, RuntimeErrorCode::DivisionByZero)?;
		Ok(match (operator, left) {
			(FloatDivide, _) | (_, Value::Real(_)) => Value::Real(0.0),
			_ => Value::Integer(0),
		})
	}

	/// Operands the operator cannot apply to.
	fn invalid(&mut self, node: NodeId) -> Result<Value, InterpreterError> {
		self.flag(node, RuntimeErrorCode::UnimplementedFeature)?;
		Ok(self.neutral(self.type_of(node)))
	}

	fn operand(&mut self, node: NodeId, index: usize) -> Result<Value, InterpreterError> {
		let child = self.program.icode.child(node, index).ok_or_else(|| anyhow!("Node {node:?} misses operand {index}"))?;
		self.evaluate(child)
	}

	/// The value evaluation continues with after a runtime error.
	fn neutral(&self, type_spec: TypeId) -> Value {
		let types = &self.program.types;
		if types.is_real(type_spec) {
			Value::Real(0.0)
		} else if types.is_boolean(type_spec) {
			Value::Boolean(false)
		} else if types.is_char(type_spec) {
			Value::Char(' ')
		} else if types.is_pascal_string(type_spec) {
			Value::Str(String::new())
		} else {
			Value::Integer(0)
		}
	}
}
