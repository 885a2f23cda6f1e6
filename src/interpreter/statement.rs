use std::collections::HashMap;

use anyhow::anyhow;
use tracing::{debug, trace};

use super::{Executor, value::Value};
use crate::{
	error::interpreter::{InterpreterError, RuntimeErrorCode},
	intermediate::icode::{ICodeNodeType, NodeId},
	message::Message,
};

impl Executor<'_> {
	/// Execute one statement node. Every statement counts once, and one that
	/// starts a source line announces it first.
	pub(super) fn execute_statement(&mut self, node: NodeId) -> Result<(), InterpreterError> {
		let program = self.program;
		if let Some(line) = program.icode[node].line {
			self.messages.borrow_mut().send(Message::ExecutingLine(line));
		}
		self.execution_count += 1;

		match program.icode[node].r#type {
			ICodeNodeType::Compound => {
				for &child in program.icode.children(node) {
					self.execute_statement(child)?;
				}
			}
			ICodeNodeType::Assign => self.execute_assign(node)?,
			ICodeNodeType::Loop => self.execute_loop(node)?,
			ICodeNodeType::If => self.execute_if(node)?,
			ICodeNodeType::Select => self.execute_select(node)?,
			ICodeNodeType::NoOp => {}
			_ => self.flag(node, RuntimeErrorCode::UnimplementedFeature)?,
		}
		Ok(())
	}

	fn execute_assign(&mut self, node: NodeId) -> Result<(), InterpreterError> {
		let program = self.program;
		let (target, expression) = match program.icode.children(node) {
			&[target, expression] => (target, expression),
			_ => return Err(anyhow!("Assignment node {node:?} needs a target and a value").into()),
		};

		let value = self.evaluate(expression)?;
		let target_type = self.type_of(target);
		let value = match value {
			Value::Integer(n) if program.types.is_real(target_type) => Value::Real(f64::from(n)),
			Value::Str(text) => Value::chars(&text),
			value => value,
		};

		if let Some((id, steps)) = self.locate(target)? {
			trace!(variable = %program.symtab_stack[id].name, value = %value, "assign");
			if !self.memory.store(id, &steps, value) {
				return Err(anyhow!("Variable {id:?} cannot hold a part at {steps:?}").into());
			}
		}
		Ok(())
	}

	/// Run the children in order, over and over, until a test child is true.
	fn execute_loop(&mut self, node: NodeId) -> Result<(), InterpreterError> {
		let program = self.program;
		loop {
			for &child in program.icode.children(node) {
				if program.icode[child].r#type != ICodeNodeType::Test {
					self.execute_statement(child)?;
					continue;
				}
				let condition = program.icode.child(child, 0).ok_or_else(|| anyhow!("Test node {child:?} is empty"))?;
				if self.condition(condition)? {
					return Ok(());
				}
			}
		}
	}

	fn execute_if(&mut self, node: NodeId) -> Result<(), InterpreterError> {
		let program = self.program;
		let children = program.icode.children(node);
		let condition = *children.first().ok_or_else(|| anyhow!("If node {node:?} has no condition"))?;
		let branch = if self.condition(condition)? { children.get(1) } else { children.get(2) };
		if let Some(&branch) = branch {
			self.execute_statement(branch)?;
		}
		Ok(())
	}

	/// Evaluate the selector and jump straight to the branch its value picks.
	/// A value no branch names does nothing.
	fn execute_select(&mut self, node: NodeId) -> Result<(), InterpreterError> {
		let program = self.program;
		let selector = program.icode.child(node, 0).ok_or_else(|| anyhow!("Select node {node:?} has no selector"))?;
		let value = self.evaluate(selector)?;
		let Some(ordinal) = value.ordinal() else {
			return self.flag(selector, RuntimeErrorCode::InvalidCaseExpressionValue);
		};

		if !self.jump_tables.contains_key(&node) {
			let table = self.jump_table(node)?;
			self.jump_tables.insert(node, table);
		}
		let branch = self.jump_tables.get(&node).and_then(|table| table.get(&ordinal)).copied();
		if let Some(branch) = branch {
			self.execute_statement(branch)?;
		}
		Ok(())
	}

	/// Map every branch constant of a select node to its branch statement.
	fn jump_table(&self, node: NodeId) -> Result<HashMap<i32, NodeId>, InterpreterError> {
		let icode = &self.program.icode;
		let mut table = HashMap::new();
		for &branch in icode.children(node).iter().skip(1) {
			let (constants, statement) = match icode.children(branch) {
				&[constants, statement] => (constants, statement),
				_ => return Err(anyhow!("Select branch {branch:?} needs constants and a statement").into()),
			};
			for &constant in icode.children(constants) {
				let ordinal = match &icode[constant].r#type {
					ICodeNodeType::IntegerConstant(value) => *value,
					ICodeNodeType::StringConstant(text) => text.chars().next().map_or(0, |c| c as i32),
					other => return Err(anyhow!("Invalid select constant {other:?}").into()),
				};
				table.entry(ordinal).or_insert(statement);
			}
		}
		debug!(?node, entries = table.len(), "built jump table");
		Ok(table)
	}

	/// Evaluate a condition; anything but a boolean counts as false.
	fn condition(&mut self, node: NodeId) -> Result<bool, InterpreterError> {
		Ok(self.evaluate(node)?.as_bool().unwrap_or(false))
	}
}
