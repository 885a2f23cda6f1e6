//! The intermediate tree the parser builds and the executor walks.
//!
//! Nodes live in an [`ICode`] arena and are named by [`NodeId`]. A node owns
//! its children through their ids; the parent id is kept only so a runtime
//! error can be traced back to the statement line that caused it.
//!
//! Statement shapes:
//!
//! ``` markdown
//! compound        children are the statements
//! assign          target variable, expression
//! loop            statements and tests; exits when a test is true
//! test            condition
//! if              condition, then statement, optional else statement
//! select          selector, then one select-branch per case branch
//! select-branch   select-constants, statement
//! ```
//!
//! `for`, `while` and `repeat` are all expressed with `loop` and `test`.

use std::{fmt, ops::{Index, IndexMut}};

use super::{symtab::{EntryId, SymTabStack}, types::TypeId};

/// Handle of an [`ICodeNode`] in its [`ICode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a node is, with the data that kind of node carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ICodeNodeType {
	// Statements
	Compound,
	Assign,
	Loop,
	Test,
	If,
	Select,
	SelectBranch,
	SelectConstants,
	NoOp,

	// Operands. Children of a variable are its subscripts and fields.
	Variable(EntryId),
	/// `None` when the field name did not resolve
	Field(Option<EntryId>),
	Subscripts,
	IntegerConstant(i32),
	RealConstant(f64),
	StringConstant(String),

	// Operators
	Negate,
	Not,
	Add,
	Subtract,
	Multiply,
	FloatDivide,
	IntegerDivide,
	Mod,
	And,
	Or,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

#[derive(Debug, Clone)]
pub struct ICodeNode {
	pub r#type:    ICodeNodeType,
	pub parent:    Option<NodeId>,
	pub children:  Vec<NodeId>,
	/// Source line of the statement this node starts
	pub line:      Option<usize>,
	/// Resolved type of an expression node
	pub type_spec: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ICode {
	nodes: Vec<ICodeNode>,
	root:  Option<NodeId>,
}

impl ICode {
	pub fn create(&mut self, r#type: ICodeNodeType) -> NodeId {
		self.nodes.push(ICodeNode { r#type, parent: None, children: Vec::new(), line: None, type_spec: None });
		NodeId(self.nodes.len() - 1)
	}

	/// Create a node with its resolved type already set.
	pub fn create_typed(&mut self, r#type: ICodeNodeType, type_spec: TypeId) -> NodeId {
		let id = self.create(r#type);
		self[id].type_spec = Some(type_spec);
		id
	}

	/// Append `child` to `parent` and return `child`.
	pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
		self[child].parent = Some(parent);
		self[parent].children.push(child);
		child
	}

	/// A childless, parentless copy of `id`.
	pub fn copy(&mut self, id: NodeId) -> NodeId {
		let ICodeNode { r#type, line, type_spec, .. } = self[id].clone();
		let copy = self.create(r#type);
		self[copy].line = line;
		self[copy].type_spec = type_spec;
		copy
	}

	pub fn root(&self) -> Option<NodeId> { self.root }

	pub fn set_root(&mut self, root: NodeId) { self.root = Some(root); }

	pub fn children(&self, id: NodeId) -> &[NodeId] { &self[id].children }

	pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> { self[id].children.get(index).copied() }

	/// Line of the nearest node, `id` itself or an ancestor, that has one.
	pub fn line_of(&self, id: NodeId) -> Option<usize> {
		let mut current = Some(id);
		while let Some(node) = current {
			if let Some(line) = self[node].line {
				return Some(line);
			}
			current = self[node].parent;
		}
		None
	}

	pub fn len(&self) -> usize { self.nodes.len() }

	pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

	/// Render `id` and its subtree as an S-expression, naming variables and
	/// fields through `symtab_stack`.
	pub fn display<'a>(&'a self, id: NodeId, symtab_stack: &'a SymTabStack) -> ICodeDisplay<'a> {
		ICodeDisplay { icode: self, symtab_stack, id }
	}
}

impl Index<NodeId> for ICode {
	type Output = ICodeNode;

	fn index(&self, id: NodeId) -> &Self::Output { &self.nodes[id.0] }
}

impl IndexMut<NodeId> for ICode {
	fn index_mut(&mut self, id: NodeId) -> &mut Self::Output { &mut self.nodes[id.0] }
}

pub struct ICodeDisplay<'a> {
	icode:        &'a ICode,
	symtab_stack: &'a SymTabStack,
	id:           NodeId,
}

impl fmt::Display for ICodeDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use ICodeNodeType::*;
		let node = &self.icode[self.id];
		let name = |id: EntryId| self.symtab_stack[id].name.as_str();
		let label = match &node.r#type {
			Compound => "compound",
			Assign => ":=",
			Loop => "loop",
			Test => "test",
			If => "if",
			Select => "select",
			SelectBranch => "branch",
			SelectConstants => "constants",
			NoOp => return write!(f, "no-op"),
			Variable(id) if node.children.is_empty() => return write!(f, "{}", name(*id)),
			Variable(id) => name(*id),
			Field(Some(id)) => return write!(f, ".{}", name(*id)),
			Field(None) => return write!(f, ".?"),
			Subscripts => "[]",
			IntegerConstant(value) => return write!(f, "{value}"),
			RealConstant(value) => return write!(f, "{value:?}"),
			StringConstant(value) => return write!(f, "'{}'", value.replace('\'', "''")),
			Negate => "-",
			Not => "not",
			Add => "+",
			Subtract => "-",
			Multiply => "*",
			FloatDivide => "/",
			IntegerDivide => "div",
			Mod => "mod",
			And => "and",
			Or => "or",
			Eq => "=",
			Ne => "<>",
			Lt => "<",
			Le => "<=",
			Gt => ">",
			Ge => ">=",
		};
		write!(f, "({label}")?;
		for &child in &node.children {
			write!(f, " {}", self.icode.display(child, self.symtab_stack))?;
		}
		write!(f, ")")
	}
}

#[cfg(test)]
mod tests {
	use super::{ICodeNodeType::*, *};
	use crate::intermediate::types::TypeTable;

	fn add(icode: &mut ICode, parent: NodeId, r#type: ICodeNodeType) -> NodeId {
		let child = icode.create(r#type);
		icode.add_child(parent, child)
	}

	#[test]
	fn children_know_their_parent() {
		let mut icode = ICode::default();
		let assign = icode.create(Assign);
		let one = add(&mut icode, assign, IntegerConstant(1));
		assert_eq!(icode[one].parent, Some(assign));
		assert_eq!(icode.children(assign), &[one]);
		assert_eq!(icode.child(assign, 1), None);
	}

	#[test]
	fn line_comes_from_nearest_statement() {
		let mut icode = ICode::default();
		let compound = icode.create(Compound);
		icode[compound].line = Some(1);
		let assign = add(&mut icode, compound, Assign);
		let sum = add(&mut icode, assign, Add);
		assert_eq!(icode.line_of(sum), Some(1));
		icode[assign].line = Some(4);
		assert_eq!(icode.line_of(sum), Some(4));
		let orphan = icode.create(NoOp);
		assert_eq!(icode.line_of(orphan), None);
	}

	#[test]
	fn copy_drops_children_and_parent() {
		let mut icode = ICode::default();
		let mut stack = SymTabStack::new();
		let id = stack.enter_local("i");
		let parent = icode.create(Assign);
		let variable = icode.create_typed(Variable(id), TypeTable::INTEGER);
		icode.add_child(parent, variable);
		add(&mut icode, variable, Subscripts);
		let copy = icode.copy(variable);
		assert_eq!(icode[copy].r#type, Variable(id));
		assert_eq!(icode[copy].type_spec, Some(TypeTable::INTEGER));
		assert!(icode.children(copy).is_empty());
		assert_eq!(icode[copy].parent, None);
		assert_eq!(icode.display(copy, &stack).to_string(), "i");
	}

	#[test]
	fn display_as_s_expression() {
		let mut icode = ICode::default();
		let mut stack = SymTabStack::new();
		let x = stack.enter_local("x");
		let assign = icode.create(Assign);
		add(&mut icode, assign, Variable(x));
		let sum = add(&mut icode, assign, Add);
		add(&mut icode, sum, RealConstant(1.0));
		add(&mut icode, sum, StringConstant("it's".to_string()));
		assert_eq!(icode.display(assign, &stack).to_string(), "(:= x (+ 1.0 'it''s'))");
	}
}
