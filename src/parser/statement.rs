use std::collections::HashSet;

use TokenType::*;

use super::{EXPR_START_SET, Parser, STMT_FOLLOW_SET, STMT_START_SET};
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::{self, *}},
	intermediate::{
		icode::{ICodeNodeType, NodeId},
		symtab::{ConstantValue, Definition},
		types::{TypeId, TypeTable},
	},
	scanner::{Token, TokenSet, TokenType, TokenValue},
};

const COLON_EQUALS_SET: TokenSet = EXPR_START_SET.with(&[ColonEquals]).union(STMT_FOLLOW_SET);
const THEN_SET: TokenSet = STMT_START_SET.with(&[Then]).union(STMT_FOLLOW_SET);
const DO_SET: TokenSet = STMT_START_SET.with(&[Do]).union(STMT_FOLLOW_SET);
const TO_DOWNTO_SET: TokenSet = EXPR_START_SET.with(&[To, Downto]).union(STMT_FOLLOW_SET);

const CASE_CONSTANT_START_SET: TokenSet = TokenSet::of(&[Identifier, IntegerLiteral, Plus, Minus, StringLiteral]);
const OF_SET: TokenSet = CASE_CONSTANT_START_SET.with(&[Of]).union(STMT_FOLLOW_SET);
const CASE_COMMA_SET: TokenSet =
	CASE_CONSTANT_START_SET.with(&[Comma, Colon]).union(STMT_START_SET).union(STMT_FOLLOW_SET);

impl Parser {
	/// Any statement. The node carries the line the statement starts on.
	pub(super) fn statement(&mut self) -> Result<NodeId, ParserError> {
		let line = self.token.line;
		let node = match self.token.r#type {
			Begin => self.compound_statement()?,
			Identifier => self.assignment_statement()?,
			If => self.if_statement()?,
			Case => self.case_statement()?,
			While => self.while_statement()?,
			Repeat => self.repeat_statement()?,
			For => self.for_statement()?,
			_ => self.icode.create(ICodeNodeType::NoOp),
		};
		self.icode[node].line = Some(line);
		Ok(node)
	}

	/// Statements separated by semicolons up to `terminator`, which is
	/// consumed. Each statement becomes a child of `parent`.
	pub(super) fn statement_list(
		&mut self,
		parent: NodeId,
		terminator: TokenType,
		code: SyntaxErrorCode,
	) -> Result<(), ParserError> {
		while !matches!(self.token.r#type, Eof) && self.token.r#type != terminator {
			let statement = self.statement()?;
			self.icode.add_child(parent, statement);

			match self.token.r#type {
				Semicolon => {
					self.advance()?;
				}
				Identifier => self.flag(MissingSemicolon)?,
				r#type if r#type != terminator => {
					self.flag(UnexpectedToken)?;
					self.advance()?;
				}
				_ => {}
			}
		}

		if self.token.r#type == terminator {
			self.advance()?;
		} else {
			self.flag(code)?;
		}
		Ok(())
	}

	/// `BEGIN statement ; ... END`
	fn compound_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let compound = self.icode.create(ICodeNodeType::Compound);
		self.statement_list(compound, End, MissingEnd)?;
		Ok(compound)
	}

	fn assignment_statement(&mut self) -> Result<NodeId, ParserError> { Ok(self.assignment()?.0) }

	/// `variable := expression`. Returns the assign node and its target.
	fn assignment(&mut self) -> Result<(NodeId, NodeId), ParserError> {
		let assign = self.icode.create(ICodeNodeType::Assign);
		let target = self.variable()?;
		let target_type = self.type_of(target);
		self.icode.add_child(assign, target);

		self.synchronize(COLON_EQUALS_SET)?;
		if self.token.r#type == ColonEquals {
			self.advance()?;
		} else {
			self.flag(MissingColonEquals)?;
		}

		let token = self.token.clone();
		let expression = self.expression()?;
		let expression_type = self.type_of(expression);
		self.icode.add_child(assign, expression);
		if !self.types.are_assignment_compatible(target_type, expression_type) {
			self.flag_at(&token, IncompatibleTypes)?;
		}
		self.icode[assign].type_spec = Some(target_type);
		Ok((assign, target))
	}

	/// Parse a condition and check that it is boolean.
	fn condition(&mut self) -> Result<NodeId, ParserError> {
		let token = self.token.clone();
		let condition = self.expression()?;
		if !self.types.is_boolean(self.type_of(condition)) {
			self.flag_at(&token, IncompatibleTypes)?;
		}
		Ok(condition)
	}

	/// `IF condition THEN statement [ ELSE statement ]`
	fn if_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let node = self.icode.create(ICodeNodeType::If);
		let condition = self.condition()?;
		self.icode.add_child(node, condition);

		self.synchronize(THEN_SET)?;
		if self.token.r#type == Then {
			self.advance()?;
		} else {
			self.flag(MissingThen)?;
		}
		let then_statement = self.statement()?;
		self.icode.add_child(node, then_statement);

		if self.token.r#type == Else {
			self.advance()?;
			let else_statement = self.statement()?;
			self.icode.add_child(node, else_statement);
		}
		Ok(node)
	}

	/// `WHILE condition DO statement`, as a loop whose test exits once the
	/// condition is false.
	fn while_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let loop_node = self.icode.create(ICodeNodeType::Loop);
		let test = self.icode.create(ICodeNodeType::Test);
		let not = self.icode.create_typed(ICodeNodeType::Not, TypeTable::BOOLEAN);
		let condition = self.condition()?;
		self.icode.add_child(not, condition);
		self.icode.add_child(test, not);
		self.icode.add_child(loop_node, test);

		self.synchronize(DO_SET)?;
		if self.token.r#type == Do {
			self.advance()?;
		} else {
			self.flag(MissingDo)?;
		}
		let body = self.statement()?;
		self.icode.add_child(loop_node, body);
		Ok(loop_node)
	}

	/// `REPEAT statement ; ... UNTIL condition`, as a loop with its test last.
	fn repeat_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let loop_node = self.icode.create(ICodeNodeType::Loop);
		self.statement_list(loop_node, Until, MissingUntil)?;

		let test = self.icode.create(ICodeNodeType::Test);
		let condition = self.condition()?;
		self.icode.add_child(test, condition);
		self.icode.add_child(loop_node, test);
		Ok(loop_node)
	}

	/// `FOR control := initial TO|DOWNTO final DO statement`, as
	///
	/// ``` text
	/// (compound (:= control initial)
	///           (loop (test (> control final)) statement (:= control (+ control 1))))
	/// ```
	///
	/// with `<` and `-` for `DOWNTO`.
	fn for_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let target_token = self.token.clone();

		let compound = self.icode.create(ICodeNodeType::Compound);
		let loop_node = self.icode.create(ICodeNodeType::Loop);
		let test = self.icode.create(ICodeNodeType::Test);

		let (initial, control) = self.assignment()?;
		let control_type = self.type_of(control);
		if !self.types.is_integer(control_type) && !self.types.is_enumeration(control_type) {
			self.flag_at(&target_token, IncompatibleTypes)?;
		}
		self.icode[initial].line = Some(target_token.line);
		self.icode.add_child(compound, initial);
		self.icode.add_child(compound, loop_node);

		self.synchronize(TO_DOWNTO_SET)?;
		let up = match self.token.r#type {
			To | Downto => {
				let up = self.token.r#type == To;
				self.advance()?;
				up
			}
			_ => {
				self.flag(MissingToDownto)?;
				true
			}
		};

		let relation = if up { ICodeNodeType::Gt } else { ICodeNodeType::Lt };
		let relation = self.icode.create_typed(relation, TypeTable::BOOLEAN);
		let control_copy = self.icode.copy(control);
		self.icode.add_child(relation, control_copy);
		let token = self.token.clone();
		let bound = self.expression()?;
		self.icode.add_child(relation, bound);
		if !self.types.are_assignment_compatible(control_type, self.type_of(bound)) {
			self.flag_at(&token, IncompatibleTypes)?;
		}
		self.icode.add_child(test, relation);
		self.icode.add_child(loop_node, test);

		self.synchronize(DO_SET)?;
		if self.token.r#type == Do {
			self.advance()?;
		} else {
			self.flag(MissingDo)?;
		}
		let body = self.statement()?;
		self.icode.add_child(loop_node, body);

		let step = self.icode.create(ICodeNodeType::Assign);
		self.icode[step].line = Some(target_token.line);
		self.icode[step].type_spec = Some(control_type);
		let control_copy = self.icode.copy(control);
		self.icode.add_child(step, control_copy);
		let arithmetic = if up { ICodeNodeType::Add } else { ICodeNodeType::Subtract };
		let arithmetic = self.icode.create_typed(arithmetic, control_type);
		let control_copy = self.icode.copy(control);
		self.icode.add_child(arithmetic, control_copy);
		let one = self.icode.create_typed(ICodeNodeType::IntegerConstant(1), TypeTable::INTEGER);
		self.icode.add_child(arithmetic, one);
		self.icode.add_child(step, arithmetic);
		self.icode.add_child(loop_node, step);

		Ok(compound)
	}

	/// `CASE selector OF constant, ... : statement ; ... END`
	fn case_statement(&mut self) -> Result<NodeId, ParserError> {
		self.advance()?;
		let select = self.icode.create(ICodeNodeType::Select);
		let token = self.token.clone();
		let selector = self.expression()?;
		let selector_type = self.type_of(selector);
		let types = &self.types;
		if !types.is_integer(selector_type) && !types.is_char(selector_type) && !types.is_enumeration(selector_type) {
			self.flag_at(&token, IncompatibleTypes)?;
		}
		self.icode.add_child(select, selector);

		self.synchronize(OF_SET)?;
		if self.token.r#type == Of {
			self.advance()?;
		} else {
			self.flag(MissingOf)?;
		}

		let mut constants = HashSet::new();
		while !matches!(self.token.r#type, Eof | End) {
			let branch = self.case_branch(selector_type, &mut constants)?;
			self.icode.add_child(select, branch);

			match self.token.r#type {
				Semicolon => {
					self.advance()?;
				}
				r#type if CASE_CONSTANT_START_SET.contains(r#type) => self.flag(MissingSemicolon)?,
				Eof | End => {}
				_ => {
					self.flag(UnexpectedToken)?;
					self.advance()?;
				}
			}
		}

		if self.token.r#type == End {
			self.advance()?;
		} else {
			self.flag(MissingEnd)?;
		}
		Ok(select)
	}

	/// `constant, ... : statement`
	fn case_branch(&mut self, selector_type: TypeId, constants: &mut HashSet<i32>) -> Result<NodeId, ParserError> {
		let branch = self.icode.create(ICodeNodeType::SelectBranch);
		let constants_node = self.icode.create(ICodeNodeType::SelectConstants);
		self.icode.add_child(branch, constants_node);

		while CASE_CONSTANT_START_SET.contains(self.token.r#type) {
			if let Some(constant) = self.case_constant(selector_type, constants)? {
				self.icode.add_child(constants_node, constant);
			}

			self.synchronize(CASE_COMMA_SET)?;
			if self.token.r#type == Comma {
				self.advance()?;
			} else if CASE_CONSTANT_START_SET.contains(self.token.r#type) {
				self.flag(MissingComma)?;
			}
		}

		if self.token.r#type == Colon {
			self.advance()?;
		} else {
			self.flag(MissingColon)?;
		}
		let statement = self.statement()?;
		self.icode.add_child(branch, statement);
		Ok(branch)
	}

	/// One branch constant. Its ordinal must not have been used by an earlier
	/// branch of the same statement.
	fn case_constant(
		&mut self,
		selector_type: TypeId,
		constants: &mut HashSet<i32>,
	) -> Result<Option<NodeId>, ParserError> {
		self.synchronize(CASE_CONSTANT_START_SET)?;
		let sign = match self.token.r#type {
			Plus | Minus => {
				let sign = self.token.r#type;
				self.advance()?;
				Some(sign)
			}
			_ => None,
		};

		let token = self.token.clone();
		let constant = match (token.r#type, &token.value) {
			(Identifier, _) => self.case_identifier_constant(&token, sign)?,
			(IntegerLiteral, Some(TokenValue::Integer(value))) => {
				let value = if sign == Some(Minus) { value.wrapping_neg() } else { *value };
				Some((ICodeNodeType::IntegerConstant(value), value, TypeTable::INTEGER))
			}
			(StringLiteral, Some(TokenValue::String(text))) => self.case_char_constant(&token, text, sign)?,
			_ => {
				self.flag(InvalidConstant)?;
				None
			}
		};

		let node = match constant {
			Some((r#type, ordinal, type_spec)) => {
				if !self.types.are_comparison_compatible(selector_type, type_spec) {
					self.flag_at(&token, IncompatibleTypes)?;
				}
				if !constants.insert(ordinal) {
					self.flag_at(&token, CaseConstantReused)?;
				}
				Some(self.icode.create_typed(r#type, type_spec))
			}
			None => None,
		};
		self.advance()?;
		Ok(node)
	}

	fn case_char_constant(
		&mut self,
		token: &Token,
		text: &str,
		sign: Option<TokenType>,
	) -> Result<Option<(ICodeNodeType, i32, TypeId)>, ParserError> {
		let mut chars = text.chars();
		match (sign, chars.next(), chars.next()) {
			(None, Some(c), None) => Ok(Some((ICodeNodeType::StringConstant(text.to_string()), c as i32, TypeTable::CHAR))),
			_ => {
				self.flag_at(token, InvalidConstant)?;
				Ok(None)
			}
		}
	}

	/// A branch constant named by a constant or enumeration constant.
	fn case_identifier_constant(
		&mut self,
		token: &Token,
		sign: Option<TokenType>,
	) -> Result<Option<(ICodeNodeType, i32, TypeId)>, ParserError> {
		let Some(id) = self.symtab_stack.lookup(&token.text) else {
			self.flag_at(token, IdentifierUndefined)?;
			return Ok(None);
		};
		let entry = &self.symtab_stack[id];
		let (definition, value) = (entry.definition, entry.value.clone());
		let type_spec = entry.type_spec.unwrap_or(TypeTable::UNDEFINED);
		if !matches!(definition, Definition::Constant | Definition::EnumerationConstant) {
			self.flag_at(token, NotConstantIdentifier)?;
			return Ok(None);
		}
		self.symtab_stack[id].append_line_number(token.line);

		match value {
			Some(ConstantValue::Integer(value)) if definition == Definition::Constant => {
				let value = if sign == Some(Minus) { value.wrapping_neg() } else { value };
				Ok(Some((ICodeNodeType::IntegerConstant(value), value, type_spec)))
			}
			Some(ConstantValue::Integer(value)) if sign.is_none() => {
				Ok(Some((ICodeNodeType::IntegerConstant(value), value, type_spec)))
			}
			Some(ConstantValue::String(text)) => self.case_char_constant(token, &text, sign),
			_ => {
				self.flag_at(token, InvalidConstant)?;
				Ok(None)
			}
		}
	}
}
