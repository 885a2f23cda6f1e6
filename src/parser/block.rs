use TokenType::*;

use super::{DECLARATION_START_SET, Parser, ROUTINE_START_SET, STMT_START_SET, TYPE_START_SET, VAR_START_SET};
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::*},
	intermediate::{
		icode::{ICodeNodeType, NodeId},
		symtab::{Definition, EntryId},
	},
	scanner::TokenType,
};

/// Name of the program entry when the source has no `PROGRAM` header.
const DEFAULT_PROGRAM_NAME: &str = "pascalmain";

impl Parser {
	/// `PROGRAM name [ ( file, ... ) ] ;`, optional. Enters the program
	/// identifier in the outermost scope.
	pub(super) fn program_header(&mut self) -> Result<EntryId, ParserError> {
		if self.token.r#type != TokenType::Program {
			let id = self.enter_program(DEFAULT_PROGRAM_NAME);
			return Ok(id);
		}
		self.advance()?;

		let id = if self.token.r#type == Identifier {
			let id = self.enter_program(&self.token.text.clone());
			self.symtab_stack[id].append_line_number(self.token.line);
			self.advance()?;
			id
		} else {
			self.flag(MissingIdentifier)?;
			self.enter_program(DEFAULT_PROGRAM_NAME)
		};

		// Program parameters name external files and are not used.
		if self.token.r#type == LeftParen {
			while matches!(self.advance()?, Identifier | Comma) {}
			if self.token.r#type == RightParen {
				self.advance()?;
			} else {
				self.flag(MissingRightParen)?;
			}
		}

		if self.token.r#type == Semicolon {
			self.advance()?;
		} else {
			self.flag(MissingSemicolon)?;
		}
		Ok(id)
	}

	fn enter_program(&mut self, name: &str) -> EntryId {
		let id = self.symtab_stack.enter_local(name);
		self.symtab_stack[id].definition = Definition::Program;
		self.symtab_stack.set_program_id(id);
		id
	}

	/// Declarations followed by the compound statement of a block.
	pub(super) fn block(&mut self) -> Result<NodeId, ParserError> {
		self.declarations()?;
		self.synchronize(STMT_START_SET)?;
		if self.token.r#type == Begin {
			return self.statement();
		}

		self.flag(MissingBegin)?;
		let line = self.token.line;
		let compound = self.icode.create(ICodeNodeType::Compound);
		self.icode[compound].line = Some(line);
		if STMT_START_SET.contains(self.token.r#type) {
			self.statement_list(compound, End, MissingEnd)?;
		}
		Ok(compound)
	}

	/// The `CONST`, `TYPE` and `VAR` sections, each optional, in that order.
	fn declarations(&mut self) -> Result<(), ParserError> {
		self.synchronize(DECLARATION_START_SET)?;
		if self.token.r#type == Const {
			self.advance()?;
			self.constant_definitions()?;
		}

		self.synchronize(TYPE_START_SET)?;
		if self.token.r#type == Type {
			self.advance()?;
			self.type_definitions()?;
		}

		self.synchronize(VAR_START_SET)?;
		if self.token.r#type == Var {
			self.advance()?;
			self.variable_declarations(Definition::Variable)?;
		}

		self.synchronize(ROUTINE_START_SET)
	}
}
