use TokenType::*;

use super::Parser;
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::*},
	intermediate::{
		icode::{ICodeNodeType, NodeId},
		symtab::{Definition, EntryId},
		types::{TypeForm, TypeId, TypeTable},
	},
	scanner::{TokenSet, TokenType},
};

const RIGHT_BRACKET_SET: TokenSet = TokenSet::of(&[RightBracket, Equals, Semicolon]);

impl Parser {
	/// A variable on the left of an assignment. An undefined name is flagged
	/// and entered locally so it is reported only once.
	pub(super) fn variable(&mut self) -> Result<NodeId, ParserError> {
		if self.token.r#type != Identifier {
			self.flag(MissingIdentifier)?;
			return Ok(self.icode.create_typed(ICodeNodeType::NoOp, TypeTable::UNDEFINED));
		}
		let id = self.resolve_identifier()?;
		self.variable_of(id)
	}

	/// Look up the current identifier, entering it with an undefined type when
	/// it is unknown.
	pub(super) fn resolve_identifier(&mut self) -> Result<EntryId, ParserError> {
		if let Some(id) = self.symtab_stack.lookup(&self.token.text) {
			return Ok(id);
		}
		self.flag(IdentifierUndefined)?;
		let id = self.symtab_stack.enter_local(&self.token.text);
		self.symtab_stack[id].type_spec = Some(TypeTable::UNDEFINED);
		Ok(id)
	}

	/// `name { [ index, ... ] | . field }`, with the current token on `name`.
	pub(super) fn variable_of(&mut self, id: EntryId) -> Result<NodeId, ParserError> {
		let definition = self.symtab_stack[id].definition;
		if !matches!(
			definition,
			Definition::Variable | Definition::ValueParameter | Definition::VarParameter | Definition::Undefined
		) {
			self.flag(InvalidIdentifierUsage)?;
		}
		self.symtab_stack[id].append_line_number(self.token.line);

		let variable = self.icode.create(ICodeNodeType::Variable(id));
		let mut type_spec = self.symtab_stack[id].type_spec.unwrap_or(TypeTable::UNDEFINED);
		self.advance()?;

		loop {
			let suffix = match self.token.r#type {
				LeftBracket => self.subscripts(type_spec)?,
				Dot => self.field(type_spec)?,
				_ => break,
			};
			type_spec = self.type_of(suffix);
			self.icode.add_child(variable, suffix);
		}

		self.icode[variable].type_spec = Some(type_spec);
		Ok(variable)
	}

	/// `[ index, ... ]` on a value of `type_spec`. Each index peels off one
	/// array level; the node is typed with what remains.
	fn subscripts(&mut self, mut type_spec: TypeId) -> Result<NodeId, ParserError> {
		let subscripts = self.icode.create(ICodeNodeType::Subscripts);
		loop {
			self.advance()?;
			let token = self.token.clone();
			let index = self.expression()?;
			let index_of = self.type_of(index);

			match self.types[type_spec].form {
				TypeForm::Array { index_type, element_type, .. } => {
					if !self.types.are_assignment_compatible(index_type, index_of) {
						self.flag_at(&token, IncompatibleTypes)?;
					}
					self.icode.add_child(subscripts, index);
					type_spec = element_type;
				}
				_ => {
					self.flag_at(&token, TooManySubscripts)?;
					type_spec = TypeTable::UNDEFINED;
				}
			}

			if self.token.r#type != Comma {
				break;
			}
		}

		self.synchronize(RIGHT_BRACKET_SET)?;
		if self.token.r#type == RightBracket {
			self.advance()?;
		} else {
			self.flag(MissingRightBracket)?;
		}
		self.icode[subscripts].type_spec = Some(type_spec);
		Ok(subscripts)
	}

	/// `. field` on a value of `type_spec`.
	fn field(&mut self, type_spec: TypeId) -> Result<NodeId, ParserError> {
		self.advance()?;
		let token = self.token.clone();

		let id = match &self.types[type_spec].form {
			TypeForm::Record { fields } if token.r#type == Identifier => fields.lookup(&token.text),
			_ => None,
		};
		let field_type = match id {
			Some(id) => {
				self.symtab_stack[id].append_line_number(token.line);
				self.symtab_stack[id].type_spec.unwrap_or(TypeTable::UNDEFINED)
			}
			None => {
				self.flag(InvalidField)?;
				TypeTable::UNDEFINED
			}
		};

		if token.r#type == Identifier {
			self.advance()?;
		}
		Ok(self.icode.create_typed(ICodeNodeType::Field(id), field_type))
	}
}
