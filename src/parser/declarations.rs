use TokenType::*;

use super::{CONSTANT_START_SET, Parser, ROUTINE_START_SET, TYPE_START_SET, VAR_START_SET};
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::*},
	intermediate::{
		constant_type,
		symtab::{ConstantValue, Definition, EntryId},
		types::{TypeId, TypeTable},
	},
	scanner::{Token, TokenSet, TokenType, TokenValue},
};

const CONSTANT_IDENTIFIER_SET: TokenSet = TYPE_START_SET.with(&[Identifier]);
const CONSTANT_NEXT_START_SET: TokenSet = TYPE_START_SET.with(&[Semicolon, Identifier]);
const EQUALS_SET: TokenSet = CONSTANT_START_SET.with(&[Equals, Semicolon]);

const TYPE_IDENTIFIER_SET: TokenSet = VAR_START_SET.with(&[Identifier]);
const TYPE_NEXT_START_SET: TokenSet = VAR_START_SET.with(&[Semicolon, Identifier]);
const TYPE_FOLLOW_SET: TokenSet = TokenSet::of(&[Semicolon]);

const VARIABLE_IDENTIFIER_SET: TokenSet = VAR_START_SET.with(&[Identifier, End, Semicolon]);
const VARIABLE_NEXT_START_SET: TokenSet = ROUTINE_START_SET.with(&[Identifier, Semicolon]);
const IDENTIFIER_START_SET: TokenSet = TokenSet::of(&[Identifier, Comma]);
const IDENTIFIER_FOLLOW_SET: TokenSet = VAR_START_SET.with(&[Colon, Semicolon]);
const COMMA_SET: TokenSet = TokenSet::of(&[Comma, Colon, Identifier, Semicolon]);
const COLON_SET: TokenSet = TokenSet::of(&[Colon, Semicolon]);

impl Parser {
	/// `name = constant ; ...`
	pub(super) fn constant_definitions(&mut self) -> Result<(), ParserError> {
		self.synchronize(CONSTANT_IDENTIFIER_SET)?;
		while self.token.r#type == Identifier {
			let id = self.defined_identifier()?;

			self.synchronize(EQUALS_SET)?;
			if self.token.r#type == Equals {
				self.advance()?;
			} else {
				self.flag(MissingEquals)?;
			}

			let constant = self.constant()?;
			if let Some(id) = id {
				let entry = &mut self.symtab_stack[id];
				entry.definition = Definition::Constant;
				match constant {
					Some((value, type_spec)) => {
						entry.value = Some(value);
						entry.type_spec = Some(type_spec);
					}
					None => entry.type_spec = Some(TypeTable::UNDEFINED),
				}
			}

			self.definition_end(CONSTANT_NEXT_START_SET)?;
			self.synchronize(CONSTANT_IDENTIFIER_SET)?;
		}
		Ok(())
	}

	/// `name = type ; ...`
	pub(super) fn type_definitions(&mut self) -> Result<(), ParserError> {
		self.synchronize(TYPE_IDENTIFIER_SET)?;
		while self.token.r#type == Identifier {
			let id = self.defined_identifier()?;

			self.synchronize(EQUALS_SET)?;
			if self.token.r#type == Equals {
				self.advance()?;
			} else {
				self.flag(MissingEquals)?;
			}

			let type_spec = self.type_spec()?;
			if let Some(id) = id {
				self.symtab_stack[id].definition = Definition::Type;
			}
			match (id, type_spec) {
				(Some(id), Some(type_spec)) => {
					// An alias such as `count = integer` keeps the original name.
					if self.types[type_spec].identifier.is_none() {
						self.types[type_spec].identifier = Some(id);
					}
					self.symtab_stack[id].type_spec = Some(type_spec);
				}
				(id, _) => {
					if let Some(id) = id {
						self.symtab_stack[id].type_spec = Some(TypeTable::UNDEFINED);
					}
					self.synchronize(TYPE_FOLLOW_SET)?;
				}
			}

			self.definition_end(TYPE_NEXT_START_SET)?;
			self.synchronize(TYPE_IDENTIFIER_SET)?;
		}
		Ok(())
	}

	/// `name, ... : type ; ...`, declaring each name with `definition`. Also
	/// parses the field list of a record.
	pub(super) fn variable_declarations(&mut self, definition: Definition) -> Result<(), ParserError> {
		self.synchronize(VARIABLE_IDENTIFIER_SET)?;
		while self.token.r#type == Identifier {
			self.identifier_sublist(definition)?;
			self.definition_end(VARIABLE_NEXT_START_SET)?;
			self.synchronize(VARIABLE_IDENTIFIER_SET)?;
		}
		Ok(())
	}

	/// Enter the identifier being defined, unless it is already defined in
	/// the local scope. Consumes the identifier.
	fn defined_identifier(&mut self) -> Result<Option<EntryId>, ParserError> {
		let id = match self.symtab_stack.lookup_local(&self.token.text) {
			None => {
				let id = self.symtab_stack.enter_local(&self.token.text);
				self.symtab_stack[id].append_line_number(self.token.line);
				Some(id)
			}
			Some(_) => {
				self.flag(IdentifierRedefined)?;
				None
			}
		};
		self.advance()?;
		Ok(id)
	}

	/// One or more semicolons after a definition. A definition that runs
	/// straight into the next one is missing its semicolon.
	fn definition_end(&mut self, next_start_set: TokenSet) -> Result<(), ParserError> {
		if self.token.r#type == Semicolon {
			while self.advance()? == Semicolon {}
		} else if next_start_set.contains(self.token.r#type) {
			self.flag(MissingSemicolon)?;
		}
		Ok(())
	}

	fn identifier_sublist(&mut self, definition: Definition) -> Result<(), ParserError> {
		let mut sublist = Vec::new();
		loop {
			self.synchronize(IDENTIFIER_START_SET)?;
			if self.token.r#type == Identifier {
				if let Some(id) = self.defined_identifier()? {
					self.symtab_stack[id].definition = definition;
					sublist.push(id);
				}
			} else {
				self.flag(MissingIdentifier)?;
			}

			self.synchronize(COMMA_SET)?;
			if self.token.r#type == Comma {
				self.advance()?;
				if IDENTIFIER_FOLLOW_SET.contains(self.token.r#type) {
					self.flag(MissingIdentifier)?;
				}
			} else if IDENTIFIER_START_SET.contains(self.token.r#type) {
				self.flag(MissingComma)?;
			}

			if IDENTIFIER_FOLLOW_SET.contains(self.token.r#type) || self.token.r#type == Eof {
				break;
			}
		}

		let type_spec = self.declared_type()?;
		for &id in &sublist {
			self.symtab_stack[id].type_spec = Some(type_spec);
		}
		Ok(())
	}

	/// `: type`
	fn declared_type(&mut self) -> Result<TypeId, ParserError> {
		self.synchronize(COLON_SET)?;
		if self.token.r#type == Colon {
			self.advance()?;
		} else {
			self.flag(MissingColon)?;
		}
		Ok(self.type_spec()?.unwrap_or(TypeTable::UNDEFINED))
	}

	/// A constant with an optional sign: a number, a string, or the name of a
	/// constant or enumeration constant. Returns its value and type.
	pub(super) fn constant(&mut self) -> Result<Option<(ConstantValue, TypeId)>, ParserError> {
		self.synchronize(CONSTANT_START_SET)?;
		let sign = match self.token.r#type {
			Plus | Minus => {
				let sign = self.token.r#type;
				self.advance()?;
				Some(sign)
			}
			_ => None,
		};
		let negate = sign == Some(Minus);

		let token = self.token.clone();
		match (token.r#type, token.value.clone()) {
			(Identifier, _) => {
				self.advance()?;
				self.identifier_constant(&token, sign)
			}
			(IntegerLiteral, Some(TokenValue::Integer(value))) => {
				self.advance()?;
				let value = if negate { value.wrapping_neg() } else { value };
				Ok(Some((ConstantValue::Integer(value), TypeTable::INTEGER)))
			}
			(RealLiteral, Some(TokenValue::Real(value))) => {
				self.advance()?;
				let value = if negate { -value } else { value };
				Ok(Some((ConstantValue::Real(value), TypeTable::REAL)))
			}
			(StringLiteral, Some(TokenValue::String(value))) => {
				if sign.is_some() {
					self.flag(InvalidConstant)?;
				}
				self.advance()?;
				let value = ConstantValue::String(value);
				let type_spec = constant_type(&value, &mut self.types);
				Ok(Some((value, type_spec)))
			}
			_ => {
				self.flag(InvalidConstant)?;
				Ok(None)
			}
		}
	}

	/// A constant named by an identifier that has already been consumed.
	fn identifier_constant(
		&mut self,
		token: &Token,
		sign: Option<TokenType>,
	) -> Result<Option<(ConstantValue, TypeId)>, ParserError> {
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

		let negate = sign == Some(Minus);
		let value = match value {
			Some(ConstantValue::Integer(value)) if definition == Definition::Constant => {
				ConstantValue::Integer(if negate { value.wrapping_neg() } else { value })
			}
			Some(ConstantValue::Real(value)) => ConstantValue::Real(if negate { -value } else { value }),
			Some(value) => {
				if sign.is_some() {
					self.flag_at(token, InvalidConstant)?;
				}
				value
			}
			None => return Ok(None),
		};
		Ok(Some((value, type_spec)))
	}
}
