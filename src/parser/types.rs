use TokenType::*;

use super::{CONSTANT_START_SET, Parser, VAR_START_SET};
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::*},
	intermediate::{
		symtab::{ConstantValue, Definition},
		types::{TypeForm, TypeId, TypeTable},
	},
	scanner::{TokenSet, TokenType},
};

const SIMPLE_START_SET: TokenSet = CONSTANT_START_SET.with(&[LeftParen, Comma, Semicolon]);
const TYPE_START_SET: TokenSet = SIMPLE_START_SET.with(&[Array, Record, Semicolon]);

const ENUM_CONSTANT_START_SET: TokenSet = TokenSet::of(&[Identifier, Semicolon]);
const ENUM_DEFINITION_FOLLOW_SET: TokenSet = VAR_START_SET.with(&[RightParen, Semicolon]);

const LEFT_BRACKET_SET: TokenSet = SIMPLE_START_SET.with(&[LeftBracket, RightBracket]);
const RIGHT_BRACKET_SET: TokenSet = TokenSet::of(&[RightBracket, Of, Semicolon]);
const OF_SET: TokenSet = TYPE_START_SET.with(&[Of, Semicolon]);
const INDEX_START_SET: TokenSet = SIMPLE_START_SET.with(&[Comma]);
const INDEX_FOLLOW_SET: TokenSet = INDEX_START_SET.union(RIGHT_BRACKET_SET);

const RECORD_END_SET: TokenSet = VAR_START_SET.with(&[End, Semicolon]);

impl Parser {
	/// Any type specification. `None` when no type could be made out; the
	/// error has been flagged.
	pub(super) fn type_spec(&mut self) -> Result<Option<TypeId>, ParserError> {
		self.synchronize(TYPE_START_SET)?;
		match self.token.r#type {
			Array => self.array_type(),
			Record => self.record_type(),
			_ => self.simple_type(),
		}
	}

	/// A type identifier, an enumeration or a subrange.
	fn simple_type(&mut self) -> Result<Option<TypeId>, ParserError> {
		self.synchronize(SIMPLE_START_SET)?;
		match self.token.r#type {
			Identifier => {
				let Some(id) = self.symtab_stack.lookup(&self.token.text) else {
					self.flag(IdentifierUndefined)?;
					self.advance()?;
					return Ok(None);
				};
				match self.symtab_stack[id].definition {
					Definition::Type => {
						self.symtab_stack[id].append_line_number(self.token.line);
						self.advance()?;
						Ok(self.symtab_stack[id].type_spec)
					}
					Definition::Constant | Definition::EnumerationConstant => self.subrange_type(),
					_ => {
						self.flag(NotTypeIdentifier)?;
						self.advance()?;
						Ok(None)
					}
				}
			}
			LeftParen => self.enumeration_type(),
			Comma | Semicolon => {
				self.flag(InvalidType)?;
				Ok(None)
			}
			_ => self.subrange_type(),
		}
	}

	/// `min .. max`
	fn subrange_type(&mut self) -> Result<Option<TypeId>, ParserError> {
		let min_token = self.token.clone();
		let (min, min_type) = self.subrange_limit()?;

		let saw_dot_dot = self.token.r#type == DotDot;
		if saw_dot_dot {
			self.advance()?;
		}

		let mut max = None;
		if CONSTANT_START_SET.contains(self.token.r#type) {
			if !saw_dot_dot {
				self.flag(MissingDotDot)?;
			}
			self.synchronize(CONSTANT_START_SET)?;
			let max_token = self.token.clone();
			let (max_value, max_type) = self.subrange_limit()?;
			match (min_type, max_type, min, max_value) {
				(Some(min_type), Some(max_type), ..) if min_type != max_type => {
					self.flag_at(&max_token, InvalidSubrangeType)?
				}
				(Some(_), Some(_), Some(min), Some(max)) if min > max => self.flag_at(&max_token, MinGtMax)?,
				(Some(_), Some(_), ..) => {}
				_ => self.flag_at(&max_token, IncompatibleTypes)?,
			}
			max = max_value;
		} else {
			self.flag_at(&min_token, InvalidSubrangeType)?;
		}

		let base_type = min_type.unwrap_or(TypeTable::UNDEFINED);
		let min = min.unwrap_or(0);
		let max = max.unwrap_or(min);
		Ok(Some(self.types.create(TypeForm::Subrange { base_type, min, max })))
	}

	/// One limit of a subrange as an ordinal, with its type. A `char` limit
	/// becomes its character code.
	fn subrange_limit(&mut self) -> Result<(Option<i32>, Option<TypeId>), ParserError> {
		let token = self.token.clone();
		let Some((value, type_spec)) = self.constant()? else {
			return Ok((None, None));
		};
		let ordinal = match value {
			ConstantValue::Integer(value) if self.types.is_integer(type_spec) || self.types.is_enumeration(type_spec) => {
				Some(value)
			}
			ConstantValue::String(text) if type_spec == TypeTable::CHAR => text.chars().next().map(|c| c as i32),
			_ => {
				self.flag_at(&token, InvalidSubrangeType)?;
				None
			}
		};
		Ok((ordinal, Some(type_spec)))
	}

	/// `( name, ... )`. The constants count up from 0.
	fn enumeration_type(&mut self) -> Result<Option<TypeId>, ParserError> {
		let enumeration = self.types.create(TypeForm::Enumeration { constants: Vec::new() });
		let mut constants = Vec::new();
		let mut value = 0;

		self.advance()?;
		loop {
			self.synchronize(ENUM_CONSTANT_START_SET)?;
			if self.token.r#type == Identifier {
				match self.symtab_stack.lookup_local(&self.token.text) {
					Some(_) => self.flag(IdentifierRedefined)?,
					None => {
						let id = self.symtab_stack.enter_local(&self.token.text);
						let entry = &mut self.symtab_stack[id];
						entry.definition = Definition::EnumerationConstant;
						entry.type_spec = Some(enumeration);
						entry.value = Some(ConstantValue::Integer(value));
						entry.append_line_number(self.token.line);
						constants.push(id);
					}
				}
				self.advance()?;
			} else {
				self.flag(MissingIdentifier)?;
			}
			value += 1;

			if self.token.r#type == Comma {
				self.advance()?;
				if ENUM_DEFINITION_FOLLOW_SET.contains(self.token.r#type) {
					self.flag(MissingIdentifier)?;
				}
			} else if ENUM_CONSTANT_START_SET.contains(self.token.r#type) {
				self.flag(MissingComma)?;
			}

			if ENUM_DEFINITION_FOLLOW_SET.contains(self.token.r#type) || self.token.r#type == Eof {
				break;
			}
		}

		if self.token.r#type == RightParen {
			self.advance()?;
		} else {
			self.flag(MissingRightParen)?;
		}
		self.types[enumeration].form = TypeForm::Enumeration { constants };
		Ok(Some(enumeration))
	}

	/// `ARRAY [ index, ... ] OF element`. Each extra index nests another
	/// array as the element type.
	fn array_type(&mut self) -> Result<Option<TypeId>, ParserError> {
		self.advance()?;

		self.synchronize(LEFT_BRACKET_SET)?;
		if self.token.r#type == LeftBracket {
			self.advance()?;
		} else {
			self.flag(MissingLeftBracket)?;
		}
		let indexes = self.index_type_list()?;

		self.synchronize(RIGHT_BRACKET_SET)?;
		if self.token.r#type == RightBracket {
			self.advance()?;
		} else {
			self.flag(MissingRightBracket)?;
		}

		self.synchronize(OF_SET)?;
		if self.token.r#type == Of {
			self.advance()?;
		} else {
			self.flag(MissingOf)?;
		}

		let element_type = self.type_spec()?.unwrap_or(TypeTable::UNDEFINED);
		let array = indexes.into_iter().rev().fold(element_type, |element_type, (index_type, element_count)| {
			self.types.create(TypeForm::Array { index_type, element_type, element_count })
		});
		Ok(Some(array))
	}

	/// Index types with their element counts, outermost first.
	fn index_type_list(&mut self) -> Result<Vec<(TypeId, usize)>, ParserError> {
		let mut indexes = Vec::new();
		loop {
			self.synchronize(INDEX_START_SET)?;
			indexes.push(self.index_type()?);

			self.synchronize(INDEX_FOLLOW_SET)?;
			match self.token.r#type {
				Comma => {
					self.advance()?;
				}
				Semicolon | RightBracket | Of | Eof => break,
				r#type if INDEX_START_SET.contains(r#type) => self.flag(MissingComma)?,
				_ => break,
			}
		}
		Ok(indexes)
	}

	/// A subrange or enumeration index type and the number of values it spans.
	fn index_type(&mut self) -> Result<(TypeId, usize), ParserError> {
		let token = self.token.clone();
		let Some(index_type) = self.simple_type()? else {
			return Ok((TypeTable::UNDEFINED, 0));
		};
		let count = match &self.types[index_type].form {
			TypeForm::Subrange { min, max, .. } => usize::try_from(i64::from(*max) - i64::from(*min) + 1).ok(),
			TypeForm::Enumeration { constants } => Some(constants.len()),
			_ => None,
		};
		if count.is_none() && index_type != TypeTable::UNDEFINED {
			self.flag_at(&token, InvalidIndexType)?;
		}
		Ok((index_type, count.unwrap_or(0)))
	}

	/// `RECORD field, ... : type ; ... END`. The fields get their own scope,
	/// kept with the record type.
	fn record_type(&mut self) -> Result<Option<TypeId>, ParserError> {
		self.advance()?;
		self.symtab_stack.push();
		self.variable_declarations(Definition::Field)?;
		let fields = self.symtab_stack.pop().unwrap_or_default();

		self.synchronize(RECORD_END_SET)?;
		if self.token.r#type == End {
			self.advance()?;
		} else {
			self.flag(MissingEnd)?;
		}
		Ok(Some(self.types.create(TypeForm::Record { fields })))
	}
}
