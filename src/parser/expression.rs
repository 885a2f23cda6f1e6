use TokenType::*;

use super::Parser;
use crate::{
	error::parser::{ParserError, SyntaxErrorCode::*},
	intermediate::{
		constant_type,
		icode::{ICodeNodeType, NodeId},
		symtab::{ConstantValue, Definition},
		types::{TypeId, TypeTable},
	},
	scanner::{Token, TokenType, TokenValue},
};

impl Parser {
	/// `simple_expression [ relop simple_expression ]`. A comparison is
	/// boolean.
	pub(super) fn expression(&mut self) -> Result<NodeId, ParserError> {
		let left = self.simple_expression()?;
		let relation = match self.token.r#type {
			Equals => ICodeNodeType::Eq,
			NotEquals => ICodeNodeType::Ne,
			LessThan => ICodeNodeType::Lt,
			LessEquals => ICodeNodeType::Le,
			GreaterThan => ICodeNodeType::Gt,
			GreaterEquals => ICodeNodeType::Ge,
			_ => return Ok(left),
		};
		self.advance()?;

		let token = self.token.clone();
		let right = self.simple_expression()?;
		let type_spec = if self.types.are_comparison_compatible(self.type_of(left), self.type_of(right)) {
			TypeTable::BOOLEAN
		} else {
			self.flag_at(&token, IncompatibleTypes)?;
			TypeTable::UNDEFINED
		};
		Ok(self.binary(relation, left, right, type_spec))
	}

	/// `[ + | - ] term { ( + | - | OR ) term }`
	fn simple_expression(&mut self) -> Result<NodeId, ParserError> {
		let sign = match self.token.r#type {
			Plus | Minus => {
				let sign = self.token.r#type;
				self.advance()?;
				Some(sign)
			}
			_ => None,
		};

		let token = self.token.clone();
		let mut left = self.term()?;
		if let Some(sign) = sign {
			let type_spec = self.type_of(left);
			if !self.types.is_integer_or_real(type_spec) {
				self.flag_at(&token, IncompatibleTypes)?;
			}
			if sign == Minus {
				let negate = self.icode.create_typed(ICodeNodeType::Negate, type_spec);
				self.icode.add_child(negate, left);
				left = negate;
			}
		}

		loop {
			let operator = match self.token.r#type {
				Plus => ICodeNodeType::Add,
				Minus => ICodeNodeType::Subtract,
				Or => ICodeNodeType::Or,
				_ => return Ok(left),
			};
			self.advance()?;

			let token = self.token.clone();
			let right = self.term()?;
			let (a, b) = (self.type_of(left), self.type_of(right));
			let types = &self.types;
			let type_spec = match operator {
				ICodeNodeType::Or if types.are_both_boolean(a, b) => Some(TypeTable::BOOLEAN),
				ICodeNodeType::Or => None,
				_ if types.are_both_integer(a, b) => Some(TypeTable::INTEGER),
				_ if types.is_at_least_one_real(a, b) => Some(TypeTable::REAL),
				_ => None,
			};
			let type_spec = self.checked(type_spec, &token)?;
			left = self.binary(operator, left, right, type_spec);
		}
	}

	/// `factor { ( * | / | DIV | MOD | AND ) factor }`
	fn term(&mut self) -> Result<NodeId, ParserError> {
		let mut left = self.factor()?;
		loop {
			let operator = match self.token.r#type {
				Star => ICodeNodeType::Multiply,
				Slash => ICodeNodeType::FloatDivide,
				Div => ICodeNodeType::IntegerDivide,
				Mod => ICodeNodeType::Mod,
				And => ICodeNodeType::And,
				_ => return Ok(left),
			};
			self.advance()?;

			let token = self.token.clone();
			let right = self.factor()?;
			let (a, b) = (self.type_of(left), self.type_of(right));
			let types = &self.types;
			let type_spec = match operator {
				ICodeNodeType::Multiply if types.are_both_integer(a, b) => Some(TypeTable::INTEGER),
				ICodeNodeType::Multiply if types.is_at_least_one_real(a, b) => Some(TypeTable::REAL),
				ICodeNodeType::FloatDivide
					if types.are_both_integer(a, b) || types.is_at_least_one_real(a, b) =>
				{
					Some(TypeTable::REAL)
				}
				ICodeNodeType::IntegerDivide | ICodeNodeType::Mod if types.are_both_integer(a, b) => {
					Some(TypeTable::INTEGER)
				}
				ICodeNodeType::And if types.are_both_boolean(a, b) => Some(TypeTable::BOOLEAN),
				_ => None,
			};
			let type_spec = self.checked(type_spec, &token)?;
			left = self.binary(operator, left, right, type_spec);
		}
	}

	/// A variable, a constant, a literal, `NOT factor` or a parenthesized
	/// expression.
	fn factor(&mut self) -> Result<NodeId, ParserError> {
		let token = self.token.clone();
		match (token.r#type, token.value) {
			(Identifier, _) => self.identifier_factor(),
			(IntegerLiteral, Some(TokenValue::Integer(value))) => {
				self.advance()?;
				Ok(self.icode.create_typed(ICodeNodeType::IntegerConstant(value), TypeTable::INTEGER))
			}
			(RealLiteral, Some(TokenValue::Real(value))) => {
				self.advance()?;
				Ok(self.icode.create_typed(ICodeNodeType::RealConstant(value), TypeTable::REAL))
			}
			(StringLiteral, Some(TokenValue::String(value))) => {
				self.advance()?;
				let type_spec = constant_type(&ConstantValue::String(value.clone()), &mut self.types);
				Ok(self.icode.create_typed(ICodeNodeType::StringConstant(value), type_spec))
			}
			(Not, _) => {
				self.advance()?;
				let token = self.token.clone();
				let operand = self.factor()?;
				if !self.types.is_boolean(self.type_of(operand)) {
					self.flag_at(&token, IncompatibleTypes)?;
				}
				let not = self.icode.create_typed(ICodeNodeType::Not, TypeTable::BOOLEAN);
				self.icode.add_child(not, operand);
				Ok(not)
			}
			(LeftParen, _) => {
				self.advance()?;
				let expression = self.expression()?;
				if self.token.r#type == RightParen {
					self.advance()?;
				} else {
					self.flag(MissingRightParen)?;
				}
				Ok(expression)
			}
			_ => {
				self.flag(UnexpectedToken)?;
				Ok(self.icode.create_typed(ICodeNodeType::NoOp, TypeTable::UNDEFINED))
			}
		}
	}

	/// A constant is folded to its value, anything else is read as a variable.
	fn identifier_factor(&mut self) -> Result<NodeId, ParserError> {
		let id = self.resolve_identifier()?;
		let entry = &self.symtab_stack[id];
		let (definition, value) = (entry.definition, entry.value.clone());
		let type_spec = entry.type_spec.unwrap_or(TypeTable::UNDEFINED);

		if !matches!(definition, Definition::Constant | Definition::EnumerationConstant) {
			return self.variable_of(id);
		}

		let r#type = match value {
			Some(ConstantValue::Integer(value)) => ICodeNodeType::IntegerConstant(value),
			Some(ConstantValue::Real(value)) => ICodeNodeType::RealConstant(value),
			Some(ConstantValue::String(value)) => ICodeNodeType::StringConstant(value),
			None => ICodeNodeType::NoOp,
		};
		let type_spec = if r#type == ICodeNodeType::NoOp { TypeTable::UNDEFINED } else { type_spec };
		self.symtab_stack[id].append_line_number(self.token.line);
		self.advance()?;
		Ok(self.icode.create_typed(r#type, type_spec))
	}

	/// Flag an operator whose operand types do not fit it; the result is then
	/// undefined.
	fn checked(&mut self, type_spec: Option<TypeId>, token: &Token) -> Result<TypeId, ParserError> {
		match type_spec {
			Some(type_spec) => Ok(type_spec),
			None => {
				self.flag_at(token, IncompatibleTypes)?;
				Ok(TypeTable::UNDEFINED)
			}
		}
	}

	fn binary(&mut self, operator: ICodeNodeType, left: NodeId, right: NodeId, type_spec: TypeId) -> NodeId {
		let node = self.icode.create_typed(operator, type_spec);
		self.icode.add_child(node, left);
		self.icode.add_child(node, right);
		node
	}
}
