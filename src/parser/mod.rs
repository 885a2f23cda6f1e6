//! Recursive-descent parser for the Pascal subset.
//!
//! One method per production, split over the submodules by what the
//! production builds: declarations fill the symbol table, type productions
//! fill the type table, statements and expressions build the intermediate
//! tree. Semantic checks run as soon as both operands of a rule are known, so
//! the whole front end is a single pass.
//!
//! ``` EBNF
//! program      → [ "PROGRAM" IDENT [ "(" IDENT { "," IDENT } ")" ] ";" ] block "." ;
//! block        → declarations compound ;
//! declarations → [ "CONST" { IDENT "=" constant ";" } ]
//!                [ "TYPE" { IDENT "=" type ";" } ]
//!                [ "VAR" { IDENT { "," IDENT } ":" type ";" } ] ;
//! type         → simple | "ARRAY" "[" simple { "," simple } "]" "OF" type
//!              | "RECORD" fields "END" ;
//! simple       → IDENT | "(" IDENT { "," IDENT } ")" | constant ".." constant ;
//! statement    → compound | assignment | if | case | while | repeat | for | ε ;
//! expression   → simple_expr [ relop simple_expr ] ;
//! simple_expr  → [ "+" | "-" ] term { ( "+" | "-" | "OR" ) term } ;
//! term         → factor { ( "*" | "/" | "DIV" | "MOD" | "AND" ) factor } ;
//! factor       → IDENT | NUMBER | STRING | "NOT" factor | "(" expression ")" ;
//! ```
//!
//! # Error recovery
//!
//! Syntax errors never unwind. A production that finds an unexpected token
//! calls [`Parser::synchronize`] with the set of tokens valid at that point:
//! the token is flagged and skipped, along with everything after it, until a
//! token of the set (or the end of the file) shows up. A missing token is
//! flagged and parsing goes on as if it had been there. Only the error cap
//! turns a syntax error into an `Err`.

mod block;
mod declarations;
mod expression;
mod statement;
mod types;
mod variable;

use std::time::Instant;

use TokenType::*;
use tracing::{info, trace};

use crate::{
	error::parser::{ParserError, SyntaxErrorCode, SyntaxErrorHandler},
	intermediate::{Program, icode::{ICode, NodeId}, seed_predefined, symtab::SymTabStack, types::{TypeId, TypeTable}},
	message::{Message, Messenger},
	scanner::{Scanner, Token, TokenSet, TokenType},
};

/// Tokens that may start a statement.
const STMT_START_SET: TokenSet = TokenSet::of(&[Begin, Case, For, If, Repeat, While, Identifier, Semicolon]);
/// Tokens that may follow a statement.
const STMT_FOLLOW_SET: TokenSet = TokenSet::of(&[Semicolon, End, Else, Until, Dot]);
/// Tokens that may start an expression.
const EXPR_START_SET: TokenSet =
	TokenSet::of(&[Plus, Minus, Identifier, IntegerLiteral, RealLiteral, StringLiteral, Not, LeftParen]);

const DECLARATION_START_SET: TokenSet = TokenSet::of(&[Const, Type, Var, Procedure, Function, Begin]);
const TYPE_START_SET: TokenSet = DECLARATION_START_SET.without(Const);
const VAR_START_SET: TokenSet = TYPE_START_SET.without(Type);
const ROUTINE_START_SET: TokenSet = VAR_START_SET.without(Var);

/// Tokens that may start a constant, or end a definition missing one.
const CONSTANT_START_SET: TokenSet =
	TokenSet::of(&[Identifier, IntegerLiteral, RealLiteral, Plus, Minus, StringLiteral, Semicolon]);

pub struct Parser {
	scanner:       Scanner,
	/// Current lookahead token
	token:         Token,
	symtab_stack:  SymTabStack,
	types:         TypeTable,
	icode:         ICode,
	error_handler: SyntaxErrorHandler,
	messages:      Messenger,
}

impl Parser {
	/// `max_errors` is the number of syntax errors tolerated before
	/// translation is aborted.
	pub fn new(scanner: Scanner, messages: Messenger, max_errors: usize) -> Self {
		Self {
			scanner,
			token: Token::new(Eof, "", None, 0, 0),
			symtab_stack: SymTabStack::new(),
			types: TypeTable::new(),
			icode: ICode::default(),
			error_handler: SyntaxErrorHandler::new(max_errors),
			messages,
		}
	}

	/// Parse a whole program.
	///
	/// Syntax errors are reported through the messenger and counted in
	/// [`Program::error_count`]; `Err` means translation was aborted.
	pub fn parse(mut self) -> Result<Program, ParserError> {
		let start = Instant::now();
		info!("parsing");
		seed_predefined(&mut self.symtab_stack, &mut self.types);

		self.advance()?;
		let program_id = self.program_header()?;
		self.symtab_stack.push();
		let root = self.block()?;
		self.symtab_stack[program_id].routine_symtab = self.symtab_stack.pop();
		self.icode.set_root(root);

		if self.token.r#type != Dot {
			self.flag(SyntaxErrorCode::MissingPeriod)?;
		}

		let line_count = self.scanner.line_number();
		let error_count = self.error_handler.error_count();
		let elapsed = start.elapsed().as_secs_f64();
		self.messages.borrow_mut().send(Message::ParserSummary { line_count, error_count, elapsed });
		info!(line_count, error_count, "parsed");

		Ok(Program { icode: self.icode, symtab_stack: self.symtab_stack, types: self.types, error_count, line_count })
	}

	/// Move to the next token. Error tokens are flagged and skipped, so the
	/// productions never see one.
	fn advance(&mut self) -> Result<TokenType, ParserError> {
		loop {
			let token = self.scanner.next_token()?;
			trace!(line = token.line, column = token.column, kind = ?token.r#type, text = %token.text, "token");
			self.messages.borrow_mut().send(Message::Token {
				line:   token.line,
				column: token.column,
				r#type: token.r#type,
				text:   token.text.clone(),
				value:  token.value.clone(),
			});
			if let Some(code) = token.error_code() {
				self.error_handler.flag(&token, code.into(), &self.messages)?;
				continue;
			}
			self.token = token;
			return Ok(self.token.r#type);
		}
	}

	/// Flag `code` at the current token.
	fn flag(&mut self, code: SyntaxErrorCode) -> Result<(), ParserError> {
		self.error_handler.flag(&self.token, code, &self.messages)
	}

	/// Flag `code` at an earlier token.
	fn flag_at(&mut self, token: &Token, code: SyntaxErrorCode) -> Result<(), ParserError> {
		self.error_handler.flag(token, code, &self.messages)
	}

	/// Panic-mode recovery: unless the current token is in `set`, flag it and
	/// skip ahead to the next token that is, or to the end of the file.
	fn synchronize(&mut self, set: TokenSet) -> Result<(), ParserError> {
		if set.contains(self.token.r#type) {
			return Ok(());
		}
		self.flag(SyntaxErrorCode::UnexpectedToken)?;
		while !matches!(self.advance()?, Eof) && !set.contains(self.token.r#type) {}
		Ok(())
	}

	/// Resolved type of an expression node.
	fn type_of(&self, node: NodeId) -> TypeId { self.icode[node].type_spec.unwrap_or(TypeTable::UNDEFINED) }
}
