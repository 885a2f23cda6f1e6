use crate::error::scanner::ScanErrorCode;

/// A token produced by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub r#type: TokenType,
	/// Source text as written, quotes included for strings
	pub text:   String,
	pub value:  Option<TokenValue>,
	pub line:   usize,
	/// 0-based column of the first character
	pub column: usize,
}

impl Token {
	pub fn new(r#type: TokenType, text: impl Into<String>, value: Option<TokenValue>, line: usize, column: usize) -> Self {
		Self { r#type, text: text.into(), value, line, column }
	}

	/// The scan error code carried by an error token.
	pub fn error_code(&self) -> Option<ScanErrorCode> {
		match self.value {
			Some(TokenValue::Error(code)) => Some(code),
			_ => None,
		}
	}
}

/// Literal value of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
	Integer(i32),
	Real(f64),
	String(String),
	Error(ScanErrorCode),
}

/// The different types of Pascal tokens. Cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
	// Reserved words.
	And,
	Array,
	Begin,
	Case,
	Const,
	Div,
	Do,
	Downto,
	Else,
	End,
	File,
	For,
	Function,
	Goto,
	If,
	In,
	Label,
	Mod,
	Nil,
	Not,
	Of,
	Or,
	Packed,
	Procedure,
	Program,
	Record,
	Repeat,
	Set,
	Then,
	To,
	Type,
	Until,
	Var,
	While,
	With,
	// Special symbols.
	/// `+`
	Plus,
	/// `-`
	Minus,
	/// `*`
	Star,
	/// `/`
	Slash,
	/// `:=`
	ColonEquals,
	/// `.`
	Dot,
	/// `,`
	Comma,
	/// `;`
	Semicolon,
	/// `:`
	Colon,
	/// `=`
	Equals,
	/// `<>`
	NotEquals,
	/// `<`
	LessThan,
	/// `<=`
	LessEquals,
	/// `>=`
	GreaterEquals,
	/// `>`
	GreaterThan,
	/// `(`
	LeftParen,
	/// `)`
	RightParen,
	/// `[`
	LeftBracket,
	/// `]`
	RightBracket,
	/// `}` without an opening brace
	RightBrace,
	/// `^`
	UpArrow,
	/// `..`
	DotDot,
	/// Identifier, e.g. variable or type name.
	Identifier,
	/// Integer literal, e.g. `42`.
	IntegerLiteral,
	/// Real literal, e.g. `3.14e2`.
	RealLiteral,
	/// Quoted string or character literal, e.g. `'it''s'`.
	StringLiteral,
	/// Invalid input, the value holds the reason.
	Error,
	/// End of file/input.
	Eof,
}

impl TokenType {
	/// Match a word against the reserved words, ignoring case.
	pub fn reserved_word(word: &str) -> Option<Self> {
		use TokenType::*;
		Some(match word.to_ascii_lowercase().as_str() {
			"and" => And,
			"array" => Array,
			"begin" => Begin,
			"case" => Case,
			"const" => Const,
			"div" => Div,
			"do" => Do,
			"downto" => Downto,
			"else" => Else,
			"end" => End,
			"file" => File,
			"for" => For,
			"function" => Function,
			"goto" => Goto,
			"if" => If,
			"in" => In,
			"label" => Label,
			"mod" => Mod,
			"nil" => Nil,
			"not" => Not,
			"of" => Of,
			"or" => Or,
			"packed" => Packed,
			"procedure" => Procedure,
			"program" => Program,
			"record" => Record,
			"repeat" => Repeat,
			"set" => Set,
			"then" => Then,
			"to" => To,
			"type" => Type,
			"until" => Until,
			"var" => Var,
			"while" => While,
			"with" => With,
			_ => return None,
		})
	}
}

/// A set of token types, used for synchronization during error recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSet(u128);

impl TokenSet {
	pub const EMPTY: Self = Self(0);

	pub const fn of(types: &[TokenType]) -> Self { Self::EMPTY.with(types) }

	pub const fn with(self, types: &[TokenType]) -> Self {
		let mut bits = self.0;
		let mut i = 0;
		while i < types.len() {
			bits |= 1 << types[i] as u32;
			i += 1;
		}
		Self(bits)
	}

	pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }

	pub const fn without(self, r#type: TokenType) -> Self { Self(self.0 & !(1 << r#type as u32)) }

	pub const fn contains(&self, r#type: TokenType) -> bool { self.0 & (1 << r#type as u32) != 0 }
}
