use tracing::warn;

use super::scanner::ScanErrorCode;
use crate::{message::{Message, Messenger}, scanner::Token};

/// Errors that stop translation.
///
/// Ordinary syntax errors never show up here: they are flagged through the
/// [`SyntaxErrorHandler`] and parsing goes on.
#[derive(thiserror::Error, Debug)]
pub enum ParserError {
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Translation was aborted, e.g. after too many syntax errors.
	#[error("FATAL ERROR: {0}")]
	Aborted(SyntaxErrorCode),
	/// The source could not be read.
	#[error("Failed read source: {0}")]
	Io(#[from] std::io::Error),
}

impl ParserError {
	/// Process exit status for this error.
	pub fn status(&self) -> u8 {
		match self {
			ParserError::InternalError(_) => 1,
			ParserError::Aborted(code) => code.status(),
			ParserError::Io(_) => SyntaxErrorCode::IoError.status(),
		}
	}
}

/// Every syntax error the parser can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorCode {
	CaseConstantReused,
	IdentifierRedefined,
	IdentifierUndefined,
	IncompatibleTypes,
	InvalidCharacter,
	InvalidConstant,
	InvalidField,
	InvalidIdentifierUsage,
	InvalidIndexType,
	InvalidNumber,
	InvalidSubrangeType,
	InvalidType,
	MinGtMax,
	MissingBegin,
	MissingColon,
	MissingColonEquals,
	MissingComma,
	MissingDo,
	MissingDotDot,
	MissingEnd,
	MissingEquals,
	MissingIdentifier,
	MissingLeftBracket,
	MissingOf,
	MissingPeriod,
	MissingRightBracket,
	MissingRightParen,
	MissingSemicolon,
	MissingThen,
	MissingToDownto,
	MissingUntil,
	NotConstantIdentifier,
	NotTypeIdentifier,
	RangeInteger,
	RangeReal,
	TooManySubscripts,
	UnexpectedEof,
	UnexpectedToken,
	// Fatal
	IoError,
	TooManyErrors,
}

impl SyntaxErrorCode {
	/// Exit status; 0 for codes that do not abort translation.
	pub fn status(&self) -> u8 {
		match self {
			SyntaxErrorCode::IoError => 101,
			SyntaxErrorCode::TooManyErrors => 102,
			_ => 0,
		}
	}
}

impl From<ScanErrorCode> for SyntaxErrorCode {
	fn from(code: ScanErrorCode) -> Self {
		match code {
			ScanErrorCode::InvalidCharacter => SyntaxErrorCode::InvalidCharacter,
			ScanErrorCode::InvalidNumber => SyntaxErrorCode::InvalidNumber,
			ScanErrorCode::RangeInteger => SyntaxErrorCode::RangeInteger,
			ScanErrorCode::RangeReal => SyntaxErrorCode::RangeReal,
			ScanErrorCode::UnexpectedEof => SyntaxErrorCode::UnexpectedEof,
		}
	}
}

impl std::fmt::Display for SyntaxErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use SyntaxErrorCode::*;
		let message = match self {
			CaseConstantReused => "Duplicate CASE constant",
			IdentifierRedefined => "Redefined identifier",
			IdentifierUndefined => "Undefined identifier",
			IncompatibleTypes => "Incompatible types",
			InvalidCharacter => "Invalid character",
			InvalidConstant => "Invalid constant",
			InvalidField => "Invalid field",
			InvalidIdentifierUsage => "Invalid identifier usage",
			InvalidIndexType => "Invalid index type",
			InvalidNumber => "Invalid number",
			InvalidSubrangeType => "Invalid subrange type",
			InvalidType => "Invalid type",
			MinGtMax => "Min limit greater than max limit",
			MissingBegin => "Missing BEGIN",
			MissingColon => "Missing :",
			MissingColonEquals => "Missing :=",
			MissingComma => "Missing ,",
			MissingDo => "Missing DO",
			MissingDotDot => "Missing ..",
			MissingEnd => "Missing END",
			MissingEquals => "Missing =",
			MissingIdentifier => "Missing identifier",
			MissingLeftBracket => "Missing [",
			MissingOf => "Missing OF",
			MissingPeriod => "Missing .",
			MissingRightBracket => "Missing ]",
			MissingRightParen => "Missing )",
			MissingSemicolon => "Missing ;",
			MissingThen => "Missing THEN",
			MissingToDownto => "Missing TO or DOWNTO",
			MissingUntil => "Missing UNTIL",
			NotConstantIdentifier => "Not a constant identifier",
			NotTypeIdentifier => "Not a type identifier",
			RangeInteger => "Integer literal out of range",
			RangeReal => "Real literal out of range",
			TooManySubscripts => "Too many subscripts",
			UnexpectedEof => "Unexpected end of file",
			UnexpectedToken => "Unexpected token",
			IoError => "Object I/O error",
			TooManyErrors => "Too many syntax errors",
		};
		write!(f, "{message}")
	}
}

/// Counts the syntax errors of one translation and trips once the count
/// passes `max_errors`.
#[derive(Debug)]
pub struct SyntaxErrorHandler {
	error_count: usize,
	max_errors:  usize,
}

impl SyntaxErrorHandler {
	pub fn new(max_errors: usize) -> Self { Self { error_count: 0, max_errors } }

	pub fn error_count(&self) -> usize { self.error_count }

	/// Report `code` at `token`. Fails once the error budget is exhausted.
	pub fn flag(&mut self, token: &Token, code: SyntaxErrorCode, messages: &Messenger) -> Result<(), ParserError> {
		messages.borrow_mut().send(Message::SyntaxError {
			line:    token.line,
			column:  token.column,
			text:    token.text.clone(),
			message: code.to_string(),
		});
		self.error_count += 1;
		if self.error_count > self.max_errors {
			return Err(Self::abort_translation(SyntaxErrorCode::TooManyErrors, messages));
		}
		Ok(())
	}

	/// Report a fatal error and build the error that unwinds the parser.
	pub fn abort_translation(code: SyntaxErrorCode, messages: &Messenger) -> ParserError {
		warn!(%code, "aborting translation");
		messages.borrow_mut().send(Message::SyntaxError {
			line:    0,
			column:  0,
			text:    String::new(),
			message: format!("FATAL ERROR: {code}"),
		});
		ParserError::Aborted(code)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{message::MessageHandler, scanner::TokenType, utils::RcCell};

	fn token() -> Token { Token::new(TokenType::Identifier, "oops", None, 3, 8) }

	#[test]
	fn flag_reports_position_and_message() {
		let messages: Messenger = RcCell::new(MessageHandler::new());
		let seen = RcCell::new(Vec::new());
		let sink = seen.clone();
		messages.borrow_mut().add_listener(move |message: &Message| sink.borrow_mut().push(message.clone()));

		let mut handler = SyntaxErrorHandler::new(25);
		handler.flag(&token(), SyntaxErrorCode::MissingSemicolon, &messages).unwrap();
		assert_eq!(handler.error_count(), 1);
		assert_eq!(seen.borrow()[0], Message::SyntaxError {
			line:    3,
			column:  8,
			text:    "oops".to_string(),
			message: "Missing ;".to_string(),
		});
	}

	#[test]
	fn exceeding_the_cap_aborts() {
		let messages: Messenger = RcCell::new(MessageHandler::new());
		let mut handler = SyntaxErrorHandler::new(2);
		assert!(handler.flag(&token(), SyntaxErrorCode::UnexpectedToken, &messages).is_ok());
		assert!(handler.flag(&token(), SyntaxErrorCode::UnexpectedToken, &messages).is_ok());
		let error = handler.flag(&token(), SyntaxErrorCode::UnexpectedToken, &messages).unwrap_err();
		assert!(matches!(error, ParserError::Aborted(SyntaxErrorCode::TooManyErrors)));
		assert_eq!(error.status(), 102);
		assert_eq!(error.to_string(), "FATAL ERROR: Too many syntax errors");
	}

	#[test]
	fn lexical_codes_map_onto_syntax_codes() {
		assert_eq!(SyntaxErrorCode::from(ScanErrorCode::RangeInteger), SyntaxErrorCode::RangeInteger);
		assert_eq!(
			SyntaxErrorCode::from(ScanErrorCode::UnexpectedEof).to_string(),
			ScanErrorCode::UnexpectedEof.to_string()
		);
	}
}
