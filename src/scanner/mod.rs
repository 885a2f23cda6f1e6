//! Turns Pascal source text into tokens.
//!
//! The scanner pulls characters one at a time from a [`Source`] and hands out
//! one token per call to [`Scanner::next_token`]. What the first character of
//! a token is decides what kind of token gets built:
//!
//! |First character|Token|
//! --|--
//! letter|reserved word or identifier
//! digit|integer or real literal
//! `'` or `"`|string literal
//! anything else|special symbol, or an error token
//!
//! Whitespace and `{ ... }` comments between tokens are skipped. A comment
//! that never closes runs silently to the end of the file.
//!
//! Special symbols are matched greedily: after `:` the scanner looks one
//! character ahead for `=`, after `<` for `=` or `>`, after `>` for `=` and
//! after `.` for another `.`.
//!
//! The scanner never fails on bad input. It produces an [`TokenType::Error`]
//! token whose value says what went wrong and keeps going, so the parser can
//! report the problem and recover. Only a failing reader is an error.
mod source;
mod token;

use std::io;

use TokenType::*;
pub use source::{EOF, EOL, Source};
pub use token::*;

use crate::error::scanner::ScanErrorCode;

/// A scanner for Pascal source code
pub struct Scanner {
	source: Source,
}

impl Scanner {
	pub fn new(source: Source) -> Self { Self { source } }

	/// Number of the line the scanner is on.
	pub fn line_number(&self) -> usize { self.source.line_number() }

	/// Scan the next token. Keeps returning [`TokenType::Eof`] once the source
	/// is exhausted.
	pub fn next_token(&mut self) -> io::Result<Token> {
		self.skip_white_space()?;
		let line = self.source.line_number();
		let column = self.source.column();
		let (r#type, text, value) = match self.source.current_char()? {
			EOF => (Eof, String::new(), None),
			c if c.is_alphabetic() => self.word()?,
			c if c.is_ascii_digit() => self.number()?,
			quote @ ('\'' | '"') => self.string(quote)?,
			c => self.special_symbol(c)?,
		};
		Ok(Token::new(r#type, text, value, line, column))
	}

	/// Skip whitespace and comments.
	fn skip_white_space(&mut self) -> io::Result<()> {
		let mut current = self.source.current_char()?;
		while current.is_whitespace() || current == '{' {
			if current == '{' {
				while !matches!(current, '}' | EOF) {
					current = self.source.next_char()?;
				}
				if current == '}' {
					current = self.source.next_char()?;
				}
			} else {
				current = self.source.next_char()?;
			}
		}
		Ok(())
	}

	/// Scan a reserved word or an identifier
	fn word(&mut self) -> io::Result<(TokenType, String, Option<TokenValue>)> {
		let mut text = String::new();
		let mut current = self.source.current_char()?;
		while current.is_alphanumeric() {
			text.push(current);
			current = self.source.next_char()?;
		}
		let r#type = TokenType::reserved_word(&text).unwrap_or(Identifier);
		Ok((r#type, text, None))
	}

	/// Scan an integer or real literal
	fn number(&mut self) -> io::Result<(TokenType, String, Option<TokenValue>)> {
		let mut text = String::new();
		let invalid = |text: String, code| Ok((Error, text, Some(TokenValue::Error(code))));

		let Some(whole_digits) = self.digits(&mut text)? else { return invalid(text, ScanErrorCode::InvalidNumber) };
		let mut fraction_digits = String::new();
		let mut exponent_digits = String::new();
		let mut exponent_negative = false;
		let mut real = false;
		let mut saw_dot_dot = false;

		// A `..` after the digits belongs to a range, not to this number.
		if self.source.current_char()? == '.' {
			if self.source.peek_char()? == '.' {
				saw_dot_dot = true;
			} else {
				real = true;
				text.push('.');
				self.source.next_char()?;
				let Some(digits) = self.digits(&mut text)? else {
					return invalid(text, ScanErrorCode::InvalidNumber);
				};
				fraction_digits = digits;
			}
		}

		let current = self.source.current_char()?;
		if !saw_dot_dot && matches!(current, 'E' | 'e') {
			real = true;
			text.push(current);
			let sign = self.source.next_char()?;
			if matches!(sign, '+' | '-') {
				text.push(sign);
				exponent_negative = sign == '-';
				self.source.next_char()?;
			}
			let Some(digits) = self.digits(&mut text)? else { return invalid(text, ScanErrorCode::InvalidNumber) };
			exponent_digits = digits;
		}

		if !real {
			return match whole_digits.parse::<i32>() {
				Ok(value) => Ok((IntegerLiteral, text, Some(TokenValue::Integer(value)))),
				Err(_) => invalid(text, ScanErrorCode::RangeInteger),
			};
		}
		match real_value(&whole_digits, &fraction_digits, &exponent_digits, exponent_negative) {
			Some(value) => Ok((RealLiteral, text, Some(TokenValue::Real(value)))),
			None => invalid(text, ScanErrorCode::RangeReal),
		}
	}

	/// Collect a run of digits into `text`. `None` if there is none.
	fn digits(&mut self, text: &mut String) -> io::Result<Option<String>> {
		let mut current = self.source.current_char()?;
		if !current.is_ascii_digit() {
			return Ok(None);
		}
		let mut digits = String::new();
		while current.is_ascii_digit() {
			digits.push(current);
			current = self.source.next_char()?;
		}
		text.push_str(&digits);
		Ok(Some(digits))
	}

	/// Scan a string literal opened by `quote`
	fn string(&mut self, quote: char) -> io::Result<(TokenType, String, Option<TokenValue>)> {
		let mut text = String::from(quote);
		let mut value = String::new();
		let mut current = self.source.next_char()?; // consume the opening quote
		loop {
			match current {
				EOF => return Ok((Error, text, Some(TokenValue::Error(ScanErrorCode::UnexpectedEof)))),
				c if c == quote => {
					// A doubled quote stands for one quote character.
					if self.source.peek_char()? != quote {
						text.push(quote);
						self.source.next_char()?;
						break;
					}
					text.push_str(&format!("{quote}{quote}"));
					value.push(quote);
					self.source.next_char()?;
				}
				c if c.is_whitespace() => {
					text.push(' ');
					value.push(' ');
				}
				c => {
					text.push(c);
					value.push(c);
				}
			}
			current = self.source.next_char()?;
		}
		Ok((StringLiteral, text, Some(TokenValue::String(value))))
	}

	/// Scan a one or two character special symbol
	fn special_symbol(&mut self, first: char) -> io::Result<(TokenType, String, Option<TokenValue>)> {
		let mut text = String::from(first);
		#[rustfmt::skip]
		let r#type = match first {
			'+' => Plus,
			'-' => Minus,
			'*' => Star,
			'/' => Slash,
			',' => Comma,
			';' => Semicolon,
			'=' => Equals,
			'(' => LeftParen,
			')' => RightParen,
			'[' => LeftBracket,
			']' => RightBracket,
			'}' => RightBrace,
			'^' => UpArrow,
			':' => if self.match_next('=', &mut text)? { ColonEquals } else { Colon },
			'<' => if self.match_next('=', &mut text)? { LessEquals }
				else if self.match_next('>', &mut text)? { NotEquals }
				else { LessThan },
			'>' => if self.match_next('=', &mut text)? { GreaterEquals } else { GreaterThan },
			'.' => if self.match_next('.', &mut text)? { DotDot } else { Dot },
			_ => {
				self.source.next_char()?;
				return Ok((Error, text, Some(TokenValue::Error(ScanErrorCode::InvalidCharacter))));
			}
		};
		self.source.next_char()?; // consume the last character of the symbol
		Ok((r#type, text, None))
	}

	/// Step onto the next character if it is the expected one
	fn match_next(&mut self, expected: char, text: &mut String) -> io::Result<bool> {
		if self.source.peek_char()? != expected {
			return Ok(false);
		}
		self.source.next_char()?;
		text.push(expected);
		Ok(true)
	}
}

/// Combine the digit runs of a real literal. `None` when the exponent is out
/// of range.
fn real_value(whole: &str, fraction: &str, exponent: &str, negative: bool) -> Option<f64> {
	let mut exponent: i64 = if exponent.is_empty() { 0 } else { exponent.parse().ok()? };
	if negative {
		exponent = -exponent;
	}
	if (exponent + whole.len() as i64).abs() > f64::MAX_10_EXP as i64 {
		return None;
	}
	let exponent = exponent - fraction.len() as i64;
	let value: f64 = format!("{whole}{fraction}e{exponent}").parse().ok()?;
	value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;
	use crate::{message::MessageHandler, utils::RcCell};

	fn scanner(input: &str) -> Scanner {
		Scanner::new(Source::new(Cursor::new(input.to_string()), RcCell::new(MessageHandler::new())))
	}

	fn scan(input: &str) -> Vec<Token> {
		let mut scanner = scanner(input);
		let mut tokens = Vec::new();
		loop {
			let token = scanner.next_token().unwrap();
			if token.r#type == Eof {
				return tokens;
			}
			tokens.push(token);
		}
	}

	fn types(input: &str) -> Vec<TokenType> { scan(input).into_iter().map(|t| t.r#type).collect() }

	fn single(input: &str) -> Token {
		let mut tokens = scan(input);
		assert_eq!(tokens.len(), 1, "{input} scanned to {tokens:?}");
		tokens.remove(0)
	}

	#[test]
	fn scan_words() {
		assert_eq!(types("BEGIN begin Begin x1 y"), vec![Begin, Begin, Begin, Identifier, Identifier]);
		let token = single("CamelCase");
		assert_eq!((token.r#type, token.text.as_str()), (Identifier, "CamelCase"));
		assert_eq!(types("downto div mod"), vec![Downto, Div, Mod]);
	}

	#[test]
	fn scan_special_symbols() {
		assert_eq!(types(":= : <= <> < >= > .. . ^"), vec![
			ColonEquals,
			Colon,
			LessEquals,
			NotEquals,
			LessThan,
			GreaterEquals,
			GreaterThan,
			DotDot,
			Dot,
			UpArrow
		]);
		assert_eq!(types("a[1]:=(2);"), vec![
			Identifier,
			LeftBracket,
			IntegerLiteral,
			RightBracket,
			ColonEquals,
			LeftParen,
			IntegerLiteral,
			RightParen,
			Semicolon
		]);
	}

	#[test]
	fn scan_integers() {
		assert_eq!(single("12345").value, Some(TokenValue::Integer(12345)));
		assert_eq!(single("2147483647").value, Some(TokenValue::Integer(i32::MAX)));
		let token = single("123456789012345678");
		assert_eq!(token.r#type, Error);
		assert_eq!(token.error_code(), Some(ScanErrorCode::RangeInteger));
		assert_eq!(token.text, "123456789012345678");
	}

	#[test]
	fn scan_reals() {
		assert_eq!(single("3.14e2").value, Some(TokenValue::Real(314.0)));
		assert_eq!(single("3.14").value, Some(TokenValue::Real(3.14)));
		assert_eq!(single("25E-1").value, Some(TokenValue::Real(2.5)));
		assert_eq!(single("1e+3").value, Some(TokenValue::Real(1000.0)));
		assert_eq!(single("1e999").error_code(), Some(ScanErrorCode::RangeReal));
		assert_eq!(scan("1.")[0].error_code(), Some(ScanErrorCode::InvalidNumber));
		assert_eq!(scan("2e;")[0].error_code(), Some(ScanErrorCode::InvalidNumber));
	}

	#[test]
	fn real_range_counts_whole_digits_only() {
		assert_eq!(single("1.5e307").value, Some(TokenValue::Real(1.5e307)));
		assert_eq!(single("1.5e308").error_code(), Some(ScanErrorCode::RangeReal));
		assert_eq!(single("15.0e307").error_code(), Some(ScanErrorCode::RangeReal));

		let long_fraction = format!("1.{}1", "0".repeat(400));
		assert_eq!(single(&long_fraction).value, Some(TokenValue::Real(1.0)));
		let tiny = format!("0.{}1e-300", "0".repeat(20));
		assert_eq!(single(&tiny).value, Some(TokenValue::Real(1e-321)));
	}

	#[test]
	fn range_dots_are_not_a_fraction() {
		let tokens = scan("1..10");
		assert_eq!(tokens.iter().map(|t| t.r#type).collect::<Vec<_>>(), vec![IntegerLiteral, DotDot, IntegerLiteral]);
		assert_eq!(tokens[0].value, Some(TokenValue::Integer(1)));
		assert_eq!(tokens[2].value, Some(TokenValue::Integer(10)));
	}

	#[test]
	fn scan_strings() {
		let token = single("'hello'");
		assert_eq!((token.r#type, token.value), (StringLiteral, Some(TokenValue::String("hello".to_string()))));
		let token = single("'it''s'");
		assert_eq!(token.value, Some(TokenValue::String("it's".to_string())));
		assert_eq!(token.text, "'it''s'");
		assert_eq!(single("\"a'b\"").value, Some(TokenValue::String("a'b".to_string())));
		assert_eq!(single("'a\tb'").value, Some(TokenValue::String("a b".to_string())));
		assert_eq!(single("''").value, Some(TokenValue::String(String::new())));
		assert_eq!(single("'open").error_code(), Some(ScanErrorCode::UnexpectedEof));
	}

	#[test]
	fn literal_text_rescans_to_the_same_value() {
		for input in ["0", "42", "007", "3.14e2", "0.5", "1E-3", "'x'", "'don''t'", "\"q\""] {
			let token = single(input);
			let rescanned = scan(&token.text);
			assert_eq!(rescanned.len(), 1);
			assert_eq!(rescanned[0].value, token.value, "{input}");
		}
	}

	#[test]
	fn skip_comments_and_white_space() {
		assert_eq!(types("{ comment } x { another\n over lines } y"), vec![Identifier, Identifier]);
		assert_eq!(types("x { never closed y z"), vec![Identifier]);
		assert_eq!(types("\n\n   \t"), vec![]);
	}

	#[test]
	fn invalid_characters_consume_one_character() {
		let tokens = scan("a ? b");
		assert_eq!(tokens.iter().map(|t| t.r#type).collect::<Vec<_>>(), vec![Identifier, Error, Identifier]);
		assert_eq!(tokens[1].error_code(), Some(ScanErrorCode::InvalidCharacter));
		assert_eq!(tokens[1].text, "?");
	}

	#[test]
	fn tokens_record_position() {
		let tokens = scan("x :=\n  10");
		assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
		assert_eq!((tokens[1].line, tokens[1].column), (1, 2));
		assert_eq!((tokens[2].line, tokens[2].column), (2, 2));
	}

	#[test]
	fn eof_repeats() {
		let mut scanner = scanner("x");
		assert_eq!(scanner.next_token().unwrap().r#type, Identifier);
		assert_eq!(scanner.next_token().unwrap().r#type, Eof);
		assert_eq!(scanner.next_token().unwrap().r#type, Eof);
	}
}
