/// Why the scanner produced an error token instead of a real one.
///
/// An error token carries its code as its value; the parser flags it as a
/// syntax error and moves on to the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanErrorCode {
	/// A character that starts no token.
	InvalidCharacter,
	/// A number with a missing digit run, e.g. `1.` or `2e`.
	InvalidNumber,
	/// An integer literal that does not fit in 32 bits.
	RangeInteger,
	/// A real literal whose exponent is too large.
	RangeReal,
	/// A string literal still open at the end of the source.
	UnexpectedEof,
}

impl std::fmt::Display for ScanErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorCode::*;
		match self {
			InvalidCharacter => write!(f, "Invalid character"),
			InvalidNumber => write!(f, "Invalid number"),
			RangeInteger => write!(f, "Integer literal out of range"),
			RangeReal => write!(f, "Real literal out of range"),
			UnexpectedEof => write!(f, "Unexpected end of file"),
		}
	}
}
