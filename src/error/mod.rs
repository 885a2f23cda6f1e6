pub mod interpreter;
pub mod parser;
pub mod scanner;

/// PascalError is the top-level error type for the Pascal front end and
/// interpreter.
#[derive(thiserror::Error, Debug)]
pub enum PascalError {
	/// Internal error, e.g. the source file could not be opened
	#[error("{0:#}")]
	InternalError(#[from] anyhow::Error),
	/// Parsing finished but reported syntax errors, so nothing was run
	#[error("Generated {0} syntax errors")]
	SyntaxErrors(usize),
	/// Translation was aborted
	#[error(transparent)]
	Parser(#[from] parser::ParserError),
	/// Execution was aborted
	#[error(transparent)]
	Runtime(#[from] interpreter::InterpreterError),
}

impl PascalError {
	/// Process exit status for this error, never 0.
	pub fn status(&self) -> u8 {
		let status = match self {
			PascalError::InternalError(_) | PascalError::SyntaxErrors(_) => 1,
			PascalError::Parser(e) => e.status(),
			PascalError::Runtime(e) => e.status(),
		};
		status.max(1)
	}
}
