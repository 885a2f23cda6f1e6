use std::{fs::File, io::{BufRead, BufReader}, path::Path};

use anyhow::Context;
use tracing::info;

use crate::{
	backend::{self, Operation},
	error::PascalError,
	intermediate::Program,
	message::{MessageHandler, MessageListener, Messenger},
	parser::Parser,
	scanner::{Scanner, Source},
	utils::RcCell,
};

/// Limits of one translation and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// Syntax errors tolerated before translation is aborted
	pub max_syntax_errors:  usize,
	/// Runtime errors tolerated before execution is aborted
	pub max_runtime_errors: usize,
}

impl Default for Options {
	fn default() -> Self { Self { max_syntax_errors: 25, max_runtime_errors: 5 } }
}

/// Pascal is the entry point of the front end and its back ends. Every
/// run reports through the listeners added with [`Pascal::add_listener`].
pub struct Pascal {
	options:  Options,
	messages: Messenger,
}

impl Default for Pascal {
	fn default() -> Self { Self::new(Options::default()) }
}

impl Pascal {
	pub fn new(options: Options) -> Self { Self { options, messages: RcCell::new(MessageHandler::new()) } }

	pub fn options(&self) -> Options { self.options }

	pub fn add_listener(&self, listener: impl MessageListener + 'static) {
		self.messages.borrow_mut().add_listener(listener);
	}

	/// Parse the source file at `path`.
	pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Program, PascalError> {
		let file = File::open(path).context("Failed open source file")?;
		self.parse(BufReader::new(file))
	}

	/// Parse a whole program from `reader`. Syntax errors are counted in the
	/// returned program; `Err` means translation was aborted.
	pub fn parse(&self, reader: impl BufRead + 'static) -> Result<Program, PascalError> {
		let scanner = Scanner::new(Source::new(reader, self.messages.clone()));
		let parser = Parser::new(scanner, self.messages.clone(), self.options.max_syntax_errors);
		Ok(parser.parse()?)
	}

	/// Hand a parsed program to the back end for `operation`. A program with
	/// syntax errors is not processed.
	pub fn process(&self, operation: Operation, program: &Program) -> Result<(), PascalError> {
		if program.error_count > 0 {
			info!(errors = program.error_count, "skipping back end");
			return Err(PascalError::SyntaxErrors(program.error_count));
		}
		backend::create(operation, program, self.messages.clone(), self.options.max_runtime_errors).process()
	}

	/// Parse and process the program read from `reader`.
	pub fn run(&self, operation: Operation, reader: impl BufRead + 'static) -> Result<Program, PascalError> {
		let program = self.parse(reader)?;
		self.process(operation, &program)?;
		Ok(program)
	}

	/// Parse and process the source file at `path`.
	pub fn run_file<P: AsRef<Path>>(&self, operation: Operation, path: P) -> Result<Program, PascalError> {
		let program = self.parse_file(path)?;
		self.process(operation, &program)?;
		Ok(program)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;
	use crate::message::Message;

	fn reader(source: &str) -> Cursor<String> { Cursor::new(source.to_string()) }

	#[test]
	fn syntax_errors_skip_the_back_end() {
		let pascal = Pascal::default();
		let summaries = RcCell::new(0);
		let sink = summaries.clone();
		pascal.add_listener(move |message: &Message| {
			if let Message::InterpreterSummary { .. } = message {
				*sink.borrow_mut() += 1;
			}
		});

		let error = pascal.run(Operation::Execute, reader("begin x := 1 end.")).unwrap_err();
		assert!(matches!(error, PascalError::SyntaxErrors(1)));
		assert_eq!(error.status(), 1);
		assert_eq!(*summaries.borrow(), 0);

		pascal.run(Operation::Execute, reader("var x: integer; begin x := 1 end.")).unwrap();
		assert_eq!(*summaries.borrow(), 1);
	}

	#[test]
	fn options_cap_runtime_errors() {
		let pascal = Pascal::new(Options { max_runtime_errors: 1, ..Options::default() });
		let source = "var x: integer; begin x := 1 div 0; x := 2 div 0 end.";
		let error = pascal.run(Operation::Execute, reader(source)).unwrap_err();
		assert_eq!(error.status(), 103);
	}

	#[test]
	fn missing_file_is_an_internal_error() {
		let error = Pascal::default().run_file(Operation::Execute, "does/not/exist.pas").unwrap_err();
		assert!(matches!(error, PascalError::InternalError(_)));
		assert!(error.to_string().starts_with("Failed open source file"));
	}
}
