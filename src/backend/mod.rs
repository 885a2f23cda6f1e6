//! Back ends that consume a parsed program.

use std::time::Instant;

use tracing::info;

use crate::{
	error::PascalError,
	interpreter::Executor,
	intermediate::Program,
	message::{Message, Messenger},
};

/// What to do with a program once it has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Execute,
	Compile,
}

pub trait Backend {
	/// Process the whole program.
	fn process(&mut self) -> Result<(), PascalError>;
}

impl Backend for Executor<'_> {
	fn process(&mut self) -> Result<(), PascalError> { Ok(self.execute()?) }
}

/// Code generator placeholder: generates nothing and reports so.
pub struct CodeGenerator<'a> {
	program:  &'a Program,
	messages: Messenger,
}

impl<'a> CodeGenerator<'a> {
	pub fn new(program: &'a Program, messages: Messenger) -> Self { Self { program, messages } }
}

impl Backend for CodeGenerator<'_> {
	fn process(&mut self) -> Result<(), PascalError> {
		let start = Instant::now();
		info!(nodes = self.program.icode.len(), "compiling");
		let instruction_count = 0;
		let elapsed = start.elapsed().as_secs_f64();
		self.messages.borrow_mut().send(Message::CompilerSummary { instruction_count, elapsed });
		Ok(())
	}
}

/// The back end that carries out `operation` on `program`.
pub fn create<'a>(
	operation: Operation,
	program: &'a Program,
	messages: Messenger,
	max_runtime_errors: usize,
) -> Box<dyn Backend + 'a> {
	match operation {
		Operation::Execute => Box::new(Executor::new(program, messages, max_runtime_errors)),
		Operation::Compile => Box::new(CodeGenerator::new(program, messages)),
	}
}
