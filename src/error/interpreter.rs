use tracing::warn;

use crate::{intermediate::icode::{ICode, NodeId}, message::{Message, Messenger}};

#[derive(thiserror::Error, Debug)]
/// Errors that stop execution
pub enum InterpreterError {
	/// Internal invariant of the intermediate tree broken
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Too many runtime errors
	#[error("ABORTED AFTER TOO MANY RUNTIME ERRORS")]
	TooManyErrors,
}

impl InterpreterError {
	/// Process exit status for this error.
	pub fn status(&self) -> u8 {
		match self {
			InterpreterError::InternalError(_) => 1,
			InterpreterError::TooManyErrors => 103,
		}
	}
}

/// Every runtime error the executor can flag. Execution continues after each
/// of them with a neutral value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeErrorCode {
	UninitializedValue,
	ValueRange,
	InvalidCaseExpressionValue,
	DivisionByZero,
	UnimplementedFeature,
}

impl std::fmt::Display for RuntimeErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use RuntimeErrorCode::*;
		match self {
			UninitializedValue => write!(f, "Uninitialized value"),
			ValueRange => write!(f, "Value out of range"),
			InvalidCaseExpressionValue => write!(f, "Invalid CASE expression value"),
			DivisionByZero => write!(f, "Division by zero"),
			UnimplementedFeature => write!(f, "Unimplemented runtime feature"),
		}
	}
}

/// Counts the runtime errors of one run.
#[derive(Debug)]
pub struct RuntimeErrorHandler {
	error_count: usize,
	max_errors:  usize,
}

impl RuntimeErrorHandler {
	pub fn new(max_errors: usize) -> Self { Self { error_count: 0, max_errors } }

	pub fn error_count(&self) -> usize { self.error_count }

	/// Report `code` against the statement enclosing `node`.
	pub fn flag(
		&mut self,
		node: NodeId,
		code: RuntimeErrorCode,
		icode: &ICode,
		messages: &Messenger,
	) -> Result<(), InterpreterError> {
		let line = icode.line_of(node);
		messages.borrow_mut().send(Message::RuntimeError { code, line });
		self.error_count += 1;
		if self.error_count > self.max_errors {
			warn!(errors = self.error_count, "aborting execution");
			return Err(InterpreterError::TooManyErrors);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{intermediate::icode::ICodeNodeType, message::MessageHandler, utils::RcCell};

	#[test]
	fn flag_uses_nearest_statement_line() {
		let mut icode = ICode::default();
		let assign = icode.create(ICodeNodeType::Assign);
		icode[assign].line = Some(12);
		let divide = icode.create(ICodeNodeType::IntegerDivide);
		icode.add_child(assign, divide);

		let messages: Messenger = RcCell::new(MessageHandler::new());
		let seen = RcCell::new(Vec::new());
		let sink = seen.clone();
		messages.borrow_mut().add_listener(move |message: &Message| sink.borrow_mut().push(message.clone()));

		let mut handler = RuntimeErrorHandler::new(5);
		handler.flag(divide, RuntimeErrorCode::DivisionByZero, &icode, &messages).unwrap();
		assert_eq!(*seen.borrow(), vec![Message::RuntimeError {
			code: RuntimeErrorCode::DivisionByZero,
			line: Some(12),
		}]);
	}

	#[test]
	fn sixth_error_aborts() {
		let mut icode = ICode::default();
		let node = icode.create(ICodeNodeType::NoOp);
		let messages: Messenger = RcCell::new(MessageHandler::new());
		let mut handler = RuntimeErrorHandler::new(5);
		for _ in 0..5 {
			handler.flag(node, RuntimeErrorCode::ValueRange, &icode, &messages).unwrap();
		}
		let error = handler.flag(node, RuntimeErrorCode::ValueRange, &icode, &messages).unwrap_err();
		assert!(matches!(error, InterpreterError::TooManyErrors));
		assert_eq!(error.status(), 103);
	}
}
