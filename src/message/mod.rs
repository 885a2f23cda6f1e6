//! Diagnostics fan-out.
//!
//! Every stage of the pipeline reports what it is doing as a [`Message`]: the
//! source reader announces each line it reads, the parser each token and each
//! syntax error, the executor each statement line and runtime error. A stage
//! knows nothing about who listens. The [`MessageHandler`] calls every
//! registered [`MessageListener`] synchronously, in registration order, before
//! the stage continues.
//!
//! Stages share one handler through a [`Messenger`], so a listener registered
//! on the front end also hears the back end.

use std::fmt;

use crate::{error::interpreter::RuntimeErrorCode, scanner::{TokenType, TokenValue}, utils::RcCell};

/// Shared handle every stage sends its messages through.
pub type Messenger = RcCell<MessageHandler>;

/// A notification emitted by one of the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// A line was read from the source.
	SourceLine { line_number: usize, text: String },
	/// The parser received a token from the scanner.
	Token { line: usize, column: usize, r#type: TokenType, text: String, value: Option<TokenValue> },
	/// A syntax error was flagged. `line` is 0 for fatal errors.
	SyntaxError { line: usize, column: usize, text: String, message: String },
	/// The parser finished.
	ParserSummary { line_count: usize, error_count: usize, elapsed: f64 },
	/// The executor is about to run a statement that starts on `line`.
	ExecutingLine(usize),
	/// A runtime error was flagged at the nearest statement line.
	RuntimeError { code: RuntimeErrorCode, line: Option<usize> },
	/// The executor finished.
	InterpreterSummary { execution_count: usize, runtime_errors: usize, elapsed: f64 },
	/// The code generator finished.
	CompilerSummary { instruction_count: usize, elapsed: f64 },
}

/// Receives every message sent through a [`MessageHandler`].
///
/// Listeners run on the pipeline's own call stack and must not block.
pub trait MessageListener {
	fn message_received(&mut self, message: &Message);
}

impl<F: FnMut(&Message)> MessageListener for F {
	fn message_received(&mut self, message: &Message) { self(message) }
}

/// Synchronous callback list.
#[derive(Default)]
pub struct MessageHandler {
	listeners: Vec<Box<dyn MessageListener>>,
}

impl MessageHandler {
	pub fn new() -> Self { Self::default() }

	pub fn add_listener(&mut self, listener: impl MessageListener + 'static) { self.listeners.push(Box::new(listener)); }

	pub fn send(&mut self, message: Message) {
		for listener in &mut self.listeners {
			listener.message_received(&message);
		}
	}
}

impl fmt::Debug for MessageHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MessageHandler").field("listeners", &self.listeners.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn listeners_run_in_registration_order() {
		let seen = RcCell::new(Vec::new());
		let mut handler = MessageHandler::new();
		for tag in ["first", "second"] {
			let seen = seen.clone();
			handler.add_listener(move |message: &Message| {
				if let Message::ExecutingLine(line) = message {
					seen.borrow_mut().push(format!("{tag}:{line}"));
				}
			});
		}
		handler.send(Message::ExecutingLine(7));
		assert_eq!(*seen.borrow(), vec!["first:7", "second:7"]);
	}

	#[test]
	fn sending_without_listeners_is_a_no_op() {
		let mut handler = MessageHandler::new();
		handler.send(Message::CompilerSummary { instruction_count: 0, elapsed: 0.0 });
		assert_eq!(format!("{handler:?}"), "MessageHandler { listeners: 0 }");
	}
}
