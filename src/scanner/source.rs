use std::{cmp::Ordering, io::{self, BufRead}};

use crate::message::{Message, Messenger};

/// Returned at the end of every line.
pub const EOL: char = '\n';
/// Returned once the source is exhausted.
pub const EOF: char = '\0';

/// Line-buffered character reader the scanner pulls from.
///
/// Lines are read lazily; each one is announced with
/// [`Message::SourceLine`] as it is read.
pub struct Source {
	reader:      Box<dyn BufRead>,
	/// Current line without its terminator, `None` after the last line
	line:        Option<Vec<char>>,
	line_number: usize,
	column:      usize,
	started:     bool,
	messages:    Messenger,
}

impl Source {
	pub fn new(reader: impl BufRead + 'static, messages: Messenger) -> Self {
		Self { reader: Box::new(reader), line: None, line_number: 0, column: 0, started: false, messages }
	}

	/// 1-based number of the current line, 0 before anything is read.
	pub fn line_number(&self) -> usize { self.line_number }

	/// 0-based column of the current character.
	pub fn column(&self) -> usize { self.column }

	/// The character at the current position, [`EOL`] past the end of a line
	/// and [`EOF`] past the end of the source.
	pub fn current_char(&mut self) -> io::Result<char> {
		if !self.started {
			self.started = true;
			self.read_line()?;
		}
		let Some(line) = &self.line else { return Ok(EOF) };
		match self.column.cmp(&line.len()) {
			Ordering::Less => Ok(line[self.column]),
			Ordering::Equal => Ok(EOL),
			Ordering::Greater => {
				self.read_line()?;
				self.current_char()
			}
		}
	}

	/// Consume the current character and return the next one.
	pub fn next_char(&mut self) -> io::Result<char> {
		self.current_char()?;
		if self.line.is_some() {
			self.column += 1;
		}
		self.current_char()
	}

	/// The character after the current one, without consuming anything.
	/// Never looks past the current line.
	pub fn peek_char(&mut self) -> io::Result<char> {
		self.current_char()?;
		let Some(line) = &self.line else { return Ok(EOF) };
		Ok(line.get(self.column + 1).copied().unwrap_or(EOL))
	}

	fn read_line(&mut self) -> io::Result<()> {
		let mut text = String::new();
		self.column = 0;
		if self.reader.read_line(&mut text)? == 0 {
			self.line = None;
			return Ok(());
		}
		let text = text.trim_end_matches(['\n', '\r']).to_string();
		self.line_number += 1;
		self.line = Some(text.chars().collect());
		self.messages.borrow_mut().send(Message::SourceLine { line_number: self.line_number, text });
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;
	use crate::{message::MessageHandler, utils::RcCell};

	fn source(text: &'static str) -> Source { Source::new(Cursor::new(text), RcCell::new(MessageHandler::new())) }

	#[test]
	fn walks_lines_with_sentinels() {
		let mut source = source("ab\n\nc");
		assert_eq!(source.current_char().unwrap(), 'a');
		assert_eq!(source.peek_char().unwrap(), 'b');
		assert_eq!(source.next_char().unwrap(), 'b');
		assert_eq!(source.peek_char().unwrap(), EOL);
		assert_eq!(source.next_char().unwrap(), EOL);
		assert_eq!(source.next_char().unwrap(), EOL);
		assert_eq!(source.line_number(), 2);
		assert_eq!(source.next_char().unwrap(), 'c');
		assert_eq!((source.line_number(), source.column()), (3, 0));
		assert_eq!(source.next_char().unwrap(), EOL);
		assert_eq!(source.next_char().unwrap(), EOF);
		assert_eq!(source.next_char().unwrap(), EOF);
		assert_eq!(source.peek_char().unwrap(), EOF);
	}

	#[test]
	fn empty_source_is_eof() {
		let mut source = source("");
		assert_eq!(source.current_char().unwrap(), EOF);
		assert_eq!(source.line_number(), 0);
	}

	#[test]
	fn announces_each_line() {
		let messages: Messenger = RcCell::new(MessageHandler::new());
		let lines = RcCell::new(Vec::new());
		let sink = lines.clone();
		messages.borrow_mut().add_listener(move |message: &Message| {
			if let Message::SourceLine { line_number, text } = message {
				sink.borrow_mut().push((*line_number, text.clone()));
			}
		});
		let mut source = Source::new(Cursor::new("x\r\ny\n"), messages);
		while source.next_char().unwrap() != EOF {}
		assert_eq!(*lines.borrow(), vec![(1, "x".to_string()), (2, "y".to_string())]);
	}
}
