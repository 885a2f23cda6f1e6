//! Tree-walking executor.
//!
//! The executor walks the intermediate tree of a parsed [`Program`],
//! statement by statement, keeping variable values in its own [`Memory`].
//! Statements dispatch on their node kind in [`statement`], expressions in
//! [`expression`].
//!
//! # Runtime errors
//!
//! A runtime error is reported against the line of the enclosing statement
//! and evaluation continues with a neutral value (`0`, `0.0`, `false`). After
//! too many of them the run is aborted with [`InterpreterError::TooManyErrors`].

mod expression;
mod memory;
mod statement;
pub mod value;

use std::{collections::HashMap, time::Instant};

use anyhow::Context;
use memory::Memory;
use tracing::info;
use value::Value;

use crate::{
	error::interpreter::{InterpreterError, RuntimeErrorCode, RuntimeErrorHandler},
	intermediate::{Program, icode::NodeId},
	message::{Message, Messenger},
};

/// Executes one parsed program.
pub struct Executor<'a> {
	program:         &'a Program,
	memory:          Memory,
	/// Case constant ordinal to branch statement, per select node, built on
	/// first execution
	jump_tables:     HashMap<NodeId, HashMap<i32, NodeId>>,
	error_handler:   RuntimeErrorHandler,
	messages:        Messenger,
	execution_count: usize,
}

impl<'a> Executor<'a> {
	/// `max_errors` is the number of runtime errors tolerated before the run
	/// is aborted.
	pub fn new(program: &'a Program, messages: Messenger, max_errors: usize) -> Self {
		Self {
			program,
			memory: Memory::new(),
			jump_tables: HashMap::new(),
			error_handler: RuntimeErrorHandler::new(max_errors),
			messages,
			execution_count: 0,
		}
	}

	/// Run the program from its root statement.
	pub fn execute(&mut self) -> Result<(), InterpreterError> {
		let start = Instant::now();
		info!("executing");
		let root = self.program.icode.root().context("Intermediate tree has no root")?;
		self.execute_statement(root)?;

		let execution_count = self.execution_count;
		let runtime_errors = self.error_handler.error_count();
		let elapsed = start.elapsed().as_secs_f64();
		self.messages.borrow_mut().send(Message::InterpreterSummary { execution_count, runtime_errors, elapsed });
		info!(execution_count, runtime_errors, "executed");
		Ok(())
	}

	/// Number of statements executed so far.
	pub fn execution_count(&self) -> usize { self.execution_count }

	pub fn error_count(&self) -> usize { self.error_handler.error_count() }

	/// Current value of a program variable, `None` if it was never touched.
	pub fn value_of(&self, name: &str) -> Option<&Value> { self.memory.get(self.program.variable(name)?) }

	fn flag(&mut self, node: NodeId, code: RuntimeErrorCode) -> Result<(), InterpreterError> {
		self.error_handler.flag(node, code, &self.program.icode, &self.messages)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use indoc::indoc;

	use super::*;
	use crate::{
		message::MessageHandler,
		parser::Parser,
		scanner::{Scanner, Source},
		utils::RcCell,
	};

	/// Parse an error-free program, run it, and hand back the executor state
	/// through `check` along with every runtime error message.
	fn run(source: &str, check: impl FnOnce(&Executor)) -> (Result<(), InterpreterError>, Vec<Message>) {
		let messages: Messenger = RcCell::new(MessageHandler::new());
		let scanner = Scanner::new(Source::new(Cursor::new(source.to_string()), messages.clone()));
		let program = Parser::new(scanner, messages.clone(), 25).parse().unwrap();
		assert_eq!(program.error_count, 0);

		let seen = RcCell::new(Vec::new());
		let sink = seen.clone();
		messages.borrow_mut().add_listener(move |message: &Message| {
			if matches!(message, Message::RuntimeError { .. } | Message::ExecutingLine(_)) {
				sink.borrow_mut().push(message.clone());
			}
		});

		let mut executor = Executor::new(&program, messages, 5);
		let result = executor.execute();
		check(&executor);
		let seen = seen.borrow().clone();
		(result, seen)
	}

	fn runtime_errors(messages: &[Message]) -> Vec<(RuntimeErrorCode, Option<usize>)> {
		messages
			.iter()
			.filter_map(|message| match message {
				Message::RuntimeError { code, line } => Some((*code, *line)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn for_loop_leaves_control_one_past_the_end() {
		let source = indoc! {"
			var i, total, last: integer;
			begin
			  total := 0;
			  for i := 1 to 3 do begin total := total * 10 + i; last := i end
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("i"), Some(&Value::Integer(4)));
			assert_eq!(executor.value_of("total"), Some(&Value::Integer(123)));
			assert_eq!(executor.value_of("last"), Some(&Value::Integer(3)));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn while_and_repeat() {
		let source = indoc! {"
			var n, steps: integer; done: boolean;
			begin
			  n := 10; steps := 0;
			  while n > 0 do begin n := n - 3; steps := steps + 1 end;
			  repeat n := n + 1 until n = 2;
			  done := (n = 2) and not (steps < 4)
			end.
		"};
		let (result, _) = run(source, |executor| {
			assert_eq!(executor.value_of("n"), Some(&Value::Integer(2)));
			assert_eq!(executor.value_of("steps"), Some(&Value::Integer(4)));
			assert_eq!(executor.value_of("done"), Some(&Value::Boolean(true)));
		});
		result.unwrap();
	}

	#[test]
	fn case_selects_the_same_branch_every_time() {
		let source = indoc! {"
			var i, n, a, b: integer;
			begin
			  a := 0; b := 0; n := 2;
			  for i := 1 to 2 do
			    case n of
			      1: a := a + 1;
			      2, 3: b := b + 1
			    end;
			  n := 7;
			  case n of 1: a := 100 end
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("a"), Some(&Value::Integer(0)));
			assert_eq!(executor.value_of("b"), Some(&Value::Integer(2)));
			assert_eq!(executor.jump_tables.len(), 2);
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn case_on_characters_and_enumerations() {
		let source = indoc! {"
			type color = (red, green, blue);
			var c: char; k: color; hits: integer;
			begin
			  hits := 0; c := 'y'; k := blue;
			  case c of 'x': hits := 1; 'y', 'z': hits := 2 end;
			  case k of red, green: hits := hits + 10; blue: hits := hits + 20 end
			end.
		"};
		let (result, _) = run(source, |executor| {
			assert_eq!(executor.value_of("hits"), Some(&Value::Integer(22)));
		});
		result.unwrap();
	}

	#[test]
	fn division_by_zero_yields_zero_and_continues() {
		let source = indoc! {"
			var x, y: integer; r: real;
			begin
			  x := 5 div 0;
			  y := 1;
			  r := 2 / 0
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("x"), Some(&Value::Integer(0)));
			assert_eq!(executor.value_of("y"), Some(&Value::Integer(1)));
			assert_eq!(executor.value_of("r"), Some(&Value::Real(0.0)));
			assert_eq!(executor.error_count(), 2);
		});
		result.unwrap();
		assert_eq!(runtime_errors(&messages), vec![
			(RuntimeErrorCode::DivisionByZero, Some(3)),
			(RuntimeErrorCode::DivisionByZero, Some(5)),
		]);
	}

	#[test]
	fn too_many_runtime_errors_abort() {
		let source = "var i, x: integer; begin for i := 1 to 10 do x := i mod 0 end.";
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("i"), Some(&Value::Integer(6)));
		});
		let error = result.unwrap_err();
		assert!(matches!(error, InterpreterError::TooManyErrors));
		assert_eq!(error.status(), 103);
		assert_eq!(runtime_errors(&messages).len(), 6);
	}

	#[test]
	fn uninitialized_reads_are_flagged() {
		let source = "var i, j: integer;\nbegin\n  j := i + 1\nend.";
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("j"), Some(&Value::Integer(1)));
		});
		result.unwrap();
		assert_eq!(runtime_errors(&messages), vec![(RuntimeErrorCode::UninitializedValue, Some(3))]);
	}

	#[test]
	fn arrays_records_and_strings() {
		let source = indoc! {"
			type
			  point = record x, y: integer end;
			  name = array [1..3] of char;
			var
			  grid: array [1..2, 0..1] of integer;
			  p: point;
			  s: name;
			  sum: integer;
			  first: char;
			begin
			  grid[1, 0] := 4;
			  grid[2, 1] := grid[1, 0] * 2;
			  p.x := grid[2, 1];
			  p.y := p.x + 1;
			  sum := p.x + p.y;
			  s := 'cat';
			  s[1] := 'b';
			  first := s[1]
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("sum"), Some(&Value::Integer(17)));
			assert_eq!(executor.value_of("s").and_then(Value::text), Some("bat".to_string()));
			assert_eq!(executor.value_of("first"), Some(&Value::Char('b')));
			let Some(Value::Array(rows)) = executor.value_of("grid") else { panic!("grid is not an array") };
			assert_eq!(rows.get(&1), Some(&Value::Array([(1, Value::Integer(8))].into())));
			assert_eq!(rows.get(&0).map(Value::to_string), Some("[0: 4]".to_string()));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn short_strings_leave_room_for_elements() {
		let source = indoc! {"
			var s: array [1..3] of char; c: char;
			begin
			  s := 'hi';
			  s[3] := 'x';
			  c := s[3]
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("c"), Some(&Value::Char('x')));
			assert_eq!(executor.value_of("s").and_then(Value::text), Some("hix".to_string()));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn huge_arrays_take_only_what_is_stored() {
		let source = indoc! {"
			var a: array [1..2000000000] of integer; x: integer;
			begin
			  a[1] := 7;
			  a[2000000000] := a[1] * 2;
			  x := a[2000000000]
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("x"), Some(&Value::Integer(14)));
			let Some(Value::Array(elements)) = executor.value_of("a") else { panic!("a is not an array") };
			assert_eq!(elements.len(), 2);
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn downto_runs_the_body_counting_down() {
		let source = indoc! {"
			var i, total: integer;
			begin
			  total := 0;
			  for i := 3 downto 1 do total := total * 10 + i
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("total"), Some(&Value::Integer(321)));
			assert_eq!(executor.value_of("i"), Some(&Value::Integer(0)));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn for_over_enumerations() {
		let source = indoc! {"
			type color = (red, green, blue);
			var c: color; n, sum: integer;
			begin
			  n := 0; sum := 0;
			  for c := red to blue do
			    case c of red: sum := sum + 1; green: sum := sum + 10; blue: sum := sum + 100 end;
			  for c := blue downto green do n := n + 1
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("sum"), Some(&Value::Integer(111)));
			assert_eq!(executor.value_of("n"), Some(&Value::Integer(2)));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn for_over_booleans() {
		let source = indoc! {"
			var b: boolean; n, hits: integer;
			begin
			  n := 0; hits := 0;
			  for b := false to true do begin
			    n := n + 1;
			    if b then hits := hits + 1
			  end;
			  for b := true downto false do n := n + 10
			end.
		"};
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("n"), Some(&Value::Integer(22)));
			assert_eq!(executor.value_of("hits"), Some(&Value::Integer(1)));
		});
		result.unwrap();
		assert!(runtime_errors(&messages).is_empty());
	}

	#[test]
	fn subscripts_are_range_checked() {
		let source = "var a: array [1..3] of integer; i, x: integer;\nbegin\n  i := 4;\n  a[i] := 1;\n  x := a[0]\nend.";
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.value_of("x"), Some(&Value::Integer(0)));
		});
		result.unwrap();
		assert_eq!(runtime_errors(&messages), vec![
			(RuntimeErrorCode::ValueRange, Some(4)),
			(RuntimeErrorCode::ValueRange, Some(5)),
		]);
	}

	#[test]
	fn integers_widen_to_real_and_booleans_evaluate() {
		let source = indoc! {"
			var r: real; b: boolean; i: integer;
			begin
			  i := 7;
			  r := i;
			  r := r / 2 + 1;
			  b := true;
			  b := b and (r > 4) or false
			end.
		"};
		let (result, _) = run(source, |executor| {
			assert_eq!(executor.value_of("r"), Some(&Value::Real(4.5)));
			assert_eq!(executor.value_of("b"), Some(&Value::Boolean(true)));
		});
		result.unwrap();
	}

	#[test]
	fn statements_report_their_lines() {
		let source = "var i: integer;\nbegin\n  i := 1;\n  if i = 1 then\n    i := 2\nend.";
		let (result, messages) = run(source, |executor| {
			assert_eq!(executor.execution_count(), 4);
		});
		result.unwrap();
		let lines: Vec<usize> = messages
			.iter()
			.filter_map(|message| match message {
				Message::ExecutingLine(line) => Some(*line),
				_ => None,
			})
			.collect();
		assert_eq!(lines, vec![2, 3, 4, 5]);
	}
}
