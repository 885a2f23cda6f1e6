use std::{fmt, path::PathBuf};

use palc::{Parser, Subcommand};

use crate::{
	Pascal, PascalError,
	backend::Operation,
	intermediate::{Program, symtab::Definition, types::TypeForm},
	message::{Message, MessageListener},
};

#[derive(Parser)]
#[command(name = "zpascal", after_long_help = "A Pascal front end and tree-walking interpreter.")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Parse the program and run it
	Execute {
		/// Print the intermediate tree
		#[arg(short, long)]
		intermediate: bool,
		/// Print the cross-reference table
		#[arg(short, long)]
		xref:         bool,
		path:         PathBuf,
	},
	/// Parse the program and generate code for it
	Compile {
		/// Print the intermediate tree
		#[arg(short, long)]
		intermediate: bool,
		/// Print the cross-reference table
		#[arg(short, long)]
		xref:         bool,
		path:         PathBuf,
	},
}

impl Cli {
	/// Translate the source file and hand it to the chosen back end. The
	/// listings are printed only for a program without syntax errors.
	pub fn run(self, pascal: &Pascal) -> Result<(), PascalError> {
		let (operation, intermediate, xref, path) = match self.command {
			Command::Execute { intermediate, xref, path } => (Operation::Execute, intermediate, xref, path),
			Command::Compile { intermediate, xref, path } => (Operation::Compile, intermediate, xref, path),
		};

		let program = pascal.parse_file(&path)?;
		if program.error_count == 0 {
			if xref {
				print!("{}", cross_reference(&program));
			}
			if intermediate {
				println!("\n===== INTERMEDIATE CODE =====\n\n{}", program.icode_listing());
			}
		}
		pascal.process(operation, &program)
	}
}

/// Prints every message to the console the way a listing reads.
pub struct ConsoleListener;

impl MessageListener for ConsoleListener {
	fn message_received(&mut self, message: &Message) {
		if let Some(text) = format_message(message) {
			println!("{text}");
		}
	}
}

/// Width of the `NNN ` prefix in front of every source line.
const PREFIX_WIDTH: usize = 4;

/// Console text of a message, `None` for messages that are not shown.
pub fn format_message(message: &Message) -> Option<String> {
	match message {
		Message::SourceLine { line_number, text } => Some(format!("{line_number:03} {text}")),
		Message::SyntaxError { line: 0, message, .. } => Some(format!("*** {message}")),
		Message::SyntaxError { column, text, message, .. } => {
			let caret = " ".repeat(PREFIX_WIDTH + column);
			Some(format!("{caret}^\n*** {message} [at \"{text}\"]"))
		}
		Message::RuntimeError { code, line } => {
			let line = line.map_or_else(|| "???".to_string(), |line| format!("{line:03}"));
			Some(format!("*** RUNTIME ERROR AT LINE {line}: {code}"))
		}
		Message::ParserSummary { line_count, error_count, elapsed } => Some(format!(
			"\n{line_count:>20} source lines.\n{error_count:>20} syntax errors.\n{elapsed:>20.2} seconds total parsing time."
		)),
		Message::InterpreterSummary { execution_count, runtime_errors, elapsed } => Some(format!(
			"\n{execution_count:>20} statements executed.\n{runtime_errors:>20} runtime errors.\n{elapsed:>20.2} seconds total \
			 execution time."
		)),
		Message::CompilerSummary { instruction_count, elapsed } => Some(format!(
			"\n{instruction_count:>20} instructions generated.\n{elapsed:>20.2} seconds total code generation time."
		)),
		Message::Token { .. } | Message::ExecutingLine(_) => None,
	}
}

const NAME_WIDTH: usize = 16;
const DETAIL_INDENT: usize = 33;

/// Every identifier of the program scope with the lines it appears on and
/// what it was defined as.
pub fn cross_reference(program: &Program) -> String { CrossReference(program).to_string() }

struct CrossReference<'a>(&'a Program);

impl fmt::Display for CrossReference<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let program = self.0;
		let stack = &program.symtab_stack;
		let name = program.program_id().map_or("", |id| stack[id].name.as_str());
		let indent = " ".repeat(DETAIL_INDENT);

		writeln!(f, "\n===== CROSS-REFERENCE TABLE =====\n")?;
		writeln!(f, "*** PROGRAM {name} ***\n")?;
		writeln!(f, "{:<NAME_WIDTH$} Line numbers    Type specification", "Identifier")?;
		writeln!(f, "{:<NAME_WIDTH$} ------------    ------------------", "----------")?;

		for id in program.symtab().into_iter().flat_map(|symtab| symtab.sorted_entries()) {
			let entry = &stack[id];
			let lines: Vec<String> = entry.line_numbers.iter().map(|line| format!("{line:03}")).collect();
			writeln!(f, "{:<NAME_WIDTH$} {}", entry.name, lines.join(" "))?;
			writeln!(f, "{indent}Defined as: {}", entry.definition)?;
			writeln!(f, "{indent}Scope nesting level: {}", entry.nesting_level)?;

			if let Some(type_spec) = entry.type_spec {
				let form = match &program.types[type_spec].form {
					TypeForm::Scalar => "scalar",
					TypeForm::Enumeration { .. } => "enumeration",
					TypeForm::Subrange { .. } => "subrange",
					TypeForm::Array { .. } => "array",
					TypeForm::Record { .. } => "record",
				};
				let type_name = program.types[type_spec].identifier.map_or("<unnamed>", |id| stack[id].name.as_str());
				writeln!(f, "{indent}Type form = {form}, Type id = {type_name}")?;
			}
			if matches!(entry.definition, Definition::Constant | Definition::EnumerationConstant) {
				if let Some(value) = &entry.value {
					writeln!(f, "{indent}Value = {value}")?;
				}
			}
		}
		Ok(())
	}
}
