use std::process::ExitCode;

use palc::Parser;
use tracing_subscriber::EnvFilter;
use zpascal::{Pascal, cli::*};

fn main() -> ExitCode {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let pascal = Pascal::default();
	pascal.add_listener(ConsoleListener);

	match Cli::parse().run(&pascal) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Failed run file: {e}");
			ExitCode::from(e.status())
		}
	}
}
