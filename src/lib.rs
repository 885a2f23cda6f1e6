//! # How Pascal source turns into a running program
//!
//! User's source code: `for i := 1 to 3 do total := total + i`

//! ## Reading and scanning
//!
//! The [`scanner::Source`] hands out the text one character at a time, line by
//! line. The [`scanner::Scanner`] groups characters into tokens: reserved
//! words `for`, `to`, `do`, identifiers `i`, `total`, numbers `1`, `3` and
//! special symbols `:=`, `+`. Comments and whitespace are dropped.
//!
//! A malformed number or a stray character does not stop the scanner. It
//! becomes an error token, which the parser reports like any syntax error.

//! ## Parsing and semantic analysis
//!
//! The [`parser::Parser`] pulls tokens one at a time and descends the grammar
//! with one method per production. In the same pass it
//!
//! - enters every declared identifier in the [`intermediate::symtab`] stack
//!   of nested scopes,
//! - builds each declared type in the [`intermediate::types`] table and
//!   checks every operator and assignment against them,
//! - builds the typed intermediate tree in [`intermediate::icode`].
//!
//! The `for` loop above has no node of its own, it is rewritten into the
//! general loop:
//!
//! ``` markdown
//! compound
//! ├── := i 1
//! └── loop
//!     ├── test (> i 3)
//!     ├── := total (+ total i)
//!     └── := i (+ i 1)
//! ```
//!
//! On a syntax error the parser reports it, skips to a token that can start
//! or follow the current construct, and goes on. Too many errors abort the
//! translation.

//! ## Back end
//!
//! A program without syntax errors is handed to a [`backend::Backend`]. The
//! [`interpreter::Executor`] walks the tree statement by statement; a runtime
//! error such as a division by zero is reported and evaluation continues
//! with a neutral value, until too many of them abort the run. The code
//! generator back end is a placeholder.

//! ## Diagnostics
//!
//! Every stage reports through the [`message`] fan-out: source lines, tokens,
//! syntax and runtime errors, summaries. The command line prints them; tests
//! collect them.

pub mod backend;
pub mod cli;
pub mod error;
pub mod intermediate;
pub mod interpreter;
pub mod message;
pub mod parser;
mod pascal;
pub mod scanner;
pub mod utils;

pub use error::PascalError;
pub use pascal::{Options, Pascal};
