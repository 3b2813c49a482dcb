// Assembling
mod assembler;
pub use assembler::{assemble, Assembler};
mod program;
pub use program::{Program, PROGRAM_MAX};
pub mod isa;
mod lexer;
mod span;
pub use span::Span;
mod symbol;
pub use symbol::{Register, TagIndexing};

// Running
mod alu;
mod runtime;
pub use runtime::{run, Flow, Machine, RAM_SIZE};
mod terminal;
pub use terminal::{Console, Terminal};
mod output;
pub use output::{Dump, Listing};

mod error;
pub use error::{AsmError, AsmErrorKind, RunError};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
