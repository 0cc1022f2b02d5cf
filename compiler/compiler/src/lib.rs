//! The driver: wires the lexer, parser, semantic analyzer, evaluator, and
//! IR emitter into the one entry point the command-line binary calls.

mod driver;

pub use driver::{Driver, Mode, Outcome};
pub use modc_errors::Diagnostic;
