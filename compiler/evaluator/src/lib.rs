//! Tree-walking evaluator: executes a validated `Program` directly, without
//! lowering it to the textual IR, producing the same output stream
//! `Write`/`WriteLn` would realize after an external toolchain runs the IR.

mod evaluator;
mod format;
mod scope;
mod value;

pub use evaluator::Evaluator;
pub use format::{format_argument, format_real};
pub use value::{ArrayValue, Value};
