//! Textual SSA-like IR emitter: lowers a validated `Program` directly to a
//! `.ll`-shaped intermediate representation an external toolchain could
//! assemble and link, without ever executing the program itself.

mod emitter;
mod locals;
mod types;
mod value;

pub use emitter::emit_program;
pub use types::IrType;
pub use value::IrValue;
