//! Single-pass semantic analysis: symbol/scope management and type checking
//! over a parsed `Program`, reporting every error it finds rather than
//! stopping at the first one.

mod analyzer;
mod procedures;
mod scope;

pub use analyzer::analyze;
pub use procedures::{ParamSignature, ProcKind, ProcSignature, ProcedureTable};
pub use scope::{Binding, Scope, ScopeChain};
