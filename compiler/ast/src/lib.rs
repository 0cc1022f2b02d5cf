//! The abstract syntax tree for the Modc language and its closed
//! data-type enumeration.

pub mod declarations;
pub mod expressions;
pub mod pretty;
pub mod program;
pub mod statements;
pub mod types;

pub use declarations::{ConstDecl, Declaration, Parameter, ProcDecl, VarDecl};
pub use expressions::{
    ArrayAccessExpr, BinaryExpr, BinaryOp, CallExpr, Expression, LiteralExpr, LiteralValue, UnaryExpr, UnaryOp,
    VariableExpr,
};
pub use pretty::print_tree;
pub use program::Program;
pub use statements::{
    AssignStmt, AssignTarget, CompoundStmt, ForStmt, IfStmt, ProcCallStmt, ReturnStmt, Statement, WhileStmt,
};
pub use types::DataType;
