use crate::declarations::Declaration;
use crate::statements::Statement;
use modc_span::Symbol;
use serde::{Deserialize, Serialize};

/// The root of the AST: `MODULE N; decls BEGIN stmts END N.`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: Symbol,
    pub declarations: Vec<Declaration>,
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(name: Symbol, declarations: Vec<Declaration>, statements: Vec<Statement>) -> Self {
        Self { name, declarations, statements }
    }
}
