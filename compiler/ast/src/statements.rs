use crate::expressions::Expression;
use modc_span::{Span, Symbol};
use serde::{Deserialize, Serialize};

/// The target of an `Assign` statement: a bare name or an array element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    Name(Symbol, Span),
    ArrayElement { name: Symbol, indices: Vec<Expression>, span: Span },
}

impl AssignTarget {
    pub fn span(&self) -> Span {
        match self {
            AssignTarget::Name(_, span) => *span,
            AssignTarget::ArrayElement { span, .. } => *span,
        }
    }

    pub fn name(&self) -> Symbol {
        match self {
            AssignTarget::Name(name, _) => *name,
            AssignTarget::ArrayElement { name, .. } => *name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assign(AssignStmt),
    ProcCall(ProcCallStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Compound(CompoundStmt),
    Return(ReturnStmt),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: AssignTarget,
    pub value: Expression,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcCallStmt {
    pub name: Symbol,
    pub args: Vec<Expression>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub cond: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub var: Symbol,
    pub start: Expression,
    pub end: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundStmt {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub span: Span,
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Assign(s) => s.span,
            Statement::ProcCall(s) => s.span,
            Statement::If(s) => s.span,
            Statement::While(s) => s.span,
            Statement::For(s) => s.span,
            Statement::Compound(s) => s.span,
            Statement::Return(s) => s.span,
        }
    }
}
