use crate::expressions::Expression;
use crate::statements::Statement;
use crate::types::DataType;
use modc_span::{Span, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    Const(ConstDecl),
    Var(VarDecl),
    Proc(ProcDecl),
}

impl Declaration {
    pub fn name(&self) -> Symbol {
        match self {
            Declaration::Const(d) => d.name,
            Declaration::Var(d) => d.name,
            Declaration::Proc(d) => d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Const(d) => d.span,
            Declaration::Var(d) => d.span,
            Declaration::Proc(d) => d.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: Symbol,
    pub value: Expression,
    pub span: Span,
}

/// `dims` is empty for a plain scalar and holds one entry per array axis
/// otherwise: multi-dimensional arrays are represented uniformly by a
/// dimension list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Symbol,
    pub ty: DataType,
    pub dims: Vec<u32>,
    pub span: Span,
}

impl VarDecl {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// `dims` records the full dimension list for an array parameter rather
/// than erasing it to an opaque pointer, so bounds checking works the same
/// way for parameters as for locally declared arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Symbol,
    pub ty: DataType,
    pub dims: Vec<u32>,
    pub by_reference: bool,
    pub span: Span,
}

impl Parameter {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcDecl {
    pub name: Symbol,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<DataType>,
    pub locals: Vec<Declaration>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl ProcDecl {
    pub fn is_function(&self) -> bool {
        self.return_type.is_some()
    }
}
