use indexmap::IndexMap;
use modc_ast::DataType;
use modc_span::Symbol;

/// A user procedure's type-only signature, cached once when the declaration
/// is registered so call sites never need to re-walk the AST.
#[derive(Clone, Debug)]
pub struct ProcSignature {
    pub params: Vec<ParamSignature>,
    pub return_type: Option<DataType>,
}

#[derive(Clone, Debug)]
pub struct ParamSignature {
    pub ty: DataType,
    pub dims: Vec<u32>,
    pub by_reference: bool,
}

/// `Write`/`WriteLn` bypass the normal signature check entirely: they accept
/// any number of arguments of any type. Modeling them as their own kind
/// keeps that bypass explicit instead of special-casing an empty parameter
/// list by name.
#[derive(Clone, Debug)]
pub enum ProcKind {
    Builtin,
    User(ProcSignature),
}

/// The flat, non-scoped table every procedure declaration is registered
/// into regardless of its lexical nesting depth. Unlike variables,
/// procedures never shadow one another here: declaring the same name twice,
/// at any nesting level, is an error.
#[derive(Debug)]
pub struct ProcedureTable {
    procedures: IndexMap<Symbol, ProcKind>,
}

impl ProcedureTable {
    pub fn with_builtins() -> Self {
        let mut procedures = IndexMap::new();
        procedures.insert(Symbol::intern("Write"), ProcKind::Builtin);
        procedures.insert(Symbol::intern("WriteLn"), ProcKind::Builtin);
        Self { procedures }
    }

    pub fn declare(&mut self, name: Symbol, signature: ProcSignature) -> bool {
        if self.procedures.contains_key(&name) {
            return false;
        }
        self.procedures.insert(name, ProcKind::User(signature));
        true
    }

    pub fn get(&self, name: Symbol) -> Option<&ProcKind> {
        self.procedures.get(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preregistered() {
        let table = ProcedureTable::with_builtins();
        assert!(matches!(table.get(Symbol::intern("Write")), Some(ProcKind::Builtin)));
        assert!(matches!(table.get(Symbol::intern("WriteLn")), Some(ProcKind::Builtin)));
    }

    #[test]
    fn redeclaring_a_builtin_name_fails() {
        let mut table = ProcedureTable::with_builtins();
        assert!(!table.declare(Symbol::intern("Write"), ProcSignature { params: vec![], return_type: None }));
    }
}
