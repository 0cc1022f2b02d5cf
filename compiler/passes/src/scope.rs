use indexmap::IndexMap;
use modc_ast::DataType;
use modc_span::Symbol;

/// The static type of a name bound in the variable/constant scope chain. The
/// procedure table is kept separately (see `crate::procedures`): this
/// language's procedures live in one flat, non-scoped table rather than
/// shadowing through nested scopes the way variables do.
#[derive(Clone, Debug)]
pub enum Binding {
    Const(DataType),
    Var { ty: DataType, dims: Vec<u32> },
}

/// One level of the scope chain. Modc procedures may nest, so a body may
/// need to resolve a name through any number of enclosing procedure scopes
/// before reaching the global one.
#[derive(Default, Debug)]
pub struct Scope {
    bindings: IndexMap<Symbol, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name`, returning `false` if it already exists in this exact
    /// scope (shadowing an enclosing scope's binding is allowed; redeclaring
    /// within the same scope is not).
    pub fn declare(&mut self, name: Symbol, binding: Binding) -> bool {
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, binding);
        true
    }

    pub fn get(&self, name: Symbol) -> Option<&Binding> {
        self.bindings.get(&name)
    }
}

/// A stack of [`Scope`]s, innermost last; lookups walk from the innermost
/// scope outward to the global one.
#[derive(Default, Debug)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: Symbol, binding: Binding) -> bool {
        self.scopes.last_mut().expect("scope chain is never empty").declare(name, binding)
    }

    pub fn resolve(&self, name: Symbol) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer_binding() {
        let mut chain = ScopeChain::new();
        chain.declare(Symbol::intern("x"), Binding::Const(DataType::Integer));
        chain.push();
        chain.declare(Symbol::intern("x"), Binding::Var { ty: DataType::Real, dims: vec![] });
        match chain.resolve(Symbol::intern("x")) {
            Some(Binding::Var { ty: DataType::Real, .. }) => {}
            other => panic!("expected the inner Var binding, got {other:?}"),
        }
        chain.pop();
        match chain.resolve(Symbol::intern("x")) {
            Some(Binding::Const(DataType::Integer)) => {}
            other => panic!("expected the outer Const binding again, got {other:?}"),
        }
    }

    #[test]
    fn redeclaring_in_the_same_scope_fails() {
        let mut chain = ScopeChain::new();
        assert!(chain.declare(Symbol::intern("y"), Binding::Const(DataType::Integer)));
        assert!(!chain.declare(Symbol::intern("y"), Binding::Const(DataType::Real)));
    }
}
