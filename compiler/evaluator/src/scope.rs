use crate::value::Value;
use indexmap::IndexMap;
use modc_span::Symbol;
use std::cell::RefCell;
use std::rc::Rc;

/// A variable's runtime storage. By-reference parameters bind the same
/// `Cell` the caller's variable already owns; by-value parameters and local
/// declarations get a fresh one.
pub type Cell = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> Cell {
    Rc::new(RefCell::new(value))
}

#[derive(Default)]
struct Scope {
    bindings: IndexMap<Symbol, Cell>,
}

/// A stack of scopes, innermost last, mirroring `modc_passes::ScopeChain`'s
/// shape but over runtime cells instead of static types. The global scope
/// is pushed once and never popped for the lifetime of a run.
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: Symbol, cell: Cell) {
        self.scopes.last_mut().expect("scope stack is never empty").bindings.insert(name, cell);
    }

    pub fn resolve(&self, name: Symbol) -> Option<Cell> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(&name).cloned())
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_declaration_shadows_outer_cell() {
        let mut stack = ScopeStack::new();
        stack.declare(Symbol::intern("x"), new_cell(Value::Integer(1)));
        stack.push();
        stack.declare(Symbol::intern("x"), new_cell(Value::Integer(2)));
        assert_eq!(*stack.resolve(Symbol::intern("x")).unwrap().borrow(), Value::Integer(2));
        stack.pop();
        assert_eq!(*stack.resolve(Symbol::intern("x")).unwrap().borrow(), Value::Integer(1));
    }

    #[test]
    fn sharing_a_cell_makes_writes_visible_through_both_bindings() {
        let mut stack = ScopeStack::new();
        let cell = new_cell(Value::Integer(5));
        stack.declare(Symbol::intern("k"), cell.clone());
        stack.push();
        stack.declare(Symbol::intern("x"), cell.clone());
        *stack.resolve(Symbol::intern("x")).unwrap().borrow_mut() = Value::Integer(6);
        assert_eq!(*cell.borrow(), Value::Integer(6));
    }
}
