use indexmap::IndexMap;
use modc_ast::DataType;
use modc_span::Symbol;

/// Where a named variable's `alloca`'d stack slot lives, and what it holds.
/// Modc has no block-scoped variables (`IF`/`WHILE`/`FOR` never introduce
/// new declarations), so one flat table per function body is enough —
/// unlike `modc_passes::ScopeChain`, this never needs to nest.
#[derive(Clone, Debug)]
pub struct LocalSlot {
    pub register: String,
    pub ty: DataType,
    pub dims: Vec<u32>,
}

impl LocalSlot {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    pub fn element_count(&self) -> u32 {
        self.dims.iter().product()
    }
}

#[derive(Default)]
pub struct LocalTable {
    slots: IndexMap<Symbol, LocalSlot>,
}

impl LocalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: Symbol, slot: LocalSlot) {
        self.slots.insert(name, slot);
    }

    pub fn get(&self, name: Symbol) -> Option<&LocalSlot> {
        self.slots.get(&name)
    }

    pub fn keys(&self) -> Vec<Symbol> {
        self.slots.keys().copied().collect()
    }
}
