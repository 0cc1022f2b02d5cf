use crate::types::IrType;

/// A lowered operand: either a fresh SSA register (`%t3`) or a literal
/// written out in the IR's own textual syntax. Immediates never need a
/// preceding instruction to produce, so keeping them un-materialized
/// (rather than always emitting a `load`) avoids a lot of dead register
/// traffic for expressions like `x + 1`.
#[derive(Clone, Debug)]
pub struct IrValue {
    pub text: String,
    pub ty: IrType,
}

impl IrValue {
    pub fn register(name: String, ty: IrType) -> Self {
        Self { text: name, ty }
    }

    pub fn int_const(value: i64) -> Self {
        Self { text: value.to_string(), ty: IrType::I32 }
    }

    pub fn real_const(value: f64) -> Self {
        Self { text: format!("{value:e}"), ty: IrType::Double }
    }
}
