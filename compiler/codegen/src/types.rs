use modc_ast::DataType;

/// The closed set of IR-level types: 32-bit integers, 64-bit floats, and
/// byte pointers (used for both `STRING` values and array element
/// addresses). Booleans are represented as `i32` throughout, consistent
/// with the evaluator encoding conditions as 0/1 `INTEGER`s.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrType {
    I32,
    Double,
    I8Ptr,
}

impl IrType {
    pub fn name(self) -> &'static str {
        match self {
            IrType::I32 => "i32",
            IrType::Double => "double",
            IrType::I8Ptr => "i8*",
        }
    }

    pub fn from_data_type(ty: DataType) -> IrType {
        match ty {
            DataType::Integer => IrType::I32,
            DataType::Real => IrType::Double,
            DataType::String => IrType::I8Ptr,
            DataType::Array => unreachable!("arrays are addressed through their element type, never tagged directly"),
        }
    }
}
