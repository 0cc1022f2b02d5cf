use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed data-type enumeration. `Array` is a coarse tag; the element
/// type lives on the declaration that introduced the array (see
/// `VarDecl`/`Parameter`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Real,
    String,
    Array,
}

impl DataType {
    /// One-way widening: INTEGER is assignable where REAL is expected.
    pub fn widens_to(self, target: DataType) -> bool {
        self == target || (self == DataType::Integer && target == DataType::Real)
    }

    /// Symmetric-equal plus the widening rule, used wherever "type
    /// compatible" is required rather than "identical".
    pub fn compatible_with(self, other: DataType) -> bool {
        self.widens_to(other) || other.widens_to(self)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::String => "STRING",
            DataType::Array => "ARRAY",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widens_to_real_but_not_back() {
        assert!(DataType::Integer.widens_to(DataType::Real));
        assert!(!DataType::Real.widens_to(DataType::Integer));
    }

    #[test]
    fn compatible_with_is_symmetric() {
        assert!(DataType::Integer.compatible_with(DataType::Real));
        assert!(DataType::Real.compatible_with(DataType::Integer));
        assert!(!DataType::String.compatible_with(DataType::Integer));
    }
}
