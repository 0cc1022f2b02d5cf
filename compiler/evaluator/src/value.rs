use modc_ast::DataType;

/// A runtime value. Arrays are stored flat, row-major, alongside their
/// dimension list so bounds checking and multi-axis indexing need no
/// nested `Vec<Vec<..>>` recursion.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Str(String),
    Array(ArrayValue),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    pub dims: Vec<u32>,
    pub element_ty: DataType,
    pub data: Vec<Value>,
}

impl ArrayValue {
    /// The number of elements implied by `dims`, e.g. `[10, 10]` → 100.
    pub fn len(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Resolves a per-axis index list to a flat offset into `data`,
    /// checking every axis against `[0, dim)` before combining them.
    pub fn flat_index(&self, indices: &[i64]) -> Result<usize, String> {
        if indices.len() != self.dims.len() {
            return Err(format!("expected {} index/indices, found {}", self.dims.len(), indices.len()));
        }
        let mut offset: usize = 0;
        for (axis, (&index, &dim)) in indices.iter().zip(self.dims.iter()).enumerate() {
            if index < 0 || index as u64 >= dim as u64 {
                return Err(format!("index {index} out of bounds for axis {axis} (size {dim})"));
            }
            offset = offset * dim as usize + index as usize;
        }
        Ok(offset)
    }
}

impl Value {
    pub fn ty(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Str(_) => DataType::String,
            Value::Array(_) => DataType::Array,
        }
    }

    /// The type-default value used to initialize a variable at declaration:
    /// `0` / `0.0` / `""`, or (for arrays) a flat buffer of the element
    /// default repeated once per cell.
    pub fn default_for(ty: DataType, dims: &[u32]) -> Value {
        if dims.is_empty() {
            return match ty {
                DataType::Integer => Value::Integer(0),
                DataType::Real => Value::Real(0.0),
                DataType::String => Value::Str(String::new()),
                DataType::Array => unreachable!("a scalar declaration never carries the Array tag"),
            };
        }
        let len: usize = dims.iter().map(|&d| d as usize).product();
        let element = Value::default_for(ty, &[]);
        Value::Array(ArrayValue { dims: dims.to_vec(), element_ty: ty, data: vec![element; len] })
    }

    /// Widens an INTEGER to REAL in place where the static type checker has
    /// already confirmed the target expects REAL; returns the value
    /// unchanged otherwise.
    pub fn widen_to(self, target: DataType) -> Value {
        match (self, target) {
            (Value::Integer(i), DataType::Real) => Value::Real(i as f64),
            (other, _) => other,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Truthiness used for IF/WHILE conditions and the `AND`/`OR` operands:
    /// any nonzero INTEGER is true.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Integer(i) if *i != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_for_array_fills_every_cell() {
        let v = Value::default_for(DataType::Integer, &[2, 3]);
        match v {
            Value::Array(a) => {
                assert_eq!(a.len(), 6);
                assert!(a.data.iter().all(|v| matches!(v, Value::Integer(0))));
            }
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn flat_index_is_row_major() {
        let a = ArrayValue { dims: vec![10, 10], element_ty: DataType::Integer, data: vec![Value::Integer(0); 100] };
        assert_eq!(a.flat_index(&[3, 4]).unwrap(), 34);
    }

    #[test]
    fn flat_index_rejects_out_of_range_axis() {
        let a = ArrayValue { dims: vec![3, 3], element_ty: DataType::Integer, data: vec![Value::Integer(0); 9] };
        assert!(a.flat_index(&[3, 0]).is_err());
        assert!(a.flat_index(&[-1, 0]).is_err());
    }
}
