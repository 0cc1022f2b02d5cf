use crate::value::Value;

/// The "default fixed format" the evaluator uses for `Write`/`WriteLn` on a
/// REAL value: six fractional digits, then trailing zeros trimmed back to a
/// single digit after the point so `3.5` prints as `3.5` rather than
/// `3.500000`, while `3.0` still prints as `3.0` rather than `3`.
pub fn format_real(value: f64) -> String {
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') { format!("{trimmed}0") } else { trimmed.to_string() }
}

/// Renders a scalar argument the way `Write`/`WriteLn` render it: integers
/// as plain decimal, reals via [`format_real`], strings verbatim. Arrays
/// never reach `Write` directly (the analyzer rejects them as arguments to
/// an array-typed expression position), so this only needs to cover the
/// three scalar kinds.
pub fn format_argument(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => format_real(*r),
        Value::Str(s) => s.clone(),
        Value::Array(_) => unreachable!("Write/WriteLn never receive a bare array argument"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros_but_keeps_one_fractional_digit() {
        assert_eq!(format_real(3.5), "3.5");
        assert_eq!(format_real(3.0), "3.0");
        assert_eq!(format_real(0.1), "0.1");
    }

    #[test]
    fn negative_reals_format_the_same_way() {
        assert_eq!(format_real(-2.25), "-2.25");
    }
}
