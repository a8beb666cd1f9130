//! Recognizing built-in semirings for diagnostics.
//!
//! The original dispatches between hundreds of code-generated kernels, one
//! per (monoid, multiply-op, type) triple, falling back to a generic
//! function-pointer kernel for anything else. Here every kernel is already
//! generic over `Monoid<T>`/`BinaryOp<X,Y,Z>` and monomorphized by the
//! compiler at the call site, so there is no runtime kernel table to build:
//! `saxpy_multiply`/`dot2`/`dot3`/`dot4` are the same code whether the
//! semiring is a recognized built-in or an arbitrary user-defined one.
//!
//! What's left of the original "built-in vs generic" distinction is purely
//! informational: this registry lets the driver log whether a call used a
//! named built-in combination, for tracing/diagnostics only.

use once_cell::sync::Lazy;

use graphblas_core::binop::BinaryOpKind;
use graphblas_core::monoid::MonoidKind;

static BUILTIN_COMBOS: Lazy<Vec<(MonoidKind, BinaryOpKind)>> = Lazy::new(|| {
    vec![
        (MonoidKind::Plus, BinaryOpKind::Times),
        (MonoidKind::Min, BinaryOpKind::Plus),
        (MonoidKind::Max, BinaryOpKind::Plus),
        (MonoidKind::Lor, BinaryOpKind::Times),
        (MonoidKind::Land, BinaryOpKind::Plus),
        (MonoidKind::Any, BinaryOpKind::Times),
    ]
});

/// Whether `(monoid, multiply)` names one of the recognized built-in
/// semirings. Informational only; both branches run identical generic code.
pub fn is_builtin_combo(monoid: MonoidKind, multiply: BinaryOpKind) -> bool {
    BUILTIN_COMBOS.iter().any(|&(m, b)| m == monoid && b == multiply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_times_is_recognized() {
        assert!(is_builtin_combo(MonoidKind::Plus, BinaryOpKind::Times));
    }

    #[test]
    fn unusual_combo_is_not_recognized() {
        assert!(!is_builtin_combo(MonoidKind::Max, BinaryOpKind::IsEq));
    }
}
