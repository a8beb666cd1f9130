//! A semiring pairs an additive monoid with a multiplicative binary op.

use std::sync::Arc;

use crate::binop::BinaryOp;
use crate::monoid::Monoid;
use crate::scalar::Scalar;

/// `(monoid, ⊗)` with the compatibility invariant `ztype(⊗) == ztype(monoid)`
/// enforced by the type system: both operate on `Z`.
///
/// `X` and `Y` are the multiply operator's input types (A's and B's scalar
/// types, possibly distinct and possibly different from `Z`); `Z` is both
/// the multiply operator's output type and the monoid's type, matching the
/// contract in §3.
pub struct Semiring<X: Scalar, Y: Scalar, Z: Scalar> {
    monoid: Arc<dyn Monoid<Z>>,
    multiply: Arc<dyn BinaryOp<X, Y, Z>>,
    name: &'static str,
}

impl<X: Scalar, Y: Scalar, Z: Scalar> Semiring<X, Y, Z> {
    /// Build a semiring from a monoid and multiply operator.
    pub fn new(
        name: &'static str,
        monoid: Arc<dyn Monoid<Z>>,
        multiply: Arc<dyn BinaryOp<X, Y, Z>>,
    ) -> Self {
        Semiring {
            monoid,
            multiply,
            name,
        }
    }

    /// A human-readable name (`"PLUS_TIMES"`, `"MIN_PLUS"`, ...), used only
    /// in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The additive monoid ⊕.
    pub fn monoid(&self) -> &dyn Monoid<Z> {
        self.monoid.as_ref()
    }

    /// The multiplicative operator ⊗.
    pub fn multiply(&self) -> &dyn BinaryOp<X, Y, Z> {
        self.multiply.as_ref()
    }

    /// `⊕_identity`, the additive identity of `Z`.
    pub fn zero(&self) -> Z {
        self.monoid.identity()
    }

    /// `⊗(x, y)` then ready for `⊕`.
    #[inline]
    pub fn multiply_apply(&self, x: X, y: Y) -> Z {
        self.multiply.apply(x, y)
    }

    /// `⊗(y, x)` — the `flipxy` form used to avoid materializing a
    /// transpose when `⊗` is not commutative: swap which operand lands in
    /// `⊗`'s `x`/`y` slots. `X` and `Y` may differ, so the swapped operands
    /// are routed back through the operator's declared slots via
    /// `ScalarCast`, the same casting machinery the generic fallback
    /// kernel uses.
    #[inline]
    pub fn multiply_apply_flipped(&self, x: X, y: Y) -> Z
    where
        Y: crate::scalar::ScalarCast<X>,
        X: crate::scalar::ScalarCast<Y>,
    {
        self.multiply.apply(y.cast(), x.cast())
    }

    /// `a ⊕ b`.
    #[inline]
    pub fn add(&self, a: Z, b: Z) -> Z {
        self.monoid.combine(a, b)
    }

    /// The monoid's terminal value, if any (§4.3's early-exit).
    pub fn terminal(&self) -> Option<Z> {
        self.monoid.terminal()
    }
}

impl<X: Scalar, Y: Scalar, Z: Scalar> Clone for Semiring<X, Y, Z> {
    fn clone(&self) -> Self {
        Semiring {
            monoid: Arc::clone(&self.monoid),
            multiply: Arc::clone(&self.multiply),
            name: self.name,
        }
    }
}

/// Construct the classic `PLUS_TIMES` semiring over a single numeric type.
pub fn plus_times<T>() -> Semiring<T, T, T>
where
    T: Scalar,
    crate::monoid::Plus: Monoid<T>,
    crate::binop::Times: BinaryOp<T, T, T>,
{
    Semiring::new(
        "PLUS_TIMES",
        Arc::new(crate::monoid::Plus),
        Arc::new(crate::binop::Times),
    )
}

/// Construct the `MIN_PLUS` (tropical / shortest-path) semiring.
pub fn min_plus<T>() -> Semiring<T, T, T>
where
    T: Scalar,
    crate::monoid::Min: Monoid<T>,
    crate::binop::Plus: BinaryOp<T, T, T>,
{
    Semiring::new(
        "MIN_PLUS",
        Arc::new(crate::monoid::Min),
        Arc::new(crate::binop::Plus),
    )
}

/// Construct the boolean `LOR_LAND` semiring, used for graph reachability.
pub fn lor_land() -> Semiring<bool, bool, bool> {
    Semiring::new(
        "LOR_LAND",
        Arc::new(crate::monoid::Lor),
        Arc::new(crate::binop::Land),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_times_basic() {
        let sr: Semiring<i32, i32, i32> = plus_times();
        assert_eq!(sr.zero(), 0);
        let t = sr.multiply_apply(3, 4);
        assert_eq!(t, 12);
        assert_eq!(sr.add(t, 5), 17);
    }

    #[test]
    fn min_plus_has_infinite_identity() {
        let sr: Semiring<f64, f64, f64> = min_plus();
        assert_eq!(sr.zero(), f64::INFINITY);
        assert_eq!(sr.multiply_apply(1.0, 2.0), 3.0);
        assert_eq!(sr.add(3.0, 1.0), 1.0);
    }
}
