//! The top-level `multiply` entry point: selects dot3/dot4/dot2/saxpy per
//! §4.4's rules, applies descriptor-driven transposition and `flipxy`, and
//! validates the contracted dimension.

use graphblas_core::descriptor::{Descriptor, EngineConfig};
use graphblas_core::error::{Error, Result};
use graphblas_core::mask::Mask;
use graphblas_core::matrix::Matrix;
use graphblas_core::scalar::{Scalar, ScalarCast};
use graphblas_core::semiring::Semiring;

use crate::dispatch::is_builtin_combo;
use crate::dot::{dot2, dot3, dot4};
use crate::partition::column_flops;
use crate::saxpy::saxpy_multiply;

/// `C⟨M⟩ = A⊕.⊗B`, choosing the algorithm per §4.4.
///
/// `a`/`b`/`m` must already be pending-free (call `wait()` on them first);
/// this mirrors the convention `Mask`/`Matrix::vector` already rely on
/// rather than re-deriving `wait()` through a borrowed reference.
#[tracing::instrument(skip_all, fields(a_vlen = a.vlen(), a_vdim = a.vdim(), b_vlen = b.vlen(), b_vdim = b.vdim()))]
pub fn multiply<X, Y, Z, M>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    m: Option<&Matrix<M>>,
    c_in_place: Option<&Matrix<Z>>,
    sr: &Semiring<X, Y, Z>,
    descriptor: &Descriptor,
    flipxy: bool,
    cfg: &EngineConfig,
) -> Result<Matrix<Z>>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
    M: Scalar + ScalarCast<bool>,
{
    debug_assert!(!a.has_pending(), "multiply requires a pending-free A");
    debug_assert!(!b.has_pending(), "multiply requires a pending-free B");
    if let Some(m) = m {
        debug_assert!(!m.has_pending(), "multiply requires a pending-free mask");
    }

    let a_t;
    let a = if descriptor.transpose_a {
        a_t = a.transpose();
        &a_t
    } else {
        a
    };
    let b_t;
    let b = if descriptor.transpose_b {
        b_t = b.transpose();
        &b_t
    } else {
        b
    };

    if a.vdim() != b.vlen() {
        return Err(Error::DimMismatch {
            lhs_name: "A.vdim",
            lhs: a.vdim(),
            rhs_name: "B.vlen",
            rhs: b.vlen(),
        });
    }
    if let Some(m) = m {
        if m.vlen() != a.vlen() || m.vdim() != b.vdim() {
            return Err(Error::DimMismatch {
                lhs_name: "M.vlen",
                lhs: m.vlen(),
                rhs_name: "A.vlen",
                rhs: a.vlen(),
            });
        }
    }

    let mask = match m {
        Some(m) => Mask::new(m, descriptor.mask_structural, descriptor.mask_complement),
        None => Mask::none(),
    };

    tracing::debug!(
        semiring = sr.name(),
        builtin = is_builtin_combo(sr.monoid().kind(), sr.multiply().kind()),
    );

    // dot2/dot3/dot4 compute `Xᵀ·B` from whatever `X` they're handed, via
    // column-vs-column inner products: `Σ_k X(k,i)·B(k,j) = (Xᵀ·B)(i,j)`.
    // saxpy consumes `a` as-is (`C = A⊕.⊗B`); to get the same `C` out of a
    // dot variant we hand it `Aᵀ` so `(Aᵀ)ᵀ·B == A·B`. Transposed lazily,
    // only on the branches that actually pick a dot variant.

    // Rule 1: mask present and not complemented -> dot3, driven by nnz(M).
    if let Some(m) = m {
        if mask.is_present() && !descriptor.mask_complement {
            tracing::debug!(algorithm = "dot3");
            let a_t = a.transpose();
            return Ok(dot3(&a_t, b, m, descriptor.mask_structural, sr, flipxy));
        }
    }

    // Rule 2: in-place dense accumulation.
    if let Some(c_in) = c_in_place {
        if mask.is_present() {
            // unreachable: rule 1 already handled the non-complemented mask
            // case, and a complemented mask falls through to rule 3/4 below.
        } else if is_dense(c_in) {
            tracing::debug!(algorithm = "dot4");
            let a_t = a.transpose();
            return Ok(dot4(c_in, &a_t, b, sr, flipxy));
        }
    }

    // Rule 3: heuristic dot2 vs saxpy.
    if dot2_is_cheaper(a, b) {
        tracing::debug!(algorithm = "dot2");
        let a_t = a.transpose();
        return Ok(dot2(&a_t, b, sr, &mask, flipxy));
    }

    // Rule 4: saxpy.
    tracing::debug!(algorithm = "saxpy");
    saxpy_multiply(a, b, sr, &mask, flipxy, cfg)
}

/// A "dense" `C_in_place`: every vector present and, for a non-hypersparse
/// matrix, fully populated (`vector_nnz(k) == vlen` for every `k`).
fn is_dense<Z: Scalar>(c: &Matrix<Z>) -> bool {
    !c.is_hyper() && c.nvec() == c.vdim() && (0..c.nvec()).all(|k| c.vector_nnz(k) == c.vlen())
}

/// Rough cost comparison between the dot2 grid sweep (`Ω(m·n)`) and the
/// saxpy flop-driven accumulation (`Σ flops(j)`). Prefers dot2 only when its
/// grid is markedly cheaper, since dot2 pays for every `(i, j)` pair even
/// where the product is structurally empty.
fn dot2_is_cheaper<X: Scalar, Y: Scalar>(a: &Matrix<X>, b: &Matrix<Y>) -> bool {
    let grid = a.vdim() as f64 * b.vdim() as f64;
    let saxpy_flops: f64 = column_flops(a, b).iter().sum();
    grid > 0.0 && grid < saxpy_flops
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphblas_core::matrix::Orientation;
    use graphblas_core::semiring::plus_times;

    fn identity(n: usize) -> Matrix<i32> {
        Matrix::from_triples(
            n,
            n,
            Orientation::ColMajor,
            false,
            (0..n).map(|i| (i, i, 1i32)),
            |x, _| x,
        )
    }

    #[test]
    fn identity_times_dense_matches_dense_operand() {
        let a = identity(2);
        let b = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 2i32), (1, 0, 4), (0, 1, 3), (1, 1, 5)],
            |x, _| x,
        );
        let sr: Semiring<i32, i32, i32> = plus_times();
        let descriptor = Descriptor::default();
        let cfg = EngineConfig::default();
        let c: Matrix<i32> =
            multiply::<i32, i32, i32, bool>(&a, &b, None, None, &sr, &descriptor, false, &cfg).unwrap();
        assert_eq!(c.live_nnz(), 4);
    }

    #[test]
    fn mismatched_contracted_dimension_is_an_error() {
        let a = identity(2);
        let b = identity(3);
        let sr: Semiring<i32, i32, i32> = plus_times();
        let descriptor = Descriptor::default();
        let cfg = EngineConfig::default();
        let result =
            multiply::<i32, i32, i32, bool>(&a, &b, None, None, &sr, &descriptor, false, &cfg);
        assert!(matches!(result, Err(Error::DimMismatch { .. })));
    }

    #[test]
    fn structural_mask_selects_dot3_and_filters_output() {
        let a = identity(2);
        let b = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 2i32), (1, 0, 4), (0, 1, 3), (1, 1, 5)],
            |x, _| x,
        );
        let mask = Matrix::from_triples(2, 2, Orientation::ColMajor, false, vec![(0, 0, true)], |x, _| x);
        let sr: Semiring<i32, i32, i32> = plus_times();
        let descriptor = Descriptor::default().with_mask_structural(true);
        let cfg = EngineConfig::default();
        let c = multiply(&a, &b, Some(&mask), None, &sr, &descriptor, false, &cfg).unwrap();
        assert_eq!(c.live_nnz(), 1);
        let (ai, ax) = c.vector(0);
        assert_eq!(ai, &[0]);
        assert_eq!(ax, &[2]);
    }

    /// A non-symmetric `A` catches a transpose-direction bug: with a
    /// symmetric (e.g. identity) `A`, `dot3`'s `Aᵀ·B` and saxpy's `A·B`
    /// agree even if the bridging transpose were dropped entirely.
    #[test]
    fn dot3_on_rectangular_a_matches_saxpy() {
        // A is 2x3 (vlen=2, vdim=3): A(0,0)=1, A(1,1)=2, A(0,2)=3.
        let a = Matrix::from_triples(
            2,
            3,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 1, 2i32), (0, 2, 3i32)],
            |x, _| x,
        );
        // B.vlen() must equal A.vdim() (3) for the contracted dimension to agree.
        let b = Matrix::from_triples(
            3,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 5i32), (1, 0, 7i32), (2, 1, 9i32)],
            |x, _| x,
        );
        let sr: Semiring<i32, i32, i32> = plus_times();
        let cfg = EngineConfig::default();
        let mask: Mask<bool> = Mask::none();
        let via_saxpy = saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap();

        let full_mask = Matrix::from_triples(
            a.vlen(),
            b.vdim(),
            Orientation::ColMajor,
            false,
            (0..a.vlen())
                .flat_map(|i| (0..b.vdim()).map(move |j| (i, j, true)))
                .collect::<Vec<_>>(),
            |x, _| x,
        );
        let descriptor = Descriptor::default().with_mask_structural(true);
        let via_dot3 =
            multiply(&a, &b, Some(&full_mask), None, &sr, &descriptor, false, &cfg).unwrap();

        assert_eq!(via_saxpy.vlen(), via_dot3.vlen());
        assert_eq!(via_saxpy.vdim(), via_dot3.vdim());
        for k in 0..via_saxpy.nvec() {
            assert_eq!(via_saxpy.vector(k), via_dot3.vector(k));
        }
    }
}
