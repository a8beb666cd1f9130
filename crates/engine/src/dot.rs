//! The dot engine: `C = Aᵀ·B` computed as inner products, in the three
//! variants selected by the driver based on mask shape.

use rayon::prelude::*;

use graphblas_core::mask::Mask;
use graphblas_core::matrix::Matrix;
use graphblas_core::scalar::{Scalar, ScalarCast};
use graphblas_core::semiring::Semiring;

fn multiply_term<X, Y, Z>(sr: &Semiring<X, Y, Z>, aval: X, bval: Y, flipxy: bool) -> Z
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
{
    if flipxy {
        sr.multiply_apply_flipped(aval, bval)
    } else {
        sr.multiply_apply(aval, bval)
    }
}

/// `⊕_k A(k,i)⊗B(k,j)` via two-pointer merge over sorted row lists, with
/// terminal early-exit. `None` means structurally empty (no shared k).
fn dot_product<X, Y, Z>(
    a_rows: &[i64],
    a_vals: &[X],
    b_rows: &[i64],
    b_vals: &[Y],
    sr: &Semiring<X, Y, Z>,
    flipxy: bool,
) -> Option<Z>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
{
    let (mut ia, mut ib) = (0usize, 0usize);
    let mut acc: Option<Z> = None;
    let terminal = sr.terminal();
    while ia < a_rows.len() && ib < b_rows.len() {
        let (ra, rb) = (a_rows[ia], b_rows[ib]);
        if ra == rb {
            let t = multiply_term(sr, a_vals[ia], b_vals[ib], flipxy);
            let combined = match acc {
                Some(prev) => sr.add(prev, t),
                None => t,
            };
            acc = Some(combined);
            if let Some(term) = terminal {
                if combined == term {
                    return Some(combined);
                }
            }
            ia += 1;
            ib += 1;
        } else if ra < rb {
            ia += 1;
        } else {
            ib += 1;
        }
    }
    acc
}

/// `C = Aᵀ·B`, or `C⟨¬M⟩ = Aᵀ·B` when `mask` carries a complemented mask.
/// Visits every `(i, j)` pair in the `A.vdim() × B.vdim()` grid; intended
/// for cases where `C` is expected dense enough that this Ω(m·n) sweep
/// beats saxpy's flop-driven accumulation.
#[tracing::instrument(skip_all, fields(a_vlen = a.vlen(), a_vdim = a.vdim(), b_vlen = b.vlen(), b_vdim = b.vdim()))]
pub fn dot2<X, Y, Z, M>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    sr: &Semiring<X, Y, Z>,
    mask: &Mask<M>,
    flipxy: bool,
) -> Matrix<Z>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
    M: Scalar + ScalarCast<bool>,
{
    let pairs: Vec<(usize, usize)> = (0..a.nvec())
        .flat_map(|ai| (0..b.nvec()).map(move |bj| (ai, bj)))
        .collect();

    let triples: Vec<(usize, usize, Z)> = pairs
        .par_iter()
        .filter_map(|&(ai_pos, bj_pos)| {
            let i = a.vector_logical(ai_pos);
            let j = b.vector_logical(bj_pos);
            if !mask.allows(i, j) {
                return None;
            }
            let (a_rows, a_vals) = a.vector(ai_pos);
            let (b_rows, b_vals) = b.vector(bj_pos);
            dot_product(a_rows, a_vals, b_rows, b_vals, sr, flipxy).map(|z| (i, j, z))
        })
        .collect();

    Matrix::from_triples(
        a.vdim(),
        b.vdim(),
        b.orientation(),
        a.is_hyper() || b.is_hyper(),
        triples,
        |keep, _discard| keep,
    )
}

/// `C⟨M⟩ = Aᵀ·B`, visiting only positions `M` structurally allows. Work is
/// Ω(nnz(M)) rather than Ω(m·n).
#[tracing::instrument(skip_all, fields(a_vlen = a.vlen(), a_vdim = a.vdim(), b_vlen = b.vlen(), b_vdim = b.vdim(), m_nnz = m.live_nnz()))]
pub fn dot3<X, Y, Z, M>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    m: &Matrix<M>,
    mask_structural: bool,
    sr: &Semiring<X, Y, Z>,
    flipxy: bool,
) -> Matrix<Z>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
    M: Scalar + ScalarCast<bool>,
{
    let mut entries: Vec<(usize, usize)> = Vec::with_capacity(m.live_nnz());
    for k in 0..m.nvec() {
        let j = m.vector_logical(k);
        let (rows, vals) = m.vector(k);
        for (&row, &val) in rows.iter().zip(vals.iter()) {
            let allowed = mask_structural || ScalarCast::<bool>::cast(val);
            if allowed {
                entries.push((row as usize, j));
            }
        }
    }

    let triples: Vec<(usize, usize, Z)> = entries
        .par_iter()
        .filter_map(|&(i, j)| {
            let a_pos = a.find_vector(i)?;
            let b_pos = b.find_vector(j)?;
            let (a_rows, a_vals) = a.vector(a_pos);
            let (b_rows, b_vals) = b.vector(b_pos);
            dot_product(a_rows, a_vals, b_rows, b_vals, sr, flipxy).map(|z| (i, j, z))
        })
        .collect();

    Matrix::from_triples(
        a.vdim(),
        b.vdim(),
        b.orientation(),
        a.is_hyper() || b.is_hyper(),
        triples,
        |keep, _discard| keep,
    )
}

/// `C += Aᵀ·B` where `c_in` is dense: every `(i, j)` in `[0, vlen) × [0,
/// vdim)` already holds a stored value, which is combined with the dot
/// product via the semiring's monoid (not necessarily the same accumulator
/// the caller used to build `c_in` — the driver only selects dot4 when they
/// match).
#[tracing::instrument(skip_all, fields(c_vlen = c_in.vlen(), c_vdim = c_in.vdim(), a_vlen = a.vlen(), b_vdim = b.vdim()))]
pub fn dot4<X, Y, Z>(
    c_in: &Matrix<Z>,
    a: &Matrix<X>,
    b: &Matrix<Y>,
    sr: &Semiring<X, Y, Z>,
    flipxy: bool,
) -> Matrix<Z>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
{
    let (m, n) = (c_in.vlen(), c_in.vdim());
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|j| (0..m).map(move |i| (i, j))).collect();

    let triples: Vec<(usize, usize, Z)> = pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            let c_pos = c_in.find_vector(j)?;
            let (c_rows, c_vals) = c_in.vector(c_pos);
            let slot = c_rows.binary_search(&(i as i64)).ok()?;
            let existing = c_vals[slot];

            let contribution = a.find_vector(i).zip(b.find_vector(j)).and_then(|(ap, bp)| {
                let (a_rows, a_vals) = a.vector(ap);
                let (b_rows, b_vals) = b.vector(bp);
                dot_product(a_rows, a_vals, b_rows, b_vals, sr, flipxy)
            });

            let combined = match contribution {
                Some(t) => sr.add(existing, t),
                None => existing,
            };
            Some((i, j, combined))
        })
        .collect();

    Matrix::from_triples(m, n, c_in.orientation(), false, triples, |keep, _discard| keep)
}
