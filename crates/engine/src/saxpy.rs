//! The saxpy multiply engine: `C(:,j) = Σ_k A(:,k) ⊗ B(k,j)`, accumulated
//! per output vector into a Gustavson (dense) or Hash (open-addressed)
//! table, with optional fine-task splitting for outlier columns.

use std::sync::atomic::Ordering;

use rayon::prelude::*;

use graphblas_concurrency::arena::{Arena, TaskWorkspace};
use graphblas_concurrency::atomic_monoid::{atomic_accumulate, atomic_init};
use graphblas_concurrency::status::{StatusCell, TaskStatus};
use graphblas_concurrency::{parallel_for_each, pslice, prefix_sum};
use graphblas_core::error::{Error, Result};
use graphblas_core::mask::Mask;
use graphblas_core::matrix::Matrix;
use graphblas_core::monoid::Monoid;
use graphblas_core::scalar::{Scalar, ScalarCast};
use graphblas_core::semiring::Semiring;
use graphblas_core::EngineConfig;

use crate::hash::{choose_accumulator, hash_pos, Accumulator};
use crate::partition::{build_tasks, column_flops, Task};

/// Run the saxpy algorithm: `C = A ⊕.⊗ B`, optionally filtered by `mask`
/// (which may be "no mask", in which case every computed entry survives).
#[tracing::instrument(skip_all, fields(a_vlen = a.vlen(), a_vdim = a.vdim(), b_vlen = b.vlen(), b_vdim = b.vdim()))]
pub fn saxpy_multiply<X, Y, Z, M>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    sr: &Semiring<X, Y, Z>,
    mask: &Mask<M>,
    flipxy: bool,
    cfg: &EngineConfig,
) -> Result<Matrix<Z>>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
    M: Scalar + ScalarCast<bool>,
{
    let flops = column_flops(a, b);
    let b_nnz: Vec<usize> = (0..b.nvec()).map(|k| b.vector_nnz(k)).collect();
    let tasks = build_tasks(&flops, &b_nnz, cfg.effective_threads(), cfg);
    let cvlen = a.vlen();
    let alpha = cfg.gustavson_hash_alpha;

    // One workspace per task, sized once up front and reused for every
    // column a coarse task owns (see `accumulate_columns_coarse`) or shared
    // across a fine task's subtasks (see `accumulate_column_fine`). Pooled
    // via a single `Arena` rather than allocated per column.
    let sizes: Vec<usize> = tasks
        .iter()
        .map(|task| task_workspace_size(a, b, task, cvlen, alpha))
        .collect();
    let requested_bytes = sizes.iter().sum::<usize>() * 3 * std::mem::size_of::<u64>();

    let status = StatusCell::new();
    let mut arena = Arena::try_new(&sizes).map_err(|_| {
        status.mark_failed(TaskStatus::OutOfMemory);
        Error::OutOfMemory {
            requested_bytes,
            context: "saxpy task workspace arena",
        }
    })?;

    let columns: Vec<(usize, Vec<(i64, Z)>)> = tasks
        .par_iter()
        .zip(arena.tasks_mut().par_iter_mut())
        .map(|(task, ws)| {
            if status.is_failed() {
                return Vec::new();
            }
            match *task {
                Task::Coarse { vlo, vhi } => {
                    accumulate_columns_coarse(a, b, vlo, vhi, sr, cfg, flipxy, ws)
                }
                Task::Fine { vector, subtasks } => vec![(
                    vector,
                    accumulate_column_fine(a, b, vector, sr, subtasks, cfg, ws, flipxy),
                )],
            }
        })
        .flatten()
        .collect();

    if status.is_failed() {
        return Err(Error::OutOfMemory {
            requested_bytes: 0,
            context: "saxpy parallel task",
        });
    }

    let mut triples = Vec::new();
    for (k, entries) in columns {
        let logical = b.vector_logical(k);
        for (row, value) in entries {
            if mask.allows(row as usize, logical) {
                triples.push((row as usize, logical, value));
            }
        }
    }

    Ok(Matrix::from_triples(
        a.vlen(),
        b.vdim(),
        a.orientation(),
        a.is_hyper() || b.is_hyper(),
        triples,
        |keep, _discard| keep,
    ))
}

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

/// Upper bound on distinct output rows a column's accumulation could touch:
/// the sum of contributing `A` vectors' nnz, i.e. the column's own flop
/// count. Sizes the Gustavson/Hash decision and the Hash table itself, so it
/// must bound worst-case distinct slots, not just the single largest
/// contribution.
fn column_flop_total<X: Scalar>(a: &Matrix<X>, b_rows: &[i64]) -> usize {
    b_rows
        .iter()
        .filter_map(|&row| a.find_vector(row as usize).map(|p| a.vector_nnz(p)))
        .sum()
}

/// The accumulator a task will use, and the slot count its workspace needs:
/// `flmax` (§4.1's "largest single-column flop count in the task") decides
/// Gustavson-vs-Hash for a coarse task's whole column range, or for a fine
/// task's single split column.
fn task_workspace_size<X: Scalar, Y: Scalar>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    task: &Task,
    cvlen: usize,
    alpha: f64,
) -> usize {
    let flmax = match *task {
        Task::Coarse { vlo, vhi } => (vlo..vhi)
            .map(|k| {
                let (b_rows, _) = b.vector(k);
                column_flop_total(a, b_rows)
            })
            .max()
            .unwrap_or(0),
        Task::Fine { vector, .. } => {
            let (b_rows, _) = b.vector(vector);
            column_flop_total(a, b_rows)
        }
    };
    match choose_accumulator(flmax, cvlen, alpha) {
        Accumulator::Gustavson { cvlen } => cvlen,
        Accumulator::Hash { h } => h,
    }
}

/// A coarse task's columns: `flmax` and the Gustavson-vs-Hash choice are
/// computed once for the whole `[vlo, vhi)` range, and `ws` (sized by
/// `task_workspace_size` for that same `flmax`) is reused across every
/// column in the range, cleared between columns by bumping `current`
/// instead of rewriting the workspace.
fn accumulate_columns_coarse<X, Y, Z>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    vlo: usize,
    vhi: usize,
    sr: &Semiring<X, Y, Z>,
    cfg: &EngineConfig,
    flipxy: bool,
    ws: &mut TaskWorkspace,
) -> Vec<(usize, Vec<(i64, Z)>)>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
{
    let cvlen = a.vlen();
    let flmax = (vlo..vhi)
        .map(|k| {
            let (b_rows, _) = b.vector(k);
            column_flop_total(a, b_rows)
        })
        .max()
        .unwrap_or(0);
    let accumulator = choose_accumulator(flmax, cvlen, cfg.gustavson_hash_alpha);
    let mut current: u64 = 0;

    (vlo..vhi)
        .map(|k| {
            current += 1;
            let (b_rows, b_vals) = b.vector(k);
            let entries = match accumulator {
                Accumulator::Gustavson { cvlen } => {
                    for (&row, &bval) in b_rows.iter().zip(b_vals.iter()) {
                        let Some(a_pos) = a.find_vector(row as usize) else {
                            continue;
                        };
                        let (a_rows, a_vals) = a.vector(a_pos);
                        for (&ai, &aval) in a_rows.iter().zip(a_vals.iter()) {
                            let i = ai as usize;
                            let t = multiply_term(sr, aval, bval, flipxy);
                            if ws.mark[i] == current {
                                let prev = Z::from_bits64(ws.hx[i].load(Ordering::Relaxed));
                                ws.hx[i].store(sr.add(prev, t).to_bits64(), Ordering::Relaxed);
                            } else {
                                ws.hx[i].store(t.to_bits64(), Ordering::Relaxed);
                                ws.mark[i] = current;
                            }
                        }
                    }
                    (0..cvlen)
                        .filter(|&i| ws.mark[i] == current)
                        .map(|i| (i as i64, Z::from_bits64(ws.hx[i].load(Ordering::Relaxed))))
                        .collect::<Vec<_>>()
                }
                Accumulator::Hash { h } => {
                    for (&row, &bval) in b_rows.iter().zip(b_vals.iter()) {
                        let Some(a_pos) = a.find_vector(row as usize) else {
                            continue;
                        };
                        let (a_rows, a_vals) = a.vector(a_pos);
                        for (&ai, &aval) in a_rows.iter().zip(a_vals.iter()) {
                            let i = ai as usize;
                            let t = multiply_term(sr, aval, bval, flipxy);
                            let mut p = hash_pos(i, h);
                            loop {
                                if ws.mark[p] != current {
                                    ws.mark[p] = current;
                                    ws.hi[p].store(i as i64, Ordering::Relaxed);
                                    ws.hx[p].store(t.to_bits64(), Ordering::Relaxed);
                                    break;
                                } else if ws.hi[p].load(Ordering::Relaxed) == i as i64 {
                                    let prev = Z::from_bits64(ws.hx[p].load(Ordering::Relaxed));
                                    ws.hx[p].store(sr.add(prev, t).to_bits64(), Ordering::Relaxed);
                                    break;
                                } else {
                                    p = (p + 1) & (h - 1);
                                }
                            }
                        }
                    }
                    let mut out: Vec<(i64, Z)> = (0..h)
                        .filter(|&p| ws.mark[p] == current)
                        .map(|p| {
                            (
                                ws.hi[p].load(Ordering::Relaxed),
                                Z::from_bits64(ws.hx[p].load(Ordering::Relaxed)),
                            )
                        })
                        .collect();
                    out.sort_by_key(|&(i, _)| i);
                    out
                }
            };
            (k, entries)
        })
        .collect()
}

/// A costly column split across `subtasks` fine tasks sharing one hash
/// workspace, accumulated with atomic compare-and-swap updates. `ws` is
/// this task's sole workspace (one arena slot per `Task::Fine`, never
/// shared with another task), sized by `task_workspace_size` ahead of time.
fn accumulate_column_fine<X, Y, Z>(
    a: &Matrix<X>,
    b: &Matrix<Y>,
    k: usize,
    sr: &Semiring<X, Y, Z>,
    subtasks: usize,
    cfg: &EngineConfig,
    ws: &TaskWorkspace,
    flipxy: bool,
) -> Vec<(i64, Z)>
where
    X: Scalar + ScalarCast<Y>,
    Y: Scalar + ScalarCast<X>,
    Z: Scalar,
{
    let (b_rows, b_vals) = b.vector(k);
    let cvlen = a.vlen();
    let flmax = column_flop_total(a, b_rows);
    let accumulator = choose_accumulator(flmax, cvlen, cfg.gustavson_hash_alpha);
    let size = ws.len();

    if let Accumulator::Gustavson { .. } = accumulator {
        let identity_bits = sr.zero().to_bits64();
        for slot in ws.hx.iter() {
            slot.store(identity_bits, Ordering::Relaxed);
        }
    }

    let row_flops: Vec<f64> = b_rows
        .iter()
        .map(|&row| {
            a.find_vector(row as usize)
                .map(|p| a.vector_nnz(p))
                .unwrap_or(0) as f64
        })
        .collect();
    let bflops2 = prefix_sum(&row_flops);
    let bounds = pslice(&bflops2, subtasks.max(1));
    let ranges: Vec<(usize, usize)> = bounds.windows(2).map(|w| (w[0], w[1])).collect();

    parallel_for_each(&ranges, |&(lo, hi)| {
        for idx in lo..hi {
            let row = b_rows[idx];
            let bval = b_vals[idx];
            let Some(a_pos) = a.find_vector(row as usize) else {
                continue;
            };
            let (a_rows, a_vals) = a.vector(a_pos);
            for (&ai, &aval) in a_rows.iter().zip(a_vals.iter()) {
                let i = ai as usize;
                let t = multiply_term(sr, aval, bval, flipxy);
                match accumulator {
                    Accumulator::Gustavson { .. } => {
                        ws.hf[i].store(1, Ordering::Relaxed);
                        atomic_accumulate(&ws.hx[i], t, sr.monoid());
                    }
                    Accumulator::Hash { h } => {
                        hash_claim_or_accumulate(ws, h, i as i64, t, sr.monoid());
                    }
                }
            }
        }
    });

    let mut out: Vec<(i64, Z)> = (0..size)
        .filter(|&s| ws.hf[s].load(Ordering::Acquire) != 0)
        .map(|s| {
            let row = match accumulator {
                Accumulator::Gustavson { .. } => s as i64,
                Accumulator::Hash { .. } => ws.hi[s].load(Ordering::Acquire),
            };
            (row, Z::from_bits64(ws.hx[s].load(Ordering::Acquire)))
        })
        .collect();
    if matches!(accumulator, Accumulator::Hash { .. }) {
        out.sort_by_key(|&(i, _)| i);
    }
    out
}

/// Claim slot `row` in a shared Hash workspace, or combine into it if
/// another fine task already claimed it. A slot transitions `empty ->
/// claimed-by-row` via CAS; the loser of that race either joins the
/// now-published row (via `⊕`) or keeps probing past it.
fn hash_claim_or_accumulate<Z: Scalar>(
    ws: &TaskWorkspace,
    h: usize,
    row: i64,
    value: Z,
    monoid: &dyn Monoid<Z>,
) {
    let mut p = hash_pos(row as usize, h);
    loop {
        match ws.hf[p].compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                ws.hi[p].store(row, Ordering::Release);
                atomic_init(&ws.hx[p], value);
                return;
            }
            Err(_) => loop {
                let existing = ws.hi[p].load(Ordering::Acquire);
                if existing == row {
                    atomic_accumulate(&ws.hx[p], value, monoid);
                    return;
                } else if existing < 0 {
                    std::hint::spin_loop();
                } else {
                    p = (p + 1) & (h - 1);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphblas_core::matrix::Orientation;
    use graphblas_core::semiring::plus_times;

    #[test]
    fn identity_times_dense_is_the_dense_operand() {
        let a = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 1, 1)],
            |x, _| x,
        );
        let b = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 2i32), (1, 0, 4), (0, 1, 3), (1, 1, 5)],
            |x, _| x,
        );
        let sr: Semiring<i32, i32, i32> = plus_times();
        let cfg = EngineConfig::default();
        let mask: Mask<bool> = Mask::none();
        let c = saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap();
        assert_eq!(c.live_nnz(), 4);
        let (ai, ax) = c.vector(0);
        assert_eq!(ai, &[0, 1]);
        assert_eq!(ax, &[2, 4]);
    }

    #[test]
    fn fine_task_path_matches_coarse_result() {
        // Build B with one dense column (forces peeling into fine tasks)
        // and verify the result equals a hand-computed reference.
        let n = 64usize;
        let a_triples: Vec<(usize, usize, i64)> = (0..n).map(|i| (i, i, 1i64)).collect();
        let a = Matrix::from_triples(n, n, Orientation::ColMajor, false, a_triples, |x, _| x);
        let b_triples: Vec<(usize, usize, i64)> = (0..n).map(|i| (i, 0, (i as i64) + 1)).collect();
        let b = Matrix::from_triples(n, 1, Orientation::ColMajor, false, b_triples, |x, _| x);
        let sr: Semiring<i64, i64, i64> = plus_times();
        let mut cfg = EngineConfig::default();
        cfg.chunk = 1;
        cfg.fine_task_threshold = 0.001;
        let mask: Mask<bool> = Mask::none();
        let c = saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap();
        assert_eq!(c.live_nnz(), n);
        let (ai, ax) = c.vector(0);
        for i in 0..n {
            assert_eq!(ai[i], i as i64);
            assert_eq!(ax[i], (i as i64) + 1);
        }
    }

    #[test]
    fn coarse_task_reuses_one_workspace_across_its_columns() {
        // Three dense-ish columns in one coarse task: the mark-generation
        // reuse path must not leak a prior column's entries into the next.
        let n = 8usize;
        let a_triples: Vec<(usize, usize, i32)> = (0..n).map(|i| (i, i, 1i32)).collect();
        let a = Matrix::from_triples(n, n, Orientation::ColMajor, false, a_triples, |x, _| x);
        let b = Matrix::from_triples(
            n,
            3,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 1, 1), (2, 2, 1)],
            |x, _| x,
        );
        let sr: Semiring<i32, i32, i32> = plus_times();
        let cfg = EngineConfig::default();
        let mask: Mask<bool> = Mask::none();
        let c = saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap();
        assert_eq!(c.live_nnz(), 3);
        for (k, expect_row) in (0..3).zip(0..3) {
            let (ai, ax) = c.vector(k);
            assert_eq!(ai, &[expect_row as i64]);
            assert_eq!(ax, &[1]);
        }
    }
}
