//! Flop estimation and coarse/fine task partitioning for the saxpy engine.

use graphblas_concurrency::{pslice, prefix_sum};
use graphblas_core::matrix::Matrix;
use graphblas_core::scalar::Scalar;
use graphblas_core::EngineConfig;

/// One unit of saxpy work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Owns stored B-vector positions `[vlo, vhi)`, each computed
    /// sequentially with a private hash/Gustavson table.
    Coarse { vlo: usize, vhi: usize },
    /// A single costly B-vector split across `subtasks` fine tasks sharing
    /// one hash table.
    Fine { vector: usize, subtasks: usize },
}

/// `flops(j) = Σ_{k: B(k,j)≠0} nnz(A(:,k))`, one entry per stored vector of
/// `B` (in stored-position order, not logical order).
pub fn column_flops<X: Scalar, Y: Scalar>(a: &Matrix<X>, b: &Matrix<Y>) -> Vec<f64> {
    let mut flops = Vec::with_capacity(b.nvec());
    for k in 0..b.nvec() {
        let (b_rows, _) = b.vector(k);
        let mut total = 0usize;
        for &row in b_rows {
            if let Some(a_pos) = a.find_vector(row as usize) {
                total += a.vector_nnz(a_pos);
            }
        }
        flops.push(total as f64);
    }
    flops
}

/// Split `B`'s stored vectors into coarse tasks (and fine-task groups for
/// outlier columns) balanced by `column_flops`.
///
/// Mirrors the rule in the design notes: first cut the prefix sum into
/// `2 * nthreads` roughly-equal coarse ranges via binary search (`pslice`),
/// then for each resulting range, if its total flops exceed
/// `2 * fine_task_threshold * target` and it contains a single column whose
/// own flops exceed `fine_task_threshold * target` *and* has more than one
/// stored entry in `B` (a column with a single nonzero can't be split into
/// useful subtasks), peel that column off into a fine-task group sized to
/// keep each fine task near `target / 2` flops.
pub fn build_tasks(
    column_flops: &[f64],
    column_nnz: &[usize],
    nthreads: usize,
    cfg: &EngineConfig,
) -> Vec<Task> {
    let n = column_flops.len();
    if n == 0 {
        return Vec::new();
    }
    let bflops = prefix_sum(column_flops);
    let total = *bflops.last().unwrap();
    let nthreads = nthreads.max(1);
    let coarse_n = (2 * nthreads).max(1);
    let target = (total / coarse_n as f64).max(cfg.chunk as f64);
    let fine_target = (target / 2.0).max(1.0);

    let bounds = pslice(&bflops, coarse_n);
    let mut tasks = Vec::new();

    for w in bounds.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if lo == hi {
            continue;
        }
        let task_flops = bflops[hi] - bflops[lo];
        let costly_threshold = cfg.fine_task_threshold * target;
        if task_flops > 2.0 * costly_threshold {
            if let Some(j) =
                (lo..hi).find(|&j| column_flops[j] > costly_threshold && column_nnz[j] > 1)
            {
                let subtasks = ((column_flops[j] / fine_target).ceil() as usize).max(1);
                if lo < j {
                    tasks.push(Task::Coarse { vlo: lo, vhi: j });
                }
                tasks.push(Task::Fine {
                    vector: j,
                    subtasks,
                });
                if j + 1 < hi {
                    tasks.push(Task::Coarse { vlo: j + 1, vhi: hi });
                }
                continue;
            }
        }
        tasks.push(Task::Coarse { vlo: lo, vhi: hi });
    }

    tasks
}
