//! Fork-join helpers built directly on `rayon::scope`/`rayon::join`, used by
//! the engine to run coarse and fine multiply tasks across a thread pool.

/// Prefix sum: `out[0] == 0`, `out[k] == sum(counts[..k])`, `out.len() ==
/// counts.len() + 1`. Used to turn per-vector flop estimates into cumulative
/// work, the basis for splitting work evenly across threads.
pub fn prefix_sum(counts: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0.0;
    out.push(0.0);
    for &c in counts {
        acc += c;
        out.push(acc);
    }
    out
}

/// Split cumulative work `bflops` (length `n + 1`, `bflops[0] == 0`) across
/// `nthreads` slices of roughly equal total work. Returns `nthreads + 1`
/// boundary indices into `[0, n]`; thread `t` owns vectors
/// `result[t]..result[t + 1]`.
///
/// Boundaries are found by binary search against evenly spaced work targets,
/// mirroring how the original's flop-based partitioner slices a coarse task
/// list without needing every thread to do the same amount of *work* per se,
/// just the same amount of estimated flops.
pub fn pslice(bflops: &[f64], nthreads: usize) -> Vec<usize> {
    let n = bflops.len().saturating_sub(1);
    let mut bounds = vec![0usize; nthreads + 1];
    bounds[nthreads] = n;
    if nthreads <= 1 || n == 0 {
        return bounds;
    }
    let total = bflops[n];
    if total <= 0.0 {
        return bounds;
    }
    for t in 1..nthreads {
        let target = total * (t as f64) / (nthreads as f64);
        let k = match bflops.binary_search_by(|v| v.partial_cmp(&target).unwrap()) {
            Ok(k) => k,
            Err(k) => k,
        };
        bounds[t] = k.min(n);
    }
    // Binary search can produce a non-monotone sequence when many vectors
    // share the same cumulative value (all-zero runs); clamp to keep slices
    // ordered so no thread is handed an inverted range.
    for t in 1..=nthreads {
        if bounds[t] < bounds[t - 1] {
            bounds[t] = bounds[t - 1];
        }
    }
    bounds
}

/// Run `f` over every item in `items` on the `rayon` global pool, one
/// `rayon::Scope` task per item. Blocks until all tasks complete.
pub fn parallel_for_each<T, F>(items: &[T], f: F)
where
    T: Sync,
    F: Fn(&T) + Send + Sync,
{
    rayon::scope(|scope| {
        for item in items {
            let f = &f;
            scope.spawn(move |_| f(item));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_sum_accumulates() {
        let p = prefix_sum(&[1.0, 2.0, 3.0]);
        assert_eq!(p, vec![0.0, 1.0, 3.0, 6.0]);
    }

    #[test]
    fn pslice_covers_full_range_in_order() {
        let bflops = prefix_sum(&[1.0, 1.0, 1.0, 1.0, 100.0, 1.0, 1.0, 1.0]);
        let bounds = pslice(&bflops, 4);
        assert_eq!(bounds[0], 0);
        assert_eq!(*bounds.last().unwrap(), 8);
        for w in bounds.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn pslice_single_thread_is_whole_range() {
        let bflops = prefix_sum(&[3.0, 4.0, 5.0]);
        let bounds = pslice(&bflops, 1);
        assert_eq!(bounds, vec![0, 3]);
    }

    #[test]
    fn parallel_for_each_visits_every_item() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let items: Vec<usize> = (0..50).collect();
        let sum = AtomicUsize::new(0);
        parallel_for_each(&items, |&i| {
            sum.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), (0..50).sum());
    }
}
