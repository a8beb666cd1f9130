//! Per-task hash workspace (`Hf`/`Hi`/`Hx`) for the saxpy multiply kernel.
//!
//! Each fine task gets its own slice of the arena so concurrent tasks never
//! write into the same cache line: a 64-byte pad follows each task's
//! region.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8};

/// One task's hash workspace.
///
/// - `hf[s]`: slot state. `0` = empty, `1` = occupied. A thread transitions
///   a slot from `0` to `1` via compare-and-swap; the loser of that race
///   falls back to an `⊕` update instead of a plain write.
/// - `hi[s]`: the row index claiming slot `s`, valid once `hf[s] != 0`. Also
///   atomic: a fine task may write `hi` and `hx` from a thread other than
///   whichever one first claimed the slot, so both must be race-free.
/// - `hx[s]`: the accumulated value at slot `s`, as `Scalar::to_bits64`.
pub struct TaskWorkspace {
    pub hf: Vec<AtomicU8>,
    pub hi: Vec<AtomicI64>,
    pub hx: Vec<AtomicU64>,
    /// Generation marker for the private (non-atomic-contention) coarse-task
    /// reuse path: slot `s` holds a live value for the *current* column iff
    /// `mark[s] == current`, where `current` is a counter the caller bumps
    /// once per column. Clearing a column is then O(1) (bump the counter)
    /// instead of O(size) (rewrite every slot).
    pub mark: Vec<u64>,
    _pad: [u8; 64],
}

impl TaskWorkspace {
    pub fn new(size: usize) -> Self {
        TaskWorkspace {
            hf: (0..size).map(|_| AtomicU8::new(0)).collect(),
            hi: (0..size).map(|_| AtomicI64::new(-1)).collect(),
            hx: (0..size).map(|_| AtomicU64::new(0)).collect(),
            mark: vec![0u64; size],
            _pad: [0u8; 64],
        }
    }

    /// Like `new`, but reports allocation failure via `Err(())` instead of
    /// aborting, so a caller can surface `TaskStatus::OutOfMemory` rather
    /// than panicking when a workspace is too large to allocate.
    pub fn try_new(size: usize) -> std::result::Result<Self, ()> {
        let mut hf = Vec::new();
        hf.try_reserve_exact(size).map_err(|_| ())?;
        hf.extend((0..size).map(|_| AtomicU8::new(0)));
        let mut hi = Vec::new();
        hi.try_reserve_exact(size).map_err(|_| ())?;
        hi.extend((0..size).map(|_| AtomicI64::new(-1)));
        let mut hx = Vec::new();
        hx.try_reserve_exact(size).map_err(|_| ())?;
        hx.extend((0..size).map(|_| AtomicU64::new(0)));
        let mut mark = Vec::new();
        mark.try_reserve_exact(size).map_err(|_| ())?;
        mark.extend(std::iter::repeat(0u64).take(size));
        Ok(TaskWorkspace {
            hf,
            hi,
            hx,
            mark,
            _pad: [0u8; 64],
        })
    }

    pub fn len(&self) -> usize {
        self.hf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hf.is_empty()
    }

    pub fn reset(&mut self) {
        for f in self.hf.iter_mut() {
            *f.get_mut() = 0;
        }
        for i in self.hi.iter_mut() {
            *i.get_mut() = -1;
        }
        for m in self.mark.iter_mut() {
            *m = 0;
        }
    }
}

/// A collection of per-task workspaces, sized by the coarse/fine task
/// partition the flop estimator produces.
pub struct Arena {
    tasks: Vec<TaskWorkspace>,
}

impl Arena {
    /// Allocate one workspace per entry in `task_hash_sizes`, each sized to
    /// hold that task's hash table (already rounded up to a power of two by
    /// the caller).
    pub fn new(task_hash_sizes: &[usize]) -> Self {
        Arena {
            tasks: task_hash_sizes
                .iter()
                .map(|&size| TaskWorkspace::new(size))
                .collect(),
        }
    }

    /// Like `new`, but reports allocation failure via `Err(())` instead of
    /// aborting partway through.
    pub fn try_new(task_hash_sizes: &[usize]) -> std::result::Result<Self, ()> {
        let mut tasks = Vec::new();
        tasks.try_reserve_exact(task_hash_sizes.len()).map_err(|_| ())?;
        for &size in task_hash_sizes {
            tasks.push(TaskWorkspace::try_new(size)?);
        }
        Ok(Arena { tasks })
    }

    pub fn task(&self, index: usize) -> &TaskWorkspace {
        &self.tasks[index]
    }

    pub fn task_mut(&mut self, index: usize) -> &mut TaskWorkspace {
        &mut self.tasks[index]
    }

    /// One workspace per task, in task order, for pooled parallel reuse
    /// (e.g. `tasks.par_iter().zip(arena.tasks_mut().par_iter_mut())`).
    pub fn tasks_mut(&mut self) -> &mut [TaskWorkspace] {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn new_workspace_starts_empty() {
        let arena = Arena::new(&[16, 32]);
        assert_eq!(arena.len(), 2);
        let t0 = arena.task(0);
        assert_eq!(t0.len(), 16);
        assert!(t0.hf.iter().all(|f| f.load(Ordering::Relaxed) == 0));
        assert!(t0.hi.iter().all(|i| i.load(Ordering::Relaxed) == -1));
    }

    #[test]
    fn reset_clears_occupancy() {
        let mut arena = Arena::new(&[4]);
        {
            let t = arena.task_mut(0);
            t.hf[0].store(1, Ordering::Relaxed);
            t.hi[0].store(7, Ordering::Relaxed);
        }
        arena.task_mut(0).reset();
        let t = arena.task(0);
        assert_eq!(t.hf[0].load(Ordering::Relaxed), 0);
        assert_eq!(t.hi[0].load(Ordering::Relaxed), -1);
    }
}
