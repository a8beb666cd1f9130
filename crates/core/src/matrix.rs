//! The sparse matrix object: compressed vector-major storage, hypersparse
//! indirection, and the pending-work (zombies + pending tuples) model that
//! lets operators stay lazy between `wait()` calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scalar::Scalar;

/// Whether a matrix's stored vectors are columns or rows. The engine is
/// orientation-agnostic (§3): it only cares that A and B agree on which
/// dimension is contracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    ColMajor,
    RowMajor,
}

/// A buffered, not-yet-assembled insertion.
#[derive(Clone)]
struct PendingTuple<T> {
    vector: usize,
    row: usize,
    value: T,
}

/// `!idx` is the bit-complement tombstone encoding from §3/§9: a raw stored
/// index `raw < 0` marks a zombie whose logical row is `!raw`.
#[inline]
fn make_zombie(idx: i64) -> i64 {
    !idx
}

#[inline]
fn is_zombie(raw: i64) -> bool {
    raw < 0
}

#[inline]
fn zombie_row(raw: i64) -> usize {
    debug_assert!(is_zombie(raw));
    (!raw) as usize
}

/// A sparse, vector-major matrix with GraphBLAS-style pending work.
///
/// Generic over a single scalar type `T`: in this engine A, B, C may differ
/// in scalar type from each other (the semiring's `X`, `Y`, `Z`), but each
/// individual matrix is monomorphic, matching how the original's per-matrix
/// `GrB_Type` works.
pub struct Matrix<T: Scalar> {
    vlen: usize,
    vdim: usize,
    nvec: usize,
    is_hyper: bool,
    jumbled: bool,
    orientation: Orientation,
    /// Length `nvec + 1`. `ap[k]..ap[k+1]` bounds stored vector `k`.
    ap: Vec<usize>,
    /// `Some` only for hypersparse matrices; length `nvec`, strictly
    /// increasing logical indices of the stored vectors.
    ah: Option<Vec<usize>>,
    /// Length `ap[nvec]`. Non-negative entries are row indices; negative
    /// entries are zombies (see [`make_zombie`]).
    ai: Vec<i64>,
    /// Length `ap[nvec]`, parallel to `ai`.
    ax: Vec<T>,
    n_zombies: usize,
    pending: Vec<PendingTuple<T>>,
    /// Combines duplicate pending tuples targeting the same coordinate.
    /// `None` means "last write wins" (the original's default insert
    /// semantics when no accumulator is given).
    pending_op: Option<Arc<dyn Fn(T, T) -> T + Send + Sync>>,
}

impl<T: Scalar> Matrix<T> {
    /// An empty sparse (non-hypersparse) matrix: `nvec == vdim`, all vectors
    /// present but empty.
    pub fn empty(vlen: usize, vdim: usize, orientation: Orientation) -> Self {
        Matrix {
            vlen,
            vdim,
            nvec: vdim,
            is_hyper: false,
            jumbled: false,
            orientation,
            ap: vec![0; vdim + 1],
            ah: None,
            ai: Vec::new(),
            ax: Vec::new(),
            n_zombies: 0,
            pending: Vec::new(),
            pending_op: None,
        }
    }

    /// An empty hypersparse matrix: `nvec == 0`, vectors are added only as
    /// entries land in them (via `wait`).
    pub fn empty_hyper(vlen: usize, vdim: usize, orientation: Orientation) -> Self {
        Matrix {
            vlen,
            vdim,
            nvec: 0,
            is_hyper: true,
            jumbled: false,
            orientation,
            ap: vec![0],
            ah: Some(Vec::new()),
            ai: Vec::new(),
            ax: Vec::new(),
            n_zombies: 0,
            pending: Vec::new(),
            pending_op: None,
        }
    }

    /// Build a matrix from an unordered triple list `(row, vector, value)`,
    /// combining duplicates at the same coordinate with `combine`. This is
    /// the round-trip entry point used by the build/read-back testable
    /// property (§8): the triples are buffered as pending work and
    /// assembled immediately via [`Matrix::wait`].
    pub fn from_triples(
        vlen: usize,
        vdim: usize,
        orientation: Orientation,
        hyper: bool,
        triples: impl IntoIterator<Item = (usize, usize, T)>,
        combine: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        let mut m = if hyper {
            Matrix::empty_hyper(vlen, vdim, orientation)
        } else {
            Matrix::empty(vlen, vdim, orientation)
        };
        m.pending_op = Some(Arc::new(combine));
        for (row, vector, value) in triples {
            m.pending.push(PendingTuple { vector, row, value });
        }
        m.wait();
        m
    }

    pub fn vlen(&self) -> usize {
        self.vlen
    }

    pub fn vdim(&self) -> usize {
        self.vdim
    }

    pub fn nvec(&self) -> usize {
        self.nvec
    }

    pub fn is_hyper(&self) -> bool {
        self.is_hyper
    }

    pub fn jumbled(&self) -> bool {
        self.jumbled
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// `Ap[nvec]`: physical entry count, including zombies (§3).
    pub fn nnz(&self) -> usize {
        *self.ap.last().unwrap_or(&0)
    }

    /// Entry count excluding zombies; what an algebraic operator "sees".
    pub fn live_nnz(&self) -> usize {
        self.nnz() - self.n_zombies
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.n_zombies > 0
    }

    pub fn ap(&self) -> &[usize] {
        &self.ap
    }

    pub fn ah(&self) -> Option<&[usize]> {
        self.ah.as_deref()
    }

    pub fn ax(&self) -> &[T] {
        &self.ax
    }

    /// Raw stored row indices; non-negative entries are live, negative
    /// entries are zombies. Only meaningful on a pending-free matrix for
    /// algebraic use, but exposed raw for diagnostics.
    pub fn ai_raw(&self) -> &[i64] {
        &self.ai
    }

    /// The logical index of stored vector position `k`.
    #[inline]
    pub fn vector_logical(&self, k: usize) -> usize {
        match &self.ah {
            Some(ah) => ah[k],
            None => k,
        }
    }

    /// Find the stored position of logical vector index `logical`, if any
    /// entries are stored for it. `O(1)` for sparse matrices, `O(log nvec)`
    /// for hypersparse ones (binary search over the strictly increasing
    /// `Ah`).
    pub fn find_vector(&self, logical: usize) -> Option<usize> {
        match &self.ah {
            None => {
                if logical < self.vdim {
                    Some(logical)
                } else {
                    None
                }
            }
            Some(ah) => ah.binary_search(&logical).ok(),
        }
    }

    /// The live (non-zombie) `(row, value)` pairs of stored vector `k`.
    /// Requires the matrix to be pending-free; panics otherwise, since a
    /// zombie-aware caller should use `wait()` first (the multiply driver
    /// always does, per §4.5).
    pub fn vector(&self, k: usize) -> (&[i64], &[T]) {
        debug_assert!(
            !self.has_pending(),
            "vector() called on a matrix with pending work; call wait() first"
        );
        let lo = self.ap[k];
        let hi = self.ap[k + 1];
        (&self.ai[lo..hi], &self.ax[lo..hi])
    }

    /// Number of live entries in stored vector `k`.
    pub fn vector_nnz(&self, k: usize) -> usize {
        self.ap[k + 1] - self.ap[k]
    }

    /// Buffer an insertion to be merged in on the next `wait()`.
    pub fn push_pending(&mut self, row: usize, vector: usize, value: T) {
        self.pending.push(PendingTuple { vector, row, value });
    }

    /// Mark the (row, vector) entry as deleted by bit-complementing its
    /// stored index, if present and not already a zombie. Returns whether
    /// an entry was found. Requires no pending tuples for `vector` (the
    /// minimal delete path; full subassign-style deletion is out of scope,
    /// §1).
    pub fn mark_zombie(&mut self, row: usize, vector: usize) -> bool {
        let lo = self.ap[vector];
        let hi = self.ap[vector + 1];
        for slot in lo..hi {
            if !is_zombie(self.ai[slot]) && self.ai[slot] as usize == row {
                self.ai[slot] = make_zombie(self.ai[slot]);
                self.n_zombies += 1;
                return true;
            }
        }
        false
    }

    /// Materialize the transpose: rows become vectors and vice versa.
    /// Requires the matrix to be pending-free. This is a real, eager
    /// transpose rather than the virtual "treat as transposed" view a
    /// descriptor's `transpose_a`/`transpose_b` flags request from a
    /// multiply; the driver calls this before dispatch when it needs one,
    /// trading a copy for a much simpler dot/saxpy implementation that
    /// never has to reason about a logically-transposed operand.
    pub fn transpose(&self) -> Self {
        debug_assert!(!self.has_pending());
        let mut triples = Vec::with_capacity(self.nnz());
        for k in 0..self.nvec {
            let logical = self.vector_logical(k);
            let (ai, ax) = self.vector(k);
            for (&row, &value) in ai.iter().zip(ax.iter()) {
                // (row, vector) in self becomes (vector, row) in the transpose.
                triples.push((logical, row as usize, value));
            }
        }
        let orientation = match self.orientation {
            Orientation::ColMajor => Orientation::RowMajor,
            Orientation::RowMajor => Orientation::ColMajor,
        };
        Matrix::from_triples(self.vdim, self.vlen, orientation, self.is_hyper, triples, |a, _b| a)
    }

    /// Assemble pending work: drop zombies, merge pending tuples into the
    /// compressed form, combine duplicates with the pending operator (or
    /// overwrite if none), and drop empty vectors if hypersparse. Idempotent:
    /// calling `wait` on an already-assembled matrix is a no-op pass that
    /// rebuilds an identical structure (see the property test in
    /// `tests/scenarios.rs`).
    pub fn wait(&mut self) {
        if !self.has_pending() {
            return;
        }

        // vector -> (row -> value), gathering existing live entries first so
        // pending tuples for the same coordinate override/accumulate onto them.
        let mut by_vector: BTreeMap<usize, BTreeMap<usize, T>> = BTreeMap::new();

        for k in 0..self.nvec {
            let logical = self.vector_logical(k);
            let lo = self.ap[k];
            let hi = self.ap[k + 1];
            for slot in lo..hi {
                let raw = self.ai[slot];
                if is_zombie(raw) {
                    continue;
                }
                by_vector
                    .entry(logical)
                    .or_default()
                    .insert(raw as usize, self.ax[slot]);
            }
        }

        for tuple in self.pending.drain(..) {
            let rows = by_vector.entry(tuple.vector).or_default();
            match rows.get(&tuple.row) {
                Some(&existing) => {
                    let combined = match &self.pending_op {
                        Some(op) => op(existing, tuple.value),
                        None => tuple.value,
                    };
                    rows.insert(tuple.row, combined);
                }
                None => {
                    rows.insert(tuple.row, tuple.value);
                }
            }
        }

        let mut new_ap = vec![0usize];
        let mut new_ah = if self.is_hyper { Some(Vec::new()) } else { None };
        let mut new_ai = Vec::new();
        let mut new_ax = Vec::new();

        if self.is_hyper {
            for (&logical, rows) in by_vector.iter() {
                if rows.is_empty() {
                    continue;
                }
                new_ah.as_mut().unwrap().push(logical);
                for (&row, &value) in rows.iter() {
                    new_ai.push(row as i64);
                    new_ax.push(value);
                }
                new_ap.push(new_ai.len());
            }
        } else {
            for logical in 0..self.vdim {
                if let Some(rows) = by_vector.get(&logical) {
                    for (&row, &value) in rows.iter() {
                        new_ai.push(row as i64);
                        new_ax.push(value);
                    }
                }
                new_ap.push(new_ai.len());
            }
        }

        self.nvec = new_ap.len() - 1;
        self.ap = new_ap;
        self.ah = new_ah;
        self.ai = new_ai;
        self.ax = new_ax;
        self.n_zombies = 0;
        self.jumbled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sparse_has_vdim_vectors() {
        let m = Matrix::<i32>::empty(4, 4, Orientation::ColMajor);
        assert_eq!(m.nvec(), 4);
        assert_eq!(m.nnz(), 0);
        assert!(!m.has_pending());
    }

    #[test]
    fn from_triples_builds_identity() {
        let m = Matrix::from_triples(
            3,
            3,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 1, 1), (2, 2, 1)],
            |a, _b| a,
        );
        assert_eq!(m.live_nnz(), 3);
        for k in 0..3 {
            let (ai, ax) = m.vector(k);
            assert_eq!(ai, &[k as i64]);
            assert_eq!(ax, &[1]);
        }
    }

    #[test]
    fn duplicate_triples_combine_with_reducer() {
        let m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 2i32), (0, 0, 3i32)],
            |a, b| a + b,
        );
        let (ai, ax) = m.vector(0);
        assert_eq!(ai, &[0]);
        assert_eq!(ax, &[5]);
    }

    #[test]
    fn wait_is_idempotent() {
        let mut m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 1, 2i32)],
            |a, _b| a,
        );
        let before: Vec<i64> = m.ai_raw().to_vec();
        m.wait();
        assert_eq!(m.ai_raw(), before.as_slice());
    }

    #[test]
    fn zombie_marks_and_is_pruned_on_wait() {
        let mut m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 0, 2i32)],
            |a, _b| a,
        );
        assert!(m.mark_zombie(0, 0));
        assert!(m.has_pending());
        m.wait();
        assert_eq!(m.live_nnz(), 1);
        let (ai, _) = m.vector(0);
        assert_eq!(ai, &[1]);
    }

    #[test]
    fn transpose_twice_is_identity() {
        let m = Matrix::from_triples(
            2,
            3,
            Orientation::ColMajor,
            false,
            vec![(0, 0, 1i32), (1, 2, 4i32)],
            |a, _b| a,
        );
        let tt = m.transpose().transpose();
        assert_eq!(tt.vlen(), m.vlen());
        assert_eq!(tt.vdim(), m.vdim());
        for k in 0..m.nvec() {
            assert_eq!(m.vector(k), tt.vector(k));
        }
    }

    #[test]
    fn hypersparse_drops_empty_vectors() {
        let m = Matrix::from_triples(
            3,
            3,
            Orientation::ColMajor,
            true,
            vec![(0, 1, 5i32)],
            |a, _b| a,
        );
        assert_eq!(m.nvec(), 1);
        assert_eq!(m.ah(), Some(&[1usize][..]));
    }
}
