//! Error types for the graphblas-core matrix engine.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations,
//! matching the unified-error-enum convention used across this workspace.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned at the `multiply` operation boundary.
///
/// Mirrors the five outcome kinds of the collaborator contract: `ok` maps to
/// `Result::Ok`, everything else is a variant here. `NoValue` is intentionally
/// not constructible outside this crate: it signals that a specialized kernel
/// declined and the generic kernel should be tried instead, and must never
/// cross the public `multiply` boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Workspace or result allocation failed. Workspace and any partial C
    /// are fully released before this is returned.
    #[error("out of memory: failed to allocate {requested_bytes} bytes for {context}")]
    OutOfMemory {
        /// Number of bytes the failed allocation attempted to reserve.
        requested_bytes: usize,
        /// What the allocation was for (workspace arena, output arrays, ...).
        context: &'static str,
    },

    /// Contracted or masked dimensions did not agree.
    #[error("dimension mismatch: {lhs_name} has {lhs} but {rhs_name} has {rhs}")]
    DimMismatch {
        /// Name of the left operand (e.g. "A.vlen").
        lhs_name: &'static str,
        /// Left operand's dimension.
        lhs: usize,
        /// Name of the right operand (e.g. "B.vlen").
        rhs_name: &'static str,
        /// Right operand's dimension.
        rhs: usize,
    },

    /// An operand's scalar type is not castable to the semiring's declared
    /// input type.
    #[error("type mismatch: {operand} has type {found:?}, semiring expects {expected:?}")]
    TypeMismatch {
        /// Which operand failed ("A", "B", "M", or the accumulator).
        operand: &'static str,
        /// The type tag found on the operand.
        found: crate::scalar::TypeTag,
        /// The type tag the semiring declared.
        expected: crate::scalar::TypeTag,
    },

    /// A required operand was absent.
    #[error("null operand: {0}")]
    NullPtr(&'static str),

    /// Internal signal: a specialized kernel declined (disabled at build
    /// time). Never surfaced across the public API; the driver catches this
    /// and retries with the generic kernel.
    #[error("no specialized kernel available")]
    #[doc(hidden)]
    NoValue,
}

impl Error {
    /// True for the internal `NoValue` signal used to fall back to the
    /// generic kernel. Not a real failure; the driver matches on this to
    /// decide whether to retry with the generic kernel instead of
    /// surfacing the error to the caller.
    pub fn is_no_value(&self) -> bool {
        matches!(self, Error::NoValue)
    }
}
