//! `graphblas-rs`: a parallel sparse matrix multiply engine over
//! user-defined semirings, in the spirit of the GraphBLAS algebraic model.
//!
//! This crate is a thin facade over [`graphblas_core`], [`graphblas_concurrency`]
//! and [`graphblas_engine`]; see [`multiply`] for the entry point.

pub use graphblas_core::binop::{BinaryOp, BinaryOpKind};
pub use graphblas_core::descriptor::{Descriptor, EngineConfig};
pub use graphblas_core::error::{Error, Result};
pub use graphblas_core::mask::Mask;
pub use graphblas_core::matrix::{Matrix, Orientation};
pub use graphblas_core::monoid::{Monoid, MonoidKind};
pub use graphblas_core::scalar::{Scalar, ScalarCast, TypeTag};
pub use graphblas_core::semiring::{lor_land, min_plus, plus_times, Semiring};

pub use graphblas_engine::multiply;
