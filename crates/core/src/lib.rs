//! Shared types for the sparse matrix multiply engine: the scalar type
//! system, monoids and binary operators, semirings, the sparse matrix
//! storage format with its pending-work model, masks, and tuning
//! configuration.

pub mod binop;
pub mod descriptor;
pub mod error;
pub mod mask;
pub mod matrix;
pub mod monoid;
pub mod scalar;
pub mod semiring;

pub use binop::{BinaryOp, BinaryOpKind};
pub use descriptor::{Descriptor, EngineConfig};
pub use error::{Error, Result};
pub use mask::Mask;
pub use matrix::{Matrix, Orientation};
pub use monoid::{Monoid, MonoidKind};
pub use scalar::{Scalar, ScalarCast, TypeTag};
pub use semiring::Semiring;
