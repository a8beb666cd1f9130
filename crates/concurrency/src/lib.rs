//! Concurrency primitives for the multiply engine: fork-join task helpers,
//! the atomic monoid accumulator used by fine tasks, the per-task hash
//! workspace arena, and cross-task failure signaling.

pub mod arena;
pub mod atomic_monoid;
pub mod parallel;
pub mod status;

pub use arena::{Arena, TaskWorkspace};
pub use parallel::{parallel_for_each, pslice, prefix_sum};
pub use status::{StatusCell, TaskStatus};
