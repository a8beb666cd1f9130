//! The parallel multiply engine: flop-driven task partitioning, the
//! Gustavson/Hash accumulators, the saxpy and dot algorithm families, and
//! the top-level driver that picks between them.

pub mod dispatch;
pub mod dot;
pub mod driver;
pub mod hash;
pub mod partition;
pub mod saxpy;

pub use dispatch::is_builtin_combo;
pub use driver::multiply;
pub use hash::{choose_accumulator, Accumulator};
pub use partition::{build_tasks, column_flops, Task};
