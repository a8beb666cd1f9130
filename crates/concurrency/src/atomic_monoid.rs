//! Atomic monoid accumulation for fine (sub-vector-parallel) multiply
//! tasks: several threads may update the same hash-table slot, so
//! accumulation goes through a compare-and-swap loop instead of a plain
//! read-modify-write.
//!
//! Every `Scalar` is punned to a `u64` bit pattern (see
//! `graphblas_core::scalar::Scalar::to_bits64`), so one `AtomicU64`-based
//! loop serves every built-in type instead of one implementation per
//! integer width.

use std::sync::atomic::{AtomicU64, Ordering};

use graphblas_core::monoid::Monoid;
use graphblas_core::scalar::Scalar;

/// Atomically combine `value` into `slot` using `monoid`, retrying until the
/// compare-and-swap succeeds. Equivalent to `*slot = monoid.combine(*slot,
/// value)` done atomically.
pub fn atomic_accumulate<T: Scalar>(slot: &AtomicU64, value: T, monoid: &dyn Monoid<T>) {
    let mut current = slot.load(Ordering::Relaxed);
    loop {
        let current_val = T::from_bits64(current);
        let combined = monoid.combine(current_val, value).to_bits64();
        match slot.compare_exchange_weak(current, combined, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

/// Plain atomic store, used when a fine task claims a previously-empty hash
/// slot: the slot's `Hf` flag (see `arena::TaskWorkspace`) already
/// guarantees exactly one thread performs this first write, so no
/// compare-and-swap is needed here.
pub fn atomic_init<T: Scalar>(slot: &AtomicU64, value: T) {
    slot.store(value.to_bits64(), Ordering::Relaxed);
}
