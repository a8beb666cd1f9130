//! A shared status cell tasks use to signal failure to their siblings
//! without an `Arc<Mutex<Result<...>>>` on the hot path: each task checks a
//! relaxed atomic load before doing meaningful work and bails out early once
//! any task has failed.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Ok,
    OutOfMemory,
    Cancelled,
}

impl TaskStatus {
    fn to_code(self) -> u8 {
        match self {
            TaskStatus::Ok => 0,
            TaskStatus::OutOfMemory => 1,
            TaskStatus::Cancelled => 2,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            1 => TaskStatus::OutOfMemory,
            2 => TaskStatus::Cancelled,
            _ => TaskStatus::Ok,
        }
    }
}

pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new() -> Self {
        StatusCell(AtomicU8::new(0))
    }

    /// Record a failure. First failure wins; later calls are no-ops so the
    /// first diagnosed cause is the one callers see.
    pub fn mark_failed(&self, status: TaskStatus) {
        self.0
            .compare_exchange(
                TaskStatus::Ok.to_code(),
                status.to_code(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .ok();
    }

    pub fn is_failed(&self) -> bool {
        self.0.load(Ordering::Acquire) != TaskStatus::Ok.to_code()
    }

    pub fn get(&self) -> TaskStatus {
        TaskStatus::from_code(self.0.load(Ordering::Acquire))
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ok() {
        let cell = StatusCell::new();
        assert!(!cell.is_failed());
        assert_eq!(cell.get(), TaskStatus::Ok);
    }

    #[test]
    fn first_failure_sticks() {
        let cell = StatusCell::new();
        cell.mark_failed(TaskStatus::OutOfMemory);
        cell.mark_failed(TaskStatus::Cancelled);
        assert_eq!(cell.get(), TaskStatus::OutOfMemory);
        assert!(cell.is_failed());
    }
}
