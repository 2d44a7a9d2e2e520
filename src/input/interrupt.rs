use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cross-thread wake-up flag for a blocked [`poll`](super::Input::poll).
///
/// Any thread may [`trigger`](Interrupt::trigger); the input thread consumes
/// it with a test-and-clear, so one trigger wakes at most one waiter.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether the flag was set, clearing it in the same step.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
