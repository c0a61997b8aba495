use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Coarse cancellation token checked at record and phase boundaries.
///
/// Cancellation never aborts mid-resource; the current record finishes and
/// the next boundary observes the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
