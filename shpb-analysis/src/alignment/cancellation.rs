use crate::error::AlignmentError;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Cooperative cancellation handle for long-running alignment.
///
/// Clones share the same flag, so a handle can be given to another thread
/// which calls [`Cancellation::cancel`]. An optional deadline fires without
/// outside intervention. The optimiser checks the handle once per generation.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A handle that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Default::default()
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn check(&self, generations: usize) -> Result<(), AlignmentError> {
        if self.is_cancelled() {
            Err(AlignmentError::Cancelled { generations })
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Err(AlignmentError::DeadlineExceeded { generations })
        } else {
            Ok(())
        }
    }
}
