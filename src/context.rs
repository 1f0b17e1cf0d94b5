//! Shared execution context for concurrent assessments.
//!
//! Everything that must be shared across channel assessments lives here and
//! is passed explicitly; there is no process-wide mutable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::utilities::rpm_controller::{ConcurrencyCeiling, RPMController};

/// Cooperative cancellation signal, checked only at batch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. In-flight batches still complete.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The single shared context handed to every assessment.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    /// Global ceiling on in-flight reasoning requests.
    pub ceiling: Arc<dyn ConcurrencyCeiling>,
    pub cancel: CancelFlag,
}

impl ProbeContext {
    pub fn new(ceiling: Arc<dyn ConcurrencyCeiling>) -> Self {
        Self {
            ceiling,
            cancel: CancelFlag::new(),
        }
    }

    /// Context backed by an [`RPMController`] with the given concurrency.
    pub fn with_max_concurrency(max_concurrency: usize) -> Self {
        Self::new(Arc::new(RPMController::new(max_concurrency, None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let ctx = ProbeContext::with_max_concurrency(1);
        let other = ctx.clone();
        assert!(!ctx.cancel.is_cancelled());
        other.cancel.cancel();
        assert!(ctx.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_clones_share_one_ceiling() {
        let ctx = ProbeContext::with_max_concurrency(3);
        let other = ctx.clone();
        let _g = ctx.ceiling.acquire().await;
        assert_eq!(other.ceiling.in_flight(), 1);
    }
}
