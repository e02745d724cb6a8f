use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag handed to a running task.
///
/// The token is cancelled once its executor's generation counter moves past
/// the generation it was issued at.
#[derive(Clone, Debug)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    pub(crate) fn new(current: Arc<AtomicU64>, issued: u64) -> Self {
        Self { current, issued }
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self::new(Arc::new(AtomicU64::new(0)), 0)
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_bump_cancels() {
        let generation = Arc::new(AtomicU64::new(3));
        let token = CancelToken::new(Arc::clone(&generation), 3);
        assert!(!token.is_cancelled());
        generation.fetch_add(1, Ordering::AcqRel);
        assert!(token.is_cancelled());
        assert!(!CancelToken::never().is_cancelled());
    }
}
