/// Cooperative cancellation for long-running analyses
///
/// The caller owns the token and flips it (Ctrl+C handler, external deadline,
/// chat command...). The pipeline only polls it at its checkpoints; an
/// in-flight network call is never interrupted.
use crate::errors::AnalysisError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Checkpoint helper: `Err(Cancelled { stage })` once cancellation was requested
    pub fn check(&self, stage: &str) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            Err(AnalysisError::cancelled(stage))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        assert!(observer.check("start").is_ok());

        token.cancel();
        assert!(observer.is_cancelled());

        let err = observer.check("after holder fetch").unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("after holder fetch"));
    }
}
