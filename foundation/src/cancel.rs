//! Cooperative cancellation shared by the whole process.
//!
//! The [`Runtime`](crate::Runtime) owns the only [`CancellationSource`];
//! everything else receives a [`CancellationToken`] and polls it between
//! units of work. Blocking I/O that never polls is not interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RuntimeError;

/// Owning side of a cancellation scope. Only the owner can trigger it.
#[derive(Debug, Default)]
pub struct CancellationSource {
    flag: Arc<AtomicBool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an observer tied to this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Trigger cancellation. There is no way back.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Observer side of a cancellation scope.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is never cancelled, for callers outside any scope.
    pub fn never() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(RuntimeError::Cancelled)` once the owning source has fired.
    pub fn check(&self) -> Result<(), RuntimeError> {
        if self.is_cancelled() {
            Err(RuntimeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_observe_source_cancellation() {
        let source = CancellationSource::new();
        let token = source.token();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        source.cancel();

        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
        assert!(matches!(token.check(), Err(RuntimeError::Cancelled)));
    }

    #[test]
    fn cancellation_is_monotonic() {
        let source = CancellationSource::new();
        source.cancel();
        source.cancel();
        assert!(source.is_cancelled());
        assert!(source.token().is_cancelled());
    }

    #[test]
    fn never_token_stays_live() {
        let token = CancellationToken::never();
        assert!(!token.is_cancelled());
    }
}
