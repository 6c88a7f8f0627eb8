//! Cooperative cancellation for in-flight fetches.
//!
//! A fetch receives a [`CancellationToken`] and the result is only committed
//! to a directory when the token is still live. [`RequestSlot`] hands out one
//! token per request and cancels the previous one, so a superseded load can
//! never overwrite the state produced by a newer one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Control side of a token. Dropping the source does not cancel it.
#[derive(Debug, Default)]
pub struct CancellationSource {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Option<CancellationSource>,
    issued: u64,
}

impl RequestSlot {
    /// Cancels the outstanding request, if any, and returns a token for the next one.
    pub fn begin(&mut self) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let source = CancellationSource::new();
        let token = source.token();
        self.current = Some(source);
        self.issued += 1;
        token
    }

    /// Cancels the outstanding request without starting another.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}
