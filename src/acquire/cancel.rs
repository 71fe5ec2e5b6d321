// src/acquire/cancel.rs
// =============================================================================
// Cooperative cancellation.
//
// A CancelSignal is cloned into every place that waits on the network. When
// cancel() is called, whatever acquisition or probe is in flight stops at its
// next await point and fails with AcquireFailure::Cancelled.
// =============================================================================

use crate::error::AcquireFailure;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    raised: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation flag; all clones share one state.
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Resolves once cancel() has been called on any clone.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Runs `fut` under a deadline and, when given, a cancellation signal.
pub(crate) async fn run_guarded<F, T>(
    fut: F,
    timeout: Duration,
    cancel: Option<&CancelSignal>,
) -> Result<T, AcquireFailure>
where
    F: Future<Output = Result<T, AcquireFailure>>,
{
    let deadline = async {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AcquireFailure::Timeout),
        }
    };

    match cancel {
        Some(signal) => {
            if signal.is_cancelled() {
                return Err(AcquireFailure::Cancelled);
            }
            tokio::select! {
                result = deadline => result,
                _ = signal.cancelled() => Err(AcquireFailure::Cancelled),
            }
        }
        None => deadline.await,
    }
}
