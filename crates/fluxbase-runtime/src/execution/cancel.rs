use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Carries cancellation from a caller into a running execution (spec
/// §4.E "new_cancel_signal"). Cloning shares the same underlying state —
/// cancelling any clone cancels all of them.
#[derive(Clone)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
    token: CancellationToken,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// A token composable with `tokio::select!`, mirroring the shutdown
    /// watch channel pattern used elsewhere in this crate.
    pub fn context(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Convenience free function matching the spec's naming
/// (`new_cancel_signal() -> Signal`).
pub fn new_cancel_signal() -> CancelSignal {
    CancelSignal::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let signal = new_cancel_signal();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_on_clones() {
        let signal = new_cancel_signal();
        let clone = signal.clone();
        signal.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.context().is_cancelled());
    }
}
