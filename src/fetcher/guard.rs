use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one issued fetch. Tokens from the same tracker increase monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Latest-request bookkeeping for overlapping fetches (timer ticks racing a manual
/// refresh, rapid paging). A completed fetch is applied only if nothing newer was
/// issued after it; superseded requests are not cancelled, just ignored.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}
