//! The Budget Accountant: a process-local, atomically-updated counter
//! capping total research-phase model tokens.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::llm::Usage;

/// Point-in-time snapshot of budget state, returned to callers that need to
/// report it (e.g. attached to the final [`crate::ResearchResult`]... —
/// actually owned by `scry-research`, this crate only defines the shape).
#[derive(Debug, Clone, Copy)]
pub struct BudgetSnapshot {
    pub cap: Option<u64>,
    pub used: u64,
    pub reached: bool,
}

/// Shared budget state for one invocation. Cheap to clone — clones share the
/// same counters via `Arc`.
#[derive(Clone)]
pub struct BudgetAccountant {
    inner: Arc<Inner>,
}

struct Inner {
    cap: Option<u64>,
    used: AtomicU64,
    reached: AtomicBool,
}

impl BudgetAccountant {
    /// Creates a new accountant. `cap = None` means unbounded — `reached`
    /// never becomes true.
    #[must_use]
    pub fn new(cap: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cap,
                used: AtomicU64::new(0),
                reached: AtomicBool::new(false),
            }),
        }
    }

    /// Records usage from a completed gateway call. Adds `usage.total()` to
    /// `used` and sets `reached` once `used >= cap`. `reached` is sticky:
    /// once true, subsequent calls never clear it.
    pub fn record(&self, usage: Usage) {
        let added = usage.total();
        let used = self.inner.used.fetch_add(added, Ordering::SeqCst) + added;
        if let Some(cap) = self.inner.cap {
            if used >= cap {
                self.inner.reached.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Point-in-time read of the sticky reached flag. A stale `false` racing
    /// a concurrent `record` leads to at most one extra call beyond the cap,
    /// which is an accepted race, not a bug.
    #[must_use]
    pub fn reached(&self) -> bool {
        self.inner.reached.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            cap: self.inner.cap,
            used: self.inner.used.load(Ordering::SeqCst),
            reached: self.inner.reached.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_is_false_with_no_cap() {
        let acc = BudgetAccountant::new(None);
        acc.record(Usage { input_tokens: 1_000_000, output_tokens: 1_000_000 });
        assert!(!acc.reached());
    }

    #[test]
    fn reached_flips_once_used_meets_cap() {
        let acc = BudgetAccountant::new(Some(1000));
        acc.record(Usage { input_tokens: 400, output_tokens: 200 });
        assert!(!acc.reached());
        acc.record(Usage { input_tokens: 300, output_tokens: 200 });
        assert!(acc.reached());
    }

    #[test]
    fn reached_is_sticky() {
        let acc = BudgetAccountant::new(Some(100));
        acc.record(Usage { input_tokens: 200, output_tokens: 0 });
        assert!(acc.reached());
        let snap = acc.snapshot();
        assert_eq!(snap.used, 200);
        assert!(snap.reached);
    }

    #[test]
    fn used_is_monotonically_non_decreasing() {
        let acc = BudgetAccountant::new(Some(10_000));
        let mut last = 0u64;
        for _ in 0..5 {
            acc.record(Usage { input_tokens: 10, output_tokens: 5 });
            let used = acc.snapshot().used;
            assert!(used >= last);
            last = used;
        }
    }
}
