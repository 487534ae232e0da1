//! Shared progress, cancellation and deadline handle for long engine runs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Progress tracking for Monte Carlo and Sobol runs.
///
/// Clones share the same counters, so a caller can keep one copy to watch or
/// cancel while the engine holds another.
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Completed work units (trials or design rows)
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RunProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Stop once `budget` has elapsed from now
    #[must_use]
    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn add(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    /// Reset counters for a new phase of work
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Whether an engine should abandon the run
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline_passed()
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let progress = RunProgress::new(10);
        let watcher = progress.clone();
        progress.add(4);
        assert_eq!(watcher.completed(), 4);

        watcher.cancel();
        assert!(progress.should_stop());
    }

    #[test]
    fn test_expired_deadline_stops() {
        let progress = RunProgress::new(1).with_deadline(Duration::ZERO);
        assert!(progress.deadline_passed());
        assert!(progress.should_stop());
        assert!(!progress.is_cancelled());
    }

    #[test]
    fn test_reset() {
        let progress = RunProgress::new(3);
        progress.add(3);
        progress.reset(8);
        assert_eq!(progress.completed(), 0);
        assert_eq!(progress.total(), 8);
    }
}
