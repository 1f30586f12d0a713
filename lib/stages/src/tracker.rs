use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::metrics::STAGE_METRICS;

/// Counts outstanding units of work across all stages.
///
/// A unit is registered with [`WorkTracker::track`] before it is spawned or queued and is
/// released when its [`WorkGuard`] is dropped. Work spawned by a unit must be registered
/// before the parent's guard is released, so the count only reaches zero once everything
/// transitively spawned has terminated.
#[derive(Debug, Clone, Default)]
pub struct WorkTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    drained: Notify,
}

/// Registration of one unit of work. Dropping it releases the unit.
#[derive(Debug)]
#[must_use = "the unit of work is released as soon as the guard is dropped"]
pub struct WorkGuard {
    inner: Arc<Inner>,
}

/// Item queued between stages together with the guard that keeps it counted.
#[derive(Debug)]
pub struct Tracked<T> {
    item: T,
    guard: WorkGuard,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self) -> WorkGuard {
        let outstanding = self.inner.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        STAGE_METRICS.outstanding_work.set(outstanding);
        WorkGuard {
            inner: self.inner.clone(),
        }
    }

    pub fn track_item<T>(&self, item: T) -> Tracked<T> {
        Tracked {
            item,
            guard: self.track(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Resolves once no unit of work is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a release in between is not missed.
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        let previous = self.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        STAGE_METRICS.outstanding_work.set(previous - 1);
        if previous == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

impl<T> Tracked<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn into_parts(self) -> (T, WorkGuard) {
        (self.item, self.guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_tracker_is_drained() {
        let tracker = WorkTracker::new();
        tracker.wait().await;
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn nested_work_keeps_tracker_busy() {
        let tracker = WorkTracker::new();
        let parent = tracker.track();

        let spawned = tracker.clone();
        tokio::spawn(async move {
            let child = spawned.track_item(42);
            drop(parent);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let (value, _guard) = child.into_parts();
            assert_eq!(value, 42);
        });

        tokio::time::timeout(Duration::from_secs(5), tracker.wait())
            .await
            .expect("tracker did not drain");
        assert_eq!(tracker.outstanding(), 0);
    }
}
