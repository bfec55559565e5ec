//! Layout pass scheduling
//!
//! A layout pass must never run inside another one. Requests that arrive while a
//! pass is running (or from collaborators holding a [`LayoutHandle`]) are
//! coalesced into a single pending request that runs on the next [`frame`].
//!
//! [`frame`]: LayoutScheduler::frame

use std::cell::Cell;
use std::rc::Rc;

use super::types::BoundingBox;

#[derive(Debug, Default)]
struct Shared {
    in_progress: Cell<bool>,
    pending: Cell<Option<BoundingBox>>,
}

/// Marks a pass as running until dropped, even if the pass unwinds
struct PassGuard<'a> {
    shared: &'a Shared,
}

impl<'a> PassGuard<'a> {
    fn enter(shared: &'a Shared) -> Self {
        shared.in_progress.set(true);
        Self { shared }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.shared.in_progress.set(false);
    }
}

/// Cloneable request channel into a [`LayoutScheduler`]
#[derive(Debug, Clone)]
pub struct LayoutHandle {
    shared: Rc<Shared>,
}

impl LayoutHandle {
    /// Ask for a layout against `container` on the next frame; later requests win
    pub fn request(&self, container: BoundingBox) {
        if self.shared.in_progress.get() {
            log::debug!("layout requested during a pass, deferring to next frame");
        }
        self.shared.pending.set(Some(container));
    }

    pub fn is_in_progress(&self) -> bool {
        self.shared.in_progress.get()
    }
}

/// Re-entrancy guard and request coalescer for layout passes
#[derive(Debug, Default)]
pub struct LayoutScheduler {
    shared: Rc<Shared>,
    last_container: Option<BoundingBox>,
}

impl LayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> LayoutHandle {
        LayoutHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Queue a layout for the next frame
    pub fn request(&self, container: BoundingBox) {
        self.handle().request(container);
    }

    pub fn is_pending(&self) -> bool {
        self.shared.pending.get().is_some()
    }

    pub fn is_in_progress(&self) -> bool {
        self.shared.in_progress.get()
    }

    /// Container bounds of the most recent completed pass
    pub fn last_container(&self) -> Option<BoundingBox> {
        self.last_container
    }

    /// Run a layout pass now, unless one is already running
    ///
    /// Returns `None` (and records the request as pending) when a pass is in progress.
    pub fn run<R>(&mut self, container: BoundingBox, pass: impl FnOnce(BoundingBox) -> R) -> Option<R> {
        if self.shared.in_progress.get() {
            log::debug!("layout pass already running, deferring");
            self.shared.pending.set(Some(container));
            return None;
        }

        let result = {
            let _guard = PassGuard::enter(&self.shared);
            pass(container)
        };
        self.last_container = Some(container);
        Some(result)
    }

    /// Run the coalesced pending request, if any
    pub fn frame<R>(&mut self, pass: impl FnOnce(BoundingBox) -> R) -> Option<R> {
        if self.shared.in_progress.get() {
            return None;
        }
        let container = self.shared.pending.take()?;
        self.run(container, pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(width: f64) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, width, 100.0)
    }

    #[test]
    fn test_run_executes_immediately() {
        let mut scheduler = LayoutScheduler::new();
        let result = scheduler.run(bounds(100.0), |c| c.width);
        assert_eq!(result, Some(100.0));
        assert_eq!(scheduler.last_container(), Some(bounds(100.0)));
        assert!(!scheduler.is_in_progress());
    }

    #[test]
    fn test_requests_coalesce_to_latest() {
        let mut scheduler = LayoutScheduler::new();
        let handle = scheduler.handle();
        handle.request(bounds(100.0));
        handle.request(bounds(200.0));
        scheduler.request(bounds(300.0));
        assert!(scheduler.is_pending());

        let mut runs = Vec::new();
        scheduler.frame(|c| runs.push(c.width));
        scheduler.frame(|c| runs.push(c.width));
        assert_eq!(runs, vec![300.0]);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_request_during_pass_is_deferred() {
        let mut scheduler = LayoutScheduler::new();
        let handle = scheduler.handle();

        scheduler.run(bounds(100.0), |_| {
            assert!(handle.is_in_progress());
            handle.request(bounds(150.0));
        });

        assert!(scheduler.is_pending());
        let width = scheduler.frame(|c| c.width);
        assert_eq!(width, Some(150.0));
    }

    #[test]
    fn test_panicking_pass_does_not_block_later_passes() {
        let mut scheduler = LayoutScheduler::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scheduler.run(bounds(100.0), |_| panic!("measurer failed"));
        }));
        assert!(outcome.is_err());
        assert!(!scheduler.is_in_progress());
        assert_eq!(scheduler.run(bounds(200.0), |c| c.width), Some(200.0));
    }

    #[test]
    fn test_frame_without_request_is_noop() {
        let mut scheduler = LayoutScheduler::new();
        assert_eq!(scheduler.frame(|_| 1), None);
    }
}
