//! Client Cache
//!
//! Per-iteration view of every visible top-level window, topmost first.
//! The event loop releases it before fetching each event; the first handler
//! that needs the window list rebuilds it with a single stacking query.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::wm::backend::Backend;
use crate::wm::client::Client;
use crate::wm::screen::Monitor;

#[derive(Debug, Default)]
pub struct ClientCache {
    /// Bumped on every release; lets callers tell iterations apart.
    epoch: u64,
    entries: Option<Rc<[Client]>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[cfg(test)]
    pub fn is_populated(&self) -> bool {
        self.entries.is_some()
    }

    /// Visible windows for this iteration, topmost first. Includes unmanaged
    /// ones such as docks; filter on [`Client::manage`] where it matters.
    pub fn acquire<B: Backend>(&mut self, backend: &B, monitors: &[Monitor]) -> Rc<[Client]> {
        if let Some(entries) = &self.entries {
            return Rc::clone(entries);
        }

        let order = backend.stacking_order().unwrap_or_else(|e| {
            warn!("Failed to query window stack: {:#}", e);
            Vec::new()
        });
        let entries: Rc<[Client]> = order
            .into_iter()
            .rev()
            .filter_map(|w| Client::build(backend, monitors, w))
            .filter(|c| c.visible)
            .collect();
        debug!("Client cache epoch {}: {} windows", self.epoch, entries.len());

        self.entries = Some(Rc::clone(&entries));
        entries
    }

    /// Drop this iteration's entries.
    pub fn release(&mut self) {
        self.entries = None;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::shared::Geometry;
    use crate::wm::testing::{FakeBackend, FakeWindow};

    fn monitors() -> Vec<Monitor> {
        let mut m = Monitor::new(Geometry::new(0, 0, 1920, 1080));
        m.compute_spots(&LayoutConfig::default());
        vec![m]
    }

    #[test]
    fn test_acquire_is_topmost_first_and_visible_only() {
        let backend = FakeBackend::new();
        backend.add(1, FakeWindow::normal(Geometry::new(0, 0, 100, 100)));
        backend.add(2, FakeWindow::normal(Geometry::new(0, 0, 100, 100)));
        backend.add(3, FakeWindow::dock(Geometry::new(0, 0, 1920, 30)));
        backend.set_viewable(2, false);

        let mut cache = ClientCache::new();
        let clients = cache.acquire(&backend, &monitors());
        let ids: Vec<u32> = clients.iter().map(|c| c.window).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_entries_are_stable_until_released() {
        let backend = FakeBackend::new();
        backend.add(1, FakeWindow::normal(Geometry::new(0, 0, 100, 100)));
        let monitors = monitors();
        let mut cache = ClientCache::new();

        let first = cache.acquire(&backend, &monitors);
        backend.add(2, FakeWindow::normal(Geometry::new(0, 0, 100, 100)));
        let second = cache.acquire(&backend, &monitors);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        let epoch = cache.epoch();
        cache.release();
        assert!(!cache.is_populated());
        assert_eq!(cache.epoch(), epoch + 1);
        assert_eq!(cache.acquire(&backend, &monitors).len(), 2);
    }

    #[test]
    fn test_vanished_windows_are_skipped() {
        let backend = FakeBackend::new();
        backend.add(1, FakeWindow::normal(Geometry::new(0, 0, 100, 100)));
        backend.stack.borrow_mut().push(99);
        let mut cache = ClientCache::new();
        assert_eq!(cache.acquire(&backend, &monitors()).len(), 1);
    }
}
