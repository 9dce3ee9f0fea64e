//! Window Manager Module
//!
//! The spot-tiling core. [`WindowManager`] owns the monitor layout, the
//! per-iteration client cache and the focus state; its behavior is split
//! across the submodules by concern (placement, stacking, focus, actions,
//! events, session).

pub mod actions;
pub mod backend;
pub mod cache;
pub mod client;
pub mod client_flags;
pub mod display;
pub mod errors;
pub mod events;
pub mod ewmh;
pub mod focus;
pub mod hints;
pub mod keyboard;
pub mod placement;
pub mod screen;
pub mod session;
pub mod stacking;

#[cfg(test)]
pub mod testing;

use anyhow::Result;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::launcher::Launcher;
use crate::wm::backend::Backend;
use crate::wm::cache::ClientCache;
use crate::wm::client::Client;
use crate::wm::focus::FocusState;
use crate::wm::keyboard::KeyBinding;
use crate::wm::screen::{Monitor, build_monitors};
use crate::wm::session::SnapshotEntry;

/// Why the event loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exit,
    Restart,
}

pub struct WindowManager<B: Backend> {
    pub backend: B,
    pub config: Config,
    pub monitors: Vec<Monitor>,
    pub cache: ClientCache,
    pub focus: FocusState,
    pub snapshot: Vec<SnapshotEntry>,
    pub bindings: Vec<KeyBinding>,
    launcher: Box<dyn Launcher>,
    /// Timestamp of the latest key or button event
    latest: u32,
}

impl<B: Backend> WindowManager<B> {
    pub fn new(backend: B, config: Config, bindings: Vec<KeyBinding>, launcher: Box<dyn Launcher>) -> Self {
        Self {
            backend,
            config,
            monitors: Vec::new(),
            cache: ClientCache::new(),
            focus: FocusState::default(),
            snapshot: Vec::new(),
            bindings,
            launcher,
            latest: 0,
        }
    }

    /// Detect monitors and panel struts, then lay out the spots.
    pub fn setup_monitors(&mut self) -> Result<()> {
        let screen = self.backend.screen_size();
        let outputs = self.backend.monitors().unwrap_or_else(|e| {
            warn!("Monitor query failed, using the whole screen: {:#}", e);
            Vec::new()
        });

        // Struts are read from the windows visible right now
        self.monitors = build_monitors(&outputs, &[], screen, &self.config.layout);
        let struts: Vec<_> = self
            .clients()
            .iter()
            .filter_map(|c| self.backend.strut(c.window))
            .collect();
        debug!("Found {} panel struts", struts.len());
        self.monitors = build_monitors(&outputs, &struts, screen, &self.config.layout);
        self.cache.release();

        info!("Layout ready on {} monitor(s)", self.monitors.len());
        Ok(())
    }

    /// Adopt every window that was already mapped before we started.
    pub fn adopt_windows(&mut self) -> Result<()> {
        self.cache.release();
        let clients = self.clients();
        for client in clients.iter().filter(|c| c.manage) {
            debug!("Adopting window 0x{:x}", client.window);
            self.backend.listen(client.window)?;
            self.update_border(client)?;
            self.place(client, client.spot, client.monitor, false)?;
            if self.focus.current.is_none() {
                self.activate(client)?;
            }
        }
        self.publish_client_list()
    }

    /// This iteration's visible windows, topmost first.
    pub fn clients(&mut self) -> Rc<[Client]> {
        self.cache.acquire(&self.backend, &self.monitors)
    }

    /// Fresh client for one window, bypassing the cache.
    pub fn build_client(&self, window: u32) -> Option<Client> {
        Client::build(&self.backend, &self.monitors, window)
    }

    /// Index clamped into the monitor list.
    pub fn clamp_monitor(&self, index: i64) -> usize {
        let last = self.monitors.len().saturating_sub(1) as i64;
        index.clamp(0, last) as usize
    }

    /// Publish _NET_CLIENT_LIST{,_STACKING}, bottom to top.
    pub fn publish_client_list(&mut self) -> Result<()> {
        let windows: Vec<u32> = self
            .clients()
            .iter()
            .rev()
            .filter(|c| c.manage)
            .map(|c| c.window)
            .collect();
        self.backend.set_client_list(&windows)
    }

    pub(crate) fn launch(&self, command: &str) {
        if let Err(e) = self.launcher.launch(command) {
            warn!("{:#}", e);
        }
    }
}
