//! Focus Module
//!
//! Tracks the current window together with the spot and monitor the user is
//! working in. The spot/monitor context survives when the current window
//! goes away so new windows still land where the user is looking.

use anyhow::Result;
use tracing::debug;

use crate::config::BorderConfig;
use crate::wm::WindowManager;
use crate::wm::backend::{Backend, FocusTarget};
use crate::wm::client::Client;
use crate::wm::client_flags::Protocols;
use crate::wm::screen::Spot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    /// Focused window, if any. Always visible and manageable when set.
    pub current: Option<u32>,
    pub spot: Spot,
    pub monitor: usize,
}

/// Border (color, width) for `client`.
pub fn border_style(border: &BorderConfig, client: &Client, current: Option<u32>) -> (u32, u32) {
    let color = if current == Some(client.window) {
        border.focus
    } else if client.is_urgent() {
        border.urgent
    } else if client.is_above() {
        border.above
    } else {
        border.blur
    };
    let width = if client.is_fullscreen() { 0 } else { border.width };
    (color, width)
}

impl<B: Backend> WindowManager<B> {
    /// Fresh client for the current window, if it is still usable.
    pub fn current_client(&self) -> Option<Client> {
        self.focus
            .current
            .and_then(|w| self.build_client(w))
            .filter(|c| c.visible && c.manage)
    }

    pub fn update_border(&self, client: &Client) -> Result<()> {
        if !client.manage {
            return Ok(());
        }
        let (color, width) = border_style(&self.config.border, client, self.focus.current);
        self.backend.set_border(client.window, color, width)
    }

    /// Give `client` the input focus.
    pub fn set_focus(&mut self, client: &Client) -> Result<()> {
        if !client.visible || self.focus.current == Some(client.window) {
            return Ok(());
        }
        debug!("Focusing 0x{:x} ({:?}, monitor {})", client.window, client.spot, client.monitor);

        let previous = self.focus.current.replace(client.window);
        self.focus.spot = client.spot;
        self.focus.monitor = client.monitor;

        if let Some(prev) = previous.and_then(|w| self.build_client(w)) {
            self.update_border(&prev)?;
        }

        if self.backend.protocols(client.window).contains(Protocols::TAKE_FOCUS) {
            self.backend
                .send_protocol(client.window, Protocols::TAKE_FOCUS, self.latest)?;
        }

        let target = if client.input {
            FocusTarget::Window(client.window)
        } else {
            FocusTarget::PointerRoot
        };
        self.backend.set_input_focus(target)?;
        self.backend.set_active_window(client.window)?;
        self.update_border(client)
    }

    /// Raise and focus.
    pub fn activate(&mut self, client: &Client) -> Result<()> {
        self.raise_family(client)?;
        self.set_focus(client)
    }

    /// Drop the focus but remember where the user is working.
    pub fn clear_focus(&mut self, spot: Spot, monitor: usize) -> Result<()> {
        debug!("Nothing to focus in {:?} on monitor {}", spot, monitor);
        let previous = self.focus.current.take();
        self.focus.spot = spot;
        self.focus.monitor = monitor;

        if let Some(prev) = previous.and_then(|w| self.build_client(w)) {
            self.update_border(&prev)?;
        }
        self.backend.set_input_focus(FocusTarget::PointerRoot)?;
        self.backend.set_active_window(0)
    }

    /// Activate the topmost manageable window in `spot` on `monitor`.
    /// Returns the window, or `None` if the spot is empty.
    pub fn focus_top_window(&mut self, spot: Spot, monitor: usize, except: Option<u32>) -> Result<Option<u32>> {
        let target = self
            .clients()
            .iter()
            .find(|c| {
                c.manage && c.visible && c.spot == spot && c.monitor == monitor && Some(c.window) != except
            })
            .cloned();

        match target {
            Some(client) => {
                self.activate(&client)?;
                Ok(Some(client.window))
            }
            None => Ok(None),
        }
    }

    /// Like [`Self::focus_top_window`], clearing the focus when the spot is empty.
    pub fn try_focus_top_window(&mut self, spot: Spot, monitor: usize) -> Result<()> {
        if self.focus_top_window(spot, monitor, None)?.is_none() {
            self.clear_focus(spot, monitor)?;
        }
        Ok(())
    }

    /// The current window went away: fall back to its spot, then to any
    /// other spot on the same monitor.
    pub fn focus_lost(&mut self, window: u32) -> Result<()> {
        self.focus.current = None;
        let (spot, monitor) = (self.focus.spot, self.focus.monitor);

        let order = std::iter::once(spot).chain(Spot::ALL.into_iter().filter(|&s| s != spot));
        for candidate in order {
            if self.focus_top_window(candidate, monitor, Some(window))?.is_some() {
                return Ok(());
            }
        }
        self.clear_focus(spot, monitor)
    }
}
