//! Events Module
//!
//! The event loop and one handler per protocol event kind. Handlers always
//! look at fresh client state; the cache is dropped before every event.

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::config::{FocusStart, SpotStart};
use crate::wm::backend::{Backend, ClientMessageKind, ConfigureRequest, WmEvent};
use crate::wm::errors;
use crate::wm::keyboard::find_binding;
use crate::wm::placement::best_fit_spot;
use crate::wm::screen::Spot;
use crate::wm::{Outcome, WindowManager};

impl<B: Backend> WindowManager<B> {
    /// Process events until an exit or restart message arrives.
    ///
    /// Handler failures are logged and the loop carries on; losing the
    /// connection ends it with an error.
    pub fn run(&mut self) -> Result<Outcome> {
        info!("Entering event loop");
        loop {
            self.cache.release();
            self.backend.flush()?;
            let event = self
                .backend
                .next_event()
                .context("Failed to read the next X event")?;

            match self.handle_event(event) {
                Ok(Some(outcome)) => {
                    info!("Leaving event loop: {:?}", outcome);
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => error!("Event handler failed: {:#}", e),
            }
        }
    }

    pub fn handle_event(&mut self, event: WmEvent) -> Result<Option<Outcome>> {
        match event {
            WmEvent::CreateNotify(window) => self.on_create_notify(window)?,
            WmEvent::ConfigureRequest(request) => self.on_configure_request(&request)?,
            WmEvent::ConfigureNotify(window) => self.on_configure_notify(window)?,
            WmEvent::MapRequest(window) => self.on_map_request(window)?,
            WmEvent::MapNotify(window) => self.on_map_notify(window)?,
            WmEvent::UnmapNotify(window) => self.on_unmap_notify(window)?,
            WmEvent::KeyPress { keysym, modifiers, time } => self.on_key_press(keysym, modifiers, time)?,
            WmEvent::ButtonPress { subwindow, time } => self.on_button_press(subwindow, time)?,
            WmEvent::ClientMessage { window, kind } => return self.on_client_message(window, kind),
            WmEvent::FocusChange(window) | WmEvent::PropertyChange(window) => self.refresh_border(window)?,
            WmEvent::ProtocolError { request, error } => errors::report(request, error),
            WmEvent::Ignored => {}
        }
        Ok(None)
    }

    fn on_create_notify(&mut self, window: u32) -> Result<()> {
        match self.build_client(window) {
            Some(client) if client.manage => self.backend.listen(window),
            _ => Ok(()),
        }
    }

    fn on_configure_request(&mut self, request: &ConfigureRequest) -> Result<()> {
        let Some(client) = self.build_client(request.window) else {
            return Ok(());
        };

        if client.manage && client.visible && client.transient.is_none() {
            // Tiled windows keep their spot no matter what they ask for
            self.update_border(&client)?;
            self.place(&client, client.spot, client.monitor, false)
        } else {
            self.backend.configure(request, self.config.border.width)
        }
    }

    fn on_configure_notify(&mut self, window: u32) -> Result<()> {
        match self.build_client(window) {
            Some(client) if client.manage => self.publish_client_list(),
            _ => Ok(()),
        }
    }

    fn on_map_request(&mut self, window: u32) -> Result<()> {
        let Some(client) = self.build_client(window) else {
            return Ok(());
        };

        if client.manage {
            let placement = &self.config.placement;
            let monitor = self.clamp_monitor(placement.monitor_start.unwrap_or(self.focus.monitor) as i64);
            let spot = match placement.spot_start {
                SpotStart::Smart => match self.monitors.get(monitor) {
                    Some(m) => best_fit_spot(m, client.geometry.width, client.geometry.height),
                    None => Spot::Spot1,
                },
                SpotStart::Current => self.focus.spot,
                SpotStart::Spot1 => Spot::Spot1,
                SpotStart::Spot2 => Spot::Spot2,
                SpotStart::Spot3 => Spot::Spot3,
            };
            debug!("New window 0x{:x} goes to {:?} on monitor {}", window, spot, monitor);

            self.place(&client, spot, monitor, false)?;
            self.update_border(&client)?;
        }
        self.backend.map_window(window)
    }

    fn on_map_notify(&mut self, window: u32) -> Result<()> {
        let Some(client) = self.build_client(window).filter(|c| c.manage && c.visible) else {
            return Ok(());
        };

        self.raise_family(&client)?;
        self.update_border(&client)?;

        let take_focus = self.config.placement.focus_start == FocusStart::Steal
            || match self.current_client() {
                None => true,
                Some(current) => current.spot == client.spot && current.monitor == client.monitor,
            };
        if take_focus {
            self.set_focus(&client)?;
        }
        self.publish_client_list()
    }

    fn on_unmap_notify(&mut self, window: u32) -> Result<()> {
        if self.focus.current == Some(window) {
            debug!("Focused window 0x{:x} unmapped", window);
            self.focus_lost(window)?;
        }
        self.publish_client_list()
    }

    fn on_key_press(&mut self, keysym: u32, modifiers: u16, time: u32) -> Result<()> {
        self.latest = time;
        let action = find_binding(&self.bindings, keysym, modifiers).map(|b| b.action.clone());
        match action {
            Some(action) => {
                self.perform(&action)?;
                self.backend.drop_queued_key_presses()
            }
            None => {
                debug!("No binding for keysym 0x{:x} with state 0x{:x}", keysym, modifiers);
                Ok(())
            }
        }
    }

    fn on_button_press(&mut self, subwindow: u32, time: u32) -> Result<()> {
        self.latest = time;
        if let Some(client) = self.build_client(subwindow).filter(|c| c.manage) {
            self.activate(&client)?;
        }
        self.backend.replay_pointer()
    }

    fn on_client_message(&mut self, window: u32, kind: ClientMessageKind) -> Result<Option<Outcome>> {
        match kind {
            ClientMessageKind::Exit => return Ok(Some(Outcome::Exit)),
            ClientMessageKind::Restart => return Ok(Some(Outcome::Restart)),
            ClientMessageKind::ActivateWindow | ClientMessageKind::CloseWindow => {
                let Some(client) = self.build_client(window).filter(|c| c.manage) else {
                    return Ok(None);
                };
                if kind == ClientMessageKind::ActivateWindow {
                    self.activate(&client)?;
                } else {
                    self.close(&client)?;
                }
            }
            ClientMessageKind::Other(atom) => debug!("Ignoring client message {} on 0x{:x}", atom, window),
        }
        Ok(None)
    }

    fn refresh_border(&mut self, window: u32) -> Result<()> {
        match self.build_client(window) {
            Some(client) if client.manage && client.visible => self.update_border(&client),
            _ => Ok(()),
        }
    }
}
