//! Key binding actions
//!
//! Every binding resolves to an [`Action`]; [`WindowManager::perform`] is
//! the single dispatch point.

use anyhow::Result;
use tracing::{debug, info};

use crate::wm::WindowManager;
use crate::wm::backend::Backend;
use crate::wm::client::Client;
use crate::wm::client_flags::{Protocols, StateFlags};
use crate::wm::keyboard::Action;
use crate::wm::screen::{Direction, Spot};

impl<B: Backend> WindowManager<B> {
    pub fn perform(&mut self, action: &Action) -> Result<()> {
        debug!("Performing {:?}", action);
        match action {
            Action::Move(spot) => self.move_current(*spot),
            Action::MoveDirection(direction) => match self.current_client() {
                Some(client) => {
                    let spot = self.spot_towards(client.monitor, *direction);
                    self.move_current(spot)
                }
                None => Ok(()),
            },
            Action::Focus(spot) => self.try_focus_top_window(*spot, self.focus.monitor),
            Action::FocusDirection(direction) => {
                let monitor = self.focus.monitor;
                let spot = self.spot_towards(monitor, *direction);
                self.try_focus_top_window(spot, monitor)
            }
            Action::Close => match self.current_client() {
                Some(client) => self.close(&client),
                None => Ok(()),
            },
            Action::Cycle => self.cycle(true),
            Action::Other => self.cycle(false),
            Action::Command(command) => {
                self.launch(command);
                Ok(())
            }
            Action::FindOrStart(class) => self.find_or_start(class),
            Action::MoveMonitor(delta) => self.move_monitor(*delta),
            Action::FocusMonitor(delta) => self.focus_monitor(*delta),
            Action::FullscreenToggle => self.toggle_fullscreen(),
            Action::AboveToggle => self.toggle_above(),
            Action::Snapshot => {
                self.snapshot();
                Ok(())
            }
            Action::Rollback => self.rollback(),
        }
    }

    fn spot_towards(&self, monitor: usize, direction: Direction) -> Spot {
        self.monitors
            .get(monitor)
            .map(|m| m.choose_by_direction(self.config.layout.spot1_align, direction))
            .unwrap_or(self.focus.spot)
    }

    fn move_current(&mut self, spot: Spot) -> Result<()> {
        let Some(client) = self.current_client() else {
            return Ok(());
        };
        self.raise_family(&client)?;
        self.place(&client, spot, client.monitor, true)?;
        self.focus.spot = spot;
        Ok(())
    }

    /// Ask politely if the client supports it, otherwise kill it.
    pub fn close(&mut self, client: &Client) -> Result<()> {
        if self.backend.protocols(client.window).contains(Protocols::DELETE) {
            debug!("Sending WM_DELETE_WINDOW to 0x{:x}", client.window);
            self.backend
                .send_protocol(client.window, Protocols::DELETE, self.latest)
        } else {
            info!("Killing 0x{:x}", client.window);
            self.backend.kill_client(client.window)
        }
    }

    /// Focus the next window in the current spot. With `sink` the previous
    /// one goes to the bottom, so repeated use walks the whole spot.
    fn cycle(&mut self, sink: bool) -> Result<()> {
        let Some(current) = self.current_client() else {
            return Ok(());
        };
        let next = self.focus_top_window(current.spot, current.monitor, Some(current.window))?;
        if next.is_some() && sink {
            self.lower_family(&current)?;
        }
        Ok(())
    }

    fn find_or_start(&mut self, class: &str) -> Result<()> {
        let found = self
            .clients()
            .iter()
            .find(|c| c.manage && c.visible && c.class_matches(class))
            .cloned();
        match found {
            Some(client) => self.activate(&client),
            None => {
                self.launch(class);
                Ok(())
            }
        }
    }

    fn move_monitor(&mut self, delta: i32) -> Result<()> {
        let Some(client) = self.current_client() else {
            return Ok(());
        };
        let target = self.clamp_monitor(self.focus.monitor as i64 + delta as i64);
        if target == client.monitor {
            return Ok(());
        }

        self.place(&client, client.spot, target, true)?;
        self.raise_family(&client)?;
        self.focus.monitor = target;
        Ok(())
    }

    fn focus_monitor(&mut self, delta: i32) -> Result<()> {
        let target = self.clamp_monitor(self.focus.monitor as i64 + delta as i64);
        let spot = self.focus.spot;

        let order = std::iter::once(spot).chain(Spot::ALL.into_iter().filter(|&s| s != spot));
        for candidate in order {
            if self.focus_top_window(candidate, target, None)?.is_some() {
                return Ok(());
            }
        }
        self.clear_focus(spot, target)
    }

    fn toggle_fullscreen(&mut self) -> Result<()> {
        let Some(mut client) = self.current_client() else {
            return Ok(());
        };

        let spot = if client.is_fullscreen() {
            self.backend
                .saved_spot(client.window)
                .and_then(Spot::from_number)
                .unwrap_or_default()
        } else {
            self.backend.save_spot(client.window, client.spot.number())?;
            client.spot
        };

        let on = client.state.toggle(StateFlags::FULLSCREEN);
        debug!("Fullscreen {} for 0x{:x}", if on { "on" } else { "off" }, client.window);
        self.backend.set_wm_state(client.window, &client.state)?;

        self.place(&client, spot, client.monitor, true)?;
        client.spot = spot;
        self.focus.spot = spot;
        self.update_border(&client)?;
        self.raise_family(&client)
    }

    fn toggle_above(&mut self) -> Result<()> {
        let Some(mut client) = self.current_client() else {
            return Ok(());
        };
        client.state.toggle(StateFlags::ABOVE);
        self.backend.set_wm_state(client.window, &client.state)?;
        self.update_border(&client)?;
        self.raise_family(&client)
    }
}
