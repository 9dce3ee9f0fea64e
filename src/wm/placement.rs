//! Placement Module
//!
//! Fits a window into a spot: transient and group overrides, size hints,
//! centering within the leftover space, and clamping to the monitor.

use anyhow::Result;
use tracing::{debug, warn};

use crate::shared::Geometry;
use crate::wm::WindowManager;
use crate::wm::backend::Backend;
use crate::wm::client::Client;
use crate::wm::hints::SizeHints;
use crate::wm::screen::{Monitor, Spot};

/// Geometry a client gets in `spot`, not counting its border.
pub fn compute_geometry(
    client: &Client,
    monitor: &Monitor,
    spot: Spot,
    size_hints: Option<&SizeHints>,
    border: i32,
) -> Geometry {
    if client.is_fullscreen() {
        return monitor.geometry;
    }

    let area = monitor.spot(spot);
    let (mut x, mut y, mut w, mut h) = (area.x, area.y, area.width, area.height);

    if client.is_dialog() {
        x += (w - client.geometry.width) / 2;
        y += (h - client.geometry.height) / 2;
        w = client.geometry.width + border * 2;
        h = client.geometry.height + border * 2;
    }
    w -= border * 2;
    h -= border * 2;
    let (sw, sh) = (w, h);

    if let Some(hints) = size_hints {
        (w, h) = hints.constrain(w, h, (sw, sh));
    }

    let usable = monitor.work_area;
    w = w.min(usable.width - border * 2).max(1);
    h = h.min(usable.height - border * 2).max(1);

    // center inside the slack the hints left over
    if w < sw {
        x += (sw - w) / 2;
    }
    if h < sh {
        y += (sh - h) / 2;
    }

    x = x.min(usable.right() - w - border * 2).max(usable.x);
    y = y.min(usable.bottom() - h - border * 2).max(usable.y);

    Geometry::new(x, y, w, h)
}

/// Smallest spot a window of the given size fits in; lowest-numbered spot
/// on ties, SPOT1 when it fits nowhere.
pub fn best_fit_spot(monitor: &Monitor, width: i32, height: i32) -> Spot {
    Spot::ALL
        .into_iter()
        .filter(|&s| {
            let area = monitor.spot(s);
            width <= area.width && height <= area.height
        })
        .min_by_key(|&s| (monitor.spot(s).area(), s.index()))
        .unwrap_or(Spot::Spot1)
}

impl<B: Backend> WindowManager<B> {
    /// Move `client` into `spot` on `monitor`.
    ///
    /// Unless `force` is set, a transient follows its parent and a dialog
    /// follows another window of its group.
    pub fn place(&mut self, client: &Client, spot: Spot, monitor: usize, force: bool) -> Result<()> {
        let (spot, monitor) = if force {
            (spot, monitor)
        } else {
            self.placement_override(client).unwrap_or((spot, monitor))
        };

        let monitor = self.clamp_monitor(monitor as i64);
        let Some(m) = self.monitors.get(monitor) else {
            warn!("No monitors configured, cannot place 0x{:x}", client.window);
            return Ok(());
        };

        let hints = self.backend.size_hints(client.window);
        let border = self.config.border.width as i32;
        let geometry = compute_geometry(client, m, spot, hints.as_ref(), border);
        debug!(
            "Placing 0x{:x} in {:?} on monitor {}: {:?}",
            client.window, spot, monitor, geometry
        );
        self.backend.move_resize(client.window, geometry)
    }

    fn placement_override(&mut self, client: &Client) -> Option<(Spot, usize)> {
        if let Some(parent) = client.transient.and_then(|t| self.build_client(t)) {
            return Some((parent.spot, parent.monitor));
        }

        let leader = client.leader.filter(|_| client.is_dialog())?;
        self.clients()
            .iter()
            .find(|o| o.manage && o.window != client.window && o.leader == Some(leader))
            .map(|o| (o.spot, o.monitor))
    }
}
