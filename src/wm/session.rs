//! Session Module
//!
//! In-memory layout snapshot: remember which spot every window sits in and
//! put them back later. Restoring is best effort; windows that closed or
//! changed class since the snapshot are left alone.

use anyhow::Result;
use tracing::{debug, info};

use crate::wm::WindowManager;
use crate::wm::backend::Backend;
use crate::wm::screen::Spot;

/// Where one window was when the snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub window: u32,
    pub class: String,
    pub spot: Spot,
    pub monitor: usize,
}

impl<B: Backend> WindowManager<B> {
    /// Replace the stored snapshot with the current layout, topmost first.
    pub fn snapshot(&mut self) {
        self.snapshot = self
            .clients()
            .iter()
            .filter(|c| c.manage)
            .filter_map(|c| {
                Some(SnapshotEntry {
                    window: c.window,
                    class: c.class.clone()?,
                    spot: c.spot,
                    monitor: c.monitor,
                })
            })
            .collect();
        info!("Snapshot taken of {} window(s)", self.snapshot.len());
    }

    /// Move every surviving window back to its snapshot spot.
    pub fn rollback(&mut self) -> Result<()> {
        let entries = self.snapshot.clone();
        let mut focus_target = None;

        // Bottom first, so the old topmost window ends up on top again
        for entry in entries.iter().rev() {
            let Some(mut client) = self.build_client(entry.window) else {
                continue;
            };
            if !client.visible || !client.manage || client.class.as_deref() != Some(entry.class.as_str()) {
                debug!("Skipping snapshot entry 0x{:x}", entry.window);
                continue;
            }

            self.place(&client, entry.spot, entry.monitor, true)?;
            self.raise_family(&client)?;

            client.spot = entry.spot;
            client.monitor = self.clamp_monitor(entry.monitor as i64);
            if client.spot == self.focus.spot && client.monitor == self.focus.monitor {
                focus_target = Some(client);
            }
        }

        if let Some(client) = focus_target {
            self.set_focus(&client)?;
        }
        Ok(())
    }
}
