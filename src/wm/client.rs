use tracing::debug;

use crate::shared::Geometry;
use crate::wm::backend::Backend;
use crate::wm::client_flags::{StateFlags, WindowType, WmState};
use crate::wm::screen::{Monitor, Spot, monitor_at};

/// A snapshot of one top-level window as the server describes it right now.
///
/// Clients are never kept across event-loop iterations; build a fresh one
/// whenever a decision depends on the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// X11 window ID
    pub window: u32,
    pub geometry: Geometry,
    pub visible: bool,
    /// Eligible for placement, focus and borders
    pub manage: bool,
    /// Wants focus via SetInputFocus (WM_HINTS input)
    pub input: bool,
    pub transient: Option<u32>,
    pub leader: Option<u32>,
    pub window_type: WindowType,
    pub state: WmState,
    pub monitor: usize,
    pub spot: Spot,
    /// WM_CLASS class part, only read for visible windows
    pub class: Option<String>,
}

impl Client {
    /// Query everything about `window`. Returns `None` if its attributes
    /// cannot be read, which usually means it is already gone.
    pub fn build<B: Backend>(backend: &B, monitors: &[Monitor], window: u32) -> Option<Self> {
        if window == 0 {
            return None;
        }
        let Some(attrs) = backend.attributes(window) else {
            debug!("Skipping window 0x{:x}: attributes unavailable", window);
            return None;
        };

        let window_type = backend.window_type(window);
        let manage = !attrs.override_redirect && !window_type.is_unmanaged();

        let (cx, cy) = attrs.geometry.center();
        let monitor = monitor_at(monitors, cx, cy);
        let spot = monitors
            .get(monitor)
            .map(|m| m.spot_at(cx, cy))
            .unwrap_or_default();

        let mut client = Self {
            window,
            geometry: attrs.geometry,
            visible: attrs.viewable,
            manage,
            input: false,
            transient: backend.transient_for(window).filter(|&t| t != window),
            leader: backend.client_leader(window),
            window_type,
            state: WmState::default(),
            monitor,
            spot,
            class: None,
        };

        if client.visible {
            client.state = backend.wm_state(window);
            if let Some(hints) = backend.wm_hints(window) {
                client.input = hints.accepts_input();
                if hints.is_urgent() {
                    client.state.flags |= StateFlags::URGENT;
                }
            }
            client.class = backend.class_name(window);
        }

        Some(client)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.flags.contains(StateFlags::FULLSCREEN)
    }

    pub fn is_above(&self) -> bool {
        self.state.flags.contains(StateFlags::ABOVE)
    }

    /// Urgency hint or _NET_WM_STATE_DEMANDS_ATTENTION
    pub fn is_urgent(&self) -> bool {
        self.state
            .flags
            .intersects(StateFlags::URGENT | StateFlags::DEMANDS_ATTENTION)
    }

    pub fn is_dialog(&self) -> bool {
        self.window_type == WindowType::Dialog
    }

    pub fn is_dock(&self) -> bool {
        self.window_type == WindowType::Dock
    }

    /// Case-insensitive WM_CLASS comparison.
    pub fn class_matches(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(class))
    }
}
