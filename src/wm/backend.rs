//! Display-server seam
//!
//! Everything the window manager asks of the X server goes through the
//! [`Backend`] trait. The production implementation is
//! [`X11Display`](crate::wm::display::X11Display); tests drive the core with
//! an in-memory fake.
//!
//! Queries return `Option`: a window that cannot be queried (usually because
//! it vanished mid-request) is simply treated as absent by the caller.

use anyhow::Result;

use crate::shared::Geometry;
use crate::wm::client_flags::{Protocols, WindowType, WmState};
use crate::wm::hints::{SizeHints, Strut, WmHints};

/// Raw attributes of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowAttributes {
    pub geometry: Geometry,
    pub viewable: bool,
    pub override_redirect: bool,
}

/// Where keyboard focus is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Window(u32),
    PointerRoot,
}

/// A ConfigureRequest as received from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureRequest {
    pub window: u32,
    pub value_mask: u16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: u32,
    pub sibling: u32,
    pub stack_mode: u32,
}

/// ClientMessage types the window manager reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageKind {
    Exit,
    Restart,
    ActivateWindow,
    CloseWindow,
    Other(u32),
}

/// Protocol events, already decoded into what the handlers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    CreateNotify(u32),
    ConfigureRequest(ConfigureRequest),
    ConfigureNotify(u32),
    MapRequest(u32),
    MapNotify(u32),
    UnmapNotify(u32),
    /// `modifiers` has CapsLock and NumLock already stripped.
    KeyPress { keysym: u32, modifiers: u16, time: u32 },
    ButtonPress { subwindow: u32, time: u32 },
    ClientMessage { window: u32, kind: ClientMessageKind },
    FocusChange(u32),
    PropertyChange(u32),
    ProtocolError { request: u8, error: u8 },
    Ignored,
}

pub trait Backend {
    // Session
    fn screen_size(&self) -> (i32, i32);
    fn monitors(&self) -> Result<Vec<Geometry>>;
    fn next_event(&self) -> Result<WmEvent>;
    /// Discard key presses already queued, so a held key fires once.
    fn drop_queued_key_presses(&self) -> Result<()>;
    fn flush(&self) -> Result<()>;

    // Queries
    /// Top-level windows, bottom to top.
    fn stacking_order(&self) -> Result<Vec<u32>>;
    fn attributes(&self, window: u32) -> Option<WindowAttributes>;
    fn window_type(&self, window: u32) -> WindowType;
    fn transient_for(&self, window: u32) -> Option<u32>;
    fn client_leader(&self, window: u32) -> Option<u32>;
    fn wm_state(&self, window: u32) -> WmState;
    fn wm_hints(&self, window: u32) -> Option<WmHints>;
    fn size_hints(&self, window: u32) -> Option<SizeHints>;
    fn class_name(&self, window: u32) -> Option<String>;
    fn protocols(&self, window: u32) -> Protocols;
    fn strut(&self, window: u32) -> Option<Strut>;
    fn saved_spot(&self, window: u32) -> Option<u32>;

    // Requests
    fn move_resize(&self, window: u32, geometry: Geometry) -> Result<()>;
    /// Pass a request through unchanged apart from the border width.
    fn configure(&self, request: &ConfigureRequest, border_width: u32) -> Result<()>;
    fn raise(&self, window: u32) -> Result<()>;
    fn lower(&self, window: u32) -> Result<()>;
    /// Stack `windows` as one block: each one directly below its predecessor.
    fn restack(&self, windows: &[u32]) -> Result<()>;
    fn set_input_focus(&self, target: FocusTarget) -> Result<()>;
    fn set_border(&self, window: u32, color: u32, width: u32) -> Result<()>;
    fn send_protocol(&self, window: u32, protocol: Protocols, time: u32) -> Result<()>;
    fn set_active_window(&self, window: u32) -> Result<()>;
    /// Publish both client lists, bottom to top.
    fn set_client_list(&self, windows: &[u32]) -> Result<()>;
    fn set_wm_state(&self, window: u32, state: &WmState) -> Result<()>;
    fn save_spot(&self, window: u32, spot: u32) -> Result<()>;
    fn kill_client(&self, window: u32) -> Result<()>;
    fn map_window(&self, window: u32) -> Result<()>;
    /// Select focus, property and crossing events on a client.
    fn listen(&self, window: u32) -> Result<()>;
    fn replay_pointer(&self) -> Result<()>;
}
