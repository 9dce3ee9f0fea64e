//! Client Flags
//!
//! Window classification and state flag sets derived from EWMH/ICCCM
//! properties.

use bitflags::bitflags;

bitflags! {
    /// Window state flags relevant to placement, stacking and border color
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateFlags: u8 {
        const FULLSCREEN        = 1 << 0;
        const ABOVE             = 1 << 1;
        const DEMANDS_ATTENTION = 1 << 2;
        /// ICCCM urgency hint (WM_HINTS), not part of _NET_WM_STATE
        const URGENT            = 1 << 3;
    }
}

bitflags! {
    /// WM_PROTOCOLS a client participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Protocols: u8 {
        const DELETE     = 1 << 0;
        const TAKE_FOCUS = 1 << 1;
    }
}

/// Contents of a window's _NET_WM_STATE property.
///
/// States we don't interpret are kept as raw atoms so that toggling one
/// flag writes the others back untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmState {
    pub flags: StateFlags,
    pub other: Vec<u32>,
}

impl WmState {
    /// Toggle a single state flag, returning whether it is now set.
    pub fn toggle(&mut self, flag: StateFlags) -> bool {
        self.flags.toggle(flag);
        self.flags.contains(flag)
    }
}

/// Window type (EWMH _NET_WM_WINDOW_TYPE, first recognized entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
    Dialog,
    Splash,
    Notification,
}

impl WindowType {
    /// Classify a _NET_WM_WINDOW_TYPE list. Entries are in order of
    /// preference, so the first one we know wins.
    pub fn from_atoms(types: &[u32], atoms: &crate::wm::ewmh::Atoms) -> Self {
        types
            .iter()
            .find_map(|&atom| Self::from_atom(atom, atoms))
            .unwrap_or_default()
    }

    fn from_atom(atom: u32, atoms: &crate::wm::ewmh::Atoms) -> Option<Self> {
        let kind = if atom == atoms._net_wm_window_type_normal {
            Self::Normal
        } else if atom == atoms._net_wm_window_type_desktop {
            Self::Desktop
        } else if atom == atoms._net_wm_window_type_dock {
            Self::Dock
        } else if atom == atoms._net_wm_window_type_dialog {
            Self::Dialog
        } else if atom == atoms._net_wm_window_type_splash {
            Self::Splash
        } else if atom == atoms._net_wm_window_type_notification {
            Self::Notification
        } else {
            return None;
        };
        Some(kind)
    }

    /// Types that are never placed, focused or bordered.
    pub fn is_unmanaged(self) -> bool {
        matches!(
            self,
            Self::Desktop | Self::Notification | Self::Dock | Self::Splash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_keeps_unrelated_states() {
        let mut state = WmState {
            flags: StateFlags::ABOVE,
            other: vec![991, 992],
        };
        assert!(state.toggle(StateFlags::FULLSCREEN));
        assert_eq!(state.flags, StateFlags::ABOVE | StateFlags::FULLSCREEN);
        assert!(!state.toggle(StateFlags::ABOVE));
        assert_eq!(state.flags, StateFlags::FULLSCREEN);
        assert_eq!(state.other, vec![991, 992]);
    }

    #[test]
    fn test_unmanaged_types() {
        assert!(WindowType::Dock.is_unmanaged());
        assert!(WindowType::Splash.is_unmanaged());
        assert!(!WindowType::Dialog.is_unmanaged());
        assert!(!WindowType::Normal.is_unmanaged());
    }
}
