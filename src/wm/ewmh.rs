//! EWMH (Extended Window Manager Hints) support
//!
//! Interned atoms plus the root-window properties spotwm publishes so that
//! panels, pagers and launchers can follow what is focused.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

use crate::wm::client_flags::{StateFlags, WmState};

/// Private message asking the running instance to exit.
pub const EXIT_ATOM: &str = "SPOTWM_EXIT";
/// Private message asking the running instance to re-exec itself.
pub const RESTART_ATOM: &str = "SPOTWM_RESTART";
/// Per-window cardinal remembering the spot a window left for fullscreen.
pub const SPOT_ATOM: &str = "SPOTWM_SPOT";

/// Holds all interned atoms
#[derive(Debug, Clone)]
pub struct Atoms {
    pub spotwm_spot: Atom,
    pub spotwm_exit: Atom,
    pub spotwm_restart: Atom,
    pub net_supported: Atom,
    pub net_active_window: Atom,
    pub net_close_window: Atom,
    pub net_client_list: Atom,
    pub net_client_list_stacking: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_wm_name: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_strut: Atom,
    pub net_wm_strut_partial: Atom,
    pub net_wm_window_type: Atom,
    pub _net_wm_window_type_normal: Atom,
    pub _net_wm_window_type_desktop: Atom,
    pub _net_wm_window_type_dock: Atom,
    pub _net_wm_window_type_splash: Atom,
    pub _net_wm_window_type_notification: Atom,
    pub _net_wm_window_type_dialog: Atom,
    pub net_wm_state: Atom,
    pub _net_wm_state_fullscreen: Atom,
    pub _net_wm_state_above: Atom,
    pub _net_wm_state_demands_attention: Atom,
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_take_focus: Atom,
    pub wm_client_leader: Atom,
    pub utf8_string: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        // Send every request before waiting on the first reply
        let names = [
            SPOT_ATOM,
            EXIT_ATOM,
            RESTART_ATOM,
            "_NET_SUPPORTED",
            "_NET_ACTIVE_WINDOW",
            "_NET_CLOSE_WINDOW",
            "_NET_CLIENT_LIST",
            "_NET_CLIENT_LIST_STACKING",
            "_NET_SUPPORTING_WM_CHECK",
            "_NET_WM_NAME",
            "_NET_WM_PID",
            "_NET_WM_STRUT",
            "_NET_WM_STRUT_PARTIAL",
            "_NET_WM_WINDOW_TYPE",
            "_NET_WM_WINDOW_TYPE_DESKTOP",
            "_NET_WM_WINDOW_TYPE_DOCK",
            "_NET_WM_WINDOW_TYPE_SPLASH",
            "_NET_WM_WINDOW_TYPE_NOTIFICATION",
            "_NET_WM_WINDOW_TYPE_DIALOG",
            "_NET_WM_STATE",
            "_NET_WM_STATE_FULLSCREEN",
            "_NET_WM_STATE_ABOVE",
            "_NET_WM_STATE_DEMANDS_ATTENTION",
            "WM_PROTOCOLS",
            "WM_DELETE_WINDOW",
            "WM_TAKE_FOCUS",
            "WM_CLIENT_LEADER",
            "UTF8_STRING",
            "_NET_WM_WINDOW_TYPE_NORMAL",
        ];
        let cookies = names
            .iter()
            .map(|name| conn.intern_atom(false, name.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut atoms = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            atoms.push(cookie.reply()?.atom);
        }
        let a = |i: usize| atoms[i];

        Ok(Self {
            spotwm_spot: a(0),
            spotwm_exit: a(1),
            spotwm_restart: a(2),
            net_supported: a(3),
            net_active_window: a(4),
            net_close_window: a(5),
            net_client_list: a(6),
            net_client_list_stacking: a(7),
            net_supporting_wm_check: a(8),
            net_wm_name: a(9),
            net_wm_pid: a(10),
            net_wm_strut: a(11),
            net_wm_strut_partial: a(12),
            net_wm_window_type: a(13),
            _net_wm_window_type_desktop: a(14),
            _net_wm_window_type_dock: a(15),
            _net_wm_window_type_splash: a(16),
            _net_wm_window_type_notification: a(17),
            _net_wm_window_type_dialog: a(18),
            net_wm_state: a(19),
            _net_wm_state_fullscreen: a(20),
            _net_wm_state_above: a(21),
            _net_wm_state_demands_attention: a(22),
            wm_protocols: a(23),
            wm_delete_window: a(24),
            wm_take_focus: a(25),
            wm_client_leader: a(26),
            utf8_string: a(27),
            _net_wm_window_type_normal: a(28),
        })
    }

    /// Set up _NET_SUPPORTED on root window
    pub fn setup_supported<C: Connection>(&self, conn: &C, root: Window) -> Result<()> {
        let supported = [
            self.net_supported,
            self.net_active_window,
            self.net_close_window,
            self.net_client_list,
            self.net_client_list_stacking,
            self.net_supporting_wm_check,
            self.net_wm_name,
            self.net_wm_pid,
            self.net_wm_strut,
            self.net_wm_strut_partial,
            self.net_wm_window_type,
            self._net_wm_window_type_normal,
            self._net_wm_window_type_desktop,
            self._net_wm_window_type_dock,
            self._net_wm_window_type_splash,
            self._net_wm_window_type_notification,
            self._net_wm_window_type_dialog,
            self.net_wm_state,
            self._net_wm_state_fullscreen,
            self._net_wm_state_above,
            self._net_wm_state_demands_attention,
        ];

        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_supported,
            AtomEnum::ATOM,
            &supported,
        )?;

        Ok(())
    }

    /// Point _NET_SUPPORTING_WM_CHECK at `check_window` and label it.
    pub fn setup_supporting_wm_check<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        check_window: Window,
        wm_name: &str,
    ) -> Result<()> {
        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_supporting_wm_check,
            AtomEnum::WINDOW,
            &[check_window],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            check_window,
            self.net_supporting_wm_check,
            AtomEnum::WINDOW,
            &[check_window],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            check_window,
            self.net_wm_pid,
            AtomEnum::CARDINAL,
            &[std::process::id()],
        )?;
        conn.change_property8(
            PropMode::REPLACE,
            check_window,
            self.net_wm_name,
            self.utf8_string,
            wm_name.as_bytes(),
        )?;
        Ok(())
    }

    /// Update _NET_ACTIVE_WINDOW
    pub fn update_active_window<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        window: Window,
    ) -> Result<()> {
        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_active_window,
            AtomEnum::WINDOW,
            &[window],
        )?;
        Ok(())
    }

    /// Update _NET_CLIENT_LIST and _NET_CLIENT_LIST_STACKING (bottom to top).
    ///
    /// Mapping history isn't tracked, so both lists carry stacking order.
    pub fn update_client_list<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        windows: &[u32],
    ) -> Result<()> {
        for property in [self.net_client_list_stacking, self.net_client_list] {
            conn.change_property32(PropMode::REPLACE, root, property, AtomEnum::WINDOW, windows)?;
        }
        Ok(())
    }

    /// Decode a _NET_WM_STATE atom list.
    pub fn decode_state(&self, atoms: &[Atom]) -> WmState {
        let mut state = WmState::default();
        for &atom in atoms {
            match self.state_flag(atom) {
                Some(flag) => state.flags |= flag,
                None => state.other.push(atom),
            }
        }
        state
    }

    /// Encode a state back into the atom list written to _NET_WM_STATE.
    pub fn encode_state(&self, state: &WmState) -> Vec<Atom> {
        let mut atoms = state.other.clone();
        for (flag, atom) in self.state_atoms() {
            if state.flags.contains(flag) {
                atoms.push(atom);
            }
        }
        atoms
    }

    fn state_atoms(&self) -> [(StateFlags, Atom); 3] {
        [
            (StateFlags::FULLSCREEN, self._net_wm_state_fullscreen),
            (StateFlags::ABOVE, self._net_wm_state_above),
            (StateFlags::DEMANDS_ATTENTION, self._net_wm_state_demands_attention),
        ]
    }

    fn state_flag(&self, atom: Atom) -> Option<StateFlags> {
        self.state_atoms()
            .into_iter()
            .find(|&(_, a)| a == atom)
            .map(|(flag, _)| flag)
    }
}
