//! Display Module
//!
//! [`X11Display`] is the production [`Backend`]: an x11rb connection plus the
//! interned atoms, the keyboard map used for grabs, and the EWMH check
//! window.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

use crate::shared::Geometry;
use crate::wm::backend::{
    Backend, ClientMessageKind, ConfigureRequest, FocusTarget, WindowAttributes, WmEvent,
};
use crate::wm::client_flags::{Protocols, WindowType, WmState};
use crate::wm::ewmh::Atoms;
use crate::wm::hints::{SizeHints, Strut, WmHints, parse_wm_class};
use crate::wm::keyboard::{ANY_MODIFIER, KeyBinding, LOCK_MASK, XK_NUM_LOCK, clean_modifiers};

/// The PointerRoot focus target
const POINTER_ROOT: Window = 1;

/// Keycode to keysym table, first column only.
#[derive(Debug, Clone, Default)]
pub struct KeyboardMap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl KeyboardMap {
    pub fn new(min_keycode: u8, per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            per_keycode: per_keycode.max(1) as usize,
            keysyms,
        }
    }

    pub fn keysym(&self, keycode: u8) -> u32 {
        let Some(index) = keycode.checked_sub(self.min_keycode) else {
            return 0;
        };
        self.keysyms
            .get(index as usize * self.per_keycode)
            .copied()
            .unwrap_or(0)
    }

    /// Every keycode producing `keysym` unshifted.
    pub fn keycodes(&self, keysym: u32) -> Vec<u8> {
        self.keysyms
            .chunks(self.per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .filter_map(|(i, _)| u8::try_from(i + self.min_keycode as usize).ok())
            .collect()
    }

    /// Modifier bit NumLock is bound to, from a GetModifierMapping reply.
    pub fn numlock_mask(&self, modifier_keycodes: &[u8], per_modifier: usize) -> u16 {
        if per_modifier == 0 {
            return 0;
        }
        modifier_keycodes
            .chunks(per_modifier)
            .take(8)
            .position(|codes| codes.iter().any(|&k| k != 0 && self.keysym(k) == XK_NUM_LOCK))
            .map_or(0, |bit| 1 << bit)
    }
}

/// Modifier sets to grab for one binding so CapsLock and NumLock don't
/// get in the way.
pub fn lock_variants(modifiers: u16, numlock_mask: u16) -> Vec<u16> {
    if modifiers == ANY_MODIFIER {
        return vec![ANY_MODIFIER];
    }
    let mut variants = vec![
        modifiers,
        modifiers | LOCK_MASK,
        modifiers | numlock_mask,
        modifiers | LOCK_MASK | numlock_mask,
    ];
    variants.sort_unstable();
    variants.dedup();
    variants
}

/// Forward a client's ConfigureRequest, overriding only the border width.
pub fn configure_aux(request: &ConfigureRequest, border_width: u32) -> ConfigureWindowAux {
    let has = |bit: ConfigWindow| request.value_mask & u16::from(bit) != 0;
    let mut aux = ConfigureWindowAux::new().border_width(border_width);
    if has(ConfigWindow::X) {
        aux = aux.x(request.x);
    }
    if has(ConfigWindow::Y) {
        aux = aux.y(request.y);
    }
    if has(ConfigWindow::WIDTH) {
        aux = aux.width(request.width.max(1) as u32);
    }
    if has(ConfigWindow::HEIGHT) {
        aux = aux.height(request.height.max(1) as u32);
    }
    if has(ConfigWindow::SIBLING) {
        aux = aux.sibling(request.sibling);
    }
    if has(ConfigWindow::STACK_MODE) {
        aux = aux.stack_mode(StackMode::from(request.stack_mode));
    }
    aux
}

pub struct X11Display {
    conn: RustConnection,
    root: Window,
    screen_size: (i32, i32),
    atoms: Atoms,
    keyboard: KeyboardMap,
    numlock_mask: u16,
    /// Events read ahead while dropping key presses.
    pending: RefCell<VecDeque<Event>>,
}

impl X11Display {
    /// Open the display named by $DISPLAY.
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to X server")?;
        info!("Connected to X server, screen {}", screen_num);

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_size = (screen.width_in_pixels as i32, screen.height_in_pixels as i32);
        debug!("Root window 0x{:x}, {}x{}", root, screen_size.0, screen_size.1);

        let atoms = Atoms::new(&conn).context("Failed to intern atoms")?;

        let (min, max) = (conn.setup().min_keycode, conn.setup().max_keycode);
        let mapping = conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()
            .context("Failed to read keyboard mapping")?;
        let keyboard = KeyboardMap::new(min, mapping.keysyms_per_keycode, mapping.keysyms);

        let modifiers = conn
            .get_modifier_mapping()?
            .reply()
            .context("Failed to read modifier mapping")?;
        let numlock_mask = keyboard.numlock_mask(&modifiers.keycodes, modifiers.keycodes_per_modifier() as usize);
        debug!("NumLock mask: 0x{:x}", numlock_mask);

        Ok(Self {
            conn,
            root,
            screen_size,
            atoms,
            keyboard,
            numlock_mask,
            pending: RefCell::new(VecDeque::new()),
        })
    }

    /// Take the window manager role and publish the EWMH root properties.
    pub fn become_wm(&self) -> Result<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY | EventMask::STRUCTURE_NOTIFY;
        self.conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()
            .context("Another window manager is already running")?;

        let check_window = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            self.root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        self.atoms
            .setup_supporting_wm_check(&self.conn, self.root, check_window, "spotwm")?;
        self.atoms.setup_supported(&self.conn, self.root)?;
        self.conn.flush()?;

        info!("Managing root window 0x{:x}", self.root);
        Ok(())
    }

    /// Grab every bound key on the root window.
    pub fn grab_keys(&self, bindings: &[KeyBinding]) -> Result<()> {
        self.conn.ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        for binding in bindings {
            let keycodes = self.keyboard.keycodes(binding.keysym);
            if keycodes.is_empty() {
                warn!("No keycode for keysym 0x{:x}, binding disabled", binding.keysym);
                continue;
            }
            for keycode in keycodes {
                for modifiers in lock_variants(binding.modifiers, self.numlock_mask) {
                    self.conn.grab_key(
                        true,
                        self.root,
                        ModMask::from(modifiers),
                        keycode,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }
        debug!("Grabbed {} key binding(s)", bindings.len());
        Ok(())
    }

    /// Click-to-focus: freeze the pointer on buttons 1 and 3 until the
    /// click has been handled and replayed.
    pub fn grab_buttons(&self) -> Result<()> {
        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            self.conn.grab_button(
                false,
                self.root,
                EventMask::BUTTON_PRESS,
                GrabMode::SYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                button,
                ModMask::ANY,
            )?;
        }
        Ok(())
    }

    /// Send an exit or restart request to the running instance.
    pub fn send_control(&self, kind: ClientMessageKind) -> Result<()> {
        let message = match kind {
            ClientMessageKind::Exit => self.atoms.spotwm_exit,
            ClientMessageKind::Restart => self.atoms.spotwm_restart,
            other => bail!("{:?} is not a control message", other),
        };
        let event = ClientMessageEvent::new(32, self.root, message, [0u32; 5]);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn property32(&self, window: Window, property: impl Into<Atom>, type_: impl Into<Atom>, length: u32) -> Option<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, length)
            .ok()?
            .reply()
            .ok()?;
        reply.value32().map(|values| values.collect())
    }

    fn first_window(&self, window: Window, property: impl Into<Atom>) -> Option<u32> {
        self.property32(window, property, AtomEnum::WINDOW, 1)?
            .first()
            .copied()
            .filter(|&w| w != 0)
    }

    fn translate(&self, event: Event) -> WmEvent {
        match event {
            Event::CreateNotify(e) => WmEvent::CreateNotify(e.window),
            Event::ConfigureRequest(e) => WmEvent::ConfigureRequest(ConfigureRequest {
                window: e.window,
                value_mask: u16::from(e.value_mask),
                x: e.x as i32,
                y: e.y as i32,
                width: e.width as i32,
                height: e.height as i32,
                border_width: e.border_width as u32,
                sibling: e.sibling,
                stack_mode: u32::from(e.stack_mode),
            }),
            Event::ConfigureNotify(e) => WmEvent::ConfigureNotify(e.window),
            Event::MapRequest(e) => WmEvent::MapRequest(e.window),
            Event::MapNotify(e) => WmEvent::MapNotify(e.window),
            Event::UnmapNotify(e) => WmEvent::UnmapNotify(e.window),
            Event::KeyPress(e) => WmEvent::KeyPress {
                keysym: self.keyboard.keysym(e.detail),
                modifiers: clean_modifiers(u16::from(e.state), self.numlock_mask),
                time: e.time,
            },
            Event::ButtonPress(e) => WmEvent::ButtonPress {
                subwindow: e.child,
                time: e.time,
            },
            Event::ClientMessage(e) => {
                let kind = match e.type_ {
                    t if t == self.atoms.spotwm_exit => ClientMessageKind::Exit,
                    t if t == self.atoms.spotwm_restart => ClientMessageKind::Restart,
                    t if t == self.atoms.net_active_window => ClientMessageKind::ActivateWindow,
                    t if t == self.atoms.net_close_window => ClientMessageKind::CloseWindow,
                    t => ClientMessageKind::Other(t),
                };
                WmEvent::ClientMessage {
                    window: e.window,
                    kind,
                }
            }
            Event::FocusIn(e) | Event::FocusOut(e) => WmEvent::FocusChange(e.event),
            Event::PropertyNotify(e) => WmEvent::PropertyChange(e.window),
            Event::Error(e) => WmEvent::ProtocolError {
                request: e.major_opcode,
                error: e.error_code,
            },
            _ => WmEvent::Ignored,
        }
    }
}

impl Backend for X11Display {
    fn screen_size(&self) -> (i32, i32) {
        self.screen_size
    }

    fn monitors(&self) -> Result<Vec<Geometry>> {
        let reply = self
            .conn
            .randr_get_monitors(self.root, true)?
            .reply()
            .context("RandR GetMonitors failed")?;
        Ok(reply
            .monitors
            .iter()
            .map(|m| Geometry::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
            .collect())
    }

    fn next_event(&self) -> Result<WmEvent> {
        let queued = self.pending.borrow_mut().pop_front();
        let event = match queued {
            Some(event) => event,
            None => self.conn.wait_for_event()?,
        };
        Ok(self.translate(event))
    }

    fn drop_queued_key_presses(&self) -> Result<()> {
        let mut pending = self.pending.borrow_mut();
        pending.retain(|e| !matches!(e, Event::KeyPress(_)));
        while let Some(event) = self.conn.poll_for_event()? {
            if !matches!(event, Event::KeyPress(_)) {
                pending.push_back(event);
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn stacking_order(&self) -> Result<Vec<u32>> {
        Ok(self.conn.query_tree(self.root)?.reply()?.children)
    }

    fn attributes(&self, window: u32) -> Option<WindowAttributes> {
        let attrs = self.conn.get_window_attributes(window).ok()?;
        let geometry = self.conn.get_geometry(window).ok()?;
        let attrs = attrs.reply().ok()?;
        let geometry = geometry.reply().ok()?;
        Some(WindowAttributes {
            geometry: Geometry::new(
                geometry.x as i32,
                geometry.y as i32,
                geometry.width as i32,
                geometry.height as i32,
            ),
            viewable: attrs.map_state == MapState::VIEWABLE,
            override_redirect: attrs.override_redirect,
        })
    }

    fn window_type(&self, window: u32) -> WindowType {
        let types = self
            .property32(window, self.atoms.net_wm_window_type, AtomEnum::ATOM, 32)
            .unwrap_or_default();
        WindowType::from_atoms(&types, &self.atoms)
    }

    fn transient_for(&self, window: u32) -> Option<u32> {
        self.first_window(window, AtomEnum::WM_TRANSIENT_FOR)
    }

    fn client_leader(&self, window: u32) -> Option<u32> {
        self.first_window(window, self.atoms.wm_client_leader)
            .or_else(|| self.wm_hints(window)?.window_group)
    }

    fn wm_state(&self, window: u32) -> WmState {
        let atoms = self
            .property32(window, self.atoms.net_wm_state, AtomEnum::ATOM, 64)
            .unwrap_or_default();
        self.atoms.decode_state(&atoms)
    }

    fn wm_hints(&self, window: u32) -> Option<WmHints> {
        let values = self.property32(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, 9)?;
        WmHints::from_values(&values)
    }

    fn size_hints(&self, window: u32) -> Option<SizeHints> {
        let values = self.property32(window, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS, 18)?;
        SizeHints::from_values(&values)
    }

    fn class_name(&self, window: u32) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 256)
            .ok()?
            .reply()
            .ok()?;
        parse_wm_class(&reply.value)
    }

    fn protocols(&self, window: u32) -> Protocols {
        let mut protocols = Protocols::empty();
        for atom in self
            .property32(window, self.atoms.wm_protocols, AtomEnum::ATOM, 32)
            .unwrap_or_default()
        {
            if atom == self.atoms.wm_delete_window {
                protocols |= Protocols::DELETE;
            } else if atom == self.atoms.wm_take_focus {
                protocols |= Protocols::TAKE_FOCUS;
            }
        }
        protocols
    }

    fn strut(&self, window: u32) -> Option<Strut> {
        self.property32(window, self.atoms.net_wm_strut_partial, AtomEnum::CARDINAL, 12)
            .and_then(|values| Strut::from_partial(&values))
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.property32(window, self.atoms.net_wm_strut, AtomEnum::CARDINAL, 4)
                    .and_then(|values| Strut::from_legacy(&values))
            })
            .filter(|s| !s.is_empty())
    }

    fn saved_spot(&self, window: u32) -> Option<u32> {
        self.property32(window, self.atoms.spotwm_spot, AtomEnum::CARDINAL, 1)?
            .first()
            .copied()
    }

    fn move_resize(&self, window: u32, geometry: Geometry) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width.max(1) as u32)
            .height(geometry.height.max(1) as u32);
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn configure(&self, request: &ConfigureRequest, border_width: u32) -> Result<()> {
        self.conn
            .configure_window(request.window, &configure_aux(request, border_width))?;
        Ok(())
    }

    fn raise(&self, window: u32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn lower(&self, window: u32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::BELOW))?;
        Ok(())
    }

    fn restack(&self, windows: &[u32]) -> Result<()> {
        for pair in windows.windows(2) {
            let aux = ConfigureWindowAux::new()
                .sibling(pair[0])
                .stack_mode(StackMode::BELOW);
            self.conn.configure_window(pair[1], &aux)?;
        }
        Ok(())
    }

    fn set_input_focus(&self, target: FocusTarget) -> Result<()> {
        let window = match target {
            FocusTarget::Window(window) => window,
            FocusTarget::PointerRoot => POINTER_ROOT,
        };
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn set_border(&self, window: u32, color: u32, width: u32) -> Result<()> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(color))?;
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn send_protocol(&self, window: u32, protocol: Protocols, time: u32) -> Result<()> {
        let atom = if protocol.contains(Protocols::DELETE) {
            self.atoms.wm_delete_window
        } else {
            self.atoms.wm_take_focus
        };
        let event = ClientMessageEvent::new(32, window, self.atoms.wm_protocols, [atom, time, 0, 0, 0]);
        self.conn.send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn set_active_window(&self, window: u32) -> Result<()> {
        self.atoms.update_active_window(&self.conn, self.root, window)
    }

    fn set_client_list(&self, windows: &[u32]) -> Result<()> {
        self.atoms.update_client_list(&self.conn, self.root, windows)
    }

    fn set_wm_state(&self, window: u32, state: &WmState) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_state,
            AtomEnum::ATOM,
            &self.atoms.encode_state(state),
        )?;
        Ok(())
    }

    fn save_spot(&self, window: u32, spot: u32) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.spotwm_spot,
            AtomEnum::CARDINAL,
            &[spot],
        )?;
        Ok(())
    }

    fn kill_client(&self, window: u32) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn map_window(&self, window: u32) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn listen(&self, window: u32) -> Result<()> {
        let mask = EventMask::ENTER_WINDOW | EventMask::LEAVE_WINDOW | EventMask::FOCUS_CHANGE | EventMask::PROPERTY_CHANGE;
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn replay_pointer(&self) -> Result<()> {
        self.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::keyboard::{MOD2_MASK, MOD4_MASK, SHIFT_MASK};

    const XK_A: u32 = 0x61;
    const XK_SHIFT_L: u32 = 0xffe1;

    /// Keycodes 8..=11 with two columns each.
    fn keyboard() -> KeyboardMap {
        KeyboardMap::new(
            8,
            2,
            vec![XK_SHIFT_L, 0, XK_A, 0x41, XK_NUM_LOCK, 0, XK_A, 0x41],
        )
    }

    #[test]
    fn test_keysym_lookup_uses_first_column() {
        let map = keyboard();
        assert_eq!(map.keysym(9), XK_A);
        assert_eq!(map.keysym(7), 0);
        assert_eq!(map.keysym(200), 0);
        assert_eq!(map.keycodes(XK_A), vec![9, 11]);
        assert!(map.keycodes(0x41).is_empty());
    }

    #[test]
    fn test_numlock_mask_from_modifier_map() {
        let map = keyboard();
        // shift: keycode 8, lock: none, control: none, mod1: none, mod2: keycode 10
        let modifier_map = [8, 0, 0, 0, 0, 0, 0, 0, 10, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(map.numlock_mask(&modifier_map, 2), MOD2_MASK);
        assert_eq!(map.numlock_mask(&modifier_map[..8], 2), 0);
        assert_eq!(map.numlock_mask(&[], 0), 0);
    }

    #[test]
    fn test_lock_variants() {
        assert_eq!(
            lock_variants(MOD4_MASK, MOD2_MASK),
            vec![MOD4_MASK, MOD4_MASK | LOCK_MASK, MOD4_MASK | MOD2_MASK, MOD4_MASK | LOCK_MASK | MOD2_MASK]
        );
        // no NumLock on this keyboard
        assert_eq!(lock_variants(SHIFT_MASK, 0), vec![SHIFT_MASK, SHIFT_MASK | LOCK_MASK]);
        assert_eq!(lock_variants(ANY_MODIFIER, MOD2_MASK), vec![ANY_MODIFIER]);
    }

    #[test]
    fn test_configure_aux_forwards_requested_fields_only() {
        let request = ConfigureRequest {
            window: 1,
            value_mask: u16::from(ConfigWindow::X | ConfigWindow::HEIGHT),
            x: 40,
            y: 50,
            width: 60,
            height: 70,
            border_width: 9,
            ..ConfigureRequest::default()
        };
        let aux = configure_aux(&request, 2);
        assert_eq!(aux.x, Some(40));
        assert_eq!(aux.y, None);
        assert_eq!(aux.width, None);
        assert_eq!(aux.height, Some(70));
        assert_eq!(aux.border_width, Some(2));
        assert_eq!(aux.stack_mode, None);
    }

    #[test]
    fn test_configure_aux_forwards_stacking() {
        let request = ConfigureRequest {
            window: 1,
            value_mask: u16::from(ConfigWindow::SIBLING | ConfigWindow::STACK_MODE),
            sibling: 7,
            stack_mode: u32::from(StackMode::BELOW),
            ..ConfigureRequest::default()
        };
        let aux = configure_aux(&request, 2);
        assert_eq!(aux.sibling, Some(7));
        assert_eq!(aux.stack_mode, Some(StackMode::BELOW));
        assert_eq!(aux.x, None);
    }
}
