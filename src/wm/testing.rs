//! In-memory display server for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::{Result, bail};

use crate::shared::Geometry;
use crate::wm::backend::{Backend, ConfigureRequest, FocusTarget, WindowAttributes, WmEvent};
use crate::wm::client_flags::{Protocols, WindowType, WmState};
use crate::wm::hints::{SizeHints, Strut, WmHints};

#[derive(Debug, Clone, Default)]
pub struct FakeWindow {
    pub geometry: Geometry,
    pub viewable: bool,
    pub override_redirect: bool,
    pub window_type: WindowType,
    pub transient_for: Option<u32>,
    pub leader: Option<u32>,
    pub state: WmState,
    pub hints: Option<WmHints>,
    pub size_hints: Option<SizeHints>,
    pub class: Option<String>,
    pub protocols: Protocols,
    pub strut: Option<Strut>,
    pub saved_spot: Option<u32>,
    pub border: Option<(u32, u32)>,
}

impl FakeWindow {
    pub fn normal(geometry: Geometry) -> Self {
        Self {
            geometry,
            viewable: true,
            ..Self::default()
        }
    }

    pub fn dock(geometry: Geometry) -> Self {
        Self {
            window_type: WindowType::Dock,
            ..Self::normal(geometry)
        }
    }

    pub fn dialog(geometry: Geometry) -> Self {
        Self {
            window_type: WindowType::Dialog,
            ..Self::normal(geometry)
        }
    }

    pub fn transient(geometry: Geometry, parent: u32) -> Self {
        Self {
            transient_for: Some(parent),
            ..Self::normal(geometry)
        }
    }
}

/// Requests recorded in the order they were issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    MoveResize(u32, Geometry),
    Configure(u32, u32),
    Raise(u32),
    Lower(u32),
    Restack(Vec<u32>),
    Focus(FocusTarget),
    Protocol(u32, Protocols),
    Kill(u32),
    Map(u32),
    Listen(u32),
    ReplayPointer,
}

pub struct FakeBackend {
    pub screen: (i32, i32),
    pub outputs: Vec<Geometry>,
    pub windows: RefCell<HashMap<u32, FakeWindow>>,
    /// Bottom to top
    pub stack: RefCell<Vec<u32>>,
    pub events: RefCell<VecDeque<WmEvent>>,
    pub ops: RefCell<Vec<Op>>,
    pub focus: RefCell<Option<FocusTarget>>,
    pub active: RefCell<Option<u32>>,
    pub client_list: RefCell<Vec<u32>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::with_outputs((1920, 1080), vec![Geometry::new(0, 0, 1920, 1080)])
    }

    pub fn with_outputs(screen: (i32, i32), outputs: Vec<Geometry>) -> Self {
        Self {
            screen,
            outputs,
            windows: RefCell::new(HashMap::new()),
            stack: RefCell::new(Vec::new()),
            events: RefCell::new(VecDeque::new()),
            ops: RefCell::new(Vec::new()),
            focus: RefCell::new(None),
            active: RefCell::new(None),
            client_list: RefCell::new(Vec::new()),
        }
    }

    /// Add a window on top of the stack.
    pub fn add(&self, id: u32, window: FakeWindow) {
        self.windows.borrow_mut().insert(id, window);
        self.stack.borrow_mut().push(id);
    }

    pub fn remove(&self, id: u32) {
        self.windows.borrow_mut().remove(&id);
        self.stack.borrow_mut().retain(|&w| w != id);
    }

    pub fn set_viewable(&self, id: u32, viewable: bool) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&id) {
            w.viewable = viewable;
        }
    }

    pub fn push_event(&self, event: WmEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn window(&self, id: u32) -> FakeWindow {
        self.windows.borrow().get(&id).cloned().unwrap_or_default()
    }

    pub fn geometry(&self, id: u32) -> Geometry {
        self.window(id).geometry
    }

    /// Top to bottom, like the cache sees it.
    pub fn top_down(&self) -> Vec<u32> {
        self.stack.borrow().iter().rev().copied().collect()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    fn record(&self, op: Op) {
        self.ops.borrow_mut().push(op);
    }

    fn with_window(&self, id: u32, f: impl FnOnce(&mut FakeWindow)) -> Result<()> {
        match self.windows.borrow_mut().get_mut(&id) {
            Some(w) => {
                f(w);
                Ok(())
            }
            None => bail!("BadWindow 0x{:x}", id),
        }
    }
}

impl Backend for FakeBackend {
    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn monitors(&self) -> Result<Vec<Geometry>> {
        Ok(self.outputs.clone())
    }

    fn next_event(&self) -> Result<WmEvent> {
        match self.events.borrow_mut().pop_front() {
            Some(event) => Ok(event),
            None => bail!("connection closed"),
        }
    }

    fn drop_queued_key_presses(&self) -> Result<()> {
        self.events
            .borrow_mut()
            .retain(|e| !matches!(e, WmEvent::KeyPress { .. }));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn stacking_order(&self) -> Result<Vec<u32>> {
        Ok(self.stack.borrow().clone())
    }

    fn attributes(&self, window: u32) -> Option<WindowAttributes> {
        self.windows.borrow().get(&window).map(|w| WindowAttributes {
            geometry: w.geometry,
            viewable: w.viewable,
            override_redirect: w.override_redirect,
        })
    }

    fn window_type(&self, window: u32) -> WindowType {
        self.window(window).window_type
    }

    fn transient_for(&self, window: u32) -> Option<u32> {
        self.window(window).transient_for
    }

    fn client_leader(&self, window: u32) -> Option<u32> {
        self.window(window).leader
    }

    fn wm_state(&self, window: u32) -> WmState {
        self.window(window).state
    }

    fn wm_hints(&self, window: u32) -> Option<WmHints> {
        self.window(window).hints
    }

    fn size_hints(&self, window: u32) -> Option<SizeHints> {
        self.window(window).size_hints
    }

    fn class_name(&self, window: u32) -> Option<String> {
        self.window(window).class
    }

    fn protocols(&self, window: u32) -> Protocols {
        self.window(window).protocols
    }

    fn strut(&self, window: u32) -> Option<Strut> {
        self.window(window).strut
    }

    fn saved_spot(&self, window: u32) -> Option<u32> {
        self.window(window).saved_spot
    }

    fn move_resize(&self, window: u32, geometry: Geometry) -> Result<()> {
        self.record(Op::MoveResize(window, geometry));
        self.with_window(window, |w| w.geometry = geometry)
    }

    fn configure(&self, request: &ConfigureRequest, border_width: u32) -> Result<()> {
        self.record(Op::Configure(request.window, border_width));
        Ok(())
    }

    fn raise(&self, window: u32) -> Result<()> {
        self.record(Op::Raise(window));
        let mut stack = self.stack.borrow_mut();
        stack.retain(|&w| w != window);
        stack.push(window);
        Ok(())
    }

    fn lower(&self, window: u32) -> Result<()> {
        self.record(Op::Lower(window));
        let mut stack = self.stack.borrow_mut();
        stack.retain(|&w| w != window);
        stack.insert(0, window);
        Ok(())
    }

    fn restack(&self, windows: &[u32]) -> Result<()> {
        self.record(Op::Restack(windows.to_vec()));
        let mut stack = self.stack.borrow_mut();
        for pair in windows.windows(2) {
            let (above, below) = (pair[0], pair[1]);
            stack.retain(|&w| w != below);
            if let Some(pos) = stack.iter().position(|&w| w == above) {
                stack.insert(pos, below);
            }
        }
        Ok(())
    }

    fn set_input_focus(&self, target: FocusTarget) -> Result<()> {
        self.record(Op::Focus(target));
        *self.focus.borrow_mut() = Some(target);
        Ok(())
    }

    fn set_border(&self, window: u32, color: u32, width: u32) -> Result<()> {
        self.with_window(window, |w| w.border = Some((color, width)))
    }

    fn send_protocol(&self, window: u32, protocol: Protocols, _time: u32) -> Result<()> {
        self.record(Op::Protocol(window, protocol));
        Ok(())
    }

    fn set_active_window(&self, window: u32) -> Result<()> {
        *self.active.borrow_mut() = Some(window);
        Ok(())
    }

    fn set_client_list(&self, windows: &[u32]) -> Result<()> {
        *self.client_list.borrow_mut() = windows.to_vec();
        Ok(())
    }

    fn set_wm_state(&self, window: u32, state: &WmState) -> Result<()> {
        self.with_window(window, |w| w.state = state.clone())
    }

    fn save_spot(&self, window: u32, spot: u32) -> Result<()> {
        self.with_window(window, |w| w.saved_spot = Some(spot))
    }

    fn kill_client(&self, window: u32) -> Result<()> {
        self.record(Op::Kill(window));
        Ok(())
    }

    fn map_window(&self, window: u32) -> Result<()> {
        self.record(Op::Map(window));
        self.with_window(window, |w| w.viewable = true)
    }

    fn listen(&self, window: u32) -> Result<()> {
        self.record(Op::Listen(window));
        Ok(())
    }

    fn replay_pointer(&self) -> Result<()> {
        self.record(Op::ReplayPointer);
        Ok(())
    }
}
