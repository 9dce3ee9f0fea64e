//! Stacking Module
//!
//! Z-order is always applied one family at a time: a window plus its
//! transient descendants move as a block, panels stay on top, and a
//! fullscreen window lets "above" windows over it.

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};

use crate::wm::WindowManager;
use crate::wm::backend::Backend;
use crate::wm::client::Client;

/// Longest transient chain followed before giving up
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("transient chain through 0x{0:x} loops back on itself")]
    Cycle(u32),
    #[error("transient chain deeper than {MAX_DEPTH} windows")]
    TooDeep,
}

/// Push `window`'s descendants (deepest first) and then `window` onto
/// `order`. `order` runs top to bottom.
fn push_family(
    clients: &[Client],
    window: u32,
    path: &mut Vec<u32>,
    order: &mut Vec<u32>,
) -> Result<(), StackError> {
    if path.contains(&window) {
        return Err(StackError::Cycle(window));
    }
    if path.len() >= MAX_DEPTH {
        return Err(StackError::TooDeep);
    }

    path.push(window);
    for child in clients
        .iter()
        .filter(|c| c.manage && c.visible && c.transient == Some(window))
    {
        push_family(clients, child.window, path, order)?;
    }
    path.pop();

    order.push(window);
    Ok(())
}

/// Topmost transient ancestor of `client` that is still visible.
fn root_ancestor(clients: &[Client], client: &Client) -> Result<u32, StackError> {
    let mut seen = vec![client.window];
    let mut root = client.window;
    let mut next = client.transient;

    while let Some(parent) = next {
        let Some(p) = clients.iter().find(|c| c.window == parent) else {
            break;
        };
        if seen.contains(&parent) {
            return Err(StackError::Cycle(parent));
        }
        if seen.len() >= MAX_DEPTH {
            return Err(StackError::TooDeep);
        }
        seen.push(parent);
        root = parent;
        next = p.transient;
    }
    Ok(root)
}

/// `client`'s whole family, top to bottom.
pub fn family_order(clients: &[Client], client: &Client) -> Result<Vec<u32>, StackError> {
    let mut order = Vec::new();
    let root = root_ancestor(clients, client)?;
    push_family(clients, root, &mut Vec::new(), &mut order)?;
    Ok(order)
}

/// Full restack order for raising `client`, top to bottom: panels, then
/// "above" windows when `client` is fullscreen, then `client`'s family.
pub fn stacking_order(clients: &[Client], client: &Client) -> Result<Vec<u32>, StackError> {
    let mut order = Vec::new();

    for dock in clients.iter().filter(|c| c.is_dock()) {
        push_family(clients, dock.window, &mut Vec::new(), &mut order)?;
    }

    if client.is_fullscreen() {
        for above in clients
            .iter()
            .filter(|c| c.manage && c.is_above() && c.window != client.window)
        {
            push_family(clients, above.window, &mut Vec::new(), &mut order)?;
        }
    }

    order.extend(family_order(clients, client)?);

    let mut seen = Vec::with_capacity(order.len());
    order.retain(|w| {
        let first = !seen.contains(w);
        seen.push(*w);
        first
    });
    Ok(order)
}

impl<B: Backend> WindowManager<B> {
    /// Bring `client`'s family to the top, under the panels.
    pub fn raise_family(&mut self, client: &Client) -> Result<()> {
        let clients = self.clients();
        let order = match stacking_order(&clients, client) {
            Ok(order) => order,
            Err(e) => {
                warn!("Not restacking 0x{:x}: {}", client.window, e);
                return Ok(());
            }
        };
        let Some(&top) = order.first() else {
            return Ok(());
        };

        debug!("Raising 0x{:x}: {:x?}", client.window, order);
        self.backend.raise(top)?;
        self.backend.restack(&order)?;
        // cached order is stale now
        self.cache.release();
        Ok(())
    }

    /// Send `client`'s family to the bottom of the stack.
    pub fn lower_family(&mut self, client: &Client) -> Result<()> {
        let clients = self.clients();
        let order = match family_order(&clients, client) {
            Ok(order) => order,
            Err(e) => {
                warn!("Not lowering 0x{:x}: {}", client.window, e);
                return Ok(());
            }
        };
        let Some(&top) = order.first() else {
            return Ok(());
        };

        debug!("Lowering 0x{:x}: {:x?}", client.window, order);
        self.backend.lower(top)?;
        self.backend.restack(&order)?;
        self.cache.release();
        Ok(())
    }
}
