//! Protocol error triage
//!
//! Requests routinely race against clients that unmap or destroy their
//! windows. Those errors are expected and dropped; anything else is logged.

use tracing::{debug, error};

// Core protocol error codes
const BAD_WINDOW: u8 = 3;
const BAD_MATCH: u8 = 8;
const BAD_ACCESS: u8 = 10;

// Core protocol request opcodes
const CONFIGURE_WINDOW: u8 = 12;
const GRAB_BUTTON: u8 = 28;
const GRAB_KEY: u8 = 33;
const SET_INPUT_FOCUS: u8 = 42;

/// True when the error is an expected race and should be ignored.
pub fn is_benign(request: u8, error: u8) -> bool {
    error == BAD_WINDOW
        || (request == SET_INPUT_FOCUS && error == BAD_MATCH)
        || (request == CONFIGURE_WINDOW && error == BAD_MATCH)
        || (request == GRAB_BUTTON && error == BAD_ACCESS)
        || (request == GRAB_KEY && error == BAD_ACCESS)
}

pub fn report(request: u8, error: u8) {
    if is_benign(request, error) {
        debug!("Ignoring protocol error: request={}, error={}", request, error);
    } else {
        error!("Protocol error: request code={}, error code={}", request, error);
    }
}
