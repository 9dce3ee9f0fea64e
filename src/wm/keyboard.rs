//! Keyboard Module
//!
//! Key bindings: resolving the configured names into keysyms, modifier
//! masks and typed actions, and matching key presses against them.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BindingConfig;
use crate::wm::screen::{Direction, Spot};

/// Core modifier masks
pub const SHIFT_MASK: u16 = 1 << 0;
pub const LOCK_MASK: u16 = 1 << 1;
pub const CONTROL_MASK: u16 = 1 << 2;
pub const MOD1_MASK: u16 = 1 << 3;
pub const MOD2_MASK: u16 = 1 << 4;
pub const MOD3_MASK: u16 = 1 << 5;
pub const MOD4_MASK: u16 = 1 << 6;
pub const MOD5_MASK: u16 = 1 << 7;
pub const ANY_MODIFIER: u16 = 1 << 15;

/// Keysym of Num_Lock, used to find its modifier bit
pub const XK_NUM_LOCK: u32 = 0xff7f;

/// What a binding does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the current window to a spot
    Move(Spot),
    MoveDirection(Direction),
    /// Focus the top window of a spot on the current monitor
    Focus(Spot),
    FocusDirection(Direction),
    Close,
    /// Focus the next window in the spot and sink the current one
    Cycle,
    /// Flip between the top two windows of the spot
    Other,
    Command(String),
    /// Activate a window by WM_CLASS, else launch the class as a command
    FindOrStart(String),
    MoveMonitor(i32),
    FocusMonitor(i32),
    FullscreenToggle,
    AboveToggle,
    Snapshot,
    Rollback,
}

/// Resolved key binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// Modifier mask, or [`ANY_MODIFIER`]
    pub modifiers: u16,
    pub keysym: u32,
    pub action: Action,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("unknown key name {0:?}")]
    UnknownKey(String),
    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("action {action:?} needs a {param} parameter")]
    MissingParameter { action: String, param: &'static str },
    #[error("{0} is not a valid spot (expected 1, 2 or 3)")]
    InvalidSpot(i32),
    #[error("unknown direction {0:?}")]
    InvalidDirection(String),
}

pub fn modifier_from_name(name: &str) -> Result<u16, BindingError> {
    let mask = match name.to_ascii_lowercase().as_str() {
        "shift" => SHIFT_MASK,
        "lock" => LOCK_MASK,
        "control" | "ctrl" => CONTROL_MASK,
        "mod1" | "alt" => MOD1_MASK,
        "mod2" => MOD2_MASK,
        "mod3" => MOD3_MASK,
        "mod4" | "super" => MOD4_MASK,
        "mod5" => MOD5_MASK,
        "any" => ANY_MODIFIER,
        _ => return Err(BindingError::UnknownModifier(name.to_string())),
    };
    Ok(mask)
}

/// Keysym for a key name. Single printable characters map to themselves
/// (lowercased); everything else comes from a table of common names.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_graphic() {
            return Some(c.to_ascii_lowercase() as u32);
        }
    }

    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=35).contains(&n) {
            return Some(0xffbe + n - 1);
        }
    }

    let keysym = match name {
        "space" => 0x0020,
        "grave" => 0x0060,
        "minus" => 0x002d,
        "equal" => 0x003d,
        "BackSpace" => 0xff08,
        "Tab" => 0xff09,
        "Return" => 0xff0d,
        "Escape" => 0xff1b,
        "Home" => 0xff50,
        "Left" => 0xff51,
        "Up" => 0xff52,
        "Right" => 0xff53,
        "Down" => 0xff54,
        "Prior" | "Page_Up" => 0xff55,
        "Next" | "Page_Down" => 0xff56,
        "End" => 0xff57,
        "Print" => 0xff61,
        "Insert" => 0xff63,
        "Delete" => 0xffff,
        "XF86AudioLowerVolume" => 0x1008ff11,
        "XF86AudioMute" => 0x1008ff12,
        "XF86AudioRaiseVolume" => 0x1008ff13,
        "XF86AudioPlay" => 0x1008ff14,
        "XF86AudioStop" => 0x1008ff15,
        "XF86AudioPrev" => 0x1008ff16,
        "XF86AudioNext" => 0x1008ff17,
        "XF86MonBrightnessUp" => 0x1008ff02,
        "XF86MonBrightnessDown" => 0x1008ff03,
        _ => return None,
    };
    Some(keysym)
}

fn spot_param(action: &str, num: Option<i32>) -> Result<Spot, BindingError> {
    let num = num.ok_or(BindingError::MissingParameter {
        action: action.to_string(),
        param: "num",
    })?;
    u32::try_from(num)
        .ok()
        .and_then(Spot::from_number)
        .ok_or(BindingError::InvalidSpot(num))
}

fn data_param(action: &str, data: Option<&str>) -> Result<String, BindingError> {
    data.filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .ok_or(BindingError::MissingParameter {
            action: action.to_string(),
            param: "data",
        })
}

fn direction_param(action: &str, data: Option<&str>) -> Result<Direction, BindingError> {
    let name = data_param(action, data)?;
    Direction::from_name(&name).ok_or(BindingError::InvalidDirection(name))
}

pub fn parse_action(name: &str, num: Option<i32>, data: Option<&str>) -> Result<Action, BindingError> {
    let action = match name {
        "move" => Action::Move(spot_param(name, num)?),
        "move_direction" => Action::MoveDirection(direction_param(name, data)?),
        "focus" => Action::Focus(spot_param(name, num)?),
        "focus_direction" => Action::FocusDirection(direction_param(name, data)?),
        "close" => Action::Close,
        "cycle" => Action::Cycle,
        "other" => Action::Other,
        "command" => Action::Command(data_param(name, data)?),
        "find_or_start" => Action::FindOrStart(data_param(name, data)?),
        "move_monitor" => Action::MoveMonitor(num.unwrap_or(1)),
        "focus_monitor" => Action::FocusMonitor(num.unwrap_or(1)),
        "fullscreen_toggle" => Action::FullscreenToggle,
        "above_toggle" => Action::AboveToggle,
        "snapshot" => Action::Snapshot,
        "rollback" => Action::Rollback,
        _ => return Err(BindingError::UnknownAction(name.to_string())),
    };
    Ok(action)
}

impl KeyBinding {
    pub fn from_config(config: &BindingConfig) -> Result<Self, BindingError> {
        let keysym =
            keysym_from_name(&config.key).ok_or_else(|| BindingError::UnknownKey(config.key.clone()))?;
        let mut modifiers = 0;
        for name in &config.modifiers {
            modifiers |= modifier_from_name(name)?;
        }
        if modifiers & ANY_MODIFIER != 0 {
            modifiers = ANY_MODIFIER;
        }
        let action = parse_action(&config.action, config.num, config.data.as_deref())?;
        Ok(Self {
            modifiers,
            keysym,
            action,
        })
    }

    /// Whether a press with the given (lock-stripped) state triggers this.
    pub fn matches(&self, keysym: u32, state: u16) -> bool {
        self.keysym == keysym && (self.modifiers == ANY_MODIFIER || self.modifiers == state)
    }
}

/// Resolve configured bindings, logging and skipping the invalid ones.
pub fn resolve_bindings(configs: &[BindingConfig]) -> Vec<KeyBinding> {
    configs
        .iter()
        .filter_map(|config| match KeyBinding::from_config(config) {
            Ok(binding) => {
                debug!("Key binding {:?} -> {:?}", config.key, binding.action);
                Some(binding)
            }
            Err(e) => {
                warn!("Skipping key binding {:?}: {}", config.key, e);
                None
            }
        })
        .collect()
}

/// First binding triggered by a key press.
pub fn find_binding(bindings: &[KeyBinding], keysym: u32, state: u16) -> Option<&KeyBinding> {
    bindings.iter().find(|b| b.matches(keysym, state))
}

/// Strip CapsLock and NumLock from a key event state.
pub fn clean_modifiers(state: u16, numlock_mask: u16) -> u16 {
    state & !(LOCK_MASK | numlock_mask) & 0xff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_bindings;

    fn config(mods: &[&str], key: &str, action: &str, num: Option<i32>, data: Option<&str>) -> BindingConfig {
        BindingConfig {
            modifiers: mods.iter().map(|m| m.to_string()).collect(),
            key: key.into(),
            action: action.into(),
            num,
            data: data.map(Into::into),
        }
    }

    #[test]
    fn test_keysym_names() {
        assert_eq!(keysym_from_name("Left"), Some(0xff51));
        assert_eq!(keysym_from_name("Return"), Some(0xff0d));
        assert_eq!(keysym_from_name("x"), Some('x' as u32));
        assert_eq!(keysym_from_name("X"), Some('x' as u32));
        assert_eq!(keysym_from_name("1"), Some('1' as u32));
        assert_eq!(keysym_from_name("F1"), Some(0xffbe));
        assert_eq!(keysym_from_name("F12"), Some(0xffc9));
        assert_eq!(keysym_from_name("XF86AudioMute"), Some(0x1008ff12));
        assert_eq!(keysym_from_name("Hyper_Whatever"), None);
        assert_eq!(keysym_from_name("F99"), None);
    }

    #[test]
    fn test_binding_from_config() {
        let binding =
            KeyBinding::from_config(&config(&["shift", "mod4"], "Left", "move", Some(2), None)).unwrap();
        assert_eq!(binding.modifiers, SHIFT_MASK | MOD4_MASK);
        assert_eq!(binding.keysym, 0xff51);
        assert_eq!(binding.action, Action::Move(Spot::Spot2));
    }

    #[test]
    fn test_binding_errors() {
        assert_eq!(
            KeyBinding::from_config(&config(&["hyper"], "x", "close", None, None)),
            Err(BindingError::UnknownModifier("hyper".into()))
        );
        assert_eq!(
            KeyBinding::from_config(&config(&[], "nope", "close", None, None)),
            Err(BindingError::UnknownKey("nope".into()))
        );
        assert_eq!(
            KeyBinding::from_config(&config(&[], "x", "dance", None, None)),
            Err(BindingError::UnknownAction("dance".into()))
        );
        assert_eq!(
            KeyBinding::from_config(&config(&[], "x", "focus", Some(4), None)),
            Err(BindingError::InvalidSpot(4))
        );
        assert!(matches!(
            KeyBinding::from_config(&config(&[], "x", "command", None, Some("  "))),
            Err(BindingError::MissingParameter { .. })
        ));
        assert_eq!(
            KeyBinding::from_config(&config(&[], "x", "focus_direction", None, Some("sideways"))),
            Err(BindingError::InvalidDirection("sideways".into()))
        );
    }

    #[test]
    fn test_resolve_skips_invalid_entries() {
        let bindings = resolve_bindings(&[
            config(&["mod4"], "x", "command", None, Some("dmenu_run")),
            config(&["mod4"], "x", "teleport", None, None),
        ]);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].action, Action::Command("dmenu_run".into()));
    }

    #[test]
    fn test_default_bindings_all_resolve() {
        let configs = default_bindings();
        assert_eq!(resolve_bindings(&configs).len(), configs.len());
    }

    #[test]
    fn test_matching_ignores_lock_keys() {
        let numlock = MOD2_MASK;
        let bindings = resolve_bindings(&[
            config(&["mod4"], "Tab", "other", None, None),
            config(&["any"], "XF86AudioMute", "command", None, Some("mute")),
        ]);

        let state = clean_modifiers(MOD4_MASK | LOCK_MASK | numlock, numlock);
        assert_eq!(find_binding(&bindings, 0xff09, state).unwrap().action, Action::Other);
        assert!(find_binding(&bindings, 0xff09, SHIFT_MASK | MOD4_MASK).is_none());
        assert!(find_binding(&bindings, 0xff09, 0).is_none());

        let mute = find_binding(&bindings, 0x1008ff12, CONTROL_MASK | SHIFT_MASK).unwrap();
        assert_eq!(mute.action, Action::Command("mute".into()));
    }

    #[test]
    fn test_first_match_wins() {
        let bindings = resolve_bindings(&[
            config(&["mod4"], "a", "above_toggle", None, None),
            config(&["mod4"], "a", "close", None, None),
        ]);
        assert_eq!(
            find_binding(&bindings, 'a' as u32, MOD4_MASK).unwrap().action,
            Action::AboveToggle
        );
    }
}
