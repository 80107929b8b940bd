//! The hotkey binding table and its registration with the host.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::actor::reactor::Target;
use crate::common::collections::HashMap;
use crate::common::config::{KeyBindings, NumberKeys};
use crate::layout_engine::Direction;
use crate::sys::hotkey::{Hotkey, HotkeyError, HotkeyProvider, KeyCode};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Switch(Target),
    Move(Target),
    /// Shows the foreground window on every desktop, or stops doing so.
    ToggleSticky,
    ToggleAlwaysOnTop,
}

impl Action {
    /// Whether the action needs a running desktop grid.
    pub fn needs_desktops(self) -> bool { matches!(self, Action::Switch(_) | Action::Move(_)) }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = |f: &mut fmt::Formatter<'_>, target: &Target| match target {
            Target::Index(index) => write!(f, "desktop {}", index + 1),
            Target::Neighbor(direction) => write!(f, "{direction}"),
        };
        match self {
            Action::Switch(t) => {
                f.write_str("switch to ")?;
                target(f, t)
            }
            Action::Move(t) => {
                f.write_str("move window to ")?;
                target(f, t)
            }
            Action::ToggleSticky => f.write_str("toggle sticky window"),
            Action::ToggleAlwaysOnTop => f.write_str("toggle always on top"),
        }
    }
}

/// Number keys and the desktop index each one selects.
pub fn numbered_keys(numbers: NumberKeys, desktop_count: usize) -> Vec<(KeyCode, usize)> {
    match numbers {
        NumberKeys::Digits => (1..=desktop_count.min(9))
            .filter_map(|k| Some((KeyCode::digit(k)?, k - 1)))
            .collect(),
        NumberKeys::FunctionKeys => (1..=desktop_count.min(12))
            .filter_map(|k| Some((KeyCode::function(k)?, k - 1)))
            .collect(),
        // The keypad's bottom row (1-2-3) is the grid's third row. Keys that
        // land outside a smaller grid are left unbound.
        NumberKeys::Numpad => (1..=9)
            .filter_map(|k| Some((KeyCode::numpad(k)?, numpad_index(k))))
            .filter(|&(_, index)| index < desktop_count)
            .collect(),
        NumberKeys::None => Vec::new(),
    }
}

fn numpad_index(k: usize) -> usize { (2 - (k - 1) / 3) * 3 + (k - 1) % 3 }

const ARROWS: [(KeyCode, Direction); 4] = [
    (KeyCode::Left, Direction::Left),
    (KeyCode::Right, Direction::Right),
    (KeyCode::Up, Direction::Up),
    (KeyCode::Down, Direction::Down),
];

/// The full binding table for a grid of `desktop_count` desktops.
pub fn bindings(keys: &KeyBindings, desktop_count: usize) -> Vec<(Hotkey, Action)> {
    let mut table = Vec::new();

    for (key, direction) in ARROWS {
        let target = Target::Neighbor(direction);
        table.push((Hotkey::new(keys.switch_modifiers, key), Action::Switch(target)));
        table.push((Hotkey::new(keys.move_modifiers, key), Action::Move(target)));
    }
    for (key, index) in numbered_keys(keys.numbers, desktop_count) {
        let target = Target::Index(index);
        table.push((Hotkey::new(keys.switch_modifiers, key), Action::Switch(target)));
        table.push((Hotkey::new(keys.move_modifiers, key), Action::Move(target)));
    }
    if let Some(hotkey) = keys.sticky_window {
        table.push((hotkey, Action::ToggleSticky));
    }
    if let Some(hotkey) = keys.always_on_top {
        table.push((hotkey, Action::ToggleAlwaysOnTop));
    }
    table
}

/// Hotkeys currently registered with the host and what they do.
pub struct HotkeyRegistrations {
    provider: Arc<dyn HotkeyProvider>,
    actions: HashMap<Hotkey, Action>,
    registered: Vec<Hotkey>,
}

impl HotkeyRegistrations {
    pub fn new(provider: Arc<dyn HotkeyProvider>) -> Self {
        HotkeyRegistrations {
            provider,
            actions: HashMap::default(),
            registered: Vec::new(),
        }
    }

    /// Registers every binding it can. A binding that fails does not stop the
    /// others; the failures are returned for the caller to report.
    pub fn register_all(&mut self, table: Vec<(Hotkey, Action)>) -> Vec<HotkeyError> {
        let mut failures = Vec::new();
        for (hotkey, action) in table {
            if self.actions.contains_key(&hotkey) {
                warn!(%hotkey, %action, "Hotkey bound twice, keeping the first binding");
                continue;
            }
            match self.provider.register(hotkey) {
                Ok(()) => {
                    debug!(%hotkey, %action, "Registered hotkey");
                    self.actions.insert(hotkey, action);
                    self.registered.push(hotkey);
                }
                Err(e) => {
                    warn!("{e}");
                    failures.push(e);
                }
            }
        }
        failures
    }

    pub fn unregister_all(&mut self) {
        for hotkey in self.registered.drain(..) {
            self.provider.unregister(hotkey);
        }
        self.actions.clear();
    }

    pub fn action(&self, hotkey: Hotkey) -> Option<Action> { self.actions.get(&hotkey).copied() }

    pub fn registered(&self) -> &[Hotkey] { &self.registered }
}
