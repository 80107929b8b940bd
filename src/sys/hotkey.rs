use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use strum::{Display, EnumString};
use thiserror::Error;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
        const WIN = 1 << 3;
    }
}

impl Modifiers {
    fn from_token(token: &str) -> Option<Modifiers> {
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" | "option" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            "win" | "meta" | "super" | "cmd" => Some(Modifiers::WIN),
            _ => None,
        }
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Modifiers::CTRL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::WIN, "Win"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" + ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for Modifiers {
    type Err = HotkeyParseError;

    /// Parses `"Ctrl + Alt"`. An empty string means no modifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        for token in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            modifiers |= Modifiers::from_token(token)
                .ok_or_else(|| HotkeyParseError::UnknownModifier(token.to_string()))?;
        }
        Ok(modifiers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum KeyCode {
    #[strum(to_string = "Left", serialize = "ArrowLeft")]
    Left,
    #[strum(to_string = "Right", serialize = "ArrowRight")]
    Right,
    #[strum(to_string = "Up", serialize = "ArrowUp")]
    Up,
    #[strum(to_string = "Down", serialize = "ArrowDown")]
    Down,

    #[strum(to_string = "1", serialize = "D1", serialize = "Digit1")]
    Digit1,
    #[strum(to_string = "2", serialize = "D2", serialize = "Digit2")]
    Digit2,
    #[strum(to_string = "3", serialize = "D3", serialize = "Digit3")]
    Digit3,
    #[strum(to_string = "4", serialize = "D4", serialize = "Digit4")]
    Digit4,
    #[strum(to_string = "5", serialize = "D5", serialize = "Digit5")]
    Digit5,
    #[strum(to_string = "6", serialize = "D6", serialize = "Digit6")]
    Digit6,
    #[strum(to_string = "7", serialize = "D7", serialize = "Digit7")]
    Digit7,
    #[strum(to_string = "8", serialize = "D8", serialize = "Digit8")]
    Digit8,
    #[strum(to_string = "9", serialize = "D9", serialize = "Digit9")]
    Digit9,

    #[strum(to_string = "NumPad1", serialize = "Numpad1")]
    NumPad1,
    #[strum(to_string = "NumPad2", serialize = "Numpad2")]
    NumPad2,
    #[strum(to_string = "NumPad3", serialize = "Numpad3")]
    NumPad3,
    #[strum(to_string = "NumPad4", serialize = "Numpad4")]
    NumPad4,
    #[strum(to_string = "NumPad5", serialize = "Numpad5")]
    NumPad5,
    #[strum(to_string = "NumPad6", serialize = "Numpad6")]
    NumPad6,
    #[strum(to_string = "NumPad7", serialize = "Numpad7")]
    NumPad7,
    #[strum(to_string = "NumPad8", serialize = "Numpad8")]
    NumPad8,
    #[strum(to_string = "NumPad9", serialize = "Numpad9")]
    NumPad9,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Space,
    Tab,
    Enter,
    Escape,
}

impl KeyCode {
    const DIGITS: [KeyCode; 9] = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    const NUMPAD: [KeyCode; 9] = [
        KeyCode::NumPad1,
        KeyCode::NumPad2,
        KeyCode::NumPad3,
        KeyCode::NumPad4,
        KeyCode::NumPad5,
        KeyCode::NumPad6,
        KeyCode::NumPad7,
        KeyCode::NumPad8,
        KeyCode::NumPad9,
    ];
    const FUNCTION: [KeyCode; 12] = [
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
        KeyCode::F7,
        KeyCode::F8,
        KeyCode::F9,
        KeyCode::F10,
        KeyCode::F11,
        KeyCode::F12,
    ];

    /// The `n`th (1-based) key of the top-row digits.
    pub fn digit(n: usize) -> Option<KeyCode> { Self::DIGITS.get(n.checked_sub(1)?).copied() }

    pub fn numpad(n: usize) -> Option<KeyCode> { Self::NUMPAD.get(n.checked_sub(1)?).copied() }

    pub fn function(n: usize) -> Option<KeyCode> { Self::FUNCTION.get(n.checked_sub(1)?).copied() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key_code: KeyCode,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key_code: KeyCode) -> Hotkey { Hotkey { modifiers, key_code } }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_code)
        } else {
            write!(f, "{} + {}", self.modifiers, self.key_code)
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotkeyParseError {
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("hotkey '{0}' has no key")]
    MissingKey(String),
    #[error("hotkey '{0}' has more than one key")]
    ExtraKey(String),
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    /// Parses `"Ctrl + Alt + Left"`; the key may appear in any position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key_code = None;
        for token in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(modifier) = Modifiers::from_token(token) {
                modifiers |= modifier;
                continue;
            }
            let key = KeyCode::from_str(token)
                .map_err(|_| HotkeyParseError::UnknownKey(token.to_string()))?;
            if key_code.replace(key).is_some() {
                return Err(HotkeyParseError::ExtraKey(s.to_string()));
            }
        }
        let key_code = key_code.ok_or_else(|| HotkeyParseError::MissingKey(s.to_string()))?;
        Ok(Hotkey { modifiers, key_code })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("hotkey {0} is already registered by another application")]
    AlreadyTaken(Hotkey),
    #[error("failed to register hotkey {hotkey}: {reason}")]
    Failed { hotkey: Hotkey, reason: String },
}

/// Global hotkey registration of the host.
///
/// Presses are delivered by the platform glue to
/// [`GridManager::hotkey_pressed`](crate::actor::grid_manager::GridManager::hotkey_pressed).
pub trait HotkeyProvider: Send + Sync {
    fn register(&self, hotkey: Hotkey) -> Result<(), HotkeyError>;

    fn unregister(&self, hotkey: Hotkey);
}
