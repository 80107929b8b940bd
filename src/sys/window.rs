use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle of a top-level window.
///
/// The host uses a null handle to mean "no window"; that is represented as
/// `Option<WindowId>` here, so a `WindowId` always names something.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(NonZeroU64);

impl WindowId {
    pub fn new(raw: u64) -> Option<WindowId> { NonZeroU64::new(raw).map(WindowId) }

    pub fn get(self) -> u64 { self.0.get() }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("window {0} no longer exists")]
    Gone(WindowId),
    #[error("window operation failed: {0}")]
    Failed(String),
}

/// Window-level queries and actions of the host.
///
/// Lookups that can race with a window being destroyed return `None` (or an
/// empty string for titles) rather than an error.
pub trait WindowProvider: Send + Sync {
    fn foreground_window(&self) -> Option<WindowId>;

    fn set_foreground_window(&self, window: WindowId) -> Result<(), WindowError>;

    fn is_window(&self, window: WindowId) -> bool;

    fn window_title(&self, window: WindowId) -> String;

    fn window_class(&self, window: WindowId) -> Option<String>;

    /// Executable file name of the owning process, e.g. `firefox.exe`.
    fn owner_process_name(&self, window: WindowId) -> Option<String>;

    fn is_minimized(&self, window: WindowId) -> bool;

    /// Restores a minimized window and minimizes it again, which brings it to
    /// the top of the z-order without leaving it on screen.
    fn restore_z_order(&self, window: WindowId) -> Result<(), WindowError>;

    /// Top-level windows in z-order (top-most first) for which `filter`
    /// returns true.
    fn enumerate_windows(&self, filter: &mut dyn FnMut(WindowId) -> bool) -> Vec<WindowId>;

    fn toggle_always_on_top(&self, window: WindowId) -> Result<(), WindowError>;
}
