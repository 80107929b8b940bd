use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sys::window::WindowId;

/// Opaque identity of one virtual desktop, as handed out by the host.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DesktopId(u128);

impl DesktopId {
    pub const fn new(raw: u128) -> DesktopId { DesktopId(raw) }

    pub fn get(self) -> u128 { self.0 }
}

impl fmt::Display for DesktopId {
    // Guid-style grouping, which is what the host shows in its own tooling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesktopError {
    /// The desktop API is missing or refused to initialize on this host.
    #[error("virtual desktops are unavailable: {0}")]
    Unavailable(String),
    #[error("desktop {0} not found")]
    NotFound(DesktopId),
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    #[error("desktop operation failed: {0}")]
    Failed(String),
}

/// Virtual desktop management of the host.
///
/// The host's "current desktop changed" notification is not part of this
/// trait; the platform glue forwards it to
/// [`GridManager::on_desktop_changed`](crate::actor::grid_manager::GridManager::on_desktop_changed).
pub trait DesktopProvider: Send + Sync {
    /// All desktops, in the host's enumeration order.
    fn desktops(&self) -> Result<Vec<DesktopId>, DesktopError>;

    fn current_desktop(&self) -> Result<DesktopId, DesktopError>;

    fn create_desktop(&self) -> Result<DesktopId, DesktopError>;

    /// Removes `desktop`, moving its windows to `fallback`.
    fn remove_desktop(&self, desktop: DesktopId, fallback: DesktopId) -> Result<(), DesktopError>;

    fn switch_to(&self, desktop: DesktopId) -> Result<(), DesktopError>;

    /// `None` for windows that are not desktop-scoped (shell surfaces, pinned
    /// windows) and for windows that vanished during the lookup.
    fn desktop_of_window(&self, window: WindowId) -> Option<DesktopId>;

    fn move_window_to_desktop(
        &self,
        window: WindowId,
        desktop: DesktopId,
    ) -> Result<(), DesktopError>;

    /// Pins or unpins `window` so it shows on every desktop.
    fn toggle_pinned(&self, window: WindowId) -> Result<(), DesktopError>;
}

#[cfg(test)]
mod tests {
    use super::DesktopId;

    #[test]
    fn desktop_id_displays_like_a_guid() {
        let id = DesktopId::new(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0011-223344556677");
    }
}
