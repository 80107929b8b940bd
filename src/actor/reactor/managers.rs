use std::sync::Arc;

use crate::actor::{occupancy, tray};
use crate::sys::desktop::DesktopProvider;
use crate::sys::window::WindowProvider;

/// Host services the reactor calls into.
#[derive(Clone)]
pub struct SystemManager {
    pub desktops: Arc<dyn DesktopProvider>,
    pub windows: Arc<dyn WindowProvider>,
}

/// Transient markers that keep programmatic focus changes out of the
/// activity table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkerManager {
    /// Window being moved by us; consumed by the next desktop switch.
    pub moving_window: Option<crate::sys::window::WindowId>,
    /// Browser window we are bringing forward; cleared once it gains focus.
    pub activating_browser: Option<crate::sys::window::WindowId>,
}

/// Outgoing channels to the indicator side.
#[derive(Default, Clone)]
pub struct CommunicationManager {
    pub occupancy: Option<occupancy::OccupancyHandle>,
    pub tray_tx: Option<tray::Sender>,
}

impl CommunicationManager {
    pub fn alert(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tray_tx {
            tx.send(tray::Event::Alert(message.into()));
        }
    }
}
