use tracing::{debug, info};

use crate::actor::reactor::{CommandError, Reactor};
use crate::sys::window::WindowId;

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_switch(reactor: &mut Reactor, index: usize) -> Result<(), CommandError> {
        let previous = reactor.current;
        let foreground = reactor.system.windows.foreground_window();

        reactor.switch_desktop(index)?;

        if foreground != reactor.marker_manager.activating_browser {
            reactor.activity.set_active(previous, foreground);
        }
        debug!(previous, active = ?reactor.activity.active(previous), "Switch active");
        info!(index, "Switched to");
        Ok(())
    }

    pub fn handle_move(
        reactor: &mut Reactor,
        window: Option<WindowId>,
        index: usize,
    ) -> Result<(), CommandError> {
        let window = window.ok_or(CommandError::NoForegroundWindow)?;

        reactor.move_window_to(window, index)?;

        // The window left its desktop, so it can no longer stand in as that
        // desktop's browser.
        for cleared in reactor.activity.forget_browser(window) {
            debug!(%window, index = cleared, "Browser cleared");
        }
        Ok(())
    }
}
