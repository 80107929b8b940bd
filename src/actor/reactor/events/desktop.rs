use tracing::{debug, warn};

use crate::actor::reactor::Reactor;
use crate::actor::reactor::browser::BrowserActivation;
use crate::sys::desktop::DesktopId;

pub struct DesktopEventHandler;

impl DesktopEventHandler {
    pub fn handle_desktop_changed(reactor: &mut Reactor, desktop: DesktopId) {
        // Each switch consumes at most one suppressed move.
        let moving = reactor.marker_manager.moving_window.take();

        let Some(index) = reactor.desktops.index_of(desktop) else {
            warn!(%desktop, "Switched to a desktop outside the grid");
            return;
        };
        debug!(index, "Switched to");
        reactor.current = index;
        reactor.request_indicator_refresh();

        if let Some(window) = moving
            && reactor.is_default_browser(window)
        {
            debug!(%window, "Moved a browser window, leaving focus alone");
            return;
        }

        let foreground = reactor.system.windows.foreground_window();
        let last_active = reactor.activity.active(index);

        if let Some(browser) = reactor.settings.browser.clone() {
            let last_browser = reactor.activity.browser(index);
            if last_browser != last_active {
                BrowserActivation::find_activate(reactor, last_browser, &browser);
            }
        }

        if !reactor.activate_window(last_active)
            && let Some(foreground) = foreground
            && reactor.system.windows.foreground_window() != Some(foreground)
        {
            debug!(current = index, window = %foreground, "Reactivate");
            if let Err(e) = reactor.system.windows.set_foreground_window(foreground) {
                warn!(window = %foreground, "Failed to restore foreground window: {e}");
            }
        }
    }
}
