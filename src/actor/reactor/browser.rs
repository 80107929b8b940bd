use tracing::{debug, warn};

use super::Reactor;
use crate::common::config::BrowserSettings;
use crate::sys::window::WindowId;

pub struct BrowserActivation;

impl BrowserActivation {
    /// Brings the browser window of the current desktop forward.
    ///
    /// `known` is the browser last seen on this desktop. When it is gone or
    /// has moved elsewhere, the browser windows are searched in z-order.
    pub fn find_activate(
        reactor: &mut Reactor,
        known: Option<WindowId>,
        browser: &BrowserSettings,
    ) -> bool {
        if let Some(window) = known
            && reactor.system.windows.is_window(window)
            && reactor.window_desktop_index(window) == Some(reactor.current)
        {
            debug!(current = reactor.current, %window, "Activate known browser");
            Self::activate(reactor, window);
            return true;
        }

        let windows = &reactor.system.windows;
        let candidates = windows.enumerate_windows(&mut |window| {
            windows
                .window_class(window)
                .is_some_and(|class| class.eq_ignore_ascii_case(&browser.class_name))
                && windows
                    .owner_process_name(window)
                    .is_some_and(|exe| exe.eq_ignore_ascii_case(&browser.exe_name))
        });
        let found = top_browser_on_desktop(
            candidates.into_iter().map(|window| (window, reactor.is_on_current_desktop(window))),
        );

        match found {
            Some(window) => {
                debug!(current = reactor.current, %window, "Activate unknown browser");
                Self::activate(reactor, window);
                true
            }
            None => false,
        }
    }

    pub fn activate(reactor: &mut Reactor, window: WindowId) {
        reactor.marker_manager.activating_browser = Some(window);
        reactor.set_foreground_if_needed(window);

        let windows = &reactor.system.windows;
        if windows.is_minimized(window)
            && let Err(e) = windows.restore_z_order(window)
        {
            warn!(%window, "Failed to restore browser z-order: {e}");
        }

        let settle = reactor.settings.browser_settle();
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
    }
}

/// Picks the browser window to bring forward from candidates in z-order,
/// each flagged with whether it is on the current desktop.
///
/// Returns `None` when the top-most browser is already on the current
/// desktop, or when no browser is.
pub fn top_browser_on_desktop(
    candidates: impl IntoIterator<Item = (WindowId, bool)>,
) -> Option<WindowId> {
    let mut candidates = candidates.into_iter();
    let (_, top_is_here) = candidates.next()?;
    if top_is_here {
        return None;
    }
    candidates.find(|&(_, here)| here).map(|(window, _)| window)
}
