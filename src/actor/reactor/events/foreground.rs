use std::time::Instant;

use tracing::{debug, trace};

use crate::actor::reactor::Reactor;
use crate::model::{RelocationStep, TriggerSighting};
use crate::sys::window::WindowId;

pub struct ForegroundEventHandler;

impl ForegroundEventHandler {
    pub fn handle_foreground_changed(reactor: &mut Reactor, window: WindowId, at: Instant) {
        // Shell surfaces and pinned windows have no desktop; treat them as
        // belonging to the current one but never record them as its activity.
        let resolved = reactor.window_desktop_index(window);
        let window_desktop = resolved.unwrap_or(reactor.current);

        if reactor.is_relocation_trigger(window)
            && Self::handle_relocation_trigger(reactor, window, window_desktop, at)
        {
            return;
        }

        let markers = &reactor.marker_manager;
        if resolved.is_some()
            && markers.moving_window.is_none()
            && markers.activating_browser != Some(window)
        {
            reactor.activity.set_active(window_desktop, Some(window));
        }

        trace!(
            current = reactor.current,
            desktop = ?resolved,
            %window,
            title = %reactor.system.windows.window_title(window),
            "Foreground"
        );

        let activating = reactor.marker_manager.activating_browser == Some(window);
        if activating || reactor.is_default_browser(window) {
            debug!(current = reactor.current, window_desktop, %window, "Browser");
            reactor.activity.set_browser(window_desktop, Some(window));
        }
        if activating {
            reactor.marker_manager.activating_browser = None;
        }
    }

    /// Returns true when the event was consumed by the relocation tracker.
    fn handle_relocation_trigger(
        reactor: &mut Reactor,
        window: WindowId,
        window_desktop: usize,
        at: Instant,
    ) -> bool {
        let sighting = TriggerSighting {
            window,
            window_desktop,
            current: reactor.current,
            now: at,
        };
        let timeout = reactor.settings.detect_timeout();
        let windows = &reactor.system.windows;
        let placeholder = &reactor.placeholder;
        let step = reactor.relocation.observe(sighting, timeout, |trigger| {
            placeholder.is_placeholder(&windows.window_title(window), &windows.window_title(trigger))
        });

        match step {
            RelocationStep::Armed { source, opened_on } => {
                debug!(%window, source, opened_on, "Opened relocation trigger");
            }
            RelocationStep::Refreshed => debug!(%window, "Reset relocation timeout"),
            RelocationStep::Relocate { window, target } => {
                debug!(
                    %window,
                    title = %reactor.system.windows.window_title(window),
                    target,
                    "Relocating new window"
                );
                reactor.relocate(window, target);
            }
            RelocationStep::Expired | RelocationStep::Continue => {}
        }
        step.consumes_event()
    }
}
