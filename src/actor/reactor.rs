//! The Reactor owns the per-session grid state and reacts to host
//! notifications and user commands.
//!
//! It is only ever driven from inside the grid manager's lock, so every
//! handler runs to completion without interleaving with another. Provider
//! failures inside event handlers are logged and absorbed; command failures
//! are returned to the caller.

mod browser;
mod events;
mod managers;

#[cfg(test)]
pub(crate) mod testing;


use std::sync::Arc;
use std::time::{Duration, Instant};

use events::command::CommandEventHandler;
use events::desktop::DesktopEventHandler;
use events::foreground::ForegroundEventHandler;
pub use managers::{CommunicationManager, MarkerManager, SystemManager};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::actor::occupancy::ScanRequest;
use crate::common::config::Settings;
use crate::layout_engine::{Direction, GridLayout};
use crate::model::server::{DesktopData, GridStateData, RelocationData};
use crate::model::{
    ActivityTable, DesktopRegistry, PatternMatcher, PlaceholderMatcher, RelocationTracker,
};
use crate::sys::desktop::{DesktopError, DesktopId};
use crate::sys::window::{WindowError, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The host reported a new foreground window. `at` is when the
    /// notification was received, which is what relocation timeouts are
    /// measured against.
    ForegroundChanged { window: WindowId, at: Instant },

    /// The host finished switching to another desktop.
    DesktopChanged(DesktopId),
}

/// Where a command should go, either a fixed grid index or a neighbor of the
/// current desktop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Index(usize),
    Neighbor(Direction),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Switch(Target),
    /// Moves the foreground window and follows it.
    Move(Target),
    MoveWindow(Option<WindowId>, Target),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("the desktop grid is not running")]
    NotRunning,
    #[error("failed to get the foreground window")]
    NoForegroundWindow,
    #[error("desktop {index} is outside the grid of {count} desktops")]
    IndexOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Desktop(#[from] DesktopError),
    #[error(transparent)]
    Window(#[from] WindowError),
}

pub struct Reactor {
    settings: Settings,
    grid: GridLayout,
    desktops: Arc<DesktopRegistry>,
    current: usize,
    activity: ActivityTable,
    relocation: RelocationTracker,
    placeholder: Arc<dyn PlaceholderMatcher>,
    system: SystemManager,
    marker_manager: MarkerManager,
    communication_manager: CommunicationManager,
}

impl Reactor {
    pub fn new(settings: Settings, desktops: DesktopRegistry, system: SystemManager) -> Reactor {
        let current = system
            .desktops
            .current_desktop()
            .ok()
            .and_then(|id| desktops.index_of(id))
            .unwrap_or_else(|| {
                warn!("Current desktop is not part of the grid, assuming the first one");
                0
            });
        let placeholder: Arc<dyn PlaceholderMatcher> =
            match PatternMatcher::new(&settings.placeholder_title_pattern) {
                Ok(matcher) => Arc::new(matcher),
                Err(e) => {
                    warn!(
                        pattern = %settings.placeholder_title_pattern,
                        "Invalid placeholder title pattern, using the default: {e}"
                    );
                    Arc::new(PatternMatcher::default())
                }
            };
        Reactor {
            grid: GridLayout::from_settings(&settings),
            activity: ActivityTable::new(desktops.len()),
            desktops: Arc::new(desktops),
            current,
            relocation: RelocationTracker::default(),
            placeholder,
            system,
            marker_manager: MarkerManager::default(),
            communication_manager: CommunicationManager::default(),
            settings,
        }
    }

    pub fn with_placeholder_matcher(mut self, matcher: Arc<dyn PlaceholderMatcher>) -> Reactor {
        self.placeholder = matcher;
        self
    }

    pub fn connect(&mut self, communication: CommunicationManager) {
        self.communication_manager = communication;
    }

    pub fn current(&self) -> usize { self.current }

    pub fn grid(&self) -> GridLayout { self.grid }

    pub fn desktops(&self) -> &DesktopRegistry { &self.desktops }

    pub fn activity(&self) -> &ActivityTable { &self.activity }

    pub fn markers(&self) -> &MarkerManager { &self.marker_manager }

    pub fn relocation(&self) -> &RelocationTracker { &self.relocation }

    fn log_event(&self, event: &Event) {
        match event {
            Event::ForegroundChanged { .. } => trace!(?event, "Event"),
            Event::DesktopChanged(_) => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event = ?event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        match event {
            Event::ForegroundChanged { window, at } => {
                ForegroundEventHandler::handle_foreground_changed(self, window, at);
            }
            Event::DesktopChanged(desktop) => {
                DesktopEventHandler::handle_desktop_changed(self, desktop);
            }
        }
    }

    #[instrument(name = "reactor::handle_command", skip(self))]
    pub fn handle_command(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Switch(target) => {
                let index = self.resolve(target)?;
                CommandEventHandler::handle_switch(self, index)
            }
            Command::Move(target) => {
                let index = self.resolve(target)?;
                let window = self.system.windows.foreground_window();
                CommandEventHandler::handle_move(self, window, index)
            }
            Command::MoveWindow(window, target) => {
                let index = self.resolve(target)?;
                CommandEventHandler::handle_move(self, window, index)
            }
        }
    }

    fn resolve(&self, target: Target) -> Result<usize, CommandError> {
        let index = match target {
            Target::Index(index) => index,
            Target::Neighbor(direction) => self.grid.neighbor(self.current, direction),
        };
        if index < self.desktops.len() {
            Ok(index)
        } else {
            Err(CommandError::IndexOutOfRange { index, count: self.desktops.len() })
        }
    }

    fn window_desktop_index(&self, window: WindowId) -> Option<usize> {
        let desktop = self.system.desktops.desktop_of_window(window)?;
        self.desktops.index_of(desktop)
    }

    fn is_on_current_desktop(&self, window: WindowId) -> bool {
        self.desktops.identity(self.current).is_some_and(|current| {
            self.system.desktops.desktop_of_window(window) == Some(current)
        })
    }

    fn is_default_browser(&self, window: WindowId) -> bool {
        let Some(browser) = &self.settings.browser else { return false };
        self.system
            .windows
            .owner_process_name(window)
            .is_some_and(|exe| exe.eq_ignore_ascii_case(&browser.exe_name))
    }

    fn is_relocation_trigger(&self, window: WindowId) -> bool {
        if self.settings.move_on_new_window_exe_names.is_empty() {
            return false;
        }
        self.system
            .windows
            .owner_process_name(window)
            .is_some_and(|exe| self.settings.is_relocation_trigger(&exe))
    }

    fn set_foreground_if_needed(&self, window: WindowId) {
        if self.system.windows.foreground_window() == Some(window) {
            return;
        }
        if let Err(e) = self.system.windows.set_foreground_window(window) {
            warn!(%window, "Failed to set foreground window: {e}");
        }
    }

    /// Brings `window` forward if it still lives on the current desktop.
    fn activate_window(&self, window: Option<WindowId>) -> bool {
        let Some(window) = window else { return false };
        if !self.is_on_current_desktop(window) {
            return false;
        }
        debug!(current = self.current, %window, "Activate");
        self.set_foreground_if_needed(window);
        true
    }

    /// Asks the host to show desktop `index` and records it as current.
    fn switch_desktop(&mut self, index: usize) -> Result<(), CommandError> {
        let desktop = self
            .desktops
            .identity(index)
            .ok_or(CommandError::IndexOutOfRange { index, count: self.desktops.len() })?;
        self.system.desktops.switch_to(desktop)?;
        self.current = index;
        Ok(())
    }

    /// Moves `window` to desktop `index` and follows it there.
    ///
    /// Nothing is recorded unless the host accepted the move. If the host
    /// refuses to follow, the window stays moved and the error is returned.
    fn move_window_to(&mut self, window: WindowId, index: usize) -> Result<(), CommandError> {
        let desktop = self
            .desktops
            .identity(index)
            .ok_or(CommandError::IndexOutOfRange { index, count: self.desktops.len() })?;

        let previous_marker = self.marker_manager.moving_window.replace(window);
        debug!(%window, from = self.current, to = index, "Move");
        if let Err(e) = self.system.desktops.move_window_to_desktop(window, desktop) {
            self.marker_manager.moving_window = previous_marker;
            return Err(e.into());
        }

        self.activity.forget_active(window);
        self.activity.set_active(index, Some(window));
        self.set_foreground_if_needed(window);

        if index == self.current {
            // No switch notification will follow to consume the marker.
            self.marker_manager.moving_window = previous_marker;
        } else if let Err(e) = self.switch_desktop(index) {
            warn!(%window, index, "Moved window but could not follow it: {e}");
            self.marker_manager.moving_window = previous_marker;
            return Err(e);
        }
        Ok(())
    }

    /// Moves a freshly opened window back to `target`, retrying while the
    /// host does not know about the window yet.
    fn relocate(&mut self, window: WindowId, target: usize) -> bool {
        let interval = self.settings.relocation_retry_interval();
        let budget = self.settings.relocation_retry_budget();
        let mut waited = Duration::ZERO;
        loop {
            match self.move_window_to(window, target) {
                Ok(()) => return true,
                Err(e) if waited >= budget => {
                    warn!(%window, target, ?waited, "Giving up relocating new window: {e}");
                    self.communication_manager
                        .alert(format!("Could not move the new window to desktop {}", target + 1));
                    return false;
                }
                Err(e) => {
                    trace!(%window, target, "Relocation attempt failed: {e}");
                    std::thread::sleep(interval);
                    waited += interval;
                }
            }
        }
    }

    pub fn request_indicator_refresh(&self) {
        if let Some(occupancy) = &self.communication_manager.occupancy {
            occupancy.request(ScanRequest {
                current: self.current,
                grid: self.grid,
                desktops: self.desktops.clone(),
            });
        }
    }

    pub fn state_data(&self, now: Instant, is_occupied: impl Fn(usize) -> bool) -> GridStateData {
        GridStateData {
            rows: self.grid.rows,
            columns: self.grid.columns,
            wrap_around: self.grid.wrap_around,
            current: self.current,
            running: true,
            degraded: false,
            desktops: self
                .desktops
                .iter()
                .map(|(index, id)| DesktopData {
                    index,
                    id: id.to_string(),
                    is_current: index == self.current,
                    is_occupied: is_occupied(index),
                    active_window: self.activity.active(index),
                    browser_window: self.activity.browser(index),
                })
                .collect(),
            pending_relocation: self
                .relocation
                .live(now, self.settings.detect_timeout())
                .map(|pending| RelocationData {
                    trigger: pending.trigger,
                    source: pending.source,
                    age_ms: now.saturating_duration_since(pending.since).as_millis() as u64,
                }),
        }
    }
}
