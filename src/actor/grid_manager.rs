//! Lifecycle and the single mutual-exclusion domain around the [`Reactor`].
//!
//! Host notifications can arrive on any thread, including synchronously from
//! inside a provider call the reactor itself is making (a switch request that
//! fires the "desktop changed" callback before returning). Notifications are
//! therefore queued first and applied by whoever holds the reactor lock; a
//! notification that finds the lock taken leaves its event for the holder,
//! which drains the queue again after unlocking.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

use crate::actor::hotkeys::{self, Action, HotkeyRegistrations};
use crate::actor::occupancy::{OccupancyHandle, OccupancyScanner};
use crate::actor::reactor::{
    Command, CommandError, CommunicationManager, Event, Reactor, SystemManager, Target,
};
use crate::actor::tray;
use crate::common::config::{Config, MAX_DESKTOPS};
use crate::layout_engine::Direction;
use crate::model::DesktopRegistry;
use crate::model::server::GridStateData;
use crate::sys::desktop::{DesktopError, DesktopId, DesktopProvider};
use crate::sys::hotkey::{Hotkey, HotkeyProvider};
use crate::sys::window::{WindowId, WindowProvider};

/// Host services, implemented by the platform glue.
#[derive(Clone)]
pub struct Platform {
    pub desktops: Arc<dyn DesktopProvider>,
    pub windows: Arc<dyn WindowProvider>,
    pub hotkeys: Arc<dyn HotkeyProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Running,
    /// Desktops could not be set up; only the window hotkeys are active.
    Degraded(DesktopError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("the desktop grid is already running")]
    AlreadyRunning,
    #[error("a {rows}x{columns} grid is not supported (1 to {max} desktops)", max = MAX_DESKTOPS)]
    InvalidGrid { rows: usize, columns: usize },
}

struct Session {
    hotkeys: HotkeyRegistrations,
    degraded: Option<DesktopError>,
}

pub struct GridManager {
    platform: Platform,
    config: Mutex<Config>,
    /// Lifecycle lock; always taken before `reactor`.
    session: Mutex<Option<Session>>,
    reactor: Mutex<Option<Reactor>>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    occupancy: OccupancyHandle,
    tray_tx: Option<tray::Sender>,
}

assert_impl_all!(GridManager: Send, Sync);

impl GridManager {
    pub fn new(platform: Platform, config: Config, tray_tx: Option<tray::Sender>) -> GridManager {
        let system = SystemManager {
            desktops: platform.desktops.clone(),
            windows: platform.windows.clone(),
        };
        let occupancy = OccupancyScanner::spawn(system, tray_tx.clone());
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        GridManager {
            platform,
            config: Mutex::new(config),
            session: Mutex::new(None),
            reactor: Mutex::new(None),
            events_tx,
            events_rx,
            occupancy,
            tray_tx,
        }
    }

    fn system(&self) -> SystemManager {
        SystemManager {
            desktops: self.platform.desktops.clone(),
            windows: self.platform.windows.clone(),
        }
    }

    fn alert(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tray_tx {
            tx.send(tray::Event::Alert(message.into()));
        }
    }

    pub fn config(&self) -> Config { self.config.lock().clone() }

    #[instrument(name = "grid_manager::start", skip(self))]
    pub fn start(&self) -> Result<StartOutcome, StartError> {
        let mut session = self.session.lock();
        if session.is_some() {
            return Err(StartError::AlreadyRunning);
        }

        let config = self.config();
        let settings = &config.settings;
        let count = settings.desktop_count();
        if count == 0 || count > MAX_DESKTOPS {
            return Err(StartError::InvalidGrid {
                rows: settings.rows,
                columns: settings.columns,
            });
        }

        let mut hotkeys = HotkeyRegistrations::new(self.platform.hotkeys.clone());
        let table = hotkeys::bindings(&config.keys, count);

        let registry = match DesktopRegistry::initialize(&*self.platform.desktops, count) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("Starting without desktops: {e}");
                self.alert(format!("Virtual desktops are unavailable: {e}"));
                let table = table.into_iter().filter(|(_, action)| !action.needs_desktops()).collect();
                self.report_hotkey_failures(hotkeys.register_all(table));
                *session = Some(Session { hotkeys, degraded: Some(e.clone()) });
                return Ok(StartOutcome::Degraded(e));
            }
        };

        let mut reactor = Reactor::new(settings.clone(), registry, self.system());
        reactor.connect(CommunicationManager {
            occupancy: Some(self.occupancy.clone()),
            tray_tx: self.tray_tx.clone(),
        });
        {
            let mut slot = self.reactor.lock();
            let stale = self.events_rx.try_iter().count();
            if stale > 0 {
                debug!(stale, "Dropped notifications from before start");
            }
            *slot = Some(reactor);
        }

        self.report_hotkey_failures(hotkeys.register_all(table));
        *session = Some(Session { hotkeys, degraded: None });
        drop(session);

        self.with_reactor(|reactor| {
            info!(
                rows = reactor.grid().rows,
                columns = reactor.grid().columns,
                current = reactor.current(),
                "Started"
            );
            reactor.request_indicator_refresh();
        });
        Ok(StartOutcome::Running)
    }

    fn report_hotkey_failures(&self, failures: Vec<crate::sys::hotkey::HotkeyError>) {
        for failure in failures {
            self.alert(format!("Could not register hotkey: {failure}"));
        }
    }

    /// Unregisters the hotkeys, then drops the reactor under its lock, so a
    /// handler already running finishes first and later ones find nothing.
    #[instrument(name = "grid_manager::stop", skip(self))]
    pub fn stop(&self) {
        let mut session = self.session.lock();
        let Some(mut stopping) = session.take() else { return };
        stopping.hotkeys.unregister_all();

        let mut slot = self.reactor.lock();
        *slot = None;
        info!("Stopped");
    }

    pub fn restart(&self) -> Result<StartOutcome, StartError> {
        self.stop();
        self.start()
    }

    /// Swaps in new settings and restarts with them.
    pub fn reconfigure(&self, config: Config) -> Result<StartOutcome, StartError> {
        *self.config.lock() = config;
        self.restart()
    }

    pub fn is_running(&self) -> bool { self.reactor.lock().is_some() }

    pub fn is_degraded(&self) -> bool {
        self.session.lock().as_ref().is_some_and(|s| s.degraded.is_some())
    }

    pub fn on_foreground_changed(&self, window: WindowId) {
        self.post(Event::ForegroundChanged { window, at: Instant::now() });
    }

    pub fn on_desktop_changed(&self, desktop: DesktopId) { self.post(Event::DesktopChanged(desktop)); }

    fn post(&self, event: Event) {
        // The receiver lives as long as `self`.
        _ = self.events_tx.send(event);
        self.drain();
    }

    fn drain(&self) {
        loop {
            {
                let Some(mut slot) = self.reactor.try_lock() else {
                    trace!("Reactor busy, leaving notification queued");
                    return;
                };
                Self::process_queued(&self.events_rx, &mut slot);
            }
            if self.events_rx.is_empty() {
                return;
            }
        }
    }

    fn process_queued(events: &Receiver<Event>, slot: &mut Option<Reactor>) {
        for event in events.try_iter() {
            match slot.as_mut() {
                Some(reactor) => reactor.handle_event(event),
                None => trace!(?event, "Not running, dropping notification"),
            }
        }
    }

    /// Runs `f` inside the domain, after any queued notifications.
    fn with_reactor<T>(&self, f: impl FnOnce(&mut Reactor) -> T) -> Option<T> {
        let result = {
            let mut slot = self.reactor.lock();
            Self::process_queued(&self.events_rx, &mut slot);
            slot.as_mut().map(f)
        };
        self.drain();
        result
    }

    pub fn command(&self, command: Command) -> Result<(), CommandError> {
        self.with_reactor(|reactor| reactor.handle_command(command))
            .unwrap_or(Err(CommandError::NotRunning))
    }

    pub fn switch(&self, index: usize) -> Result<(), CommandError> {
        self.command(Command::Switch(Target::Index(index)))
    }

    pub fn switch_toward(&self, direction: Direction) -> Result<(), CommandError> {
        self.command(Command::Switch(Target::Neighbor(direction)))
    }

    /// Moves the foreground window to desktop `index` and follows it.
    pub fn move_foreground(&self, index: usize) -> Result<(), CommandError> {
        self.command(Command::Move(Target::Index(index)))
    }

    pub fn move_window(&self, window: Option<WindowId>, index: usize) -> Result<(), CommandError> {
        self.command(Command::MoveWindow(window, Target::Index(index)))
    }

    pub fn toggle_sticky(&self) -> Result<(), CommandError> {
        let window = self.platform.windows.foreground_window().ok_or(CommandError::NoForegroundWindow)?;
        debug!(%window, "Toggle sticky");
        Ok(self.platform.desktops.toggle_pinned(window)?)
    }

    pub fn toggle_always_on_top(&self) -> Result<(), CommandError> {
        let window = self.platform.windows.foreground_window().ok_or(CommandError::NoForegroundWindow)?;
        debug!(%window, "Toggle always on top");
        Ok(self.platform.windows.toggle_always_on_top(window)?)
    }

    /// Runs `action` and shows any failure to the user.
    pub fn perform(&self, action: Action) {
        let result = match action {
            Action::Switch(target) => self.command(Command::Switch(target)),
            Action::Move(target) => self.command(Command::Move(target)),
            Action::ToggleSticky => self.toggle_sticky(),
            Action::ToggleAlwaysOnTop => self.toggle_always_on_top(),
        };
        if let Err(e) = result {
            warn!(%action, "Hotkey action failed: {e}");
            self.alert(format!("Could not {action}: {e}"));
        }
    }

    #[instrument(name = "grid_manager::hotkey_pressed", skip(self))]
    pub fn hotkey_pressed(&self, hotkey: Hotkey) {
        let action = self.session.lock().as_ref().and_then(|s| s.hotkeys.action(hotkey));
        match action {
            Some(action) => self.perform(action),
            None => debug!(%hotkey, "No action bound"),
        }
    }

    /// Index of the current desktop; 0 while not running.
    pub fn current_index(&self) -> usize {
        self.with_reactor(|reactor| reactor.current()).unwrap_or(0)
    }

    pub fn desktop_count(&self) -> usize { self.config.lock().settings.desktop_count() }

    /// From the latest background scan; never waits for the reactor.
    pub fn is_occupied(&self, index: usize) -> bool { self.occupancy.is_occupied(index) }

    pub fn snapshot(&self) -> GridStateData {
        let now = Instant::now();
        let occupancy = self.occupancy.snapshot();
        if let Some(data) =
            self.with_reactor(|reactor| reactor.state_data(now, |index| occupancy.is_occupied(index)))
        {
            return data;
        }
        let settings = self.config.lock().settings.clone();
        let mut data = GridStateData::stopped(settings.rows, settings.columns, settings.wrap_around);
        data.degraded = self.is_degraded();
        data
    }
}

impl Drop for GridManager {
    fn drop(&mut self) { self.stop(); }
}
