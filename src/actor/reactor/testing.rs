use std::sync::Arc;

use parking_lot::Mutex;

use super::SystemManager;
use crate::common::collections::HashSet;
use crate::sys::desktop::{DesktopError, DesktopId, DesktopProvider};
use crate::sys::hotkey::{Hotkey, HotkeyError, HotkeyProvider};
use crate::sys::window::{WindowError, WindowId, WindowProvider};

/// Host calls with side effects, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetForeground(WindowId),
    SwitchTo(usize),
    MoveWindow(WindowId, usize),
    RestoreZOrder(WindowId),
    TogglePinned(WindowId),
    ToggleAlwaysOnTop(WindowId),
}

#[derive(Debug, Clone)]
struct FakeWindow {
    id: WindowId,
    desktop: Option<DesktopId>,
    exe: String,
    title: String,
    class: String,
    minimized: bool,
}

type SwitchHook = Arc<dyn Fn(DesktopId) + Send + Sync>;

#[derive(Default)]
struct State {
    desktops: Vec<DesktopId>,
    next_desktop: u128,
    current: Option<DesktopId>,
    /// Top-most first.
    windows: Vec<FakeWindow>,
    next_window: u64,
    foreground: Option<WindowId>,
    unavailable: bool,
    failing_moves: usize,
    failing_switches: bool,
    focus_on_switch: Option<WindowId>,
    on_switch: Option<SwitchHook>,
    calls: Vec<Call>,
    registered: Vec<Hotkey>,
    rejected: HashSet<Hotkey>,
}

impl State {
    fn index_of(&self, desktop: DesktopId) -> usize {
        self.desktops.iter().position(|&d| d == desktop).unwrap_or(usize::MAX)
    }

    fn window_mut(&mut self, window: WindowId) -> Option<&mut FakeWindow> {
        self.windows.iter_mut().find(|w| w.id == window)
    }

    fn window(&self, window: WindowId) -> Option<&FakeWindow> {
        self.windows.iter().find(|w| w.id == window)
    }

    fn raise(&mut self, window: WindowId) {
        if let Some(pos) = self.windows.iter().position(|w| w.id == window) {
            let w = self.windows.remove(pos);
            self.windows.insert(0, w);
        }
    }
}

/// In-memory desktops, windows and hotkeys for driving the reactor and the
/// grid manager in tests.
#[derive(Default)]
pub struct FakeSystem {
    state: Mutex<State>,
}

impl FakeSystem {
    pub fn with_desktops(count: usize) -> FakeSystem {
        let system = FakeSystem::default();
        {
            let mut state = system.state.lock();
            for _ in 0..count {
                state.next_desktop += 1;
                let id = DesktopId::new(0x1000 + state.next_desktop);
                state.desktops.push(id);
            }
            state.current = state.desktops.first().copied();
            state.next_window = 0x100;
        }
        system
    }

    pub fn system_manager(self: &Arc<Self>) -> SystemManager {
        SystemManager {
            desktops: self.clone(),
            windows: self.clone(),
        }
    }

    pub fn desktop_ids(&self) -> Vec<DesktopId> { self.state.lock().desktops.clone() }

    pub fn desktop_id(&self, index: usize) -> DesktopId { self.state.lock().desktops[index] }

    pub fn current_index(&self) -> usize {
        let state = self.state.lock();
        state.current.map(|c| state.index_of(c)).unwrap_or(usize::MAX)
    }

    /// Shows desktop `index` without any notification, as if the user had
    /// switched before the manager started.
    pub fn show_desktop(&self, index: usize) {
        let mut state = self.state.lock();
        state.current = Some(state.desktops[index]);
    }

    pub fn set_unavailable(&self, unavailable: bool) { self.state.lock().unavailable = unavailable; }

    /// Opens a window on top of the z-order without focusing it.
    pub fn open_window(&self, desktop: usize, exe: &str, title: &str) -> WindowId {
        let mut state = self.state.lock();
        let desktop = Some(state.desktops[desktop]);
        Self::insert_window(&mut state, desktop, exe, title)
    }

    /// Opens a window that belongs to no desktop, like a taskbar.
    pub fn open_unscoped_window(&self, exe: &str, title: &str) -> WindowId {
        let mut state = self.state.lock();
        Self::insert_window(&mut state, None, exe, title)
    }

    fn insert_window(state: &mut State, desktop: Option<DesktopId>, exe: &str, title: &str) -> WindowId {
        state.next_window += 1;
        let id = WindowId::new(state.next_window).unwrap();
        state.windows.insert(
            0,
            FakeWindow {
                id,
                desktop,
                exe: exe.to_string(),
                title: title.to_string(),
                class: format!("{exe}-class"),
                minimized: false,
            },
        );
        id
    }

    pub fn close_window(&self, window: WindowId) {
        let mut state = self.state.lock();
        state.windows.retain(|w| w.id != window);
        if state.foreground == Some(window) {
            state.foreground = None;
        }
    }

    pub fn set_title(&self, window: WindowId, title: &str) {
        if let Some(w) = self.state.lock().window_mut(window) {
            w.title = title.to_string();
        }
    }

    pub fn set_class(&self, window: WindowId, class: &str) {
        if let Some(w) = self.state.lock().window_mut(window) {
            w.class = class.to_string();
        }
    }

    pub fn set_minimized(&self, window: WindowId, minimized: bool) {
        if let Some(w) = self.state.lock().window_mut(window) {
            w.minimized = minimized;
        }
    }

    /// Moves a window behind the host's back.
    pub fn place_window(&self, window: WindowId, desktop: usize) {
        let mut state = self.state.lock();
        let desktop = Some(state.desktops[desktop]);
        if let Some(w) = state.window_mut(window) {
            w.desktop = desktop;
        }
    }

    /// Gives `window` focus the way a user click would, without recording a
    /// call.
    pub fn focus(&self, window: Option<WindowId>) {
        let mut state = self.state.lock();
        state.foreground = window;
        if let Some(window) = window {
            state.raise(window);
        }
    }

    pub fn foreground(&self) -> Option<WindowId> { self.state.lock().foreground }

    pub fn desktop_index_of(&self, window: WindowId) -> Option<usize> {
        let state = self.state.lock();
        let desktop = state.window(window)?.desktop?;
        Some(state.index_of(desktop))
    }

    /// The next `count` window moves fail as if the host did not know the
    /// window yet.
    pub fn fail_next_moves(&self, count: usize) { self.state.lock().failing_moves = count; }

    pub fn fail_switches(&self, failing: bool) { self.state.lock().failing_switches = failing; }

    /// After every switch the host focuses `window`, like the shell picking
    /// an arbitrary window on the new desktop.
    pub fn focus_on_switch(&self, window: Option<WindowId>) {
        self.state.lock().focus_on_switch = window;
    }

    /// Runs `hook` synchronously from inside `switch_to`, after the switch.
    pub fn on_switch(&self, hook: impl Fn(DesktopId) + Send + Sync + 'static) {
        self.state.lock().on_switch = Some(Arc::new(hook));
    }

    pub fn calls(&self) -> Vec<Call> { self.state.lock().calls.clone() }

    pub fn take_calls(&self) -> Vec<Call> { std::mem::take(&mut self.state.lock().calls) }

    pub fn reject_hotkey(&self, hotkey: Hotkey) { self.state.lock().rejected.insert(hotkey); }

    pub fn registered_hotkeys(&self) -> Vec<Hotkey> { self.state.lock().registered.clone() }
}

impl DesktopProvider for FakeSystem {
    fn desktops(&self) -> Result<Vec<DesktopId>, DesktopError> {
        let state = self.state.lock();
        if state.unavailable {
            return Err(DesktopError::Unavailable("fake host offline".to_string()));
        }
        Ok(state.desktops.clone())
    }

    fn current_desktop(&self) -> Result<DesktopId, DesktopError> {
        let state = self.state.lock();
        if state.unavailable {
            return Err(DesktopError::Unavailable("fake host offline".to_string()));
        }
        state.current.ok_or_else(|| DesktopError::Failed("no current desktop".to_string()))
    }

    fn create_desktop(&self) -> Result<DesktopId, DesktopError> {
        let mut state = self.state.lock();
        state.next_desktop += 1;
        let id = DesktopId::new(0x1000 + state.next_desktop);
        state.desktops.push(id);
        Ok(id)
    }

    fn remove_desktop(&self, desktop: DesktopId, fallback: DesktopId) -> Result<(), DesktopError> {
        let mut state = self.state.lock();
        let before = state.desktops.len();
        state.desktops.retain(|&d| d != desktop);
        if state.desktops.len() == before {
            return Err(DesktopError::NotFound(desktop));
        }
        for window in state.windows.iter_mut().filter(|w| w.desktop == Some(desktop)) {
            window.desktop = Some(fallback);
        }
        if state.current == Some(desktop) {
            state.current = Some(fallback);
        }
        Ok(())
    }

    fn switch_to(&self, desktop: DesktopId) -> Result<(), DesktopError> {
        let hook = {
            let mut state = self.state.lock();
            if state.failing_switches {
                return Err(DesktopError::Failed("switch refused".to_string()));
            }
            if !state.desktops.contains(&desktop) {
                return Err(DesktopError::NotFound(desktop));
            }
            let index = state.index_of(desktop);
            state.calls.push(Call::SwitchTo(index));
            state.current = Some(desktop);
            if let Some(window) = state.focus_on_switch {
                state.foreground = Some(window);
            }
            state.on_switch.clone()
        };
        if let Some(hook) = hook {
            hook(desktop);
        }
        Ok(())
    }

    fn desktop_of_window(&self, window: WindowId) -> Option<DesktopId> {
        self.state.lock().window(window)?.desktop
    }

    fn move_window_to_desktop(&self, window: WindowId, desktop: DesktopId) -> Result<(), DesktopError> {
        let mut state = self.state.lock();
        if state.failing_moves > 0 {
            state.failing_moves -= 1;
            return Err(DesktopError::WindowNotFound(window));
        }
        let index = state.index_of(desktop);
        let Some(w) = state.window_mut(window) else {
            return Err(DesktopError::WindowNotFound(window));
        };
        w.desktop = Some(desktop);
        state.calls.push(Call::MoveWindow(window, index));
        Ok(())
    }

    fn toggle_pinned(&self, window: WindowId) -> Result<(), DesktopError> {
        let mut state = self.state.lock();
        if state.window(window).is_none() {
            return Err(DesktopError::WindowNotFound(window));
        }
        state.calls.push(Call::TogglePinned(window));
        Ok(())
    }
}

impl WindowProvider for FakeSystem {
    fn foreground_window(&self) -> Option<WindowId> { self.state.lock().foreground }

    fn set_foreground_window(&self, window: WindowId) -> Result<(), WindowError> {
        let mut state = self.state.lock();
        if state.window(window).is_none() {
            return Err(WindowError::Gone(window));
        }
        state.calls.push(Call::SetForeground(window));
        state.foreground = Some(window);
        state.raise(window);
        Ok(())
    }

    fn is_window(&self, window: WindowId) -> bool { self.state.lock().window(window).is_some() }

    fn window_title(&self, window: WindowId) -> String {
        self.state.lock().window(window).map(|w| w.title.clone()).unwrap_or_default()
    }

    fn window_class(&self, window: WindowId) -> Option<String> {
        self.state.lock().window(window).map(|w| w.class.clone())
    }

    fn owner_process_name(&self, window: WindowId) -> Option<String> {
        self.state.lock().window(window).map(|w| w.exe.clone())
    }

    fn is_minimized(&self, window: WindowId) -> bool {
        self.state.lock().window(window).is_some_and(|w| w.minimized)
    }

    fn restore_z_order(&self, window: WindowId) -> Result<(), WindowError> {
        let mut state = self.state.lock();
        if state.window(window).is_none() {
            return Err(WindowError::Gone(window));
        }
        state.calls.push(Call::RestoreZOrder(window));
        state.raise(window);
        Ok(())
    }

    fn enumerate_windows(&self, filter: &mut dyn FnMut(WindowId) -> bool) -> Vec<WindowId> {
        let ids: Vec<WindowId> = self.state.lock().windows.iter().map(|w| w.id).collect();
        // The filter may call back into the provider.
        ids.into_iter().filter(|&id| filter(id)).collect()
    }

    fn toggle_always_on_top(&self, window: WindowId) -> Result<(), WindowError> {
        let mut state = self.state.lock();
        if state.window(window).is_none() {
            return Err(WindowError::Gone(window));
        }
        state.calls.push(Call::ToggleAlwaysOnTop(window));
        Ok(())
    }
}

impl HotkeyProvider for FakeSystem {
    fn register(&self, hotkey: Hotkey) -> Result<(), HotkeyError> {
        let mut state = self.state.lock();
        if state.rejected.contains(&hotkey) || state.registered.contains(&hotkey) {
            return Err(HotkeyError::AlreadyTaken(hotkey));
        }
        state.registered.push(hotkey);
        Ok(())
    }

    fn unregister(&self, hotkey: Hotkey) { self.state.lock().registered.retain(|&h| h != hotkey); }
}
