//! Restarts the grid manager when the config file changes on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tracing::{debug, error, info, warn};

use crate::actor::grid_manager::{GridManager, StartOutcome};
use crate::common::config::Config;

const DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
pub enum Reload {
    /// The file parsed to the configuration already in use.
    Unchanged,
    Applied(StartOutcome),
}

pub struct ConfigWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ConfigWatcher {
    /// Watches the directory holding `path`, since editors often replace the
    /// file instead of writing it in place.
    pub fn spawn(path: PathBuf, manager: Weak<GridManager>) -> anyhow::Result<ConfigWatcher> {
        let file_name: OsString =
            path.file_name().context("config path has no file name")?.to_os_string();
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let watched = path.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    warn!("Config watcher error: {e}");
                    return;
                }
            };
            if !events.iter().any(|event| event.path.file_name() == Some(file_name.as_os_str())) {
                return;
            }
            let Some(manager) = manager.upgrade() else { return };
            if !manager.config().settings.hot_reload {
                debug!("Config changed on disk but hot_reload is off");
                return;
            }
            match reload(&watched, &manager) {
                Ok(Reload::Unchanged) => debug!("Config file touched but unchanged"),
                Ok(Reload::Applied(outcome)) => info!(?outcome, "Reloaded config"),
                Err(e) => error!("Keeping the previous config: {e:#}"),
            }
        })
        .context("failed to create config watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;
        info!(path = %path.display(), "Watching config file");

        Ok(ConfigWatcher { _debouncer: debouncer })
    }
}

/// Watches `path` on behalf of `manager` if its configuration has
/// `hot_reload` set.
///
/// A reload that turns `hot_reload` off leaves the watcher in place but
/// idle; later edits are ignored until the next launch.
pub fn watch(path: PathBuf, manager: &Arc<GridManager>) -> anyhow::Result<Option<ConfigWatcher>> {
    if !manager.config().settings.hot_reload {
        info!(path = %path.display(), "Config hot reload is off");
        return Ok(None);
    }
    ConfigWatcher::spawn(path, Arc::downgrade(manager)).map(Some)
}

/// Reads `path` and hands the result to `manager` if it differs from the
/// configuration in use.
pub fn reload(path: &Path, manager: &GridManager) -> anyhow::Result<Reload> {
    let mut config = Config::read(path)?;
    for issue in config.validate() {
        warn!("{issue}");
    }
    let fixed = config.auto_fix_values();
    if fixed > 0 {
        warn!(fixed, "Replaced invalid config values with defaults");
    }

    if config == manager.config() {
        return Ok(Reload::Unchanged);
    }
    let outcome = manager.reconfigure(config)?;
    Ok(Reload::Applied(outcome))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor::grid_manager::Platform;
    use crate::actor::reactor::testing::FakeSystem;

    fn manager(fake: &Arc<FakeSystem>) -> GridManager {
        manager_with(fake, Config::parse(Config::default_toml()).unwrap())
    }

    fn manager_with(fake: &Arc<FakeSystem>, config: Config) -> GridManager {
        let platform = Platform {
            desktops: fake.clone(),
            windows: fake.clone(),
            hotkeys: fake.clone(),
        };
        GridManager::new(platform, config, None)
    }

    #[test]
    fn reload_applies_changed_grid() {
        let fake = Arc::new(FakeSystem::with_desktops(9));
        let manager = manager(&fake);
        manager.start().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\nrows = 2\ncolumns = 2\n").unwrap();

        assert_eq!(reload(&path, &manager).unwrap(), Reload::Applied(StartOutcome::Running));
        assert_eq!(manager.desktop_count(), 4);
        assert_eq!(fake.desktop_ids().len(), 4);

        assert_eq!(reload(&path, &manager).unwrap(), Reload::Unchanged);
    }

    #[test]
    fn broken_file_keeps_running_config() {
        let fake = Arc::new(FakeSystem::with_desktops(9));
        let manager = manager(&fake);
        manager.start().unwrap();
        let before = manager.config();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\nrows = \"three\"\n").unwrap();

        assert!(reload(&path, &manager).is_err());
        assert_eq!(manager.config(), before);
        assert!(manager.is_running());
    }

    #[test]
    fn watcher_needs_a_file_name() {
        let fake = Arc::new(FakeSystem::with_desktops(1));
        let manager = Arc::new(manager(&fake));
        assert!(ConfigWatcher::spawn(PathBuf::from("/"), Arc::downgrade(&manager)).is_err());
    }

    #[test]
    fn watch_follows_hot_reload_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, Config::default_toml()).unwrap();
        let fake = Arc::new(FakeSystem::with_desktops(9));

        let mut config = Config::parse(Config::default_toml()).unwrap();
        config.settings.hot_reload = false;
        let quiet = Arc::new(manager_with(&fake, config));
        assert!(watch(path.clone(), &quiet).unwrap().is_none());

        let watched = Arc::new(manager(&fake));
        assert!(watched.config().settings.hot_reload);
        assert!(watch(path, &watched).unwrap().is_some());
    }
}
