use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sys::hotkey::{Hotkey, Modifiers};

pub const MAX_DESKTOPS: usize = 64;

/// Extra retry time allowed on top of the detect timeout when moving a new
/// window back to its source desktop; the host needs a moment before a fresh
/// window can be moved at all.
const RELOCATION_RETRY_GRACE: Duration = Duration::from_millis(300);

pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("gridswitch")
}

pub fn config_file() -> PathBuf { config_dir().join("config.toml") }

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    settings: Settings,
    #[serde(default)]
    keys: KeySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: Settings,
    pub keys: KeyBindings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "yes")]
    pub wrap_around: bool,
    /// Executable names (case-insensitive) whose newly opened windows are
    /// moved back to the desktop they were opened from.
    #[serde(default)]
    pub move_on_new_window_exe_names: Vec<String>,
    #[serde(default = "default_detect_timeout_ms")]
    pub move_on_new_window_detect_timeout_ms: u64,
    #[serde(default = "default_relocation_retry_interval_ms")]
    pub relocation_retry_interval_ms: u64,
    /// Regex matching the transient title of a window that is still opening.
    /// The `title` capture group is compared to the title of the window that
    /// triggered the relocation.
    #[serde(default = "default_placeholder_title_pattern")]
    pub placeholder_title_pattern: String,
    #[serde(default = "default_browser_settle_ms")]
    pub browser_settle_ms: u64,
    #[serde(default = "yes")]
    pub hot_reload: bool,
    #[serde(default)]
    pub browser: Option<BrowserSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct BrowserSettings {
    pub exe_name: String,
    pub class_name: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumberKeys {
    #[default]
    Digits,
    FunctionKeys,
    /// Keypad keys laid out like the grid: 7-8-9 is the top row.
    Numpad,
    None,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
struct KeySettings {
    #[serde(default = "default_switch_modifiers")]
    switch_modifiers: String,
    #[serde(default = "default_move_modifiers")]
    move_modifiers: String,
    #[serde(default)]
    numbers: NumberKeys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sticky_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    always_on_top: Option<String>,
}

impl Default for KeySettings {
    fn default() -> Self {
        KeySettings {
            switch_modifiers: default_switch_modifiers(),
            move_modifiers: default_move_modifiers(),
            numbers: NumberKeys::default(),
            sticky_window: None,
            always_on_top: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub switch_modifiers: Modifiers,
    pub move_modifiers: Modifiers,
    pub numbers: NumberKeys,
    pub sticky_window: Option<Hotkey>,
    pub always_on_top: Option<Hotkey>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            switch_modifiers: Modifiers::CTRL | Modifiers::ALT,
            move_modifiers: Modifiers::CTRL | Modifiers::ALT | Modifiers::SHIFT,
            numbers: NumberKeys::Digits,
            sticky_window: None,
            always_on_top: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rows: default_rows(),
            columns: default_columns(),
            wrap_around: true,
            move_on_new_window_exe_names: Vec::new(),
            move_on_new_window_detect_timeout_ms: default_detect_timeout_ms(),
            relocation_retry_interval_ms: default_relocation_retry_interval_ms(),
            placeholder_title_pattern: default_placeholder_title_pattern(),
            browser_settle_ms: default_browser_settle_ms(),
            hot_reload: true,
            browser: None,
        }
    }
}

impl Settings {
    pub fn desktop_count(&self) -> usize { self.rows * self.columns }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_millis(self.move_on_new_window_detect_timeout_ms)
    }

    pub fn relocation_retry_interval(&self) -> Duration {
        Duration::from_millis(self.relocation_retry_interval_ms.max(1))
    }

    pub fn relocation_retry_budget(&self) -> Duration {
        self.detect_timeout() + RELOCATION_RETRY_GRACE
    }

    pub fn browser_settle(&self) -> Duration { Duration::from_millis(self.browser_settle_ms) }

    pub fn is_relocation_trigger(&self, exe_name: &str) -> bool {
        self.move_on_new_window_exe_names.iter().any(|name| name.eq_ignore_ascii_case(exe_name))
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.rows == 0 {
            issues.push("rows must be at least 1".to_string());
        }
        if self.columns == 0 {
            issues.push("columns must be at least 1".to_string());
        }
        if self.rows.saturating_mul(self.columns) > MAX_DESKTOPS {
            issues.push(format!(
                "rows * columns must not exceed {} desktops (got {})",
                MAX_DESKTOPS,
                self.rows.saturating_mul(self.columns)
            ));
        }
        if self.move_on_new_window_detect_timeout_ms == 0 {
            issues.push("move_on_new_window_detect_timeout_ms must be positive".to_string());
        }
        if self.relocation_retry_interval_ms == 0 {
            issues.push("relocation_retry_interval_ms must be positive".to_string());
        }
        if self.move_on_new_window_exe_names.iter().any(|name| name.trim().is_empty()) {
            issues.push("move_on_new_window_exe_names must not contain empty names".to_string());
        }

        match Regex::new(&self.placeholder_title_pattern) {
            Ok(re) if re.capture_names().flatten().any(|name| name == "title") => {}
            Ok(_) => issues.push(
                "placeholder_title_pattern must have a named capture group 'title'".to_string(),
            ),
            Err(e) => issues.push(format!("placeholder_title_pattern is not a valid regex: {e}")),
        }

        if let Some(browser) = &self.browser {
            if browser.exe_name.trim().is_empty() {
                issues.push("browser.exe_name must not be empty".to_string());
            }
            if browser.class_name.trim().is_empty() {
                issues.push("browser.class_name must not be empty".to_string());
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.rows == 0 || self.columns == 0 || self.desktop_count() > MAX_DESKTOPS {
            self.rows = default_rows();
            self.columns = default_columns();
            fixes += 1;
        }
        if self.move_on_new_window_detect_timeout_ms == 0 {
            self.move_on_new_window_detect_timeout_ms = default_detect_timeout_ms();
            fixes += 1;
        }
        if self.relocation_retry_interval_ms == 0 {
            self.relocation_retry_interval_ms = default_relocation_retry_interval_ms();
            fixes += 1;
        }
        let before = self.move_on_new_window_exe_names.len();
        self.move_on_new_window_exe_names.retain(|name| !name.trim().is_empty());
        if self.move_on_new_window_exe_names.len() != before {
            fixes += 1;
        }

        fixes
    }
}

impl KeyBindings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.switch_modifiers == self.move_modifiers {
            issues.push("switch_modifiers and move_modifiers must differ".to_string());
        }
        if self.switch_modifiers.is_empty() {
            issues.push("switch_modifiers must contain at least one modifier".to_string());
        }
        if self.move_modifiers.is_empty() {
            issues.push("move_modifiers must contain at least one modifier".to_string());
        }
        issues
    }

    fn to_file(&self) -> KeySettings {
        KeySettings {
            switch_modifiers: self.switch_modifiers.to_string(),
            move_modifiers: self.move_modifiers.to_string(),
            numbers: self.numbers,
            sticky_window: self.sticky_window.map(|h| h.to_string()),
            always_on_top: self.always_on_top.map(|h| h.to_string()),
        }
    }

    fn from_file(keys: KeySettings) -> anyhow::Result<KeyBindings> {
        let parse_hotkey = |spec: Option<String>| -> anyhow::Result<Option<Hotkey>> {
            spec.map(|s| s.parse::<Hotkey>().with_context(|| format!("Could not parse hotkey: {s}")))
                .transpose()
        };
        Ok(KeyBindings {
            switch_modifiers: keys
                .switch_modifiers
                .parse()
                .with_context(|| format!("Could not parse modifiers: {}", keys.switch_modifiers))?,
            move_modifiers: keys
                .move_modifiers
                .parse()
                .with_context(|| format!("Could not parse modifiers: {}", keys.move_modifiers))?,
            numbers: keys.numbers,
            sticky_window: parse_hotkey(keys.sticky_window)?,
            always_on_top: parse_hotkey(keys.always_on_top)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settings: Settings::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, falling back to the built-in defaults.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Self::parse(Self::default_toml()) }
    }

    pub fn default_toml() -> &'static str { include_str!("../../gridswitch.default.toml") }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();
        issues.extend(self.keys.validate());
        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        let file = ConfigFile {
            settings: self.settings.clone(),
            keys: self.keys.to_file(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: ConfigFile = toml::from_str(buf)?;
        if c.settings.rows == 0 || c.settings.columns == 0 {
            bail!("The desktop grid needs at least one row and one column");
        }
        Ok(Config {
            settings: c.settings,
            keys: KeyBindings::from_file(c.keys)?,
        })
    }
}

fn yes() -> bool { true }

fn default_rows() -> usize { 3 }

fn default_columns() -> usize { 3 }

fn default_detect_timeout_ms() -> u64 { 2000 }

fn default_relocation_retry_interval_ms() -> u64 { 100 }

fn default_browser_settle_ms() -> u64 { 50 }

fn default_placeholder_title_pattern() -> String { "^Opening - (?P<title>.*)$".to_string() }

fn default_switch_modifiers() -> String { "Ctrl + Alt".to_string() }

fn default_move_modifiers() -> String { "Ctrl + Alt + Shift".to_string() }
