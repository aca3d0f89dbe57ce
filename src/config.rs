//! Configuration management
//!
//! Settings come from an optional INI file (`~/.agent-notify.cfg`, or the
//! path in `AGENT_NOTIFY_CONFIG`). The file is never created; when it is
//! absent every setting takes its default.

use crate::event_log::LockStrategy;
use crate::{NotifyError, Result};
use ini::Ini;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "AGENT_NOTIFY_CONFIG";

const SECTION: &str = "notify";
const EVENT_LOG_FILE: &str = "notification.json";
const DEBUG_LOG_FILE: &str = "notification_debug.log";

/// Hook settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the event log and the debug trace
    pub log_dir: PathBuf,

    /// Directory holding the TTS backend executables
    pub tts_dir: PathBuf,

    /// Locking used around the event log read-modify-write
    pub lock: LockStrategy,

    /// Keep a corrupted event log under a side path instead of discarding it
    pub backup_corrupt: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            tts_dir: default_tts_dir(),
            lock: LockStrategy::Advisory,
            backup_corrupt: true,
        }
    }
}

impl Settings {
    /// Load settings from the configured path, or defaults if it is absent
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific INI file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading config from {:?}", path);
        let ini = Ini::load_from_file(path)
            .map_err(|e| NotifyError::IniParse(format!("Failed to load config: {}", e)))?;
        Ok(Self::from_ini(&ini))
    }

    /// Build settings from parsed INI, falling back to defaults per key
    pub fn from_ini(ini: &Ini) -> Self {
        let mut settings = Self::default();
        let Some(section) = ini.section(Some(SECTION)) else {
            return settings;
        };

        if let Some(dir) = section.get("log_dir").filter(|v| !v.trim().is_empty()) {
            settings.log_dir = PathBuf::from(dir.trim());
        }

        if let Some(dir) = section.get("tts_dir").filter(|v| !v.trim().is_empty()) {
            settings.tts_dir = PathBuf::from(dir.trim());
        }

        if let Some(lock) = section.get("lock") {
            match lock.trim().parse() {
                Ok(strategy) => settings.lock = strategy,
                Err(e) => warn!("Ignoring lock setting: {}", e),
            }
        }

        if let Some(flag) = section.get("backup_corrupt") {
            match flag.trim().parse() {
                Ok(value) => settings.backup_corrupt = value,
                Err(_) => warn!("Ignoring backup_corrupt setting: {:?} is not a bool", flag),
            }
        }

        settings
    }

    /// Path of the JSON event log
    pub fn event_log_path(&self) -> PathBuf {
        self.log_dir.join(EVENT_LOG_FILE)
    }

    /// Path of the debug trace
    pub fn debug_log_path(&self) -> PathBuf {
        self.log_dir.join(DEBUG_LOG_FILE)
    }
}

/// Resolve the config file location
///
/// `AGENT_NOTIFY_CONFIG` wins; otherwise `~/.agent-notify.cfg`.
fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".agent-notify.cfg"))
}

/// `utils/tts` beside the running executable, or relative to the working
/// directory if the executable path is unknown
fn default_tts_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join("utils")
        .join("tts")
}
