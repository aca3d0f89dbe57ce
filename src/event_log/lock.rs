//! Locking around the event log read-modify-write

use crate::{NotifyError, Result};
use log::debug;
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How concurrent hook invocations are kept from losing each other's events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrategy {
    /// No locking: last writer wins
    None,
    /// Exclusive `flock` on a sidecar `.lock` file
    Advisory,
}

impl FromStr for LockStrategy {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(LockStrategy::None),
            "advisory" | "flock" => Ok(LockStrategy::Advisory),
            other => Err(NotifyError::Config(format!(
                "unknown lock strategy {:?} (expected none or advisory)",
                other
            ))),
        }
    }
}

/// Held lock; released on drop
pub struct LogGuard {
    flock: Option<Flock<File>>,
}

impl LogGuard {
    /// Whether an advisory lock is actually held
    pub fn is_locked(&self) -> bool {
        self.flock.is_some()
    }
}

impl LockStrategy {
    /// Acquire the lock for `log_path`, blocking until it is free
    pub fn acquire(self, log_path: &Path) -> Result<LogGuard> {
        match self {
            LockStrategy::None => Ok(LogGuard { flock: None }),
            LockStrategy::Advisory => {
                let lock_path = lock_path(log_path);
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .write(true)
                    .open(&lock_path)?;
                let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
                    NotifyError::Lock(format!("flock {}: {}", lock_path.display(), errno))
                })?;
                debug!("Acquired lock {}", lock_path.display());
                Ok(LogGuard {
                    flock: Some(flock),
                })
            }
        }
    }
}

/// Sidecar lock path: `notification.json` -> `notification.json.lock`
fn lock_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    log_path.with_file_name(name)
}
