//! agent-notify - Notification hook for autonomous coding agents
//!
//! Records every lifecycle event the agent hands over on stdin into a JSON
//! event log and, when asked, speaks a short alert through the best
//! available text-to-speech backend.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod event_log;
pub mod policy;
pub mod speech;
pub mod trace;

pub use error::{NotifyError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "agent-notify";
