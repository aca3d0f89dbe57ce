//! Hook dispatcher
//!
//! One invocation handles one event: parse it, log it, then maybe speak.
//! Nothing in here returns an error to the caller. Every failure ends up
//! in the debug trace and in the [`DispatchReport`], and the hook still
//! exits successfully.

use crate::config::Settings;
use crate::event::{message_of, parse_event, Event};
use crate::event_log::EventLog;
use crate::policy::{build_message, should_announce};
use crate::speech::{
    select_backend, Announcer, BackendKind, Capabilities, Environment, ProcessAnnouncer,
};
use crate::{trace, NotifyError};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

/// Why no announcement was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `--notify` was not given
    NotRequested,
    /// The event carried the idle-wait sentinel
    IdleSentinel,
    /// No backend qualified
    NoBackend,
}

/// Result of the announcement step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnnounceOutcome {
    Sent {
        backend: BackendKind,
        exit_code: Option<i32>,
    },
    Skipped {
        reason: SkipReason,
    },
    TimedOut {
        backend: BackendKind,
    },
    Failed {
        backend: BackendKind,
        reason: String,
    },
}

/// What one dispatch did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Input parsed as a JSON object
    pub parsed: bool,
    /// Event written to the event log
    pub logged: bool,
    /// `None` when the input never parsed
    pub announcement: Option<AnnounceOutcome>,
}

impl DispatchReport {
    fn unparsed() -> Self {
        Self {
            parsed: false,
            logged: false,
            announcement: None,
        }
    }
}

/// Handles hook invocations
pub struct Dispatcher<A: Announcer> {
    log: EventLog,
    tts_dir: PathBuf,
    env: Environment,
    announcer: A,
    rng: StdRng,
}

impl Dispatcher<ProcessAnnouncer> {
    /// Dispatcher that runs real backend processes
    pub fn new(settings: &Settings, env: Environment) -> Self {
        Self::with_announcer(settings, env, ProcessAnnouncer::new(), StdRng::from_os_rng())
    }
}

impl<A: Announcer> Dispatcher<A> {
    pub fn with_announcer(settings: &Settings, env: Environment, announcer: A, rng: StdRng) -> Self {
        let log = EventLog::new(settings.event_log_path())
            .with_lock(settings.lock)
            .with_corrupt_backup(settings.backup_corrupt);
        Self {
            log,
            tts_dir: settings.tts_dir.clone(),
            env,
            announcer,
            rng,
        }
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    /// Read one event from `input` and handle it
    pub fn dispatch<R: Read>(&mut self, mut input: R, notify: bool) -> DispatchReport {
        let mut raw = String::new();
        if let Err(e) = input.read_to_string(&mut raw) {
            warn!("Failed to read hook input: {}", e);
            return DispatchReport::unparsed();
        }

        let event = match parse_event(&raw) {
            Ok(event) => event,
            Err(e) => {
                debug!("Ignoring unparsable hook input: {}", e);
                return DispatchReport::unparsed();
            }
        };
        trace::dump("Input data", &event);

        let logged = match self.log.append(&event) {
            Ok(prior) => {
                debug!("Event logged (prior log: {:?})", prior);
                true
            }
            Err(e) => {
                error!("Failed to write event log {}: {}", self.log.path().display(), e);
                false
            }
        };

        let announcement = if notify {
            self.announce(&event)
        } else {
            AnnounceOutcome::Skipped {
                reason: SkipReason::NotRequested,
            }
        };

        DispatchReport {
            parsed: true,
            logged,
            announcement: Some(announcement),
        }
    }

    fn announce(&mut self, event: &Event) -> AnnounceOutcome {
        if !should_announce(event, true) {
            debug!("Idle-wait message, not announcing: {:?}", message_of(event));
            return AnnounceOutcome::Skipped {
                reason: SkipReason::IdleSentinel,
            };
        }

        let caps = Capabilities::probe(&self.env, &self.tts_dir);
        let Some(backend) = select_backend(&self.tts_dir, &caps) else {
            info!("No TTS backend available, skipping announcement");
            return AnnounceOutcome::Skipped {
                reason: SkipReason::NoBackend,
            };
        };

        let text = build_message(self.env.engineer_name(), &mut self.rng);
        info!("Announcing via {}: {:?}", backend.kind, text);

        match self.announcer.speak(&backend, &text) {
            Ok(exit_code) => AnnounceOutcome::Sent {
                backend: backend.kind,
                exit_code,
            },
            Err(NotifyError::Timeout(limit)) => {
                warn!("{} backend timed out after {:?}", backend.kind, limit);
                AnnounceOutcome::TimedOut {
                    backend: backend.kind,
                }
            }
            Err(e) => {
                let category = match e {
                    NotifyError::Spawn(_) => "launch failure",
                    _ => "unexpected error",
                };
                error!("{} backend {}: {}", backend.kind, category, e);
                AnnounceOutcome::Failed {
                    backend: backend.kind,
                    reason: e.to_string(),
                }
            }
        }
    }
}
