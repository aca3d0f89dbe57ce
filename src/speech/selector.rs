//! Backend selection
//!
//! Backends are tried in a fixed priority order. A cloud backend qualifies
//! only when its API key is set and its script is on disk; the local
//! backend needs just the script. Selection itself is a pure function of a
//! [`Capabilities`] snapshot, so it can be tested without touching the real
//! environment.

use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Known TTS backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    ElevenLabs,
    OpenAi,
    Pyttsx3,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::ElevenLabs => "ElevenLabs",
            BackendKind::OpenAi => "OpenAI",
            BackendKind::Pyttsx3 => "pyttsx3",
        };
        f.write_str(name)
    }
}

/// One entry of the priority list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    /// Environment variable holding the API key, if one is required
    pub credential: Option<&'static str>,
    /// Executable file name inside the TTS directory
    pub script: &'static str,
}

/// Backends in priority order: premium cloud, standard cloud, local
pub const BACKENDS: [BackendDescriptor; 3] = [
    BackendDescriptor {
        kind: BackendKind::ElevenLabs,
        credential: Some("ELEVENLABS_API_KEY"),
        script: "elevenlabs_tts.py",
    },
    BackendDescriptor {
        kind: BackendKind::OpenAi,
        credential: Some("OPENAI_API_KEY"),
        script: "openai_tts.py",
    },
    BackendDescriptor {
        kind: BackendKind::Pyttsx3,
        credential: None,
        script: "pyttsx3_tts.py",
    },
];

/// Environment variable holding the operator's display name
pub const ENGINEER_NAME_VAR: &str = "ENGINEER_NAME";

/// The slice of process environment the hook cares about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    credentials: HashMap<String, String>,
    engineer_name: Option<String>,
}

impl Environment {
    /// Snapshot the credential variables and `ENGINEER_NAME`
    pub fn from_env() -> Self {
        let mut env = Self::default();
        for var in BACKENDS.iter().filter_map(|b| b.credential) {
            if let Ok(value) = std::env::var(var) {
                env = env.with_credential(var, value);
            }
        }
        if let Ok(name) = std::env::var(ENGINEER_NAME_VAR) {
            env = env.with_engineer_name(name);
        }
        env
    }

    /// Record a credential; empty values count as absent
    pub fn with_credential(mut self, var: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            self.credentials.remove(var);
        } else {
            self.credentials.insert(var.to_string(), value);
        }
        self
    }

    /// Record the operator name; trimmed, and blank counts as unset
    pub fn with_engineer_name(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        self.engineer_name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn has_credential(&self, var: &str) -> bool {
        self.credentials.contains_key(var)
    }

    pub fn engineer_name(&self) -> Option<&str> {
        self.engineer_name.as_deref()
    }
}

/// Which credentials are set and which backend executables exist
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    credentials: HashSet<String>,
    executables: HashSet<PathBuf>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the filesystem for every known backend under `tts_dir`
    pub fn probe(env: &Environment, tts_dir: &Path) -> Self {
        let mut caps = Self::new();
        for backend in &BACKENDS {
            if let Some(var) = backend.credential {
                if env.has_credential(var) {
                    caps = caps.with_credential(var);
                }
            }
            let path = tts_dir.join(backend.script);
            if path.exists() {
                caps = caps.with_executable(path);
            }
        }
        caps
    }

    pub fn with_credential(mut self, var: impl Into<String>) -> Self {
        self.credentials.insert(var.into());
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(path.into());
        self
    }

    fn has_credential(&self, var: &str) -> bool {
        self.credentials.contains(var)
    }

    fn has_executable(&self, path: &Path) -> bool {
        self.executables.contains(path)
    }
}

/// The backend chosen for this announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBackend {
    pub kind: BackendKind,
    pub path: PathBuf,
}

/// Pick the highest-priority qualifying backend from [`BACKENDS`]
pub fn select_backend(tts_dir: &Path, caps: &Capabilities) -> Option<SelectedBackend> {
    select_from(&BACKENDS, tts_dir, caps)
}

/// Pick the first qualifying backend from `backends`
///
/// `None` means nothing qualified; callers skip the announcement.
pub fn select_from(
    backends: &[BackendDescriptor],
    tts_dir: &Path,
    caps: &Capabilities,
) -> Option<SelectedBackend> {
    for backend in backends {
        if let Some(var) = backend.credential {
            if !caps.has_credential(var) {
                debug!("{}: {} not set, skipping", backend.kind, var);
                continue;
            }
            debug!("{}: {} found", backend.kind, var);
        }

        let path = tts_dir.join(backend.script);
        if !caps.has_executable(&path) {
            debug!("{}: {} not found, skipping", backend.kind, path.display());
            continue;
        }

        debug!("Selected {} backend at {}", backend.kind, path.display());
        return Some(SelectedBackend {
            kind: backend.kind,
            path,
        });
    }

    debug!("No TTS backend available");
    None
}
