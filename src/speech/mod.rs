//! Speech output: picking a TTS backend and running it

pub mod announcer;
pub mod selector;

pub use announcer::{Announcer, ProcessAnnouncer, BACKEND_TIMEOUT};
pub use selector::{
    select_backend, BackendKind, Capabilities, Environment, SelectedBackend, BACKENDS,
};
