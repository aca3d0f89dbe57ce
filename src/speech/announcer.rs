//! Running a TTS backend
//!
//! A backend is an opaque executable that takes the sentence to speak as its
//! only argument. We give it a bounded amount of time, record whatever it
//! prints in the debug trace, and never look at its exit code beyond
//! logging it.

use super::selector::SelectedBackend;
use crate::{NotifyError, Result};
use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

/// How long a backend may run before it is killed
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Something that can speak a sentence through a selected backend
///
/// Returns the backend's exit code (`None` if it was killed by a signal).
pub trait Announcer {
    fn speak(&mut self, backend: &SelectedBackend, text: &str) -> Result<Option<i32>>;
}

/// Runs backends as child processes
pub struct ProcessAnnouncer {
    timeout: Duration,
}

impl ProcessAnnouncer {
    pub fn new() -> Self {
        Self {
            timeout: BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Poll until the child exits or the deadline passes
    fn wait_bounded(&self, child: &mut Child, deadline: Instant) -> Result<Option<i32>> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.code());
            }
            if Instant::now() >= deadline {
                warn!("Backend still running after {:?}, killing it", self.timeout);
                if let Err(e) = child.kill() {
                    debug!("Failed to kill backend process: {}", e);
                }
                let _ = child.wait(); // Clean up zombie
                return Err(NotifyError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for ProcessAnnouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Announcer for ProcessAnnouncer {
    fn speak(&mut self, backend: &SelectedBackend, text: &str) -> Result<Option<i32>> {
        debug!(
            "Running {} backend: {} {:?}",
            backend.kind,
            backend.path.display(),
            text
        );

        let mut child = Command::new(&backend.path)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NotifyError::Spawn(format!("{}: {}", backend.path.display(), e)))?;

        // Process exit and pipe drain share one deadline
        let deadline = Instant::now() + self.timeout;

        // Drain pipes on their own threads so a chatty backend cannot block
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let result = self.wait_bounded(&mut child, deadline);
        if let Err(NotifyError::Timeout(_)) = result {
            // Grandchildren may still hold the pipes open; leave the readers detached
            return result;
        }

        // A backgrounded grandchild can keep the pipes open past the
        // backend's own exit; stop reading at the deadline
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);
        if !stdout.trim().is_empty() {
            debug!("Backend stdout:\n{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            debug!("Backend stderr:\n{}", stderr.trim_end());
        }

        let code = result?;
        debug!("Backend exited with code {:?}", code);
        Ok(code)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Wait for a reader until `deadline`; an unfinished reader is left detached
fn collect(rx: Option<Receiver<String>>, deadline: Instant) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(output) => output,
        Err(_) => {
            debug!("Backend output still open at deadline, not waiting for it");
            String::new()
        }
    }
}
