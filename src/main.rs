//! notify-hook entry point
//!
//! Reads one JSON event from stdin, appends it to the event log and, with
//! `--notify`, speaks a short alert. Always exits 0: a notification hook
//! must never make the agent think a step failed.

use agent_notify::config::Settings;
use agent_notify::dispatch::Dispatcher;
use agent_notify::speech::Environment;
use anyhow::Context;
use log::{debug, error, info, warn};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::process;

fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let notify = args.iter().any(|arg| arg == "--notify");

    // Settings decide where the debug trace goes, so load them before logging
    let (settings, settings_err) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    // Without a trace file logging is off; there is nowhere quiet to report it
    let _ = agent_notify::trace::init(&settings.debug_log_path(), log::LevelFilter::Debug);
    if let Some(e) = settings_err {
        warn!("Using default settings: {}", e);
    }

    info!(
        "{} {} invoked (notify: {})",
        agent_notify::APP_NAME,
        agent_notify::VERSION,
        notify
    );

    // Keep panics out of stderr; they are reported in the trace instead
    panic::set_hook(Box::new(|info| error!("Panic: {}", info)));

    match panic::catch_unwind(AssertUnwindSafe(|| run(&settings, notify))) {
        Ok(Ok(())) => debug!("Done"),
        Ok(Err(e)) => error!("Hook failed: {:#}", e),
        Err(_) => error!("Hook aborted by panic"),
    }

    process::exit(0);
}

fn run(settings: &Settings, notify: bool) -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring .env: {}", e),
    }

    let env = Environment::from_env();
    let mut dispatcher = Dispatcher::new(settings, env);

    let stdin = io::stdin();
    let report = dispatcher.dispatch(stdin.lock(), notify);
    if !report.parsed {
        return Ok(());
    }

    let outcome = serde_json::to_string(&report).context("serializing dispatch report")?;
    info!("Dispatch complete: {}", outcome);
    Ok(())
}
