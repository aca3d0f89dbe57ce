//! Debug trace
//!
//! Diagnostic output for post-hoc troubleshooting. Every `log` record is
//! appended to a plain text file, one `[timestamp] LEVEL message` line per
//! record. Nothing in the hook ever reads this file back.

use crate::Result;
use log::LevelFilter;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Install the global logger, writing to the debug trace at `path`
///
/// `RUST_LOG` overrides `level` when set. If the trace file cannot be
/// opened, logging is switched off entirely so the calling agent never sees
/// output on stderr; the open failure is still returned.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    match open_trace(path) {
        Ok(file) => {
            builder(level)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
            Ok(())
        }
        Err(e) => {
            silent().init();
            Err(e)
        }
    }
}

fn open_trace(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

fn builder(level: LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {:<5} {}",
            chrono::Local::now().to_rfc3339(),
            record.level(),
            record.args()
        )
    });
    builder
}

fn silent() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Off);
    builder
}

/// Log a label followed by an indented JSON dump of `value`
pub fn dump<T: Serialize + ?Sized>(label: &str, value: &T) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => log::debug!("{}:\n{}", label, indent(&json)),
        Err(e) => log::debug!("{}: <unserializable: {}>", label, e),
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
