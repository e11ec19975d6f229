//! Logging setup for the command-line tool
//!
//! The library only emits `tracing` events; installing a subscriber is
//! left to the binary. `RUST_LOG` wins over the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Map a config/CLI level name (`INFO`, `debug`, `WARN`...) to a filter directive
pub fn level_directive(level: Option<&str>) -> &'static str {
    match level.map(|l| l.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => "trace",
        Some("DEBUG") => "debug",
        Some("WARN") | Some("WARNING") => "warn",
        Some("ERROR") => "error",
        _ => "info",
    }
}

/// Install a global subscriber logging to stdout and, optionally, a file
///
/// A log file that cannot be opened is reported on stderr and skipped.
pub fn init_tracing(
    level: Option<&str>,
    logfile: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let file = logfile.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Could not open log file '{}': {}", path.display(), e);
                None
            }
        }
    });

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(Some("INFO")), "info");
        assert_eq!(level_directive(Some("debug")), "debug");
        assert_eq!(level_directive(Some("WARN")), "warn");
        assert_eq!(level_directive(Some("ERROR")), "error");
        assert_eq!(level_directive(Some("bogus")), "info");
        assert_eq!(level_directive(None), "info");
    }
}
