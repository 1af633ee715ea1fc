//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG` (if set)
//! 2. `-q` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Info
//!
//! Everything goes to stderr so the duplicate report on stdout stays clean.
//! Debug builds prefix each line with a timestamp; verbose runs also show the
//! module path.
//!
//! ```rust,no_run
//! use finddups::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Install the global logger.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);
    match from_env {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    match from_env {
        Some(spec) => log::debug!("Logging configured from RUST_LOG={}", spec),
        None => log::debug!("Logging at level {}", current_level_name()),
    }
}

/// Level implied by the verbosity flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    let with_module = verbose >= 1;
    let with_timestamp = cfg!(debug_assertions);

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if with_timestamp {
            write!(buf, "{} ", buf.timestamp_seconds())?;
        }
        write!(buf, "{style}{:<5}{style:#} ", level)?;
        if with_module {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}

/// Name of the most verbose level currently enabled.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
