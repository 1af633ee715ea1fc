//! Application entry point behind the binary.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::signal::install_handler;

/// Run one invocation and return the exit code it should end with.
///
/// The report goes to stdout only once the whole run has succeeded.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a root is missing, strict
/// traversal fails, a file cannot be compared, or the run is interrupted.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(&cli).context("Failed to load configuration")?;
    log::debug!("Effective settings: {:?}", settings);

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let handler = install_handler()?;
    let progress = Arc::new(Progress::new(!cli.show_progress()));

    let config = FinderConfig::default()
        .with_walker_config(settings.walker_config())
        .with_resolver_config(settings.resolver_config())
        .with_strict(cli.strict)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let finder = DuplicateFinder::new(config);
    let (groups, summary) = finder.find_duplicates_in_paths(&cli.paths)?;

    let exit_code = if summary.has_warnings() {
        log::warn!("{} path(s) could not be scanned", summary.scan_errors.len());
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups).write_to(&mut out)?,
        OutputFormat::Json => {
            JsonOutput::new(&groups, &summary, exit_code).write_to(&mut out, true)?;
        }
        OutputFormat::Csv => CsvOutput::new(&groups).write_to(&mut out)?,
    }
    out.flush()?;

    log::info!(
        "{} duplicate group(s), {} duplicate file(s), {} reclaimable in {:.2?}",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.scan_duration
    );

    Ok(exit_code)
}
