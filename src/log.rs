//! The program logger.
//!
//! Messages are written to the console (warnings and errors to stderr, everything else to stdout)
//! and, when an output directory is given, to log files in that directory.
use anyhow::{Context, Result, bail};
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Level, LevelFilter};
use std::env;
use std::fmt::Arguments;
use std::io::{IsTerminal, stderr, stdout};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// The default log level for the program.
///
/// Used if no log level is given in the settings file or via the `GRIDPATH_LOG_LEVEL` environment
/// variable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for messages at info level and above
const LOG_INFO_FILE_NAME: &str = "gridpath.log";

/// Log file for all messages at debug level and above
const LOG_DEBUG_FILE_NAME: &str = "gridpath_debug.log";

/// Set once the logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level string, e.g. "warn"
pub(crate) fn parse_log_level(level: &str) -> Result<LevelFilter> {
    match LevelFilter::from_str(level) {
        Ok(level) => Ok(level),
        Err(_) => bail!(
            "Invalid log level: {level}. Valid options are: off, error, warn, info, debug, trace."
        ),
    }
}

/// Initialise the program logger.
///
/// The `GRIDPATH_LOG_LEVEL` environment variable takes precedence over the level from the
/// settings file. If a logger is already installed in this process (for example, when running
/// several commands from the test suite) it is left in place.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level given in the program settings
/// * `log_file_path` - Directory in which to write log files, if any
pub fn init(log_level_from_settings: &str, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = env::var("GRIDPATH_LOG_LEVEL")
        .unwrap_or_else(|_| log_level_from_settings.to_string());
    let log_level = parse_log_level(&log_level)?;

    if is_logger_initialised() {
        return Ok(());
    }

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour_stdout = stdout().is_terminal();
    let use_colour_stderr = stderr().is_terminal();

    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > Level::Warn)
                .format(move |out, message, record| {
                    write_log_line(out, message, colours, record.level(), use_colour_stdout);
                })
                .chain(stdout()),
        )
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() <= Level::Warn)
                .format(move |out, message, record| {
                    write_log_line(out, message, colours, record.level(), use_colour_stderr);
                })
                .chain(stderr()),
        );

    if let Some(log_file_path) = log_file_path {
        let info_path = log_file_path.join(LOG_INFO_FILE_NAME);
        let debug_path = log_file_path.join(LOG_DEBUG_FILE_NAME);
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .level(LevelFilter::Info)
                    .format(format_file_line)
                    .chain(fern::log_file(&info_path).with_context(|| {
                        format!("Could not create log file {}", info_path.display())
                    })?),
            )
            .chain(
                Dispatch::new()
                    .level(LevelFilter::Debug)
                    .format(format_file_line)
                    .chain(fern::log_file(&debug_path).with_context(|| {
                        format!("Could not create log file {}", debug_path.display())
                    })?),
            );
    }

    // Another thread may have won the race to install a logger
    if dispatch.level(log_level).apply().is_ok() {
        let _ = LOGGER_INIT.set(());
    }

    Ok(())
}

/// Write a console log line, with the level coloured if the output is a terminal
fn write_log_line(
    out: fern::FormatCallback,
    message: &Arguments,
    colours: ColoredLevelConfig,
    level: Level,
    use_colour: bool,
) {
    if use_colour {
        out.finish(format_args!(
            "[{} {}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            colours.color(level),
            message
        ));
    } else {
        out.finish(format_args!(
            "[{} {}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            level,
            message
        ));
    }
}

/// Format a line for the log files (never coloured)
fn format_file_line(out: fern::FormatCallback, message: &Arguments, record: &log::Record) {
    out.finish(format_args!(
        "[{} {} {}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target(),
        message
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("warn", LevelFilter::Warn)]
    #[case("DEBUG", LevelFilter::Debug)]
    #[case("trace", LevelFilter::Trace)]
    fn parse_log_level_valid(#[case] input: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test]
    fn parse_log_level_invalid() {
        assert!(parse_log_level("loud").is_err());
    }
}
