use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use campus_platform::AppPaths;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// Level for one CLI run: `--verbose` or `debug_logging` turn on debug output.
pub fn log_level(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Drop the oldest lines of `log_path` so that at most `max_log_size / 2`
/// bytes remain, cut at a line start.
fn shrink_log(log_path: &Path, max_log_size: u64) -> io::Result<()> {
    let contents = match std::fs::read(log_path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    let len = contents.len() as u64;
    if len <= max_log_size {
        return Ok(());
    }

    let keep = usize::try_from(max_log_size / 2).unwrap_or(usize::MAX);
    let tail = &contents[contents.len().saturating_sub(keep)..];
    let tail = match tail.iter().position(|&b| b == b'\n') {
        Some(newline) => &tail[newline + 1..],
        None => &[],
    };
    std::fs::write(log_path, tail)
}

fn open_log_file(log_path: &Path, max_log_size: u64) -> io::Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    shrink_log(log_path, max_log_size)?;
    OpenOptions::new().create(true).append(true).open(log_path)
}

/// Log to `debug.log` in the data directory and to stderr. Warnings and
/// errors always reach the terminal; everything at `level` goes to the file.
pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    let level = log_level(debug_enabled);
    let log_path = paths.log_file();
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("campus")
        .build();

    let terminal_level = if debug_enabled {
        level
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    match open_log_file(&log_path, max_log_size) {
        Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
        Err(error) => eprintln!(
            "warning: logging to {} disabled: {error}",
            log_path.display()
        ),
    }

    let _ = CombinedLogger::init(loggers);
    log::debug!("Logging to {} at {level}", log_path.display());
}
