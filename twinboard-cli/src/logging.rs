//! Logger setup.

use std::fs;
use std::fs::File;

use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::paths;

/// Installs the global logger.
///
/// Everything goes to the rotated log file. With `console` set, records at
/// `level` are mirrored to stderr as well.
pub fn init(level: LevelFilter, console: bool) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    paths::rotate_logs();
    if let Some(path) = paths::log_file() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match File::create(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("Failed to create log file {}: {}", path.display(), e),
        }
    }

    if console {
        loggers.push(TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Logger was already initialized");
    }
}
