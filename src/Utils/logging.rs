//! Logger set-up for binaries and examples. The library itself only emits
//! records through the `log` macros.
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;

/// Installs a terminal logger and, when `log_file` is given, a second logger
/// writing the same records to that file.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), String> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create log file '{}': {}", path, e))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    CombinedLogger::init(loggers).map_err(|e| format!("Logger already initialised: {}", e))
}
