use std::io::Write;

use crossterm::style::{Color, Stylize};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Info records sent to this target print as `[SUCCESS]`.
pub const SUCCESS_TARGET: &str = "success";

static LOGGER: ConsoleLogger = ConsoleLogger;

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (label, color) = level_style(record.level(), record.target());
        println!("{} {}", format!("[{label}]").with(color), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Installs the console logger. Debug records only show with `debug` set.
pub fn init(debug: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

fn level_style(level: Level, target: &str) -> (&'static str, Color) {
    match level {
        Level::Error => ("ERROR", Color::Red),
        Level::Warn => ("WARN", Color::Yellow),
        Level::Info if target == SUCCESS_TARGET => ("SUCCESS", Color::Green),
        Level::Info => ("INFO", Color::Cyan),
        Level::Debug | Level::Trace => ("DEBUG", Color::Magenta),
    }
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        ::log::info!(target: $crate::logging::SUCCESS_TARGET, $($arg)+)
    };
}
