//! Stderr logger behind the `log` facade.
//!
//! Lines look like `2024-06-01 10:00:00.123 INFO [file_index::scan] message`.
//! The level comes from `FILE_INDEX_LOG` (`error`, `warn`, `info`, `debug`,
//! `trace`; `off` silences everything) and defaults to `info`.

use std::sync::OnceLock;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "FILE_INDEX_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    fn format(&self, record: &Record<'_>) -> String {
        format!(
            "{} {} [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", self.format(record));
        }
    }

    fn flush(&self) {}
}

/// Parse a level name; unknown or missing values give the default.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.trim().parse::<LevelFilter>().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Install the logger with the level from [`LOG_LEVEL_ENV`].
pub fn init() -> Result<(), SetLoggerError> {
    let env = std::env::var(LOG_LEVEL_ENV).ok();
    init_with_level(level_from(env.as_deref()))
}

/// Install the logger at `level`. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), SetLoggerError> {
    static LOGGER: OnceLock<Logger> = OnceLock::new();

    // set_max_level must only run for the call that actually installed the
    // logger, otherwise the two can disagree.
    let init_call = LOGGER.get().is_none();
    let logger = LOGGER.get_or_init(|| Logger { level });

    if init_call {
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(level_from(None), LevelFilter::Info);
        assert_eq!(level_from(Some("loud")), LevelFilter::Info);
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(level_from(Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from(Some("WARN")), LevelFilter::Warn);
        assert_eq!(level_from(Some(" off ")), LevelFilter::Off);
    }

    #[test]
    fn enabled_respects_level() {
        let logger = Logger {
            level: LevelFilter::Warn,
        };
        let warn = Metadata::builder().level(Level::Warn).build();
        let info = Metadata::builder().level(Level::Info).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&info));
    }

    #[test]
    fn off_disables_everything() {
        let logger = Logger {
            level: LevelFilter::Off,
        };
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!logger.enabled(&error));
    }

    #[test]
    fn line_has_level_and_target() {
        let logger = Logger {
            level: LevelFilter::Info,
        };
        let line = logger.format(
            &Record::builder()
                .level(Level::Info)
                .target("file_index::scan")
                .args(format_args!("wrote 3 records"))
                .build(),
        );
        assert!(line.ends_with("INFO [file_index::scan] wrote 3 records"));
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_with_level(LevelFilter::Error).unwrap();
        init_with_level(LevelFilter::Trace).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Error);
    }

    #[test]
    fn init_error_propagates_as_boxed_error() -> Result<(), Box<dyn std::error::Error>> {
        init_with_level(LevelFilter::Error)?;
        Ok(())
    }
}
