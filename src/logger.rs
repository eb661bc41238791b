use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

// Uses 'log' to allow for logging
// The level for specific modules can be capped below the global maximum
// Logging is done by logging the level, target and the given arguments
// Output goes to stderr, stdout is reserved for the listing
struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level()
            <= match metadata.target() {
                "gcra_lib::backend::machine::lattice" => Level::Debug,
                "gcra_lib::backend::machine::tables" => Level::Debug,
                _ => Level::Trace,
            }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let output = format!(
                "{} - {} - {}",
                record.level(),
                record.target(),
                record.args()
            );

            match record.level() {
                Level::Error => eprintln!("{}", output.red()),
                Level::Warn => eprintln!("{}", output.purple()),
                Level::Info => eprintln!("{}", output.blue()),
                _ => eprintln!("{}", output),
            }
        }
    }

    fn flush(&self) {}
}

/// Maps the number of `-v` flags to a maximum level.
pub fn level(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

// Initializes 'log' with the custom logger
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(max_level))
}
static LOGGER: SimpleLogger = SimpleLogger;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level(0), LevelFilter::Warn);
        assert_eq!(level(1), LevelFilter::Info);
        assert_eq!(level(2), LevelFilter::Debug);
        assert_eq!(level(7), LevelFilter::Trace);
    }
}
