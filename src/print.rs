//! Logger that prints every record of the allocator to stderr.

use std::io::Write;

struct Logger;

impl log::Log for Logger {
    #[allow(unused_variables)]
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        #[cfg(any(debug_assertions, feature = "logging"))]
        return true;
        #[cfg(all(not(debug_assertions), not(feature = "logging")))]
        return metadata.level() <= log::Level::Info;
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            let mod_path = record
                .module_path_static()
                .or_else(|| record.module_path())
                .unwrap_or("<n/a>");

            // a closed stderr is not worth aborting for
            let _ = writeln!(
                std::io::stderr(),
                "[ {:>5} ] [{}] {}",
                record.level(),
                mod_path,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

pub fn init_logging() -> Result<(), log::SetLoggerError> {
    log::set_logger(&Logger)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
