//! Logging bootstrap
//!
//! TTY sessions route log lines through the shared [`MultiProgress`] so
//! they do not tear active progress bars; non-TTY output gets plain
//! `[LEVEL]` prefix lines for log aggregation.

use std::io::Write;

use indicatif::MultiProgress;

/// Logger that suspends progress bars around each line.
///
/// Formatting is delegated to the wrapped `env_logger`, which already
/// handles level colors and filtering.
struct SuspendingLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl log::Log for SuspendingLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.multi.suspend(|| self.inner.log(record));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize the global logger.
///
/// Level defaults: `debug` wins over `quiet`; otherwise `info`. `RUST_LOG`
/// overrides all of them. Pass `multi` in TTY mode to keep log lines and
/// progress bars from interleaving.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let env = env_logger::Env::default().default_filter_or(default_level);

    match multi {
        Some(multi) => {
            let inner = env_logger::Builder::from_env(env)
                .format_timestamp_millis()
                .build();
            let max_level = inner.filter();
            log::set_boxed_logger(Box::new(SuspendingLogger {
                inner,
                multi: multi.clone(),
            }))
            .expect("failed to init logger");
            log::set_max_level(max_level);
        }
        None => {
            env_logger::Builder::from_env(env)
                .format(|buf, record| writeln!(buf, "[{:<5}] {}", record.level(), record.args()))
                .init();
        }
    }
}
