use crate::DebugconSink;
use core::fmt::{self, Write};
use kernel_sync::SyncOnceCell;
use log::{LevelFilter, Log, Metadata, Record};

/// Callback receiving every formatted chunk alongside the debug console.
pub type Mirror = fn(&str);

/// [`log::Log`] backend writing to the QEMU debug console.
pub struct QemuLogger {
    max_level: LevelFilter,
    mirror: Option<Mirror>,
}

/// Why [`QemuLogger::init`] did not install the logger.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LoggerInitError {
    #[error("a QEMU logger is already installed")]
    AlreadyInstalled,
    #[error("another logger was registered with the log facade")]
    Registration,
}

static LOGGER: SyncOnceCell<QemuLogger> = SyncOnceCell::new();

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            mirror: None,
        }
    }

    /// Also hand every formatted chunk to `mirror`.
    #[must_use]
    pub const fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Install as the global logger. Call once during early init.
    ///
    /// # Errors
    /// Fails if a logger is already installed.
    pub fn init(self) -> Result<(), LoggerInitError> {
        let max_level = self.max_level;
        LOGGER
            .set(self)
            .map_err(|_| LoggerInitError::AlreadyInstalled)?;
        let logger = LOGGER.get().ok_or(LoggerInitError::AlreadyInstalled)?;
        log::set_logger(logger).map_err(|_| LoggerInitError::Registration)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// Format `record` the way the logger emits it: `"[LEVEL] target: message\n"`.
///
/// # Errors
/// Propagates errors from `out`.
pub fn write_record(out: &mut impl Write, record: &Record) -> fmt::Result {
    writeln!(out, "[{}] {}: {}", record.level(), record.target(), record.args())
}

struct Tee {
    mirror: Option<Mirror>,
}

impl Write for Tee {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        DebugconSink.write_str(s)?;
        if let Some(mirror) = self.mirror {
            mirror(s);
        }
        Ok(())
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = write_record(
            &mut Tee {
                mirror: self.mirror,
            },
            record,
        );
    }

    fn flush(&self) {}
}
