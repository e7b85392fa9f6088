use std::io::Write;
use std::sync::Mutex;

use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::record::LogEntry;
use crate::standard::{Formatter, Standard};

/// Writes one formatted line per entry to a destination.
///
/// The logger does no filtering and no buffering of its own; every call to
/// [`Logger::log`] formats the entry and writes the whole line at once.
pub struct Logger<W> {
    formatter: Box<dyn Formatter>,
    writer: Mutex<W>,
}

impl<W: Write> Logger<W> {
    pub fn new(formatter: Box<dyn Formatter>, writer: W) -> Self {
        Logger { formatter, writer: Mutex::new(writer) }
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    /// Format `entry` and write it.
    ///
    /// **Returns**
    /// - `Ok(())` once the line was written.
    /// - `Err(..)` if formatting failed (nothing is written) or the
    ///   destination reported an I/O error.
    pub fn log(&self, entry: &LogEntry) -> Result<(), FormatError> {
        let line = self.formatter.format(entry)?;
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(&line)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Create a logger for `standard` writing to `writer`, with the default
/// formatter configuration.
pub fn new_logger<W: Write>(standard: Standard, writer: W) -> Logger<W> {
    new_logger_with(standard, FormatterConfig::default(), writer)
}

pub fn new_logger_with<W: Write>(standard: Standard, config: FormatterConfig, writer: W) -> Logger<W> {
    Logger::new(standard.formatter_with(config), writer)
}
