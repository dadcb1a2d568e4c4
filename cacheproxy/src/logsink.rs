//! Timestamped, level-tagged, mutex-serialized log sink (component I).
//!
//! `httproxy`/`rproxy` in this workspace install `fern` as their `log`
//! backend; this crate installs its own `log::Log` implementation instead,
//! because spec §4.I pins an exact line format and a single mutex guarding
//! the full write+flush region — guarantees a general dispatcher doesn't
//! make explicit. Every other module still just calls `log::info!` etc., so
//! all components share this one sink transparently through the facade.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct LogSink {
    file: Mutex<File>,
}

impl LogSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Installs `self` as the global `log` backend. Call once at startup.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(LevelFilter::Trace);
        log::set_boxed_logger(Box::new(self))
    }

    fn write_line(&self, tag: &str, line: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self.file.lock().unwrap();
        // single mutex guards the full write+flush region (spec §4.I, §5)
        let _ = writeln!(file, "[{stamp}] [{tag}] {line}");
        let _ = file.flush();
    }
}

/// INFO/WARN/ERROR/DEBUG map straight onto `log::Level`. FATAL has no
/// counterpart in that enum, so callers log it as `log::error!(target:
/// "fatal", ...)`; `Log::log` below recognizes that target and overrides
/// the printed tag.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug | Level::Trace => "DEBUG",
    }
}

impl Log for LogSink {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let tag = if record.target() == "fatal" {
            "FATAL"
        } else {
            level_tag(record.level())
        };
        self.write_line(tag, &format!("{}", record.args()));
    }

    fn flush(&self) {
        let _ = self.file.lock().unwrap().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_expected_line_format() {
        let dir = std::env::temp_dir().join(format!("cacheproxy-logsink-test-{}", std::process::id()));
        let sink = LogSink::open(&dir).unwrap();
        sink.write_line("WARN", "disk nearly full");

        let mut contents = String::new();
        File::open(&dir).unwrap().read_to_string(&mut contents).unwrap();
        assert!(contents.contains("[WARN] disk nearly full"));
        assert!(contents.ends_with('\n'));
        std::fs::remove_file(&dir).ok();
    }
}
