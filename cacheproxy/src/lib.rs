//! Caching forward HTTP/1.x proxy: thread-per-connection worker pool over a
//! shared arena-backed LRU cache.
//!
//! `main.rs` is a thin shell around [`run`]; everything else lives here so
//! the end-to-end test in `tests/` can drive the same entry point the binary
//! uses.

pub mod blocklist;
pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod logsink;
pub mod proto;
pub mod queue;
pub mod server;
pub mod worker;

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Default on-disk locations, relative to the current working directory,
/// matching the loader conventions in [`config`] and [`blocklist`].
pub struct Paths {
    pub config: PathBuf,
    pub blocklist: PathBuf,
    pub log_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            config: PathBuf::from("cacheproxy.conf"),
            blocklist: PathBuf::from("blocklist.txt"),
            log_file: PathBuf::from("proxy.log"),
        }
    }
}

/// Runs the proxy to completion (blocks until a shutdown signal is observed).
pub fn run(paths: &Paths) -> Result<()> {
    server::run(server::Paths {
        config: paths.config.as_path(),
        blocklist: paths.blocklist.as_path(),
        log_file: paths.log_file.as_path(),
    })
}

pub fn run_at(config: &Path, blocklist: &Path, log_file: &Path) -> Result<()> {
    server::run(server::Paths {
        config,
        blocklist,
        log_file,
    })
}
