//! Acceptor and process lifecycle (component G).
//!
//! Startup/teardown ordering follows spec §4.G. This is the synchronous
//! counterpart of `httproxy::run`/`rproxy::run` in the sibling crates: those
//! install an async ctrlc2 handler and hand a `GracefulShutdown` gate to a
//! smol-spawned accept loop; here the same shape — signal handler flips a
//! flag, the accept loop and the queue both observe it — is built on
//! `std::thread` and a plain `AtomicBool` instead.

use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::blocklist::BlockList;
use crate::cache::Cache;
use crate::config::Config;
use crate::logsink::LogSink;
use crate::queue::TaskQueue;
use crate::worker::WorkerPool;

const QUEUE_CAPACITY: usize = 100;
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Paths<'a> {
    pub config: &'a Path,
    pub blocklist: &'a Path,
    pub log_file: &'a Path,
}

pub fn run(paths: Paths) -> Result<()> {
    let shutdown = install_signal_handler();

    let config = Config::load(paths.config);
    let blocklist = Arc::new(BlockList::load(paths.blocklist));

    let sink = LogSink::open(paths.log_file).context("failed to open log file")?;
    sink.install().context("failed to install log sink")?;

    log::info!(
        "starting cacheproxy on port {} with {} workers",
        config.port,
        config.threads
    );

    let cache = Arc::new(Cache::new(
        config.cache_capacity_bytes,
        config.element_ceiling_bytes,
    ));
    let queue = Arc::new(TaskQueue::new(QUEUE_CAPACITY));

    let pool = WorkerPool::spawn(
        config.threads,
        queue.clone(),
        cache.clone(),
        blocklist.clone(),
        shutdown.clone(),
    );

    let listener = bind_listener(config.port)?;
    accept_loop(&listener, &queue, &shutdown);

    log::info!("shutdown requested: draining queue and joining workers");
    queue.close();
    pool.join_all();
    drop(listener);

    log::info!("shutdown complete");
    Ok(())
}

fn install_signal_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    // SIGPIPE is ignored by the Rust runtime by default, so a write to a
    // closed client socket surfaces as an `io::Error` rather than killing
    // the process; only SIGINT/SIGTERM need an explicit handler here.
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Release);
    })
    .expect("failed to install SIGINT/SIGTERM handler");
    shutdown
}

fn bind_listener(port: u16) -> Result<TcpListener> {
    let listener =
        TcpListener::bind(("0.0.0.0", port)).with_context(|| format!("failed to bind port {port}"))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

fn accept_loop(listener: &TcpListener, queue: &TaskQueue, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            break;
        }
        match listener.accept() {
            Ok((socket, _addr)) => {
                let _ = socket.set_nonblocking(false);
                queue.enqueue(socket);
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(err) => {
                log::error!("accept failed: {err}");
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}
