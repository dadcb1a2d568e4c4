//! Fixed worker pool (component D).
//!
//! N long-lived threads, each looping `dequeue` -> handle -> close. Workers
//! never share per-request buffers — every iteration allocates its own, so
//! there is nothing to reset between connections. Thread naming follows the
//! `chopin-worker-{i}` convention used elsewhere in this pack's thread-pool
//! code, purely so panics and log lines are attributable to a worker.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::blocklist::BlockList;
use crate::cache::Cache;
use crate::queue::TaskQueue;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        count: usize,
        queue: Arc<TaskQueue>,
        cache: Arc<Cache>,
        blocklist: Arc<BlockList>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let mut handles = Vec::with_capacity(count);
        for id in 0..count {
            let queue = queue.clone();
            let cache = cache.clone();
            let blocklist = blocklist.clone();
            let shutdown = shutdown.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(id, &queue, &cache, &blocklist, &shutdown))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }
        Self { handles }
    }

    pub fn join_all(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    id: usize,
    queue: &TaskQueue,
    cache: &Cache,
    blocklist: &BlockList,
    shutdown: &AtomicBool,
) {
    log::info!("worker-{id} started");
    while let Some(socket) = queue.dequeue() {
        crate::handler::dispatch(socket, cache, blocklist, shutdown);
    }
    log::info!("worker-{id} exiting");
}
