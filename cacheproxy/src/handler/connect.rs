//! CONNECT tunnel handler (component F): opaque bidirectional splice.
//!
//! Both sockets are switched to non-blocking mode and polled in a single
//! loop, client side first then origin side, so that "when both are ready,
//! both transfers happen in the same iteration" (spec §4.F) holds without
//! needing a raw `poll`/`epoll` dependency. An idle iteration sleeps briefly
//! before looping again — the loop's approximation of the 60s readiness
//! timeout that "does not cancel the tunnel, it just re-enters the wait."

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::proto::Request;

const BUF_SIZE: usize = 8 * 1024;
const IDLE_SLEEP: Duration = Duration::from_millis(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn handle(mut client: TcpStream, request: &Request, shutdown: &AtomicBool) {
    let port: u16 = request
        .port
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(443);

    let mut origin = match connect_origin(&request.host, port) {
        Ok(stream) => stream,
        Err(err) => {
            log::error!("{err} ({}:{port})", request.host);
            return;
        }
    };

    if client
        .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
        .is_err()
    {
        return;
    }

    if client.set_nonblocking(true).is_err() || origin.set_nonblocking(true).is_err() {
        log::error!("failed to switch tunnel sockets to non-blocking mode");
        return;
    }

    let mut buf = [0u8; BUF_SIZE];
    let mut last_activity = Instant::now();

    loop {
        if shutdown.load(Ordering::Acquire) {
            log::info!("tunnel closed: shutdown observed");
            break;
        }

        let mut made_progress = false;

        match forward(&mut client, &mut origin, &mut buf) {
            Forward::Progress => made_progress = true,
            Forward::Closed | Forward::Error => break,
            Forward::WouldBlock => {}
        }

        match forward(&mut origin, &mut client, &mut buf) {
            Forward::Progress => made_progress = true,
            Forward::Closed | Forward::Error => break,
            Forward::WouldBlock => {}
        }

        if made_progress {
            last_activity = Instant::now();
        } else if last_activity.elapsed() >= IDLE_TIMEOUT {
            // timeout does not tear the tunnel down, just re-enter the wait
            last_activity = Instant::now();
        } else {
            std::thread::sleep(IDLE_SLEEP);
        }
    }

    log::info!("tunnel closed for {}", request.host);
}

enum Forward {
    Progress,
    WouldBlock,
    Closed,
    Error,
}

fn forward(from: &mut TcpStream, to: &mut TcpStream, buf: &mut [u8]) -> Forward {
    match from.read(buf) {
        Ok(0) => Forward::Closed,
        Ok(n) => {
            if to.write_all(&buf[..n]).is_err() {
                Forward::Error
            } else {
                Forward::Progress
            }
        }
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Forward::WouldBlock,
        Err(_) => Forward::Error,
    }
}

fn connect_origin(host: &str, port: u16) -> crate::error::Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::dns(e.to_string()))?
        .next()
        .ok_or_else(|| Error::dns(format!("no address found for {host}:{port}")))?;
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| Error::connect(e.to_string()))
}
