//! GET handler (component E): cache lookup, origin fetch, cache populate.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::cache::Cache;
use crate::error::Error;
use crate::proto::Request;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

pub fn handle(mut client: TcpStream, request: &Request, cache: &Cache) {
    if request.host.is_empty() || request.path.is_empty() {
        log::error!("GET request missing host or path");
        return;
    }

    let cache_key = format!("{}{}", request.host, request.path);

    if let Some(handle) = cache.get(&cache_key) {
        // best effort: a short write from a client-side error just ends the handler
        let _ = client.write_all(handle.bytes());
        return;
    }

    let port: u16 = request
        .port
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(80);

    let mut origin = match connect_origin(&request.host, port) {
        Ok(stream) => stream,
        Err(err) => {
            log::error!("{err} ({}:{port})", request.host);
            return;
        }
    };

    let rewritten = format!(
        "GET {} {}\r\nHost: {}\r\nConnection: close\r\n\r\n",
        request.path, request.version, request.host
    );
    if origin.write_all(rewritten.as_bytes()).is_err() {
        log::error!("failed to send rewritten request to origin");
        return;
    }

    let ceiling = cache.element_ceiling() as usize;
    let mut chunk = vec![0u8; ceiling.max(1)];
    let mut accumulated: Vec<u8> = Vec::new();
    let mut total_read: u64 = 0;

    loop {
        let n = match origin.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                log::error!("origin read error: {err}");
                break;
            }
        };

        if client.write_all(&chunk[..n]).is_err() {
            // short/failed client write: terminate without touching the cache
            return;
        }

        total_read += n as u64;

        if accumulated.len() < ceiling {
            let room = ceiling - accumulated.len();
            accumulated.extend_from_slice(&chunk[..n.min(room)]);
        }
    }

    // gate on the true total read from the origin, not the (possibly
    // truncated) accumulation buffer — a response larger than the ceiling is
    // streamed through in full but must never be cached.
    if total_read > 0 && total_read <= cache.element_ceiling() {
        cache.put(&cache_key, &accumulated);
    }
}

fn connect_origin(host: &str, port: u16) -> crate::error::Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::dns(e.to_string()))?
        .next()
        .ok_or_else(|| Error::dns(format!("no address found for {host}:{port}")))?;
    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| Error::connect(e.to_string()))?;
    stream
        .set_read_timeout(Some(IO_TIMEOUT))
        .map_err(|e| Error::connect(e.to_string()))?;
    stream
        .set_write_timeout(Some(IO_TIMEOUT))
        .map_err(|e| Error::connect(e.to_string()))?;
    Ok(stream)
}
