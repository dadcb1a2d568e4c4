//! Per-connection dispatch: parse -> blocklist check -> GET or CONNECT.
//!
//! This is the state machine named in spec §1 ("the per-connection request
//! state machine"). Every path through `dispatch` ends by letting the
//! client socket drop (closing it), per spec §2's control-flow note.

pub mod connect;
pub mod get;

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::AtomicBool;

use crate::blocklist::BlockList;
use crate::cache::Cache;
use crate::proto::{self, Method};

const READ_BUF_SIZE: usize = 8192;

pub fn dispatch(mut socket: TcpStream, cache: &Cache, blocklist: &BlockList, shutdown: &AtomicBool) {
    let mut buf = [0u8; READ_BUF_SIZE];
    let request_buf = match read_request_head(&mut socket, &mut buf) {
        Some(slice) => slice,
        None => return,
    };

    let request = match proto::parse(request_buf) {
        Ok(request) => request,
        Err(err) => {
            log::error!("parse failure: {err}");
            return;
        }
    };

    if blocklist.is_blocked(&request.host) {
        log::info!("blocked host: {}", request.host);
        let _ = socket.write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    match request.method {
        Method::Get => get::handle(socket, &request, cache),
        Method::Connect => connect::handle(socket, &request, shutdown),
    }
}

/// Reads until a line terminator (`\n`) is seen or the buffer fills,
/// returning the bytes read so far. `proto::parse` only looks at the first
/// line, so this is intentionally crude — it exists to give the parser a
/// complete request line to work with even when the client trickles bytes.
fn read_request_head<'a>(socket: &mut TcpStream, buf: &'a mut [u8]) -> Option<&'a [u8]> {
    use std::io::Read;
    let mut filled = 0;
    loop {
        let n = match socket.read(&mut buf[filled..]) {
            Ok(0) => return if filled > 0 { Some(&buf[..filled]) } else { None },
            Ok(n) => n,
            Err(_) => return None,
        };
        filled += n;
        if contains_line_end(&buf[..filled]) || filled == buf.len() {
            return Some(&buf[..filled]);
        }
    }
}

fn contains_line_end(buf: &[u8]) -> bool {
    buf.contains(&b'\n')
}
