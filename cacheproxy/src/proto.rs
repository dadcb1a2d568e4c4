//! Request-line parsing (component A).
//!
//! Scope is deliberately narrow: only the first line of the client buffer is
//! ever inspected. No header parsing, no body handling — see spec.md Non-goals.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Connect,
}

/// A parsed proxy-style request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub version: String,
    pub host: String,
    pub port: Option<String>,
    /// Always begins with `/`; only meaningful for GET.
    pub path: String,
}

/// Parses the request line out of `buf`. Never mutates the caller's buffer.
///
/// `buf` must contain at least 4 bytes (the spec's stated minimum) and a
/// request line terminated by `\n` (with or without a preceding `\r`).
pub fn parse(buf: &[u8]) -> Result<Request> {
    if buf.len() < 4 {
        return Err(Error::parse("buffer shorter than minimum request line"));
    }

    let line_end = find_line_end(buf).ok_or_else(|| Error::parse("no CRLF/LF in buffer"))?;
    let line = std::str::from_utf8(&buf[..line_end])
        .map_err(|_| Error::parse("request line is not valid UTF-8"))?;

    let mut tokens = line.split_whitespace();
    let method_tok = tokens.next().ok_or_else(|| Error::parse("missing method"))?;
    let uri = tokens.next().ok_or_else(|| Error::parse("missing URI"))?;
    let version = tokens
        .next()
        .ok_or_else(|| Error::parse("missing version"))?
        .to_string();

    match method_tok {
        "CONNECT" => parse_connect(uri, version),
        "GET" => parse_get(uri, version),
        _ => Err(Error::parse(format!("unsupported method: {method_tok}"))),
    }
}

fn find_line_end(buf: &[u8]) -> Option<usize> {
    for (i, &b) in buf.iter().enumerate() {
        if b == b'\n' {
            return Some(if i > 0 && buf[i - 1] == b'\r' { i - 1 } else { i });
        }
    }
    None
}

fn parse_connect(uri: &str, version: String) -> Result<Request> {
    let colon = uri
        .find(':')
        .ok_or_else(|| Error::parse("CONNECT URI missing port"))?;
    let host = &uri[..colon];
    let port = &uri[colon + 1..];
    if host.is_empty() {
        return Err(Error::parse("CONNECT host is empty"));
    }
    Ok(Request {
        method: Method::Connect,
        version,
        host: host.to_string(),
        port: Some(port.to_string()),
        path: String::new(),
    })
}

fn parse_get(uri: &str, version: String) -> Result<Request> {
    // Skip past "scheme://" if present; otherwise the URI is already
    // origin-style (authority[/path]).
    let after_scheme = match uri.find("://") {
        Some(pos) => &uri[pos + 3..],
        None => uri,
    };

    let (authority, path) = match after_scheme.find('/') {
        Some(slash) => (&after_scheme[..slash], &after_scheme[slash..]),
        None => (after_scheme, "/"),
    };

    let (host, port) = match authority.find(':') {
        Some(colon) => (
            &authority[..colon],
            Some(authority[colon + 1..].to_string()),
        ),
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(Error::parse("GET host is empty"));
    }

    Ok(Request {
        method: Method::Get,
        version,
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_with_scheme_and_path() {
        let req = parse(b"GET http://example.com/index HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, None);
        assert_eq!(req.path, "/index");
        assert_eq!(req.version, "HTTP/1.0");
    }

    #[test]
    fn get_with_scheme_no_path_defaults_to_root() {
        let req = parse(b"GET http://example.com HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.path, "/");
    }

    #[test]
    fn get_origin_style_without_scheme() {
        let req = parse(b"GET example.com:8080/a/b HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, Some("8080".to_string()));
        assert_eq!(req.path, "/a/b");
    }

    #[test]
    fn connect_host_and_port() {
        let req = parse(b"CONNECT secure.test:443 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Connect);
        assert_eq!(req.host, "secure.test");
        assert_eq!(req.port, Some("443".to_string()));
    }

    #[test]
    fn connect_without_port_fails() {
        let err = parse(b"CONNECT secure.test HTTP/1.1\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn missing_crlf_fails() {
        let err = parse(b"GET http://example.com/ HTTP/1.0").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn unsupported_method_fails() {
        let err = parse(b"POST http://example.com/ HTTP/1.0\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn round_trip_on_valid_inputs() {
        let original = parse(b"GET http://example.com:81/a HTTP/1.1\r\n\r\n").unwrap();
        let reserialized = format!(
            "GET {}://{}{}{} {}\r\n\r\n",
            "http",
            original.host,
            original
                .port
                .as_ref()
                .map(|p| format!(":{p}"))
                .unwrap_or_default(),
            original.path,
            original.version
        );
        let reparsed = parse(reserialized.as_bytes()).unwrap();
        assert_eq!(original, reparsed);
    }
}
