//! Library-level error type.
//!
//! Mirrors the hand-rolled `Error` enum in `httpclient::error` — a small enum
//! with manual `Display`/`std::error::Error` impls rather than a derive
//! macro, since this crate otherwise only leans on `anyhow` at the `run()`
//! boundary (see `server::run`).

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Parse(String),
    Dns(String),
    Connect(String),
}

impl Error {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    pub fn dns<S: Into<String>>(msg: S) -> Self {
        Self::Dns(msg.into())
    }

    pub fn connect<S: Into<String>>(msg: S) -> Self {
        Self::Connect(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(msg) => write!(f, "[Parse] {msg}"),
            Error::Dns(msg) => write!(f, "[DNS] {msg}"),
            Error::Connect(msg) => write!(f, "[Connect] {msg}"),
        }
    }
}

impl std::error::Error for Error {}
