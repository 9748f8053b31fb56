//! Response definitions
//!
//! Represents responses to clients.

use std::net::SocketAddr;

/// Response status digits (ASCII)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Error = b'0',
    Found = b'1',
    NotFound = b'4',
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `1/<conversion>\n`
    Found(String),

    /// `4<reading> \n` (echoes the reading, not a conversion)
    NotFound(String),

    /// `0\n`
    Error,

    /// `<name>/<version> `
    Version(String),

    /// `<ip>:<port>: `
    Host(SocketAddr),
}

impl Response {
    /// Create a FOUND response
    pub fn found(conversion: impl Into<String>) -> Self {
        Response::Found(conversion.into())
    }

    /// Create a NOT_FOUND response echoing `reading`
    pub fn not_found(reading: impl Into<String>) -> Self {
        Response::NotFound(reading.into())
    }

    /// Create the VERSION response for this build
    pub fn version() -> Self {
        Response::Version(format!("{}/{}", crate::SERVER_NAME, crate::VERSION))
    }

    /// Status digit, for the responses that carry one
    pub fn status(&self) -> Option<Status> {
        match self {
            Response::Found(_) => Some(Status::Found),
            Response::NotFound(_) => Some(Status::NotFound),
            Response::Error => Some(Status::Error),
            Response::Version(_) | Response::Host(_) => None,
        }
    }
}
