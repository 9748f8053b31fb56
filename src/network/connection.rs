//! Connection Handler
//!
//! Serves exactly one command on an accepted client connection.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::cache::unix_now;
use crate::error::{BridgeError, Result};
use crate::lookup::LookupService;
use crate::protocol::{decode_command, decode_text, read_frame, write_response, Command, Response};
use crate::remote::Transliterator;

/// Lifecycle of a connection
///
/// `AwaitingFrame → Dispatching → Responded → Closed`; `Closed` is reached
/// from any state, and every connection ends there after one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingFrame,
    Dispatching,
    Responded,
    Closed,
}

/// Handles a single client connection
pub struct Connection {
    /// Client socket
    stream: TcpStream,

    /// Address this connection was accepted on (reported by HOST)
    local_addr: SocketAddr,

    /// Peer address for logging
    peer_addr: String,

    state: ConnectionState,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let local_addr = stream.local_addr()?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            local_addr,
            peer_addr,
            state: ConnectionState::AwaitingFrame,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Serve one command, then close the connection
    ///
    /// The socket is shut down whatever happens; a second command on the
    /// same connection is never read.
    pub fn handle<T: Transliterator>(&mut self, service: &mut LookupService<T>) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let outcome = self.serve(service);
        self.close();
        outcome
    }

    fn serve<T: Transliterator>(&mut self, service: &mut LookupService<T>) -> Result<()> {
        self.state = ConnectionState::AwaitingFrame;

        let frame = match read_frame(&mut self.stream) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Client {} closed before sending a command", self.peer_addr);
                return Ok(());
            }
            Err(BridgeError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!("Client {} went away while reading: {}", self.peer_addr, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        tracing::trace!("Received {} bytes from {}: {:?}", frame.len(), self.peer_addr, frame);

        self.state = ConnectionState::Dispatching;
        let command = decode_command(&frame)?;

        let response = match dispatch(command, service, self.local_addr, unix_now()) {
            Some(response) => response,
            None => return Ok(()),
        };

        match write_response(&mut self.stream, &response) {
            Ok(()) => {}
            Err(BridgeError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.state = ConnectionState::Responded;
        Ok(())
    }

    fn close(&mut self) {
        // The peer may already be gone; nothing useful to do on failure
        let _ = self.stream.shutdown(Shutdown::Both);
        self.state = ConnectionState::Closed;
        tracing::debug!("Connection to {} closed", self.peer_addr);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Produce the reply for a decoded command
///
/// `None` means no reply is written (END and unknown tags). A REQUEST never
/// fails outward: any error while answering it becomes `Response::Error`.
pub fn dispatch<T: Transliterator>(
    command: Command,
    service: &mut LookupService<T>,
    local_addr: SocketAddr,
    now: u64,
) -> Option<Response> {
    match command {
        Command::End => None,
        Command::Request { reading } => {
            Some(answer_request(&reading, service, now).unwrap_or_else(|e| {
                tracing::warn!("Request failed: {}", e);
                Response::Error
            }))
        }
        Command::Version => Some(Response::version()),
        Command::Host => Some(Response::Host(local_addr)),
        Command::Unknown(tag) => {
            tracing::debug!("Ignoring unknown command tag 0x{:02x}", tag);
            None
        }
    }
}

fn answer_request<T: Transliterator>(
    raw_reading: &[u8],
    service: &mut LookupService<T>,
    now: u64,
) -> Result<Response> {
    let reading = decode_text(raw_reading)?;

    if reading.is_empty() {
        return Ok(Response::not_found(reading));
    }

    Ok(match service.resolve(&reading, now)? {
        Some(conversion) => Response::found(conversion),
        None => Response::not_found(reading),
    })
}

/// Errors that just mean the client is gone or too slow
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            // Read timeout (Windows uses TimedOut instead of WouldBlock)
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
