//! TCP Server
//!
//! Accepts connections and serves them one at a time on the calling thread.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::lookup::LookupService;
use crate::remote::Transliterator;

use super::Connection;

/// Upper bound on the self-connect that wakes a blocked accept
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Cloneable handle that stops a running server
///
/// The accept loop blocks in `accept`, so setting the flag alone is not
/// enough: `shutdown` also opens a throwaway connection to the bound
/// address to unblock it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: Arc<Mutex<Option<SocketAddr>>>,
}

impl ShutdownHandle {
    /// Ask the server to stop after the connection it is serving
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);

        if let Some(addr) = self.wake_addr() {
            if let Err(e) = TcpStream::connect_timeout(&addr, WAKE_TIMEOUT) {
                tracing::debug!("Wake-up connect to {} failed: {}", addr, e);
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn wake_addr(&self) -> Option<SocketAddr> {
        match self.wake_addr.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Record where the listener is reachable; wildcard binds go through loopback
    fn set_wake_addr(&self, bound: SocketAddr) {
        let mut addr = bound;
        if addr.ip().is_unspecified() {
            let loopback = match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            addr.set_ip(loopback);
        }

        match self.wake_addr.lock() {
            Ok(mut guard) => *guard = Some(addr),
            Err(poisoned) => *poisoned.into_inner() = Some(addr),
        }
    }
}

/// TCP server for skkbridge
///
/// ## Scheduling
/// A single thread blocks in `accept`. Each connection is served to
/// completion (one read, one reply, close) before the next is accepted.
/// Per-connection read/write timeouts keep a slow client from stalling it.
/// A failed accept is logged and retried after `accept_backoff_ms`.
pub struct Server<T> {
    config: Config,
    service: LookupService<T>,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,
}

impl<T: Transliterator> Server<T> {
    /// Create a new server with the given config and lookup service
    pub fn new(config: Config, service: LookupService<T>) -> Self {
        Self {
            config,
            service,
            listener: None,
            shutdown: ShutdownHandle::default(),
        }
    }

    /// Bind the listen address and return the bound address
    ///
    /// Called by `run` if needed; calling it first lets the caller learn
    /// the port when binding to port 0.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.listen_addr.as_str()).map_err(|e| {
            BridgeError::Config(format!("cannot bind {}: {}", self.config.listen_addr, e))
        })?;
        let addr = listener.local_addr()?;

        tracing::info!("Listening on {}", addr);
        self.shutdown.set_wake_addr(addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Address the server is bound on, if bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Start the server (blocking until shutdown is signalled)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| BridgeError::Config("listener not bound".to_string()))?;

        while !self.shutdown.is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    // Possibly the wake-up connection from `shutdown`
                    if self.shutdown.is_shutdown() {
                        break;
                    }
                    if let Err(e) = self.serve_connection(stream) {
                        tracing::warn!("Connection from {} failed: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(self.config.accept_backoff());
                }
            }
        }

        tracing::info!("Server shutting down");
        self.listener = Some(listener);
        Ok(())
    }

    fn serve_connection(&mut self, stream: TcpStream) -> Result<()> {
        let mut connection = Connection::new(stream)?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;
        connection.handle(&mut self.service)
    }

    /// Handle that can stop this server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn service(&self) -> &LookupService<T> {
        &self.service
    }
}
