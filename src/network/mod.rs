//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single thread blocks in accept and serves connections in turn
//! - One command per connection, then close (no keep-alive)
//! - Commands routed through the LookupService

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{dispatch, Connection, ConnectionState};
