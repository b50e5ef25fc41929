//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - One thread per connection, capped at `max_connections`
//! - Requests routed through the shared QueryService
//!
//! ## Protocol
//! One JSON request per line, one JSON reply per line (see the `service`
//! module for the message shapes).

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
