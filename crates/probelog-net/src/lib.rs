//! Line-delimited JSON over TCP with explicit acknowledgements.
//!
//! Each wire message is one UTF-8 JSON object terminated by a single `\n`;
//! the server answers every successfully parsed message with the literal
//! `ACK` plus a newline. The [`Connector`] is the client role: connect,
//! frame, send, wait for the ACK, retry with capped linear backoff, and
//! reconnect on transport failure. The [`Listener`] is the server role:
//! accept, spawn one handler task per connection, reframe the byte stream
//! into lines, and hand decoded payloads to a [`PayloadObserver`].
//!
//! Both roles optionally report connection/send/ack/error events to a
//! [`TelemetrySink`], which in practice is the log store.

pub mod frame;

mod config;
mod connector;
mod error;
mod listener;
mod traits;

pub use config::NetworkConfig;
pub use connector::Connector;
pub use error::{Error, Result};
pub use listener::Listener;
pub use traits::{PayloadObserver, TelemetrySink};
