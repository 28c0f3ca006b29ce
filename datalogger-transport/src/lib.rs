//! Byte transport for the data logger client
//!
//! The wire protocol is a plain byte stream over TCP; framing is done by
//! `datalogger-core`, so transports only move raw chunks.

pub mod tcp;
pub mod error;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Connection to a data logger server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection
    async fn connect(&mut self) -> Result<()>;

    /// Shut the connection down; a no-op when not connected
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Write one encoded request in full
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Next chunk of reply bytes, waiting at most `timeout`
    ///
    /// Chunk boundaries carry no meaning. `None` waits until data arrives
    /// or the server closes the stream, which is reported as
    /// [`Error::ConnectionClosed`].
    async fn receive(&mut self, timeout: Option<Duration>) -> Result<BytesMut>;

    /// `host:port` of the server, for logs and error messages
    fn remote_addr(&self) -> String;
}
