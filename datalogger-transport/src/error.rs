//! Transport errors

use std::io;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Connecting to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: String, after: Duration },

    #[error("No data from server within {0:?}")]
    ReadTimeout(Duration),

    /// Orderly shutdown by the server; ends query and observe streams
    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("Can't resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("No addresses found for {0}")]
    NoAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true for connect and read timeouts
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::ReadTimeout(_))
    }
}
