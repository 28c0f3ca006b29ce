//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] datalogger_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] datalogger_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] datalogger_types::Error),
    
    #[error("Not connected to server")]
    NotConnected,
}

impl Error {
    /// The session is unusable and the connection should be dropped
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Core(e) => e.is_framing_error() || matches!(e, datalogger_core::Error::Io(_)),
            Self::Transport(_) => true,
            Self::Types(_) | Self::NotConnected => false,
        }
    }
}
